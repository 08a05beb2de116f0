use swc_core::{
    common::{
        comments::{Comment, CommentKind, Comments},
        sync::Lrc,
        BytePos, SourceMapper, Span, Spanned, DUMMY_SP,
    },
    ecma::{
        ast::*,
        visit::{VisitMut, VisitMutWith},
    },
};
use tracing::{debug, trace};

use crate::config::{OutputMode, PatternConfig, ReceiverKey};
use crate::ledger::{escape_comment_body, CallSiteRecord, Ledger, Position};
use crate::magic_comment::{is_gated, parse_directives, Directives};
use crate::value::{serialize_arg, serialize_args};

// -----------------------------------------------------------------------------
// Filename helpers
// -----------------------------------------------------------------------------

/// Forward slashes only, and no `file://` scheme. Absolute paths stay
/// absolute.
pub fn normalize_filename(filename: &str) -> String {
    let s = filename.replace('\\', "/");
    if let Some(rest) = s.strip_prefix("file://") {
        return rest.to_string();
    }
    s
}

// -----------------------------------------------------------------------------
// Matching
// -----------------------------------------------------------------------------

/// How a call node matched; at most one per node.
#[derive(Debug)]
enum CallMatch {
    Import(Vec<Directives>),
    Function(String),
    Method(ReceiverKey, String),
}

// -----------------------------------------------------------------------------
// Transform state
// -----------------------------------------------------------------------------

pub struct MarkExpressions<C: Comments> {
    comments: C,
    source_map: Option<Lrc<dyn SourceMapper>>,
    filename: Option<String>,
    config: PatternConfig,
    ledger: Ledger,
}

impl<C: Comments> MarkExpressions<C> {
    pub fn new(
        comments: C,
        source_map: Option<Lrc<dyn SourceMapper>>,
        filename: Option<String>,
        config: PatternConfig,
    ) -> Self {
        Self {
            comments,
            source_map,
            filename: filename.map(|f| normalize_filename(&f)),
            config,
            ledger: Ledger::default(),
        }
    }

    // ---------- classification ----------

    fn classify(&self, call: &CallExpr) -> Option<CallMatch> {
        match &call.callee {
            Callee::Import(_) => self.check_dynamic_import(call).map(CallMatch::Import),
            Callee::Expr(callee) => match &**callee {
                Expr::Ident(ident) => {
                    let name: &str = &ident.sym;
                    self.config
                        .is_function(name)
                        .then(|| CallMatch::Function(name.to_string()))
                }
                Expr::Member(member) => self
                    .check_method_call(member)
                    .map(|(receiver, method)| CallMatch::Method(receiver, method)),
                _ => None,
            },
            Callee::Super(_) => None,
        }
    }

    fn check_method_call(&self, member: &MemberExpr) -> Option<(ReceiverKey, String)> {
        let MemberProp::Ident(prop) = &member.prop else {
            return None;
        };
        let method: &str = &prop.sym;
        let receiver = match &*member.obj {
            Expr::This(_) => ReceiverKey::This,
            Expr::Ident(obj) => self.config.receiver_named(&obj.sym)?,
            _ => return None,
        };
        self.config
            .has_method(&receiver, method)
            .then(|| (receiver, method.to_string()))
    }

    /// Directive objects of a gated `import()`, one per parsed block comment.
    fn check_dynamic_import(&self, call: &CallExpr) -> Option<Vec<Directives>> {
        if !self.config.gates_imports() {
            return None;
        }
        let arg = call.args.first()?;
        let directives: Vec<Directives> = self.comments.with_leading(arg.span_lo(), |comments| {
            comments
                .iter()
                .filter(|c| matches!(c.kind, CommentKind::Block))
                .map(|c| parse_directives(&c.text))
                .filter(|d| !d.is_empty())
                .collect()
        });
        directives
            .iter()
            .any(|d| is_gated(d, &self.config.dynamic_import_keys))
            .then_some(directives)
    }

    // ---------- output ----------

    fn position(&self, span: Span) -> Position {
        let fallback = || self.filename.clone().unwrap_or_else(|| "unknown".to_string());
        if span.is_dummy() {
            return Position {
                file: fallback(),
                line: 0,
                column: 0,
            };
        }
        match self.source_map {
            Some(ref cm) => {
                let loc = cm.lookup_char_pos(span.lo());
                Position {
                    file: self
                        .filename
                        .clone()
                        .unwrap_or_else(|| normalize_filename(&loc.file.name.to_string())),
                    line: loc.line,
                    column: loc.col.0 + 1,
                }
            }
            None => Position {
                file: fallback(),
                line: 0,
                column: 0,
            },
        }
    }

    fn record(&mut self, call: &CallExpr, found: CallMatch) {
        let position = self.position(call.span);
        let record = match found {
            CallMatch::Import(directives) => CallSiteRecord::DynamicImport {
                directives,
                specifier: serialize_args(&call.args),
                position,
            },
            CallMatch::Function(name) => CallSiteRecord::PlainFunction {
                name,
                args: serialize_args(&call.args),
                position,
            },
            CallMatch::Method(receiver, method) => CallSiteRecord::ReceiverMethod {
                receiver_tag: receiver.tag().to_string(),
                method,
                args: serialize_args(&call.args),
                position,
            },
        };
        trace!(record = ?record, "recorded call site");
        self.ledger.push(record);
    }

    /// `/* markExpression: <text> */` in front of a string first argument.
    /// Only plain functions and legacy `objects` receivers are annotated.
    fn annotate(&self, call: &CallExpr, found: &CallMatch) {
        match found {
            CallMatch::Function(_) => {}
            CallMatch::Method(receiver, _) if self.config.is_legacy_receiver(receiver) => {}
            _ => {
                trace!(found = ?found, "match has no inline form");
                return;
            }
        }
        let Some(first) = call.args.first() else {
            return;
        };
        if let Some(text) = serialize_arg(first).as_str() {
            self.comments.add_leading(
                first.span_lo(),
                Comment {
                    kind: CommentKind::Block,
                    span: DUMMY_SP,
                    text: format!(" markExpression: {} ", escape_comment_body(text)).into(),
                },
            );
        }
    }

    /// Puts the rendered ledger ahead of any comment already leading `pos`.
    fn emit_ledger(&mut self, pos: BytePos) {
        let ledger = std::mem::take(&mut self.ledger);
        let count = ledger.len();
        let Some(text) = ledger.render(&self.config.title) else {
            return;
        };
        let existing = self.comments.take_leading(pos).unwrap_or_default();
        self.comments.add_leading(
            pos,
            Comment {
                kind: CommentKind::Block,
                span: DUMMY_SP,
                text: text.into(),
            },
        );
        self.comments.add_leading_comments(pos, existing);
        debug!(records = count, title = %self.config.title, "emitted call-site ledger");
    }
}

impl<C: Comments> VisitMut for MarkExpressions<C> {
    fn visit_mut_module(&mut self, module: &mut Module) {
        module.visit_mut_children_with(self);
        self.emit_ledger(module.span_lo());
    }

    fn visit_mut_script(&mut self, script: &mut Script) {
        script.visit_mut_children_with(self);
        self.emit_ledger(script.span_lo());
    }

    // Pre-order: the call itself is classified before anything nested in it.
    fn visit_mut_call_expr(&mut self, call: &mut CallExpr) {
        if let Some(found) = self.classify(call) {
            match self.config.mode {
                OutputMode::Ledger => self.record(call, found),
                OutputMode::Inline => self.annotate(call, &found),
            }
        }
        call.visit_mut_children_with(self);
    }
}
