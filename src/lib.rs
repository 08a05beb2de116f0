//! SWC transform that finds configured call sites and either annotates them
//! in place or records them in a ledger comment at the top of the file.
//!
//! Matching is purely syntactic: a local variable that happens to be named
//! `window` is treated like the global, and a shadowed function name still
//! matches. Nothing is evaluated; arguments are captured only when they are
//! literals (see [`SerializedValue`]).
//!
//! Two output modes, chosen once per file ([`OutputMode`]):
//!
//! - **Ledger**: every match is collected in source order and rendered as
//!   one block comment, `---BEGIN <title>---` / `---END <title>---`, wrapping
//!   a JSON array of `[name, args, "file:line:col"]`,
//!   `[receiver, method, args, "file:line:col"]` and
//!   `["import", [directives], [specifier], "file:line:col"]` records.
//! - **Inline**: a matched call whose first argument is a string literal gets
//!   `/* markExpression: <string> */` in front of that argument.

use swc_core::{
    common::{sync::Lrc, SourceMapper},
    ecma::{ast::Program, visit::VisitMutWith},
    plugin::{
        metadata::TransformPluginMetadataContextKind,
        plugin_transform,
        proxies::{PluginCommentsProxy, TransformPluginProgramMetadata},
    },
};

mod config;
mod ledger;
mod magic_comment;
mod transform;
mod value;

#[cfg(test)]
mod test_utils;

pub use config::{Config, ConfigError, OutputMode, PatternConfig, ReceiverKey, DEFAULT_GLOBAL_ALIASES};
pub use ledger::{CallSiteRecord, Ledger, Position};
pub use magic_comment::{is_gated, parse_directives, Directives};
pub use transform::{normalize_filename, MarkExpressions};
pub use value::{serialize_expr, SerializedValue};

// -----------------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------------

#[plugin_transform]
pub fn process_transform(mut program: Program, metadata: TransformPluginProgramMetadata) -> Program {
    // A bad config fails this invocation; the host reports the panic.
    let config = metadata
        .get_transform_plugin_config()
        .ok_or(ConfigError::Missing)
        .and_then(|raw| PatternConfig::from_json(&raw))
        .unwrap_or_else(|err| panic!("swc-plugin-mark-expressions: {err}"));
    let filename = metadata.get_context(&TransformPluginMetadataContextKind::Filename);

    let comments = metadata.comments.unwrap_or(PluginCommentsProxy);
    let source_map: Lrc<dyn SourceMapper> = Lrc::new(metadata.source_map);

    program.visit_mut_with(&mut MarkExpressions::new(
        comments,
        Some(source_map),
        filename,
        config,
    ));
    program
}
