use swc_core::common::{
    comments::SingleThreadedComments, sync::Lrc, FileName, SourceMap, SourceMapper,
};
use swc_core::ecma::ast::EsVersion;
use swc_core::ecma::codegen::{text_writer::JsWriter, Emitter};
use swc_core::ecma::parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax};
use swc_core::ecma::visit::VisitMutWith;
use swc_plugin_mark_expressions::{MarkExpressions, PatternConfig};

pub const FULL_CONFIG: &str = r#"
    {
        "title": "MARK_EXPRESSIONS",
        "functions": ["markFnA", "markFnB", "markFnC"],
        "methods": {
            "window": ["markWindowFnA", "markWindowFnB", "markWindowFnC"],
            "this": ["markThisFnA", "markThisFnB", "markThisFnC"],
            "obj": ["markObjFnA", "markObjFnB", "markObjFnC"]
        },
        "dynamicImports": ["shouldMark"]
    }
"#;

/// Parses `src` as `input.jsx`, runs the transform and prints the result.
pub fn transform(config: &str, src: &str, filename: Option<&str>) -> String {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(Lrc::new(FileName::Real("input.jsx".into())), src.to_string());
    let comments = SingleThreadedComments::default();

    let lexer = Lexer::new(
        Syntax::Es(EsSyntax {
            jsx: true,
            ..Default::default()
        }),
        EsVersion::latest(),
        StringInput::from(&*fm),
        Some(&comments),
    );
    let mut parser = Parser::new_from(lexer);
    let mut program = parser.parse_program().expect("fixture should parse");

    let config = PatternConfig::from_json(config).expect("config should be valid");
    let source_map: Lrc<dyn SourceMapper> = cm.clone();
    program.visit_mut_with(&mut MarkExpressions::new(
        comments.clone(),
        Some(source_map),
        filename.map(str::to_string),
        config,
    ));

    let mut buf = vec![];
    {
        let mut emitter = Emitter {
            cfg: Default::default(),
            cm: cm.clone(),
            comments: Some(&comments),
            wr: JsWriter::new(cm.clone(), "\n", &mut buf, None),
        };
        emitter.emit_program(&program).expect("printing should succeed");
    }
    String::from_utf8(buf).expect("printed code is utf-8")
}

/// The JSON array between the ledger markers, if the output carries one.
pub fn ledger(code: &str, title: &str) -> Option<serde_json::Value> {
    let begin = format!("---BEGIN {title}---\n");
    let end = format!("\n---END {title}---");
    let start = code.find(&begin)? + begin.len();
    let len = code[start..].find(&end)?;
    Some(serde_json::from_str(&code[start..start + len]).expect("ledger is valid JSON"))
}
