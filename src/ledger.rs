use std::fmt;

use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::magic_comment::Directives;
use crate::value::SerializedValue;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub file: String,
    /// 1-based.
    pub line: usize,
    /// 1-based, counted in characters.
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CallSiteRecord {
    PlainFunction {
        name: String,
        args: Vec<SerializedValue>,
        position: Position,
    },
    ReceiverMethod {
        receiver_tag: String,
        method: String,
        args: Vec<SerializedValue>,
        position: Position,
    },
    DynamicImport {
        directives: Vec<Directives>,
        specifier: Vec<SerializedValue>,
        position: Position,
    },
}

impl CallSiteRecord {
    pub fn position(&self) -> &Position {
        match self {
            CallSiteRecord::PlainFunction { position, .. }
            | CallSiteRecord::ReceiverMethod { position, .. }
            | CallSiteRecord::DynamicImport { position, .. } => position,
        }
    }
}

// Records render as positional JSON arrays:
//   [name, args, pos]
//   [receiver, method, args, pos]
//   ["import", [directives], [specifier], pos]
impl Serialize for CallSiteRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CallSiteRecord::PlainFunction {
                name,
                args,
                position,
            } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(name)?;
                seq.serialize_element(args)?;
                seq.serialize_element(&position.to_string())?;
                seq.end()
            }
            CallSiteRecord::ReceiverMethod {
                receiver_tag,
                method,
                args,
                position,
            } => {
                let mut seq = serializer.serialize_seq(Some(4))?;
                seq.serialize_element(receiver_tag)?;
                seq.serialize_element(method)?;
                seq.serialize_element(args)?;
                seq.serialize_element(&position.to_string())?;
                seq.end()
            }
            CallSiteRecord::DynamicImport {
                directives,
                specifier,
                position,
            } => {
                let mut seq = serializer.serialize_seq(Some(4))?;
                seq.serialize_element("import")?;
                seq.serialize_element(directives)?;
                seq.serialize_element(specifier)?;
                seq.serialize_element(&position.to_string())?;
                seq.end()
            }
        }
    }
}

/// Call sites collected during one traversal, in visit order.
#[derive(Debug, Default)]
pub struct Ledger {
    records: Vec<CallSiteRecord>,
}

impl Ledger {
    pub fn push(&mut self, record: CallSiteRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CallSiteRecord] {
        &self.records
    }

    /// Body of the block comment, or `None` when nothing matched.
    pub fn render(self, title: &str) -> Option<String> {
        if self.records.is_empty() {
            return None;
        }
        let json = serde_json::to_string(&self.records).unwrap_or_else(|_| "[]".into());
        Some(format!(
            "---BEGIN {title}---\n{}\n---END {title}---",
            escape_comment_body(&json)
        ))
    }
}

/// `*/` would close the surrounding block comment; `\/` is still valid JSON.
pub fn escape_comment_body(text: &str) -> String {
    text.replace("*/", "*\\/")
}
