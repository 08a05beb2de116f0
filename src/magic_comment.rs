//! Parser for the `/* key: value, ... */` directive comments bundlers read
//! from dynamic `import()` arguments (`webpackChunkName` and friends).
//!
//! Each top-level entry is parsed as a one-key JSONC object, so keys may be
//! bare words and values are JSON literals. An entry that does not parse is
//! dropped on its own and never fails the comment.

use std::collections::{BTreeMap, HashSet};

use jsonc_parser::{parse_to_serde_value, ParseOptions};
use tracing::trace;

use crate::value::SerializedValue;

pub type Directives = BTreeMap<String, SerializedValue>;

pub fn parse_directives(text: &str) -> Directives {
    let mut directives = Directives::new();
    for entry in split_entries(text) {
        if entry.trim().is_empty() {
            continue;
        }
        match parse_entry(entry) {
            Some((key, value)) => {
                directives.insert(key, value);
            }
            None => trace!(entry, "dropping unparseable directive entry"),
        }
    }
    directives
}

/// True when any gating key holds a truthy value.
pub fn is_gated(directives: &Directives, keys: &HashSet<String>) -> bool {
    directives
        .iter()
        .any(|(key, value)| keys.contains(key) && value.is_truthy())
}

/// Splits on commas that sit outside strings and brackets.
fn split_entries(text: &str) -> Vec<&str> {
    let mut entries = vec![];
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (idx, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '[' | '{' | '(' => depth += 1,
            ']' | '}' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                entries.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    entries.push(&text[start..]);
    entries
}

fn parse_entry(entry: &str) -> Option<(String, SerializedValue)> {
    let parsed = parse_to_serde_value(&format!("{{{entry}}}"), &ParseOptions::default())
        .ok()
        .flatten()?;
    let serde_json::Value::Object(object) = parsed else {
        return None;
    };
    // One top-level comma-free entry yields at most one key.
    object
        .into_iter()
        .next()
        .map(|(key, value)| (key, SerializedValue::from(value)))
}
