use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use swc_core::ecma::ast::*;

/// A literal-only snapshot of an argument expression.
#[derive(Clone, Debug, PartialEq)]
pub enum SerializedValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    Array(Vec<SerializedValue>),
    /// Numeric keys are stored in their JS property-key spelling.
    Object(BTreeMap<String, SerializedValue>),
}

impl SerializedValue {
    /// JS `Boolean(value)`.
    pub fn is_truthy(&self) -> bool {
        match self {
            SerializedValue::String(s) => !s.is_empty(),
            SerializedValue::Number(n) => *n != 0.0 && !n.is_nan(),
            SerializedValue::Boolean(b) => *b,
            SerializedValue::Null => false,
            SerializedValue::Array(_) | SerializedValue::Object(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SerializedValue::String(s) => Some(s),
            _ => None,
        }
    }
}

// Directive values come out of the JSONC parser; numbers lose their integer
// flavour here and regain it in `Serialize`.
impl From<serde_json::Value> for SerializedValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => SerializedValue::Null,
            serde_json::Value::Bool(b) => SerializedValue::Boolean(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(SerializedValue::Null, SerializedValue::Number),
            serde_json::Value::String(s) => SerializedValue::String(s),
            serde_json::Value::Array(items) => {
                SerializedValue::Array(items.into_iter().map(SerializedValue::from).collect())
            }
            serde_json::Value::Object(entries) => SerializedValue::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, SerializedValue::from(value)))
                    .collect(),
            ),
        }
    }
}

// Integral numbers print without a fraction and non-finite numbers print as
// `null`, matching JSON.stringify.
impl Serialize for SerializedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SerializedValue::String(s) => serializer.serialize_str(s),
            SerializedValue::Number(n) if !n.is_finite() => serializer.serialize_unit(),
            SerializedValue::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            SerializedValue::Number(n) => serializer.serialize_f64(*n),
            SerializedValue::Boolean(b) => serializer.serialize_bool(*b),
            SerializedValue::Null => serializer.serialize_unit(),
            SerializedValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            SerializedValue::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Spelling of a number used as a property key (`1.0` → "1", `-0` → "0",
/// `1e21` → "1e+21").
pub fn number_key(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = n.abs();
    if magnitude < 1e21 && magnitude >= 1e-6 {
        return n.to_string();
    }
    // JS switches to exponent form outside [1e-6, 1e21) and always signs it.
    let spelled = format!("{n:e}");
    match spelled.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
        _ => spelled,
    }
}

// -----------------------------------------------------------------------------
// Expression → value
// -----------------------------------------------------------------------------

pub fn serialize_args(args: &[ExprOrSpread]) -> Vec<SerializedValue> {
    args.iter().map(serialize_arg).collect()
}

pub fn serialize_arg(arg: &ExprOrSpread) -> SerializedValue {
    if arg.spread.is_some() {
        return SerializedValue::Null;
    }
    serialize_expr(&arg.expr)
}

/// Anything that is not a literal (identifiers, `this`, members, calls,
/// functions, templates, ...) becomes `Null`.
pub fn serialize_expr(expr: &Expr) -> SerializedValue {
    match expr {
        Expr::Lit(lit) => serialize_lit(lit),
        Expr::Paren(paren) => serialize_expr(&paren.expr),
        Expr::Unary(unary) => match (unary.op, &*unary.arg) {
            (UnaryOp::Minus, Expr::Lit(Lit::Num(n))) => SerializedValue::Number(-n.value),
            (UnaryOp::Plus, Expr::Lit(Lit::Num(n))) => SerializedValue::Number(n.value),
            _ => SerializedValue::Null,
        },
        Expr::Array(array) => SerializedValue::Array(
            array
                .elems
                .iter()
                .map(|el| el.as_ref().map_or(SerializedValue::Null, serialize_arg))
                .collect(),
        ),
        Expr::Object(object) => serialize_object(object),
        _ => SerializedValue::Null,
    }
}

fn serialize_lit(lit: &Lit) -> SerializedValue {
    match lit {
        Lit::Str(s) => SerializedValue::String(s.value.to_string()),
        Lit::Num(n) => SerializedValue::Number(n.value),
        Lit::Bool(b) => SerializedValue::Boolean(b.value),
        _ => SerializedValue::Null,
    }
}

fn serialize_object(object: &ObjectLit) -> SerializedValue {
    let mut entries = BTreeMap::new();
    for prop in &object.props {
        // Spreads cannot be expanded without evaluation.
        let PropOrSpread::Prop(prop) = prop else {
            continue;
        };
        let (key, value) = match &**prop {
            Prop::KeyValue(kv) => match prop_key(&kv.key) {
                Some(key) => (key, serialize_expr(&kv.value)),
                None => continue,
            },
            Prop::Shorthand(ident) => (ident.sym.to_string(), SerializedValue::Null),
            Prop::Method(method) => match prop_key(&method.key) {
                Some(key) => (key, SerializedValue::Null),
                None => continue,
            },
            _ => continue,
        };
        entries.insert(key, value);
    }
    SerializedValue::Object(entries)
}

fn prop_key(name: &PropName) -> Option<String> {
    match name {
        PropName::Ident(i) => Some(i.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string()),
        PropName::Num(n) => Some(number_key(n.value)),
        PropName::BigInt(b) => Some(b.value.to_string()),
        PropName::Computed(_) => None,
    }
}
