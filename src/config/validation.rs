//! Configuration linting.
//!
//! # Responsibilities
//! - Fill every key of the default schema that the user document lacks
//! - Replace user values whose JSON kind disagrees with the default
//! - Replace numbers outside the default's range (unsigned, signed, float)
//! - Keep keys the schema does not know about
//!
//! # Design Decisions
//! - Lint is a pure function: (defaults, user) → linted document
//! - Idempotent: linting a linted document is a no-op
//! - Arrays are taken from the user wholesale, never merged element-wise
//! - A `null` default accepts any user value

use serde_json::{Map, Number, Value};

/// Lint `user` against `defaults`, returning a document that carries every
/// key of the schema.
pub fn lint(defaults: &Value, user: &Value) -> Value {
    match (defaults, user) {
        (Value::Object(schema), Value::Object(doc)) => Value::Object(lint_object(schema, doc)),
        (Value::Null, other) => other.clone(),
        (Value::Number(schema), Value::Number(doc)) if !number_fits(schema, doc) => {
            Value::Number(schema.clone())
        }
        (schema, doc) if same_kind(schema, doc) => doc.clone(),
        (schema, _) => schema.clone(),
    }
}

fn lint_object(schema: &Map<String, Value>, doc: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::with_capacity(schema.len().max(doc.len()));

    for (key, default) in schema {
        let value = match doc.get(key) {
            Some(value) => lint(default, value),
            None => default.clone(),
        };
        out.insert(key.clone(), value);
    }

    // Unknown keys pass through untouched.
    for (key, value) in doc {
        if !schema.contains_key(key) {
            out.insert(key.clone(), value.clone());
        }
    }

    out
}

fn same_kind(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Bool(_), Value::Bool(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Array(_), Value::Array(_))
            | (Value::Object(_), Value::Object(_))
    )
}

/// An integer default admits only integers of the same signedness; a float
/// default admits any number.
fn number_fits(schema: &Number, doc: &Number) -> bool {
    if schema.is_u64() {
        doc.is_u64()
    } else if schema.is_i64() {
        doc.is_i64()
    } else {
        true
    }
}

/// Coerce a JSON value to a number the way a loosely typed client would:
/// numeric strings parse (including `0x`, `0o` and `0b` literals), empty
/// strings, `null` and `false` become 0, `true` becomes 1, and anything
/// unparseable becomes 0.
pub fn coerce_number(value: Option<&Value>) -> Value {
    let number = match value {
        Some(Value::Number(n)) => return Value::Number(n.clone()),
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::String(s)) => parse_numeric(s.trim()),
        Some(Value::Null) => 0.0,
        _ => f64::NAN,
    };

    if !number.is_finite() {
        return Value::from(0);
    }
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        Value::from(number as i64)
    } else {
        Value::from(number)
    }
}

fn parse_numeric(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    match radix {
        // Radix literals carry no sign.
        Some(_) if s[2..].starts_with(&['+', '-'][..]) => f64::NAN,
        Some(radix) => u64::from_str_radix(&s[2..], radix).map_or(f64::NAN, |n| n as f64),
        None => s.parse::<f64>().unwrap_or(f64::NAN),
    }
}
