//! Truthiness, printing and type names for template data.

use serde_json::Value;
use std::fmt::Write;

/// Go's notion of a "true" value: non-zero, non-empty, non-nil.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Append the printed form of `value` to `out`.
pub(crate) fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            let _ = write!(out, "{}", b);
        }
        Value::Number(n) => {
            let _ = write!(out, "{}", n);
        }
        Value::String(s) => out.push_str(s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push_str("map[");
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                out.push_str(key);
                out.push(':');
                write_value(out, item);
            }
            out.push(']');
        }
    }
}

pub(crate) fn printed(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "nil",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "record",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_values_are_false() {
        for value in [json!(null), json!(false), json!(0), json!(""), json!([]), json!({})] {
            assert!(!truthy(&value), "{} should be false", value);
        }
        for value in [json!(true), json!(1), json!("x"), json!([0]), json!({"k": 0})] {
            assert!(truthy(&value), "{} should be true", value);
        }
    }

    #[test]
    fn prints_like_go() {
        assert_eq!(printed(&json!("a:1")), "a:1");
        assert_eq!(printed(&json!(9090)), "9090");
        assert_eq!(printed(&json!(null)), "");
        assert_eq!(printed(&json!(["a", 1, true])), "[a 1 true]");
        assert_eq!(printed(&json!({"b": 2, "a": 1})), "map[a:1 b:2]");
    }
}
