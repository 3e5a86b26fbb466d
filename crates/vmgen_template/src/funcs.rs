//! Builtin template functions.

use crate::value::{printed, truthy, type_name};
use serde_json::{Number, Value};
use std::cmp::Ordering;

const BUILTINS: &[&str] = &[
    "and", "or", "not", "len", "index", "eq", "ne", "lt", "le", "gt", "ge", "print",
];

pub(crate) fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// Call builtin `name`. Errors are plain messages; the executor adds position.
pub(crate) fn call(name: &str, args: Vec<Value>) -> Result<Value, String> {
    match name {
        "and" => {
            require_at_least(name, &args, 1)?;
            Ok(args
                .iter()
                .find(|v| !truthy(v))
                .or(args.last())
                .cloned()
                .unwrap_or(Value::Null))
        }
        "or" => {
            require_at_least(name, &args, 1)?;
            Ok(args
                .iter()
                .find(|v| truthy(v))
                .or(args.last())
                .cloned()
                .unwrap_or(Value::Null))
        }
        "not" => {
            require_exactly(name, &args, 1)?;
            Ok(Value::Bool(!truthy(&args[0])))
        }
        "len" => {
            require_exactly(name, &args, 1)?;
            let len = match &args[0] {
                Value::String(s) => s.len(),
                Value::Array(items) => items.len(),
                Value::Object(map) => map.len(),
                other => return Err(format!("len of type {}", type_name(other))),
            };
            Ok(Value::from(len))
        }
        "index" => {
            require_at_least(name, &args, 1)?;
            let mut args = args.into_iter();
            let mut item = args.next().unwrap_or(Value::Null);
            for key in args {
                item = index(item, &key)?;
            }
            Ok(item)
        }
        "eq" => {
            require_at_least(name, &args, 2)?;
            for other in &args[1..] {
                if equal(&args[0], other)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        "ne" => {
            require_exactly(name, &args, 2)?;
            Ok(Value::Bool(!equal(&args[0], &args[1])?))
        }
        "lt" | "le" | "gt" | "ge" => {
            require_exactly(name, &args, 2)?;
            let ordering = compare(&args[0], &args[1])?;
            Ok(Value::Bool(match name {
                "lt" => ordering == Ordering::Less,
                "le" => ordering != Ordering::Greater,
                "gt" => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        "print" => Ok(Value::String(sprint(&args))),
        other => Err(format!("function {:?} not defined", other)),
    }
}

fn require_exactly(name: &str, args: &[Value], n: usize) -> Result<(), String> {
    if args.len() != n {
        return Err(format!(
            "wrong number of args for {}: want {} got {}",
            name,
            n,
            args.len()
        ));
    }
    Ok(())
}

fn require_at_least(name: &str, args: &[Value], n: usize) -> Result<(), String> {
    if args.len() < n {
        return Err(format!(
            "wrong number of args for {}: want at least {} got {}",
            name,
            n,
            args.len()
        ));
    }
    Ok(())
}

fn index(item: Value, key: &Value) -> Result<Value, String> {
    match (item, key) {
        (Value::Array(mut items), Value::Number(n)) => {
            let len = items.len();
            match n.as_u64().map(|i| i as usize) {
                Some(i) if i < len => Ok(items.swap_remove(i)),
                _ => Err(format!("index out of range: {}", n)),
            }
        }
        (Value::Object(mut map), Value::String(k)) => Ok(map.remove(k).unwrap_or(Value::Null)),
        (Value::Null, _) => Err("index of untyped nil".to_string()),
        (other, key) => Err(format!(
            "cannot index {} with {}",
            type_name(&other),
            type_name(key)
        )),
    }
}

fn equal(a: &Value, b: &Value) -> Result<bool, String> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(number_cmp(x, y) == Some(Ordering::Equal)),
        (Value::String(x), Value::String(y)) => Ok(x == y),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::Null, Value::Null) => Ok(true),
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
            let culprit = if matches!(a, Value::Array(_) | Value::Object(_)) { a } else { b };
            Err(format!("non-comparable type {}", type_name(culprit)))
        }
        _ => Err(format!(
            "incompatible types for comparison: {} and {}",
            type_name(a),
            type_name(b)
        )),
    }
}

fn compare(a: &Value, b: &Value) -> Result<Ordering, String> {
    let ordering = match (a, b) {
        (Value::Number(x), Value::Number(y)) => number_cmp(x, y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    };
    ordering.ok_or_else(|| {
        format!(
            "incompatible types for comparison: {} and {}",
            type_name(a),
            type_name(b)
        )
    })
}

fn number_cmp(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// `fmt.Sprint`: spaces only between operands when neither is a string.
fn sprint(args: &[Value]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 && !args[i - 1].is_string() && !arg.is_string() {
            out.push(' ');
        }
        out.push_str(&printed(arg));
    }
    out
}
