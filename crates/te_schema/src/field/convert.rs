//! Ready-made converters for common scalar coercions.
//!
//! ```
//! use serde_json::json;
//! use te_schema::convert;
//!
//! assert_eq!(convert::int()(json!("10")).unwrap(), json!(10));
//! assert_eq!(convert::string()(json!(10)).unwrap(), json!("10"));
//! assert!(convert::int()(json!("not a number")).is_err());
//! ```

use serde_json::{Number, Value};

use crate::HookError;
use crate::field::{Converter, converter};

/// Coerces numbers, numeric strings and booleans to an integer.
///
/// Floats are truncated toward zero.
pub fn int() -> Converter {
    converter(|value| match &value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::Number(n.clone())),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => Ok(Value::from(f.trunc() as i64)),
            _ => Err(HookError::new(format!("invalid literal for int: {n}"))),
        },
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| HookError::new(format!("invalid literal for int: {s:?}"))),
        Value::Bool(b) => Ok(Value::from(*b as i64)),
        other => Err(HookError::new(format!(
            "cannot convert {} to int",
            crate::error::kind_of(other)
        ))),
    })
}

/// Coerces numbers, numeric strings and booleans to a float.
pub fn float() -> Converter {
    converter(|value| {
        let float = match &value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(b) => Some(*b as u8 as f64),
            _ => None,
        };
        float
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| HookError::new(format!("cannot convert {value} to float")))
    })
}

/// Renders scalars as strings; strings pass through.
pub fn string() -> Converter {
    converter(|value| match value {
        Value::String(_) => Ok(value),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        other => Err(HookError::new(format!(
            "cannot convert {} to string",
            crate::error::kind_of(&other)
        ))),
    })
}

/// Coerces booleans, `0`/`1` and `"true"`/`"false"` to a boolean.
pub fn boolean() -> Converter {
    converter(|value| match &value {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(Value::Bool(false)),
        Value::Number(n) if n.as_i64() == Some(1) => Ok(Value::Bool(true)),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
        other => Err(HookError::new(format!("cannot convert {other} to bool"))),
    })
}
