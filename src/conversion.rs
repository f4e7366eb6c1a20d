//! Conversion of values between types.
//!
//! Used when writing through a typed property or list, when a condition
//! is not already boolean, and by [`Expression::get_typed_value`](crate::Expression::get_typed_value).

use crate::{
    evaluator::EvalError,
    value::{Value, ValueType},
};

/// Converts values to a requested [`ValueType`].
pub trait TypeConverter {
    fn can_convert(&self, value: &Value, target: &ValueType) -> bool;

    fn convert(&self, value: Value, target: &ValueType) -> Result<Value, EvalError>;
}

/// The conversions every context starts with.
///
/// | from      | to        | rule                                        |
/// |-----------|-----------|---------------------------------------------|
/// | `String`  | `Boolean` | `true/yes/on/1`, `false/no/off/0`, any case |
/// | `String`  | `Integer` | decimal parse, surrounding whitespace ok    |
/// | `String`  | `Float`   | decimal parse                               |
/// | `Float`   | `Integer` | only when the value has no fraction         |
/// | `Integer` | `Float`   | widening                                    |
/// | anything  | `String`  | its textual form                            |
/// | `String`  | `List`    | comma-separated, trimmed                    |
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultConverter;

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

impl TypeConverter for DefaultConverter {
    fn can_convert(&self, value: &Value, target: &ValueType) -> bool {
        target.accepts(value)
            || match (target, value) {
                (ValueType::Boolean, Value::String(s)) => parse_bool(s).is_some(),
                (ValueType::Integer, Value::String(s)) => s.trim().parse::<i64>().is_ok(),
                (ValueType::Float, Value::String(s)) => s.trim().parse::<f64>().is_ok(),
                (ValueType::Integer, Value::Float(n)) => n.fract() == 0.0 && n.abs() < i64::MAX as f64,
                (ValueType::Float, Value::Integer(_)) => true,
                (ValueType::String, _) => true,
                (ValueType::List, Value::String(_)) => true,
                _ => false,
            }
    }

    fn convert(&self, value: Value, target: &ValueType) -> Result<Value, EvalError> {
        if target.accepts(&value) {
            return Ok(value);
        }
        let converted = match (target, &value) {
            (ValueType::Boolean, Value::String(s)) => parse_bool(s).map(Value::Boolean),
            (ValueType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::Integer),
            (ValueType::Float, Value::String(s)) => s.trim().parse::<f64>().ok().map(Value::Float),
            (ValueType::Integer, Value::Float(n)) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                Some(Value::Integer(*n as i64))
            }
            (ValueType::Float, Value::Integer(n)) => Some(Value::Float(*n as f64)),
            (ValueType::String, Value::Null) => Some(Value::Null),
            (ValueType::String, other) => Some(Value::String(other.to_string())),
            (ValueType::List, Value::String(s)) if s.trim().is_empty() => Some(Value::list(Vec::new())),
            (ValueType::List, Value::String(s)) => Some(Value::typed_list(
                ValueType::String,
                s.split(',').map(|part| Value::string(part.trim())).collect(),
            )),
            _ => None,
        };
        converted.ok_or_else(|| EvalError::conversion_failed(&value, target))
    }
}

/// Rust types an evaluation result can be extracted into.
pub trait FromValue: Sized {
    fn target_type() -> ValueType;

    fn from_value(value: Value) -> Result<Self, EvalError>;
}

fn wrong_type(value: &Value, target: &ValueType) -> EvalError {
    EvalError::conversion_failed(value, target)
}

impl FromValue for Value {
    fn target_type() -> ValueType {
        ValueType::Any
    }

    fn from_value(value: Value) -> Result<Self, EvalError> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn target_type() -> ValueType {
        ValueType::Boolean
    }

    fn from_value(value: Value) -> Result<Self, EvalError> {
        value.as_bool().ok_or_else(|| wrong_type(&value, &ValueType::Boolean))
    }
}

impl FromValue for i64 {
    fn target_type() -> ValueType {
        ValueType::Integer
    }

    fn from_value(value: Value) -> Result<Self, EvalError> {
        value.as_int().ok_or_else(|| wrong_type(&value, &ValueType::Integer))
    }
}

impl FromValue for i32 {
    fn target_type() -> ValueType {
        ValueType::Integer
    }

    fn from_value(value: Value) -> Result<Self, EvalError> {
        value
            .as_int()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| wrong_type(&value, &ValueType::Integer))
    }
}

impl FromValue for f64 {
    fn target_type() -> ValueType {
        ValueType::Float
    }

    fn from_value(value: Value) -> Result<Self, EvalError> {
        value.as_float().ok_or_else(|| wrong_type(&value, &ValueType::Float))
    }
}

impl FromValue for String {
    fn target_type() -> ValueType {
        ValueType::String
    }

    fn from_value(value: Value) -> Result<Self, EvalError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(wrong_type(&other, &ValueType::String)),
        }
    }
}

impl FromValue for Vec<Value> {
    fn target_type() -> ValueType {
        ValueType::List
    }

    fn from_value(value: Value) -> Result<Self, EvalError> {
        value.items().ok_or_else(|| wrong_type(&value, &ValueType::List))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn target_type() -> ValueType {
        T::target_type()
    }

    fn from_value(value: Value) -> Result<Self, EvalError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[test]
fn test_string_conversions() {
    let converter = DefaultConverter;
    assert_eq!(
        converter.convert(Value::string("false"), &ValueType::Boolean).unwrap(),
        Value::Boolean(false)
    );
    assert_eq!(
        converter.convert(Value::string(" 42 "), &ValueType::Integer).unwrap(),
        Value::Integer(42)
    );
    assert!(converter.convert(Value::string("maybe"), &ValueType::Boolean).is_err());
    assert!(!converter.can_convert(&Value::Float(1.5), &ValueType::Integer));
}
