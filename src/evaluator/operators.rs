//! Operator semantics shared by the interpreter and compiled expressions.

use std::cmp::Ordering;

use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::{
    ast::BinOp,
    evaluator::{EvalError, MAX_GENERATED_LENGTH},
    value::Value,
};

/// Applies a non-short-circuiting binary operator.
pub fn apply_binary(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Add => add(left, right),
        BinOp::Subtract => subtract(left, right),
        BinOp::Multiply => multiply(left, right),
        BinOp::Divide => divide(left, right),
        BinOp::Modulo => modulo(left, right),
        BinOp::Power => power(left, right),
        BinOp::Equal => Ok(Value::Boolean(values_equal(left, right))),
        BinOp::NotEqual => Ok(Value::Boolean(!values_equal(left, right))),
        BinOp::LessThan => Ok(Value::Boolean(compare(left, right)?.is_lt())),
        BinOp::GreaterThan => Ok(Value::Boolean(compare(left, right)?.is_gt())),
        BinOp::LessEqual => Ok(Value::Boolean(compare(left, right)?.is_le())),
        BinOp::GreaterEqual => Ok(Value::Boolean(compare(left, right)?.is_ge())),
        BinOp::Between => between(left, right),
        BinOp::Matches => matches(left, right),
        BinOp::InstanceOf => instance_of(left, right),
        BinOp::And | BinOp::Or => match (left, right) {
            (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(if op == BinOp::And {
                *a && *b
            } else {
                *a || *b
            })),
            _ => Err(EvalError::type_mismatch(format!(
                "'{}' requires boolean operands, got {} and {}",
                op,
                left.type_name(),
                right.type_name()
            ))),
        },
    }
}

/// Whether `?:` should fall through to its right operand.
pub fn elvis_falls_through(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn mismatch(op: &str, left: &Value, right: &Value) -> EvalError {
    EvalError::type_mismatch(format!(
        "operator '{}' is not supported between {} and {}",
        op,
        left.type_name(),
        right.type_name()
    ))
}

fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Integer(n) => Decimal::from_i64(*n),
        Value::Float(n) => Decimal::from_f64(*n),
        _ => None,
    }
}

/// Mixed integer/float arithmetic goes through `Decimal` so that values like
/// `1 + 0.1` stay exact before being turned back into a float.
fn mixed(
    left: &Value,
    right: &Value,
    exact: fn(Decimal, Decimal) -> Option<Decimal>,
    approximate: fn(f64, f64) -> f64,
) -> Value {
    let result = match (to_decimal(left), to_decimal(right)) {
        (Some(a), Some(b)) => exact(a, b).and_then(|d| d.to_f64()),
        _ => None,
    };
    Value::Float(result.unwrap_or_else(|| {
        approximate(
            left.as_float().unwrap_or_default(),
            right.as_float().unwrap_or_default(),
        )
    }))
}

/// Runs an arithmetic operator over two numeric operands.
///
/// Returns `None` when either operand is not a number.
fn numeric(
    left: &Value,
    right: &Value,
    integer: impl FnOnce(i64, i64) -> Result<Value, EvalError>,
    exact: fn(Decimal, Decimal) -> Option<Decimal>,
    float: fn(f64, f64) -> f64,
) -> Option<Result<Value, EvalError>> {
    Some(match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => integer(*a, *b),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float(*a, *b))),
        (Value::Integer(_), Value::Float(_)) | (Value::Float(_), Value::Integer(_)) => {
            Ok(mixed(left, right, exact, float))
        }
        _ => return None,
    })
}

pub fn add(left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let Some(result) = numeric(
        left,
        right,
        |a, b| a.checked_add(b).map(Value::Integer).ok_or_else(|| EvalError::overflow("addition")),
        Decimal::checked_add,
        |a, b| a + b,
    ) {
        return result;
    }
    match (left, right) {
        (Value::String(a), b) => Ok(Value::String(format!("{}{}", a, b))),
        (a, Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
        _ => Err(mismatch("+", left, right)),
    }
}

pub fn subtract(left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let Some(result) = numeric(
        left,
        right,
        |a, b| a.checked_sub(b).map(Value::Integer).ok_or_else(|| EvalError::overflow("subtraction")),
        Decimal::checked_sub,
        |a, b| a - b,
    ) {
        return result;
    }
    match (left, right) {
        // 'c' - 1 shifts a single character by code points
        (Value::String(s), Value::Integer(n)) => {
            let mut chars = s.chars();
            let (Some(c), None) = (chars.next(), chars.next()) else {
                return Err(EvalError::type_mismatch(
                    "character arithmetic requires a single-character string",
                ));
            };
            (c as i64)
                .checked_sub(*n)
                .and_then(|code| u32::try_from(code).ok())
                .and_then(char::from_u32)
                .map(|c| Value::String(c.to_string()))
                .ok_or_else(|| EvalError::type_mismatch(format!("'{}' - {} is not a valid character", c, n)))
        }
        _ => Err(mismatch("-", left, right)),
    }
}

pub fn multiply(left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let Some(result) = numeric(
        left,
        right,
        |a, b| a.checked_mul(b).map(Value::Integer).ok_or_else(|| EvalError::overflow("multiplication")),
        Decimal::checked_mul,
        |a, b| a * b,
    ) {
        return result;
    }
    match (left, right) {
        (Value::String(s), Value::Integer(n)) if *n >= 0 => repeat(s, *n),
        _ => Err(mismatch("*", left, right)),
    }
}

fn repeat(s: &str, count: i64) -> Result<Value, EvalError> {
    let fits = usize::try_from(count)
        .ok()
        .and_then(|count| s.len().checked_mul(count))
        .is_some_and(|length| length <= MAX_GENERATED_LENGTH);
    if !fits {
        return Err(EvalError::too_large("repeated string", s.len() as i128 * count as i128));
    }
    Ok(Value::String(s.repeat(count as usize)))
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Integer(n) => *n == 0,
        Value::Float(n) => *n == 0.0,
        _ => false,
    }
}

pub fn divide(left: &Value, right: &Value) -> Result<Value, EvalError> {
    if left.is_number() && is_zero(right) {
        return Err(EvalError::division_by_zero());
    }
    match (left, right) {
        // integer division truncates toward zero
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_div(*b)
            .map(Value::Integer)
            .ok_or_else(|| EvalError::overflow("division")),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float(a / b)),
            _ => Err(mismatch("/", left, right)),
        },
    }
}

pub fn modulo(left: &Value, right: &Value) -> Result<Value, EvalError> {
    if left.is_number() && is_zero(right) {
        return Err(EvalError::division_by_zero());
    }
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_rem(*b)
            .map(Value::Integer)
            .ok_or_else(|| EvalError::overflow("modulo")),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float(a % b)),
            _ => Err(mismatch("%", left, right)),
        },
    }
}

pub fn power(left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Integer(base), Value::Integer(exp)) if *exp >= 0 => {
            let exp = u32::try_from(*exp).map_err(|_| EvalError::overflow("exponentiation"))?;
            base.checked_pow(exp)
                .map(Value::Integer)
                .ok_or_else(|| EvalError::overflow("exponentiation"))
        }
        _ => match (left.as_float(), right.as_float()) {
            (Some(base), Some(exp)) => Ok(Value::Float(base.powf(exp))),
            _ => Err(mismatch("^", left, right)),
        },
    }
}

pub fn negate(value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::Integer(n) => n
            .checked_neg()
            .map(Value::Integer)
            .ok_or_else(|| EvalError::overflow("negation")),
        Value::Float(n) => Ok(Value::Float(-n)),
        other => Err(EvalError::type_mismatch(format!(
            "cannot negate {}",
            other.type_name()
        ))),
    }
}

pub fn unary_plus(value: &Value) -> Result<Value, EvalError> {
    if value.is_number() {
        Ok(value.clone())
    } else {
        Err(EvalError::type_mismatch(format!(
            "unary '+' requires a number, got {}",
            value.type_name()
        )))
    }
}

/// Equality with numeric promotion: `1 == 1.0` holds.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => (*a as f64) == *b,
        _ => left == right,
    }
}

/// Orders two values. Null sorts before everything else.
pub fn compare(left: &Value, right: &Value) -> Result<Ordering, EvalError> {
    let ordering = match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        (Value::Enum(a), Value::Enum(b)) if a.type_name == b.type_name => Some(a.ordinal.cmp(&b.ordinal)),
        _ => match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) if left.is_number() && right.is_number() => a.partial_cmp(&b),
            _ => None,
        },
    };
    ordering.ok_or_else(|| {
        EvalError::type_mismatch(format!(
            "cannot compare {} with {}",
            left.type_name(),
            right.type_name()
        ))
    })
}

/// `value between {low, high}`, inclusive on both ends.
pub fn between(value: &Value, range: &Value) -> Result<Value, EvalError> {
    let bounds = match range {
        Value::List(list) => list.borrow().items.clone(),
        _ => Vec::new(),
    };
    let [low, high] = bounds.as_slice() else {
        return Err(EvalError::type_mismatch(
            "right operand of 'between' must be a list of two elements",
        ));
    };
    Ok(Value::Boolean(
        compare(value, low)?.is_ge() && compare(value, high)?.is_le(),
    ))
}

/// `text matches pattern`; the pattern must match the whole string.
pub fn matches(text: &Value, pattern: &Value) -> Result<Value, EvalError> {
    let (Value::String(text), Value::String(pattern)) = (text, pattern) else {
        return Err(mismatch("matches", text, pattern));
    };
    let regex = Regex::new(&format!("^(?:{})$", pattern))
        .map_err(|e| EvalError::invalid_pattern(pattern, e))?;
    Ok(Value::Boolean(regex.is_match(text)))
}

/// `value instanceof T(Name)`. Null is an instance of nothing.
pub fn instance_of(value: &Value, type_ref: &Value) -> Result<Value, EvalError> {
    let Value::Type(name) = type_ref else {
        return Err(EvalError::type_mismatch(
            "right operand of 'instanceof' must be a type reference",
        ));
    };
    let simple = name.rsplit('.').next().unwrap_or(name);
    let result = match value {
        Value::Null => false,
        _ if simple == "Object" => true,
        _ if simple == "Number" => value.is_number(),
        _ => value.type_name() == simple,
    };
    Ok(Value::Boolean(result))
}

#[test]
fn test_mixed_arithmetic_is_exact() {
    assert_eq!(add(&Value::Integer(1), &Value::Float(0.1)).unwrap(), Value::Float(1.1));
    assert_eq!(multiply(&Value::Integer(2), &Value::Float(1.5)).unwrap(), Value::Float(3.0));
}

#[test]
fn test_character_subtraction() {
    assert_eq!(
        subtract(&Value::string("c"), &Value::Integer(2)).unwrap(),
        Value::string("a")
    );
    assert!(subtract(&Value::string("ab"), &Value::Integer(1)).is_err());
}
