//! Methods available on built-in values (`'abc'.toUpperCase()`, `list.size()`).
//!
//! Host objects answer their own methods first; these are consulted
//! afterwards, so every value also understands `toString()` and `equals()`.

use regex::Regex;

use crate::{
    evaluator::{EvalError, key_string, operators},
    value::{Value, ValueType},
};

pub type BuiltinMethod = fn(&Value, &[Value]) -> Result<Value, EvalError>;

/// Finds a built-in method for `receiver`.
pub fn lookup(receiver: &Value, name: &str) -> Option<BuiltinMethod> {
    let method: BuiltinMethod = match (receiver, name) {
        (_, "toString") => method_to_string,
        (_, "equals") => method_equals,
        (Value::String(_), "concat") => method_concat,
        (Value::String(_), "toUpperCase") => method_to_upper_case,
        (Value::String(_), "toLowerCase") => method_to_lower_case,
        (Value::String(_), "length") => method_length,
        (Value::String(_), "getBytes") => method_get_bytes,
        (Value::String(_), "substring") => method_substring,
        (Value::String(_), "charAt") => method_char_at,
        (Value::String(_), "contains") => method_contains,
        (Value::String(_), "startsWith") => method_starts_with,
        (Value::String(_), "endsWith") => method_ends_with,
        (Value::String(_), "indexOf") => method_index_of,
        (Value::String(_), "trim") => method_trim,
        (Value::String(_), "replace") => method_replace,
        (Value::String(_), "split") => method_split,
        (Value::String(_), "repeat") => method_repeat,
        (Value::String(_), "formatted") => method_formatted,
        (Value::String(_) | Value::List(_) | Value::Map(_), "isEmpty") => method_is_empty,
        (Value::List(_) | Value::Map(_), "size") => method_size,
        (Value::List(_), "get") => method_list_get,
        (Value::List(_), "contains") => method_list_contains,
        (Value::List(_), "indexOf") => method_list_index_of,
        (Value::Map(_), "get") => method_map_get,
        (Value::Map(_), "containsKey") => method_contains_key,
        (Value::Map(_), "containsValue") => method_contains_value,
        (Value::Map(_), "keySet") => method_key_set,
        (Value::Map(_), "values") => method_values,
        (Value::Enum(_), "name") => method_enum_name,
        (Value::Enum(_), "ordinal") => method_enum_ordinal,
        _ => return None,
    };
    Some(method)
}

fn arity(receiver: &Value, method: &str, args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::method_not_found(method, &receiver.type_name(), args.len()))
    }
}

fn text<'a>(receiver: &'a Value, method: &str) -> Result<&'a str, EvalError> {
    receiver
        .as_str()
        .ok_or_else(|| EvalError::type_mismatch(format!("{}() requires a string receiver", method)))
}

fn string_arg<'a>(method: &str, arg: &'a Value) -> Result<&'a str, EvalError> {
    arg.as_str().ok_or_else(|| {
        EvalError::type_mismatch(format!(
            "{}() expects a string argument, got {}",
            method,
            arg.type_name()
        ))
    })
}

fn index_arg(method: &str, arg: &Value) -> Result<i64, EvalError> {
    arg.as_int().ok_or_else(|| {
        EvalError::type_mismatch(format!(
            "{}() expects an integer argument, got {}",
            method,
            arg.type_name()
        ))
    })
}

fn method_to_string(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "toString", args, 0)?;
    Ok(Value::String(receiver.to_string()))
}

fn method_equals(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "equals", args, 1)?;
    Ok(Value::Boolean(operators::values_equal(receiver, &args[0])))
}

fn method_concat(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "concat", args, 1)?;
    let suffix = string_arg("concat", &args[0])?;
    Ok(Value::String(format!("{}{}", text(receiver, "concat")?, suffix)))
}

fn method_to_upper_case(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "toUpperCase", args, 0)?;
    Ok(Value::String(text(receiver, "toUpperCase")?.to_uppercase()))
}

fn method_to_lower_case(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "toLowerCase", args, 0)?;
    Ok(Value::String(text(receiver, "toLowerCase")?.to_lowercase()))
}

fn method_length(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "length", args, 0)?;
    Ok(Value::Integer(text(receiver, "length")?.chars().count() as i64))
}

fn method_get_bytes(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "getBytes", args, 0)?;
    let bytes = text(receiver, "getBytes")?
        .bytes()
        .map(|b| Value::Integer(b as i64))
        .collect();
    Ok(Value::array(ValueType::Integer, bytes))
}

/// Resolves a character range, failing like `String.substring` does.
fn char_range(s: &str, start: i64, end: i64) -> Result<String, EvalError> {
    let len = s.chars().count();
    if start < 0 || end < start || end as usize > len {
        let bad = if start < 0 || start as usize > len { start } else { end };
        return Err(EvalError::index_out_of_bounds(bad, len));
    }
    Ok(s.chars()
        .skip(start as usize)
        .take((end - start) as usize)
        .collect())
}

fn method_substring(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let s = text(receiver, "substring")?;
    let start = match args.first() {
        Some(arg) => index_arg("substring", arg)?,
        None => return Err(EvalError::method_not_found("substring", "String", 0)),
    };
    let end = match args {
        [_] => s.chars().count() as i64,
        [_, end] => index_arg("substring", end)?,
        _ => return Err(EvalError::method_not_found("substring", "String", args.len())),
    };
    char_range(s, start, end).map(Value::String)
}

fn method_char_at(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "charAt", args, 1)?;
    let index = index_arg("charAt", &args[0])?;
    char_range(text(receiver, "charAt")?, index, index.saturating_add(1)).map(Value::String)
}

fn method_contains(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "contains", args, 1)?;
    let needle = string_arg("contains", &args[0])?;
    Ok(Value::Boolean(text(receiver, "contains")?.contains(needle)))
}

fn method_starts_with(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "startsWith", args, 1)?;
    let prefix = string_arg("startsWith", &args[0])?;
    Ok(Value::Boolean(text(receiver, "startsWith")?.starts_with(prefix)))
}

fn method_ends_with(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "endsWith", args, 1)?;
    let suffix = string_arg("endsWith", &args[0])?;
    Ok(Value::Boolean(text(receiver, "endsWith")?.ends_with(suffix)))
}

fn method_index_of(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "indexOf", args, 1)?;
    let s = text(receiver, "indexOf")?;
    let needle = string_arg("indexOf", &args[0])?;
    let index = s
        .find(needle)
        .map(|byte| s[..byte].chars().count() as i64)
        .unwrap_or(-1);
    Ok(Value::Integer(index))
}

fn method_trim(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "trim", args, 0)?;
    Ok(Value::String(text(receiver, "trim")?.trim().to_string()))
}

fn method_replace(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "replace", args, 2)?;
    let from = string_arg("replace", &args[0])?;
    let to = string_arg("replace", &args[1])?;
    Ok(Value::String(text(receiver, "replace")?.replace(from, to)))
}

/// Splits around a regular expression, dropping trailing empty strings.
fn method_split(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "split", args, 1)?;
    let pattern = string_arg("split", &args[0])?;
    let regex = Regex::new(pattern).map_err(|e| EvalError::invalid_pattern(pattern, e))?;
    let mut parts: Vec<&str> = regex.split(text(receiver, "split")?).collect();
    while parts.len() > 1 && parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    Ok(Value::array(
        ValueType::String,
        parts.into_iter().map(Value::string).collect(),
    ))
}

fn method_repeat(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "repeat", args, 1)?;
    operators::multiply(receiver, &args[0])
}

/// Most fraction digits `%.Nf` will print.
const MAX_FORMAT_PRECISION: usize = 100;

/// `'%s is %d'.formatted(name, age)` with `%s`, `%d`, `%f`, `%.Nf`, `%n`, and `%%`.
fn method_formatted(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let format = text(receiver, "formatted")?;
    let mut out = String::new();
    let mut args = args.iter();
    let mut chars = format.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        let mut precision = None;
        if chars.peek() == Some(&'.') {
            chars.next();
            let mut digits = String::new();
            while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                digits.push(*d);
                chars.next();
            }
            let parsed = digits.parse::<usize>().ok().filter(|p| *p <= MAX_FORMAT_PRECISION);
            precision = Some(parsed.ok_or_else(|| {
                EvalError::type_mismatch(format!(
                    "precision '.{}' must be a number no larger than {}",
                    digits, MAX_FORMAT_PRECISION
                ))
            })?);
        }
        let conversion = chars
            .next()
            .ok_or_else(|| EvalError::type_mismatch("format string ends with '%'"))?;
        match conversion {
            '%' => out.push('%'),
            'n' => out.push('\n'),
            's' | 'd' | 'f' => {
                let arg = args.next().ok_or_else(|| {
                    EvalError::type_mismatch(format!("missing argument for '%{}'", conversion))
                })?;
                match (conversion, arg) {
                    ('s', arg) => out.push_str(&arg.to_string()),
                    ('d', Value::Integer(n)) => out.push_str(&n.to_string()),
                    ('f', arg) if arg.is_number() => {
                        let n = arg.as_float().unwrap_or_default();
                        out.push_str(&format!("{:.*}", precision.unwrap_or(6), n));
                    }
                    (c, arg) => {
                        return Err(EvalError::type_mismatch(format!(
                            "'%{}' cannot format {}",
                            c,
                            arg.type_name()
                        )));
                    }
                }
            }
            other => {
                return Err(EvalError::type_mismatch(format!(
                    "unknown format conversion '%{}'",
                    other
                )));
            }
        }
    }
    Ok(Value::String(out))
}

fn method_is_empty(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "isEmpty", args, 0)?;
    let empty = match receiver {
        Value::String(s) => s.is_empty(),
        Value::List(list) => list.borrow().items.is_empty(),
        Value::Map(map) => map.borrow().is_empty(),
        _ => false,
    };
    Ok(Value::Boolean(empty))
}

fn method_size(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "size", args, 0)?;
    let size = match receiver {
        Value::List(list) => list.borrow().items.len(),
        Value::Map(map) => map.borrow().len(),
        _ => 0,
    };
    Ok(Value::Integer(size as i64))
}

fn method_list_get(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "get", args, 1)?;
    let index = index_arg("get", &args[0])?;
    let items = receiver.items().unwrap_or_default();
    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i).cloned())
        .ok_or_else(|| EvalError::index_out_of_bounds(index, items.len()))
}

fn method_list_contains(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "contains", args, 1)?;
    let items = receiver.items().unwrap_or_default();
    Ok(Value::Boolean(
        items.iter().any(|item| operators::values_equal(item, &args[0])),
    ))
}

fn method_list_index_of(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "indexOf", args, 1)?;
    let items = receiver.items().unwrap_or_default();
    let index = items
        .iter()
        .position(|item| operators::values_equal(item, &args[0]))
        .map_or(-1, |i| i as i64);
    Ok(Value::Integer(index))
}

fn method_map_get(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "get", args, 1)?;
    let Value::Map(map) = receiver else {
        return Ok(Value::Null);
    };
    Ok(map
        .borrow()
        .get(&key_string(&args[0]))
        .cloned()
        .unwrap_or(Value::Null))
}

fn method_contains_key(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "containsKey", args, 1)?;
    let Value::Map(map) = receiver else {
        return Ok(Value::Boolean(false));
    };
    Ok(Value::Boolean(map.borrow().contains_key(&key_string(&args[0]))))
}

fn method_contains_value(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "containsValue", args, 1)?;
    let Value::Map(map) = receiver else {
        return Ok(Value::Boolean(false));
    };
    Ok(Value::Boolean(
        map.borrow().values().any(|v| operators::values_equal(v, &args[0])),
    ))
}

fn method_key_set(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "keySet", args, 0)?;
    let Value::Map(map) = receiver else {
        return Ok(Value::list(Vec::new()));
    };
    let keys = map.borrow().keys().map(Value::string).collect();
    Ok(Value::typed_list(ValueType::String, keys))
}

fn method_values(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "values", args, 0)?;
    let Value::Map(map) = receiver else {
        return Ok(Value::list(Vec::new()));
    };
    let values = map.borrow().values().cloned().collect();
    Ok(Value::list(values))
}

fn method_enum_name(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "name", args, 0)?;
    match receiver {
        Value::Enum(constant) => Ok(Value::String(constant.name.clone())),
        other => Err(EvalError::type_mismatch(format!("{} is not an enum", other.type_name()))),
    }
}

fn method_enum_ordinal(receiver: &Value, args: &[Value]) -> Result<Value, EvalError> {
    arity(receiver, "ordinal", args, 0)?;
    match receiver {
        Value::Enum(constant) => Ok(Value::Integer(constant.ordinal as i64)),
        other => Err(EvalError::type_mismatch(format!("{} is not an enum", other.type_name()))),
    }
}

#[test]
fn test_formatted() {
    let result = method_formatted(
        &Value::string("%s is %d (%.2f%%)"),
        &[Value::string("Tesla"), Value::Integer(86), Value::Float(0.5)],
    )
    .unwrap();
    assert_eq!(result, Value::string("Tesla is 86 (0.50%)"));
}

#[test]
fn test_substring_bounds() {
    let s = Value::string("hello");
    assert_eq!(method_substring(&s, &[Value::Integer(1), Value::Integer(3)]).unwrap(), Value::string("el"));
    assert!(method_substring(&s, &[Value::Integer(4), Value::Integer(9)]).is_err());
}
