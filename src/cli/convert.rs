//! JSON <-> Value conversion utilities

use std::rc::Rc;

use crate::Value;

/// Convert serde_json::Value to a Value; objects become maps.
pub fn json_to_value(v: serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map_or(Value::Null, Value::Float),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::list(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(obj) => {
            Value::map(obj.into_iter().map(|(k, v)| (k, json_to_value(v))).collect())
        }
    }
}

/// Convert a Value to serde_json::Value.
///
/// Host objects render as their field snapshot, types as `T(Name)`, and enum
/// constants by name. A container nested inside itself becomes the string
/// `"(this Collection)"` or `"(this Map)"`.
pub fn value_to_json(v: &Value) -> serde_json::Value {
    to_json(v, &mut Vec::new())
}

fn to_json(v: &Value, path: &mut Vec<*const ()>) -> serde_json::Value {
    let address = match v {
        Value::List(list) => Rc::as_ptr(list) as *const (),
        Value::Map(map) => Rc::as_ptr(map) as *const (),
        Value::Object(obj) => Rc::as_ptr(obj) as *const (),
        _ => std::ptr::null(),
    };
    if !address.is_null() && path.contains(&address) {
        let placeholder = match v {
            Value::List(_) => "(this Collection)",
            Value::Map(_) => "(this Map)",
            _ => "(this Object)",
        };
        return serde_json::Value::String(placeholder.to_string());
    }

    path.push(address);
    let json = match v {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Integer(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::List(list) => serde_json::Value::Array(
            list.borrow().items.iter().map(|item| to_json(item, path)).collect(),
        ),
        Value::Map(map) => serde_json::Value::Object(
            map.borrow()
                .iter()
                .map(|(k, v)| (k.clone(), to_json(v, path)))
                .collect(),
        ),
        Value::Object(obj) => match obj.try_borrow() {
            Ok(obj) => serde_json::Value::Object(
                obj.fields()
                    .iter()
                    .map(|(k, v)| (k.clone(), to_json(v, path)))
                    .collect(),
            ),
            Err(_) => serde_json::Value::Null,
        },
        Value::Type(_) | Value::Enum(_) => serde_json::Value::String(v.to_string()),
    };
    path.pop();
    json
}

#[test]
fn test_json_objects_become_maps() {
    let value = json_to_value(serde_json::json!({"name": "Tesla", "age": 86, "tags": [1.5]}));
    assert_eq!(value.type_name(), "Map");
    assert_eq!(value_to_json(&value), serde_json::json!({"name": "Tesla", "age": 86, "tags": [1.5]}));
}

#[test]
fn test_self_referential_map_renders_a_placeholder() {
    let map = Value::map_from([("name", "loop")]);
    if let Value::Map(inner) = &map {
        inner.borrow_mut().insert("self".to_string(), map.clone());
    }
    assert_eq!(
        value_to_json(&map),
        serde_json::json!({"name": "loop", "self": "(this Map)"})
    );
}
