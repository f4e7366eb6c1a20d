//! Property accessors consulted, in order, when an expression reads or
//! writes `target.name`.

use std::rc::Rc;

use crate::{
    beans::BeanResolver,
    environment::{Namespace, NamespaceView, PropertySource},
    evaluator::{EvalError, methods},
    value::Value,
};

/// Resolves named properties on a target value.
///
/// The context asks each accessor in turn; the first whose `can_read`
/// (or `can_write`) answers yes handles the operation.
pub trait PropertyAccessor {
    fn can_read(&self, target: &Value, name: &str) -> bool;

    fn read(&self, target: &Value, name: &str) -> Result<Value, EvalError>;

    fn can_write(&self, _target: &Value, _name: &str) -> bool {
        false
    }

    fn write(&self, target: &Value, name: &str, _value: Value) -> Result<(), EvalError> {
        Err(EvalError::write_not_permitted(format!(
            "property '{}' of {} is read-only",
            name,
            target.type_name()
        )))
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `placeOfBirth` → `getPlaceOfBirth`.
pub fn getter_name(property: &str) -> String {
    format!("get{}", capitalize(property))
}

/// `active` → `isActive`.
pub fn predicate_name(property: &str) -> String {
    format!("is{}", capitalize(property))
}

/// `name` → `setName`.
pub fn setter_name(property: &str) -> String {
    format!("set{}", capitalize(property))
}

fn busy() -> EvalError {
    EvalError::type_mismatch("object is already in use")
}

/// Reads through `getX()`/`isX()` and writes through `setX(value)`.
///
/// Also exposes zero-argument built-in methods as properties, so
/// `'abc'.bytes` calls `getBytes()` and `list.empty` calls `isEmpty()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GetterAccessor;

impl GetterAccessor {
    fn getter_for(target: &Value, name: &str) -> Option<String> {
        [getter_name(name), predicate_name(name)]
            .into_iter()
            .find(|candidate| match target {
                Value::Object(obj) => obj
                    .try_borrow()
                    .is_ok_and(|obj| obj.has_method(candidate)),
                other => methods::lookup(other, candidate).is_some(),
            })
    }
}

impl PropertyAccessor for GetterAccessor {
    fn can_read(&self, target: &Value, name: &str) -> bool {
        !target.is_null() && Self::getter_for(target, name).is_some()
    }

    fn read(&self, target: &Value, name: &str) -> Result<Value, EvalError> {
        let getter = Self::getter_for(target, name)
            .ok_or_else(|| EvalError::property_not_found(name, &target.type_name()))?;
        match target {
            Value::Object(obj) => obj
                .try_borrow_mut()
                .map_err(|_| busy())?
                .invoke(&getter, &[])
                .unwrap_or_else(|| Err(EvalError::method_not_found(&getter, &target.type_name(), 0))),
            other => match methods::lookup(other, &getter) {
                Some(method) => method(other, &[]),
                None => Err(EvalError::property_not_found(name, &other.type_name())),
            },
        }
    }

    fn can_write(&self, target: &Value, name: &str) -> bool {
        match target {
            Value::Object(obj) => obj
                .try_borrow()
                .is_ok_and(|obj| obj.has_method(&setter_name(name))),
            _ => false,
        }
    }

    fn write(&self, target: &Value, name: &str, value: Value) -> Result<(), EvalError> {
        let Value::Object(obj) = target else {
            return Err(EvalError::property_not_found(name, &target.type_name()));
        };
        let setter = setter_name(name);
        let result = obj
            .try_borrow_mut()
            .map_err(|_| busy())?
            .invoke(&setter, &[value]);
        result
            .unwrap_or_else(|| Err(EvalError::method_not_found(&setter, &target.type_name(), 1)))
            .map(|_| ())
    }
}

/// Reads and writes host-object fields and map entries directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldAccessor;

impl PropertyAccessor for FieldAccessor {
    fn can_read(&self, target: &Value, name: &str) -> bool {
        match target {
            Value::Object(obj) => obj.try_borrow().is_ok_and(|obj| obj.field(name).is_some()),
            Value::Map(map) => map.borrow().contains_key(name),
            _ => false,
        }
    }

    fn read(&self, target: &Value, name: &str) -> Result<Value, EvalError> {
        let found = match target {
            Value::Object(obj) => obj.try_borrow().map_err(|_| busy())?.field(name),
            Value::Map(map) => map.borrow().get(name).cloned(),
            _ => None,
        };
        found.ok_or_else(|| EvalError::property_not_found(name, &target.type_name()))
    }

    fn can_write(&self, target: &Value, name: &str) -> bool {
        match target {
            Value::Object(obj) => obj.try_borrow().is_ok_and(|obj| obj.field(name).is_some()),
            Value::Map(_) => true,
            _ => false,
        }
    }

    fn write(&self, target: &Value, name: &str, value: Value) -> Result<(), EvalError> {
        match target {
            Value::Object(obj) => obj
                .try_borrow_mut()
                .map_err(|_| busy())?
                .set_field(name, value)
                .unwrap_or_else(|| Err(EvalError::property_not_found(name, &target.type_name()))),
            Value::Map(map) => {
                map.borrow_mut().insert(name.to_string(), value);
                Ok(())
            }
            other => Err(EvalError::property_not_found(name, &other.type_name())),
        }
    }
}

/// Resolves `environment`, `systemProperties`, and `systemEnvironment` to
/// views over a [`PropertySource`]. Indexing a view with a missing key
/// yields null.
#[derive(Debug, Clone)]
pub struct PropertySourceAccessor {
    source: Rc<dyn PropertySource>,
}

impl PropertySourceAccessor {
    pub fn new(source: Rc<dyn PropertySource>) -> Self {
        PropertySourceAccessor { source }
    }
}

impl PropertyAccessor for PropertySourceAccessor {
    fn can_read(&self, _target: &Value, name: &str) -> bool {
        Namespace::from_name(name).is_some()
    }

    fn read(&self, target: &Value, name: &str) -> Result<Value, EvalError> {
        let namespace = Namespace::from_name(name)
            .ok_or_else(|| EvalError::property_not_found(name, &target.type_name()))?;
        Ok(Value::object(NamespaceView::new(namespace, Rc::clone(&self.source))))
    }
}

/// Resolves bare names as beans, so `@config.name` can be written `config.name`.
#[derive(Debug, Clone)]
pub struct BeanFactoryAccessor {
    beans: Rc<dyn BeanResolver>,
}

impl BeanFactoryAccessor {
    pub fn new(beans: Rc<dyn BeanResolver>) -> Self {
        BeanFactoryAccessor { beans }
    }
}

impl PropertyAccessor for BeanFactoryAccessor {
    fn can_read(&self, _target: &Value, name: &str) -> bool {
        self.beans.contains_bean(name)
    }

    fn read(&self, _target: &Value, name: &str) -> Result<Value, EvalError> {
        self.beans
            .resolve_bean(name)
            .ok_or_else(|| EvalError::bean_not_found(name))
    }
}

#[test]
fn test_accessor_names() {
    assert_eq!(getter_name("placeOfBirth"), "getPlaceOfBirth");
    assert_eq!(predicate_name("member"), "isMember");
    assert_eq!(setter_name("name"), "setName");
}
