use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc, thread::LocalKey};

use indexmap::IndexMap;

use crate::evaluator::EvalError;

/// Shared, interior-mutable storage for lists, maps, and host objects.
///
/// Navigation hands out clones of the `Rc`, so an assignment through
/// `inventions[0] = 'x'` is visible to every holder of the list.
pub type Shared<T> = Rc<RefCell<T>>;

/// A runtime value produced by evaluating an expression.
///
/// # Examples
///
/// ```
/// use spel_lite::Value;
///
/// let integer = Value::Integer(42);
/// let text = Value::from("hello");
/// let list = Value::list(vec![Value::Integer(1), Value::Integer(2)]);
///
/// assert_eq!(text.to_string(), "hello");
/// assert_eq!(list.to_string(), "[1, 2]");
/// assert_eq!(integer.type_name(), "Integer");
/// ```
#[derive(Clone)]
pub enum Value {
    Null,

    Boolean(bool),

    /// Integer number (kept apart from floats)
    Integer(i64),

    Float(f64),

    String(String),

    /// Growable list or fixed-size array
    List(Shared<ListValue>),

    /// String-keyed map preserving insertion order
    Map(Shared<IndexMap<String, Value>>),

    /// Host object exposing methods and fields through [`HostObject`]
    Object(Shared<dyn HostObject>),

    /// Type reference produced by `T(Name)`
    Type(String),

    /// Constant of a registered enumeration
    Enum(EnumConstant),
}

/// Backing storage of [`Value::List`].
#[derive(Debug, Clone, PartialEq)]
pub struct ListValue {
    /// Declared element type, used for conversion on write and for auto-grow padding
    pub element_type: ValueType,
    pub items: Vec<Value>,
    /// Arrays never grow
    pub fixed: bool,
}

/// A constant of an enumeration registered in the type registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConstant {
    pub type_name: String,
    pub name: String,
    pub ordinal: usize,
}

/// Declared type used for conversions, list elements, and typed evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ValueType {
    #[default]
    Any,
    Boolean,
    Integer,
    Float,
    String,
    List,
    Map,
    /// Host object or enum type, by registered name
    Object(String),
}

impl ValueType {
    /// Resolves element type names as written in `new int[3]` or `List<String>`.
    pub fn from_name(name: &str) -> ValueType {
        match name {
            "int" | "long" | "short" | "byte" | "Integer" | "Long" | "Short" | "Byte" => {
                ValueType::Integer
            }
            "float" | "double" | "Float" | "Double" => ValueType::Float,
            "boolean" | "Boolean" => ValueType::Boolean,
            "char" | "String" | "Character" => ValueType::String,
            "List" => ValueType::List,
            "Map" => ValueType::Map,
            "Object" | "any" => ValueType::Any,
            other => ValueType::Object(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ValueType::Any => "Object",
            ValueType::Boolean => "Boolean",
            ValueType::Integer => "Integer",
            ValueType::Float => "Float",
            ValueType::String => "String",
            ValueType::List => "List",
            ValueType::Map => "Map",
            ValueType::Object(name) => name,
        }
    }

    /// Value used to pad auto-grown lists and fresh arrays.
    pub fn default_value(&self) -> Value {
        match self {
            ValueType::Boolean => Value::Boolean(false),
            ValueType::Integer => Value::Integer(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::String => Value::String(String::new()),
            ValueType::List => Value::list(Vec::new()),
            ValueType::Map => Value::map(IndexMap::new()),
            ValueType::Any | ValueType::Object(_) => Value::Null,
        }
    }

    /// Whether `value` already satisfies this type without conversion.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Any, _) => true,
            (_, Value::Null) => !matches!(
                self,
                ValueType::Boolean | ValueType::Integer | ValueType::Float
            ),
            (ValueType::Boolean, Value::Boolean(_))
            | (ValueType::Integer, Value::Integer(_))
            | (ValueType::Float, Value::Float(_))
            | (ValueType::String, Value::String(_))
            | (ValueType::List, Value::List(_))
            | (ValueType::Map, Value::Map(_)) => true,
            (ValueType::Object(name), other) => other.type_name() == *name,
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An object whose members can be reached from expressions.
///
/// Property reads follow the accessor convention first (`getName()` or
/// `isActive()` via [`has_method`](Self::has_method)/[`invoke`](Self::invoke)),
/// then direct [`field`](Self::field) lookup. Writes use `setName(value)`, then
/// [`set_field`](Self::set_field).
pub trait HostObject: fmt::Debug {
    fn type_name(&self) -> &str;

    fn has_method(&self, _name: &str) -> bool {
        false
    }

    /// Calls a declared method. `None` when the object has no such method.
    fn invoke(&mut self, _method: &str, _args: &[Value]) -> Option<Result<Value, EvalError>> {
        None
    }

    fn field(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Writes a field directly. `None` when the object has no such field.
    fn set_field(&mut self, _name: &str, _value: Value) -> Option<Result<(), EvalError>> {
        None
    }

    /// Declared type of a property, consulted for write conversion and
    /// null-reference auto-grow.
    fn property_type(&self, _name: &str) -> Option<ValueType> {
        None
    }

    /// Snapshot of the object's state, used for rendering.
    fn fields(&self) -> Vec<(String, Value)> {
        Vec::new()
    }

    fn describe(&self) -> String {
        let fields = self
            .fields()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}{{{}}}", self.type_name(), fields)
    }
}

/// A plain data record: a type name plus named, optionally typed fields.
#[derive(Debug, Clone, Default)]
pub struct Record {
    type_name: String,
    fields: IndexMap<String, Value>,
    types: HashMap<String, ValueType>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Record {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_typed_field(
        mut self,
        name: impl Into<String>,
        field_type: ValueType,
        value: impl Into<Value>,
    ) -> Self {
        let name = name.into();
        self.types.insert(name.clone(), field_type);
        self.fields.insert(name, value.into());
        self
    }

    pub fn into_value(self) -> Value {
        Value::object(self)
    }
}

impl HostObject for Record {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    fn set_field(&mut self, name: &str, value: Value) -> Option<Result<(), EvalError>> {
        let slot = self.fields.get_mut(name)?;
        *slot = value;
        Some(Ok(()))
    }

    fn property_type(&self, name: &str) -> Option<ValueType> {
        self.types.get(name).cloned()
    }

    fn fields(&self) -> Vec<(String, Value)> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }

    /// Untyped growable list.
    pub fn list(items: Vec<Value>) -> Value {
        Value::typed_list(ValueType::Any, items)
    }

    pub fn typed_list(element_type: ValueType, items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(ListValue {
            element_type,
            items,
            fixed: false,
        })))
    }

    /// Fixed-size array.
    pub fn array(element_type: ValueType, items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(ListValue {
            element_type,
            items,
            fixed: true,
        })))
    }

    pub fn map(entries: IndexMap<String, Value>) -> Value {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    pub fn map_from<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Value
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn object<T: HostObject + 'static>(object: T) -> Value {
        Value::Object(Rc::new(RefCell::new(object)))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value widened to a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Snapshot of a list's elements.
    pub fn items(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(list) => Some(list.borrow().items.clone()),
            _ => None,
        }
    }

    /// Runtime type name, as matched by `instanceof`.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Boolean(_) => "Boolean".to_string(),
            Value::Integer(_) => "Integer".to_string(),
            Value::Float(_) => "Float".to_string(),
            Value::String(_) => "String".to_string(),
            Value::List(list) if list.borrow().fixed => "Array".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
            Value::Object(obj) => match obj.try_borrow() {
                Ok(obj) => obj.type_name().to_string(),
                Err(_) => "Object".to_string(),
            },
            Value::Type(_) => "Type".to_string(),
            Value::Enum(constant) => constant.type_name.clone(),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Any,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::List(_) => ValueType::List,
            Value::Map(_) => ValueType::Map,
            other => ValueType::Object(other.type_name()),
        }
    }
}

thread_local! {
    /// Containers being rendered on this thread, outermost first.
    static RENDERING: RefCell<Vec<(usize, usize)>> = const { RefCell::new(Vec::new()) };
    /// Container pairs being compared on this thread.
    static COMPARING: RefCell<Vec<(usize, usize)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a container as visited until dropped, so walks over
/// self-referential lists and maps terminate.
struct Visit(&'static LocalKey<RefCell<Vec<(usize, usize)>>>);

impl Visit {
    /// `None` when `key` is already being visited further up the stack.
    fn enter(stack: &'static LocalKey<RefCell<Vec<(usize, usize)>>>, key: (usize, usize)) -> Option<Self> {
        stack.with_borrow_mut(|visiting| {
            if visiting.contains(&key) {
                return None;
            }
            visiting.push(key);
            Some(Visit(stack))
        })
    }
}

impl Drop for Visit {
    fn drop(&mut self) {
        self.0.with_borrow_mut(|visiting| {
            visiting.pop();
        });
    }
}

fn address<T: ?Sized>(shared: &Shared<T>) -> usize {
    Rc::as_ptr(shared) as *const () as usize
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Boolean(a), Boolean(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (String(a), String(b)) => a == b,
            (List(a), List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                // A pair already under comparison is assumed equal.
                match Visit::enter(&COMPARING, (address(a), address(b))) {
                    Some(_visit) => a.borrow().items == b.borrow().items,
                    None => true,
                }
            }
            (Map(a), Map(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                match Visit::enter(&COMPARING, (address(a), address(b))) {
                    Some(_visit) => *a.borrow() == *b.borrow(),
                    None => true,
                }
            }
            (Object(a), Object(b)) => Rc::ptr_eq(a, b),
            (Type(a), Type(b)) => a == b,
            (Enum(a), Enum(b)) => a == b,
            _ => false,
        }
    }
}

/// Textual form used by string concatenation and `toString()`.
///
/// A list or map nested inside itself renders as `(this Collection)` or
/// `(this Map)`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{:?}", n),
            Value::String(s) => f.write_str(s),
            Value::List(list) => {
                let Some(_visit) = Visit::enter(&RENDERING, (address(list), 0)) else {
                    return f.write_str("(this Collection)");
                };
                let items = list
                    .borrow()
                    .items
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Map(map) => {
                let Some(_visit) = Visit::enter(&RENDERING, (address(map), 0)) else {
                    return f.write_str("(this Map)");
                };
                let entries = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>();
                write!(f, "{{{}}}", entries.join(", "))
            }
            Value::Object(obj) => {
                let Some(_visit) = Visit::enter(&RENDERING, (address(obj), 0)) else {
                    return f.write_str("(this Object)");
                };
                match obj.try_borrow() {
                    Ok(obj) => f.write_str(&obj.describe()),
                    Err(_) => f.write_str("<object in use>"),
                }
            }
            Value::Type(name) => write!(f, "T({})", name),
            Value::Enum(constant) => f.write_str(&constant.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Integer(n) => f.debug_tuple("Integer").field(n).finish(),
            Value::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::List(list) => match Visit::enter(&RENDERING, (address(list), 1)) {
                Some(_visit) => f.debug_tuple("List").field(&*list.borrow()).finish(),
                None => f.write_str("List(..)"),
            },
            Value::Map(map) => match Visit::enter(&RENDERING, (address(map), 1)) {
                Some(_visit) => f.debug_tuple("Map").field(&*map.borrow()).finish(),
                None => f.write_str("Map(..)"),
            },
            Value::Object(obj) => match obj.try_borrow() {
                Ok(obj) => f.debug_tuple("Object").field(&obj.type_name()).finish(),
                Err(_) => f.write_str("Object(..)"),
            },
            Value::Type(name) => f.debug_tuple("Type").field(name).finish(),
            Value::Enum(constant) => f.debug_tuple("Enum").field(constant).finish(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
