//! Registry of types reachable through `T(Name)` and `new Name(...)`.

use std::{collections::HashMap, fmt, rc::Rc};

use indexmap::IndexMap;

use crate::{
    evaluator::EvalError,
    value::{EnumConstant, Value, ValueType},
};

/// A native function: constructor, static method, or registered `#function`.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, EvalError>>;

/// Wraps a closure as a [`NativeFn`].
pub fn native<F>(f: F) -> NativeFn
where
    F: Fn(&[Value]) -> Result<Value, EvalError> + 'static,
{
    Rc::new(f)
}

/// Static members and construction of one registered type.
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    constructor: Option<NativeFn>,
    statics: IndexMap<String, Value>,
    static_methods: HashMap<String, NativeFn>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        TypeDescriptor {
            name: name.into(),
            constructor: None,
            statics: IndexMap::new(),
            static_methods: HashMap::new(),
        }
    }

    pub fn with_constructor<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    {
        self.constructor = Some(native(f));
        self
    }

    pub fn with_static(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.statics.insert(name.into(), value.into());
        self
    }

    pub fn with_static_method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    {
        self.static_methods.insert(name.into(), native(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name after the last `.`.
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    pub fn constructor(&self) -> Option<&NativeFn> {
        self.constructor.as_ref()
    }

    pub fn static_member(&self, name: &str) -> Option<&Value> {
        self.statics.get(name)
    }

    pub fn static_method(&self, name: &str) -> Option<&NativeFn> {
        self.static_methods.get(name)
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("constructor", &self.constructor.is_some())
            .field("statics", &self.statics.keys().collect::<Vec<_>>())
            .field("static_methods", &self.static_methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Types known to an evaluation context.
///
/// Lookup tries the exact name first, then matches on the simple name, so
/// `T(java.lang.Math)` and `T(Math)` both find a type registered as `Math`.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    /// A registry with nothing in it; `T(...)` and `new` always fail.
    pub fn empty() -> Self {
        TypeRegistry::default()
    }

    /// A registry holding the built-in types.
    pub fn with_builtins() -> Self {
        let mut registry = TypeRegistry::empty();
        register_builtins(&mut registry);
        registry
    }

    pub fn register(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    /// Registers an enumeration whose constants are static members of the type.
    pub fn register_enum(&mut self, name: &str, constants: &[&str]) {
        let mut descriptor = TypeDescriptor::new(name);
        for (ordinal, constant) in constants.iter().enumerate() {
            descriptor = descriptor.with_static(
                *constant,
                Value::Enum(EnumConstant {
                    type_name: simple_name(name).to_string(),
                    name: constant.to_string(),
                    ordinal,
                }),
            );
        }
        let constants: Vec<Value> = descriptor.statics.values().cloned().collect();
        let lookup = descriptor.statics.clone();
        let type_name = name.to_string();
        let descriptor = descriptor
            .with_static_method("values", move |_| Ok(Value::list(constants.clone())))
            .with_static_method("valueOf", move |args| match args {
                [Value::String(constant)] => lookup.get(constant).cloned().ok_or_else(|| {
                    EvalError::type_mismatch(format!("no constant {} in {}", constant, type_name))
                }),
                _ => Err(EvalError::method_not_found("valueOf", &type_name, args.len())),
            });
        self.register(descriptor);
    }

    pub fn lookup(&self, name: &str) -> Option<&TypeDescriptor> {
        if let Some(descriptor) = self.types.get(name) {
            return Some(descriptor);
        }
        let simple = simple_name(name);
        self.types
            .values()
            .find(|descriptor| descriptor.simple_name() == simple)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

fn number_arg(function: &str, args: &[Value], index: usize) -> Result<f64, EvalError> {
    args.get(index).and_then(Value::as_float).ok_or_else(|| {
        EvalError::type_mismatch(format!("{}() expects numeric arguments", function))
    })
}

fn unary_math(name: &'static str, args: &[Value], f: fn(f64) -> f64) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::method_not_found(name, "Math", args.len()));
    }
    Ok(Value::Float(f(number_arg(name, args, 0)?)))
}

/// Two integers stay an integer; any float widens the result.
fn integral_math(
    name: &'static str,
    args: &[Value],
    ints: fn(i64, i64) -> i64,
    floats: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    match args {
        [Value::Integer(a), Value::Integer(b)] => Ok(Value::Integer(ints(*a, *b))),
        [_, _] => Ok(Value::Float(floats(
            number_arg(name, args, 0)?,
            number_arg(name, args, 1)?,
        ))),
        _ => Err(EvalError::method_not_found(name, "Math", args.len())),
    }
}

fn parse_args<'a>(function: &str, type_name: &str, args: &'a [Value]) -> Result<&'a str, EvalError> {
    match args {
        [Value::String(s)] => Ok(s.trim()),
        [other] => Err(EvalError::type_mismatch(format!(
            "{}() expects a string, got {}",
            function,
            other.type_name()
        ))),
        _ => Err(EvalError::method_not_found(function, type_name, args.len())),
    }
}

fn parse_integer(args: &[Value]) -> Result<Value, EvalError> {
    let text = parse_args("parseInt", "Integer", args)?;
    text.parse::<i64>()
        .map(Value::Integer)
        .map_err(|_| EvalError::conversion_failed(&Value::string(text), &ValueType::Integer))
}

fn register_builtins(registry: &mut TypeRegistry) {
    registry.register(
        TypeDescriptor::new("String")
            .with_constructor(|args| match args {
                [] => Ok(Value::string("")),
                [value] => Ok(Value::String(value.to_string())),
                _ => Err(EvalError::method_not_found("<init>", "String", args.len())),
            })
            .with_static_method("valueOf", |args| match args {
                [value] => Ok(Value::String(value.to_string())),
                _ => Err(EvalError::method_not_found("valueOf", "String", args.len())),
            }),
    );

    registry.register(
        TypeDescriptor::new("Integer")
            .with_constructor(|args| match args {
                [Value::Integer(n)] => Ok(Value::Integer(*n)),
                _ => parse_integer(args),
            })
            .with_static("MAX_VALUE", i64::MAX)
            .with_static("MIN_VALUE", i64::MIN)
            .with_static_method("parseInt", parse_integer)
            .with_static_method("valueOf", |args| match args {
                [Value::Integer(n)] => Ok(Value::Integer(*n)),
                _ => parse_integer(args),
            }),
    );

    registry.register(
        TypeDescriptor::new("Float")
            .with_static("MAX_VALUE", f64::MAX)
            .with_static("MIN_VALUE", f64::MIN_POSITIVE)
            .with_static_method("parseFloat", |args| {
                let text = parse_args("parseFloat", "Float", args)?;
                text.parse::<f64>().map(Value::Float).map_err(|_| {
                    EvalError::conversion_failed(&Value::string(text), &ValueType::Float)
                })
            }),
    );

    registry.register(
        TypeDescriptor::new("Boolean")
            .with_static("TRUE", true)
            .with_static("FALSE", false)
            .with_static_method("parseBoolean", |args| {
                let text = parse_args("parseBoolean", "Boolean", args)?;
                Ok(Value::Boolean(text.eq_ignore_ascii_case("true")))
            }),
    );

    registry.register(
        TypeDescriptor::new("Math")
            .with_static("PI", std::f64::consts::PI)
            .with_static("E", std::f64::consts::E)
            .with_static_method("abs", |args| match args {
                [Value::Integer(n)] => n
                    .checked_abs()
                    .map(Value::Integer)
                    .ok_or_else(|| EvalError::overflow("abs")),
                _ => unary_math("abs", args, f64::abs),
            })
            .with_static_method("max", |args| integral_math("max", args, i64::max, f64::max))
            .with_static_method("min", |args| integral_math("min", args, i64::min, f64::min))
            .with_static_method("pow", |args| match args {
                [_, _] => Ok(Value::Float(
                    number_arg("pow", args, 0)?.powf(number_arg("pow", args, 1)?),
                )),
                _ => Err(EvalError::method_not_found("pow", "Math", args.len())),
            })
            .with_static_method("sqrt", |args| unary_math("sqrt", args, f64::sqrt))
            .with_static_method("floor", |args| unary_math("floor", args, f64::floor))
            .with_static_method("ceil", |args| unary_math("ceil", args, f64::ceil))
            .with_static_method("round", |args| match args {
                [Value::Integer(n)] => Ok(Value::Integer(*n)),
                [_] => Ok(Value::Integer(number_arg("round", args, 0)?.round() as i64)),
                _ => Err(EvalError::method_not_found("round", "Math", args.len())),
            })
            .with_static_method("random", |args| match args {
                [] => Ok(Value::Float(pseudo_random())),
                _ => Err(EvalError::method_not_found("random", "Math", args.len())),
            }),
    );

    registry.register(TypeDescriptor::new("List").with_constructor(|args| match args {
        [] => Ok(Value::list(Vec::new())),
        [Value::List(list)] => Ok(Value::list(list.borrow().items.clone())),
        _ => Err(EvalError::method_not_found("<init>", "List", args.len())),
    }));

    registry.register(TypeDescriptor::new("Map").with_constructor(|args| match args {
        [] => Ok(Value::map(IndexMap::new())),
        [Value::Map(map)] => Ok(Value::map(map.borrow().clone())),
        _ => Err(EvalError::method_not_found("<init>", "Map", args.len())),
    }));

    registry.register(TypeDescriptor::new("Object"));
    registry.register(TypeDescriptor::new("Number"));

    registry.register_enum(
        "RoundingMode",
        &["UP", "DOWN", "CEILING", "FLOOR", "HALF_UP", "HALF_DOWN", "HALF_EVEN", "UNNECESSARY"],
    );
}

/// Value in `[0, 1)` derived from the standard library's randomly seeded hasher.
fn pseudo_random() -> f64 {
    use std::hash::{BuildHasher, RandomState};

    let bits = RandomState::new().hash_one(0u8);
    (bits >> 11) as f64 / (1u64 << 53) as f64
}

#[test]
fn test_lookup_by_simple_name() {
    let registry = TypeRegistry::with_builtins();
    assert_eq!(registry.lookup("java.lang.Math").map(TypeDescriptor::name), Some("Math"));
    assert!(registry.lookup("Unknown").is_none());
    assert!(TypeRegistry::empty().lookup("String").is_none());
}

#[test]
fn test_enum_constants_are_ordered() {
    let registry = TypeRegistry::with_builtins();
    let rounding = registry.lookup("RoundingMode").unwrap();
    let Some(Value::Enum(floor)) = rounding.static_member("FLOOR") else {
        panic!("FLOOR should be an enum constant");
    };
    assert_eq!(floor.ordinal, 3);
}
