//! Evaluation contexts: the root object, variables, functions, and the
//! collaborators an expression is allowed to reach.

use std::{collections::HashMap, fmt, rc::Rc};

use tracing::debug;

use crate::{
    accessor::{BeanFactoryAccessor, FieldAccessor, GetterAccessor, PropertyAccessor, PropertySourceAccessor},
    beans::BeanResolver,
    conversion::{DefaultConverter, TypeConverter},
    environment::PropertySource,
    evaluator::EvalError,
    types::{NativeFn, TypeDescriptor, TypeRegistry, native},
    value::Value,
};

/// Whether expressions may mutate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessPolicy {
    /// Reads only; every assignment fails with `WriteNotPermitted`
    ReadOnly,
    #[default]
    ReadWrite,
}

/// Everything an expression can see while it is evaluated.
///
/// # Examples
///
/// ```
/// use spel_lite::{EvaluationContext, ExpressionParser, Value};
///
/// let mut ctx = EvaluationContext::standard()
///     .with_variable("limit", Value::Integer(10))
///     .build();
///
/// let expr = ExpressionParser::new().parse_expression("#limit * 2").unwrap();
/// assert_eq!(expr.get_value_in(&mut ctx).unwrap(), Value::Integer(20));
/// ```
pub struct EvaluationContext {
    root: Value,
    variables: HashMap<String, Value>,
    functions: HashMap<String, NativeFn>,
    access: AccessPolicy,
    accessors: Vec<Rc<dyn PropertyAccessor>>,
    converter: Rc<dyn TypeConverter>,
    types: TypeRegistry,
    beans: Option<Rc<dyn BeanResolver>>,
}

impl EvaluationContext {
    /// A context for binding data: read-only, no type references, no constructors.
    pub fn for_read_only_data_binding() -> ContextBuilder {
        ContextBuilder::new(AccessPolicy::ReadOnly, TypeRegistry::empty())
    }

    /// A context for binding data that may assign properties, but still
    /// cannot reach types.
    pub fn for_read_write_data_binding() -> ContextBuilder {
        ContextBuilder::new(AccessPolicy::ReadWrite, TypeRegistry::empty())
    }

    /// The fully featured context: read-write with the built-in types.
    pub fn standard() -> ContextBuilder {
        ContextBuilder::new(AccessPolicy::ReadWrite, TypeRegistry::with_builtins())
    }

    /// Context used by bean-definition templates: property namespaces and
    /// bean names resolve as bare identifiers.
    pub fn for_bean_definitions(
        properties: Rc<dyn PropertySource>,
        beans: Rc<dyn BeanResolver>,
    ) -> ContextBuilder {
        EvaluationContext::standard()
            .with_property_accessor(PropertySourceAccessor::new(properties))
            .with_property_accessor(BeanFactoryAccessor::new(Rc::clone(&beans)))
            .with_bean_resolver(beans)
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn set_root(&mut self, root: Value) {
        self.root = root;
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    pub fn register_function<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    {
        self.functions.insert(name.into(), native(f));
    }

    pub fn function(&self, name: &str) -> Option<&NativeFn> {
        self.functions.get(name)
    }

    pub fn access_policy(&self) -> AccessPolicy {
        self.access
    }

    pub fn is_writable(&self) -> bool {
        self.access == AccessPolicy::ReadWrite
    }

    pub fn property_accessors(&self) -> &[Rc<dyn PropertyAccessor>] {
        &self.accessors
    }

    /// Appends an accessor after the ones already installed.
    pub fn add_property_accessor(&mut self, accessor: impl PropertyAccessor + 'static) {
        self.accessors.push(Rc::new(accessor));
    }

    pub fn converter(&self) -> &dyn TypeConverter {
        self.converter.as_ref()
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    pub fn bean_resolver(&self) -> Option<&Rc<dyn BeanResolver>> {
        self.beans.as_ref()
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        EvaluationContext::standard().build()
    }
}

impl fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("root", &self.root)
            .field("variables", &self.variables)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("access", &self.access)
            .field("accessors", &self.accessors.len())
            .field("types", &self.types.names().collect::<Vec<_>>())
            .field("beans", &self.beans)
            .finish()
    }
}

/// Builder returned by the [`EvaluationContext`] constructors.
pub struct ContextBuilder {
    context: EvaluationContext,
}

impl ContextBuilder {
    fn new(access: AccessPolicy, types: TypeRegistry) -> Self {
        ContextBuilder {
            context: EvaluationContext {
                root: Value::Null,
                variables: HashMap::new(),
                functions: HashMap::new(),
                access,
                accessors: vec![Rc::new(GetterAccessor), Rc::new(FieldAccessor)],
                converter: Rc::new(DefaultConverter),
                types,
                beans: None,
            },
        }
    }

    pub fn root(mut self, root: impl Into<Value>) -> Self {
        self.context.root = root.into();
        self
    }

    pub fn read_only(mut self) -> Self {
        self.context.access = AccessPolicy::ReadOnly;
        self
    }

    pub fn read_write(mut self) -> Self {
        self.context.access = AccessPolicy::ReadWrite;
        self
    }

    /// Adds an accessor consulted after the built-in getter and field accessors.
    pub fn with_property_accessor(mut self, accessor: impl PropertyAccessor + 'static) -> Self {
        self.context.add_property_accessor(accessor);
        self
    }

    pub fn with_converter(mut self, converter: impl TypeConverter + 'static) -> Self {
        self.context.converter = Rc::new(converter);
        self
    }

    pub fn with_types(mut self, types: TypeRegistry) -> Self {
        self.context.types = types;
        self
    }

    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.context.types.register(descriptor);
        self
    }

    pub fn with_bean_resolver(mut self, beans: Rc<dyn BeanResolver>) -> Self {
        self.context.beans = Some(beans);
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.set_variable(name, value.into());
        self
    }

    pub fn with_function<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    {
        self.context.register_function(name, f);
        self
    }

    pub fn build(self) -> EvaluationContext {
        debug!(
            access = ?self.context.access,
            accessors = self.context.accessors.len(),
            variables = self.context.variables.len(),
            beans = self.context.beans.is_some(),
            "evaluation context ready"
        );
        self.context
    }
}

#[test]
fn test_data_binding_contexts_have_no_types() {
    let read_only = EvaluationContext::for_read_only_data_binding().build();
    assert!(!read_only.is_writable());
    assert!(!read_only.types().contains("String"));

    let read_write = EvaluationContext::for_read_write_data_binding().build();
    assert!(read_write.is_writable());
    assert!(EvaluationContext::standard().build().types().contains("Math"));
}
