use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::trace;

use crate::{
    ast::{BinOp, Expr, SelectionKind, UnaryOp},
    config::ParserConfig,
    context::EvaluationContext,
    value::{ListValue, Shared, Value, ValueType},
};

pub mod methods;
pub mod operators;

/// Category of an evaluation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// No accessor in the chain can read or write the property
    PropertyNotFound,
    /// No declared, built-in, static, or registered method matches
    MethodNotFound,
    /// Operand or result of the wrong type for an operation
    TypeMismatch,
    /// Index outside a list, array, or string
    IndexOutOfBounds,
    DivisionByZero,
    /// Navigation through a null receiver without `?.`
    NullNavigation,
    /// Mutation attempted under a read-only access policy
    WriteNotPermitted,
    /// A compiled expression met a receiver it was not compiled for
    CompilationFallback,
    /// `T(...)` or `new` named an unregistered type
    TypeNotFound,
    /// `@name` did not resolve
    BeanNotFound,
    /// `matches` or `split` received an invalid regular expression
    InvalidPattern,
    /// Integer arithmetic overflowed
    Overflow,
    /// A value could not be converted to the requested type
    ConversionFailed,
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvalErrorKind::PropertyNotFound => "Property not found",
            EvalErrorKind::MethodNotFound => "Method not found",
            EvalErrorKind::TypeMismatch => "Type mismatch",
            EvalErrorKind::IndexOutOfBounds => "Index out of bounds",
            EvalErrorKind::DivisionByZero => "Division by zero",
            EvalErrorKind::NullNavigation => "Null navigation",
            EvalErrorKind::WriteNotPermitted => "Write not permitted",
            EvalErrorKind::CompilationFallback => "Compilation fallback",
            EvalErrorKind::TypeNotFound => "Type not found",
            EvalErrorKind::BeanNotFound => "Bean not found",
            EvalErrorKind::InvalidPattern => "Invalid pattern",
            EvalErrorKind::Overflow => "Arithmetic overflow",
            EvalErrorKind::ConversionFailed => "Conversion failed",
        };
        f.write_str(name)
    }
}

fn location(expression: &Option<String>) -> String {
    match expression {
        Some(expr) => format!(" (in `{}`)", expr),
        None => String::new(),
    }
}

/// Error raised while evaluating an expression.
///
/// Carries the innermost failing sub-expression, rendered back to source.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}{}", location(.expression))]
pub struct EvalError {
    kind: EvalErrorKind,
    message: String,
    expression: Option<String>,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, message: impl Into<String>) -> Self {
        EvalError {
            kind,
            message: message.into(),
            expression: None,
        }
    }

    pub fn kind(&self) -> EvalErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The failing sub-expression, when known.
    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref()
    }

    /// Records `expr` as the failing sub-expression unless a deeper one is already set.
    pub fn at(mut self, expr: &Expr) -> Self {
        if self.expression.is_none() {
            self.expression = Some(expr.to_string());
        }
        self
    }

    pub fn property_not_found(name: &str, type_name: &str) -> Self {
        Self::new(
            EvalErrorKind::PropertyNotFound,
            format!("property '{}' cannot be found on {}", name, type_name),
        )
    }

    pub fn method_not_found(name: &str, type_name: &str, arity: usize) -> Self {
        Self::new(
            EvalErrorKind::MethodNotFound,
            format!("method {}() taking {} argument(s) cannot be found on {}", name, arity, type_name),
        )
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::TypeMismatch, message)
    }

    pub fn index_out_of_bounds(index: i64, len: usize) -> Self {
        Self::new(
            EvalErrorKind::IndexOutOfBounds,
            format!("index {} is out of bounds for length {}", index, len),
        )
    }

    pub fn division_by_zero() -> Self {
        Self::new(EvalErrorKind::DivisionByZero, "divisor is zero")
    }

    pub fn null_navigation(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::NullNavigation, message)
    }

    pub fn write_not_permitted(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::WriteNotPermitted, message)
    }

    pub fn compilation_fallback(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::CompilationFallback, message)
    }

    pub fn type_not_found(name: &str) -> Self {
        Self::new(EvalErrorKind::TypeNotFound, format!("type '{}' is not registered", name))
    }

    pub fn bean_not_found(name: &str) -> Self {
        Self::new(EvalErrorKind::BeanNotFound, format!("no bean named '{}'", name))
    }

    pub fn invalid_pattern(pattern: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            EvalErrorKind::InvalidPattern,
            format!("invalid regular expression '{}': {}", pattern, reason),
        )
    }

    pub fn overflow(operation: &str) -> Self {
        Self::new(EvalErrorKind::Overflow, format!("integer overflow in {}", operation))
    }

    /// A string or collection that would grow past [`MAX_GENERATED_LENGTH`].
    pub fn too_large(what: &str, requested: impl fmt::Display) -> Self {
        Self::new(
            EvalErrorKind::Overflow,
            format!(
                "{} of length {} exceeds the limit of {}",
                what, requested, MAX_GENERATED_LENGTH
            ),
        )
    }

    pub fn conversion_failed(value: &Value, target: &ValueType) -> Self {
        Self::new(
            EvalErrorKind::ConversionFailed,
            format!("cannot convert {} '{}' to {}", value.type_name(), value, target),
        )
    }
}

/// Longest string or array an expression may build in one step.
pub const MAX_GENERATED_LENGTH: usize = 1 << 24;

/// Key under which a value is stored in a map.
pub(crate) fn key_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Map entry as seen by `#this` during selection and projection.
fn entry_value(key: &str, value: &Value) -> Value {
    Value::map_from([("key", Value::string(key)), ("value", value.clone())])
}

/// Tree-walking interpreter for a parsed [`Expr`].
///
/// Keeps a stack of active objects: unqualified names and `#this` resolve
/// against the top, `#root` against the bottom.
pub struct Evaluator<'a> {
    ctx: &'a mut EvaluationContext,
    config: &'a ParserConfig,
    root: Value,
    scope: Vec<Value>,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator whose root is the context's root object.
    pub fn new(ctx: &'a mut EvaluationContext, config: &'a ParserConfig) -> Self {
        let root = ctx.root().clone();
        Evaluator {
            ctx,
            config,
            scope: vec![root.clone()],
            root,
        }
    }

    /// Replaces the root object for this evaluation only.
    pub fn with_root(mut self, root: Value) -> Self {
        self.scope = vec![root.clone()];
        self.root = root;
        self
    }

    /// Evaluates `expr` to a value.
    ///
    /// # Examples
    ///
    /// ```
    /// use spel_lite::{EvaluationContext, Evaluator, ParserConfig, Value};
    /// use spel_lite::parser::Parser;
    /// use spel_lite::lexer::Lexer;
    ///
    /// let expr = Parser::new(Lexer::new("5 * 2")).unwrap().parse().unwrap();
    /// let mut ctx = EvaluationContext::standard().build();
    /// let config = ParserConfig::default();
    ///
    /// let mut evaluator = Evaluator::new(&mut ctx, &config);
    /// assert_eq!(evaluator.evaluate(&expr).unwrap(), Value::Integer(10));
    /// ```
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        trace!(expression = %expr, "interpreting");
        self.eval_expr(expr)
    }

    /// Writes `value` through an assignable expression, as `setValue` does.
    pub fn assign_value(&mut self, target: &Expr, value: Value) -> Result<Value, EvalError> {
        if !target.is_assignable() {
            return Err(EvalError::type_mismatch(format!("'{}' is not assignable", target)));
        }
        self.check_writable(target)?;
        self.assign(target, value).map_err(|e| e.at(target))
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        self.eval_node(expr).map_err(|e| e.at(expr))
    }

    fn active(&self) -> Value {
        self.scope.last().cloned().unwrap_or(Value::Null)
    }

    fn in_scope<T>(
        &mut self,
        active: Value,
        f: impl FnOnce(&mut Self) -> Result<T, EvalError>,
    ) -> Result<T, EvalError> {
        self.scope.push(active);
        let result = f(self);
        self.scope.pop();
        result
    }

    fn eval_node(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Integer(n) => Ok(Value::Integer(*n)),
            Expr::Float(n) => Ok(Value::Float(*n)),
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Root => Ok(self.root.clone()),
            Expr::This => Ok(self.active()),
            Expr::Variable(name) => Ok(self.ctx.variable(name).cloned().unwrap_or(Value::Null)),
            Expr::BeanRef(name) => self
                .ctx
                .bean_resolver()
                .and_then(|beans| beans.resolve_bean(name))
                .ok_or_else(|| EvalError::bean_not_found(name)),
            Expr::TypeRef(name) => self
                .ctx
                .types()
                .lookup(name)
                .map(|descriptor| Value::Type(descriptor.name().to_string()))
                .ok_or_else(|| EvalError::type_not_found(name)),
            Expr::Property {
                object,
                name,
                null_safe,
            } => {
                let target = self.eval_receiver(object.as_deref())?;
                if target.is_null() && *null_safe {
                    return Ok(Value::Null);
                }
                self.read_property(&target, name)
            }
            Expr::Index {
                object,
                index,
                null_safe,
            } => {
                let target = self.eval_receiver(object.as_deref())?;
                if target.is_null() && *null_safe {
                    return Ok(Value::Null);
                }
                let key = self.eval_expr(index)?;
                self.read_index(&target, &key)
            }
            Expr::MethodCall {
                object,
                method,
                args,
                null_safe,
            } => {
                let target = self.eval_receiver(object.as_deref())?;
                if target.is_null() && *null_safe {
                    return Ok(Value::Null);
                }
                let args = self.eval_args(args)?;
                self.invoke_method(&target, method, &args)
            }
            Expr::FunctionCall { name, args } => {
                let function = self
                    .ctx
                    .function(name)
                    .cloned()
                    .ok_or_else(|| EvalError::method_not_found(&format!("#{}", name), "context", args.len()))?;
                let args = self.eval_args(args)?;
                function(args.as_slice())
            }
            Expr::Constructor { type_name, args } => {
                let args = self.eval_args(args)?;
                let descriptor = self
                    .ctx
                    .types()
                    .lookup(type_name)
                    .ok_or_else(|| EvalError::type_not_found(type_name))?;
                let constructor = descriptor.constructor().cloned().ok_or_else(|| {
                    EvalError::method_not_found("<init>", descriptor.name(), args.len())
                })?;
                constructor(args.as_slice())
            }
            Expr::NewArray {
                element_type,
                size,
                initializer,
            } => self.new_array(element_type, size.as_deref(), initializer.as_deref()),
            Expr::BinaryOp {
                op: BinOp::And,
                left,
                right,
            } => Ok(Value::Boolean(
                self.eval_condition(left)? && self.eval_condition(right)?,
            )),
            Expr::BinaryOp {
                op: BinOp::Or,
                left,
                right,
            } => Ok(Value::Boolean(
                self.eval_condition(left)? || self.eval_condition(right)?,
            )),
            Expr::BinaryOp { op, left, right } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                operators::apply_binary(*op, &left, &right)
            }
            Expr::UnaryOp { op, operand } => match op {
                UnaryOp::Not => Ok(Value::Boolean(!self.eval_condition(operand)?)),
                UnaryOp::Negate => operators::negate(&self.eval_expr(operand)?),
                UnaryOp::Plus => operators::unary_plus(&self.eval_expr(operand)?),
            },
            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_condition(condition)? {
                    self.eval_expr(then_branch)
                } else {
                    self.eval_expr(else_branch)
                }
            }
            Expr::Elvis { left, right } => {
                let value = self.eval_expr(left)?;
                if operators::elvis_falls_through(&value) {
                    self.eval_expr(right)
                } else {
                    Ok(value)
                }
            }
            Expr::Assign { target, value } => {
                self.check_writable(target)?;
                let value = self.eval_expr(value)?;
                self.assign(target, value)
            }
            Expr::List(items) => Ok(Value::list(self.eval_args(items)?)),
            Expr::Map(pairs) => {
                let mut map = IndexMap::with_capacity(pairs.len());
                for (key, value) in pairs {
                    let key = key_string(&self.eval_expr(key)?);
                    let value = self.eval_expr(value)?;
                    map.insert(key, value);
                }
                Ok(Value::map(map))
            }
            Expr::Selection {
                object,
                kind,
                predicate,
                null_safe,
            } => {
                let target = self.eval_expr(object)?;
                if target.is_null() && *null_safe {
                    return Ok(Value::Null);
                }
                self.select(&target, *kind, predicate)
            }
            Expr::Projection {
                object,
                projection,
                null_safe,
            } => {
                let target = self.eval_expr(object)?;
                if target.is_null() && *null_safe {
                    return Ok(Value::Null);
                }
                self.project(&target, projection)
            }
            Expr::Composite(parts) => {
                if let [single] = parts.as_slice() {
                    return self.eval_expr(single);
                }
                let mut text = String::new();
                for part in parts {
                    match self.eval_expr(part)? {
                        Value::Null => {}
                        value => text.push_str(&value.to_string()),
                    }
                }
                Ok(Value::String(text))
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<Value>, EvalError> {
        args.iter().map(|arg| self.eval_expr(arg)).collect()
    }

    /// Evaluates a condition, which must be boolean or convertible to one.
    fn eval_condition(&mut self, expr: &Expr) -> Result<bool, EvalError> {
        let value = self.eval_expr(expr)?;
        self.to_condition(value)
    }

    fn to_condition(&self, value: Value) -> Result<bool, EvalError> {
        if let Value::Boolean(b) = value {
            return Ok(b);
        }
        let type_name = value.type_name();
        match self.ctx.converter().convert(value, &ValueType::Boolean) {
            Ok(Value::Boolean(b)) => Ok(b),
            _ => Err(EvalError::type_mismatch(format!(
                "expected a boolean condition, got {}",
                type_name
            ))),
        }
    }

    /// Evaluates the receiver of a navigation step; `None` means the active object.
    fn eval_receiver(&mut self, object: Option<&Expr>) -> Result<Value, EvalError> {
        match object {
            None => Ok(self.active()),
            Some(expr @ Expr::Property { .. }) if self.config.auto_grow_null_references => {
                self.eval_growing_property(expr).map_err(|e| e.at(expr))
            }
            Some(expr) => self.eval_expr(expr),
        }
    }

    /// Reads a property that is about to be navigated through, initializing
    /// it when it is null and its declared type can be constructed.
    fn eval_growing_property(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        let Expr::Property {
            object,
            name,
            null_safe,
        } = expr
        else {
            return self.eval_expr(expr);
        };
        let target = self.eval_receiver(object.as_deref())?;
        if target.is_null() && *null_safe {
            return Ok(Value::Null);
        }
        let value = self.read_property(&target, name)?;
        if !value.is_null() || !self.ctx.is_writable() {
            return Ok(value);
        }
        let declared = match &target {
            Value::Object(obj) => obj.borrow().property_type(name),
            _ => None,
        };
        match declared.map(|ty| self.element_default(&ty)) {
            Some(grown) if !grown.is_null() => {
                trace!(property = %name, "auto-growing null reference");
                self.write_property(&target, name, grown)
            }
            _ => Ok(value),
        }
    }

    /// Default for a fresh list slot or array element; registered object
    /// types are built through their no-argument constructor.
    fn element_default(&self, element_type: &ValueType) -> Value {
        if let ValueType::Object(name) = element_type
            && let Some(constructor) = self
                .ctx
                .types()
                .lookup(name)
                .and_then(|descriptor| descriptor.constructor())
        {
            return constructor(&[]).unwrap_or(Value::Null);
        }
        element_type.default_value()
    }

    fn read_property(&self, target: &Value, name: &str) -> Result<Value, EvalError> {
        if let Value::Type(type_name) = target
            && let Some(value) = self
                .ctx
                .types()
                .lookup(type_name)
                .and_then(|descriptor| descriptor.static_member(name))
        {
            return Ok(value.clone());
        }

        for accessor in self.ctx.property_accessors() {
            if accessor.can_read(target, name) {
                return accessor.read(target, name);
            }
        }

        if target.is_null() {
            return Err(EvalError::null_navigation(format!(
                "property '{}' cannot be read on null",
                name
            )));
        }
        Err(EvalError::property_not_found(name, &target.type_name()))
    }

    fn write_property(&mut self, target: &Value, name: &str, value: Value) -> Result<Value, EvalError> {
        let declared = match target {
            Value::Object(obj) => obj.borrow().property_type(name),
            _ => None,
        };
        let value = match declared {
            Some(ty) => self.convert(value, &ty)?,
            None => value,
        };

        for accessor in self.ctx.property_accessors() {
            if accessor.can_write(target, name) {
                accessor.write(target, name, value.clone())?;
                return Ok(value);
            }
        }

        if target.is_null() {
            return Err(EvalError::null_navigation(format!(
                "property '{}' cannot be set on null",
                name
            )));
        }
        Err(EvalError::new(
            EvalErrorKind::PropertyNotFound,
            format!("property '{}' cannot be set on {}", name, target.type_name()),
        ))
    }

    fn convert(&self, value: Value, target: &ValueType) -> Result<Value, EvalError> {
        if target.accepts(&value) {
            return Ok(value);
        }
        self.ctx.converter().convert(value, target)
    }

    fn list_index(key: &Value, len: usize) -> Result<usize, EvalError> {
        match key {
            Value::Integer(n) if *n >= 0 => Ok(*n as usize),
            Value::Integer(n) => Err(EvalError::index_out_of_bounds(*n, len)),
            other => Err(EvalError::type_mismatch(format!(
                "list index must be an integer, got {}",
                other.type_name()
            ))),
        }
    }

    fn read_index(&mut self, target: &Value, key: &Value) -> Result<Value, EvalError> {
        match target {
            Value::List(list) => {
                let len = list.borrow().items.len();
                let index = Self::list_index(key, len)?;
                if let Some(item) = list.borrow().items.get(index) {
                    return Ok(item.clone());
                }
                self.grow_list(list, index)?;
                Ok(list.borrow().items[index].clone())
            }
            Value::String(s) => {
                let len = s.chars().count();
                let index = Self::list_index(key, len)?;
                s.chars()
                    .nth(index)
                    .map(|c| Value::String(c.to_string()))
                    .ok_or_else(|| EvalError::index_out_of_bounds(index as i64, len))
            }
            Value::Map(map) => Ok(map
                .borrow()
                .get(&key_string(key))
                .cloned()
                .unwrap_or(Value::Null)),
            Value::Object(_) | Value::Type(_) => self.read_property(target, &key_string(key)),
            Value::Null => Err(EvalError::null_navigation("cannot index into null")),
            other => Err(EvalError::type_mismatch(format!(
                "cannot index into {}",
                other.type_name()
            ))),
        }
    }

    /// Pads `list` with default elements so that `index` becomes valid.
    fn grow_list(&self, list: &Shared<ListValue>, index: usize) -> Result<(), EvalError> {
        let (len, fixed, element_type) = {
            let list = list.borrow();
            (list.items.len(), list.fixed, list.element_type.clone())
        };
        if fixed || !self.config.auto_grow_collections {
            return Err(EvalError::index_out_of_bounds(index as i64, len));
        }
        let limit = self.config.maximum_auto_grow_size.min(MAX_GENERATED_LENGTH);
        if index >= limit {
            return Err(EvalError::new(
                EvalErrorKind::IndexOutOfBounds,
                format!("index {} exceeds the maximum auto-grow size of {}", index, limit),
            ));
        }
        if !self.ctx.is_writable() {
            return Err(EvalError::write_not_permitted(
                "growing a list requires read-write access",
            ));
        }
        let padding: Vec<Value> = (len..=index)
            .map(|_| self.element_default(&element_type))
            .collect();
        list.borrow_mut().items.extend(padding);
        Ok(())
    }

    fn invoke_method(&self, target: &Value, method: &str, args: &[Value]) -> Result<Value, EvalError> {
        match target {
            Value::Null => {
                return Err(EvalError::null_navigation(format!(
                    "method {}() cannot be called on null",
                    method
                )));
            }
            Value::Type(type_name) => {
                if let Some(function) = self
                    .ctx
                    .types()
                    .lookup(type_name)
                    .and_then(|descriptor| descriptor.static_method(method))
                {
                    return function(args);
                }
            }
            Value::Object(obj) => {
                let result = obj
                    .try_borrow_mut()
                    .map_err(|_| EvalError::type_mismatch("object is already in use"))?
                    .invoke(method, args);
                if let Some(result) = result {
                    return result;
                }
            }
            _ => {}
        }

        match methods::lookup(target, method) {
            Some(builtin) => builtin(target, args),
            None => Err(EvalError::method_not_found(method, &target.type_name(), args.len())),
        }
    }

    fn new_array(
        &mut self,
        element_type: &str,
        size: Option<&Expr>,
        initializer: Option<&[Expr]>,
    ) -> Result<Value, EvalError> {
        let element_type = ValueType::from_name(element_type);
        match (size, initializer) {
            (Some(size), None) => {
                let len = match self.eval_expr(size)? {
                    Value::Integer(n) if n >= 0 => usize::try_from(n)
                        .ok()
                        .filter(|len| *len <= MAX_GENERATED_LENGTH)
                        .ok_or_else(|| EvalError::too_large("array", n))?,
                    other => {
                        return Err(EvalError::type_mismatch(format!(
                            "array size must be a non-negative integer, got {}",
                            other
                        )));
                    }
                };
                let items = (0..len).map(|_| self.element_default(&element_type)).collect();
                Ok(Value::array(element_type, items))
            }
            (None, Some(initializer)) => {
                let mut items = Vec::with_capacity(initializer.len());
                for item in initializer {
                    let value = self.eval_expr(item)?;
                    items.push(self.convert(value, &element_type)?);
                }
                Ok(Value::array(element_type, items))
            }
            _ => Err(EvalError::type_mismatch(
                "array construction needs either a size or an initializer",
            )),
        }
    }

    fn select(&mut self, target: &Value, kind: SelectionKind, predicate: &Expr) -> Result<Value, EvalError> {
        match target {
            Value::List(list) => {
                let (items, element_type) = {
                    let list = list.borrow();
                    (list.items.clone(), list.element_type.clone())
                };
                let mut selected = Vec::new();
                for item in items {
                    if self.test_element(item.clone(), predicate)? {
                        if kind == SelectionKind::First {
                            return Ok(item);
                        }
                        selected.push(item);
                    }
                }
                Ok(match kind {
                    SelectionKind::All => Value::typed_list(element_type, selected),
                    SelectionKind::First => Value::Null,
                    SelectionKind::Last => selected.pop().unwrap_or(Value::Null),
                })
            }
            Value::Map(map) => {
                let entries: Vec<(String, Value)> = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                let mut selected = IndexMap::new();
                for (key, value) in entries {
                    if self.test_element(entry_value(&key, &value), predicate)? {
                        if kind == SelectionKind::First {
                            return Ok(Value::map_from([(key, value)]));
                        }
                        selected.insert(key, value);
                    }
                }
                Ok(match kind {
                    SelectionKind::All => Value::map(selected),
                    SelectionKind::First => Value::Null,
                    SelectionKind::Last => selected
                        .pop()
                        .map_or(Value::Null, |entry| Value::map_from([entry])),
                })
            }
            Value::Null => Err(EvalError::null_navigation("cannot select from null")),
            other => Err(EvalError::type_mismatch(format!(
                "selection requires a list or map, got {}",
                other.type_name()
            ))),
        }
    }

    fn test_element(&mut self, element: Value, predicate: &Expr) -> Result<bool, EvalError> {
        let result = self.in_scope(element, |this| this.eval_expr(predicate))?;
        match result {
            Value::Boolean(b) => Ok(b),
            other => Err(EvalError::type_mismatch(format!(
                "selection criteria must evaluate to a boolean, got {}",
                other.type_name()
            ))),
        }
    }

    fn project(&mut self, target: &Value, projection: &Expr) -> Result<Value, EvalError> {
        let elements: Vec<Value> = match target {
            Value::List(list) => list.borrow().items.clone(),
            Value::Map(map) => map.borrow().iter().map(|(k, v)| entry_value(k, v)).collect(),
            Value::Null => return Err(EvalError::null_navigation("cannot project null")),
            other => {
                return Err(EvalError::type_mismatch(format!(
                    "projection requires a list or map, got {}",
                    other.type_name()
                )));
            }
        };
        let mut projected = Vec::with_capacity(elements.len());
        for element in elements {
            projected.push(self.in_scope(element, |this| this.eval_expr(projection))?);
        }
        Ok(Value::list(projected))
    }

    fn check_writable(&self, target: &Expr) -> Result<(), EvalError> {
        if self.ctx.is_writable() {
            Ok(())
        } else {
            Err(EvalError::write_not_permitted(format!(
                "assignment to '{}' requires read-write access",
                target
            )))
        }
    }

    fn assign(&mut self, target: &Expr, value: Value) -> Result<Value, EvalError> {
        match target {
            Expr::Variable(name) => {
                self.ctx.set_variable(name, value.clone());
                Ok(value)
            }
            Expr::Property {
                object,
                name,
                null_safe,
            } => {
                let receiver = self.eval_receiver(object.as_deref())?;
                if receiver.is_null() && *null_safe {
                    return Ok(Value::Null);
                }
                self.write_property(&receiver, name, value)
            }
            Expr::Index {
                object,
                index,
                null_safe,
            } => {
                let receiver = self.eval_receiver(object.as_deref())?;
                if receiver.is_null() && *null_safe {
                    return Ok(Value::Null);
                }
                let key = self.eval_expr(index)?;
                self.write_index(&receiver, &key, value)
            }
            other => Err(EvalError::type_mismatch(format!("'{}' is not assignable", other))),
        }
    }

    fn write_index(&mut self, target: &Value, key: &Value, value: Value) -> Result<Value, EvalError> {
        match target {
            Value::List(list) => {
                let (len, element_type) = {
                    let list = list.borrow();
                    (list.items.len(), list.element_type.clone())
                };
                let index = Self::list_index(key, len)?;
                let value = self.convert(value, &element_type)?;
                if index >= len {
                    self.grow_list(list, index)?;
                }
                list.borrow_mut().items[index] = value.clone();
                Ok(value)
            }
            Value::Map(map) => {
                map.borrow_mut().insert(key_string(key), value.clone());
                Ok(value)
            }
            Value::Object(_) => self.write_property(target, &key_string(key), value),
            Value::Null => Err(EvalError::null_navigation("cannot index into null")),
            other => Err(EvalError::type_mismatch(format!(
                "cannot assign through an index of {}",
                other.type_name()
            ))),
        }
    }
}
