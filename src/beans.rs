//! Bean references (`@name`) and evaluation of bean-definition values.

use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc};

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    config::ParserConfig,
    context::EvaluationContext,
    environment::PropertySource,
    expression::{Expression, ExpressionError, ExpressionParser},
    parser::TemplateContext,
    value::Value,
};

/// Looks up named beans for `@name` references.
pub trait BeanResolver: fmt::Debug {
    fn resolve_bean(&self, name: &str) -> Option<Value>;

    fn contains_bean(&self, name: &str) -> bool {
        self.resolve_bean(name).is_some()
    }
}

/// A fixed set of named beans.
#[derive(Debug, Clone, Default)]
pub struct BeanRegistry {
    beans: IndexMap<String, Value>,
}

impl BeanRegistry {
    pub fn new() -> Self {
        BeanRegistry::default()
    }

    pub fn with_bean(mut self, name: impl Into<String>, bean: Value) -> Self {
        self.register(name, bean);
        self
    }

    pub fn register(&mut self, name: impl Into<String>, bean: Value) {
        self.beans.insert(name.into(), bean);
    }
}

impl BeanResolver for BeanRegistry {
    fn resolve_bean(&self, name: &str) -> Option<Value> {
        self.beans.get(name).cloned()
    }

    fn contains_bean(&self, name: &str) -> bool {
        self.beans.contains_key(name)
    }
}

/// Evaluates `#{...}` templates found in bean-definition values.
///
/// Each distinct value string is parsed once and cached.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use spel_lite::{BeanExpressionResolver, BeanRegistry, StandardEnvironment, Value};
///
/// let env = StandardEnvironment::new().with_property("app.region", "eu");
/// let resolver = BeanExpressionResolver::new(Rc::new(env), Rc::new(BeanRegistry::new()));
///
/// let value = resolver.evaluate("region-#{environment['app.region']}").unwrap();
/// assert_eq!(value, Value::from("region-eu"));
/// ```
pub struct BeanExpressionResolver {
    parser: ExpressionParser,
    template: TemplateContext,
    properties: Rc<dyn PropertySource>,
    beans: Rc<dyn BeanResolver>,
    cache: RefCell<HashMap<String, Rc<Expression>>>,
}

impl BeanExpressionResolver {
    pub fn new(properties: Rc<dyn PropertySource>, beans: Rc<dyn BeanResolver>) -> Self {
        BeanExpressionResolver {
            parser: ExpressionParser::new(),
            template: TemplateContext::default(),
            properties,
            beans,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn with_parser_config(mut self, config: ParserConfig) -> Self {
        self.parser = ExpressionParser::with_config(config);
        self.cache.borrow_mut().clear();
        self
    }

    pub fn with_template(mut self, template: TemplateContext) -> Self {
        self.template = template;
        self.cache.borrow_mut().clear();
        self
    }

    fn expression(&self, value: &str) -> Result<Rc<Expression>, ExpressionError> {
        if let Some(expression) = self.cache.borrow().get(value) {
            return Ok(Rc::clone(expression));
        }
        let expression = Rc::new(self.parser.parse_template(value, &self.template)?);
        debug!(value, "parsed bean definition value");
        self.cache
            .borrow_mut()
            .insert(value.to_string(), Rc::clone(&expression));
        Ok(expression)
    }

    /// Evaluates a bean-definition value. Text without `#{` comes back unchanged.
    pub fn evaluate(&self, value: &str) -> Result<Value, ExpressionError> {
        let expression = self.expression(value)?;
        let mut ctx =
            EvaluationContext::for_bean_definitions(Rc::clone(&self.properties), Rc::clone(&self.beans))
                .build();
        Ok(expression.get_value_in(&mut ctx)?)
    }
}

impl fmt::Debug for BeanExpressionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanExpressionResolver")
            .field("template", &self.template)
            .field("properties", &self.properties)
            .field("beans", &self.beans)
            .field("cached", &self.cache.borrow().len())
            .finish()
    }
}
