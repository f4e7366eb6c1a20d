//! Evaluate expressions and templates against JSON input

use std::rc::Rc;

use crate::{
    BeanRegistry, EvaluationContext, ExpressionParser, ParserConfig, StandardEnvironment,
    TemplateContext, Value, ValueType, inventor,
};

use super::{CliError, json_to_value, value_to_json};

/// Sample object graphs usable as the root instead of JSON input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixture {
    Tesla,
    Ieee,
}

impl Fixture {
    fn root(self) -> Value {
        match self {
            Fixture::Tesla => Value::object(inventor::tesla()),
            Fixture::Ieee => Value::object(inventor::ieee()),
        }
    }
}

/// Options for the eval command
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    /// The expression (or template, with `template`) to evaluate
    pub expression: String,
    /// JSON root object
    pub input: Option<String>,
    /// Use a sample object graph as root; wins over `input`
    pub fixture: Option<Fixture>,
    /// `name=value` pairs bound as `#name`; values parse as JSON, else as text
    pub variables: Vec<String>,
    /// `key=value` pairs visible through `environment[...]`
    pub properties: Vec<String>,
    /// Treat the expression as `#{...}` template text
    pub template: bool,
    pub read_only: bool,
    /// Convert the result to this type, e.g. `Integer` or `String`
    pub target: Option<String>,
    /// Only validate syntax, don't evaluate
    pub syntax_only: bool,
    pub parser: ParserConfig,
    /// Application properties from the config file
    pub base_properties: Vec<(String, String)>,
}

/// Result of an eval operation
#[derive(Debug)]
pub enum EvalOutcome {
    /// Syntax validation passed
    SyntaxValid,
    /// Expression evaluated successfully with JSON output
    Success(serde_json::Value),
}

fn split_assignment(arg: &str) -> Result<(&str, &str), CliError> {
    match arg.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => Err(CliError::InvalidAssignment(arg.to_string())),
    }
}

fn parse_target(name: &str) -> Result<ValueType, CliError> {
    match ValueType::from_name(name) {
        ValueType::Object(_) => Err(CliError::UnknownTarget(name.to_string())),
        target => Ok(target),
    }
}

fn build_context(options: &EvalOptions, root: Value) -> Result<EvaluationContext, CliError> {
    let mut environment = StandardEnvironment::new();
    for (key, value) in &options.base_properties {
        environment.set_property(key.as_str(), value.as_str());
    }
    for property in &options.properties {
        let (key, value) = split_assignment(property)?;
        environment.set_property(key, value);
    }

    let mut builder = EvaluationContext::for_bean_definitions(
        Rc::new(environment),
        Rc::new(BeanRegistry::new()),
    )
    .root(root);
    if options.read_only {
        builder = builder.read_only();
    }
    for variable in &options.variables {
        let (name, text) = split_assignment(variable)?;
        let value = serde_json::from_str(text)
            .map(json_to_value)
            .unwrap_or_else(|_| Value::string(text));
        builder = builder.with_variable(name, value);
    }

    let mut ctx = builder.build();
    inventor::register_types(ctx.types_mut());
    Ok(ctx)
}

/// Execute a spel eval operation
pub fn execute_eval(options: &EvalOptions) -> Result<EvalOutcome, CliError> {
    let parser = ExpressionParser::with_config(options.parser.clone());
    let expression = if options.template {
        parser.parse_template(&options.expression, &TemplateContext::default())?
    } else {
        parser.parse_expression(&options.expression)?
    };

    if options.syntax_only {
        return Ok(EvalOutcome::SyntaxValid);
    }

    let root = match (options.fixture, &options.input) {
        (Some(fixture), _) => fixture.root(),
        (None, Some(json)) => json_to_value(serde_json::from_str(json)?),
        (None, None) => Value::Null,
    };
    let mut ctx = build_context(options, root)?;

    let result = match &options.target {
        Some(target) => expression.get_typed_value(&mut ctx, None, &parse_target(target)?)?,
        None => expression.get_value_in(&mut ctx)?,
    };
    Ok(EvalOutcome::Success(value_to_json(&result)))
}

#[test]
fn test_eval_against_json_input() {
    let options = EvalOptions {
        expression: "items.?[#this > #min].size()".to_string(),
        input: Some(r#"{"items": [1, 5, 10]}"#.to_string()),
        variables: vec!["min=2".to_string()],
        ..Default::default()
    };
    match execute_eval(&options).unwrap() {
        EvalOutcome::Success(json) => assert_eq!(json, serde_json::json!(2)),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn test_eval_rejects_malformed_variables() {
    let options = EvalOptions {
        expression: "#x".to_string(),
        variables: vec!["x".to_string()],
        ..Default::default()
    };
    assert!(matches!(execute_eval(&options), Err(CliError::InvalidAssignment(_))));
}
