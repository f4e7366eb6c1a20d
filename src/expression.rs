//! Parsed, reusable expressions and the parser that produces them.

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::{
    ast::Expr,
    compiler::{self, CompiledExpression, CompilerMode, MAX_FAILED_COMPILATIONS},
    config::ParserConfig,
    context::EvaluationContext,
    conversion::FromValue,
    evaluator::{EvalError, EvalErrorKind, Evaluator},
    lexer::Lexer,
    parser::{self, ParseError, Parser, TemplateContext},
    value::{Value, ValueType},
};

/// Any failure between source text and a value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
}

/// Parses expression strings and templates with a fixed [`ParserConfig`].
#[derive(Debug, Clone, Default)]
pub struct ExpressionParser {
    config: ParserConfig,
}

impl ExpressionParser {
    pub fn new() -> Self {
        ExpressionParser::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        ExpressionParser { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn parse_expression(&self, source: &str) -> Result<Expression, ParseError> {
        let ast = Parser::new(Lexer::new(source))?
            .with_max_depth(self.config.max_depth)
            .parse()?;
        debug!(source, "parsed expression");
        Ok(Expression::new(source, ast, self.config.clone()))
    }

    /// Parses literal text with embedded expressions, e.g. `Hello #{name}!`.
    pub fn parse_template(&self, source: &str, context: &TemplateContext) -> Result<Expression, ParseError> {
        let ast = parser::parse_template(source, context, self.config.max_depth)?;
        debug!(source, "parsed template");
        Ok(Expression::new(source, ast, self.config.clone()))
    }
}

#[derive(Debug, Default)]
struct CompilerState {
    interpreted_runs: u32,
    failed_attempts: u32,
    compiled: Option<Arc<CompiledExpression>>,
}

/// A parsed expression, evaluated any number of times against different
/// roots and contexts.
///
/// # Examples
///
/// ```
/// use spel_lite::{ExpressionParser, Value};
///
/// let expr = ExpressionParser::new().parse_expression("'Hello World'.concat('!')").unwrap();
/// assert_eq!(expr.get_value().unwrap(), Value::from("Hello World!"));
/// ```
#[derive(Debug)]
pub struct Expression {
    source: String,
    ast: Expr,
    config: ParserConfig,
    state: Mutex<CompilerState>,
}

impl Expression {
    fn new(source: &str, ast: Expr, config: ParserConfig) -> Self {
        Expression {
            source: source.to_string(),
            ast,
            config,
            state: Mutex::new(CompilerState::default()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Whether evaluation currently runs compiled code.
    pub fn is_compiled(&self) -> bool {
        self.state().compiled.is_some()
    }

    /// Evaluates in a fresh standard context with a null root.
    pub fn get_value(&self) -> Result<Value, EvalError> {
        let mut ctx = EvaluationContext::standard().build();
        self.get_value_in(&mut ctx)
    }

    /// Evaluates in a fresh standard context against `root`.
    pub fn get_value_for(&self, root: &Value) -> Result<Value, EvalError> {
        let mut ctx = EvaluationContext::standard().build();
        self.evaluate(&mut ctx, Some(root))
    }

    /// Evaluates against the context's own root object.
    pub fn get_value_in(&self, ctx: &mut EvaluationContext) -> Result<Value, EvalError> {
        self.evaluate(ctx, None)
    }

    /// Evaluates against `root` (or the context root) and converts the result.
    pub fn get_typed_value(
        &self,
        ctx: &mut EvaluationContext,
        root: Option<&Value>,
        target: &ValueType,
    ) -> Result<Value, EvalError> {
        let value = self.evaluate(ctx, root)?;
        if target.accepts(&value) {
            return Ok(value);
        }
        ctx.converter().convert(value, target)
    }

    /// Evaluates and extracts the result as a Rust type.
    ///
    /// ```
    /// use spel_lite::{EvaluationContext, ExpressionParser};
    ///
    /// let expr = ExpressionParser::new().parse_expression("'42'").unwrap();
    /// let mut ctx = EvaluationContext::standard().build();
    /// let n: i64 = expr.get_value_as(&mut ctx).unwrap();
    /// assert_eq!(n, 42);
    /// ```
    pub fn get_value_as<T: FromValue>(&self, ctx: &mut EvaluationContext) -> Result<T, EvalError> {
        let value = self.get_typed_value(ctx, None, &T::target_type())?;
        T::from_value(value)
    }

    /// Assigns `value` to the location this expression names.
    pub fn set_value(
        &self,
        ctx: &mut EvaluationContext,
        root: Option<&Value>,
        value: Value,
    ) -> Result<(), EvalError> {
        let mut evaluator = self.evaluator(ctx, root);
        evaluator.assign_value(&self.ast, value)?;
        Ok(())
    }

    /// Compiles now against `root`, regardless of mode. Returns whether
    /// compiled code is in place afterwards.
    pub fn compile_for(&self, ctx: &EvaluationContext, root: &Value) -> bool {
        self.try_compile(ctx, root);
        self.is_compiled()
    }

    fn state(&self) -> MutexGuard<'_, CompilerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn evaluator<'a>(&'a self, ctx: &'a mut EvaluationContext, root: Option<&Value>) -> Evaluator<'a> {
        let evaluator = Evaluator::new(ctx, &self.config);
        match root {
            Some(root) => evaluator.with_root(root.clone()),
            None => evaluator,
        }
    }

    fn interpret(&self, ctx: &mut EvaluationContext, root: Option<&Value>) -> Result<Value, EvalError> {
        trace!(expression = %self.source, "interpreting");
        self.evaluator(ctx, root).evaluate(&self.ast)
    }

    fn evaluate(&self, ctx: &mut EvaluationContext, root: Option<&Value>) -> Result<Value, EvalError> {
        if self.config.compiler_mode == CompilerMode::Interpreted || self.config.auto_grow_null_references {
            return self.interpret(ctx, root);
        }

        let compiled = self.state().compiled.clone();
        if let Some(compiled) = compiled {
            let actual_root = root.cloned().unwrap_or_else(|| ctx.root().clone());
            match compiled.run(&actual_root, ctx) {
                Ok(value) => return Ok(value),
                Err(err) if err.kind() == EvalErrorKind::CompilationFallback => {
                    if self.config.compiler_mode == CompilerMode::Immediate {
                        return Err(EvalError::type_mismatch(format!(
                            "compiled expression '{}' cannot handle this input: {}",
                            self.source,
                            err.message()
                        )));
                    }
                    warn!(expression = %self.source, reason = %err.message(), "compiled expression fell back to the interpreter");
                    let mut state = self.state();
                    state.compiled = None;
                    state.interpreted_runs = 0;
                    state.failed_attempts += 1;
                }
                // the interpreter reports the error with its failing sub-expression
                Err(_) => return self.interpret(ctx, root),
            }
        }

        let value = self.interpret(ctx, root)?;

        let should_compile = {
            let mut state = self.state();
            state.interpreted_runs = state.interpreted_runs.saturating_add(1);
            state.compiled.is_none()
                && state.failed_attempts < MAX_FAILED_COMPILATIONS
                && match self.config.compiler_mode {
                    CompilerMode::Immediate => true,
                    CompilerMode::Mixed => state.interpreted_runs >= self.config.mixed_threshold,
                    CompilerMode::Interpreted => false,
                }
        };
        if should_compile {
            let actual_root = root.cloned().unwrap_or_else(|| ctx.root().clone());
            self.try_compile(ctx, &actual_root);
        }
        Ok(value)
    }

    fn try_compile(&self, ctx: &EvaluationContext, root: &Value) {
        match compiler::compile(&self.ast, root, ctx) {
            Some(compiled) => {
                debug!(expression = %self.source, root_type = compiled.root_type(), "compiled expression");
                self.state().compiled = Some(Arc::new(compiled));
            }
            None => {
                self.state().failed_attempts += 1;
            }
        }
    }
}

/// Parses and evaluates `source` in a standard context with a null root.
pub fn evaluate(source: &str) -> Result<Value, ExpressionError> {
    let expression = ExpressionParser::new().parse_expression(source)?;
    Ok(expression.get_value()?)
}
