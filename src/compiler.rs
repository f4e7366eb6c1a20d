//! Compilation of hot expressions into closures.
//!
//! A compiled expression skips the accessor chain: each property step
//! remembers how it was resolved the first time (getter, field, or map key)
//! together with the receiver type it saw. A later receiver of a different
//! type makes the compiled code bail out with
//! [`EvalErrorKind::CompilationFallback`](crate::EvalErrorKind::CompilationFallback).
//! Any other error, such as a null receiver, makes the caller re-run the
//! interpreter so that errors match interpreted evaluation.
//!
//! Only side-effect-free node kinds compile: literals, `#root`/`#this`,
//! variables, property reads, operators, ternaries, and inline lists.
//! Anything else leaves the expression interpreted.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    accessor::{getter_name, predicate_name},
    ast::{BinOp, Expr, UnaryOp},
    context::EvaluationContext,
    evaluator::{EvalError, EvalErrorKind, methods, operators},
    value::{Value, ValueType},
};

/// Give up compiling an expression after this many failed attempts.
pub const MAX_FAILED_COMPILATIONS: u32 = 100;

/// When an expression is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerMode {
    /// Never compile
    #[default]
    Interpreted,
    /// Compile after the first successful evaluation; a receiver the compiled
    /// code cannot handle is an error
    Immediate,
    /// Compile after a number of interpreted runs; fall back to the
    /// interpreter when the compiled code no longer applies
    Mixed,
}

/// What compiled code sees while it runs.
pub struct Frame<'a> {
    pub root: &'a Value,
    pub ctx: &'a EvaluationContext,
}

type Code = Box<dyn Fn(&Frame<'_>) -> Result<Value, EvalError> + Send + Sync>;

/// An expression compiled against one root type.
pub struct CompiledExpression {
    code: Code,
    root_type: String,
}

impl CompiledExpression {
    pub fn root_type(&self) -> &str {
        &self.root_type
    }

    pub fn run(&self, root: &Value, ctx: &EvaluationContext) -> Result<Value, EvalError> {
        let root_type = root.type_name();
        if root_type != self.root_type {
            return Err(EvalError::compilation_fallback(format!(
                "compiled for a {} root, evaluated against {}",
                self.root_type, root_type
            )));
        }
        (self.code)(&Frame { root, ctx })
    }
}

impl std::fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("root_type", &self.root_type)
            .finish_non_exhaustive()
    }
}

/// Compiles `expr` for the given root.
///
/// Returns `None` when the expression contains node kinds that do not
/// compile, or when a trial run against `root` already has to fall back.
pub fn compile(expr: &Expr, root: &Value, ctx: &EvaluationContext) -> Option<CompiledExpression> {
    if expr.has_side_effects() {
        return None;
    }
    let compiled = CompiledExpression {
        code: compile_node(expr)?,
        root_type: root.type_name(),
    };
    match compiled.run(root, ctx) {
        Err(err) if err.kind() == EvalErrorKind::CompilationFallback => {
            debug!(expression = %expr, reason = %err.message(), "expression not compilable");
            None
        }
        _ => Some(compiled),
    }
}

fn condition(value: Value, ctx: &EvaluationContext) -> Result<bool, EvalError> {
    if let Value::Boolean(b) = value {
        return Ok(b);
    }
    let type_name = value.type_name();
    match ctx.converter().convert(value, &ValueType::Boolean) {
        Ok(Value::Boolean(b)) => Ok(b),
        _ => Err(EvalError::type_mismatch(format!(
            "expected a boolean condition, got {}",
            type_name
        ))),
    }
}

fn compile_node(expr: &Expr) -> Option<Code> {
    let code: Code = match expr {
        Expr::Integer(n) => {
            let n = *n;
            Box::new(move |_| Ok(Value::Integer(n)))
        }
        Expr::Float(n) => {
            let n = *n;
            Box::new(move |_| Ok(Value::Float(n)))
        }
        Expr::String(s) => {
            let s = s.clone();
            Box::new(move |_| Ok(Value::String(s.clone())))
        }
        Expr::Boolean(b) => {
            let b = *b;
            Box::new(move |_| Ok(Value::Boolean(b)))
        }
        Expr::Null => Box::new(|_| Ok(Value::Null)),
        Expr::Root | Expr::This => Box::new(|frame| Ok(frame.root.clone())),
        Expr::Variable(name) => {
            let name = name.clone();
            Box::new(move |frame| Ok(frame.ctx.variable(&name).cloned().unwrap_or(Value::Null)))
        }
        Expr::Property {
            object,
            name,
            null_safe,
        } => {
            let receiver: Code = match object {
                Some(object) => compile_node(object)?,
                None => Box::new(|frame| Ok(frame.root.clone())),
            };
            let slot = PropertySlot::new(name);
            let null_safe = *null_safe;
            Box::new(move |frame| {
                let target = receiver(frame)?;
                match target {
                    Value::Null if null_safe => Ok(Value::Null),
                    // not a fallback: the interpreter re-runs and reports its own error
                    Value::Null => Err(EvalError::null_navigation("compiled property read on null")),
                    target => slot.read(&target),
                }
            })
        }
        Expr::BinaryOp { op, left, right } => {
            let left = compile_node(left)?;
            let right = compile_node(right)?;
            match *op {
                BinOp::And => Box::new(move |frame| {
                    Ok(Value::Boolean(
                        condition(left(frame)?, frame.ctx)? && condition(right(frame)?, frame.ctx)?,
                    ))
                }),
                BinOp::Or => Box::new(move |frame| {
                    Ok(Value::Boolean(
                        condition(left(frame)?, frame.ctx)? || condition(right(frame)?, frame.ctx)?,
                    ))
                }),
                op => Box::new(move |frame| operators::apply_binary(op, &left(frame)?, &right(frame)?)),
            }
        }
        Expr::UnaryOp { op, operand } => {
            let operand = compile_node(operand)?;
            match *op {
                UnaryOp::Not => {
                    Box::new(move |frame| Ok(Value::Boolean(!condition(operand(frame)?, frame.ctx)?)))
                }
                UnaryOp::Negate => Box::new(move |frame| operators::negate(&operand(frame)?)),
                UnaryOp::Plus => Box::new(move |frame| operators::unary_plus(&operand(frame)?)),
            }
        }
        Expr::Ternary {
            condition: test,
            then_branch,
            else_branch,
        } => {
            let test = compile_node(test)?;
            let then_branch = compile_node(then_branch)?;
            let else_branch = compile_node(else_branch)?;
            Box::new(move |frame| {
                if condition(test(frame)?, frame.ctx)? {
                    then_branch(frame)
                } else {
                    else_branch(frame)
                }
            })
        }
        Expr::Elvis { left, right } => {
            let left = compile_node(left)?;
            let right = compile_node(right)?;
            Box::new(move |frame| {
                let value = left(frame)?;
                if operators::elvis_falls_through(&value) {
                    right(frame)
                } else {
                    Ok(value)
                }
            })
        }
        Expr::List(items) => {
            let items = items.iter().map(compile_node).collect::<Option<Vec<_>>>()?;
            Box::new(move |frame| {
                let values = items.iter().map(|item| item(frame)).collect::<Result<Vec<_>, _>>()?;
                Ok(Value::list(values))
            })
        }
        _ => return None,
    };
    Some(code)
}

/// How a property was resolved when it was first read.
#[derive(Debug, Clone)]
enum ReadStrategy {
    Getter(String),
    Field,
    MapKey,
}

impl ReadStrategy {
    /// Mirrors the order of the default accessor chain.
    fn resolve(target: &Value, name: &str) -> Option<Self> {
        match target {
            Value::Object(obj) => {
                let obj = obj.try_borrow().ok()?;
                [getter_name(name), predicate_name(name)]
                    .into_iter()
                    .find(|getter| obj.has_method(getter))
                    .map(ReadStrategy::Getter)
                    .or_else(|| obj.field(name).map(|_| ReadStrategy::Field))
            }
            Value::Map(map) => {
                let builtin_getter = methods::lookup(target, &getter_name(name)).is_some()
                    || methods::lookup(target, &predicate_name(name)).is_some();
                (!builtin_getter && map.borrow().contains_key(name)).then_some(ReadStrategy::MapKey)
            }
            _ => None,
        }
    }

    fn read(&self, target: &Value, name: &str) -> Result<Value, EvalError> {
        let found = match (self, target) {
            (ReadStrategy::Getter(getter), Value::Object(obj)) => match obj.try_borrow_mut() {
                Ok(mut obj) => obj.invoke(getter, &[]).transpose()?,
                Err(_) => None,
            },
            (ReadStrategy::Field, Value::Object(obj)) => obj.try_borrow().ok().and_then(|obj| obj.field(name)),
            (ReadStrategy::MapKey, Value::Map(map)) => map.borrow().get(name).cloned(),
            _ => None,
        };
        found.ok_or_else(|| EvalError::property_not_found(name, &target.type_name()))
    }
}

/// One compiled property step with its cached resolution.
struct PropertySlot {
    name: String,
    resolved: OnceLock<(String, ReadStrategy)>,
}

impl PropertySlot {
    fn new(name: &str) -> Self {
        PropertySlot {
            name: name.to_string(),
            resolved: OnceLock::new(),
        }
    }

    fn read(&self, target: &Value) -> Result<Value, EvalError> {
        let type_name = target.type_name();
        let (cached_type, strategy) = match self.resolved.get() {
            Some(resolved) => resolved,
            None => {
                let strategy = ReadStrategy::resolve(target, &self.name).ok_or_else(|| {
                    EvalError::compilation_fallback(format!(
                        "property '{}' of {} has no compiled access path",
                        self.name, type_name
                    ))
                })?;
                self.resolved.get_or_init(|| (type_name.clone(), strategy))
            }
        };
        if *cached_type != type_name {
            return Err(EvalError::compilation_fallback(format!(
                "property '{}' was compiled for {}, receiver is {}",
                self.name, cached_type, type_name
            )));
        }
        strategy.read(target, &self.name)
    }
}
