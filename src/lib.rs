//! An embeddable expression language for navigating and manipulating object
//! graphs at runtime.
//!
//! ```
//! use spel_lite::{EvaluationContext, ExpressionParser, Value};
//! use spel_lite::inventor;
//!
//! let parser = ExpressionParser::new();
//! let mut ctx = EvaluationContext::standard()
//!     .root(Value::object(inventor::tesla()))
//!     .build();
//!
//! let city = parser.parse_expression("placeOfBirth.city").unwrap();
//! assert_eq!(city.get_value_in(&mut ctx).unwrap(), Value::from("Smiljan"));
//! ```

pub mod accessor;
pub mod ast;
pub mod beans;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compiler;
pub mod config;
pub mod context;
pub mod conversion;
pub mod environment;
pub mod evaluator;
pub mod expression;
pub mod inventor;
pub mod lexer;
pub mod parser;
pub mod types;
pub mod value;

pub use accessor::{BeanFactoryAccessor, FieldAccessor, GetterAccessor, PropertyAccessor, PropertySourceAccessor};
pub use ast::{BinOp, Expr, SelectionKind, Token, UnaryOp};
pub use beans::{BeanExpressionResolver, BeanRegistry, BeanResolver};
pub use compiler::CompilerMode;
pub use config::{Config, ConfigError, LogFormat, LoggingConfig, ParserConfig};
pub use context::{AccessPolicy, ContextBuilder, EvaluationContext};
pub use conversion::{DefaultConverter, FromValue, TypeConverter};
pub use environment::{Namespace, PropertySource, StandardEnvironment};
pub use evaluator::{EvalError, EvalErrorKind, Evaluator};
pub use expression::{Expression, ExpressionError, ExpressionParser, evaluate};
pub use lexer::{LexError, Lexer, Position};
pub use parser::{ParseError, Parser, TemplateContext};
pub use types::{TypeDescriptor, TypeRegistry};
pub use value::{EnumConstant, HostObject, Record, Value, ValueType};
