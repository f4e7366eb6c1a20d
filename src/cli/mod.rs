//! CLI support for spel-lite
//!
//! Provides programmatic access to the `spel` commands so they can be
//! embedded in other tools.

mod convert;
mod docs;
mod eval;

pub use convert::{json_to_value, value_to_json};
pub use docs::{DocCategory, get_doc_category, get_docs_overview};
pub use eval::{EvalOptions, EvalOutcome, Fixture, execute_eval};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] crate::ParseError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] crate::ConfigError),

    /// A `--var` or `--property` argument without `=`
    #[error("Invalid assignment '{0}', expected name=value")]
    InvalidAssignment(String),

    #[error("Unknown type '{0}' for --target")]
    UnknownTarget(String),

    #[error("Unknown category: '{0}'\nRun 'spel docs' to see available categories.")]
    UnknownCategory(String),
}
