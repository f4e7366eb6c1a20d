//! Parser and application configuration, loadable from TOML.
//!
//! ```toml
//! [parser]
//! auto-grow-null-references = true
//! auto-grow-collections = true
//! maximum-auto-grow-size = 1024
//! compiler-mode = "mixed"
//!
//! [logging]
//! level = "debug"
//! format = "pretty"
//!
//! [properties]
//! "app.name" = "inventory"
//! ```

use std::{fs, path::{Path, PathBuf}};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{compiler::CompilerMode, parser::DEFAULT_MAX_DEPTH};

/// Runs of an expression before `Mixed` mode compiles it.
pub const DEFAULT_MIXED_THRESHOLD: u32 = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings fixed when an expression is parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ParserConfig {
    /// Initialize null properties when navigating through them
    pub auto_grow_null_references: bool,
    /// Pad lists with default elements when indexed past their end
    pub auto_grow_collections: bool,
    /// Largest index auto-grow will pad a list up to
    pub maximum_auto_grow_size: usize,
    pub compiler_mode: CompilerMode,
    pub mixed_threshold: u32,
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            auto_grow_null_references: false,
            auto_grow_collections: false,
            maximum_auto_grow_size: i32::MAX as usize,
            compiler_mode: CompilerMode::Interpreted,
            mixed_threshold: DEFAULT_MIXED_THRESHOLD,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParserConfig {
    pub fn new(auto_grow_null_references: bool, auto_grow_collections: bool) -> Self {
        ParserConfig {
            auto_grow_null_references,
            auto_grow_collections,
            ..Default::default()
        }
    }

    pub fn with_maximum_auto_grow_size(mut self, size: usize) -> Self {
        self.maximum_auto_grow_size = size;
        self
    }

    pub fn with_compiler_mode(mut self, mode: CompilerMode) -> Self {
        self.compiler_mode = mode;
        self
    }

    pub fn with_mixed_threshold(mut self, threshold: u32) -> Self {
        self.mixed_threshold = threshold;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoggingConfig {
    /// Filter directive, overridden by `RUST_LOG`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub parser: ParserConfig,
    pub logging: LoggingConfig,
    /// Application properties visible through `environment[...]`
    pub properties: IndexMap<String, String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

#[test]
fn test_partial_config_keeps_defaults() {
    let config = Config::from_toml_str(
        r#"
        [parser]
        auto-grow-collections = true
        compiler-mode = "immediate"
        "#,
    )
    .unwrap();
    assert!(config.parser.auto_grow_collections);
    assert!(!config.parser.auto_grow_null_references);
    assert_eq!(config.parser.compiler_mode, CompilerMode::Immediate);
    assert_eq!(config.parser.max_depth, DEFAULT_MAX_DEPTH);
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn test_unknown_mode_is_rejected() {
    assert!(Config::from_toml_str("[parser]\ncompiler-mode = \"jit\"\n").is_err());
}

#[test]
fn test_properties_table_keeps_order() {
    let config = Config::from_toml_str(
        r#"
        [properties]
        "app.name" = "inventory"
        "app.region" = "eu"
        "#,
    )
    .unwrap();
    let keys: Vec<&str> = config.properties.keys().map(String::as_str).collect();
    assert_eq!(keys, ["app.name", "app.region"]);
    assert_eq!(config.properties["app.region"], "eu");
}
