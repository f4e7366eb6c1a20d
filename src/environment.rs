//! Property sources for bean-definition expressions.
//!
//! `#{environment['app.name']}`, `#{systemProperties['user.home']}` and
//! `#{systemEnvironment['HOME']}` read through a [`PropertySource`].

use std::{collections::HashMap, fmt, fs, path::Path, rc::Rc};

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    config::ConfigError,
    value::{HostObject, Value},
};

/// The names under which property lookups are reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Application properties, then system properties, then environment variables
    Environment,
    SystemProperties,
    SystemEnvironment,
}

impl Namespace {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "environment" => Some(Namespace::Environment),
            "systemProperties" => Some(Namespace::SystemProperties),
            "systemEnvironment" => Some(Namespace::SystemEnvironment),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Namespace::Environment => "environment",
            Namespace::SystemProperties => "systemProperties",
            Namespace::SystemEnvironment => "systemEnvironment",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait PropertySource: fmt::Debug {
    fn property(&self, namespace: Namespace, key: &str) -> Option<String>;
}

/// Application properties layered over process-level settings.
#[derive(Debug, Clone, Default)]
pub struct StandardEnvironment {
    application: IndexMap<String, String>,
    system: IndexMap<String, String>,
    /// Overrides consulted before the process environment
    variables: HashMap<String, String>,
}

impl StandardEnvironment {
    /// An environment with the built-in system properties and no
    /// application properties.
    pub fn new() -> Self {
        StandardEnvironment {
            system: system_properties(),
            ..Default::default()
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.application.insert(key.into(), value.into());
        self
    }

    pub fn with_system_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.system.insert(key.into(), value.into());
        self
    }

    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.application.insert(key.into(), value.into());
    }

    /// Adds application properties from a `key=value` properties file.
    pub fn load_properties(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = parse_properties(&text);
        debug!(path = %path.display(), count = parsed.len(), "loaded application properties");
        self.application.extend(parsed);
        Ok(())
    }

    fn env_var(&self, key: &str) -> Option<String> {
        self.variables
            .get(key)
            .cloned()
            .or_else(|| std::env::var(key).ok())
    }
}

impl PropertySource for StandardEnvironment {
    fn property(&self, namespace: Namespace, key: &str) -> Option<String> {
        match namespace {
            Namespace::Environment => self
                .application
                .get(key)
                .or_else(|| self.system.get(key))
                .cloned()
                .or_else(|| self.env_var(key)),
            Namespace::SystemProperties => self.system.get(key).cloned(),
            Namespace::SystemEnvironment => self.env_var(key),
        }
    }
}

fn system_properties() -> IndexMap<String, String> {
    let mut props = IndexMap::new();
    props.insert("os.name".to_string(), std::env::consts::OS.to_string());
    props.insert("os.arch".to_string(), std::env::consts::ARCH.to_string());
    props.insert("os.family".to_string(), std::env::consts::FAMILY.to_string());
    props.insert(
        "spel.version".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    props.insert(
        "file.separator".to_string(),
        std::path::MAIN_SEPARATOR.to_string(),
    );
    props.insert(
        "line.separator".to_string(),
        if cfg!(windows) { "\r\n" } else { "\n" }.to_string(),
    );
    if let Ok(dir) = std::env::current_dir() {
        props.insert("user.dir".to_string(), dir.display().to_string());
    }
    if let Ok(home) = std::env::var("HOME") {
        props.insert("user.home".to_string(), home);
    }
    if let Ok(user) = std::env::var("USER") {
        props.insert("user.name".to_string(), user);
    }
    props
}

/// Parses `key=value` / `key: value` lines; `#` and `!` start comments.
pub fn parse_properties(text: &str) -> IndexMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .filter_map(|line| {
            let split = line.find(['=', ':'])?;
            let (key, value) = line.split_at(split);
            Some((key.trim().to_string(), value[1..].trim().to_string()))
        })
        .collect()
}

/// A namespace exposed as an object: each key is a field, absent keys read as null.
#[derive(Debug)]
pub struct NamespaceView {
    namespace: Namespace,
    source: Rc<dyn PropertySource>,
}

impl NamespaceView {
    pub fn new(namespace: Namespace, source: Rc<dyn PropertySource>) -> Self {
        NamespaceView { namespace, source }
    }
}

impl HostObject for NamespaceView {
    fn type_name(&self) -> &str {
        "Properties"
    }

    fn field(&self, name: &str) -> Option<Value> {
        Some(
            self.source
                .property(self.namespace, name)
                .map_or(Value::Null, Value::String),
        )
    }

    fn describe(&self) -> String {
        self.namespace.to_string()
    }
}

#[test]
fn test_environment_precedence() {
    let env = StandardEnvironment::new()
        .with_system_property("app.mode", "system")
        .with_property("app.mode", "application")
        .with_env_var("APP_TOKEN", "secret");
    assert_eq!(
        env.property(Namespace::Environment, "app.mode").as_deref(),
        Some("application")
    );
    assert_eq!(
        env.property(Namespace::SystemProperties, "app.mode").as_deref(),
        Some("system")
    );
    assert_eq!(
        env.property(Namespace::Environment, "APP_TOKEN").as_deref(),
        Some("secret")
    );
}

#[test]
fn test_parse_properties() {
    let props = parse_properties("# comment\napp.name = demo\nurl: http://x=y\n\n! other\n");
    assert_eq!(props.get("app.name").map(String::as_str), Some("demo"));
    assert_eq!(props.get("url").map(String::as_str), Some("http://x=y"));
    assert_eq!(props.len(), 2);
}
