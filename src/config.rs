//! Layered configuration lookup.
//!
//! Settings for the crate's components (currently the
//! [`ErrorHandler`](crate::ErrorHandler)) are read through a
//! [`ConfigProvider`], which consults its sources in priority order. The
//! usual stack is process environment first, then in-memory defaults.

use std::collections::HashMap;
use std::env;
use std::fmt;

use crate::error::{KitError, KitResult};

/// A configuration value that can be various types
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ConfigValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl ConfigValue {
    /// Parses a raw string, preferring the narrowest type that fits.
    ///
    /// A typed value is only chosen when it renders back to exactly `raw`,
    /// so `"007"`, `"1e3"` or `"Infinity"` stay strings.
    pub fn parse(raw: &str) -> Self {
        let typed = if let Ok(int_val) = raw.parse::<i64>() {
            Some(ConfigValue::Integer(int_val))
        } else if let Ok(float_val) = raw.parse::<f64>() {
            Some(ConfigValue::Float(float_val))
        } else if let Ok(bool_val) = raw.parse::<bool>() {
            Some(ConfigValue::Boolean(bool_val))
        } else {
            None
        };
        match typed {
            Some(value) if value.to_string() == raw => value,
            _ => ConfigValue::String(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Booleans, plus the integer flags `0` and `1`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            ConfigValue::Integer(0) => Some(false),
            ConfigValue::Integer(1) => Some(true),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Boolean(b) => write!(f, "{}", b),
            ConfigValue::Integer(i) => write!(f, "{}", i),
            ConfigValue::Float(x) => write!(f, "{}", x),
            ConfigValue::String(s) => f.write_str(s),
        }
    }
}

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync + fmt::Debug {
    /// Get a configuration value by key
    fn get(&self, key: &str) -> Option<ConfigValue>;

    /// The value as originally written, for sources that read text.
    fn get_raw(&self, key: &str) -> Option<String> {
        self.get(key).map(|value| value.to_string())
    }

    /// List all available keys
    fn keys(&self) -> Vec<String>;
}

/// Environment variable configuration source
///
/// Keys are upper-cased and, with a prefix, joined as `PREFIX_KEY`; the
/// lookup `internal_message` with prefix `app` reads `APP_INTERNAL_MESSAGE`.
#[derive(Debug, Default)]
pub struct EnvironmentConfigSource {
    prefix: Option<String>,
}

impl EnvironmentConfigSource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn env_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix.to_uppercase(), key.to_uppercase()),
            None => key.to_uppercase(),
        }
    }
}

impl ConfigSource for EnvironmentConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.get_raw(key).map(|value| ConfigValue::parse(&value))
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(self.env_key(key)).ok()
    }

    fn keys(&self) -> Vec<String> {
        let prefix = self
            .prefix
            .as_ref()
            .map(|p| format!("{}_", p.to_uppercase()));
        env::vars()
            .filter_map(|(key, _)| match &prefix {
                Some(prefix) => key
                    .strip_prefix(prefix.as_str())
                    .map(|rest| rest.to_lowercase()),
                None => Some(key.to_lowercase()),
            })
            .collect()
    }
}

/// In-memory configuration source, typically holding defaults or test
/// overrides.
#[derive(Debug, Default, Clone)]
pub struct MemoryConfigSource {
    values: HashMap<String, ConfigValue>,
}

impl MemoryConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: ConfigValue) {
        self.values.insert(key.into(), value);
    }

    /// Loads a flat JSON object of scalar values.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let values: HashMap<String, ConfigValue> = serde_json::from_str(json)?;
        Ok(Self { values })
    }
}

impl ConfigSource for MemoryConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.values.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

/// Ordered set of configuration sources; the first source that knows a key
/// wins.
///
/// # Examples
///
/// ```
/// use ferrous_kit::config::{ConfigProvider, ConfigValue, MemoryConfigSource};
///
/// let mut config = ConfigProvider::new();
/// config.add_source(Box::new(
///     MemoryConfigSource::new().with("expose_internal_messages", ConfigValue::Boolean(true)),
/// ));
///
/// assert!(config.get_bool("expose_internal_messages").unwrap());
/// assert!(config.get_bool("missing").is_err());
/// assert_eq!(config.get_string_or("missing", "fallback"), "fallback");
/// ```
#[derive(Debug, Default)]
pub struct ConfigProvider {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment (optionally prefixed) as the only source.
    pub fn from_env(prefix: Option<&str>) -> Self {
        let source = match prefix {
            Some(prefix) => EnvironmentConfigSource::with_prefix(prefix),
            None => EnvironmentConfigSource::new(),
        };
        let mut provider = Self::new();
        provider.add_source(Box::new(source));
        provider
    }

    /// Add a configuration source (higher priority sources should be added first)
    pub fn add_source(&mut self, source: Box<dyn ConfigSource>) {
        self.sources.push(source);
    }

    pub fn get(&self, key: &str) -> Option<ConfigValue> {
        self.sources.iter().find_map(|source| source.get(key))
    }

    fn require(&self, key: &str) -> KitResult<ConfigValue> {
        self.get(key)
            .ok_or_else(|| KitError::MissingConfig(key.to_string()))
    }

    /// String values, as the source wrote them; typed values from memory
    /// sources are rendered as text.
    pub fn get_string(&self, key: &str) -> KitResult<String> {
        self.get_string_opt(key)
            .ok_or_else(|| KitError::MissingConfig(key.to_string()))
    }

    pub fn get_string_opt(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|source| source.get_raw(key))
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    pub fn get_i64(&self, key: &str) -> KitResult<i64> {
        self.require(key)?.as_i64().ok_or_else(|| KitError::ConfigType {
            key: key.to_string(),
            expected: "integer",
        })
    }

    pub fn get_bool(&self, key: &str) -> KitResult<bool> {
        self.require(key)?.as_bool().ok_or_else(|| KitError::ConfigType {
            key: key.to_string(),
            expected: "boolean",
        })
    }

    /// Like [`get_bool`](Self::get_bool), but a missing key yields `None`
    /// while a mistyped one is still an error.
    pub fn get_bool_opt(&self, key: &str) -> KitResult<Option<bool>> {
        match self.get_bool(key) {
            Ok(value) => Ok(Some(value)),
            Err(KitError::MissingConfig(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Get all configuration keys from all sources
    pub fn all_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.sources.iter().flat_map(|s| s.keys()).collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sniffs_types() {
        assert_eq!(ConfigValue::parse("42"), ConfigValue::Integer(42));
        assert_eq!(ConfigValue::parse("1.5"), ConfigValue::Float(1.5));
        assert_eq!(ConfigValue::parse("true"), ConfigValue::Boolean(true));
        assert_eq!(ConfigValue::parse("hello"), ConfigValue::String("hello".into()));
    }

    #[test]
    fn test_parse_keeps_text_that_would_change() {
        for raw in ["007", "1e3", "Infinity", "3.10", "-0", "+5"] {
            assert_eq!(ConfigValue::parse(raw), ConfigValue::String(raw.into()));
            assert_eq!(ConfigValue::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn test_integer_flags_read_as_bool() {
        assert_eq!(ConfigValue::parse("1").as_bool(), Some(true));
        assert_eq!(ConfigValue::parse("0").as_bool(), Some(false));
        assert_eq!(ConfigValue::Integer(2).as_bool(), None);
    }

    #[test]
    fn test_first_source_wins() {
        let mut config = ConfigProvider::new();
        config.add_source(Box::new(
            MemoryConfigSource::new().with("level", ConfigValue::Integer(1)),
        ));
        config.add_source(Box::new(
            MemoryConfigSource::new()
                .with("level", ConfigValue::Integer(2))
                .with("name", ConfigValue::String("kit".into())),
        ));

        assert_eq!(config.get_i64("level").unwrap(), 1);
        assert_eq!(config.get_string("name").unwrap(), "kit");
        assert_eq!(config.all_keys(), vec!["level".to_string(), "name".to_string()]);
    }

    #[test]
    fn test_type_mismatch() {
        let mut config = ConfigProvider::new();
        config.add_source(Box::new(
            MemoryConfigSource::new().with("flag", ConfigValue::String("yes".into())),
        ));

        assert_eq!(
            config.get_bool("flag"),
            Err(KitError::ConfigType {
                key: "flag".into(),
                expected: "boolean"
            })
        );
        assert_eq!(config.get_bool_opt("absent"), Ok(None));
        assert!(config.get_bool_opt("flag").is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_memory_source_from_json() {
        let source =
            MemoryConfigSource::from_json_str(r#"{"internal_message": "oops", "retries": 3}"#)
                .unwrap();
        assert_eq!(source.get("internal_message"), Some(ConfigValue::String("oops".into())));
        assert_eq!(source.get("retries"), Some(ConfigValue::Integer(3)));
    }
}
