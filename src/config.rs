//! Configuration Module
//!
//! Loads option sources (option name → value) from environment variables or JSON.

use std::env;

use serde_json::{Map, Value};

use crate::error::{OptionsError, Result};
use crate::options::MEMORY_LIMIT;

/// Environment variable overriding the `memory_limit` option.
pub const CACHE_MEMORY_LIMIT_ENV: &str = "CACHE_MEMORY_LIMIT";

/// Option source applied to an options holder at construction.
///
/// Holds raw values; validation happens when the options holder applies them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    options: Map<String, Value>,
}

impl Config {
    /// Creates a Config from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MEMORY_LIMIT` - Memory limit, bytes or shorthand like `256M`
    ///   (default: unset, the limit is derived from the host)
    pub fn from_env() -> Self {
        let mut options = Map::new();
        if let Ok(raw) = env::var(CACHE_MEMORY_LIMIT_ENV) {
            options.insert(MEMORY_LIMIT.to_string(), Value::String(raw));
        }
        Self { options }
    }

    /// Parses a JSON object of option name → value.
    pub fn from_json_str(json: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(options) => Ok(Self { options }),
            other => Err(OptionsError::Config(format!(
                "expected a JSON object of options, got {other}"
            ))),
        }
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    pub fn into_options(self) -> Map<String, Value> {
        self.options
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.is_empty());
    }

    #[test]
    fn test_config_from_env() {
        env::set_var(CACHE_MEMORY_LIMIT_ENV, "256M");
        let config = Config::from_env();
        env::remove_var(CACHE_MEMORY_LIMIT_ENV);

        assert_eq!(config.options()["memory_limit"], json!("256M"));
    }

    #[test]
    fn test_config_from_json() {
        let config = Config::from_json_str(r#"{"memory_limit": "1G"}"#).unwrap();
        assert_eq!(config.into_options()["memory_limit"], json!("1G"));
    }

    #[test]
    fn test_config_from_json_rejects_non_object() {
        assert!(matches!(
            Config::from_json_str("[1, 2]"),
            Err(OptionsError::Config(_))
        ));
        assert!(matches!(
            Config::from_json_str("{"),
            Err(OptionsError::Config(_))
        ));
    }
}
