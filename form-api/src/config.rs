//! Environment configuration for form-api

use std::env;
use thiserror::Error;

const DEFAULT_PORT: u16 = 4001;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("API_SECRET must not be empty")]
    EmptySecret,

    #[error("API_PORT must be a valid port number (got {0:?})")]
    InvalidPort(String),

    #[error("SEED_FORMS must be true or false (got {0:?})")]
    InvalidFlag(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Shared secret expected in the `API-Secret` header of management routes
    pub api_secret: String,
    /// Load the embedded example forms at start-up
    pub seed_forms: bool,
}

impl Config {
    /// Read configuration from the process environment (call after `dotenvy`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("API_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let api_secret = lookup("API_SECRET").ok_or(ConfigError::Missing("API_SECRET"))?;
        if api_secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }

        let seed_forms = match lookup("SEED_FORMS").as_deref() {
            None => true,
            Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            Some(other) => return Err(ConfigError::InvalidFlag(other.to_string())),
        };

        Ok(Self {
            port,
            api_secret,
            seed_forms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[("API_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.port, 4001);
        assert!(config.seed_forms);
    }

    #[test]
    fn secret_is_required() {
        assert!(matches!(config(&[]), Err(ConfigError::Missing("API_SECRET"))));
        assert!(matches!(
            config(&[("API_SECRET", "")]),
            Err(ConfigError::EmptySecret)
        ));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("API_SECRET", "x"), ("API_PORT", "http")]),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            config(&[("API_SECRET", "x"), ("SEED_FORMS", "maybe")]),
            Err(ConfigError::InvalidFlag(_))
        ));
        let config = config(&[("API_SECRET", "x"), ("API_PORT", "8080"), ("SEED_FORMS", "false")]).unwrap();
        assert_eq!(config.port, 8080);
        assert!(!config.seed_forms);
    }
}
