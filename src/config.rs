//! Environment-sourced configuration, loaded once at startup.

use crate::ai::gemini::client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::{Error, Result};
use std::time::Duration;

/// Highest numbered `GEMINI_API_KEY_NN` variable consulted.
pub const MAX_NUMBERED_KEYS: usize = 24;

const DEFAULT_PORT: u16 = 5002;
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Which origins may call the API from a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

impl AllowedOrigins {
    fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            AllowedOrigins::Any
        } else {
            AllowedOrigins::List(origins)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_keys: Vec<String>,
    pub allowed_origins: AllowedOrigins,
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub model: String,
    pub base_url: String,
    pub upstream_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Config {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut api_keys = Vec::new();
        for i in 1..=MAX_NUMBERED_KEYS {
            let name = format!("GEMINI_API_KEY_{:02}", i);
            match lookup(&name).filter(|v| !v.trim().is_empty()) {
                Some(key) => api_keys.push(key.trim().to_string()),
                None => tracing::debug!("{} not set", name),
            }
        }

        if let Some(keys) = lookup("GEMINI_API_KEYS") {
            api_keys.extend(
                keys.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
            );
        }

        let mut seen = std::collections::HashSet::new();
        api_keys.retain(|key| seen.insert(key.clone()));

        let config = Self {
            api_keys,
            allowed_origins: AllowedOrigins::parse(
                &lookup("ALLOWED_ORIGINS").unwrap_or_else(|| "*".to_string()),
            ),
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            debug: lookup("DEBUG")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: lookup("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            upstream_timeout: Duration::from_secs(parse_or(
                &lookup,
                "UPSTREAM_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_keys.is_empty() {
            return Err(Error::Config(
                "No Gemini API keys found; add at least GEMINI_API_KEY_01 to the environment"
                    .to_string(),
            ));
        }
        if self.upstream_timeout.is_zero() {
            return Err(Error::Config(
                "UPSTREAM_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {} '{}': {}", name, raw, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("GEMINI_API_KEY_01", "key-1")]).unwrap();

        assert_eq!(config.api_keys, vec!["key-1"]);
        assert_eq!(config.allowed_origins, AllowedOrigins::Any);
        assert_eq!(config.port, 5002);
        assert!(!config.debug);
        assert_eq!(config.model, "gemini-2.0-flash-exp");
        assert_eq!(config.upstream_timeout, Duration::from_secs(120));
        assert_eq!(config.bind_addr(), "0.0.0.0:5002");
    }

    #[test]
    fn test_no_keys_is_fatal() {
        let err = config_from(&[("PORT", "8080")]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_numbered_keys_skip_gaps_and_merge_list() {
        let config = config_from(&[
            ("GEMINI_API_KEY_01", "a"),
            ("GEMINI_API_KEY_03", "c"),
            ("GEMINI_API_KEY_24", "x"),
            ("GEMINI_API_KEY_25", "ignored"),
            ("GEMINI_API_KEYS", "c, d ,,e"),
        ])
        .unwrap();

        assert_eq!(config.api_keys, vec!["a", "c", "x", "d", "e"]);
    }

    #[test]
    fn test_allowed_origins_list() {
        let config = config_from(&[
            ("GEMINI_API_KEY_01", "a"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example"),
        ])
        .unwrap();

        assert_eq!(
            config.allowed_origins,
            AllowedOrigins::List(vec![
                "https://a.example".to_string(),
                "https://b.example".to_string()
            ])
        );
    }

    #[test]
    fn test_debug_toggle_is_case_insensitive() {
        let config = config_from(&[("GEMINI_API_KEY_01", "a"), ("DEBUG", "True")]).unwrap();
        assert!(config.debug);

        let config = config_from(&[("GEMINI_API_KEY_01", "a"), ("DEBUG", "yes")]).unwrap();
        assert!(!config.debug);
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let err = config_from(&[("GEMINI_API_KEY_01", "a"), ("PORT", "http")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = config_from(&[("GEMINI_API_KEY_01", "a"), ("UPSTREAM_TIMEOUT_SECS", "0")])
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
