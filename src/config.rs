//! Environment-driven configuration

use crate::error::AgentError;
use crate::Result;
use std::env;
use std::path::PathBuf;
use tracing::warn;

pub const PLACEHOLDER_API_KEY: &str = "your-api-key-here";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_ADVICE_MAX_TOKENS: u32 = 500;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub api_key: String,
    pub model: String,
    pub catalog_path: Option<PathBuf>,
    pub advice_max_tokens: u32,
    pub http_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: PLACEHOLDER_API_KEY.to_string(),
            model: DEFAULT_MODEL.to_string(),
            catalog_path: None,
            advice_max_tokens: DEFAULT_ADVICE_MAX_TOKENS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl AgentConfig {
    /// Reads the process environment (after `.env`, if the caller loaded it).
    ///
    /// A missing API key is tolerated: the placeholder is used and every
    /// capability call will fail over to its fallback value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_key = lookup("GEMINI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .unwrap_or(defaults.api_key);

        let model = lookup("GEMINI_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(defaults.model);

        let catalog_path = lookup("FAQ_CATALOG_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let advice_max_tokens = match lookup("ADVICE_MAX_TOKENS") {
            Some(raw) => parse_positive("ADVICE_MAX_TOKENS", &raw)?,
            None => defaults.advice_max_tokens,
        };

        let http_timeout_secs = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) => parse_positive("HTTP_TIMEOUT_SECS", &raw)?,
            None => defaults.http_timeout_secs,
        };

        let config = Self {
            api_key,
            model,
            catalog_path,
            advice_max_tokens,
            http_timeout_secs,
        };
        if config.has_placeholder_key() {
            warn!("GEMINI_API_KEY not set, using placeholder key");
        }

        Ok(config)
    }

    pub fn has_placeholder_key(&self) -> bool {
        self.api_key == PLACEHOLDER_API_KEY
    }
}

/// Zero is rejected along with anything unparsable
fn parse_positive<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr + PartialEq + Default,
{
    match raw.trim().parse::<T>() {
        Ok(n) if n != T::default() => Ok(n),
        _ => Err(AgentError::ConfigError(format!(
            "{} must be a positive integer, got {:?}",
            name, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_missing_api_key_uses_placeholder() {
        let config = AgentConfig::from_lookup(lookup_from(&[])).unwrap();
        assert!(config.has_placeholder_key());
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.advice_max_tokens, 500);
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_reads_overrides() {
        let config = AgentConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-1.5-pro"),
            ("FAQ_CATALOG_PATH", "/etc/faq.json"),
            ("ADVICE_MAX_TOKENS", "250"),
        ]))
        .unwrap();

        assert!(!config.has_placeholder_key());
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.catalog_path, Some(PathBuf::from("/etc/faq.json")));
        assert_eq!(config.advice_max_tokens, 250);
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = AgentConfig::from_lookup(lookup_from(&[("ADVICE_MAX_TOKENS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, AgentError::ConfigError(_)));
    }

    #[test]
    fn test_zero_is_config_error() {
        for name in ["ADVICE_MAX_TOKENS", "HTTP_TIMEOUT_SECS"] {
            let err = AgentConfig::from_lookup(lookup_from(&[(name, "0")])).unwrap_err();
            match err {
                AgentError::ConfigError(msg) => assert!(msg.starts_with(name), "{}", msg),
                other => panic!("expected config error, got {:?}", other),
            }
        }

        let config = AgentConfig::from_lookup(lookup_from(&[("HTTP_TIMEOUT_SECS", " 5 ")])).unwrap();
        assert_eq!(config.http_timeout_secs, 5);
    }
}
