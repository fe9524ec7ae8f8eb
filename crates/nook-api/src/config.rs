use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

const MIN_JWT_SECRET_LEN: usize = 16;
const DEFAULT_MAX_BODY_BYTES: &str = "8388608";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub auth_clock_skew: Duration,
    pub max_body_bytes: usize,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("db_path", &self.db_path)
            .field("jwt_secret", &"[REDACTED]")
            .field("auth_clock_skew", &self.auth_clock_skew)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "NOOK_API_BIND_ADDR", "127.0.0.1:3001");
        let db_path = PathBuf::from(value_or_default(
            &lookup,
            "NOOK_API_DB_PATH",
            "nook-server.db",
        ));

        let jwt_secret = required_trimmed(&lookup, "NOOK_JWT_SECRET")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "NOOK_JWT_SECRET must be at least {MIN_JWT_SECRET_LEN} characters"
            )));
        }

        let auth_clock_skew_secs = value_or_default(&lookup, "NOOK_AUTH_CLOCK_SKEW_SECS", "60")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::Invalid(
                    "NOOK_AUTH_CLOCK_SKEW_SECS must be an integer in [0, 300]".to_string(),
                )
            })?;
        if auth_clock_skew_secs > 300 {
            return Err(ConfigError::Invalid(
                "NOOK_AUTH_CLOCK_SKEW_SECS must be in [0, 300]".to_string(),
            ));
        }

        let max_body_bytes =
            value_or_default(&lookup, "NOOK_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)
                .parse::<usize>()
                .map_err(|_| {
                    ConfigError::Invalid("NOOK_MAX_BODY_BYTES must be a positive integer".to_string())
                })?;
        if max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "NOOK_MAX_BODY_BYTES must be a positive integer".to_string(),
            ));
        }

        Ok(Self {
            bind_addr,
            db_path,
            jwt_secret,
            auth_clock_skew: Duration::from_secs(auth_clock_skew_secs),
            max_body_bytes,
        })
    }

    #[cfg(test)]
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            db_path: PathBuf::from(":memory:"),
            jwt_secret: jwt_secret.to_string(),
            auth_clock_skew: Duration::from_secs(0),
            max_body_bytes: 1024 * 1024,
        }
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn required_trimmed(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional_trimmed(lookup, name).ok_or(ConfigError::MissingVar(name))
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(map: &HashMap<&str, &str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn config_requires_jwt_secret() {
        let err = config_from(&HashMap::new()).unwrap_err();
        assert!(err.to_string().contains("NOOK_JWT_SECRET"));
    }

    #[test]
    fn config_rejects_short_secret_and_large_skew() {
        let mut map = HashMap::new();
        map.insert("NOOK_JWT_SECRET", "short");
        assert!(config_from(&map).is_err());

        map.insert("NOOK_JWT_SECRET", "a-long-enough-shared-secret");
        map.insert("NOOK_AUTH_CLOCK_SKEW_SECS", "301");
        assert!(config_from(&map).is_err());
    }

    #[test]
    fn config_applies_defaults() {
        let mut map = HashMap::new();
        map.insert("NOOK_JWT_SECRET", "a-long-enough-shared-secret");

        let config = config_from(&map).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:3001");
        assert_eq!(config.db_path, PathBuf::from("nook-server.db"));
        assert_eq!(config.auth_clock_skew, Duration::from_secs(60));
        assert_eq!(config.max_body_bytes, 8 * 1024 * 1024);
    }

    #[test]
    fn config_redacts_sensitive_debug_fields() {
        let mut map = HashMap::new();
        map.insert("NOOK_JWT_SECRET", "sensitive-shared-secret");

        let debug_output = format!("{:?}", config_from(&map).unwrap());
        assert!(!debug_output.contains("sensitive-shared-secret"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
