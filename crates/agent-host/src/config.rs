//! Agent Host configuration.
//!
//! Configuration is loaded from environment variables. The authority domain
//! and expected audience are externally supplied; the JWKS discovery URL and
//! token issuer are derived from the domain.

use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default JWKS fetch timeout in seconds.
pub const DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// Maximum allowed JWKS fetch timeout in seconds.
pub const MAX_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 60;

/// Default agent instance ID prefix.
pub const DEFAULT_AGENT_ID_PREFIX: &str = "agent";

/// Agent Host configuration.
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Authority domain publishing the signing keys (e.g. "auth.example.com").
    pub auth_domain: String,

    /// Expected `aud` claim of incoming tokens.
    pub audience: String,

    /// JWKS discovery URL. Defaults to the well-known location under
    /// `auth_domain`; overridable for tests and non-standard deployments.
    pub jwks_url: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Timeout for a single JWKS fetch, in seconds.
    pub jwks_fetch_timeout_seconds: u64,

    /// Unique identifier for this agent instance, used in logs.
    pub agent_id: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid authority domain: {0}")]
    InvalidAuthDomain(String),

    #[error("Invalid JWKS fetch timeout configuration: {0}")]
    InvalidJwksFetchTimeout(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// fails validation.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let auth_domain = vars
            .get("AUTH_DOMAIN")
            .ok_or_else(|| ConfigError::MissingEnvVar("AUTH_DOMAIN".to_string()))?
            .clone();

        if auth_domain.is_empty() {
            return Err(ConfigError::InvalidAuthDomain(
                "AUTH_DOMAIN must not be empty".to_string(),
            ));
        }

        // The issuer is derived as https://{domain}/, so the domain itself
        // must not carry a scheme or trailing slash.
        if auth_domain.contains("://") || auth_domain.ends_with('/') {
            return Err(ConfigError::InvalidAuthDomain(format!(
                "AUTH_DOMAIN must be a bare domain, got '{auth_domain}'"
            )));
        }

        let audience = vars
            .get("AUTH_AUDIENCE")
            .ok_or_else(|| ConfigError::MissingEnvVar("AUTH_AUDIENCE".to_string()))?
            .clone();

        let jwks_url = vars
            .get("AUTH_JWKS_URL")
            .cloned()
            .unwrap_or_else(|| format!("https://{auth_domain}/.well-known/jwks.json"));

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        // Parse JWKS fetch timeout with validation
        let jwks_fetch_timeout_seconds =
            if let Some(value_str) = vars.get("JWKS_FETCH_TIMEOUT_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidJwksFetchTimeout(format!(
                        "JWKS_FETCH_TIMEOUT_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidJwksFetchTimeout(
                        "JWKS_FETCH_TIMEOUT_SECONDS must be greater than 0".to_string(),
                    ));
                }

                if value > MAX_JWKS_FETCH_TIMEOUT_SECONDS {
                    return Err(ConfigError::InvalidJwksFetchTimeout(format!(
                        "JWKS_FETCH_TIMEOUT_SECONDS must not exceed {MAX_JWKS_FETCH_TIMEOUT_SECONDS} seconds, got {value}"
                    )));
                }

                value
            } else {
                DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS
            };

        // Generate agent instance ID when not supplied
        let agent_id = vars.get("AGENT_ID").cloned().unwrap_or_else(|| {
            let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_AGENT_ID_PREFIX}-{hostname}-{short_suffix}")
        });

        Ok(Config {
            auth_domain,
            audience,
            jwks_url,
            bind_address,
            jwks_fetch_timeout_seconds,
            agent_id,
        })
    }

    /// Expected `iss` claim: always `https://{auth_domain}/`.
    #[must_use]
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.auth_domain)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            ("AUTH_DOMAIN".to_string(), "auth.example.com".to_string()),
            ("AUTH_AUDIENCE".to_string(), "agent-api".to_string()),
        ])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let vars = base_vars();

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.auth_domain, "auth.example.com");
        assert_eq!(config.audience, "agent-api");
        assert_eq!(
            config.jwks_url,
            "https://auth.example.com/.well-known/jwks.json"
        );
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(
            config.jwks_fetch_timeout_seconds,
            DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS
        );
        assert!(config.agent_id.starts_with("agent-"));
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let mut vars = base_vars();
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string());
        vars.insert(
            "AUTH_JWKS_URL".to_string(),
            "http://127.0.0.1:4444/.well-known/jwks.json".to_string(),
        );
        vars.insert("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "5".to_string());
        vars.insert("AGENT_ID".to_string(), "agent-custom-001".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(
            config.jwks_url,
            "http://127.0.0.1:4444/.well-known/jwks.json"
        );
        assert_eq!(config.jwks_fetch_timeout_seconds, 5);
        assert_eq!(config.agent_id, "agent-custom-001");
    }

    #[test]
    fn test_issuer_derived_from_domain() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");
        assert_eq!(config.issuer(), "https://auth.example.com/");
    }

    #[test]
    fn test_from_vars_missing_auth_domain() {
        let vars = HashMap::from([("AUTH_AUDIENCE".to_string(), "agent-api".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "AUTH_DOMAIN"));
    }

    #[test]
    fn test_from_vars_missing_audience() {
        let vars = HashMap::from([("AUTH_DOMAIN".to_string(), "auth.example.com".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "AUTH_AUDIENCE"));
    }

    #[test]
    fn test_auth_domain_rejects_empty() {
        let mut vars = base_vars();
        vars.insert("AUTH_DOMAIN".to_string(), String::new());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidAuthDomain(msg)) if msg.contains("must not be empty"))
        );
    }

    #[test]
    fn test_auth_domain_rejects_scheme() {
        let mut vars = base_vars();
        vars.insert(
            "AUTH_DOMAIN".to_string(),
            "https://auth.example.com".to_string(),
        );

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidAuthDomain(msg)) if msg.contains("bare domain"))
        );
    }

    #[test]
    fn test_auth_domain_rejects_trailing_slash() {
        let mut vars = base_vars();
        vars.insert("AUTH_DOMAIN".to_string(), "auth.example.com/".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidAuthDomain(_))));
    }

    #[test]
    fn test_jwks_fetch_timeout_rejects_zero() {
        let mut vars = base_vars();
        vars.insert("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwksFetchTimeout(msg)) if msg.contains("greater than 0"))
        );
    }

    #[test]
    fn test_jwks_fetch_timeout_rejects_too_large() {
        let mut vars = base_vars();
        vars.insert("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "61".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwksFetchTimeout(msg)) if msg.contains("must not exceed 60"))
        );
    }

    #[test]
    fn test_jwks_fetch_timeout_accepts_max() {
        let mut vars = base_vars();
        vars.insert("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "60".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");
        assert_eq!(config.jwks_fetch_timeout_seconds, 60);
    }

    #[test]
    fn test_jwks_fetch_timeout_rejects_non_numeric() {
        let mut vars = base_vars();
        vars.insert(
            "JWKS_FETCH_TIMEOUT_SECONDS".to_string(),
            "ten-seconds".to_string(),
        );

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwksFetchTimeout(msg)) if msg.contains("valid positive integer"))
        );
    }
}
