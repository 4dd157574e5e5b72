//! Configuration for player identity resolution
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_SESSION_HOST: &str = "https://sessionserver.mojang.com";
pub const DEFAULT_SERVICES_HOST: &str = "https://api.minecraftservices.com";

/// Resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Base URL of the profile-by-id API
    pub session_host: String,
    /// Base URL of the profile-by-name API
    pub services_host: String,
    /// User-Agent header for HTTP requests
    pub user_agent: String,
    /// Bound on a single profile API call
    pub http_timeout: Duration,
    /// Bound on a single authoritative lookup round-trip
    pub authority_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            session_host: DEFAULT_SESSION_HOST.to_string(),
            services_host: DEFAULT_SERVICES_HOST.to_string(),
            user_agent: format!("player-identity/{}", env!("CARGO_PKG_VERSION")),
            http_timeout: Duration::from_secs(10),
            authority_timeout: Duration::from_secs(5),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from environment variables (and `.env`, if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let defaults = Self::default();

        let session_host =
            env::var("PLAYER_IDENTITY_SESSION_HOST").unwrap_or(defaults.session_host);
        let services_host =
            env::var("PLAYER_IDENTITY_SERVICES_HOST").unwrap_or(defaults.services_host);
        let user_agent = env::var("PLAYER_IDENTITY_USER_AGENT").unwrap_or(defaults.user_agent);

        let http_timeout = env::var("PLAYER_IDENTITY_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid("Invalid HTTP timeout".to_string()))?;
        let authority_timeout = env::var("PLAYER_IDENTITY_AUTHORITY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid("Invalid authority timeout".to_string()))?;

        let config = Self {
            session_host,
            services_host,
            user_agent,
            http_timeout,
            authority_timeout,
        };
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (label, host) in [
            ("Session host", &self.session_host),
            ("Services host", &self.services_host),
        ] {
            if host.is_empty() {
                return Err(ConfigError::Invalid(format!("{} cannot be empty", label)));
            }
            if !host.starts_with("http://") && !host.starts_with("https://") {
                return Err(ConfigError::Invalid(format!(
                    "{} must be an http(s) URL: {}",
                    label, host
                )));
            }
        }

        if self.http_timeout.is_zero() || self.authority_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "Timeouts must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ResolverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session_host, DEFAULT_SESSION_HOST);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_validate_rejects_bad_hosts() {
        let config = ResolverConfig {
            services_host: "api.minecraftservices.com".to_string(),
            ..ResolverConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ResolverConfig {
            session_host: String::new(),
            ..ResolverConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Invalid("Session host cannot be empty".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = ResolverConfig {
            authority_timeout: Duration::ZERO,
            ..ResolverConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env_reads_overrides() {
        env::set_var("PLAYER_IDENTITY_SESSION_HOST", "http://localhost:8080");
        env::set_var("PLAYER_IDENTITY_HTTP_TIMEOUT_SECS", "3");

        let config = ResolverConfig::from_env().unwrap();
        assert_eq!(config.session_host, "http://localhost:8080");
        assert_eq!(config.http_timeout, Duration::from_secs(3));

        env::set_var("PLAYER_IDENTITY_HTTP_TIMEOUT_SECS", "soon");
        assert!(ResolverConfig::from_env().is_err());

        env::remove_var("PLAYER_IDENTITY_SESSION_HOST");
        env::remove_var("PLAYER_IDENTITY_HTTP_TIMEOUT_SECS");
    }
}
