use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60 * 24;
const DEFAULT_WORKSPACE_IDLE_SECS: u64 = 60 * 30;

/// Connection parameters for the document store and the identity service.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub database_url: String,
    pub redis_url: String,
    pub session_ttl: Duration,
}

/// Application configuration loaded from environment variables.
///
/// Missing backend variables are not an error here: the service still starts,
/// logs the problem and keeps every workspace in the loading state.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Option<BackendConfig>,
    /// Names of backend variables that were not set. Empty when `backend` is `Some`.
    pub missing_backend_vars: Vec<&'static str>,
    pub youtube_api_key: Option<String>,
    /// Workspaces with no request and no open event stream for this long are dropped.
    pub workspace_idle: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = non_empty("DATABASE_URL");
        let redis_url = non_empty("REDIS_URL");
        let session_ttl = match non_empty("SESSION_TTL_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("SESSION_TTL_SECS must be a whole number of seconds")?,
            None => DEFAULT_SESSION_TTL_SECS,
        };

        let workspace_idle = match non_empty("WORKSPACE_IDLE_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("WORKSPACE_IDLE_SECS must be a whole number of seconds")?,
            None => DEFAULT_WORKSPACE_IDLE_SECS,
        };

        let mut missing_backend_vars = Vec::new();
        if database_url.is_none() {
            missing_backend_vars.push("DATABASE_URL");
        }
        if redis_url.is_none() {
            missing_backend_vars.push("REDIS_URL");
        }

        let backend = match (database_url, redis_url) {
            (Some(database_url), Some(redis_url)) => Some(BackendConfig {
                database_url,
                redis_url,
                session_ttl: Duration::from_secs(session_ttl),
            }),
            _ => None,
        };

        Ok(Config {
            backend,
            missing_backend_vars,
            youtube_api_key: non_empty("YOUTUBE_API_KEY"),
            workspace_idle: Duration::from_secs(workspace_idle),
            port: non_empty("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: non_empty("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_full_backend_config() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/recipes"),
            ("REDIS_URL", "redis://localhost"),
            ("YOUTUBE_API_KEY", "abc"),
            ("PORT", "9000"),
        ])
        .unwrap();

        let backend = config.backend.unwrap();
        assert_eq!(backend.database_url, "postgres://localhost/recipes");
        assert_eq!(backend.session_ttl, Duration::from_secs(DEFAULT_SESSION_TTL_SECS));
        assert_eq!(config.youtube_api_key.as_deref(), Some("abc"));
        assert_eq!(config.port, 9000);
        assert!(config.missing_backend_vars.is_empty());
    }

    #[test]
    fn test_missing_backend_is_not_an_error() {
        let config = config_from(&[("REDIS_URL", "redis://localhost")]).unwrap();
        assert!(config.backend.is_none());
        assert_eq!(config.missing_backend_vars, vec!["DATABASE_URL"]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.workspace_idle, Duration::from_secs(DEFAULT_WORKSPACE_IDLE_SECS));
    }

    #[test]
    fn test_workspace_idle_override() {
        let config = config_from(&[("WORKSPACE_IDLE_SECS", "90")]).unwrap();
        assert_eq!(config.workspace_idle, Duration::from_secs(90));
        assert!(config_from(&[("WORKSPACE_IDLE_SECS", "soon")]).is_err());
    }

    #[test]
    fn test_blank_metadata_key_counts_as_missing() {
        let config = config_from(&[("YOUTUBE_API_KEY", "  ")]).unwrap();
        assert!(config.youtube_api_key.is_none());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(config_from(&[("PORT", "eighty")]).is_err());
    }
}
