use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use snipo_core::gist::DEFAULT_API_URL;
use snipo_core::sync::DEFAULT_TICK;
use snipo_core::util::is_http_url;
use thiserror::Error;

/// Upper bound for the scheduler tick; the shortest sync interval is five minutes
const MAX_SYNC_TICK_SECS: u64 = 299;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Process settings read from the environment (and `.env`)
#[derive(Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub secret_key: Option<String>,
    pub github_api_url: String,
    pub sync_tick: Duration,
}

impl fmt::Debug for CliConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CliConfig")
            .field("db_path", &self.db_path)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("github_api_url", &self.github_api_url)
            .field("sync_tick", &self.sync_tick)
            .finish()
    }
}

impl CliConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_path = optional_trimmed(&lookup, "SNIPO_DB_PATH").map(PathBuf::from);
        let secret_key = optional_trimmed(&lookup, "SNIPO_SECRET_KEY");

        let github_api_url = value_or_default(&lookup, "SNIPO_GITHUB_API_URL", DEFAULT_API_URL);
        if !is_http_url(&github_api_url) {
            return Err(ConfigError::Invalid(
                "SNIPO_GITHUB_API_URL must start with http:// or https://".to_string(),
            ));
        }
        let github_api_url = github_api_url.trim_end_matches('/').to_string();

        let default_tick = DEFAULT_TICK.as_secs().to_string();
        let sync_tick_secs = value_or_default(&lookup, "SNIPO_SYNC_TICK_SECS", &default_tick)
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::Invalid("SNIPO_SYNC_TICK_SECS must be an integer".to_string())
            })?;
        if sync_tick_secs == 0 || sync_tick_secs > MAX_SYNC_TICK_SECS {
            return Err(ConfigError::Invalid(format!(
                "SNIPO_SYNC_TICK_SECS must be between 1 and {MAX_SYNC_TICK_SECS}"
            )));
        }

        Ok(Self {
            db_path,
            secret_key,
            github_api_url,
            sync_tick: Duration::from_secs(sync_tick_secs),
        })
    }

    /// Database location: `--db-path`, then `SNIPO_DB_PATH`, then the user data dir
    pub fn resolve_db_path(&self, cli_db_path: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = cli_db_path.or_else(|| self.db_path.clone()) {
            return Ok(path);
        }
        dirs::data_dir()
            .map(|dir| dir.join("snipo").join("snipo.db"))
            .ok_or_else(|| {
                ConfigError::Invalid(
                    "Could not resolve a data directory; set SNIPO_DB_PATH or pass --db-path"
                        .to_string(),
                )
            })
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
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

    use pretty_assertions::assert_eq;

    use super::*;

    fn config_from(map: &HashMap<&str, &str>) -> Result<CliConfig, ConfigError> {
        CliConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn config_defaults_without_environment() {
        let config = config_from(&HashMap::new()).unwrap();

        assert_eq!(config.db_path, None);
        assert_eq!(config.secret_key, None);
        assert_eq!(config.github_api_url, DEFAULT_API_URL);
        assert_eq!(config.sync_tick, DEFAULT_TICK);
    }

    #[test]
    fn config_reads_and_trims_values() {
        let mut map = HashMap::new();
        map.insert("SNIPO_DB_PATH", " /tmp/snipo/test.db ");
        map.insert("SNIPO_SECRET_KEY", "  secret  ");
        map.insert("SNIPO_GITHUB_API_URL", "http://localhost:9000/");
        map.insert("SNIPO_SYNC_TICK_SECS", "5");

        let config = config_from(&map).unwrap();

        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/snipo/test.db")));
        assert_eq!(config.secret_key.as_deref(), Some("secret"));
        assert_eq!(config.github_api_url, "http://localhost:9000");
        assert_eq!(config.sync_tick, Duration::from_secs(5));
    }

    #[test]
    fn config_rejects_bad_values() {
        let mut map = HashMap::new();
        map.insert("SNIPO_GITHUB_API_URL", "api.github.com");
        let err = config_from(&map).unwrap_err();
        assert!(err.to_string().contains("SNIPO_GITHUB_API_URL"));

        for tick in ["0", "300", "soon"] {
            let mut map = HashMap::new();
            map.insert("SNIPO_SYNC_TICK_SECS", tick);
            let err = config_from(&map).unwrap_err();
            assert!(err.to_string().contains("SNIPO_SYNC_TICK_SECS"), "{tick}");
        }
    }

    #[test]
    fn cli_db_path_overrides_environment() {
        let mut map = HashMap::new();
        map.insert("SNIPO_DB_PATH", "/env/snipo.db");
        let config = config_from(&map).unwrap();

        assert_eq!(
            config.resolve_db_path(Some(PathBuf::from("/cli/snipo.db"))).unwrap(),
            PathBuf::from("/cli/snipo.db")
        );
        assert_eq!(
            config.resolve_db_path(None).unwrap(),
            PathBuf::from("/env/snipo.db")
        );
    }

    #[test]
    fn config_redacts_secret_key() {
        let mut map = HashMap::new();
        map.insert("SNIPO_SECRET_KEY", "sensitive-secret-key");
        let config = config_from(&map).unwrap();

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("sensitive-secret-key"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
