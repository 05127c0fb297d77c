use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use agora_api::{SchemaConfig, Timeouts};

/// Value of `AGORA_DB_PATH` that selects a throwaway in-memory store.
const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// `None` for an in-memory store.
    pub db_path: Option<PathBuf>,
    pub timeouts: Timeouts,
    pub playground: bool,
    pub schema: SchemaConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = var("AGORA_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or(&var, "AGORA_PORT", 8080)?;
        let db_path = match var("AGORA_DB_PATH") {
            Some(path) if path == IN_MEMORY => None,
            Some(path) => Some(PathBuf::from(path)),
            None => Some(PathBuf::from("agora.db")),
        };

        let defaults = Timeouts::default();
        let timeouts = Timeouts {
            lookup: Duration::from_secs(parse_or(&var, "AGORA_LOOKUP_TIMEOUT_SECS", defaults.lookup.as_secs())?),
            list: Duration::from_secs(parse_or(&var, "AGORA_LIST_TIMEOUT_SECS", defaults.list.as_secs())?),
        };

        let playground = parse_or(&var, "AGORA_PLAYGROUND", true)?;
        let max_query_depth = parse_or(&var, "AGORA_MAX_QUERY_DEPTH", 15usize)?;

        Ok(Self {
            host,
            port,
            db_path,
            timeouts,
            playground,
            schema: SchemaConfig {
                max_query_depth: Some(max_query_depth),
                ..SchemaConfig::default()
            },
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw.parse().with_context(|| format!("invalid {key}: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.db_path, Some(PathBuf::from("agora.db")));
        assert_eq!(cfg.timeouts.lookup, Duration::from_secs(5));
        assert_eq!(cfg.timeouts.list, Duration::from_secs(30));
        assert!(cfg.playground);
        assert_eq!(cfg.schema.max_query_depth, Some(15));
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = config(&[
            ("AGORA_PORT", "9000"),
            ("AGORA_DB_PATH", ":memory:"),
            ("AGORA_LIST_TIMEOUT_SECS", "2"),
            ("AGORA_PLAYGROUND", "false"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert!(cfg.db_path.is_none());
        assert_eq!(cfg.timeouts.list, Duration::from_secs(2));
        assert!(!cfg.playground);
    }

    #[test]
    fn bad_numbers_are_startup_errors() {
        let err = config(&[("AGORA_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("AGORA_PORT"));
    }
}
