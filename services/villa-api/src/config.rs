use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{bail, Result};

use crate::db::DbConfig;
use crate::service::ServiceConfig;

/// Which [`VillaStore`](crate::store::VillaStore) backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            other => bail!("unknown VILLA_STORE backend '{other}' (expected 'memory' or 'postgres')"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub log_level: String,
    pub store: StoreBackend,
    pub seed: bool,
    pub run_migrations: bool,
    pub service: ServiceConfig,
    pub database: DbConfig,
}

fn flag(value: Option<String>) -> bool {
    value
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = lookup("VILLA_LISTEN_ADDR")
            .unwrap_or_else(|| "127.0.0.1:8080".to_string())
            .parse()?;

        let log_level = lookup("VILLA_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let store = lookup("VILLA_STORE")
            .map(|v| v.parse::<StoreBackend>())
            .transpose()?
            .unwrap_or(StoreBackend::Memory);

        let seed = flag(lookup("VILLA_SEED"));
        let run_migrations = flag(lookup("VILLA_RUN_MIGRATIONS"));
        let service = ServiceConfig {
            unique_names_on_update: flag(lookup("VILLA_UNIQUE_NAMES_ON_UPDATE")),
        };

        let database = DbConfig::from_lookup(&lookup);

        Ok(Self {
            listen_addr,
            log_level,
            store,
            seed,
            run_migrations,
            service,
            database,
        })
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
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.listen_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.store, StoreBackend::Memory);
        assert!(!config.seed);
        assert!(!config.run_migrations);
        assert!(!config.service.unique_names_on_update);
        assert_eq!(config.database.max_connections, 10);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("VILLA_LISTEN_ADDR", "0.0.0.0:9000"),
            ("VILLA_STORE", "Postgres"),
            ("VILLA_SEED", "1"),
            ("VILLA_UNIQUE_NAMES_ON_UPDATE", "TRUE"),
            ("DATABASE_URL", "postgres://db/villas"),
            ("DB_MAX_CONNECTIONS", "3"),
        ])
        .unwrap();

        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.store, StoreBackend::Postgres);
        assert!(config.seed);
        assert!(config.service.unique_names_on_update);
        assert_eq!(config.database.database_url, "postgres://db/villas");
        assert_eq!(config.database.max_connections, 3);
    }

    #[test]
    fn test_unknown_backend_is_an_error() {
        let err = config(&[("VILLA_STORE", "redis")]).unwrap_err();
        assert!(err.to_string().contains("redis"));
    }

    #[test]
    fn test_bad_listen_addr_is_an_error() {
        assert!(config(&[("VILLA_LISTEN_ADDR", "not-an-addr")]).is_err());
    }
}
