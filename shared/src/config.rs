//! Configuration management for the task calendar Lambda.

use std::env;
use std::str::FromStr;

use crate::{Error, Result};

/// Which persistence backend the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// PostgreSQL through `sqlx`
    Postgres,
    /// Process-local store, for local runs
    Memory,
}

impl FromStr for StoreKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            other => Err(Error::Config(format!(
                "Invalid TASK_STORE '{}'. Must be one of: postgres, memory",
                other
            ))),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Persistence backend
    pub store: StoreKind,
    /// Full connection URL; takes precedence over the host/secret pair
    pub database_url: Option<String>,
    /// Database host
    pub db_host: Option<String>,
    /// Database port
    pub db_port: u16,
    /// Database name
    pub db_name: String,
    /// ARN of the secret containing database credentials
    pub db_secret_arn: Option<String>,
    /// Pool size
    pub db_max_connections: u32,
    /// Apply embedded migrations at startup
    pub run_migrations: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("TASK_STORE") {
            Some(value) => value.parse()?,
            None => StoreKind::Postgres,
        };

        Ok(Self {
            store,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            db_host: lookup("DB_HOST"),
            db_port: parse_or(&lookup, "DB_PORT", 5432)?,
            db_name: lookup("DB_NAME").unwrap_or_else(|| "task_calendar".to_string()),
            db_secret_arn: lookup("DB_SECRET_ARN"),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.store, StoreKind::Postgres);
        assert_eq!(config.db_port, 5432);
        assert_eq!(config.db_name, "task_calendar");
        assert_eq!(config.db_max_connections, 5);
        assert!(config.run_migrations);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("TASK_STORE", "Memory"),
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6543"),
            ("RUN_MIGRATIONS", "false"),
        ]))
        .unwrap();
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.db_host.as_deref(), Some("db.internal"));
        assert_eq!(config.db_port, 6543);
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = Config::from_lookup(lookup_from(&[("DB_PORT", "not-a-port")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_lookup(lookup_from(&[("TASK_STORE", "redis")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_empty_database_url_is_ignored() {
        let config = Config::from_lookup(lookup_from(&[("DATABASE_URL", "")])).unwrap();
        assert!(config.database_url.is_none());
    }
}
