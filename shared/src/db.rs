//! Database connection management.

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

use crate::secrets::{get_database_credentials, DatabaseCredentials};
use crate::{Config, Error, Result};

/// Build connection options from the config and, when needed, stored credentials.
///
/// Credentials are set field by field so passwords never pass through URL parsing.
pub fn connect_options(
    config: &Config,
    credentials: Option<&DatabaseCredentials>,
) -> Result<PgConnectOptions> {
    if let Some(url) = &config.database_url {
        return url
            .parse()
            .map_err(|e| Error::Config(format!("Invalid DATABASE_URL: {}", e)));
    }

    let creds = credentials.ok_or_else(|| {
        Error::Config("Either DATABASE_URL or DB_SECRET_ARN must be set".to_string())
    })?;

    let host = creds
        .host
        .as_deref()
        .or(config.db_host.as_deref())
        .ok_or_else(|| Error::Config("DB_HOST not set".to_string()))?;
    let port = creds.port.unwrap_or(config.db_port);
    let name = creds.dbname.as_deref().unwrap_or(&config.db_name);

    Ok(PgConnectOptions::new()
        .host(host)
        .port(port)
        .username(&creds.username)
        .password(&creds.password)
        .database(name))
}

/// Create a database connection pool, running migrations if configured.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    let credentials = match (&config.database_url, &config.db_secret_arn) {
        (None, Some(arn)) => Some(get_database_credentials(arn).await?),
        _ => None,
    };
    let options = connect_options(config, credentials.as_ref())?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await
        .map_err(Error::Database)?;

    if config.run_migrations {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_lookup(|key| match key {
            "DB_HOST" => Some("db.internal".to_string()),
            _ => None,
        })
        .unwrap()
    }

    fn creds(host: Option<&str>) -> DatabaseCredentials {
        DatabaseCredentials {
            username: "calendar".to_string(),
            password: "pw".to_string(),
            host: host.map(String::from),
            port: None,
            dbname: None,
        }
    }

    #[test]
    fn test_explicit_url_wins() {
        let mut config = config();
        config.database_url = Some("postgres://app@localhost:6000/tasks".to_string());
        let options = connect_options(&config, Some(&creds(None))).unwrap();
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 6000);
        assert_eq!(options.get_database(), Some("tasks"));
    }

    #[test]
    fn test_invalid_url_is_a_config_error() {
        let mut config = config();
        config.database_url = Some("postgres://app@localhost:port/tasks".to_string());
        let err = connect_options(&config, None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_options_from_credentials() {
        let options = connect_options(&config(), Some(&creds(None))).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_username(), "calendar");
        assert_eq!(options.get_database(), Some("task_calendar"));

        let options = connect_options(&config(), Some(&creds(Some("db.secret")))).unwrap();
        assert_eq!(options.get_host(), "db.secret");
    }

    #[test]
    fn test_password_with_url_delimiters() {
        let mut creds = creds(None);
        creds.password = "p#ss:w?rd%/@".to_string();
        let options = connect_options(&config(), Some(&creds)).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_username(), "calendar");
        assert_eq!(options.get_database(), Some("task_calendar"));
    }

    #[test]
    fn test_missing_credentials() {
        let err = connect_options(&config(), None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
