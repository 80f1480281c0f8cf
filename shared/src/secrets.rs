//! Database credentials from AWS Secrets Manager.

use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;
use tracing::info;

use crate::{Error, Result};

/// Secret strings cached for the lifetime of the Lambda container.
static SECRETS_CACHE: OnceLock<RwLock<HashMap<String, String>>> = OnceLock::new();

fn get_cache() -> &'static RwLock<HashMap<String, String>> {
    SECRETS_CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Database credentials stored as a JSON secret.
#[derive(Debug, Deserialize)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
}

impl DatabaseCredentials {
    /// Parse the JSON secret payload.
    pub fn parse(secret: &str) -> Result<Self> {
        serde_json::from_str(secret)
            .map_err(|e| Error::Aws(format!("Failed to parse database credentials: {}", e)))
    }
}

/// Get a secret value from Secrets Manager with caching.
pub async fn get_secret(client: &SecretsClient, secret_arn: &str) -> Result<String> {
    {
        let cache = get_cache().read().await;
        if let Some(value) = cache.get(secret_arn) {
            return Ok(value.clone());
        }
    }

    info!("Fetching secret {}", secret_arn);
    let response = client
        .get_secret_value()
        .secret_id(secret_arn)
        .send()
        .await
        .map_err(|e| Error::Aws(format!("Failed to get secret: {}", e)))?;

    let secret_string = response
        .secret_string()
        .ok_or_else(|| Error::Aws("Secret has no string value".to_string()))?
        .to_string();

    {
        let mut cache = get_cache().write().await;
        cache.insert(secret_arn.to_string(), secret_string.clone());
    }

    Ok(secret_string)
}

/// Load AWS configuration and fetch the database credentials.
pub async fn get_database_credentials(secret_arn: &str) -> Result<DatabaseCredentials> {
    let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = SecretsClient::new(&config);
    let secret_string = get_secret(&client, secret_arn).await?;

    DatabaseCredentials::parse(&secret_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_credentials() {
        let json = r#"{"username":"calendar","password":"secret123","host":"db.example.com","port":5432,"dbname":"task_calendar"}"#;
        let creds = DatabaseCredentials::parse(json).unwrap();
        assert_eq!(creds.username, "calendar");
        assert_eq!(creds.password, "secret123");
        assert_eq!(creds.host, Some("db.example.com".to_string()));
        assert_eq!(creds.port, Some(5432));
    }

    #[test]
    fn test_parse_credentials_rejects_missing_password() {
        let err = DatabaseCredentials::parse(r#"{"username":"calendar"}"#).unwrap_err();
        assert!(matches!(err, Error::Aws(_)));
    }
}
