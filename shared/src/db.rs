//! Database connection management.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

use crate::secrets::{database_credentials, DatabaseCredentials};
use crate::{Config, Error, Result};

/// Build the Postgres URL, preferring the host and database named in the secret.
fn database_url(config: &Config, creds: &DatabaseCredentials) -> String {
    format!(
        "postgres://{}:{}@{}:{}/{}",
        creds.username,
        creds.password,
        creds.host.as_deref().unwrap_or(&config.db_host),
        creds.port.unwrap_or(5432),
        creds.dbname.as_deref().unwrap_or(&config.db_name)
    )
}

/// AWS SDK config pinned to the configured region.
async fn sdk_config(config: &Config) -> aws_config::SdkConfig {
    aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.aws_region.clone()))
        .load()
        .await
}

/// Create a database connection pool from the credentials secret.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    let aws = sdk_config(config).await;
    let secrets_client = aws_sdk_secretsmanager::Client::new(&aws);
    let creds = database_credentials(&secrets_client, &config.db_secret_arn).await?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&database_url(config, &creds))
        .await
        .map_err(Error::Database)?;

    info!(db_name = %config.db_name, "Connected to database");
    Ok(pool)
}
