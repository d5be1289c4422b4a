use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;

pub async fn connect(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database.connection_string())
        .await
        .with_context(|| {
            format!(
                "failed to connect to PostgreSQL at {}:{}",
                config.database.host, config.database.port
            )
        })?;

    tracing::info!(
        "PostgreSQL connected: {}:{}/{}",
        config.database.host,
        config.database.port,
        config.database.database
    );
    Ok(pool)
}
