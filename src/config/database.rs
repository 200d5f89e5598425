use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Postgres(PostgresConfig),
    /// Volatile in-process store for local development.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        let backend = env::var("STORE_BACKEND").unwrap_or_else(|_| "postgres".to_string());
        match backend.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => {
                let database_url = env::var("DATABASE_URL").map_err(|_| {
                    anyhow::anyhow!("DATABASE_URL environment variable must be set")
                })?;

                let max_connections: u32 = env::var("DB_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10);

                let min_connections: u32 = env::var("DB_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2);

                Ok(Self::Postgres(PostgresConfig {
                    database_url,
                    max_connections,
                    min_connections,
                }))
            }
            other => Err(anyhow::anyhow!(
                "Unknown STORE_BACKEND '{}', expected postgres or memory",
                other
            )),
        }
    }
}

pub async fn get_database(cfg: &PostgresConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(cfg.database_url.clone());
    opt.max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .connect_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true);

    Database::connect(opt).await
}
