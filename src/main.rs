use runlog::config::database::{self, StoreConfig};
use runlog::config::{jwt::JwtConfig, stats::StatsConfig};
use runlog::migration::Migrator;
use runlog::models::KNOWN_COLLECTIONS;
use runlog::services::bootstrap_admin::{ensure_bootstrap_admin, BootstrapAdminConfig};
use runlog::services::cache::CacheService;
use runlog::services::email::EmailService;
use runlog::store::{Capabilities, MemoryStore, PgDocumentStore, SharedStore};
use runlog::{config, create_app, utils, AppContext};
use sea_orm_migration::MigratorTrait;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    // Validate configuration before doing anything else
    let (jwt_config, store_config) = validate_config()?;
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting runlog admin API v{}...", env!("CARGO_PKG_VERSION"));

    let store = open_store(&store_config).await?;
    let capabilities = Capabilities::register(store.as_ref(), KNOWN_COLLECTIONS).await;
    let missing = capabilities.missing();
    if !missing.is_empty() {
        tracing::warn!("Collections unavailable: {}", missing.join(", "));
    }

    if let Some(cfg) = BootstrapAdminConfig::from_env() {
        ensure_bootstrap_admin(store.as_ref(), &cfg).await?;
    }

    // Redis is optional; without it dashboards are cached per process
    let cache = match config::redis::get_redis().await {
        Ok(Some(conn)) => {
            tracing::info!("Redis connected successfully");
            CacheService::new(conn)
        }
        Ok(None) => {
            tracing::info!("REDIS_URL not set, using in-process cache");
            CacheService::local()
        }
        Err(e) => {
            tracing::warn!("Redis unavailable, using in-process cache: {}", e);
            CacheService::local()
        }
    };

    let email = EmailService::from_env();
    if email.is_configured() {
        tracing::info!("SMTP email service configured");
    } else {
        tracing::warn!("SMTP not configured, verification emails will fail");
    }

    let app = create_app(AppContext {
        store,
        capabilities,
        email,
        cache: Some(cache),
        stats: StatsConfig::from_env(),
    });

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "runlog=debug,tower_http=debug,axum=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match env::var("LOG_FORMAT").as_deref() {
        Ok("json") => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<(JwtConfig, StoreConfig)> {
    let jwt_config = JwtConfig::from_env()?;
    let store_config = StoreConfig::from_env()?;
    Ok((jwt_config, store_config))
}

async fn open_store(cfg: &StoreConfig) -> anyhow::Result<SharedStore> {
    match cfg {
        StoreConfig::Postgres(pg) => {
            let db = database::get_database(pg).await?;
            tracing::info!("Database connected successfully");

            Migrator::up(&db, None).await?;
            tracing::info!("Database migrations applied successfully");

            Ok(Arc::new(PgDocumentStore::new(db)))
        }
        StoreConfig::Memory => {
            tracing::warn!("Using the in-memory store, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
