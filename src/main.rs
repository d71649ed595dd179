//! HAY Property server

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hay_property::{
    api::{self, AppState},
    config::Config,
    db,
    storage,
};

/// How often the login rate limiter drops expired entries
const RATE_LIMIT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hay_property=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting HAY Property v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = std::env::var("HAY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.yml"));
    let config = Config::load_with_env(&config_path)?;
    config.validate()?;
    tracing::info!("Configuration loaded from {}", config_path.display());

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    let applied = db::migrations::run_migrations(&pool).await?;
    tracing::info!(applied, "Database ready");

    // Object storage
    let storage = storage::create_storage(&config.storage)
        .await
        .context("Failed to initialize upload storage")?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let bootstrap = config.admin.clone();
    let state = AppState::new(config, pool, storage);

    // First super admin
    if let Some(admin) = state.admin_service.bootstrap(&bootstrap).await? {
        tracing::info!(email = %admin.email, "Created initial super admin");
    }

    // Start rate limiter cleanup task
    {
        let limiter = state.rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RATE_LIMIT_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                limiter.cleanup().await;
            }
        });
    }

    let app = api::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
