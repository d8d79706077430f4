use std::sync::Arc;

use fundbridge::auth::StaticTokenVerifier;
use fundbridge::config::ServerConfig;
use fundbridge::server::{AppState, app_router};
use fundbridge::store::{Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;

    eprintln!("Fundbridge v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/api/onboarding", config.port);
    eprintln!("   Database: {}", config.db_path);

    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(std::path::Path::new(&config.db_path))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open database at {}: {e}", config.db_path))?,
    );

    let verifier = Arc::new(StaticTokenVerifier::from_config(&config.api_tokens));

    let state = AppState { db, verifier };
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Server started");
    axum::serve(listener, app).await?;

    Ok(())
}
