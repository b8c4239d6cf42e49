use std::sync::Arc;

use dispatch_desk::api;
use dispatch_desk::auth::memory::InMemoryAuth;
use dispatch_desk::backend::memory::InMemoryStore;
use dispatch_desk::backend::seed::Seed;
use dispatch_desk::config::Config;
use dispatch_desk::error::AppError;
use dispatch_desk::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let store = Arc::new(InMemoryStore::new());
    let auth = Arc::new(InMemoryAuth::new(config.password_hash_cost));

    if let Some(path) = &config.seed_path {
        Seed::load(path).await?.apply(&*store, &auth).await?;
    }

    let app_state = AppState::new(store, auth, config.notice_buffer_size);
    let app = api::rest::router(Arc::new(app_state));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
