mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use tasklink_api::storage::Storage;
use tasklink_api::{AppState, AppStateInner};
use tasklink_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tasklink=debug,tasklink_api=debug,tasklink_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init storage and database; either failing is fatal
    let storage = Storage::new(config.upload_dir.clone()).await?;
    let db = Database::open(&config.db_path)?;

    let state: AppState = Arc::new(AppStateInner { db, storage });

    match config.max_upload_bytes {
        Some(limit) => info!("Upload limit: {} bytes", limit),
        None => info!("Upload limit: none"),
    }

    let app = tasklink_api::router(state, config.max_upload_bytes)
        .fallback_service(ServeDir::new(&config.public_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Tasklink listening on http://{}", addr);
    info!("Serving static files from {}", config.public_dir.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
