pub mod error;
pub mod files;
pub mod storage;
pub mod tasks;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use tasklink_db::Database;

use crate::storage::Storage;

pub type AppState = Arc<AppStateInner>;

/// Everything a handler needs: the metadata store and the upload directory.
/// Built once in `main` and handed to the router.
pub struct AppStateInner {
    pub db: Database,
    pub storage: Storage,
}

/// API routes. `max_upload_bytes` caps request bodies; `None` lifts axum's
/// default 2 MB cap entirely. Static assets, CORS and tracing are layered on
/// by the server binary.
pub fn router(state: AppState, max_upload_bytes: Option<usize>) -> Router {
    let body_limit = match max_upload_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/api/upload", post(tasks::upload_task))
        .route("/api/task/{id}", get(tasks::get_task))
        .route("/files/{filename}", get(files::download_file))
        .route("/health", get(health))
        .layer(body_limit)
        .with_state(state)
}

/// GET /health — liveness check.
pub async fn health() -> &'static str {
    "ok"
}
