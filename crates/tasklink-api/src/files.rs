use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::AppState;

const NOT_FOUND: (StatusCode, &str) = (StatusCode::NOT_FOUND, "File not found");

/// GET /files/{filename} — stream a stored upload by its storage name.
///
/// Anything that does not resolve to a regular file directly inside the
/// upload directory is a plain-text 404, traversal attempts included.
pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, (StatusCode, &'static str)> {
    let Some(path) = state.storage.resolve(&filename).await else {
        debug!("File {:?} not found", filename);
        return Err(NOT_FOUND);
    };

    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        warn!("Failed to open {}: {}", path.display(), e);
        NOT_FOUND
    })?;
    let content_length = match file.metadata().await {
        Ok(metadata) => Some(metadata.len()),
        Err(e) => {
            warn!("Failed to stat {}: {}", path.display(), e);
            None
        }
    };

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    let body = Body::from_stream(ReaderStream::new(file));

    let mut response = body.into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Some(len) = content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }

    Ok(response)
}
