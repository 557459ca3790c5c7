use serde::{Deserialize, Serialize};

/// Title stored when the uploader leaves it blank.
pub const DEFAULT_TITLE: &str = "Untitled";

/// A shared task as returned by `GET /api/task/{id}`.
///
/// `filename` is the server-generated storage name; `original_name` and
/// `mimetype` are whatever the uploader sent and are never trusted for paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub uploaded_at: String,
}
