use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- Upload --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub task_id: Uuid,
    pub link: String,
}

impl UploadResponse {
    pub fn new(task_id: Uuid) -> Self {
        Self {
            success: true,
            task_id,
            link: share_link(task_id),
        }
    }
}

/// Relative link to the client-side viewer page for a task.
pub fn share_link(task_id: Uuid) -> String {
    format!("/task.html?id={}", task_id)
}

// -- Errors --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
