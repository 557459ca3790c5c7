use axum::{
    Json,
    extract::{
        Multipart, Path, State,
        multipart::{Field, MultipartRejection},
    },
};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tasklink_db::models::{NewTask, TaskRow};
use tasklink_types::api::UploadResponse;
use tasklink_types::models::{DEFAULT_TITLE, Task};

use crate::AppState;
use crate::error::ApiError;
use crate::storage::{PendingFile, Storage, generate_stored_name};

const DEFAULT_MIMETYPE: &str = "application/octet-stream";

/// The uploaded file, already flushed to disk. Removed again on drop
/// unless the upload is committed.
struct StoredFile {
    pending: PendingFile,
    original_name: String,
    mimetype: String,
    size: u64,
}

#[derive(Default)]
struct UploadForm {
    title: Option<String>,
    description: Option<String>,
    file: Option<StoredFile>,
}

/// POST /api/upload — multipart form with `file` and optional `title`/`description`.
///
/// The file is streamed to disk and synced before the row is inserted. Until
/// the insert succeeds the file is only pending, so a failed request leaves
/// neither a file nor a row behind.
pub async fn upload_task(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let multipart = multipart.map_err(|e| {
        debug!("Upload rejected: not a multipart request: {}", e);
        ApiError::bad_request("No file uploaded")
    })?;

    let mut form = UploadForm::default();
    read_form(&state.storage, multipart, &mut form).await?;

    let file = form.file.ok_or_else(|| {
        debug!("Upload rejected: no file part");
        ApiError::bad_request("No file uploaded")
    })?;

    let task_id = Uuid::new_v4();
    let title = form
        .title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let description = form.description.unwrap_or_default();

    // Run blocking DB insert off the async runtime
    let db = state.clone();
    let id = task_id.to_string();
    let stored_name = file.pending.stored_name().to_string();
    let original_name = file.original_name.clone();
    let mimetype = file.mimetype.clone();
    tokio::task::spawn_blocking(move || {
        db.db.insert_task(&NewTask {
            id: &id,
            title: &title,
            description: &description,
            filename: &stored_name,
            original_name: &original_name,
            mimetype: &mimetype,
        })
    })
    .await
    .map_err(|e| ApiError::internal("Database error", e))?
    .map_err(|e| ApiError::internal("Database error", e))?;

    info!(
        "Task {} created: {} ({} bytes, stored as {})",
        task_id,
        file.original_name,
        file.size,
        file.pending.stored_name()
    );
    file.pending.keep();

    Ok(Json(UploadResponse::new(task_id)))
}

/// GET /api/task/{id} — the stored record for a task.
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || db.db.get_task(&task_id))
        .await
        .map_err(|e| ApiError::internal("Database error", e))?
        .map_err(|e| ApiError::internal("Database error", e))?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    Ok(Json(task_from_row(row)))
}

fn task_from_row(row: TaskRow) -> Task {
    Task {
        id: row.id,
        title: row.title,
        description: row.description,
        filename: row.filename,
        original_name: row.original_name,
        mimetype: row.mimetype,
        uploaded_at: row.uploaded_at,
    }
}

/// Walk the multipart stream. Only the first `file` part with a filename is
/// stored; later ones are drained and ignored, as are unknown fields.
async fn read_form(
    storage: &Storage,
    mut multipart: Multipart,
    form: &mut UploadForm,
) -> Result<(), ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let has_filename = field.file_name().is_some_and(|n| !n.is_empty());
                if !has_filename {
                    debug!("Ignoring file part without a filename");
                    continue;
                }
                if form.file.is_some() {
                    warn!("Ignoring extra file part");
                    continue;
                }
                form.file = Some(store_file(storage, field).await?);
            }
            "title" => form.title = Some(read_text(field).await?),
            "description" => form.description = Some(read_text(field).await?),
            other => debug!("Ignoring unknown multipart field {:?}", other),
        }
    }
    Ok(())
}

async fn read_text(field: Field<'_>) -> Result<String, ApiError> {
    field.text().await.map_err(|e| {
        warn!("Failed to read text field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })
}

/// Stream one file part to a freshly named file. The file stays pending
/// (removed on drop) until the caller commits it.
async fn store_file(storage: &Storage, mut field: Field<'_>) -> Result<StoredFile, ApiError> {
    let original_name = field.file_name().unwrap_or_default().to_string();
    let mimetype = field
        .content_type()
        .unwrap_or(DEFAULT_MIMETYPE)
        .to_string();
    let stored_name = generate_stored_name(&original_name);

    // Declared before the file handle so the handle is closed first on drop.
    let pending = storage.pending(&stored_name);
    let mut file = storage
        .create_file(&stored_name)
        .await
        .map_err(|e| ApiError::internal("Failed to store file", e))?;

    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(|e| {
        warn!("Upload stream for {} aborted: {}", original_name, e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        file.write_all(&chunk)
            .await
            .map_err(|e| ApiError::internal("Failed to store file", e))?;
        size += chunk.len() as u64;
    }
    file.sync_all()
        .await
        .map_err(|e| ApiError::internal("Failed to store file", e))?;

    Ok(StoredFile {
        pending,
        original_name,
        mimetype,
        size,
    })
}
