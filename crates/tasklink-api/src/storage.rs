use anyhow::Result;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Longest extension carried over from the uploader's filename.
const MAX_EXTENSION_LEN: usize = 16;

/// Manages the upload directory.
///
/// Every upload is stored as a single flat file at `{dir}/{stored_name}`,
/// where `stored_name` is a fresh UUID plus the original extension. Names
/// coming back in from requests are only ever resolved through [`Storage::resolve`].
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    /// Create the upload directory if it is missing. `dir` is canonicalised
    /// so later containment checks compare like with like.
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        let dir = fs::canonicalize(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path for a name produced by [`generate_stored_name`].
    pub fn file_path(&self, stored_name: &str) -> PathBuf {
        self.dir.join(stored_name)
    }

    /// Open a new file for writing. Fails if the name is already taken.
    pub async fn create_file(&self, stored_name: &str) -> Result<fs::File> {
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.file_path(stored_name))
            .await?;
        Ok(file)
    }

    /// Arm removal of `stored_name`; see [`PendingFile`].
    pub fn pending(&self, stored_name: &str) -> PendingFile {
        PendingFile {
            path: self.file_path(stored_name),
            stored_name: stored_name.to_string(),
            keep: false,
        }
    }

    /// Map a requested name to a regular file inside the upload directory.
    ///
    /// Returns `None` for anything that is not a single plain path component,
    /// does not exist, is not a regular file, or resolves (through symlinks)
    /// outside the directory.
    pub async fn resolve(&self, requested: &str) -> Option<PathBuf> {
        if !is_plain_file_name(requested) {
            return None;
        }

        let canonical = fs::canonicalize(self.dir.join(requested)).await.ok()?;
        if canonical.parent() != Some(self.dir.as_path()) {
            warn!("Rejected file outside upload directory: {}", requested);
            return None;
        }

        let metadata = fs::metadata(&canonical).await.ok()?;
        metadata.is_file().then_some(canonical)
    }
}

/// An upload that is not committed yet.
///
/// Dropping it removes the file, so every early exit from an upload cleans
/// up after itself: a bad form, a failed insert, or the request future being
/// dropped when the client goes away. Call [`PendingFile::keep`] once the
/// task row exists.
pub struct PendingFile {
    path: PathBuf,
    stored_name: String,
    keep: bool,
}

impl PendingFile {
    pub fn stored_name(&self) -> &str {
        &self.stored_name
    }

    pub fn keep(mut self) {
        self.keep = true;
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => info!("Removed unfinished upload {}", self.stored_name),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => error!("Failed to remove unfinished upload {}: {}", self.stored_name, e),
        }
    }
}

/// A fresh storage name: `<uuid>.<ext>`, or just `<uuid>` when the original
/// name has no usable extension.
pub fn generate_stored_name(original_name: &str) -> String {
    let id = Uuid::new_v4();
    match extension_of(original_name) {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

fn extension_of(original_name: &str) -> Option<&str> {
    // Some clients send a full local path; only the last segment counts.
    let base = original_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(original_name);
    let ext = Path::new(base).extension()?.to_str()?;

    let usable = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    usable.then_some(ext)
}

fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(c)), None) if c == OsStr::new(name)
    )
}
