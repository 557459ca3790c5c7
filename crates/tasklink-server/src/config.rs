use anyhow::{Context, Result};
use std::path::PathBuf;

/// Runtime settings, read from the environment (and `.env` if present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub public_dir: PathBuf,
    /// `None` means uploads are not size-limited.
    pub max_upload_bytes: Option<usize>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = get("TASKLINK_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("PORT must be a port number")?;
        let db_path: PathBuf = get("TASKLINK_DB_PATH")
            .unwrap_or_else(|| "tasks.db".into())
            .into();
        let upload_dir: PathBuf = get("TASKLINK_UPLOAD_DIR")
            .unwrap_or_else(|| "uploads".into())
            .into();
        let public_dir: PathBuf = get("TASKLINK_PUBLIC_DIR")
            .unwrap_or_else(|| "public".into())
            .into();
        let max_upload_bytes = match get("TASKLINK_MAX_UPLOAD_BYTES") {
            Some(raw) => {
                let limit: usize = raw
                    .parse()
                    .context("TASKLINK_MAX_UPLOAD_BYTES must be a byte count")?;
                (limit > 0).then_some(limit)
            }
            None => None,
        };

        Ok(Self {
            host,
            port,
            db_path,
            upload_dir,
            public_dir,
            max_upload_bytes,
        })
    }
}
