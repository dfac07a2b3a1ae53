use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::SubmissionRecord;

/// Submission records kept as one pretty-printed JSON array in a single file.
///
/// Every operation runs under one async mutex, so appends from overlapping
/// requests never lose each other's records. Rewrites go through a temporary
/// file and a rename; readers see either the old array or the new one.
#[derive(Debug)]
pub struct SubmissionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SubmissionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Create the directory holding the store file. The file itself is only
    /// created by the first append.
    pub async fn prepare(&self) -> Result<(), AppError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::io(format!("creating {}", parent.display()), e)),
            _ => Ok(()),
        }
    }

    /// Append one record and return the number of records now stored.
    pub async fn append(&self, record: &SubmissionRecord) -> Result<usize, AppError> {
        let _guard = self.lock.lock().await;

        let mut records = self.load_for_append().await?;
        records.push(serde_json::to_value(record)?);
        self.persist(&records).await?;

        Ok(records.len())
    }

    /// Every stored record, in append order.
    pub async fn fetch_all(&self) -> Result<Vec<Value>, AppError> {
        let _guard = self.lock.lock().await;

        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::NotFound("No form data found".to_string()));
            }
            Err(e) => return Err(AppError::io(format!("reading {}", self.path.display()), e)),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_str(&raw)?)
    }

    /// Remove the store file. Nothing is kept.
    pub async fn delete_all(&self) -> Result<(), AppError> {
        let _guard = self.lock.lock().await;

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::info!("Deleted form data at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::NotFound(
                "No form data found to delete".to_string(),
            )),
            Err(e) => Err(AppError::io(format!("deleting {}", self.path.display()), e)),
        }
    }

    /// Read the current array for a rewrite. Unparseable content is backed up
    /// next to the store and replaced by an empty array.
    async fn load_for_append(&self) -> Result<Vec<Value>, AppError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::io(format!("reading {}", self.path.display()), e)),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                let backup = self.backup_path();
                tracing::error!(
                    "Error reading {}: {e}; starting a new array, previous content kept at {}",
                    self.path.display(),
                    backup.display()
                );
                tokio::fs::copy(&self.path, &backup)
                    .await
                    .map_err(|e| AppError::io(format!("backing up to {}", backup.display()), e))?;
                Ok(Vec::new())
            }
        }
    }

    async fn persist(&self, records: &[Value]) -> Result<(), AppError> {
        self.prepare().await?;

        let payload = serde_json::to_vec_pretty(records)?;
        let temp_path = self
            .path
            .with_extension(format!("{}.tmp", Uuid::now_v7().simple()));

        if let Err(e) = tokio::fs::write(&temp_path, payload).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(AppError::io(format!("writing {}", temp_path.display()), e));
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(AppError::io(format!("replacing {}", self.path.display()), e));
        }

        Ok(())
    }

    fn backup_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "data.json".to_string());
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        self.path.with_file_name(format!("{file_name}.corrupt-{stamp}"))
    }
}
