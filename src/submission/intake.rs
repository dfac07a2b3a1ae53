use std::fmt::Display;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::AppError;

/// Which attachment fields and file types a deployment accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeProfile {
    /// `profilePic` and `signature`, images only.
    Images,
    /// Adds `document1` and `document2`, and PDF files.
    Documents,
}

impl IntakeProfile {
    pub fn file_fields(self) -> &'static [&'static str] {
        match self {
            IntakeProfile::Images => &["profilePic", "signature"],
            IntakeProfile::Documents => &["profilePic", "signature", "document1", "document2"],
        }
    }

    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            IntakeProfile::Images => &["jpeg", "jpg", "png", "gif"],
            IntakeProfile::Documents => &["jpeg", "jpg", "png", "gif", "pdf"],
        }
    }

    pub fn allowed_mime_types(self) -> &'static [&'static str] {
        match self {
            IntakeProfile::Images => &["image/jpeg", "image/jpg", "image/png", "image/gif"],
            IntakeProfile::Documents => &[
                "image/jpeg",
                "image/jpg",
                "image/png",
                "image/gif",
                "application/pdf",
            ],
        }
    }

    pub fn rejection_message(self) -> &'static str {
        match self {
            IntakeProfile::Images => "Invalid file type. Only JPEG, PNG, GIF, and JPG are allowed.",
            IntakeProfile::Documents => {
                "Invalid file type. Only JPEG, PNG, GIF, JPG, and PDF are allowed."
            }
        }
    }

    pub fn is_file_field(self, name: &str) -> bool {
        self.file_fields().contains(&name)
    }
}

/// Extension and MIME type that passed the allow-list, both lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedType {
    pub extension: String,
    pub mime: String,
}

/// Check a file name and declared content type against the profile's allow-list.
/// Both must match; they are not required to agree with each other.
pub fn check_type(
    profile: IntakeProfile,
    file_name: &str,
    content_type: Option<&str>,
) -> Result<AcceptedType, AppError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let mime = content_type
        .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase());

    match (extension, mime) {
        (Some(extension), Some(mime))
            if profile.allowed_extensions().contains(&extension.as_str())
                && profile.allowed_mime_types().contains(&mime.as_str()) =>
        {
            Ok(AcceptedType { extension, mime })
        }
        _ => Err(AppError::Validation(profile.rejection_message().to_string())),
    }
}

/// An uploaded attachment written to the staging directory.
///
/// The file is deleted when the value is dropped unless `remove` already
/// deleted it, so a request that fails halfway never leaves its uploads behind.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    field: String,
    original_name: String,
    mime: String,
    size: u64,
    received_at: DateTime<Utc>,
    removed: bool,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// File name as sent by the client. Never used to build a path.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Delete the staged file, reporting failure to the caller.
    pub async fn remove(mut self) -> std::io::Result<()> {
        self.removed = true;
        tokio::fs::remove_file(&self.path).await
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        // A single unlink, finished before the response for a failed request
        // is written. The file's size does not change its cost.
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Discarded staged upload {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!("Failed to discard staged upload {}: {e}", self.path.display());
            }
        }
    }
}

/// Validates attachments and streams accepted ones into the staging directory.
#[derive(Debug)]
pub struct UploadIntake {
    dir: PathBuf,
    profile: IntakeProfile,
    max_file_size: u64,
}

impl UploadIntake {
    pub fn new(dir: impl Into<PathBuf>, profile: IntakeProfile, max_file_size: u64) -> Self {
        Self {
            dir: dir.into(),
            profile,
            max_file_size,
        }
    }

    pub fn profile(&self) -> IntakeProfile {
        self.profile
    }

    pub async fn ensure_dir(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::io(format!("creating {}", self.dir.display()), e))
    }

    /// Validate one file part and stream it to disk.
    ///
    /// The type check runs before anything is written. The size bound is
    /// enforced while streaming; a part that crosses it is rejected and its
    /// partial file removed.
    pub async fn stage<S, E>(
        &self,
        field: &str,
        file_name: &str,
        content_type: Option<&str>,
        chunks: S,
    ) -> Result<StagedUpload, AppError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let mut chunks = std::pin::pin!(chunks);
        let accepted = check_type(self.profile, file_name, content_type)?;
        self.ensure_dir().await?;

        let path = self
            .dir
            .join(format!("{}.{}", Uuid::now_v7(), accepted.extension));

        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| AppError::io(format!("creating {}", path.display()), e))?;

        // From here on, dropping the guard removes the partial file.
        let mut staged = StagedUpload {
            path,
            field: field.to_string(),
            original_name: file_name.to_string(),
            mime: accepted.mime,
            size: 0,
            received_at: Utc::now(),
            removed: false,
        };

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk
                .map_err(|e| AppError::BadRequest(format!("Failed to read file '{field}': {e}")))?;

            staged.size += chunk.len() as u64;
            if staged.size > self.max_file_size {
                tracing::warn!(
                    "Rejected upload for field {field}: exceeds {} bytes",
                    self.max_file_size
                );
                drop(file);
                return Err(AppError::Validation("File too large".to_string()));
            }

            file.write_all(&chunk)
                .await
                .map_err(|e| AppError::io(format!("writing {}", staged.path.display()), e))?;
        }

        file.flush()
            .await
            .map_err(|e| AppError::io(format!("flushing {}", staged.path.display()), e))?;

        tracing::debug!(
            "Staged {} ({} bytes) for field {field} at {}",
            staged.original_name,
            staged.size,
            staged.path.display()
        );

        Ok(staged)
    }
}
