use bytes::Bytes;
use futures_util::Stream;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::models::SubmissionRecord;
use crate::state::AppState;

use super::encoding;
use super::intake::StagedUpload;

/// Text fields and staged attachments read from one request.
#[derive(Debug, Default)]
pub struct ParsedSubmission {
    pub fields: Map<String, Value>,
    pub uploads: Vec<StagedUpload>,
}

/// Read a multipart body: text parts become fields, file parts go through
/// upload intake. The first rejected part aborts the request, and uploads
/// staged before it are discarded.
pub async fn read_multipart<S, E>(
    state: &AppState,
    boundary: String,
    stream: S,
) -> Result<ParsedSubmission, AppError>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let profile = state.intake.profile();
    let mut multipart = multer::Multipart::new(stream, boundary);
    let mut parsed = ParsedSubmission::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("unknown").to_string();

        let Some(file_name) = field.file_name().map(str::to_string) else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Field read error: {e}")))?;
            parsed.fields.insert(name, Value::String(value));
            continue;
        };

        // A file input left blank arrives as an empty part with an empty filename.
        // A nameless part that carries bytes is validated and rejected below.
        if file_name.is_empty() && is_blank(&mut field).await? {
            continue;
        }

        if !profile.is_file_field(&name) {
            return Err(AppError::Validation(format!("Unexpected field: {name}")));
        }

        // Every file part passes intake, even a repeat that will be ignored.
        let content_type = field.content_type().map(|m| m.to_string());
        let staged = state
            .intake
            .stage(&name, &file_name, content_type.as_deref(), field)
            .await?;

        if parsed.uploads.iter().any(|u| u.field() == name) {
            tracing::debug!("Ignoring extra file for field {name}");
            continue;
        }
        parsed.uploads.push(staged);
    }

    Ok(parsed)
}

/// Read a part until it yields a non-empty chunk. True if it never does.
async fn is_blank(field: &mut multer::Field<'_>) -> Result<bool, AppError> {
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::BadRequest(format!("Field read error: {e}")))?
    {
        if !chunk.is_empty() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Encode staged attachments, merge them with the text fields, append the
/// record to the store, then delete the staged files.
pub async fn submit(state: &AppState, parsed: ParsedSubmission) -> Result<SubmissionRecord, AppError> {
    let ParsedSubmission { fields, uploads } = parsed;
    let mut record = SubmissionRecord::from_fields(fields);

    for field in state.intake.profile().file_fields() {
        let data_uri = match uploads.iter().find(|u| u.field() == *field) {
            Some(upload) => {
                tracing::debug!(
                    "Encoding {} ({} bytes, {}) received at {}",
                    upload.original_name(),
                    upload.size(),
                    upload.mime(),
                    upload.received_at().to_rfc3339()
                );
                Some(encoding::encode_staged(upload, state.config.mime_label).await?)
            }
            None => None,
        };
        record.insert_attachment(*field, data_uri);
    }

    let total = state.store.append(&record).await?;
    tracing::info!(
        "Stored submission with {} attachment(s); {total} record(s) on file",
        uploads.len()
    );

    for upload in uploads {
        let path = upload.path().to_path_buf();
        if let Err(e) = upload.remove().await {
            tracing::error!("Failed to delete staged upload {}: {e}", path.display());
        }
    }

    Ok(record)
}
