use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::AppError;

use super::intake::StagedUpload;

/// Label written by older deployments regardless of the real file type.
pub const LEGACY_DATA_URI_MIME: &str = "image/jpeg";

/// How the MIME token of a stored data URI is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeLabel {
    /// The validated content type declared by the uploader.
    Declared,
    /// Always `image/jpeg`.
    Fixed,
}

impl MimeLabel {
    fn resolve<'a>(self, declared: &'a str) -> &'a str {
        match self {
            MimeLabel::Declared => declared,
            MimeLabel::Fixed => LEGACY_DATA_URI_MIME,
        }
    }
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Split a `data:<mime>;base64,<payload>` string back into its parts.
pub fn decode_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    let bytes = STANDARD.decode(payload).ok()?;
    Some((mime.to_string(), bytes))
}

/// Read a file in full and encode it as a data URI.
pub async fn encode_file(path: &Path, mime: &str) -> Result<String, AppError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::io(format!("reading {}", path.display()), e))?;
    Ok(data_uri(mime, &bytes))
}

pub async fn encode_staged(staged: &StagedUpload, label: MimeLabel) -> Result<String, AppError> {
    encode_file(staged.path(), label.resolve(staged.mime())).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_format() {
        assert_eq!(data_uri("image/png", b"hi"), "data:image/png;base64,aGk=");
    }

    #[test]
    fn fixed_label_ignores_declared_type() {
        assert_eq!(MimeLabel::Fixed.resolve("application/pdf"), "image/jpeg");
        assert_eq!(MimeLabel::Declared.resolve("application/pdf"), "application/pdf");
    }

    #[test]
    fn decode_recovers_original_bytes() {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let uri = data_uri("image/gif", &bytes);
        let (mime, decoded) = decode_data_uri(&uri).unwrap();
        assert_eq!(mime, "image/gif");
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn decode_rejects_non_data_uri() {
        assert!(decode_data_uri("https://example.com/a.png").is_none());
        assert!(decode_data_uri("data:image/png,plain").is_none());
    }

    #[tokio::test]
    async fn encode_file_reads_whole_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ten.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0, 0, 1, 2, 3, 4, 5]).unwrap();

        let uri = encode_file(&path, LEGACY_DATA_URI_MIME).await.unwrap();
        assert_eq!(uri, "data:image/jpeg;base64,/9j/4AABAgMEBQ==");
    }

    #[tokio::test]
    async fn encode_missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = encode_file(&tmp.path().join("gone.png"), "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Io(_, _)));
    }
}
