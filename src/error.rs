use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    /// Disallowed attachment type, size, or field name.
    Validation(String),
    BadRequest(String),
    NotFound(String),
    Io(String, std::io::Error),
    Parse(serde_json::Error),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation Error: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::Io(context, err) => write!(f, "IO Error: {context}: {err}"),
            AppError::Parse(err) => write!(f, "Parse Error: {err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Io(_, err) => Some(err),
            AppError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl AppError {
    pub fn io(context: impl Into<String>, err: std::io::Error) -> Self {
        AppError::Io(context.into(), err)
    }

    /// Pair this error with the route-level message of the operation that failed.
    pub fn during(self, message: &'static str) -> OperationError {
        OperationError {
            message,
            source: self,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err)
    }
}

/// An `AppError` rendered under a caller-facing message such as
/// "Error submitting form". Not-found errors keep their own message.
#[derive(Debug)]
pub struct OperationError {
    pub message: &'static str,
    pub source: AppError,
}

impl IntoResponse for OperationError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.source {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "message": msg })),
            // Upload rejections stay on the 500 path the form clients already handle.
            AppError::Validation(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": self.message, "error": msg }),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "message": self.message, "error": msg }),
            ),
            AppError::Io(context, err) => {
                tracing::error!("{}: {context}: {err}", self.message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": self.message, "error": "Internal server error" }),
                )
            }
            AppError::Parse(err) => {
                tracing::error!("{}: stored data is not valid JSON: {err}", self.message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": self.message, "error": "Stored form data is malformed" }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
