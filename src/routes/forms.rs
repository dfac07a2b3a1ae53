use axum::body::Body;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use crate::error::{AppError, OperationError};
use crate::state::SharedState;
use crate::submission::{parser, pipeline};

pub async fn submit_form(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<Value>, OperationError> {
    const FAILED: &str = "Error submitting form";

    let parsed = if parser::is_multipart(&headers) {
        let boundary = parser::multipart_boundary(&headers).map_err(|e| e.during(FAILED))?;
        pipeline::read_multipart(&state, boundary, body.into_data_stream())
            .await
            .map_err(|e| e.during(FAILED))?
    } else {
        let bytes = axum::body::to_bytes(body, state.config.max_body_size)
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read body: {e}")).during(FAILED))?;
        pipeline::ParsedSubmission {
            fields: parser::parse_body(parser::content_type(&headers), &bytes)
                .map_err(|e| e.during(FAILED))?,
            uploads: Vec::new(),
        }
    };

    let record = pipeline::submit(&state, parsed)
        .await
        .map_err(|e| e.during(FAILED))?;

    Ok(Json(json!({
        "message": "Form submitted successfully!",
        "data": record,
    })))
}

pub async fn get_form_data(
    State(state): State<SharedState>,
) -> Result<Json<Vec<Value>>, OperationError> {
    let records = state
        .store
        .fetch_all()
        .await
        .map_err(|e| e.during("Error fetching form data"))?;
    Ok(Json(records))
}

pub async fn delete_form_data(
    State(state): State<SharedState>,
) -> Result<Json<Value>, OperationError> {
    state
        .store
        .delete_all()
        .await
        .map_err(|e| e.during("Error deleting form data"))?;
    Ok(Json(json!({ "message": "Form data deleted successfully!" })))
}

/// Create the staging and data directories ahead of the first submission.
pub async fn initialize(State(state): State<SharedState>) -> Result<Json<Value>, OperationError> {
    const FAILED: &str = "Error initializing storage";

    state.intake.ensure_dir().await.map_err(|e| e.during(FAILED))?;
    state.store.prepare().await.map_err(|e| e.during(FAILED))?;

    Ok(Json(json!({ "message": "Storage initialized" })))
}
