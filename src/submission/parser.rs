use axum::http::HeaderMap;
use serde_json::{Map, Value};

use crate::error::AppError;

pub fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get("content-type").and_then(|v| v.to_str().ok())
}

pub fn is_multipart(headers: &HeaderMap) -> bool {
    content_type(headers).is_some_and(|ct| ct.contains("multipart/form-data"))
}

pub fn multipart_boundary(headers: &HeaderMap) -> Result<String, AppError> {
    content_type(headers)
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| AppError::BadRequest("Missing multipart boundary".to_string()))
}

/// Parse a non-multipart body into text fields based on the Content-Type header.
/// An empty body yields no fields.
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<Map<String, Value>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    let ct = content_type.unwrap_or("application/json");

    if ct.contains("application/json") {
        parse_json_object(body)
    } else if ct.contains("application/x-www-form-urlencoded") {
        parse_form_urlencoded(body)
    } else {
        // Try JSON first, then form-urlencoded
        parse_json_object(body).or_else(|_| parse_form_urlencoded(body))
    }
}

fn parse_json_object(body: &[u8]) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::BadRequest(
            "Form body must be a JSON object".to_string(),
        )),
        Err(e) => Err(AppError::BadRequest(format!("Invalid JSON: {e}"))),
    }
}

fn parse_form_urlencoded(body: &[u8]) -> Result<Map<String, Value>, AppError> {
    let body_str =
        std::str::from_utf8(body).map_err(|e| AppError::BadRequest(format!("Invalid UTF-8: {e}")))?;

    let mut map = Map::new();
    for (k, v) in form_urlencoded::parse(body_str.as_bytes()) {
        map.insert(k.into_owned(), Value::String(v.into_owned()));
    }
    Ok(map)
}
