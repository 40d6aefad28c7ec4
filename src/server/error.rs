// Error responses

use crate::error::IndexError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Helper to create a JSON error response
pub fn json_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(json!({"error": message}))).into_response()
}

pub fn not_found(message: &str) -> Response {
    json_error(StatusCode::NOT_FOUND, message)
}

pub fn internal_error(message: &str) -> Response {
    json_error(StatusCode::INTERNAL_SERVER_ERROR, message)
}

pub fn bad_request(message: &str) -> Response {
    json_error(StatusCode::BAD_REQUEST, message)
}

pub fn task_join_error(e: impl std::fmt::Display) -> Response {
    internal_error(&format!("Task join error: {}", e))
}

/// Map a library error to its response: unknown or stale DOIs are 404,
/// everything else is a server-side failure
pub fn index_error(e: &IndexError) -> Response {
    if e.is_not_found() {
        not_found(&e.to_string())
    } else {
        log::error!("[Server] {}", e);
        internal_error(&e.to_string())
    }
}
