use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::contract::ValidationErrors;
use crate::diagnostic::Diagnostic;
use crate::repair::RepairError;

/// Every non-success outcome of the endpoint, with its status and payload.
#[derive(Debug)]
pub enum ApiError {
    MethodNotAllowed,
    Unauthorized,
    /// The model credential was missing at startup.
    Misconfigured(String),
    InvalidJson(String),
    InvalidInput(ValidationErrors),
    Generation(RepairError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InvalidJson(_) | ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Generation(RepairError::Cancelled { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Misconfigured(_) | ApiError::Generation(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<RepairError> for ApiError {
    fn from(err: RepairError) -> Self {
        ApiError::Generation(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::MethodNotAllowed => json!({ "error": "Use POST" }),
            ApiError::Unauthorized => json!({ "error": "Unauthorized" }),
            ApiError::Misconfigured(message) => json!({
                "error": "Server misconfigured",
                "message": message,
            }),
            ApiError::InvalidJson(reason) => json!({
                "error": "Invalid input",
                "details": ValidationErrors::single("", format!("body is not valid JSON: {reason}")).flatten(),
            }),
            ApiError::InvalidInput(errors) => json!({
                "error": "Invalid input",
                "details": errors.flatten(),
            }),
            ApiError::Generation(RepairError::Transport { source, .. }) => json!({
                "error": "Server error",
                "message": source.to_string(),
            }),
            ApiError::Generation(RepairError::Exhausted {
                attempts,
                diagnostic: Diagnostic::NotJson { reason },
                raw,
            }) => json!({
                "error": "Model returned non-JSON output",
                "message": reason,
                "attempts": attempts,
                "raw": raw,
            }),
            ApiError::Generation(RepairError::Exhausted {
                attempts,
                diagnostic: Diagnostic::SchemaMismatch { violations },
                raw,
            }) => json!({
                "error": "Schema validation failed",
                "details": ValidationErrors::new(violations).flatten(),
                "attempts": attempts,
                "raw": raw,
            }),
            ApiError::Generation(err @ RepairError::Cancelled { .. }) => json!({
                "error": "Request cancelled",
                "message": err.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}
