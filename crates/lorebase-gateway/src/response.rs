// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Uniform response envelope and error mapping.
//!
//! Every response, success or failure, is `{"success": true, "data": ...}`
//! or `{"success": false, "error": "..."}`. Handlers return
//! `Result<Json<Value>, ApiError>` and nothing else leaks out.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

use lorebase_core::LorebaseError;

/// Wrap a payload in the success envelope.
pub fn success<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

/// The failure envelope body for a message.
pub fn failure_body(message: &str) -> Value {
    json!({ "success": false, "error": message })
}

/// Handler error carrying a [`LorebaseError`], rendered as the envelope
/// with a status code derived from the variant.
pub struct ApiError(pub LorebaseError);

impl From<LorebaseError> for ApiError {
    fn from(err: LorebaseError) -> Self {
        Self(err)
    }
}

fn status_for(err: &LorebaseError) -> StatusCode {
    match err {
        LorebaseError::NotFound(_) => StatusCode::NOT_FOUND,
        LorebaseError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        LorebaseError::Validation(_) => StatusCode::BAD_REQUEST,
        LorebaseError::Config(_)
        | LorebaseError::Storage { .. }
        | LorebaseError::Integration(_)
        | LorebaseError::Provider { .. }
        | LorebaseError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(err = %self.0, "request failed");
        }
        (status, Json(failure_body(&self.0.to_string()))).into_response()
    }
}
