// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token authentication middleware.
//!
//! `Authorization: Bearer <api_token>` is resolved against the users table;
//! the matched user is attached to the request as [`CurrentUser`]. Requests
//! without a valid token are rejected with the failure envelope and no side
//! effects.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use lorebase_storage::queries::users;
use lorebase_storage::User;

use crate::response::failure_body;
use crate::server::AppState;

/// The authenticated user, inserted into request extensions.
#[derive(Clone)]
pub struct CurrentUser(pub User);

pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let token = match token {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => return unauthorized("missing bearer token"),
    };

    match users::find_by_token(&state.db, &token).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Ok(None) => unauthorized("invalid bearer token"),
        Err(e) => {
            tracing::error!(err = %e, "auth lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(failure_body("authentication unavailable")),
            )
                .into_response()
        }
    }
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(failure_body(message))).into_response()
}
