// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state. All routes live under
//! `/api/knowledge`; read-only discovery endpoints are public, everything
//! that mutates requires bearer auth.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use lorebase_config::LorebaseConfig;
use lorebase_core::{LorebaseError, RagBackend};
use lorebase_storage::Database;

use crate::auth::require_user;
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub rag: Arc<dyn RagBackend>,
    pub config: Arc<LorebaseConfig>,
}

/// Build the full application router.
///
/// Exposed separately from [`start_server`] so tests can drive it with
/// `tower::ServiceExt::oneshot`.
pub fn build_router(state: AppState) -> Router {
    // Multipart bodies up to the configured upload ceiling, with headroom
    // for the multipart framing itself.
    let body_limit =
        (state.config.upload.max_file_size_bytes() as usize).saturating_add(64 * 1024);

    let public = Router::new()
        .route("/", get(handlers::system::index))
        .route("/health", get(handlers::system::health))
        .route("/stats", get(handlers::system::stats))
        .route("/knowledge-bases", get(handlers::knowledge_bases::list))
        .route("/knowledge-bases/{id}", get(handlers::knowledge_bases::detail))
        .route("/documents", get(handlers::documents::list))
        .route("/documents/{id}", get(handlers::documents::detail))
        .route(
            "/qa/sessions/{token}/records",
            get(handlers::qa::session_records),
        )
        .with_state(state.clone());

    let authenticated = Router::new()
        .route("/knowledge-bases", post(handlers::knowledge_bases::create))
        .route(
            "/knowledge-bases/{id}",
            delete(handlers::knowledge_bases::remove),
        )
        .route("/documents/upload", post(handlers::documents::upload))
        .route(
            "/documents/{kb_id}/batch-upload",
            post(handlers::documents::batch_upload),
        )
        .route("/documents/{id}", delete(handlers::documents::remove))
        .route("/qa/ask", post(handlers::qa::ask))
        .route("/qa/sessions", get(handlers::qa::list_sessions))
        .route("/qa/feedback", post(handlers::qa::feedback))
        .route("/models/test", get(handlers::models::test))
        .route(
            "/models/configs",
            get(handlers::models::list).post(handlers::models::create),
        )
        .route(
            "/models/configs/{id}",
            get(handlers::models::detail)
                .put(handlers::models::update)
                .delete(handlers::models::remove),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_user,
        ))
        .with_state(state);

    Router::new()
        .nest("/api/knowledge", public.merge(authenticated))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
}

/// Bind and serve until the process is stopped.
pub async fn start_server(state: AppState) -> Result<(), LorebaseError> {
    let addr = format!(
        "{}:{}",
        state.config.server.host, state.config.server.port
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LorebaseError::Internal(format!("failed to bind {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| LorebaseError::Internal(format!("server error: {e}")))
}
