// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service overview, health, and stats endpoints. All public.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use lorebase_storage::queries::{model_configs, records, stats};

use crate::response::{success, ApiError};
use crate::server::AppState;

pub async fn index(State(_state): State<AppState>) -> Json<Value> {
    success(json!({
        "service": "lorebase",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "knowledge_bases": "/api/knowledge/knowledge-bases",
            "documents": "/api/knowledge/documents",
            "ask": "/api/knowledge/qa/ask",
            "sessions": "/api/knowledge/qa/sessions",
            "model_configs": "/api/knowledge/models/configs",
            "health": "/api/knowledge/health",
            "stats": "/api/knowledge/stats",
        },
    }))
}

pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.db.ping().await?;
    let active_models = model_configs::list(&state.db)
        .await?
        .iter()
        .filter(|c| c.is_active)
        .count();
    Ok(success(json!({
        "database": "ok",
        "active_model_configs": active_models,
    })))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let counts = stats::counts(&state.db).await?;
    let recent = records::recent(&state.db, 5).await?;
    let recent: Vec<Value> = recent
        .into_iter()
        .map(|r| {
            json!({
                "id": r.id,
                "session_id": r.session_id,
                "question": r.question,
                "model_used": r.model_used,
                "created_at": r.created_at,
            })
        })
        .collect();
    Ok(success(json!({
        "counts": counts,
        "recent_records": recent,
    })))
}
