// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge base endpoints.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde_json::{json, Value};

use lorebase_core::LorebaseError;
use lorebase_storage::queries::{documents, knowledge_bases, sessions};
use lorebase_storage::{KnowledgeBase, Page};

use crate::auth::CurrentUser;
use crate::handlers::PageParams;
use crate::response::{success, ApiError};
use crate::schema::CreateKbBody;
use crate::server::AppState;

fn kb_json(kb: &KnowledgeBase, document_count: i64) -> Value {
    json!({
        "id": kb.id,
        "name": kb.name,
        "description": kb.description,
        "is_active": kb.is_active,
        "created_by": kb.created_by,
        "created_at": kb.created_at,
        "updated_at": kb.updated_at,
        "document_count": document_count,
    })
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let all = knowledge_bases::list_active(&state.db).await?;
    let total = all.len() as i64;
    let page = params.page.max(1);
    let size = params.size.max(1);
    let items: Vec<Value> = all
        .into_iter()
        .skip(((page - 1) * size) as usize)
        .take(size as usize)
        .map(|(kb, count)| kb_json(&kb, count))
        .collect();
    Ok(success(Page::new(items, total, page, size)))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let kb = knowledge_bases::get_active(&state.db, id)
        .await?
        .ok_or_else(|| LorebaseError::NotFound("knowledge base not found".to_string()))?;

    let document_count = documents::count_for_kb(&state.db, id).await?;
    let completed_documents = documents::count_completed_for_kb(&state.db, id).await?;
    let session_count = sessions::count_for_kb(&state.db, id).await?;
    let engine = state.rag.knowledge_base_stats(id).await;

    let mut body = kb_json(&kb, document_count);
    body["completed_documents"] = json!(completed_documents);
    body["session_count"] = json!(session_count);
    body["engine"] = json!(engine);
    Ok(success(body))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<CreateKbBody>,
) -> Result<Json<Value>, ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(LorebaseError::Validation("name must not be empty".to_string()).into());
    }
    let kb = knowledge_bases::create(&state.db, name, &body.description, user.id).await?;
    tracing::info!(kb_id = kb.id, user_id = user.id, "knowledge base created");
    Ok(success(kb_json(&kb, 0)))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let kb = knowledge_bases::get_active(&state.db, id)
        .await?
        .ok_or_else(|| LorebaseError::NotFound("knowledge base not found".to_string()))?;
    if kb.created_by != user.id {
        return Err(
            LorebaseError::Unauthorized("only the owner can delete a knowledge base".to_string())
                .into(),
        );
    }
    knowledge_bases::deactivate(&state.db, id).await?;
    tracing::info!(kb_id = id, user_id = user.id, "knowledge base deactivated");
    Ok(success(json!({ "id": id, "is_active": false })))
}
