// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The QA orchestration path: session registry, model-config resolution,
//! the vector-store hydration gate, answer validation, and persistence.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use lorebase_core::{AskRequest, LorebaseError, REQUIRED_ANSWER_FIELDS};
use lorebase_storage::queries::{documents, knowledge_bases, model_configs, records, sessions};
use lorebase_storage::queries::records::NewQaRecord;
use lorebase_storage::{ModelConfig, QaSession};

use crate::auth::CurrentUser;
use crate::handlers::PageParams;
use crate::response::{success, ApiError};
use crate::schema::{AskBody, FeedbackBody};
use crate::server::AppState;

/// Session titles are the question, truncated for display.
const TITLE_MAX_CHARS: usize = 50;

fn session_title(question: &str) -> String {
    let chars: Vec<char> = question.chars().collect();
    if chars.len() > TITLE_MAX_CHARS {
        let mut title: String = chars[..TITLE_MAX_CHARS].iter().collect();
        title.push_str("...");
        title
    } else {
        question.to_string()
    }
}

/// Reuse the caller's session when the token matches one they own,
/// otherwise create one (with the given token, or a fresh UUIDv4).
///
/// Lookup-then-create with no uniqueness constraint: a lost race produces
/// a duplicate row, and later lookups resolve to the oldest.
async fn get_or_create_session(
    state: &AppState,
    kb_id: i64,
    user_id: i64,
    token: Option<&str>,
    question: &str,
) -> Result<QaSession, LorebaseError> {
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        if let Some(session) = sessions::find_by_token_and_user(&state.db, token, user_id).await? {
            return Ok(session);
        }
        return sessions::create(&state.db, kb_id, user_id, token, &session_title(question)).await;
    }
    let token = uuid::Uuid::new_v4().to_string();
    sessions::create(&state.db, kb_id, user_id, &token, &session_title(question)).await
}

/// Explicit active config wins; otherwise the first active config matching
/// the preferred family; otherwise `None` and downstream degrades.
async fn resolve_model_config(
    state: &AppState,
    explicit: Option<i64>,
) -> Result<Option<ModelConfig>, LorebaseError> {
    if let Some(id) = explicit {
        if let Some(config) = model_configs::get_active(&state.db, id).await? {
            return Ok(Some(config));
        }
        debug!(config_id = id, "explicit model config missing or inactive, falling back");
    }
    model_configs::find_active_by_family(&state.db, &state.config.rag.preferred_model_family).await
}

/// Reload the kb's vector store when it is empty but completed documents
/// exist. Failure is logged and swallowed: a degraded answer beats a 500.
async fn ensure_hydrated(state: &AppState, kb_id: i64) -> Result<(), LorebaseError> {
    let indexed = state.rag.chunk_count(kb_id).await;
    if indexed > 0 {
        return Ok(());
    }
    let completed = documents::count_completed_for_kb(&state.db, kb_id).await?;
    if completed == 0 {
        return Ok(());
    }
    match state.rag.manually_load_documents(kb_id).await {
        Ok(count) => info!(kb_id, count, "vector store hydrated"),
        Err(e) => warn!(kb_id, err = %e, "vector store hydration failed, continuing"),
    }
    Ok(())
}

/// Set-difference validation of the answer payload against the required
/// field list. Missing fields abort the request; no record is written.
fn validate_answer(payload: &Value) -> Result<(), LorebaseError> {
    let missing: Vec<&str> = REQUIRED_ANSWER_FIELDS
        .iter()
        .filter(|field| payload.get(**field).is_none())
        .copied()
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(LorebaseError::Integration(format!(
            "answer payload missing required fields: {missing:?}"
        )))
    }
}

pub async fn ask(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<AskBody>,
) -> Result<Json<Value>, ApiError> {
    let question = body.question.trim();
    if question.is_empty() {
        return Err(LorebaseError::Validation("question must not be empty".to_string()).into());
    }
    let kb = knowledge_bases::get_active(&state.db, body.kb_id)
        .await?
        .ok_or_else(|| LorebaseError::NotFound("knowledge base not found".to_string()))?;

    let config = resolve_model_config(&state, body.model_config_id).await?;
    let config_id = config.as_ref().map(|c| c.id);
    if let Some(config) = &config {
        state.rag.configure_llm(config.id, config.llm_settings());
    }

    ensure_hydrated(&state, kb.id).await?;

    // Zero and unset both mean "use the default".
    let top_k = match body.top_k {
        Some(k) if k > 0 => k,
        _ => state.config.rag.default_top_k,
    };
    let threshold = body
        .similarity_threshold
        .unwrap_or(state.config.rag.default_threshold);

    let payload = state
        .rag
        .ask_question(AskRequest {
            kb_id: kb.id,
            question: question.to_string(),
            config_id,
            top_k,
            threshold,
        })
        .await?;
    validate_answer(&payload)?;

    let session = get_or_create_session(
        &state,
        kb.id,
        user.id,
        body.session_id.as_deref(),
        question,
    )
    .await?;

    let answer_text = match &payload["answer"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let record = records::create(
        &state.db,
        NewQaRecord {
            session_id: session.id,
            question: question.to_string(),
            answer: answer_text.clone(),
            retrieved_chunks: payload
                .get("retrieved_chunks")
                .map(|v| v.to_string())
                .unwrap_or_else(|| "[]".to_string()),
            model_used: payload["model_used"].as_str().unwrap_or("unknown").to_string(),
            response_time: payload["response_time"].as_f64().unwrap_or(0.0),
            tokens_used: payload.get("tokens_used").and_then(Value::as_i64).unwrap_or(0),
        },
    )
    .await?;
    sessions::touch(&state.db, session.id).await?;

    info!(
        kb_id = kb.id,
        session_id = session.id,
        record_id = record.id,
        model = %record.model_used,
        "question answered"
    );
    Ok(success(json!({
        "session_id": session.id,
        "session_token": session.session_token,
        "record_id": record.id,
        "answer": answer_text,
        "sources": payload["sources"],
        "model_used": record.model_used,
        "response_time": record.response_time,
        "tokens_used": record.tokens_used,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SessionListParams {
    #[serde(default)]
    pub kb_id: Option<i64>,
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<SessionListParams>,
) -> Result<Json<Value>, ApiError> {
    let sessions = sessions::list_for_user(&state.db, user.id, params.kb_id).await?;
    Ok(success(sessions))
}

pub async fn session_records(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, ApiError> {
    let session = sessions::find_by_token(&state.db, &token)
        .await?
        .ok_or_else(|| LorebaseError::NotFound("session not found".to_string()))?;
    let page = records::page_for_session(&state.db, session.id, params.page, params.size).await?;
    Ok(success(json!({
        "session": session,
        "records": page,
    })))
}

pub async fn feedback(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<FeedbackBody>,
) -> Result<Json<Value>, ApiError> {
    if !(1..=5).contains(&body.score) {
        return Err(
            LorebaseError::Validation("score must be between 1 and 5".to_string()).into(),
        );
    }
    let (record, owner) = records::get_with_owner(&state.db, body.record_id)
        .await?
        .ok_or_else(|| LorebaseError::NotFound("record not found".to_string()))?;
    if owner != user.id {
        return Err(LorebaseError::Unauthorized(
            "feedback is limited to the session owner".to_string(),
        )
        .into());
    }
    records::set_feedback(&state.db, record.id, body.score, &body.comment).await?;
    Ok(success(json!({
        "record_id": record.id,
        "score": body.score,
        "comment": body.comment,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_questions_become_titles_verbatim() {
        assert_eq!(session_title("why is the sky blue?"), "why is the sky blue?");
    }

    #[test]
    fn long_questions_truncate_with_ellipsis() {
        let question = "a".repeat(80);
        let title = session_title(&question);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS + 3);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn exactly_fifty_chars_is_not_truncated() {
        let question = "b".repeat(50);
        assert_eq!(session_title(&question), question);
    }

    #[test]
    fn validation_names_every_missing_field() {
        let payload = json!({ "answer": "x", "sources": [] });
        let err = validate_answer(&payload).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("model_used"));
        assert!(message.contains("response_time"));
        assert!(!message.contains("\"answer\""));
    }

    #[test]
    fn complete_payload_validates() {
        let payload = json!({
            "answer": "x",
            "sources": [],
            "model_used": "m",
            "response_time": 0.1,
        });
        assert!(validate_answer(&payload).is_ok());
    }
}
