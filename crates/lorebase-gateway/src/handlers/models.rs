// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model configuration CRUD.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use lorebase_core::LorebaseError;
use lorebase_storage::queries::model_configs;
use lorebase_storage::queries::model_configs::NewModelConfig;

use crate::response::{success, ApiError};
use crate::schema::{ModelConfigBody, ModelConfigOut};
use crate::server::AppState;

fn to_new(body: ModelConfigBody) -> Result<NewModelConfig, LorebaseError> {
    if body.name.trim().is_empty() {
        return Err(LorebaseError::Validation("name must not be empty".to_string()));
    }
    if body.model_name.trim().is_empty() {
        return Err(LorebaseError::Validation(
            "model_name must not be empty".to_string(),
        ));
    }
    Ok(NewModelConfig {
        name: body.name,
        description: body.description,
        model_type: body.model_type,
        model_name: body.model_name,
        api_key: body.api_key,
        api_base_url: body.api_base_url,
        model_path: body.model_path,
        max_tokens: body.max_tokens,
        temperature: body.temperature,
        is_active: body.is_active,
        is_default: body.is_default,
    })
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let configs = model_configs::list(&state.db).await?;
    let out: Vec<ModelConfigOut> = configs.into_iter().map(ModelConfigOut::from).collect();
    Ok(success(out))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let config = model_configs::get(&state.db, id)
        .await?
        .ok_or_else(|| LorebaseError::NotFound("model config not found".to_string()))?;
    Ok(success(ModelConfigOut::from(config)))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<ModelConfigBody>,
) -> Result<Json<Value>, ApiError> {
    let config = model_configs::create(&state.db, to_new(body)?).await?;
    tracing::info!(config_id = config.id, model = %config.model_name, "model config created");
    Ok(success(ModelConfigOut::from(config)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ModelConfigBody>,
) -> Result<Json<Value>, ApiError> {
    let config = model_configs::update(&state.db, id, to_new(body)?)
        .await?
        .ok_or_else(|| LorebaseError::NotFound("model config not found".to_string()))?;
    Ok(success(ModelConfigOut::from(config)))
}

#[derive(Debug, Deserialize)]
pub struct TestParams {
    pub config_id: i64,
}

/// Live connectivity check: sends a canned prompt through the configured
/// model and reports the reply (truncated) and timing.
pub async fn test(
    State(state): State<AppState>,
    Query(params): Query<TestParams>,
) -> Result<Json<Value>, ApiError> {
    let config = model_configs::get_active(&state.db, params.config_id)
        .await?
        .ok_or_else(|| LorebaseError::NotFound("model config not found".to_string()))?;

    state.rag.configure_llm(config.id, config.llm_settings());
    let outcome = state.rag.test_llm(config.id).await?;

    let response = outcome["response"].as_str().unwrap_or_default();
    let preview: String = if response.chars().count() > 100 {
        let mut s: String = response.chars().take(100).collect();
        s.push_str("...");
        s
    } else {
        response.to_string()
    };
    Ok(success(json!({
        "test_result": "connection ok",
        "model_name": config.model_name,
        "response": preview,
        "response_time": outcome["response_time"],
    })))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let config = model_configs::get(&state.db, id)
        .await?
        .ok_or_else(|| LorebaseError::NotFound("model config not found".to_string()))?;
    if config.is_default {
        return Err(LorebaseError::Validation(
            "cannot delete the default model config; assign another default first".to_string(),
        )
        .into());
    }
    model_configs::delete(&state.db, id).await?;
    Ok(success(json!({ "id": id, "deleted": true })))
}
