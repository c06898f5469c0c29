// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response schema types for the HTTP API.

use serde::{Deserialize, Serialize};

use lorebase_core::ModelType;
use lorebase_storage::ModelConfig;

/// Body of `POST /api/knowledge/knowledge-bases`.
#[derive(Debug, Deserialize)]
pub struct CreateKbBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Body of `POST /api/knowledge/qa/ask`.
#[derive(Debug, Deserialize)]
pub struct AskBody {
    pub kb_id: i64,
    pub question: String,
    /// Session token to continue a conversation; absent means a new session.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Explicit model configuration; absent falls back to the preferred
    /// family, then to retrieval-only.
    #[serde(default)]
    pub model_config_id: Option<i64>,
    /// Zero is treated as unset.
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub similarity_threshold: Option<f32>,
}

/// Body of `POST /api/knowledge/qa/feedback`.
#[derive(Debug, Deserialize)]
pub struct FeedbackBody {
    pub record_id: i64,
    pub score: i64,
    #[serde(default)]
    pub comment: String,
}

/// Body of `POST`/`PUT` on model configs.
#[derive(Debug, Deserialize)]
pub struct ModelConfigBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub model_type: ModelType,
    pub model_name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_base_url: String,
    #[serde(default)]
    pub model_path: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
}

fn default_max_tokens() -> i64 {
    4096
}

fn default_temperature() -> f64 {
    0.7
}

fn default_true() -> bool {
    true
}

/// Model configuration as exposed over the API. The api_key never leaves
/// the server; only its presence is reported.
#[derive(Debug, Serialize)]
pub struct ModelConfigOut {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub model_type: ModelType,
    pub model_name: String,
    pub has_api_key: bool,
    pub api_base_url: String,
    pub model_path: String,
    pub max_tokens: i64,
    pub temperature: f64,
    pub is_active: bool,
    pub is_default: bool,
    pub created_at: String,
}

impl From<ModelConfig> for ModelConfigOut {
    fn from(c: ModelConfig) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            model_type: c.model_type,
            model_name: c.model_name,
            has_api_key: !c.api_key.is_empty(),
            api_base_url: c.api_base_url,
            model_path: c.model_path,
            max_tokens: c.max_tokens,
            temperature: c.temperature,
            is_active: c.is_active,
            is_default: c.is_default,
            created_at: c.created_at,
        }
    }
}
