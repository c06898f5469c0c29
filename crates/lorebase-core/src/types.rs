// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Lorebase workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Processing lifecycle of an uploaded document.
///
/// Created `Pending` on upload; transitions to `Completed` (with chunk
/// count set) or `Failed` once processing returns. Never left `Pending`
/// after a processing attempt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// How a configured model is reached.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Api,
    Local,
}

/// LLM backend settings registered with the engine via `configure_llm`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    pub model_type: ModelType,
    pub model_name: String,
    pub api_key: String,
    pub api_base_url: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("model_type", &self.model_type)
            .field("model_name", &self.model_name)
            .field("api_key", &"[redacted]")
            .field("api_base_url", &self.api_base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// A question posed against a knowledge base.
#[derive(Debug, Clone)]
pub struct AskRequest {
    pub kb_id: i64,
    pub question: String,
    /// Resolved model configuration id, if any. `None` means the engine
    /// answers best-effort without a configured LLM.
    pub config_id: Option<i64>,
    pub top_k: usize,
    pub threshold: f32,
}

/// Outcome of processing one uploaded document.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub chunk_count: usize,
}

/// Engine-side statistics for one knowledge base.
#[derive(Debug, Clone, Default, Serialize)]
pub struct KbStats {
    /// Chunks currently resident in the in-memory vector store.
    pub indexed_chunks: usize,
    /// Whether a vector store has been materialized for this kb.
    pub store_loaded: bool,
}

/// Fields every answer payload must carry; anything missing is a hard
/// integration failure and no QA record is persisted.
pub const REQUIRED_ANSWER_FIELDS: [&str; 4] =
    ["answer", "sources", "model_used", "response_time"];
