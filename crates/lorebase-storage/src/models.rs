// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for storage entities.
//!
//! Timestamps are stored as RFC 3339 text with millisecond precision,
//! generated by SQLite's `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')` defaults.
//! Embeddings are stored as little-endian f32 BLOBs.

use serde::{Deserialize, Serialize};

use lorebase_core::{DocumentStatus, LlmSettings, ModelType};

/// A registered user of the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub api_token: String,
    pub created_at: String,
}

/// A named collection of documents that questions are asked against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_by: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// An uploaded source document and its processing state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub knowledge_base_id: i64,
    pub title: String,
    pub file_path: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub status: DocumentStatus,
    pub chunk_count: i64,
    pub uploaded_by: i64,
    pub uploaded_at: String,
    pub processed_at: Option<String>,
}

/// A chunk of document text with its embedding.
#[derive(Debug, Clone)]
pub struct DocumentChunk {
    pub id: i64,
    pub document_id: i64,
    pub chunk_index: i64,
    pub content: String,
    pub embedding: Vec<f32>,
    pub created_at: String,
}

/// A QA conversation scoped to one knowledge base and one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaSession {
    pub id: i64,
    pub knowledge_base_id: i64,
    pub user_id: i64,
    pub session_token: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One question/answer exchange within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaRecord {
    pub id: i64,
    pub session_id: i64,
    pub question: String,
    pub answer: String,
    /// JSON array of retrieved chunk payloads, stored as text.
    pub retrieved_chunks: String,
    pub model_used: String,
    pub response_time: f64,
    pub tokens_used: i64,
    pub feedback_score: Option<i64>,
    pub feedback_comment: String,
    pub created_at: String,
}

/// A stored LLM configuration selectable per question.
#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub model_type: ModelType,
    pub model_name: String,
    pub api_key: String,
    pub api_base_url: String,
    pub model_path: String,
    pub max_tokens: i64,
    pub temperature: f64,
    pub is_active: bool,
    pub is_default: bool,
    pub created_at: String,
}

impl ModelConfig {
    /// Convert into the settings shape the RAG engine consumes.
    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            model_type: self.model_type,
            model_name: self.model_name.clone(),
            api_key: self.api_key.clone(),
            api_base_url: self.api_base_url.clone(),
            max_tokens: self.max_tokens as u32,
            temperature: self.temperature,
        }
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("model_type", &self.model_type)
            .field("model_name", &self.model_name)
            .field("api_key", &"[redacted]")
            .field("api_base_url", &self.api_base_url)
            .field("is_active", &self.is_active)
            .field("is_default", &self.is_default)
            .finish_non_exhaustive()
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub pages: i64,
}

impl<T> Page<T> {
    /// Build a page, computing the total page count from `total` and
    /// `page_size` (minimum one page, even when empty).
    pub fn new(items: Vec<T>, total: i64, page: i64, page_size: i64) -> Self {
        let pages = if total == 0 {
            1
        } else {
            (total + page_size - 1) / page_size
        };
        Self {
            items,
            total,
            page,
            page_size,
            pages,
        }
    }
}

/// Serialize an f32 vector into a little-endian byte BLOB.
pub fn vec_to_blob(v: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(v.len() * 4);
    for x in v {
        blob.extend_from_slice(&x.to_le_bytes());
    }
    blob
}

/// Deserialize a little-endian byte BLOB back into an f32 vector.
///
/// Trailing bytes that do not form a full f32 are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
