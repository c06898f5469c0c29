// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The boundary trait between request orchestration and the RAG engine.
//!
//! The gateway only ever talks to the engine through [`RagBackend`]. The
//! answer payload crosses this seam as loosely-typed JSON so that callers
//! validate it by field presence, exactly as they would against any
//! external collaborator.

use std::path::Path;

use async_trait::async_trait;

use crate::error::LorebaseError;
use crate::types::{AskRequest, KbStats, LlmSettings, ProcessOutcome};

/// The RAG engine as seen by request handlers.
#[async_trait]
pub trait RagBackend: Send + Sync {
    /// Register an LLM configuration for later use. Idempotent per id.
    fn configure_llm(&self, config_id: i64, settings: LlmSettings);

    /// Number of chunks in the kb's in-memory retrieval index, creating an
    /// empty store if one does not exist yet.
    async fn chunk_count(&self, kb_id: i64) -> usize;

    /// Rebuild the kb's retrieval index from persisted completed-document
    /// chunks. Returns the number of chunks loaded.
    async fn manually_load_documents(&self, kb_id: i64) -> Result<usize, LorebaseError>;

    /// Answer a question against a knowledge base.
    ///
    /// The returned payload is expected to carry at least the fields in
    /// [`crate::types::REQUIRED_ANSWER_FIELDS`]; callers must validate.
    async fn ask_question(&self, req: AskRequest) -> Result<serde_json::Value, LorebaseError>;

    /// Send a short canned prompt through a registered LLM configuration
    /// to verify connectivity. Returns the model's reply and timing.
    async fn test_llm(&self, config_id: i64) -> Result<serde_json::Value, LorebaseError>;

    /// Extract, chunk, embed, and persist one uploaded document.
    async fn process_document(
        &self,
        kb_id: i64,
        path: &Path,
        document_id: i64,
    ) -> Result<ProcessOutcome, LorebaseError>;

    /// Engine-side statistics for a knowledge base.
    async fn knowledge_base_stats(&self, kb_id: i64) -> KbStats;
}
