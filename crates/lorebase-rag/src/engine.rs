// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The RAG engine: per-knowledge-base vector stores, document processing,
//! and question answering.
//!
//! One [`RagSystem`] is constructed at startup and shared behind an `Arc`;
//! every request path goes through the same instance so the in-memory
//! stores accumulate instead of being rebuilt per request.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::json;
use tracing::{debug, info, warn};

use lorebase_config::RagConfig;
use lorebase_core::{
    AskRequest, KbStats, LlmSettings, LorebaseError, ProcessOutcome, RagBackend,
};
use lorebase_storage::queries::chunks;
use lorebase_storage::Database;

use crate::extract::{chunk_text, extract_text};
use crate::llm::LlmClient;
use crate::store::{IndexedChunk, ScoredChunk, VectorStore};
use crate::vectorizer::HashedVectorizer;

const SYSTEM_PROMPT: &str = "You are a knowledge base assistant. Answer the question using only \
the provided context. If the context does not contain the answer, say so plainly.";

/// Answer used when no LLM configuration is available: the top retrieved
/// chunks are returned directly.
const RETRIEVAL_ONLY_MODEL: &str = "retrieval-only";

pub struct RagSystem {
    db: Database,
    config: RagConfig,
    vectorizer: HashedVectorizer,
    llm: LlmClient,
    stores: DashMap<i64, Arc<VectorStore>>,
    llm_configs: DashMap<i64, LlmSettings>,
}

impl RagSystem {
    pub fn new(db: Database, config: RagConfig) -> Self {
        let vectorizer = HashedVectorizer::new(config.embedding_dim);
        Self {
            db,
            config,
            vectorizer,
            llm: LlmClient::new(),
            stores: DashMap::new(),
            llm_configs: DashMap::new(),
        }
    }

    /// The store for a knowledge base, created empty on first access.
    fn store(&self, kb_id: i64) -> Arc<VectorStore> {
        self.stores
            .entry(kb_id)
            .or_insert_with(|| Arc::new(VectorStore::new()))
            .clone()
    }

    fn sources_json(hits: &[ScoredChunk]) -> serde_json::Value {
        json!(hits
            .iter()
            .map(|h| {
                json!({
                    "document_id": h.document_id,
                    "chunk_index": h.chunk_index,
                    "content": h.content,
                    "similarity": h.similarity,
                })
            })
            .collect::<Vec<_>>())
    }

    fn context_block(hits: &[ScoredChunk]) -> String {
        hits.iter()
            .enumerate()
            .map(|(i, h)| format!("[{}] {}", i + 1, h.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Degraded answer path: no configured LLM, so the retrieved chunks
    /// themselves are the answer.
    fn retrieval_only_answer(hits: &[ScoredChunk]) -> String {
        if hits.is_empty() {
            return "No relevant content was found in this knowledge base.".to_string();
        }
        let mut answer =
            String::from("No language model is configured; most relevant passages:\n\n");
        answer.push_str(&Self::context_block(hits));
        answer
    }
}

#[async_trait]
impl RagBackend for RagSystem {
    fn configure_llm(&self, config_id: i64, settings: LlmSettings) {
        debug!(config_id, model = %settings.model_name, "registered llm configuration");
        self.llm_configs.insert(config_id, settings);
    }

    async fn chunk_count(&self, kb_id: i64) -> usize {
        self.store(kb_id).len()
    }

    async fn manually_load_documents(&self, kb_id: i64) -> Result<usize, LorebaseError> {
        let rows = chunks::for_knowledge_base(&self.db, kb_id).await?;
        let indexed: Vec<IndexedChunk> = rows
            .into_iter()
            .map(|c| IndexedChunk {
                document_id: c.document_id,
                chunk_index: c.chunk_index,
                content: c.content,
                embedding: c.embedding,
            })
            .collect();
        let count = indexed.len();
        self.store(kb_id).replace_all(indexed);
        info!(kb_id, count, "hydrated vector store from database");
        Ok(count)
    }

    async fn ask_question(&self, req: AskRequest) -> Result<serde_json::Value, LorebaseError> {
        let started = Instant::now();
        let query = self.vectorizer.embed(&req.question);
        let hits = self.store(req.kb_id).search(&query, req.top_k, req.threshold);
        debug!(kb_id = req.kb_id, hits = hits.len(), "retrieval complete");

        let (answer, model_used, tokens_used) = match req.config_id {
            Some(config_id) => {
                let settings = self
                    .llm_configs
                    .get(&config_id)
                    .map(|s| s.value().clone())
                    .ok_or_else(|| {
                        LorebaseError::Integration(format!(
                            "model configuration {config_id} is not registered with the engine"
                        ))
                    })?;
                let user = format!(
                    "Context:\n{}\n\nQuestion: {}",
                    Self::context_block(&hits),
                    req.question
                );
                let completion = self.llm.complete(&settings, SYSTEM_PROMPT, &user).await?;
                (completion.text, settings.model_name, completion.tokens_used)
            }
            None => {
                warn!(kb_id = req.kb_id, "answering without a configured llm");
                (
                    Self::retrieval_only_answer(&hits),
                    RETRIEVAL_ONLY_MODEL.to_string(),
                    0,
                )
            }
        };

        let sources = Self::sources_json(&hits);
        Ok(json!({
            "answer": answer,
            "sources": sources,
            "retrieved_chunks": sources,
            "model_used": model_used,
            "response_time": started.elapsed().as_secs_f64(),
            "tokens_used": tokens_used,
        }))
    }

    async fn test_llm(&self, config_id: i64) -> Result<serde_json::Value, LorebaseError> {
        let settings = self
            .llm_configs
            .get(&config_id)
            .map(|s| s.value().clone())
            .ok_or_else(|| {
                LorebaseError::Integration(format!(
                    "model configuration {config_id} is not registered with the engine"
                ))
            })?;

        let started = Instant::now();
        let completion = self
            .llm
            .complete(
                &settings,
                SYSTEM_PROMPT,
                "Hello! Please briefly introduce yourself.",
            )
            .await?;
        info!(config_id, model = %settings.model_name, "llm connectivity check succeeded");
        Ok(json!({
            "model_used": settings.model_name,
            "response": completion.text,
            "response_time": started.elapsed().as_secs_f64(),
            "tokens_used": completion.tokens_used,
        }))
    }

    async fn process_document(
        &self,
        kb_id: i64,
        path: &Path,
        document_id: i64,
    ) -> Result<ProcessOutcome, LorebaseError> {
        let file_type = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| {
                LorebaseError::Validation(format!("{} has no extension", path.display()))
            })?;

        // Extraction can be CPU-heavy (pdf), so it runs off the async threads.
        let owned_path = path.to_path_buf();
        let text = tokio::task::spawn_blocking(move || extract_text(&owned_path, &file_type))
            .await
            .map_err(|e| LorebaseError::Internal(format!("extraction task failed: {e}")))??;

        let pieces = chunk_text(&text, self.config.chunk_size, self.config.chunk_overlap);
        if pieces.is_empty() {
            return Err(LorebaseError::Integration(format!(
                "{} produced no text", path.display()
            )));
        }

        let embedded: Vec<(String, Vec<f32>)> = pieces
            .into_iter()
            .map(|content| {
                let embedding = self.vectorizer.embed(&content);
                (content, embedding)
            })
            .collect();

        let count = chunks::replace_for_document(&self.db, document_id, embedded.clone()).await?;

        let indexed: Vec<IndexedChunk> = embedded
            .into_iter()
            .enumerate()
            .map(|(i, (content, embedding))| IndexedChunk {
                document_id,
                chunk_index: i as i64,
                content,
                embedding,
            })
            .collect();
        self.store(kb_id).replace_document(document_id, indexed);

        info!(kb_id, document_id, count, "document processed");
        Ok(ProcessOutcome { chunk_count: count })
    }

    async fn knowledge_base_stats(&self, kb_id: i64) -> KbStats {
        match self.stores.get(&kb_id) {
            Some(store) => KbStats {
                indexed_chunks: store.len(),
                store_loaded: true,
            },
            None => KbStats::default(),
        }
    }
}
