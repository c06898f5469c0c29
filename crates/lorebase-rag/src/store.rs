// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory vector store, one per knowledge base.
//!
//! Holds the chunks of every processed document of a knowledge base and
//! answers cosine-similarity searches over them. Hydrated lazily from the
//! database; an empty store is indistinguishable from a cold one, which is
//! why the hydration gate consults the document table before trusting it.

use std::sync::RwLock;

use crate::vectorizer::cosine_similarity;

/// One chunk resident in a store.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub document_id: i64,
    pub chunk_index: i64,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// A retrieval hit.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub document_id: i64,
    pub chunk_index: i64,
    pub content: String,
    pub similarity: f32,
}

/// Per-knowledge-base chunk index.
#[derive(Default)]
pub struct VectorStore {
    chunks: RwLock<Vec<IndexedChunk>>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chunks.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the entire contents of the store.
    pub fn replace_all(&self, chunks: Vec<IndexedChunk>) {
        if let Ok(mut guard) = self.chunks.write() {
            *guard = chunks;
        }
    }

    /// Drop all chunks belonging to one document and append its new ones.
    pub fn replace_document(&self, document_id: i64, chunks: Vec<IndexedChunk>) {
        if let Ok(mut guard) = self.chunks.write() {
            guard.retain(|c| c.document_id != document_id);
            guard.extend(chunks);
        }
    }

    /// Top-`top_k` chunks with cosine similarity at or above `threshold`,
    /// most similar first.
    pub fn search(&self, query: &[f32], top_k: usize, threshold: f32) -> Vec<ScoredChunk> {
        let guard = match self.chunks.read() {
            Ok(guard) => guard,
            Err(_) => return Vec::new(),
        };
        let mut hits: Vec<ScoredChunk> = guard
            .iter()
            .filter_map(|chunk| {
                let similarity = cosine_similarity(query, &chunk.embedding);
                if similarity >= threshold {
                    Some(ScoredChunk {
                        document_id: chunk.document_id,
                        chunk_index: chunk.chunk_index,
                        content: chunk.content.clone(),
                        similarity,
                    })
                } else {
                    None
                }
            })
            .collect();
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);
        hits
    }
}
