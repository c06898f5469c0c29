// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval-augmented QA engine for the Lorebase service.
//!
//! Extracts text from uploaded documents, chunks and embeds it with a
//! deterministic hashed bag-of-words vectorizer, keeps one in-memory
//! vector store per knowledge base, and answers questions either through
//! an OpenAI-compatible LLM endpoint or, degraded, from retrieval alone.

pub mod bridge;
pub mod engine;
pub mod extract;
pub mod llm;
pub mod store;
pub mod vectorizer;

pub use bridge::ExecBridge;
pub use engine::RagSystem;
pub use store::{IndexedChunk, ScoredChunk, VectorStore};
pub use vectorizer::HashedVectorizer;
