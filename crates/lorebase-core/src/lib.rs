// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Lorebase knowledge-base QA service.
//!
//! This crate provides the error taxonomy, common types, and the
//! [`RagBackend`] boundary trait used throughout the Lorebase workspace.

pub mod error;
pub mod rag;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LorebaseError;
pub use rag::RagBackend;
pub use types::{
    AskRequest, DocumentStatus, KbStats, LlmSettings, ModelType, ProcessOutcome,
    REQUIRED_ANSWER_FIELDS,
};
