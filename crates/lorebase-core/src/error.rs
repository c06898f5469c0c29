// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Lorebase QA service.

use thiserror::Error;

/// The primary error type used across the Lorebase workspace.
///
/// Every variant maps onto one failure class of the HTTP envelope; handlers
/// collapse all of them into `{"success": false, "error": "..."}` and
/// nothing propagates past a single request handler.
#[derive(Debug, Error)]
pub enum LorebaseError {
    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A referenced resource is absent or inactive.
    #[error("{0}")]
    NotFound(String),

    /// Missing/invalid credentials, or acting on a resource not owned.
    #[error("{0}")]
    Unauthorized(String),

    /// Request rejected before any mutation (bad score range, bad field).
    #[error("{0}")]
    Validation(String),

    /// An external collaborator returned an unusable result
    /// (answer payload missing required fields, processing reported failure).
    #[error("{0}")]
    Integration(String),

    /// LLM backend errors (API failure, bad response shape).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
