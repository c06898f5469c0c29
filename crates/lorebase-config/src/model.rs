// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Lorebase QA service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Lorebase configuration.
///
/// Loaded from TOML files with environment variable overrides. All
/// sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LorebaseConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Document upload settings.
    #[serde(default)]
    pub upload: UploadConfig,

    /// RAG engine settings.
    #[serde(default)]
    pub rag: RagConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8700
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("lorebase").join("lorebase.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "lorebase.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Document upload configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UploadConfig {
    /// Root directory for stored document files.
    #[serde(default = "default_media_root")]
    pub media_root: String,

    /// Maximum accepted file size in megabytes.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
}

impl UploadConfig {
    /// Maximum accepted file size in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            media_root: default_media_root(),
            max_file_size_mb: default_max_file_size_mb(),
        }
    }
}

fn default_media_root() -> String {
    "media".to_string()
}

fn default_max_file_size_mb() -> u64 {
    500
}

/// File extensions accepted for upload, without the leading dot.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["md", "pdf", "txt", "docx", "html"];

/// RAG engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RagConfig {
    /// Model family used when no explicit configuration is requested:
    /// the first active ModelConfig whose model name contains this marker
    /// (case-insensitive) becomes the fallback.
    #[serde(default = "default_preferred_model_family")]
    pub preferred_model_family: String,

    /// Retrieval result count when the request leaves top_k unset.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Similarity threshold when the request leaves it unset. Deliberately
    /// low to favor recall over precision.
    #[serde(default = "default_threshold")]
    pub default_threshold: f32,

    /// Dimension of the hashed bag-of-words embedding.
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Target chunk size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between adjacent chunks in characters.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            preferred_model_family: default_preferred_model_family(),
            default_top_k: default_top_k(),
            default_threshold: default_threshold(),
            embedding_dim: default_embedding_dim(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_preferred_model_family() -> String {
    "gemini".to_string()
}

fn default_top_k() -> usize {
    5
}

fn default_threshold() -> f32 {
    0.1
}

fn default_embedding_dim() -> usize {
    512
}

fn default_chunk_size() -> usize {
    800
}

fn default_chunk_overlap() -> usize {
    100
}
