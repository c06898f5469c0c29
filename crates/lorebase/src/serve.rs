// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lorebase serve` command implementation.
//!
//! Opens the database, builds the RAG engine once, and serves the HTTP API
//! until interrupted.

use std::sync::Arc;

use tracing::info;

use lorebase_config::LorebaseConfig;
use lorebase_core::LorebaseError;
use lorebase_gateway::{start_server, AppState};
use lorebase_rag::RagSystem;
use lorebase_storage::Database;

pub fn run(config: LorebaseConfig) -> Result<(), LorebaseError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| LorebaseError::Internal(format!("failed to build runtime: {e}")))?;

    runtime.block_on(async {
        let db =
            Database::open(&config.storage.database_path, config.storage.wal_mode).await?;

        // One engine for the process lifetime; per-kb stores hydrate lazily
        // on the first question.
        let rag = Arc::new(RagSystem::new(db.clone(), config.rag.clone()));

        info!(
            database = %config.storage.database_path,
            media_root = %config.upload.media_root,
            "lorebase starting"
        );

        let state = AppState {
            db,
            rag,
            config: Arc::new(config),
        };
        start_server(state).await
    })
}
