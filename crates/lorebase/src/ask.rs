// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lorebase ask` command implementation.
//!
//! The CLI is a synchronous caller, so the question itself goes through
//! [`ExecBridge`]: a worker thread with its own runtime answers it while
//! this thread blocks on the reply. Setup (database open, model-config
//! resolution, store hydration) runs on a scratch runtime that is dropped
//! before the bridge takes over.

use std::sync::Arc;

use clap::Args;
use tracing::{info, warn};

use lorebase_config::LorebaseConfig;
use lorebase_core::{AskRequest, LorebaseError, RagBackend};
use lorebase_rag::{ExecBridge, RagSystem};
use lorebase_storage::queries::{documents, knowledge_bases, model_configs};
use lorebase_storage::Database;

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Knowledge base id to ask against.
    #[arg(long)]
    pub kb: i64,

    /// The question text.
    pub question: String,

    /// Explicit model configuration id (default: first active config of the
    /// preferred family, or retrieval-only when none exists).
    #[arg(long)]
    pub model_config: Option<i64>,

    /// Number of chunks to retrieve (default: 5).
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Minimum cosine similarity for retrieved chunks (default: 0.1).
    #[arg(long)]
    pub threshold: Option<f32>,
}

pub fn run(config: LorebaseConfig, args: AskArgs) -> Result<(), LorebaseError> {
    let question = args.question.trim().to_string();
    if question.is_empty() {
        return Err(LorebaseError::Validation("question must not be empty".to_string()));
    }

    let setup = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| LorebaseError::Internal(format!("failed to build runtime: {e}")))?;

    let (rag, request) = setup.block_on(prepare(&config, &args, question))?;
    drop(setup);

    let bridge = ExecBridge::new(rag)?;
    let payload = bridge.ask_blocking(request)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&payload)
            .map_err(|e| LorebaseError::Internal(format!("unprintable answer: {e}")))?
    );
    Ok(())
}

/// Everything up to the question: mirrors the gateway's pre-ask steps.
async fn prepare(
    config: &LorebaseConfig,
    args: &AskArgs,
    question: String,
) -> Result<(Arc<dyn RagBackend>, AskRequest), LorebaseError> {
    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;

    let kb = knowledge_bases::get_active(&db, args.kb)
        .await?
        .ok_or_else(|| LorebaseError::NotFound("knowledge base not found".to_string()))?;

    let rag = Arc::new(RagSystem::new(db.clone(), config.rag.clone()));

    let resolved = match args.model_config {
        Some(id) => model_configs::get_active(&db, id).await?,
        None => {
            model_configs::find_active_by_family(&db, &config.rag.preferred_model_family).await?
        }
    };
    let config_id = resolved.as_ref().map(|c| c.id);
    if let Some(resolved) = &resolved {
        rag.configure_llm(resolved.id, resolved.llm_settings());
    } else {
        info!("no model configuration resolved, answering retrieval-only");
    }

    // Cold start: the store is empty until hydrated from persisted chunks.
    if documents::count_completed_for_kb(&db, kb.id).await? > 0 {
        match rag.manually_load_documents(kb.id).await {
            Ok(count) => info!(kb_id = kb.id, count, "vector store hydrated"),
            Err(e) => warn!(kb_id = kb.id, err = %e, "vector store hydration failed, continuing"),
        }
    }

    let request = AskRequest {
        kb_id: kb.id,
        question,
        config_id,
        top_k: match args.top_k {
            Some(k) if k > 0 => k,
            _ => config.rag.default_top_k,
        },
        threshold: args.threshold.unwrap_or(config.rag.default_threshold),
    };
    Ok((rag as Arc<dyn RagBackend>, request))
}
