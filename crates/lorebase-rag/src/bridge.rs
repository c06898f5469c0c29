// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blocking execution bridge for synchronous callers.
//!
//! A dedicated worker thread owns its own single-threaded Tokio runtime and
//! drains a channel of questions. Synchronous code (the CLI `ask` command,
//! or anything already inside another runtime via `spawn_blocking`) submits
//! a question and blocks on the reply. One path, regardless of the caller's
//! async context; there is no runtime sniffing.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use tracing::debug;

use lorebase_core::{AskRequest, LorebaseError, RagBackend};

struct Job {
    req: AskRequest,
    reply: mpsc::Sender<Result<serde_json::Value, LorebaseError>>,
}

/// Handle to the question worker thread.
///
/// Dropping the bridge closes the channel; the worker drains outstanding
/// jobs and exits.
pub struct ExecBridge {
    tx: Option<mpsc::Sender<Job>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl ExecBridge {
    /// Spawn the worker thread around a shared backend.
    pub fn new(backend: Arc<dyn RagBackend>) -> Result<Self, LorebaseError> {
        let (tx, rx) = mpsc::channel::<Job>();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LorebaseError::Internal(format!("failed to build runtime: {e}")))?;

        let worker = thread::Builder::new()
            .name("lorebase-ask".to_string())
            .spawn(move || {
                debug!("question worker started");
                for job in rx {
                    let result = runtime.block_on(backend.ask_question(job.req));
                    // A dropped receiver just means the caller gave up.
                    let _ = job.reply.send(result);
                }
                debug!("question worker stopped");
            })
            .map_err(|e| LorebaseError::Internal(format!("failed to spawn worker: {e}")))?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Submit a question and block until the worker answers.
    pub fn ask_blocking(&self, req: AskRequest) -> Result<serde_json::Value, LorebaseError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| LorebaseError::Internal("question worker stopped".to_string()))?;
        tx.send(Job {
            req,
            reply: reply_tx,
        })
        .map_err(|_| LorebaseError::Internal("question worker stopped".to_string()))?;
        reply_rx
            .recv()
            .map_err(|_| LorebaseError::Internal("question worker dropped reply".to_string()))?
    }
}

impl Drop for ExecBridge {
    fn drop(&mut self) {
        drop(self.tx.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
