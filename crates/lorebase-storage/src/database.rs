// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use std::path::Path;

use tokio_rusqlite::Connection;
use tracing::debug;

use lorebase_core::LorebaseError;

use crate::migrations;

/// Convert a tokio_rusqlite error into [`LorebaseError::Storage`].
pub fn map_tr_err(e: tokio_rusqlite::Error) -> LorebaseError {
    LorebaseError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the SQLite database.
///
/// Wraps a [`tokio_rusqlite::Connection`] whose background thread owns the
/// actual rusqlite connection. Cloning is cheap; all clones share the same
/// underlying connection.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and run all
    /// pending migrations.
    ///
    /// Parent directories are created if missing. `wal_mode` controls the
    /// journal mode; foreign keys and a busy timeout are always enabled.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, LorebaseError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| LorebaseError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = Connection::open(path).await.map_err(map_tr_err)?;

        conn.call(move |conn| {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| {
            migrations::run_migrations(conn)
                .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "database opened and migrated");
        Ok(Self { conn })
    }

    /// Open an in-memory database with migrations applied. Test helper, but
    /// also usable for ephemeral runs.
    pub async fn open_in_memory() -> Result<Self, LorebaseError> {
        let conn = Connection::open_in_memory().await.map_err(map_tr_err)?;
        conn.call(|conn| {
            conn.pragma_update(None, "foreign_keys", "ON")?;
            migrations::run_migrations(conn)
                .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
        Ok(Self { conn })
    }

    /// Access the underlying connection for query modules.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Cheap liveness check for health endpoints.
    pub async fn ping(&self) -> Result<(), LorebaseError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint the WAL before shutdown.
    pub async fn close(&self) -> Result<(), LorebaseError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
