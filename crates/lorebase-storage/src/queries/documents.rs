// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document CRUD and processing-status transitions.

use rusqlite::{params, OptionalExtension, Row};

use lorebase_core::{DocumentStatus, LorebaseError};

use crate::database::{map_tr_err, Database};
use crate::models::{Document, Page};

/// Insert parameters for a freshly uploaded document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub knowledge_base_id: i64,
    pub title: String,
    pub file_path: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub uploaded_by: i64,
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
    let status: String = row.get(7)?;
    let status: DocumentStatus = status.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Document {
        id: row.get(0)?,
        knowledge_base_id: row.get(1)?,
        title: row.get(2)?,
        file_path: row.get(3)?,
        file_name: row.get(4)?,
        file_type: row.get(5)?,
        file_size: row.get(6)?,
        status,
        chunk_count: row.get(8)?,
        uploaded_by: row.get(9)?,
        uploaded_at: row.get(10)?,
        processed_at: row.get(11)?,
    })
}

const COLUMNS: &str = "id, knowledge_base_id, title, file_path, file_name, file_type, file_size, \
                       status, chunk_count, uploaded_by, uploaded_at, processed_at";

/// Insert an uploaded document in `pending` state.
pub async fn create(db: &Database, new: NewDocument) -> Result<Document, LorebaseError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO documents
                 (knowledge_base_id, title, file_path, file_name, file_type, file_size, uploaded_by)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    new.knowledge_base_id,
                    new.title,
                    new.file_path,
                    new.file_name,
                    new.file_type,
                    new.file_size,
                    new.uploaded_by,
                ],
            )?;
            let id = conn.last_insert_rowid();
            let doc = conn.query_row(
                &format!("SELECT {COLUMNS} FROM documents WHERE id = ?1"),
                params![id],
                row_to_document,
            )?;
            Ok(doc)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a document by id.
pub async fn get(db: &Database, id: i64) -> Result<Option<Document>, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let doc = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM documents WHERE id = ?1"),
                    params![id],
                    row_to_document,
                )
                .optional()?;
            Ok(doc)
        })
        .await
        .map_err(map_tr_err)
}

/// List documents for a knowledge base, newest first, paginated.
pub async fn list_for_kb(
    db: &Database,
    kb_id: i64,
    page: i64,
    page_size: i64,
) -> Result<Page<Document>, LorebaseError> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    db.connection()
        .call(move |conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM documents WHERE knowledge_base_id = ?1",
                params![kb_id],
                |row| row.get(0),
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM documents WHERE knowledge_base_id = ?1
                 ORDER BY uploaded_at DESC, id DESC LIMIT ?2 OFFSET ?3"
            ))?;
            let items = stmt
                .query_map(
                    params![kb_id, page_size, (page - 1) * page_size],
                    row_to_document,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Page::new(items, total, page, page_size))
        })
        .await
        .map_err(map_tr_err)
}

/// Move a document into `processing`.
pub async fn mark_processing(db: &Database, id: i64) -> Result<(), LorebaseError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE documents SET status = 'processing' WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Mark a document `completed` with its chunk count and processing timestamp.
pub async fn mark_completed(db: &Database, id: i64, chunk_count: i64) -> Result<(), LorebaseError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE documents
                 SET status = 'completed', chunk_count = ?1,
                     processed_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![chunk_count, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Mark a document `failed`.
pub async fn mark_failed(db: &Database, id: i64) -> Result<(), LorebaseError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE documents SET status = 'failed' WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Count completed documents for a knowledge base. The hydration gate uses
/// this to decide whether an empty in-memory store is a cold cache or a
/// genuinely empty base.
pub async fn count_completed_for_kb(db: &Database, kb_id: i64) -> Result<i64, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM documents
                 WHERE knowledge_base_id = ?1 AND status = 'completed'",
                params![kb_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(map_tr_err)
}

/// Count all documents for a knowledge base, regardless of status.
pub async fn count_for_kb(db: &Database, kb_id: i64) -> Result<i64, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM documents WHERE knowledge_base_id = ?1",
                params![kb_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a document row. Chunks cascade.
pub async fn delete(db: &Database, id: i64) -> Result<bool, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute("DELETE FROM documents WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}
