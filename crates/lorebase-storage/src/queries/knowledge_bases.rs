// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge base CRUD. Deletion is soft: rows are deactivated, never
//! removed, so existing sessions and records keep their references.

use rusqlite::{params, OptionalExtension, Row};

use lorebase_core::LorebaseError;

use crate::database::{map_tr_err, Database};
use crate::models::KnowledgeBase;

fn row_to_kb(row: &Row<'_>) -> rusqlite::Result<KnowledgeBase> {
    Ok(KnowledgeBase {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        is_active: row.get(3)?,
        created_by: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const COLUMNS: &str = "id, name, description, is_active, created_by, created_at, updated_at";

/// Create a knowledge base owned by `created_by`.
pub async fn create(
    db: &Database,
    name: &str,
    description: &str,
    created_by: i64,
) -> Result<KnowledgeBase, LorebaseError> {
    let name = name.to_string();
    let description = description.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO knowledge_bases (name, description, created_by) VALUES (?1, ?2, ?3)",
                params![name, description, created_by],
            )?;
            let id = conn.last_insert_rowid();
            let kb = conn.query_row(
                &format!("SELECT {COLUMNS} FROM knowledge_bases WHERE id = ?1"),
                params![id],
                row_to_kb,
            )?;
            Ok(kb)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a knowledge base by id, active or not.
pub async fn get(db: &Database, id: i64) -> Result<Option<KnowledgeBase>, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let kb = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM knowledge_bases WHERE id = ?1"),
                    params![id],
                    row_to_kb,
                )
                .optional()?;
            Ok(kb)
        })
        .await
        .map_err(map_tr_err)
}

/// Get an active knowledge base by id. Deactivated bases behave as missing.
pub async fn get_active(db: &Database, id: i64) -> Result<Option<KnowledgeBase>, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let kb = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM knowledge_bases WHERE id = ?1 AND is_active = 1"),
                    params![id],
                    row_to_kb,
                )
                .optional()?;
            Ok(kb)
        })
        .await
        .map_err(map_tr_err)
}

/// List active knowledge bases, newest first, with their completed document
/// counts.
pub async fn list_active(db: &Database) -> Result<Vec<(KnowledgeBase, i64)>, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT kb.id, kb.name, kb.description, kb.is_active, kb.created_by,
                        kb.created_at, kb.updated_at,
                        (SELECT COUNT(*) FROM documents d
                         WHERE d.knowledge_base_id = kb.id AND d.status = 'completed')
                 FROM knowledge_bases kb
                 WHERE kb.is_active = 1
                 ORDER BY kb.created_at DESC",
            )?;
            let rows = stmt
                .query_map([], |row| Ok((row_to_kb(row)?, row.get::<_, i64>(7)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

/// Update name/description and touch `updated_at`.
pub async fn update(
    db: &Database,
    id: i64,
    name: &str,
    description: &str,
) -> Result<Option<KnowledgeBase>, LorebaseError> {
    let name = name.to_string();
    let description = description.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE knowledge_bases
                 SET name = ?1, description = ?2,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?3 AND is_active = 1",
                params![name, description, id],
            )?;
            let kb = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM knowledge_bases WHERE id = ?1 AND is_active = 1"),
                    params![id],
                    row_to_kb,
                )
                .optional()?;
            Ok(kb)
        })
        .await
        .map_err(map_tr_err)
}

/// Soft-delete a knowledge base. Returns whether a row was affected.
pub async fn deactivate(db: &Database, id: i64) -> Result<bool, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE knowledge_bases
                 SET is_active = 0, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND is_active = 1",
                params![id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}
