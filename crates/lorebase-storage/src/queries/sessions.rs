// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! QA session registry.
//!
//! Sessions are looked up by (token, user) with no uniqueness constraint:
//! lookup-then-create is best effort, and a lost race produces a duplicate
//! row rather than an error.

use rusqlite::{params, OptionalExtension, Row};

use lorebase_core::LorebaseError;

use crate::database::{map_tr_err, Database};
use crate::models::QaSession;

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<QaSession> {
    Ok(QaSession {
        id: row.get(0)?,
        knowledge_base_id: row.get(1)?,
        user_id: row.get(2)?,
        session_token: row.get(3)?,
        title: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const COLUMNS: &str =
    "id, knowledge_base_id, user_id, session_token, title, created_at, updated_at";

/// Find a session by token for a given user. When duplicates exist the
/// oldest row wins, so a token keeps addressing the same conversation.
pub async fn find_by_token_and_user(
    db: &Database,
    token: &str,
    user_id: i64,
) -> Result<Option<QaSession>, LorebaseError> {
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            let session = conn
                .query_row(
                    &format!(
                        "SELECT {COLUMNS} FROM qa_sessions
                         WHERE session_token = ?1 AND user_id = ?2
                         ORDER BY id ASC LIMIT 1"
                    ),
                    params![token, user_id],
                    row_to_session,
                )
                .optional()?;
            Ok(session)
        })
        .await
        .map_err(map_tr_err)
}

/// Find a session by token alone. Used by the public history endpoint,
/// which addresses conversations by token rather than by owner.
pub async fn find_by_token(
    db: &Database,
    token: &str,
) -> Result<Option<QaSession>, LorebaseError> {
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            let session = conn
                .query_row(
                    &format!(
                        "SELECT {COLUMNS} FROM qa_sessions
                         WHERE session_token = ?1
                         ORDER BY id ASC LIMIT 1"
                    ),
                    params![token],
                    row_to_session,
                )
                .optional()?;
            Ok(session)
        })
        .await
        .map_err(map_tr_err)
}

/// Count sessions for a knowledge base.
pub async fn count_for_kb(db: &Database, kb_id: i64) -> Result<i64, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM qa_sessions WHERE knowledge_base_id = ?1",
                params![kb_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(map_tr_err)
}

/// Create a session for a user against a knowledge base.
pub async fn create(
    db: &Database,
    kb_id: i64,
    user_id: i64,
    token: &str,
    title: &str,
) -> Result<QaSession, LorebaseError> {
    let token = token.to_string();
    let title = title.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO qa_sessions (knowledge_base_id, user_id, session_token, title)
                 VALUES (?1, ?2, ?3, ?4)",
                params![kb_id, user_id, token, title],
            )?;
            let id = conn.last_insert_rowid();
            let session = conn.query_row(
                &format!("SELECT {COLUMNS} FROM qa_sessions WHERE id = ?1"),
                params![id],
                row_to_session,
            )?;
            Ok(session)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a session by id, scoped to its owner.
pub async fn get_for_user(
    db: &Database,
    id: i64,
    user_id: i64,
) -> Result<Option<QaSession>, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let session = conn
                .query_row(
                    &format!("SELECT {COLUMNS} FROM qa_sessions WHERE id = ?1 AND user_id = ?2"),
                    params![id, user_id],
                    row_to_session,
                )
                .optional()?;
            Ok(session)
        })
        .await
        .map_err(map_tr_err)
}

/// List a user's sessions, most recently updated first, optionally filtered
/// by knowledge base.
pub async fn list_for_user(
    db: &Database,
    user_id: i64,
    kb_id: Option<i64>,
) -> Result<Vec<QaSession>, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let sessions = match kb_id {
                Some(kb_id) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM qa_sessions
                         WHERE user_id = ?1 AND knowledge_base_id = ?2
                         ORDER BY updated_at DESC, id DESC"
                    ))?;
                    let rows = stmt
                        .query_map(params![user_id, kb_id], row_to_session)?
                        .collect::<Result<Vec<_>, _>>()?;
                    rows
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM qa_sessions
                         WHERE user_id = ?1
                         ORDER BY updated_at DESC, id DESC"
                    ))?;
                    let rows = stmt
                        .query_map(params![user_id], row_to_session)?
                        .collect::<Result<Vec<_>, _>>()?;
                    rows
                }
            };
            Ok(sessions)
        })
        .await
        .map_err(map_tr_err)
}

/// Bump a session's `updated_at`. Called after each persisted exchange.
pub async fn touch(db: &Database, id: i64) -> Result<(), LorebaseError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE qa_sessions
                 SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a session owned by the user. Records cascade.
pub async fn delete_for_user(db: &Database, id: i64, user_id: i64) -> Result<bool, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "DELETE FROM qa_sessions WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{knowledge_bases, users};

    async fn setup() -> (Database, i64, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let user = users::create(&db, "asker", "tok").await.unwrap();
        let kb = knowledge_bases::create(&db, "docs", "", user.id)
            .await
            .unwrap();
        (db, user.id, kb.id)
    }

    #[tokio::test]
    async fn find_then_create_roundtrips() {
        let (db, user_id, kb_id) = setup().await;

        let missing = find_by_token_and_user(&db, "sess-1", user_id).await.unwrap();
        assert!(missing.is_none());

        let created = create(&db, kb_id, user_id, "sess-1", "What is lorebase?")
            .await
            .unwrap();
        assert_eq!(created.session_token, "sess-1");

        let found = find_by_token_and_user(&db, "sess-1", user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn tokens_are_scoped_per_user() {
        let (db, user_id, kb_id) = setup().await;
        let other = users::create(&db, "other", "tok2").await.unwrap();
        create(&db, kb_id, user_id, "shared-token", "t").await.unwrap();

        let cross = find_by_token_and_user(&db, "shared-token", other.id)
            .await
            .unwrap();
        assert!(cross.is_none(), "another user's token must not match");
    }

    #[tokio::test]
    async fn duplicate_tokens_resolve_to_oldest() {
        let (db, user_id, kb_id) = setup().await;
        let first = create(&db, kb_id, user_id, "dup", "a").await.unwrap();
        let _second = create(&db, kb_id, user_id, "dup", "b").await.unwrap();

        let found = find_by_token_and_user(&db, "dup", user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn list_filters_by_knowledge_base() {
        let (db, user_id, kb_id) = setup().await;
        let kb2 = knowledge_bases::create(&db, "other", "", user_id)
            .await
            .unwrap();
        create(&db, kb_id, user_id, "s1", "a").await.unwrap();
        create(&db, kb2.id, user_id, "s2", "b").await.unwrap();

        assert_eq!(list_for_user(&db, user_id, None).await.unwrap().len(), 2);
        let filtered = list_for_user(&db, user_id, Some(kb2.id)).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].session_token, "s2");
    }

    #[tokio::test]
    async fn delete_is_owner_scoped() {
        let (db, user_id, kb_id) = setup().await;
        let other = users::create(&db, "other", "tok2").await.unwrap();
        let session = create(&db, kb_id, user_id, "s", "t").await.unwrap();

        assert!(!delete_for_user(&db, session.id, other.id).await.unwrap());
        assert!(delete_for_user(&db, session.id, user_id).await.unwrap());
        assert!(get_for_user(&db, session.id, user_id).await.unwrap().is_none());
    }
}
