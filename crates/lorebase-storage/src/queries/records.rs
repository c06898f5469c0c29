// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! QA record persistence and feedback.

use rusqlite::{params, OptionalExtension, Row};

use lorebase_core::LorebaseError;

use crate::database::{map_tr_err, Database};
use crate::models::QaRecord;

/// Insert parameters for a validated QA exchange.
#[derive(Debug, Clone)]
pub struct NewQaRecord {
    pub session_id: i64,
    pub question: String,
    pub answer: String,
    /// JSON array of retrieved chunk payloads.
    pub retrieved_chunks: String,
    pub model_used: String,
    pub response_time: f64,
    pub tokens_used: i64,
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<QaRecord> {
    Ok(QaRecord {
        id: row.get(0)?,
        session_id: row.get(1)?,
        question: row.get(2)?,
        answer: row.get(3)?,
        retrieved_chunks: row.get(4)?,
        model_used: row.get(5)?,
        response_time: row.get(6)?,
        tokens_used: row.get(7)?,
        feedback_score: row.get(8)?,
        feedback_comment: row.get(9)?,
        created_at: row.get(10)?,
    })
}

const COLUMNS: &str = "id, session_id, question, answer, retrieved_chunks, model_used, \
                       response_time, tokens_used, feedback_score, feedback_comment, created_at";

/// Persist one exchange.
pub async fn create(db: &Database, new: NewQaRecord) -> Result<QaRecord, LorebaseError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO qa_records
                 (session_id, question, answer, retrieved_chunks, model_used, response_time, tokens_used)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    new.session_id,
                    new.question,
                    new.answer,
                    new.retrieved_chunks,
                    new.model_used,
                    new.response_time,
                    new.tokens_used,
                ],
            )?;
            let id = conn.last_insert_rowid();
            let record = conn.query_row(
                &format!("SELECT {COLUMNS} FROM qa_records WHERE id = ?1"),
                params![id],
                row_to_record,
            )?;
            Ok(record)
        })
        .await
        .map_err(map_tr_err)
}

/// All records of a session in chronological order.
pub async fn list_for_session(
    db: &Database,
    session_id: i64,
) -> Result<Vec<QaRecord>, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM qa_records WHERE session_id = ?1 ORDER BY created_at ASC, id ASC"
            ))?;
            let records = stmt
                .query_map(params![session_id], row_to_record)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
        .await
        .map_err(map_tr_err)
}

/// One page of a session's records, chronological.
pub async fn page_for_session(
    db: &Database,
    session_id: i64,
    page: i64,
    page_size: i64,
) -> Result<crate::models::Page<QaRecord>, LorebaseError> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    db.connection()
        .call(move |conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM qa_records WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM qa_records WHERE session_id = ?1
                 ORDER BY created_at ASC, id ASC LIMIT ?2 OFFSET ?3"
            ))?;
            let items = stmt
                .query_map(
                    params![session_id, page_size, (page - 1) * page_size],
                    row_to_record,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(crate::models::Page::new(items, total, page, page_size))
        })
        .await
        .map_err(map_tr_err)
}

/// The most recent records across all sessions, newest first.
pub async fn recent(db: &Database, limit: i64) -> Result<Vec<QaRecord>, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM qa_records ORDER BY created_at DESC, id DESC LIMIT ?1"
            ))?;
            let records = stmt
                .query_map(params![limit.max(0)], row_to_record)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a record together with the user id owning its session, for
/// feedback authorization.
pub async fn get_with_owner(
    db: &Database,
    id: i64,
) -> Result<Option<(QaRecord, i64)>, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let result = conn
                .query_row(
                    "SELECT r.id, r.session_id, r.question, r.answer, r.retrieved_chunks,
                            r.model_used, r.response_time, r.tokens_used, r.feedback_score,
                            r.feedback_comment, r.created_at, s.user_id
                     FROM qa_records r
                     JOIN qa_sessions s ON s.id = r.session_id
                     WHERE r.id = ?1",
                    params![id],
                    |row| Ok((row_to_record(row)?, row.get::<_, i64>(11)?)),
                )
                .optional()?;
            Ok(result)
        })
        .await
        .map_err(map_tr_err)
}

/// Attach a feedback score and optional comment to a record.
pub async fn set_feedback(
    db: &Database,
    id: i64,
    score: i64,
    comment: &str,
) -> Result<(), LorebaseError> {
    let comment = comment.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE qa_records SET feedback_score = ?1, feedback_comment = ?2 WHERE id = ?3",
                params![score, comment, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{knowledge_bases, sessions, users};

    async fn setup() -> (Database, i64, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let user = users::create(&db, "asker", "tok").await.unwrap();
        let kb = knowledge_bases::create(&db, "docs", "", user.id)
            .await
            .unwrap();
        let session = sessions::create(&db, kb.id, user.id, "sess", "title")
            .await
            .unwrap();
        (db, user.id, session.id)
    }

    fn make_new(session_id: i64, question: &str) -> NewQaRecord {
        NewQaRecord {
            session_id,
            question: question.to_string(),
            answer: "because".to_string(),
            retrieved_chunks: r#"[{"content":"ctx","similarity":0.8}]"#.to_string(),
            model_used: "gemini-2.0-flash".to_string(),
            response_time: 0.42,
            tokens_used: 128,
        }
    }

    #[tokio::test]
    async fn create_and_list_in_order() {
        let (db, _user_id, session_id) = setup().await;
        create(&db, make_new(session_id, "q1")).await.unwrap();
        create(&db, make_new(session_id, "q2")).await.unwrap();

        let records = list_for_session(&db, session_id).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].question, "q1");
        assert_eq!(records[1].question, "q2");
        assert!(records[0].feedback_score.is_none());
    }

    #[tokio::test]
    async fn get_with_owner_joins_session_user() {
        let (db, user_id, session_id) = setup().await;
        let record = create(&db, make_new(session_id, "q")).await.unwrap();

        let (fetched, owner) = get_with_owner(&db, record.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, record.id);
        assert_eq!(owner, user_id);

        assert!(get_with_owner(&db, 9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn feedback_is_persisted() {
        let (db, _user_id, session_id) = setup().await;
        let record = create(&db, make_new(session_id, "q")).await.unwrap();

        set_feedback(&db, record.id, 4, "helpful").await.unwrap();
        let (fetched, _) = get_with_owner(&db, record.id).await.unwrap().unwrap();
        assert_eq!(fetched.feedback_score, Some(4));
        assert_eq!(fetched.feedback_comment, "helpful");
    }

    #[tokio::test]
    async fn records_cascade_with_session() {
        let (db, user_id, session_id) = setup().await;
        create(&db, make_new(session_id, "q")).await.unwrap();
        sessions::delete_for_user(&db, session_id, user_id)
            .await
            .unwrap();
        assert!(list_for_session(&db, session_id).await.unwrap().is_empty());
    }
}
