// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service-wide entity counts for the stats endpoint.

use serde::Serialize;

use lorebase_core::LorebaseError;

use crate::database::{map_tr_err, Database};

/// Row counts across the main tables.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EntityCounts {
    pub knowledge_bases: i64,
    pub documents: i64,
    pub qa_sessions: i64,
    pub qa_records: i64,
    pub model_configs: i64,
}

/// Count rows in every main table in one round trip.
pub async fn counts(db: &Database) -> Result<EntityCounts, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let counts = conn.query_row(
                "SELECT
                 (SELECT COUNT(*) FROM knowledge_bases WHERE is_active = 1),
                 (SELECT COUNT(*) FROM documents),
                 (SELECT COUNT(*) FROM qa_sessions),
                 (SELECT COUNT(*) FROM qa_records),
                 (SELECT COUNT(*) FROM model_configs)",
                [],
                |row| {
                    Ok(EntityCounts {
                        knowledge_bases: row.get(0)?,
                        documents: row.get(1)?,
                        qa_sessions: row.get(2)?,
                        qa_records: row.get(3)?,
                        model_configs: row.get(4)?,
                    })
                },
            )?;
            Ok(counts)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{knowledge_bases, users};

    #[tokio::test]
    async fn counts_reflect_inserts_and_soft_deletes() {
        let db = Database::open_in_memory().await.unwrap();
        let zero = counts(&db).await.unwrap();
        assert_eq!(zero.knowledge_bases, 0);
        assert_eq!(zero.qa_records, 0);

        let user = users::create(&db, "u", "t").await.unwrap();
        let kb = knowledge_bases::create(&db, "a", "", user.id).await.unwrap();
        knowledge_bases::create(&db, "b", "", user.id).await.unwrap();
        knowledge_bases::deactivate(&db, kb.id).await.unwrap();

        let after = counts(&db).await.unwrap();
        assert_eq!(after.knowledge_bases, 1, "inactive bases are not counted");
    }
}
