// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document chunk persistence. Embeddings are stored as f32 LE BLOBs.

use rusqlite::{params, Row};

use lorebase_core::LorebaseError;

use crate::database::{map_tr_err, Database};
use crate::models::{blob_to_vec, vec_to_blob, DocumentChunk};

fn row_to_chunk(row: &Row<'_>) -> rusqlite::Result<DocumentChunk> {
    let blob: Vec<u8> = row.get(4)?;
    Ok(DocumentChunk {
        id: row.get(0)?,
        document_id: row.get(1)?,
        chunk_index: row.get(2)?,
        content: row.get(3)?,
        embedding: blob_to_vec(&blob),
        created_at: row.get(5)?,
    })
}

/// Insert all chunks of a document in one transaction.
///
/// Any existing chunks for the document are replaced, so reprocessing a
/// document never leaves stale rows behind.
pub async fn replace_for_document(
    db: &Database,
    document_id: i64,
    chunks: Vec<(String, Vec<f32>)>,
) -> Result<usize, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM document_chunks WHERE document_id = ?1",
                params![document_id],
            )?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO document_chunks (document_id, chunk_index, content, embedding)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for (index, (content, embedding)) in chunks.iter().enumerate() {
                    stmt.execute(params![
                        document_id,
                        index as i64,
                        content,
                        vec_to_blob(embedding),
                    ])?;
                }
            }
            tx.commit()?;
            Ok(chunks.len())
        })
        .await
        .map_err(map_tr_err)
}

/// Load every chunk belonging to a knowledge base, in document and chunk
/// order. This is the hydration path for the in-memory vector store.
pub async fn for_knowledge_base(
    db: &Database,
    kb_id: i64,
) -> Result<Vec<DocumentChunk>, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.document_id, c.chunk_index, c.content, c.embedding, c.created_at
                 FROM document_chunks c
                 JOIN documents d ON d.id = c.document_id
                 WHERE d.knowledge_base_id = ?1
                 ORDER BY c.document_id, c.chunk_index",
            )?;
            let chunks = stmt
                .query_map(params![kb_id], row_to_chunk)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(chunks)
        })
        .await
        .map_err(map_tr_err)
}

/// Count chunks stored for a knowledge base.
pub async fn count_for_knowledge_base(db: &Database, kb_id: i64) -> Result<i64, LorebaseError> {
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM document_chunks c
                 JOIN documents d ON d.id = c.document_id
                 WHERE d.knowledge_base_id = ?1",
                params![kb_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{documents, documents::NewDocument, knowledge_bases, users};

    async fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let user = users::create(&db, "owner", "tok").await.unwrap();
        let kb = knowledge_bases::create(&db, "docs", "", user.id)
            .await
            .unwrap();
        let doc = documents::create(
            &db,
            NewDocument {
                knowledge_base_id: kb.id,
                title: "guide".into(),
                file_path: "media/documents/guide.txt".into(),
                file_name: "guide.txt".into(),
                file_type: "txt".into(),
                file_size: 10,
                uploaded_by: user.id,
            },
        )
        .await
        .unwrap();
        (db, doc.id)
    }

    #[tokio::test]
    async fn replace_then_load_preserves_order_and_embeddings() {
        let (db, doc_id) = setup().await;
        let chunks = vec![
            ("first".to_string(), vec![1.0_f32, 0.0]),
            ("second".to_string(), vec![0.0_f32, 1.0]),
        ];
        let n = replace_for_document(&db, doc_id, chunks).await.unwrap();
        assert_eq!(n, 2);

        let loaded = for_knowledge_base(&db, 1).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].content, "first");
        assert_eq!(loaded[0].chunk_index, 0);
        assert_eq!(loaded[0].embedding, vec![1.0, 0.0]);
        assert_eq!(loaded[1].content, "second");
    }

    #[tokio::test]
    async fn replace_discards_previous_chunks() {
        let (db, doc_id) = setup().await;
        replace_for_document(
            &db,
            doc_id,
            vec![("old-a".into(), vec![1.0]), ("old-b".into(), vec![2.0])],
        )
        .await
        .unwrap();
        replace_for_document(&db, doc_id, vec![("new".into(), vec![3.0])])
            .await
            .unwrap();

        let loaded = for_knowledge_base(&db, 1).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].content, "new");
        assert_eq!(count_for_knowledge_base(&db, 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn chunks_cascade_on_document_delete() {
        let (db, doc_id) = setup().await;
        replace_for_document(&db, doc_id, vec![("x".into(), vec![1.0])])
            .await
            .unwrap();
        documents::delete(&db, doc_id).await.unwrap();
        assert_eq!(count_for_knowledge_base(&db, 1).await.unwrap(), 0);
    }
}
