// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document endpoints: listing, upload, deletion.
//!
//! Uploads are processed synchronously within the request: file written to
//! the media root, row created `pending`, then extraction/chunking/embedding
//! run to completion and the row ends `completed` or `failed` — never
//! `pending` after a processing attempt.

use std::path::{Path as FsPath, PathBuf};

use axum::extract::{Multipart, Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use lorebase_config::ALLOWED_EXTENSIONS;
use lorebase_core::LorebaseError;
use lorebase_storage::queries::{documents, documents::NewDocument, knowledge_bases};
use lorebase_storage::Document;

use crate::auth::CurrentUser;
use crate::response::{success, ApiError};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct DocumentListParams {
    pub kb_id: i64,
    #[serde(default = "super::default_page")]
    pub page: i64,
    #[serde(default = "super::default_size")]
    pub size: i64,
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub kb_id: i64,
}

fn document_json(doc: &Document) -> Value {
    json!({
        "id": doc.id,
        "knowledge_base_id": doc.knowledge_base_id,
        "title": doc.title,
        "file_name": doc.file_name,
        "file_type": doc.file_type,
        "file_size": doc.file_size,
        "status": doc.status,
        "chunk_count": doc.chunk_count,
        "uploaded_by": doc.uploaded_by,
        "uploaded_at": doc.uploaded_at,
        "processed_at": doc.processed_at,
    })
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<DocumentListParams>,
) -> Result<Json<Value>, ApiError> {
    knowledge_bases::get_active(&state.db, params.kb_id)
        .await?
        .ok_or_else(|| LorebaseError::NotFound("knowledge base not found".to_string()))?;
    let page = documents::list_for_kb(&state.db, params.kb_id, params.page, params.size).await?;
    let items: Vec<Value> = page.items.iter().map(document_json).collect();
    Ok(success(json!({
        "items": items,
        "total": page.total,
        "page": page.page,
        "page_size": page.page_size,
        "pages": page.pages,
    })))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let doc = documents::get(&state.db, id)
        .await?
        .ok_or_else(|| LorebaseError::NotFound("document not found".to_string()))?;
    Ok(success(document_json(&doc)))
}

/// Store one uploaded file, create its row, and process it to completion.
///
/// Shared by single and batch upload; the row is durably `completed` or
/// `failed` on return, never `pending`.
async fn ingest(
    state: &AppState,
    kb_id: i64,
    uploaded_by: i64,
    file_name: &str,
    data: &[u8],
) -> Result<Document, LorebaseError> {
    if data.len() as u64 > state.config.upload.max_file_size_bytes() {
        return Err(LorebaseError::Validation(format!(
            "file exceeds the {} MB limit",
            state.config.upload.max_file_size_mb
        )));
    }

    let extension = FsPath::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| LorebaseError::Validation("file has no extension".to_string()))?;
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(LorebaseError::Validation(format!(
            "unsupported file type .{extension}; allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    // Random prefix keeps repeated uploads of the same filename apart.
    let prefix: String = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
    let stored_name = format!("{prefix}_{file_name}");
    let dir: PathBuf = FsPath::new(&state.config.upload.media_root)
        .join("knowledge_bases")
        .join(kb_id.to_string())
        .join("documents");
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| LorebaseError::Internal(format!("failed to create media dir: {e}")))?;
    let stored_path = dir.join(&stored_name);
    tokio::fs::write(&stored_path, data)
        .await
        .map_err(|e| LorebaseError::Internal(format!("failed to store upload: {e}")))?;

    let title = FsPath::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string();
    let doc = documents::create(
        &state.db,
        NewDocument {
            knowledge_base_id: kb_id,
            title,
            file_path: stored_path.to_string_lossy().to_string(),
            file_name: file_name.to_string(),
            file_type: extension,
            file_size: data.len() as i64,
            uploaded_by,
        },
    )
    .await?;

    documents::mark_processing(&state.db, doc.id).await?;
    match state.rag.process_document(kb_id, &stored_path, doc.id).await {
        Ok(outcome) => {
            documents::mark_completed(&state.db, doc.id, outcome.chunk_count as i64).await?;
            info!(doc_id = doc.id, chunks = outcome.chunk_count, "upload processed");
            documents::get(&state.db, doc.id)
                .await?
                .ok_or_else(|| LorebaseError::Internal("document vanished".to_string()))
        }
        Err(e) => {
            warn!(doc_id = doc.id, err = %e, "upload processing failed");
            documents::mark_failed(&state.db, doc.id).await?;
            Err(LorebaseError::Integration(format!("document processing failed: {e}")))
        }
    }
}

pub async fn upload(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let kb = knowledge_bases::get_active(&state.db, params.kb_id)
        .await?
        .ok_or_else(|| LorebaseError::NotFound("knowledge base not found".to_string()))?;

    // Pull the first field named "file".
    let mut upload: Option<(String, axum::body::Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| LorebaseError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().map(|s| s.to_string());
            let data = field.bytes().await.map_err(|e| {
                LorebaseError::Validation(format!("failed to read upload: {e}"))
            })?;
            if let Some(file_name) = file_name {
                upload = Some((file_name, data));
            }
            break;
        }
    }

    let (file_name, data) =
        upload.ok_or_else(|| LorebaseError::Validation("no file provided".to_string()))?;
    let doc = ingest(&state, kb.id, user.id, &file_name, &data).await?;
    Ok(success(document_json(&doc)))
}

/// Multi-file upload: every field named "files" is ingested independently
/// and reported per file; one bad file never fails the batch.
pub async fn batch_upload(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(kb_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let kb = knowledge_bases::get_active(&state.db, kb_id)
        .await?
        .ok_or_else(|| LorebaseError::NotFound("knowledge base not found".to_string()))?;

    let mut results: Vec<Value> = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| LorebaseError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("files") {
            continue;
        }
        let file_name = match field.file_name().map(|s| s.to_string()) {
            Some(name) => name,
            None => continue,
        };
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                results.push(json!({
                    "file_name": file_name,
                    "success": false,
                    "error": format!("failed to read upload: {e}"),
                }));
                continue;
            }
        };
        match ingest(&state, kb.id, user.id, &file_name, &data).await {
            Ok(doc) => results.push(json!({
                "file_name": file_name,
                "success": true,
                "document_id": doc.id,
                "chunk_count": doc.chunk_count,
                "file_size": doc.file_size,
            })),
            Err(e) => results.push(json!({
                "file_name": file_name,
                "success": false,
                "error": e.to_string(),
            })),
        }
    }

    if results.is_empty() {
        return Err(LorebaseError::Validation("no files provided".to_string()).into());
    }

    let succeeded = results
        .iter()
        .filter(|r| r["success"] == true)
        .count();
    let total = results.len();
    info!(kb_id = kb.id, total, succeeded, "batch upload finished");
    Ok(success(json!({
        "results": results,
        "summary": {
            "total": total,
            "success": succeeded,
            "failed": total - succeeded,
        },
    })))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let doc = documents::get(&state.db, id)
        .await?
        .ok_or_else(|| LorebaseError::NotFound("document not found".to_string()))?;

    let kb = knowledge_bases::get(&state.db, doc.knowledge_base_id).await?;
    let is_kb_owner = kb.map(|kb| kb.created_by == user.id).unwrap_or(false);
    if doc.uploaded_by != user.id && !is_kb_owner {
        return Err(LorebaseError::Unauthorized(
            "only the uploader or the knowledge base owner can delete a document".to_string(),
        )
        .into());
    }

    // File removal is best effort; the row is the source of truth.
    if let Err(e) = tokio::fs::remove_file(&doc.file_path).await {
        warn!(doc_id = id, err = %e, "failed to remove stored file");
    }
    documents::delete(&state.db, id).await?;

    // Resync the in-memory store so stale chunks stop matching.
    if let Err(e) = state.rag.manually_load_documents(doc.knowledge_base_id).await {
        warn!(kb_id = doc.knowledge_base_id, err = %e, "store resync after delete failed");
    }

    info!(doc_id = id, user_id = user.id, "document deleted");
    Ok(success(json!({ "id": id, "deleted": true })))
}
