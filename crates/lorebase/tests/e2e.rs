// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenario: create a knowledge base, upload a document, and
//! hold a two-question conversation against the full stack (real engine,
//! real extraction, real retrieval; no configured LLM, so answers are
//! retrieval-only).

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use lorebase_config::LorebaseConfig;
use lorebase_gateway::{build_router, AppState};
use lorebase_rag::RagSystem;
use lorebase_storage::queries::users;
use lorebase_storage::Database;

const TOKEN: &str = "e2e-token";

async fn app(media_root: &std::path::Path) -> Router {
    let db = Database::open_in_memory().await.unwrap();
    users::create(&db, "e2e", TOKEN).await.unwrap();

    let mut config = LorebaseConfig::default();
    config.upload.media_root = media_root.to_string_lossy().to_string();

    let rag = Arc::new(RagSystem::new(db.clone(), config.rag.clone()));
    build_router(AppState {
        db,
        rag,
        config: Arc::new(config),
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn authed_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {TOKEN}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload_txt(kb_id: i64, file_name: &str, content: &str) -> Request<Body> {
    let boundary = "lorebase-e2e-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         {content}\r\n\
         --{boundary}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri(format!("/api/knowledge/documents/upload?kb_id={kb_id}"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header("authorization", format!("Bearer {TOKEN}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn upload_then_converse() {
    let media = tempfile::tempdir().unwrap();
    let app = app(media.path()).await;

    // Create a knowledge base.
    let (status, created) = send(
        &app,
        authed_json(
            "/api/knowledge/knowledge-bases",
            json!({"name": "handbook", "description": "company handbook"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{created}");
    let kb_id = created["data"]["id"].as_i64().unwrap();

    // Upload a text document; processing runs inside the request.
    let (status, uploaded) = send(
        &app,
        upload_txt(
            kb_id,
            "vacation.txt",
            "Vacation policy: every employee gets twenty five days of paid \
             vacation per year. Unused vacation days carry over into the \
             first quarter of the next year. Vacation requests go to your \
             manager at least two weeks in advance.",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{uploaded}");
    assert_eq!(uploaded["data"]["status"], "completed");
    assert!(uploaded["data"]["chunk_count"].as_i64().unwrap() >= 1);

    // First question: no session token, so a session is created for us.
    let (status, first) = send(
        &app,
        authed_json(
            "/api/knowledge/qa/ask",
            json!({"kb_id": kb_id, "question": "how many vacation days do employees get?"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{first}");
    let data = &first["data"];
    let session_token = data["session_token"].as_str().unwrap().to_string();
    assert!(!session_token.is_empty());
    assert!(data["record_id"].as_i64().unwrap() >= 1);
    assert_eq!(data["model_used"], "retrieval-only");
    let answer = data["answer"].as_str().unwrap();
    assert!(
        answer.contains("vacation"),
        "retrieval-only answer should quote the document: {answer}"
    );

    // Second question with the returned token lands in the same session.
    let (status, second) = send(
        &app,
        authed_json(
            "/api/knowledge/qa/ask",
            json!({
                "kb_id": kb_id,
                "question": "do unused vacation days carry over?",
                "session_id": session_token,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{second}");
    assert_eq!(first["data"]["session_id"], second["data"]["session_id"]);
    assert_ne!(
        first["data"]["record_id"],
        second["data"]["record_id"]
    );

    // The public history shows both exchanges in order.
    let (status, history) = send(
        &app,
        Request::builder()
            .method("GET")
            .uri(format!("/api/knowledge/qa/sessions/{session_token}/records"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let records = history["data"]["records"]["items"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert!(records[0]["question"]
        .as_str()
        .unwrap()
        .starts_with("how many"));
}

#[tokio::test]
async fn unsupported_extension_is_rejected_before_storage() {
    let media = tempfile::tempdir().unwrap();
    let app = app(media.path()).await;

    let (_, created) = send(
        &app,
        authed_json("/api/knowledge/knowledge-bases", json!({"name": "kb"})),
    )
    .await;
    let kb_id = created["data"]["id"].as_i64().unwrap();

    let (status, body) = send(&app, upload_txt(kb_id, "payload.exe", "MZ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, listing) = send(
        &app,
        Request::builder()
            .method("GET")
            .uri(format!("/api/knowledge/documents?kb_id={kb_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(listing["data"]["total"], 0);
}
