// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests driving the router in-process via `oneshot`.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use lorebase_config::LorebaseConfig;
use lorebase_core::{
    AskRequest, KbStats, LlmSettings, LorebaseError, ProcessOutcome, RagBackend,
};
use lorebase_gateway::{build_router, AppState};
use lorebase_storage::queries::{documents, documents::NewDocument, knowledge_bases, records, users};
use lorebase_storage::Database;

/// Scripted engine: counts hydrations, captures ask requests, and returns
/// a configurable payload.
struct StubRag {
    chunks: AtomicUsize,
    hydrations: AtomicUsize,
    asks: Mutex<Vec<AskRequest>>,
    payload: Mutex<Value>,
}

impl StubRag {
    fn new() -> Self {
        Self {
            chunks: AtomicUsize::new(0),
            hydrations: AtomicUsize::new(0),
            asks: Mutex::new(Vec::new()),
            payload: Mutex::new(json!({
                "answer": "stub answer",
                "sources": [],
                "retrieved_chunks": [],
                "model_used": "stub-model",
                "response_time": 0.01,
                "tokens_used": 7,
            })),
        }
    }

    fn set_payload(&self, payload: Value) {
        *self.payload.lock().unwrap() = payload;
    }
}

#[async_trait]
impl RagBackend for StubRag {
    fn configure_llm(&self, _config_id: i64, _settings: LlmSettings) {}

    async fn chunk_count(&self, _kb_id: i64) -> usize {
        self.chunks.load(Ordering::SeqCst)
    }

    async fn manually_load_documents(&self, _kb_id: i64) -> Result<usize, LorebaseError> {
        self.hydrations.fetch_add(1, Ordering::SeqCst);
        self.chunks.store(3, Ordering::SeqCst);
        Ok(3)
    }

    async fn ask_question(&self, req: AskRequest) -> Result<Value, LorebaseError> {
        self.asks.lock().unwrap().push(req);
        Ok(self.payload.lock().unwrap().clone())
    }

    async fn test_llm(&self, _config_id: i64) -> Result<Value, LorebaseError> {
        Ok(json!({
            "model_used": "stub-model",
            "response": "Hello, I am a scripted model.",
            "response_time": 0.01,
            "tokens_used": 3,
        }))
    }

    async fn process_document(
        &self,
        _kb_id: i64,
        _path: &Path,
        _document_id: i64,
    ) -> Result<ProcessOutcome, LorebaseError> {
        Ok(ProcessOutcome { chunk_count: 1 })
    }

    async fn knowledge_base_stats(&self, _kb_id: i64) -> KbStats {
        KbStats {
            indexed_chunks: self.chunks.load(Ordering::SeqCst),
            store_loaded: true,
        }
    }
}

struct TestApp {
    app: Router,
    db: Database,
    rag: Arc<StubRag>,
    token: String,
    kb_id: i64,
    _media: tempfile::TempDir,
}

async fn setup() -> TestApp {
    let db = Database::open_in_memory().await.unwrap();
    let user = users::create(&db, "tester", "test-token").await.unwrap();
    let kb = knowledge_bases::create(&db, "docs", "", user.id).await.unwrap();
    let rag = Arc::new(StubRag::new());
    let media = tempfile::tempdir().unwrap();
    let mut config = LorebaseConfig::default();
    config.upload.media_root = media.path().to_string_lossy().to_string();
    let state = AppState {
        db: db.clone(),
        rag: rag.clone(),
        config: Arc::new(config),
    };
    TestApp {
        app: build_router(state),
        db,
        rag,
        token: "test-token".to_string(),
        kb_id: kb.id,
        _media: media,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn ask(t: &TestApp, body: Value) -> (StatusCode, Value) {
    send(
        &t.app,
        post_json("/api/knowledge/qa/ask", Some(&t.token), body),
    )
    .await
}

#[tokio::test]
async fn mutating_routes_require_auth() {
    let t = setup().await;
    let (status, body) = send(
        &t.app,
        post_json(
            "/api/knowledge/knowledge-bases",
            None,
            json!({"name": "x"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, body) = send(
        &t.app,
        post_json(
            "/api/knowledge/knowledge-bases",
            Some("wrong-token"),
            json!({"name": "x"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn public_routes_answer_without_auth() {
    let t = setup().await;
    let (status, body) = send(&t.app, get("/api/knowledge/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], "ok");

    let (status, body) = send(&t.app, get("/api/knowledge/knowledge-bases", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn tokenless_asks_create_distinct_sessions() {
    let t = setup().await;
    let request = json!({"kb_id": t.kb_id, "question": "first question"});

    let (status, first) = ask(&t, request.clone()).await;
    assert_eq!(status, StatusCode::OK, "{first}");
    let (_, second) = ask(&t, request).await;

    let token_a = first["data"]["session_token"].as_str().unwrap();
    let token_b = second["data"]["session_token"].as_str().unwrap();
    assert_ne!(token_a, token_b, "each tokenless ask starts a new session");
    assert_ne!(
        first["data"]["session_id"],
        second["data"]["session_id"]
    );
}

#[tokio::test]
async fn matching_token_appends_to_one_session() {
    let t = setup().await;
    let (_, first) = ask(&t, json!({"kb_id": t.kb_id, "question": "q one"})).await;
    let token = first["data"]["session_token"].as_str().unwrap().to_string();

    let (status, second) = ask(
        &t,
        json!({"kb_id": t.kb_id, "question": "q two", "session_id": token}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["session_id"], second["data"]["session_id"]);

    let (status, history) = send(
        &t.app,
        get(
            &format!("/api/knowledge/qa/sessions/{token}/records"),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let items = history["data"]["records"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["question"], "q one");
    assert_eq!(items[1]["question"], "q two");
}

#[tokio::test]
async fn unset_top_k_and_threshold_resolve_to_defaults() {
    let t = setup().await;
    ask(&t, json!({"kb_id": t.kb_id, "question": "defaults?"})).await;
    // Zero counts as unset too.
    ask(&t, json!({"kb_id": t.kb_id, "question": "zero?", "top_k": 0})).await;

    let asks = t.rag.asks.lock().unwrap();
    assert_eq!(asks.len(), 2);
    for req in asks.iter() {
        assert_eq!(req.top_k, 5);
        assert!((req.threshold - 0.1).abs() < f32::EPSILON);
    }
}

#[tokio::test]
async fn explicit_retrieval_settings_pass_through() {
    let t = setup().await;
    ask(
        &t,
        json!({"kb_id": t.kb_id, "question": "tuned", "top_k": 9, "similarity_threshold": 0.4}),
    )
    .await;
    let asks = t.rag.asks.lock().unwrap();
    assert_eq!(asks[0].top_k, 9);
    assert!((asks[0].threshold - 0.4).abs() < f32::EPSILON);
}

#[tokio::test]
async fn empty_store_with_completed_documents_hydrates_exactly_once() {
    let t = setup().await;
    let doc = documents::create(
        &t.db,
        NewDocument {
            knowledge_base_id: t.kb_id,
            title: "guide".into(),
            file_path: "media/x.txt".into(),
            file_name: "x.txt".into(),
            file_type: "txt".into(),
            file_size: 1,
            uploaded_by: 1,
        },
    )
    .await
    .unwrap();
    documents::mark_completed(&t.db, doc.id, 3).await.unwrap();

    ask(&t, json!({"kb_id": t.kb_id, "question": "cold start"})).await;
    assert_eq!(t.rag.hydrations.load(Ordering::SeqCst), 1);

    // The store is warm now; no further hydration.
    ask(&t, json!({"kb_id": t.kb_id, "question": "warm"})).await;
    assert_eq!(t.rag.hydrations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_knowledge_base_never_hydrates() {
    let t = setup().await;
    ask(&t, json!({"kb_id": t.kb_id, "question": "nothing here"})).await;
    assert_eq!(t.rag.hydrations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_required_field_fails_and_persists_nothing() {
    let t = setup().await;
    t.rag.set_payload(json!({
        "answer": "x",
        "sources": [],
        "response_time": 0.1,
    }));

    let (status, body) = ask(&t, json!({"kb_id": t.kb_id, "question": "broken"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(
        body["error"].as_str().unwrap().contains("model_used"),
        "error must name the missing field: {body}"
    );

    let recent = records::recent(&t.db, 10).await.unwrap();
    assert!(recent.is_empty(), "no record may be persisted");
}

#[tokio::test]
async fn feedback_score_bounds_are_enforced() {
    let t = setup().await;
    let (_, answered) = ask(&t, json!({"kb_id": t.kb_id, "question": "rate me"})).await;
    let record_id = answered["data"]["record_id"].as_i64().unwrap();

    for bad in [0, 6] {
        let (status, body) = send(
            &t.app,
            post_json(
                "/api/knowledge/qa/feedback",
                Some(&t.token),
                json!({"record_id": record_id, "score": bad}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "score {bad} must fail");
        assert_eq!(body["success"], false);
    }

    let (status, _) = send(
        &t.app,
        post_json(
            "/api/knowledge/qa/feedback",
            Some(&t.token),
            json!({"record_id": record_id, "score": 3, "comment": "fine"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (record, _) = records::get_with_owner(&t.db, record_id).await.unwrap().unwrap();
    assert_eq!(record.feedback_score, Some(3));
    assert_eq!(record.feedback_comment, "fine");
}

#[tokio::test]
async fn deleting_the_default_model_config_is_rejected() {
    let t = setup().await;
    let (status, created) = send(
        &t.app,
        post_json(
            "/api/knowledge/models/configs",
            Some(&t.token),
            json!({
                "name": "default gemini",
                "model_type": "api",
                "model_name": "gemini-2.0-flash",
                "api_key": "sk-secret",
                "is_default": true,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{created}");
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &t.app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/knowledge/models/configs/{id}"))
            .header("authorization", format!("Bearer {}", t.token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("assign another default first"));
}

#[tokio::test]
async fn model_config_listing_hides_api_keys() {
    let t = setup().await;
    send(
        &t.app,
        post_json(
            "/api/knowledge/models/configs",
            Some(&t.token),
            json!({
                "name": "g",
                "model_type": "api",
                "model_name": "gemini-2.0-flash",
                "api_key": "sk-very-secret",
            }),
        ),
    )
    .await;

    let (status, body) = send(&t.app, get("/api/knowledge/models/configs", Some(&t.token))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.to_string().contains("sk-very-secret"));
    assert_eq!(body["data"][0]["has_api_key"], true);
}

#[tokio::test]
async fn soft_deleted_knowledge_base_rejects_questions() {
    let t = setup().await;
    let (status, _) = send(
        &t.app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/knowledge/knowledge-bases/{}", t.kb_id))
            .header("authorization", format!("Bearer {}", t.token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ask(&t, json!({"kb_id": t.kb_id, "question": "still there?"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn empty_question_is_rejected_before_any_work() {
    let t = setup().await;
    let (status, body) = ask(&t, json!({"kb_id": t.kb_id, "question": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(t.rag.asks.lock().unwrap().is_empty());
}

fn batch_upload_request(kb_id: i64, token: &str, files: &[(&str, &str)]) -> Request<Body> {
    let boundary = "lorebase-batch-boundary";
    let mut body = String::new();
    for (file_name, content) in files {
        body.push_str(&format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"files\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {content}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));
    Request::builder()
        .method("POST")
        .uri(format!("/api/knowledge/documents/{kb_id}/batch-upload"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn batch_upload_reports_per_file_outcomes() {
    let t = setup().await;
    let (status, body) = send(
        &t.app,
        batch_upload_request(
            t.kb_id,
            &t.token,
            &[("notes.txt", "some notes"), ("payload.exe", "MZ")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let summary = &body["data"]["summary"];
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["success"], 1);
    assert_eq!(summary["failed"], 1);

    let results = body["data"]["results"].as_array().unwrap();
    assert_eq!(results[0]["file_name"], "notes.txt");
    assert_eq!(results[0]["success"], true);
    assert!(results[0]["document_id"].as_i64().unwrap() >= 1);
    assert_eq!(results[1]["success"], false);
    assert!(results[1]["error"]
        .as_str()
        .unwrap()
        .contains("unsupported file type"));

    // The rejected file never became a row.
    let (_, listing) = send(
        &t.app,
        get(&format!("/api/knowledge/documents?kb_id={}", t.kb_id), None),
    )
    .await;
    assert_eq!(listing["data"]["total"], 1);
}

#[tokio::test]
async fn batch_upload_without_files_is_rejected() {
    let t = setup().await;
    let (status, body) = send(&t.app, batch_upload_request(t.kb_id, &t.token, &[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn model_test_reports_connectivity() {
    let t = setup().await;
    let (_, created) = send(
        &t.app,
        post_json(
            "/api/knowledge/models/configs",
            Some(&t.token),
            json!({
                "name": "g",
                "model_type": "api",
                "model_name": "gemini-2.0-flash",
                "api_key": "sk-test",
            }),
        ),
    )
    .await;
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &t.app,
        get(
            &format!("/api/knowledge/models/test?config_id={id}"),
            Some(&t.token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["test_result"], "connection ok");
    assert_eq!(body["data"]["response"], "Hello, I am a scripted model.");

    let (status, _) = send(
        &t.app,
        get("/api/knowledge/models/test?config_id=999", Some(&t.token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_listing_is_scoped_to_caller() {
    let t = setup().await;
    ask(&t, json!({"kb_id": t.kb_id, "question": "mine"})).await;

    users::create(&t.db, "other", "other-token").await.unwrap();
    let (status, body) = send(
        &t.app,
        get("/api/knowledge/qa/sessions", Some("other-token")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (_, mine) = send(&t.app, get("/api/knowledge/qa/sessions", Some(&t.token))).await;
    assert_eq!(mine["data"].as_array().unwrap().len(), 1);
}
