//! End-to-end API tests over the real router.
//!
//! The LLM-backed endpoints are only exercised on their validation paths;
//! nothing here talks to an upstream model.

use std::sync::Arc;

use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::json;
use tempfile::TempDir;

use nuanswers::config::{
    AppConfig, ResilienceConfig, SecurityConfig, ServerConfig, StorageConfig, TutoringConfig,
    WindowSpec,
};
use nuanswers::llm::LlmSettings;
use nuanswers::logs::{LogKind, LogStore, RegistrationRecord};
use nuanswers::server::{build_router, build_state};

const ADMIN_PASSWORD: &str = "sesame";

fn test_config(data_dir: &std::path::Path, windows: Vec<WindowSpec>) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
        },
        storage: StorageConfig {
            data_dir: data_dir.display().to_string(),
        },
        security: SecurityConfig {
            admin_password: ADMIN_PASSWORD.to_string(),
        },
        resilience: ResilienceConfig {
            rate_limit_enabled: false,
            timeout_disabled: false,
            requests_per_second: 5.0,
            burst_size: 10.0,
        },
        tutoring: TutoringConfig {
            timezone: "America/New_York".to_string(),
            windows: Some(windows),
        },
    }
}

fn test_settings() -> LlmSettings {
    // Points at a closed port; LLM calls are never made in these tests.
    LlmSettings {
        base_url: "http://127.0.0.1:9".to_string(),
        api_key: "test-key".to_string(),
        model: "test-model".to_string(),
        vision_model: "test-vision".to_string(),
    }
}

/// Server with no tutoring windows (the bot is always available).
fn server(data_dir: &std::path::Path) -> TestServer {
    let config = Arc::new(test_config(data_dir, Vec::new()));
    let state = build_state(config, test_settings()).unwrap();
    TestServer::new(build_router(state)).unwrap()
}

/// Server whose tutoring windows cover every minute of every day.
fn always_open_server(data_dir: &std::path::Path) -> TestServer {
    let windows = [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ]
    .into_iter()
    .map(|day| WindowSpec {
        day: day.to_string(),
        start: "00:00".to_string(),
        end: "23:59".to_string(),
    })
    .collect();

    let config = Arc::new(test_config(data_dir, windows));
    let state = build_state(config, test_settings()).unwrap();
    TestServer::new(build_router(state)).unwrap()
}

fn registration_body() -> serde_json::Value {
    json!({
        "full_name": "Ada Lovelace",
        "grade": "Junior",
        "campus": "Florham",
        "major": "Accounting",
        "course_name": "Intermediate Accounting",
        "course_id": "ACCT_2021_01",
        "professor": "Dr. Byron",
    })
}

async fn register(server: &TestServer) -> String {
    let response = server.post("/api/register").json(&registration_body()).await;
    response.assert_status_ok();
    response.json::<serde_json::Value>()["session_id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());

    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_security_headers_applied() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());

    let response = server.get("/health").await;
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
}

#[tokio::test]
async fn test_simple_chat_requires_message() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());

    let response = server.post("/chat").json(&json!({ "message": "" })).await;
    response.assert_status_bad_request();
    assert_eq!(
        response.json::<serde_json::Value>()["error"],
        "No message provided"
    );
}

#[tokio::test]
async fn test_register_validates_course_id() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());

    let mut body = registration_body();
    body["course_id"] = json!("BIO_1000_01");

    let response = server.post("/api/register").json(&body).await;
    response.assert_status_bad_request();
    assert!(response.text().contains("invalid course ID"));
}

#[tokio::test]
async fn test_register_requires_professor() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());

    let mut body = registration_body();
    body["professor"] = json!("");

    let response = server.post("/api/register").json(&body).await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_register_creates_session_and_logs_row() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());

    let session_id = register(&server).await;
    assert!(!session_id.is_empty());

    let store = LogStore::open(dir.path()).unwrap();
    let rows: Vec<RegistrationRecord> = store.read(LogKind::Registration).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].full_name, "Ada Lovelace");
    assert_eq!(rows[0].usage_time_minutes, 0.0);
}

#[tokio::test]
async fn test_chat_unknown_session_is_404() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());

    let response = server
        .post("/api/chat")
        .json(&json!({ "session_id": "nope", "message": "help" }))
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_chat_deferred_during_tutoring_hours() {
    let dir = TempDir::new().unwrap();
    let server = always_open_server(dir.path());

    let session_id = register(&server).await;
    let response = server
        .post("/api/chat")
        .json(&json!({ "session_id": session_id, "message": "help" }))
        .await;

    response.assert_status(axum::http::StatusCode::CONFLICT);
    let body = response.json::<serde_json::Value>();
    assert!(body["error"].as_str().unwrap().contains("In-person tutoring"));
    assert!(body["tutoring_hours"].as_str().unwrap().contains("Mon"));
}

#[tokio::test]
async fn test_chat_accepts_message_outside_tutoring_hours() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());

    let session_id = register(&server).await;
    let response = server
        .post("/api/chat")
        .json(&json!({ "session_id": session_id, "message": "What is a current ratio?" }))
        .await;

    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["session_id"], session_id);
    assert!(
        body["stream_url"]
            .as_str()
            .unwrap()
            .starts_with("/api/chat/stream?session_id=")
    );
}

#[tokio::test]
async fn test_document_upload_search_reorder_delete() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());
    let session_id = register(&server).await;

    let form = MultipartForm::new()
        .add_part(
            "files",
            Part::bytes(b"current ratio = current assets / current liabilities".to_vec())
                .file_name("ratios.txt")
                .mime_type("text/plain"),
        )
        .add_part(
            "files",
            Part::bytes(b"topic,weight\ntvm,0.4".to_vec())
                .file_name("syllabus.csv")
                .mime_type("text/csv"),
        );

    let response = server
        .post(&format!("/api/sessions/{session_id}/documents"))
        .multipart(form)
        .await;
    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["documents"].as_array().unwrap().len(), 2);
    assert!(body["errors"].as_array().unwrap().is_empty());

    // Search by content.
    let response = server
        .get(&format!("/api/sessions/{session_id}/documents"))
        .add_query_param("q", "ratio")
        .await;
    response.assert_status_ok();
    let docs = response.json::<serde_json::Value>();
    assert_eq!(docs.as_array().unwrap().len(), 1);
    assert_eq!(docs[0]["name"], "ratios.txt");

    // Reorder: move the second document up.
    let all = server
        .get(&format!("/api/sessions/{session_id}/documents"))
        .await
        .json::<serde_json::Value>();
    let second_id = all[1]["id"].as_str().unwrap().to_string();

    let response = server
        .post(&format!(
            "/api/sessions/{session_id}/documents/{second_id}/move"
        ))
        .json(&json!({ "direction": "up" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["moved"], true);

    let reordered = server
        .get(&format!("/api/sessions/{session_id}/documents"))
        .await
        .json::<serde_json::Value>();
    assert_eq!(reordered[0]["id"], second_id.as_str());

    // Delete.
    let response = server
        .delete(&format!(
            "/api/sessions/{session_id}/documents/{second_id}"
        ))
        .await;
    response.assert_status(axum::http::StatusCode::NO_CONTENT);

    let remaining = server
        .get(&format!("/api/sessions/{session_id}/documents"))
        .await
        .json::<serde_json::Value>();
    assert_eq!(remaining.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_document_upload_unsupported_type_reports_error() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());
    let session_id = register(&server).await;

    let form = MultipartForm::new().add_part(
        "files",
        Part::bytes(b"binary".to_vec())
            .file_name("setup.exe")
            .mime_type("application/octet-stream"),
    );

    let response = server
        .post(&format!("/api/sessions/{session_id}/documents"))
        .multipart(form)
        .await;
    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert!(body["documents"].as_array().unwrap().is_empty());
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    assert!(body["errors"][0].as_str().unwrap().contains("unsupported"));
}

#[tokio::test]
async fn test_feedback_requires_topic() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());
    let session_id = register(&server).await;

    let response = server
        .post(&format!("/api/sessions/{session_id}/feedback"))
        .json(&json!({ "topic": "", "rating": 4, "difficulty": 3 }))
        .await;
    response.assert_status_bad_request();
    assert!(response.text().contains("topics discussed"));
}

#[tokio::test]
async fn test_feedback_appends_all_rows() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());
    let session_id = register(&server).await;

    let response = server
        .post(&format!("/api/sessions/{session_id}/feedback"))
        .json(&json!({
            "topic": "financial ratios",
            "rating": 5,
            "difficulty": 3,
            "comments": "more examples please",
        }))
        .await;
    response.assert_status_ok();

    let store = LogStore::open(dir.path()).unwrap();
    for kind in [
        LogKind::Feedback,
        LogKind::Topic,
        LogKind::Completion,
        LogKind::FeedbackTrends,
    ] {
        assert!(
            store.raw(kind).unwrap().is_some(),
            "{} should exist",
            kind.filename()
        );
    }
}

#[tokio::test]
async fn test_end_session_logs_duration_and_removes_session() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());
    let session_id = register(&server).await;

    let response = server
        .post(&format!("/api/sessions/{session_id}/end"))
        .await;
    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert!(body["usage_time_minutes"].as_f64().unwrap() >= 0.0);

    let store = LogStore::open(dir.path()).unwrap();
    let rows: Vec<RegistrationRecord> = store.read(LogKind::Registration).unwrap();
    assert_eq!(rows.len(), 2);

    // The session is gone.
    let response = server
        .post(&format!("/api/sessions/{session_id}/end"))
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_admin_requires_password() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());

    let response = server.get("/api/admin/overview").await;
    response.assert_status_unauthorized();

    let response = server
        .get("/api/admin/overview")
        .add_header("x-admin-password", "wrong")
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_admin_overview_and_usage() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());
    let session_id = register(&server).await;
    server
        .post(&format!("/api/sessions/{session_id}/end"))
        .await
        .assert_status_ok();

    let response = server
        .get("/api/admin/overview")
        .add_header("x-admin-password", ADMIN_PASSWORD)
        .await;
    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["overview"]["total_registrations"], 2);
    assert_eq!(body["overview"]["unique_students"], 1);
    assert_eq!(body["demographics"]["by_campus"][0]["label"], "Florham");

    let response = server
        .get("/api/admin/usage")
        .add_header("x-admin-password", ADMIN_PASSWORD)
        .await;
    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["weekly"].as_array().unwrap().len(), 7);
    assert_eq!(body["daily"][0]["registrations"], 2);
}

#[tokio::test]
async fn test_admin_accepts_bearer_token() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());

    let response = server
        .get("/api/admin/overview")
        .add_header("authorization", format!("Bearer {ADMIN_PASSWORD}"))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_admin_export_csv_and_workbook() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());
    register(&server).await;

    let response = server
        .get("/api/admin/export/registration")
        .add_header("x-admin-password", ADMIN_PASSWORD)
        .await;
    response.assert_status_ok();
    assert!(
        response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    assert!(response.text().contains("Ada Lovelace"));

    // Unknown log.
    let response = server
        .get("/api/admin/export/nonsense")
        .add_header("x-admin-password", ADMIN_PASSWORD)
        .await;
    response.assert_status_not_found();

    let response = server
        .get("/api/admin/export/workbook")
        .add_header("x-admin-password", ADMIN_PASSWORD)
        .await;
    response.assert_status_ok();
    // xlsx payloads are zip archives.
    assert_eq!(&response.as_bytes()[0..2], b"PK");
}

#[tokio::test]
async fn test_admin_clear_data() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());
    register(&server).await;

    let response = server
        .delete("/api/admin/data/registration")
        .add_header("x-admin-password", ADMIN_PASSWORD)
        .await;
    response.assert_status(axum::http::StatusCode::NO_CONTENT);

    // Clearing again: nothing left.
    let response = server
        .delete("/api/admin/data/registration")
        .add_header("x-admin-password", ADMIN_PASSWORD)
        .await;
    response.assert_status_not_found();

    register(&server).await;
    let response = server
        .delete("/api/admin/data")
        .add_header("x-admin-password", ADMIN_PASSWORD)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["removed"], 1);
}

#[tokio::test]
async fn test_admin_student_success() {
    let dir = TempDir::new().unwrap();
    let server = server(dir.path());
    let session_id = register(&server).await;
    server
        .post(&format!("/api/sessions/{session_id}/feedback"))
        .json(&json!({ "topic": "ratios", "rating": 5, "difficulty": 3 }))
        .await
        .assert_status_ok();
    server
        .post(&format!("/api/sessions/{session_id}/end"))
        .await
        .assert_status_ok();

    let response = server
        .get("/api/admin/students/Ada%20Lovelace/success")
        .add_header("x-admin-password", ADMIN_PASSWORD)
        .await;
    response.assert_status_ok();
    let body = response.json::<serde_json::Value>();
    assert_eq!(body["full_name"], "Ada Lovelace");
    assert!(body["success_probability"].as_f64().unwrap() >= 0.0);
    assert!(["Low", "Medium", "High"].contains(&body["risk_level"].as_str().unwrap()));

    let response = server
        .get("/api/admin/students/Nobody/success")
        .add_header("x-admin-password", ADMIN_PASSWORD)
        .await;
    response.assert_status_not_found();
}
