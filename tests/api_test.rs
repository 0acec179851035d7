//! HTTP API tests

mod common;

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use serde_json::{json, Value};

use common::*;

const SESSION: HeaderName = HeaderName::from_static("x-session-id");

#[tokio::test]
async fn test_health() {
    let server = test_server();

    for path in ["/", "/health"] {
        let response = server.get(path).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "pdf-study-server");
        assert_eq!(body["speech_engine"], "recording");
    }
}

#[tokio::test]
async fn test_upload_returns_first_page() {
    let server = test_server();

    let response = server
        .post("/upload")
        .multipart(pdf_form(sample_pdf(), "rust.pdf"))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["filename"], "rust.pdf");
    assert_eq!(body["total_pages"], 3);
    assert_eq!(body["current_page"], 1);
    assert!(body["page_image"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_upload_rejects_non_pdf_name() {
    let server = test_server();

    let response = server
        .post("/upload")
        .multipart(pdf_form(sample_pdf(), "notes.txt"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Please upload a PDF file");
}

#[tokio::test]
async fn test_upload_rejects_corrupt_pdf() {
    let server = test_server();

    let response = server
        .post("/upload")
        .multipart(pdf_form(b"definitely not a pdf".to_vec(), "broken.pdf"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Error processing PDF"));
}

#[tokio::test]
async fn test_upload_over_limit_is_too_large() {
    let mut config = pdf_study_server::Config::default();
    config.server.max_upload_bytes = 1024;
    let server = test_server_with_config(config);

    let mut data = sample_pdf();
    data.resize(data.len() + 4096, b' ');
    let response = server.post("/upload").multipart(pdf_form(data, "big.pdf")).await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json();
    assert_eq!(body["error"], "File too large. Maximum size is 1 MB");

    // Nothing was loaded
    server.get("/page/1").await.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let server = test_server();

    let form = axum_test::multipart::MultipartForm::new().add_text("note", "hello");
    let response = server.post("/upload").multipart(form).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn test_requests_before_upload_fail() {
    let server = test_server();

    for path in ["/page/1", "/page/next", "/page/prev", "/extract-text"] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "No PDF loaded", "path {}", path);
    }

    let response = server.post("/summarize").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "No PDF loaded");
}

#[tokio::test]
async fn test_page_navigation() {
    let server = server_with_document().await;

    let body: Value = server.get("/page/2").await.json();
    assert_eq!(body["current_page"], 2);
    assert_eq!(body["total_pages"], 3);

    let body: Value = server.get("/page/next").await.json();
    assert_eq!(body["current_page"], 3);

    // Stays on the last page
    let body: Value = server.get("/page/next").await.json();
    assert_eq!(body["current_page"], 3);

    let body: Value = server.get("/page/prev").await.json();
    assert_eq!(body["current_page"], 2);

    let body: Value = server.get("/page/1").add_query_param("zoom", 2.0).await.json();
    assert_eq!(body["current_page"], 1);

    let body: Value = server.get("/page/prev").await.json();
    assert_eq!(body["current_page"], 1);
}

#[tokio::test]
async fn test_out_of_range_pages() {
    let server = server_with_document().await;

    for page in [0, 4] {
        let response = server.get(&format!("/page/{}", page)).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"], "Invalid page number");
    }

    // A failed jump leaves the current page alone
    let body: Value = server.get("/page/next").await.json();
    assert_eq!(body["current_page"], 2);
}

/// Assert a 400 carrying the JSON error body
fn assert_json_bad_request(response: &axum_test::TestResponse) -> String {
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    body["error"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_malformed_page_requests_return_json_errors() {
    let server = server_with_document().await;

    let error = assert_json_bad_request(&server.get("/page/abc").await);
    assert!(error.starts_with("Invalid URL"));

    let error = assert_json_bad_request(&server.get("/page/1").add_query_param("zoom", "abc").await);
    assert!(error.starts_with("Failed to deserialize query string"));

    // The session is untouched
    let body: Value = server.get("/page/next").await.json();
    assert_eq!(body["current_page"], 2);
}

#[tokio::test]
async fn test_malformed_bodies_return_json_errors() {
    let server = server_with_document().await;

    let error = assert_json_bad_request(
        &server
            .post("/generate-questions")
            .bytes("{types".into())
            .content_type("application/json")
            .await,
    );
    assert!(error.starts_with("Failed to parse the request body as JSON"));

    let error = assert_json_bad_request(
        &server
            .post("/generate-questions")
            .json(&json!({ "types": ["theory"], "count": -1 }))
            .await,
    );
    assert!(error.starts_with("Failed to deserialize the JSON body"));

    let error = assert_json_bad_request(&server.post("/export-questions").text("json").await);
    assert!(error.contains("Content-Type"));

    assert_json_bad_request(
        &server
            .put("/speech/settings")
            .json(&json!({ "rate": "fast" }))
            .await,
    );

    let error = assert_json_bad_request(
        &server
            .post("/save-text")
            .bytes("{text".into())
            .content_type("application/json")
            .await,
    );
    assert!(error.starts_with("Invalid JSON body"));

    assert_json_bad_request(&server.post("/speech/play").text("[1, 2").await);
}

#[tokio::test]
async fn test_summarize_with_model() {
    let mut config = pdf_study_server::Config::default();
    config.model.summary_url = Some(spawn_summary_model().await);
    let server = test_server_with_config(config);
    server
        .post("/upload")
        .multipart(pdf_form(sample_pdf(), "rust.pdf"))
        .await
        .assert_status_ok();

    let body: Value = server.post("/summarize").await.json();
    assert_eq!(body["method"], "model");
    assert_eq!(body["summary"], MODEL_SUMMARY);
    assert!(!body["key_points"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_extract_text_has_page_markers() {
    let server = server_with_document().await;

    let response = server.get("/extract-text").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let text = body["text"].as_str().unwrap();

    assert_eq!(body["total_pages"], 3);
    assert!(text.starts_with("\n--- Page 1 ---\n"));
    assert!(text.contains("--- Page 2 ---"));
    assert!(text.contains("--- Page 3 ---"));
    assert!(text.contains("ownership"));
    assert!(text.contains("borrow checker"));
}

#[tokio::test]
async fn test_textless_pdf_yields_only_markers() {
    let server = test_server();
    server
        .post("/upload")
        .multipart(pdf_form(build_pdf(&["", ""]), "blank.pdf"))
        .await
        .assert_status_ok();

    let body: Value = server.get("/extract-text").await.json();
    let text = body["text"].as_str().unwrap();
    let without_markers = text
        .replace("--- Page 1 ---", "")
        .replace("--- Page 2 ---", "");
    assert!(without_markers.trim().is_empty());

    let response = server.post("/summarize").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "No text to process. Please extract text first");
}

#[tokio::test]
async fn test_save_text_download() {
    let server = server_with_document().await;

    // Nothing extracted yet
    let response = server.post("/save-text").json(&json!({})).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    server.get("/extract-text").await.assert_status_ok();

    let response = server.post("/save-text").json(&json!({})).await;
    response.assert_status_ok();
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("extracted_text_rust.txt"));
    assert!(response.text().contains("--- Page 1 ---"));

    let response = server
        .post("/save-text")
        .json(&json!({ "text": "My own notes" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.text(), "My own notes");
}

#[tokio::test]
async fn test_summarize_extracts_on_demand() {
    let server = server_with_document().await;

    let response = server.post("/summarize").await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["success"], true);
    assert_eq!(body["method"], "extractive");
    assert!(!body["summary"].as_str().unwrap().is_empty());
    assert!(body["statistics"]["word_count"].as_u64().unwrap() > 0);
    assert!(body["statistics"]["sentence_count"].as_u64().unwrap() >= 3);

    let key_points = body["key_points"].as_array().unwrap();
    assert!(!key_points.is_empty() && key_points.len() <= 5);
}

#[tokio::test]
async fn test_generate_and_export_questions() {
    let server = server_with_document().await;

    // Nothing generated yet
    let response = server
        .post("/export-questions")
        .json(&json!({ "format": "json" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(
        body["error"],
        "No questions to export. Please generate questions first"
    );

    let response = server
        .post("/generate-questions")
        .json(&json!({ "types": ["multiple_choice", "theory"], "count": 3 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["total_questions"], 3);

    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions[0]["type"], "multiple_choice");
    assert_eq!(questions[1]["type"], "theory");
    assert_eq!(questions[2]["type"], "multiple_choice");
    assert_eq!(questions[0]["correct_answer"], "The main topic");
    assert_eq!(questions[0]["options"].as_array().unwrap().len(), 4);

    let body: Value = server
        .post("/export-questions")
        .json(&json!({ "format": "JSON" }))
        .await
        .json();
    assert_eq!(body["filename"], "questions.json");
    assert_eq!(body["questions"].as_array().unwrap().len(), 3);

    let response = server
        .post("/export-questions")
        .json(&json!({ "format": "txt" }))
        .await;
    response.assert_status_ok();
    assert!(response.text().contains("Question 1 (Multiple Choice)"));

    let response = server
        .post("/export-questions")
        .json(&json!({ "format": "html" }))
        .await;
    response.assert_status_ok();
    assert!(response.text().starts_with("<!DOCTYPE html>"));

    let response = server
        .post("/export-questions")
        .json(&json!({ "format": "docx" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_questions_validates_types() {
    let server = server_with_document().await;

    let response = server
        .post("/generate-questions")
        .json(&json!({ "types": [], "count": 3 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/generate-questions")
        .json(&json!({ "types": ["essay"] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cleanup_resets_session() {
    let server = server_with_document().await;

    let body: Value = server.get("/cleanup").await.json();
    assert_eq!(body["success"], true);

    let response = server.get("/page/1").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "No PDF loaded");
}

#[tokio::test]
async fn test_cleanup_forgets_session() {
    let (server, state) = test_app(
        pdf_study_server::Config::default(),
        std::sync::Arc::new(RecordingEngine::default()),
    );
    server
        .post("/upload")
        .multipart(pdf_form(sample_pdf(), "rust.pdf"))
        .await
        .assert_status_ok();
    server
        .get("/page/1")
        .add_header(SESSION, HeaderValue::from_static("other-tab"))
        .await;
    assert_eq!(state.sessions().len(), 2);

    server.get("/cleanup").await.assert_status_ok();
    assert_eq!(state.sessions().len(), 1);

    // Cleaning up an unknown session is still a success
    server
        .get("/cleanup")
        .add_header(SESSION, HeaderValue::from_static("never-seen"))
        .await
        .assert_status_ok();
    assert_eq!(state.sessions().len(), 1);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let server = server_with_document().await;

    let response = server
        .get("/page/1")
        .add_header(SESSION, HeaderValue::from_static("second-tab"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    server.get("/page/1").await.assert_status_ok();
}

#[tokio::test]
async fn test_narration_controls() {
    let server = server_with_document().await;

    let body: Value = server.get("/speech/status").await.json();
    assert_eq!(body["state"], "idle");

    let response = server.post("/speech/pause").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/speech/play")
        .json(&json!({ "rate": 200 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["state"], "playing");
    assert_eq!(body["rate"], 200);
    assert_eq!(body["total_sentences"], 3);

    let body: Value = server.post("/speech/pause").await.json();
    assert_eq!(body["state"], "paused");

    let body: Value = server.post("/speech/pause").await.json();
    assert_eq!(body["state"], "playing");

    let body: Value = server
        .put("/speech/settings")
        .json(&json!({ "volume": 0.5 }))
        .await
        .json();
    assert_eq!(body["volume"], 0.5);

    let body: Value = server.post("/speech/stop").await.json();
    assert_eq!(body["state"], "stopped");
}

#[tokio::test]
async fn test_narration_of_single_page_finishes() {
    let server = server_with_document().await;

    let response = server
        .post("/speech/play")
        .json(&json!({ "page": 2 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["page"], 2);
    assert_eq!(body["total_sentences"], 1);

    let mut state = Value::Null;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let body: Value = server.get("/speech/status").await.json();
        state = body["state"].clone();
        if state == "finished" {
            break;
        }
    }
    assert_eq!(state, "finished");

    let response = server
        .post("/speech/play")
        .json(&json!({ "page": 9 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let state = pdf_study_server::AppState::with_engine(
        pdf_study_server::Config::default(),
        std::sync::Arc::new(RecordingEngine::default()),
    );
    let app = pdf_study_server::build_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}
