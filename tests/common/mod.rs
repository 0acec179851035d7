//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{routing::post, Json, Router};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use parking_lot::Mutex;
use serde_json::{json, Value};

use pdf_study_server::speech::{SpeechEngine, SpeechError, VoiceSettings};
use pdf_study_server::{build_router, AppState, Config};

pub const PAGE_TEXTS: [&str; 3] = [
    "Rust ownership rules are important for memory safety.",
    "The borrow checker is the key part of the compiler.",
    "What makes Rust fast is the design of zero cost abstractions.",
];

/// Build a minimal PDF with one Helvetica text line per page.
/// An empty string produces a page without any text.
pub fn build_pdf(pages: &[&str]) -> Vec<u8> {
    let page_count = pages.len();
    let mut objects: Vec<String> = Vec::new();

    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    let kids: Vec<String> = (0..page_count)
        .map(|i| format!("{} 0 R", 4 + i * 2))
        .collect();
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        page_count
    ));
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());

    for (i, text) in pages.iter().enumerate() {
        let content_id = 5 + i * 2;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            content_id
        ));

        let content = if text.is_empty() {
            String::new()
        } else {
            let escaped = text
                .replace('\\', "\\\\")
                .replace('(', "\\(")
                .replace(')', "\\)");
            format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", escaped)
        };
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref_offset = out.len();
    out.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    out.push_str("0000000000 65535 f \n");
    for offset in offsets {
        out.push_str(&format!("{:010} 00000 n \n", offset));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));

    out.into_bytes()
}

pub fn sample_pdf() -> Vec<u8> {
    build_pdf(&PAGE_TEXTS)
}

pub fn pdf_form(data: Vec<u8>, file_name: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(data)
            .file_name(file_name)
            .mime_type("application/pdf"),
    )
}

/// Records spoken sentences, taking a little time per sentence
#[derive(Default)]
pub struct RecordingEngine {
    pub spoken: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechEngine for RecordingEngine {
    async fn speak(&self, sentence: &str, _voice: &VoiceSettings) -> Result<(), SpeechError> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        self.spoken.lock().push(sentence.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

pub fn test_server() -> TestServer {
    test_server_with_engine(Arc::new(RecordingEngine::default()))
}

pub fn test_server_with_engine(engine: Arc<dyn SpeechEngine>) -> TestServer {
    test_app(Config::default(), engine).0
}

pub fn test_server_with_config(config: Config) -> TestServer {
    test_app(config, Arc::new(RecordingEngine::default())).0
}

/// Test server plus a handle on the state it serves
pub fn test_app(config: Config, engine: Arc<dyn SpeechEngine>) -> (TestServer, AppState) {
    let state = AppState::with_engine(config, engine);
    let server = TestServer::new(build_router(state.clone())).expect("failed to start test server");
    (server, state)
}

pub const MODEL_SUMMARY: &str = "Rust pairs ownership with a borrow checker.";

/// Serve a summary endpoint on a local port and return its URL
pub async fn spawn_summary_model() -> String {
    let app = Router::new().route(
        "/summarize",
        post(|Json(_body): Json<Value>| async { Json(json!([{ "summary_text": MODEL_SUMMARY }])) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{}/summarize", addr)
}

/// Test server with the sample document already uploaded
pub async fn server_with_document() -> TestServer {
    let server = test_server();
    server
        .post("/upload")
        .multipart(pdf_form(sample_pdf(), "rust.pdf"))
        .await
        .assert_status_ok();
    server
}
