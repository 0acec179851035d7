//! Document routes: upload, page navigation, text extraction and cleanup

use std::path::Path;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use super::download;
use super::extract::{OptionalJson, PathParam, QueryParams};
use crate::error::{AppError, Result};
use crate::export::text_file_name;
use crate::pdf::{png_data_url, PdfDocument};
use crate::session::{text_is_blank, Session, SessionId};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    pub title: String,
    pub total_pages: usize,
    pub current_page: usize,
    pub page_image: String,
}

#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub success: bool,
    pub page_image: String,
    pub current_page: usize,
    pub total_pages: usize,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub zoom: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub success: bool,
    pub text: String,
    pub total_pages: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveTextRequest {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub success: bool,
}

fn multipart_error(e: MultipartError, limit: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::TooLarge {
            limit_mb: limit.div_ceil(1024 * 1024),
        }
    } else {
        AppError::BadRequest(format!("Failed to read upload: {}", e.body_text()))
    }
}

/// Keep only the final path component of a client supplied name
fn sanitize_file_name(name: &str) -> Option<String> {
    Path::new(name.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

/// Upload a PDF and render its first page
async fn upload(
    State(state): State<AppState>,
    session_id: SessionId,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let limit = state.config().server.max_upload_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != "file" && name != "pdf" {
            tracing::debug!(field = %name, "Skipping multipart field");
            continue;
        }

        let filename = field
            .file_name()
            .and_then(sanitize_file_name)
            .ok_or(AppError::NoFileName)?;
        if !filename.to_lowercase().ends_with(".pdf") {
            return Err(AppError::NotPdf);
        }

        let data = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
        tracing::debug!(filename = %filename, bytes = data.len(), "Received upload");

        let upload_dir = TempDir::new()?;
        tokio::fs::write(upload_dir.path().join(&filename), &data).await?;

        let document = PdfDocument::open(
            data.to_vec(),
            filename.clone(),
            state.config().render.page_cache_size,
        )
        .await
        .map_err(|e| AppError::pdf("Error processing PDF", e))?;

        let session = state.sessions().get(&session_id);
        let mut session = session.write().await;
        session.load(document, filename.clone(), Some(upload_dir));

        let page = render_current(&session).await?;
        let title = session.require_document()?.info().title.clone();

        return Ok(Json(UploadResponse {
            success: true,
            filename,
            title,
            total_pages: page.total_pages,
            current_page: page.current_page,
            page_image: page.page_image,
        }));
    }

    tracing::warn!("No file field found in multipart upload");
    Err(AppError::NoFile)
}

/// Render the session's current page at the session zoom
async fn render_current(session: &Session) -> Result<PageResponse> {
    let document = session.require_document()?;
    let png = document
        .render_page(session.current_page(), session.zoom())
        .await
        .map_err(|e| AppError::pdf("Error loading page", e))?;

    Ok(PageResponse {
        success: true,
        page_image: png_data_url(&png),
        current_page: session.current_page(),
        total_pages: document.page_count(),
    })
}

/// Render a specific page (1-indexed)
async fn get_page(
    State(state): State<AppState>,
    session_id: SessionId,
    PathParam(page): PathParam<usize>,
    QueryParams(query): QueryParams<PageQuery>,
) -> Result<Json<PageResponse>> {
    let session = state.sessions().get(&session_id);
    let mut session = session.write().await;
    session.go_to(page, query.zoom)?;
    Ok(Json(render_current(&session).await?))
}

async fn next_page(
    State(state): State<AppState>,
    session_id: SessionId,
) -> Result<Json<PageResponse>> {
    let session = state.sessions().get(&session_id);
    let mut session = session.write().await;
    let page = session.next_page()?;
    session.go_to(page, None)?;
    Ok(Json(render_current(&session).await?))
}

async fn prev_page(
    State(state): State<AppState>,
    session_id: SessionId,
) -> Result<Json<PageResponse>> {
    let session = state.sessions().get(&session_id);
    let mut session = session.write().await;
    let page = session.prev_page()?;
    session.go_to(page, None)?;
    Ok(Json(render_current(&session).await?))
}

/// Extract text from every page, replacing any earlier extraction
async fn extract_text(
    State(state): State<AppState>,
    session_id: SessionId,
) -> Result<Json<TextResponse>> {
    let session = state.sessions().get(&session_id);
    let mut session = session.write().await;
    let document = session.require_document()?;

    let extracted = document
        .extract_text()
        .await
        .map_err(|e| AppError::pdf("Error extracting text", e))?;

    tracing::info!(
        document_id = %document.id(),
        chars = extracted.text.len(),
        "Extracted document text"
    );

    let text = extracted.text.clone();
    session.set_extracted(extracted);

    Ok(Json(TextResponse {
        success: true,
        text,
        total_pages: document.page_count(),
    }))
}

/// Download text as a `.txt` file, defaulting to the extracted text
async fn save_text(
    State(state): State<AppState>,
    session_id: SessionId,
    OptionalJson(request): OptionalJson<SaveTextRequest>,
) -> Result<Response> {
    let session = state.sessions().get(&session_id);
    let session = session.read().await;

    let text = match request.text {
        Some(text) => text,
        None => session
            .extracted()
            .map(|e| e.text.clone())
            .unwrap_or_default(),
    };
    if text_is_blank(&text) {
        return Err(AppError::NoText);
    }

    let file_name = text_file_name(session.filename());
    download(text, "text/plain; charset=utf-8", &file_name)
}

/// Release the open document and forget the session
async fn cleanup(
    State(state): State<AppState>,
    session_id: SessionId,
) -> Json<CleanupResponse> {
    if let Some(session) = state.sessions().remove(&session_id) {
        session.write().await.clear();
    }
    tracing::info!(session = %session_id.0, "Session cleaned up");
    Json(CleanupResponse { success: true })
}

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/page/next", get(next_page))
        .route("/page/prev", get(prev_page))
        .route("/page/:page", get(get_page))
        .route("/extract-text", get(extract_text))
        .route("/save-text", post(save_text))
        .route("/cleanup", get(cleanup))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
