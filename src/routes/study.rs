//! Study routes: summaries, question generation and question export

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::download;
use super::extract::JsonBody;
use crate::analysis::{Question, QuestionRequest, SummaryReport};
use crate::error::{AppError, Result};
use crate::export::{questions_to_html, questions_to_txt, ExportFormat};
use crate::session::SessionId;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: SummaryReport,
}

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub success: bool,
    pub questions: Vec<Question>,
    pub total_questions: usize,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "json".to_string()
}

#[derive(Debug, Serialize)]
pub struct ExportJsonResponse {
    pub success: bool,
    pub questions: Vec<Question>,
    pub filename: String,
}

/// Summarize the session text. The session lock is released while a
/// model request is in flight, and the result is dropped if the document
/// changed meanwhile.
async fn summarize(
    State(state): State<AppState>,
    session_id: SessionId,
) -> Result<Json<SummarizeResponse>> {
    let session = state.sessions().get(&session_id);
    let (document_id, text) = session.write().await.ensure_text().await?;

    let report = state.summarizer().summarize(&text).await;
    tracing::info!(
        session = %session_id.0,
        method = ?report.method,
        key_points = report.key_points.len(),
        "Summarized document"
    );

    session.write().await.set_summary(document_id, report.clone());

    Ok(Json(SummarizeResponse {
        success: true,
        report,
    }))
}

async fn generate_questions(
    State(state): State<AppState>,
    session_id: SessionId,
    JsonBody(request): JsonBody<QuestionRequest>,
) -> Result<Json<QuestionsResponse>> {
    let plan = request.plan().map_err(AppError::BadRequest)?;

    let session = state.sessions().get(&session_id);
    let (document_id, text) = session.write().await.ensure_text().await?;

    let questions = state.question_generator().generate(&text, &plan).await;
    tracing::info!(
        session = %session_id.0,
        requested = plan.count,
        generated = questions.len(),
        "Generated questions"
    );

    session
        .write()
        .await
        .set_questions(document_id, questions.clone());

    Ok(Json(QuestionsResponse {
        success: true,
        total_questions: questions.len(),
        questions,
    }))
}

async fn export_questions(
    State(state): State<AppState>,
    session_id: SessionId,
    JsonBody(request): JsonBody<ExportRequest>,
) -> Result<Response> {
    let format: ExportFormat = request.format.parse()?;

    let session = state.sessions().get(&session_id);
    let questions = session.read().await.questions().to_vec();
    if questions.is_empty() {
        return Err(AppError::NoQuestions);
    }

    let file_name = format.file_name();
    match format {
        ExportFormat::Json => Ok(Json(ExportJsonResponse {
            success: true,
            questions,
            filename: file_name,
        })
        .into_response()),
        ExportFormat::Txt => download(
            questions_to_txt(&questions, Utc::now()),
            format.content_type(),
            &file_name,
        ),
        ExportFormat::Html => download(
            questions_to_html(&questions, Utc::now()),
            format.content_type(),
            &file_name,
        ),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summarize", post(summarize))
        .route("/generate-questions", post(generate_questions))
        .route("/export-questions", post(export_questions))
}
