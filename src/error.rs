//! Error types for the PDF Study Server

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::analysis::ModelError;
use crate::pdf::PdfError;
use crate::speech::SpeechError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("No PDF loaded")]
    NoDocument,

    #[error("No file uploaded")]
    NoFile,

    #[error("No file selected")]
    NoFileName,

    #[error("Please upload a PDF file")]
    NotPdf,

    #[error("File too large. Maximum size is {limit_mb} MB")]
    TooLarge { limit_mb: usize },

    #[error("Invalid page number")]
    InvalidPage { page: usize, total: usize },

    #[error("No text to process. Please extract text first")]
    NoText,

    #[error("No questions to export. Please generate questions first")]
    NoQuestions,

    #[error("Invalid format '{0}'. Please use: json, txt, or html")]
    InvalidFormat(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{context}: {source}")]
    Pdf {
        context: &'static str,
        #[source]
        source: PdfError,
    },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Attach the operation being performed to a PDF failure
    pub fn pdf(context: &'static str, source: PdfError) -> Self {
        match source {
            PdfError::PageNotFound(page, total) => AppError::InvalidPage { page, total },
            source => AppError::Pdf { context, source },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NoDocument
            | AppError::NoFile
            | AppError::NoFileName
            | AppError::NotPdf
            | AppError::InvalidPage { .. }
            | AppError::NoText
            | AppError::NoQuestions
            | AppError::InvalidFormat(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Pdf { source: PdfError::Load(_), .. } => StatusCode::BAD_REQUEST,
            AppError::Speech(SpeechError::NotPlaying | SpeechError::NoText) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let details = match &self {
            AppError::InvalidPage { page, total } => Some(format!(
                "Page {} is out of range (valid range: 1-{})",
                page, total
            )),
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            details,
        });

        (status, body).into_response()
    }
}
