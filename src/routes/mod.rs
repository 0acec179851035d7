//! Route modules for the PDF Study Server

pub mod document;
mod extract;
pub mod health;
pub mod speech;
pub mod study;

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};

use crate::error::{AppError, Result};
use crate::export::attachment_header;

/// Build a file download response
pub(crate) fn download(body: impl Into<Body>, content_type: &str, file_name: &str) -> Result<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, attachment_header(file_name))
        .body(body.into())
        .map_err(|e| AppError::Internal(format!("Failed to build download response: {}", e)))
}
