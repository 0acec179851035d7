//! PDF data types

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

/// Smallest zoom factor a page can be rendered at
pub const MIN_ZOOM: f32 = 0.3;
/// Largest zoom factor a page can be rendered at
pub const MAX_ZOOM: f32 = 3.0;

/// Basic facts about an opened PDF
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfInfo {
    /// Document title (falls back to the file name)
    pub title: String,
    pub author: Option<String>,
    pub page_count: usize,
}

/// Text pulled out of every page of a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    /// All pages joined with `--- Page n ---` markers
    pub text: String,
    /// Raw text per page (index 0 = page 1)
    pub pages: Vec<String>,
}

impl ExtractedText {
    /// Join per-page text, prefixing each page with its marker.
    /// Pages without text still get a marker.
    pub fn from_pages(pages: Vec<String>) -> Self {
        let mut text = String::new();
        for (index, page) in pages.iter().enumerate() {
            text.push('\n');
            text.push_str(&page_marker(index + 1));
            text.push('\n');
            text.push_str(page);
            text.push('\n');
        }
        Self { text, pages }
    }
}

/// Marker line placed before each page's text
pub fn page_marker(page: usize) -> String {
    format!("--- Page {} ---", page)
}

/// Encode PNG bytes for direct use in an `<img src>`
pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png))
}

/// Clamp a requested zoom into the renderable range
pub fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_finite() {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        1.0
    }
}
