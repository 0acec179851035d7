//! PDF parsing using MuPDF
//!
//! Page rendering and text extraction for uploaded documents.
//! MuPDF's fz_context is not thread-safe, so every operation opens a fresh
//! document from the owned bytes instead of sharing one handle.

use std::io::Cursor;

use mupdf::{Colorspace, Document, Matrix, MetadataName};
use thiserror::Error;

use super::types::{clamp_zoom, ExtractedText, PdfInfo};

const PDF_MIME: &str = "application/pdf";

/// PDF parsing errors
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to load PDF: {0}")]
    Load(String),
    #[error("Failed to render page: {0}")]
    Render(String),
    #[error("Page {0} not found (document has {1} pages)")]
    PageNotFound(usize, usize),
    #[error("Failed to extract text: {0}")]
    Text(String),
    #[error("Image encoding error: {0}")]
    Image(String),
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),
    #[error("MuPDF error: {0}")]
    MuPdf(String),
}

impl From<mupdf::Error> for PdfError {
    fn from(e: mupdf::Error) -> Self {
        PdfError::MuPdf(e.to_string())
    }
}

/// MuPDF-backed parser over an owned copy of the document bytes
pub struct PdfParser {
    data: Vec<u8>,
    /// Name used when the document has no title
    name: String,
    page_count: usize,
}

impl PdfParser {
    /// Validate the bytes open as a PDF and record the page count
    pub fn from_bytes(data: Vec<u8>, name: String) -> Result<Self, PdfError> {
        let doc = Document::from_bytes(&data, PDF_MIME).map_err(|e| PdfError::Load(e.to_string()))?;
        let page_count = doc.page_count().map_err(|e| PdfError::Load(e.to_string()))?;

        Ok(Self {
            data,
            name,
            page_count: page_count.max(0) as usize,
        })
    }

    fn open_document(&self) -> Result<Document, PdfError> {
        Document::from_bytes(&self.data, PDF_MIME).map_err(Into::into)
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Validate page number (1-indexed)
    fn validate_page_num(&self, page_num: usize) -> Result<(), PdfError> {
        if page_num < 1 || page_num > self.page_count {
            return Err(PdfError::PageNotFound(page_num, self.page_count));
        }
        Ok(())
    }

    /// Title and author from the info dictionary
    pub fn info(&self) -> Result<PdfInfo, PdfError> {
        let doc = self.open_document()?;
        let get_meta = |name: MetadataName| -> Option<String> {
            doc.metadata(name).ok().filter(|s| !s.trim().is_empty())
        };

        Ok(PdfInfo {
            title: get_meta(MetadataName::Title).unwrap_or_else(|| self.name.clone()),
            author: get_meta(MetadataName::Author),
            page_count: self.page_count,
        })
    }

    /// Render a page (1-indexed) to PNG bytes
    pub fn render_page(&self, page_num: usize, zoom: f32) -> Result<Vec<u8>, PdfError> {
        self.validate_page_num(page_num)?;

        let doc = self.open_document()?;
        let page = doc.load_page((page_num - 1) as i32)?;

        let zoom = clamp_zoom(zoom);
        let matrix = Matrix::new_scale(zoom, zoom);
        let colorspace = Colorspace::device_rgb();
        let pixmap = page
            .to_pixmap(&matrix, &colorspace, false, true)
            .map_err(|e| PdfError::Render(e.to_string()))?;

        encode_png(&pixmap)
    }

    /// Plain text of a single page (1-indexed)
    pub fn page_text(&self, page_num: usize) -> Result<String, PdfError> {
        self.validate_page_num(page_num)?;

        let doc = self.open_document()?;
        let page = doc.load_page((page_num - 1) as i32)?;
        page.to_text().map_err(|e| PdfError::Text(e.to_string()))
    }

    /// Text of every page, joined with page markers
    pub fn extract_text(&self) -> Result<ExtractedText, PdfError> {
        let doc = self.open_document()?;
        let mut pages = Vec::with_capacity(self.page_count);

        for index in 0..self.page_count {
            let page = doc.load_page(index as i32)?;
            pages.push(page.to_text().map_err(|e| PdfError::Text(e.to_string()))?);
        }

        Ok(ExtractedText::from_pages(pages))
    }
}

/// Encode an RGB(A) pixmap as PNG
fn encode_png(pixmap: &mupdf::Pixmap) -> Result<Vec<u8>, PdfError> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize; // components per pixel

    let pixel_count = width as usize * height as usize;

    let mut rgb_buffer = Vec::with_capacity(pixel_count * 3);
    for pixel in samples.chunks_exact(n.max(1)).take(pixel_count) {
        let r = pixel.first().copied().unwrap_or(0);
        let g = pixel.get(1).copied().unwrap_or(r);
        let b = pixel.get(2).copied().unwrap_or(r);
        rgb_buffer.extend_from_slice(&[r, g, b]);
    }

    let img = image::RgbImage::from_raw(width, height, rgb_buffer)
        .ok_or_else(|| PdfError::Image("Failed to create image buffer".to_string()))?;

    let mut output = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .map_err(|e| PdfError::Image(e.to_string()))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_load_error() {
        let result = PdfParser::from_bytes(b"definitely not a pdf".to_vec(), "junk".into());
        assert!(matches!(result, Err(PdfError::Load(_))));
    }

    #[test]
    fn test_validate_page_num() {
        let parser = PdfParser {
            data: Vec::new(),
            name: "empty".into(),
            page_count: 3,
        };
        assert!(parser.validate_page_num(1).is_ok());
        assert!(parser.validate_page_num(3).is_ok());
        assert!(matches!(parser.validate_page_num(0), Err(PdfError::PageNotFound(0, 3))));
        assert!(matches!(parser.validate_page_num(4), Err(PdfError::PageNotFound(4, 3))));
    }
}
