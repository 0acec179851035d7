//! PDF module
//!
//! Opening uploaded PDFs, rendering pages to PNG and extracting text via MuPDF.

mod document;
mod parser;
mod types;

pub use document::PdfDocument;
pub use parser::{PdfError, PdfParser};
pub use types::{clamp_zoom, page_marker, png_data_url, ExtractedText, PdfInfo, MAX_ZOOM, MIN_ZOOM};
