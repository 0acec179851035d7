//! Opened document handle
//!
//! Wraps a [`PdfParser`] with an LRU cache of rendered pages and moves the
//! CPU-bound MuPDF calls onto the blocking thread pool.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tokio::time::{timeout, Duration};
use uuid::Uuid;

use super::parser::{PdfError, PdfParser};
use super::types::{clamp_zoom, ExtractedText, PdfInfo};

/// Timeout for opening a freshly uploaded PDF
const PARSE_TIMEOUT_SECS: u64 = 30;
/// Timeout for page rendering operations
const RENDER_TIMEOUT_SECS: u64 = 30;
/// Timeout for text extraction (whole document)
const TEXT_TIMEOUT_SECS: u64 = 15;

/// Cache key for rendered pages: (page, zoom * 100)
type PageKey = (usize, u32);

/// A PDF opened for one session
pub struct PdfDocument {
    id: Uuid,
    info: PdfInfo,
    parser: Arc<PdfParser>,
    page_cache: Mutex<LruCache<PageKey, Arc<Vec<u8>>>>,
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("id", &self.id)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Run a blocking MuPDF call with a deadline
async fn run_blocking<T, F>(secs: u64, f: F) -> Result<T, PdfError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PdfError> + Send + 'static,
{
    match timeout(Duration::from_secs(secs), tokio::task::spawn_blocking(f)).await {
        Ok(join_result) => {
            join_result.map_err(|e| PdfError::MuPdf(format!("Task join error: {}", e)))?
        }
        Err(_) => Err(PdfError::Timeout(secs)),
    }
}

impl PdfDocument {
    /// Parse uploaded bytes into an open document
    pub async fn open(data: Vec<u8>, name: String, cache_size: usize) -> Result<Self, PdfError> {
        let (parser, info) = run_blocking(PARSE_TIMEOUT_SECS, move || {
            let parser = PdfParser::from_bytes(data, name)?;
            let info = parser.info()?;
            Ok((parser, info))
        })
        .await?;

        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        let doc = Self {
            id: Uuid::new_v4(),
            info,
            parser: Arc::new(parser),
            page_cache: Mutex::new(LruCache::new(capacity)),
        };

        tracing::debug!(
            document_id = %doc.id,
            pages = doc.info.page_count,
            title = %doc.info.title,
            "Opened PDF"
        );

        Ok(doc)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn info(&self) -> &PdfInfo {
        &self.info
    }

    pub fn page_count(&self) -> usize {
        self.info.page_count
    }

    /// Render a page (1-indexed) as PNG, reusing cached renders
    pub async fn render_page(&self, page: usize, zoom: f32) -> Result<Arc<Vec<u8>>, PdfError> {
        if page < 1 || page > self.page_count() {
            return Err(PdfError::PageNotFound(page, self.page_count()));
        }

        let zoom = clamp_zoom(zoom);
        let key = (page, (zoom * 100.0).round() as u32);

        if let Some(png) = self.page_cache.lock().get(&key) {
            return Ok(png.clone());
        }

        let parser = self.parser.clone();
        let png = run_blocking(RENDER_TIMEOUT_SECS, move || parser.render_page(page, zoom)).await?;
        let png = Arc::new(png);

        self.page_cache.lock().put(key, png.clone());
        tracing::debug!(document_id = %self.id, page, zoom, bytes = png.len(), "Rendered page");

        Ok(png)
    }

    /// Extract text from every page
    pub async fn extract_text(&self) -> Result<ExtractedText, PdfError> {
        let parser = self.parser.clone();
        run_blocking(TEXT_TIMEOUT_SECS, move || parser.extract_text()).await
    }

    /// Number of cached renders
    pub fn cached_pages(&self) -> usize {
        self.page_cache.lock().len()
    }
}
