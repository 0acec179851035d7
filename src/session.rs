//! Per-client session state
//!
//! Each session holds the open document, the last extracted text, summary
//! and question list, and its own narrator. Sessions are keyed by the
//! `x-session-id` request header (`default` when absent). The store keeps
//! a bounded LRU of sessions and drops ones left idle too long.

use std::convert::Infallible;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use lru::LruCache;
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::analysis::{Question, SummaryReport};
use crate::config::SessionConfig;
use crate::error::{AppError, Result};
use crate::pdf::{clamp_zoom, ExtractedText, PdfDocument};
use crate::speech::{Narrator, PageText, SpeechEngine, VoiceSettings};

pub const SESSION_HEADER: &str = "x-session-id";
pub const DEFAULT_SESSION: &str = "default";
const MAX_SESSION_ID_LEN: usize = 64;

/// Session identifier taken from the request headers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    fn parse(raw: Option<&str>) -> Self {
        let id = raw
            .map(str::trim)
            .filter(|id| {
                !id.is_empty()
                    && id.len() <= MAX_SESSION_ID_LEN
                    && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            })
            .unwrap_or(DEFAULT_SESSION);
        SessionId(id.to_string())
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok());
        Ok(SessionId::parse(raw))
    }
}

/// State for one client
pub struct Session {
    document: Option<Arc<PdfDocument>>,
    filename: Option<String>,
    /// 0-indexed
    current_page: usize,
    zoom: f32,
    default_zoom: f32,
    extracted: Option<ExtractedText>,
    summary: Option<SummaryReport>,
    questions: Vec<Question>,
    upload_dir: Option<TempDir>,
    narrator: Narrator,
}

impl Session {
    pub fn new(narrator: Narrator, default_zoom: f32) -> Self {
        let default_zoom = clamp_zoom(default_zoom);
        Self {
            document: None,
            filename: None,
            current_page: 0,
            zoom: default_zoom,
            default_zoom,
            extracted: None,
            summary: None,
            questions: Vec::new(),
            upload_dir: None,
            narrator,
        }
    }

    /// Replace whatever was open with a freshly uploaded document
    pub fn load(&mut self, document: PdfDocument, filename: String, upload_dir: Option<TempDir>) {
        self.clear();
        tracing::info!(
            document_id = %document.id(),
            filename = %filename,
            pages = document.page_count(),
            "Loaded document into session"
        );
        self.document = Some(Arc::new(document));
        self.filename = Some(filename);
        self.upload_dir = upload_dir;
    }

    /// Release the document and reset every field
    pub fn clear(&mut self) {
        self.narrator.stop();

        if let Some(dir) = self.upload_dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!("Failed to remove upload directory {}: {}", path.display(), e);
            }
        }

        self.document = None;
        self.filename = None;
        self.current_page = 0;
        self.zoom = self.default_zoom;
        self.extracted = None;
        self.summary = None;
        self.questions.clear();
    }

    pub fn require_document(&self) -> Result<Arc<PdfDocument>> {
        self.document.clone().ok_or(AppError::NoDocument)
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn total_pages(&self) -> usize {
        self.document.as_ref().map_or(0, |d| d.page_count())
    }

    /// Current page, 1-indexed
    pub fn current_page(&self) -> usize {
        self.current_page + 1
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Move to a page (1-indexed), optionally changing the zoom
    pub fn go_to(&mut self, page: usize, zoom: Option<f32>) -> Result<()> {
        let total = self.require_document()?.page_count();
        if page < 1 || page > total {
            return Err(AppError::InvalidPage { page, total });
        }
        self.current_page = page - 1;
        if let Some(zoom) = zoom {
            self.zoom = clamp_zoom(zoom);
        }
        Ok(())
    }

    /// Next page number, staying on the last page at the end
    pub fn next_page(&self) -> Result<usize> {
        let total = self.require_document()?.page_count();
        Ok((self.current_page() + 1).min(total.max(1)))
    }

    /// Previous page number, staying on the first page at the start
    pub fn prev_page(&self) -> Result<usize> {
        self.require_document()?;
        Ok(self.current_page().saturating_sub(1).max(1))
    }

    pub fn extracted(&self) -> Option<&ExtractedText> {
        self.extracted.as_ref()
    }

    pub fn set_extracted(&mut self, extracted: ExtractedText) {
        self.extracted = Some(extracted);
    }

    /// Extracted text, pulling it from the document on first use. Returns
    /// the id of the document the text came from.
    pub async fn ensure_text(&mut self) -> Result<(Uuid, String)> {
        let document = self.require_document()?;
        if self.extracted.is_none() {
            let extracted = document
                .extract_text()
                .await
                .map_err(|e| AppError::pdf("Error extracting text", e))?;
            self.extracted = Some(extracted);
        }

        let text = self
            .extracted
            .as_ref()
            .map(|e| e.text.clone())
            .unwrap_or_default();

        if text_is_blank(&text) {
            return Err(AppError::NoText);
        }
        Ok((document.id(), text))
    }

    /// True while `document_id` is the open document
    fn is_current(&self, document_id: Uuid) -> bool {
        self.document.as_ref().is_some_and(|d| d.id() == document_id)
    }

    pub fn summary(&self) -> Option<&SummaryReport> {
        self.summary.as_ref()
    }

    /// Store a summary computed for `document_id`. Dropped when another
    /// document was opened (or none is) in the meantime.
    pub fn set_summary(&mut self, document_id: Uuid, summary: SummaryReport) -> bool {
        if !self.is_current(document_id) {
            tracing::debug!(document_id = %document_id, "Discarding summary for a closed document");
            return false;
        }
        self.summary = Some(summary);
        true
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Store questions generated for `document_id`, with the same rule as
    /// [`Session::set_summary`]
    pub fn set_questions(&mut self, document_id: Uuid, questions: Vec<Question>) -> bool {
        if !self.is_current(document_id) {
            tracing::debug!(document_id = %document_id, "Discarding questions for a closed document");
            return false;
        }
        self.questions = questions;
        true
    }

    pub fn narrator(&self) -> &Narrator {
        &self.narrator
    }

    pub fn narrator_mut(&mut self) -> &mut Narrator {
        &mut self.narrator
    }

    /// Pages to narrate: just `page` when given, otherwise the current page
    /// through the end of the document
    pub async fn narration_pages(&mut self, page: Option<usize>) -> Result<Vec<PageText>> {
        let total = self.require_document()?.page_count();
        if let Some(page) = page {
            if page < 1 || page > total {
                return Err(AppError::InvalidPage { page, total });
            }
        }

        if self.extracted.is_none() {
            self.ensure_text().await?;
        }
        let extracted = self.extracted.as_ref().ok_or(AppError::NoText)?;

        let range = match page {
            Some(page) => page..=page,
            None => self.current_page()..=total,
        };

        Ok(range
            .filter_map(|page| {
                extracted.pages.get(page - 1).map(|text| PageText {
                    page,
                    text: text.clone(),
                })
            })
            .collect())
    }
}

/// True when text holds nothing but page markers and whitespace
pub fn text_is_blank(text: &str) -> bool {
    crate::analysis::text::strip_page_markers(text).trim().is_empty()
}

struct SessionEntry {
    session: Arc<RwLock<Session>>,
    last_seen: Instant,
}

impl SessionEntry {
    /// Locked by a request or narrating
    fn is_busy(&self) -> bool {
        self.session
            .try_read()
            .map_or(true, |session| session.narrator().status().state.is_active())
    }
}

/// All sessions known to the server
pub struct SessionStore {
    sessions: Mutex<LruCache<SessionId, SessionEntry>>,
    engine: Arc<dyn SpeechEngine>,
    voice: VoiceSettings,
    default_zoom: f32,
    idle_timeout: Option<Duration>,
}

impl SessionStore {
    pub fn new(
        engine: Arc<dyn SpeechEngine>,
        voice: VoiceSettings,
        default_zoom: f32,
        limits: &SessionConfig,
    ) -> Self {
        let capacity = NonZeroUsize::new(limits.max_sessions).unwrap_or(NonZeroUsize::MIN);
        let idle_timeout =
            (limits.idle_timeout_secs > 0).then(|| Duration::from_secs(limits.idle_timeout_secs));

        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
            engine,
            voice,
            default_zoom,
            idle_timeout,
        }
    }

    /// Get a session, creating it on first use
    pub fn get(&self, id: &SessionId) -> Arc<RwLock<Session>> {
        let mut sessions = self.sessions.lock();
        if let Some(entry) = sessions.get_mut(id) {
            entry.last_seen = Instant::now();
            return entry.session.clone();
        }

        let mut dropped = self.evict_idle(&mut sessions);

        tracing::debug!(session = %id.0, "Creating session");
        let session = Arc::new(RwLock::new(Session::new(
            Narrator::new(self.engine.clone(), self.voice),
            self.default_zoom,
        )));
        let entry = SessionEntry {
            session: session.clone(),
            last_seen: Instant::now(),
        };
        if let Some((evicted, entry)) = sessions.push(id.clone(), entry) {
            tracing::info!(session = %evicted.0, "Evicted least recently used session");
            dropped.push(entry);
        }
        drop(sessions);

        // Upload directories are removed as the entries drop, outside the lock
        drop(dropped);
        session
    }

    /// Forget a session, returning it so the caller can release its document
    pub fn remove(&self, id: &SessionId) -> Option<Arc<RwLock<Session>>> {
        let entry = self.sessions.lock().pop(id)?;
        tracing::debug!(session = %id.0, "Removed session");
        Some(entry.session)
    }

    fn evict_idle(&self, sessions: &mut LruCache<SessionId, SessionEntry>) -> Vec<SessionEntry> {
        let Some(timeout) = self.idle_timeout else {
            return Vec::new();
        };

        let now = Instant::now();
        let idle: Vec<SessionId> = sessions
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_seen) >= timeout && !entry.is_busy())
            .map(|(id, _)| id.clone())
            .collect();

        idle.into_iter()
            .filter_map(|id| {
                tracing::info!(session = %id.0, "Evicted idle session");
                sessions.pop(&id)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
