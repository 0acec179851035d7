//! Application state management

use std::sync::Arc;

use crate::analysis::{ModelClient, QuestionGenerator, Summarizer};
use crate::config::Config;
use crate::session::SessionStore;
use crate::speech::{CommandSpeechEngine, SpeechEngine, VoiceSettings};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    sessions: SessionStore,
    summarizer: Summarizer,
    questions: QuestionGenerator,
    engine_name: String,
}

impl AppState {
    /// Create state with the configured command line speech engine
    pub fn new(config: Config) -> Self {
        let engine = Arc::new(CommandSpeechEngine::new(config.speech.command.clone()));
        Self::with_engine(config, engine)
    }

    /// Create state around a specific speech engine
    pub fn with_engine(config: Config, engine: Arc<dyn SpeechEngine>) -> Self {
        let model = ModelClient::new(&config.model);
        let voice = VoiceSettings::new(config.speech.rate, config.speech.volume);
        let engine_name = engine.name().to_string();

        tracing::info!(
            summary_model = model.has_summary_model(),
            generation_model = model.has_generation_model(),
            speech_engine = %engine_name,
            "Initialized application state"
        );

        Self {
            inner: Arc::new(AppStateInner {
                sessions: SessionStore::new(
                    engine,
                    voice,
                    config.render.default_zoom,
                    &config.session,
                ),
                summarizer: Summarizer::new(model.clone()),
                questions: QuestionGenerator::new(model),
                engine_name,
                config,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.inner.summarizer
    }

    pub fn question_generator(&self) -> &QuestionGenerator {
        &self.inner.questions
    }

    /// Name of the speech engine in use
    pub fn speech_engine(&self) -> &str {
        &self.inner.engine_name
    }
}
