//! Page-by-page narration
//!
//! One background task per narration reads sentences through a
//! [`SpeechEngine`]. The task is driven by a `watch` channel carrying the
//! latest [`PlaybackCommand`]; changes are observed between sentences and
//! while an utterance is in flight (the utterance is dropped on pause/stop,
//! and a paused sentence is repeated on resume).

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::engine::{SpeechEngine, VoiceSettings};
use super::SpeechError;
use crate::analysis::text::speech_sentences;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Stopped,
    Finished,
    Failed,
}

impl PlaybackState {
    pub fn is_active(&self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }
}

/// Snapshot of narration progress
#[derive(Debug, Clone, Serialize)]
pub struct NarrationStatus {
    pub state: PlaybackState,
    /// Page being read (1-indexed)
    pub page: Option<usize>,
    /// Sentence being read (1-indexed) out of `total_sentences`
    pub sentence: usize,
    pub total_sentences: usize,
    pub rate: u32,
    pub volume: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Text of one page queued for narration
#[derive(Debug, Clone)]
pub struct PageText {
    pub page: usize,
    pub text: String,
}

#[derive(Debug, Clone)]
struct Utterance {
    page: usize,
    text: String,
}

#[derive(Debug)]
struct Progress {
    state: PlaybackState,
    page: Option<usize>,
    sentence: usize,
    total_sentences: usize,
    error: Option<String>,
}

type SharedProgress = Arc<RwLock<Progress>>;
type SharedVoice = Arc<RwLock<VoiceSettings>>;

/// Narration controller owned by a session
pub struct Narrator {
    engine: Arc<dyn SpeechEngine>,
    voice: SharedVoice,
    progress: SharedProgress,
    control: Option<watch::Sender<PlaybackCommand>>,
    task: Option<JoinHandle<()>>,
}

impl Narrator {
    pub fn new(engine: Arc<dyn SpeechEngine>, voice: VoiceSettings) -> Self {
        Self {
            engine,
            voice: Arc::new(RwLock::new(voice)),
            progress: Arc::new(RwLock::new(Progress {
                state: PlaybackState::Idle,
                page: None,
                sentence: 0,
                total_sentences: 0,
                error: None,
            })),
            control: None,
            task: None,
        }
    }

    pub fn status(&self) -> NarrationStatus {
        let progress = self.progress.read();
        let voice = *self.voice.read();
        NarrationStatus {
            state: progress.state,
            page: progress.page,
            sentence: progress.sentence,
            total_sentences: progress.total_sentences,
            rate: voice.rate,
            volume: voice.volume,
            error: progress.error.clone(),
        }
    }

    /// Change rate/volume; takes effect from the next sentence
    pub fn update_voice(&self, rate: Option<u32>, volume: Option<f32>) -> NarrationStatus {
        {
            let mut voice = self.voice.write();
            *voice = voice.with(rate, volume);
        }
        self.status()
    }

    /// Start reading `pages`. A narration that is already playing or paused
    /// is left untouched.
    pub fn start(&mut self, pages: Vec<PageText>) -> Result<NarrationStatus, SpeechError> {
        if self.progress.read().state.is_active() {
            return Ok(self.status());
        }

        let utterances: Vec<Utterance> = pages
            .into_iter()
            .flat_map(|PageText { page, text }| {
                speech_sentences(&text)
                    .into_iter()
                    .map(move |text| Utterance { page, text })
            })
            .collect();

        if utterances.is_empty() {
            return Err(SpeechError::NoText);
        }

        self.shutdown();

        // Fresh progress so a cancelled task cannot overwrite the new run
        self.progress = Arc::new(RwLock::new(Progress {
            state: PlaybackState::Playing,
            page: Some(utterances[0].page),
            sentence: 0,
            total_sentences: utterances.len(),
            error: None,
        }));

        let (tx, rx) = watch::channel(PlaybackCommand::Play);
        tracing::info!(
            engine = self.engine.name(),
            sentences = utterances.len(),
            "Starting narration"
        );

        self.task = Some(tokio::spawn(run_narration(
            self.engine.clone(),
            utterances,
            rx,
            self.progress.clone(),
            self.voice.clone(),
        )));
        self.control = Some(tx);

        Ok(self.status())
    }

    /// Pause a playing narration or resume a paused one
    pub fn toggle_pause(&mut self) -> Result<NarrationStatus, SpeechError> {
        let state = self.progress.read().state;
        match state {
            PlaybackState::Playing => self.send(PlaybackCommand::Pause, PlaybackState::Paused),
            PlaybackState::Paused => self.send(PlaybackCommand::Play, PlaybackState::Playing),
            _ => return Err(SpeechError::NotPlaying),
        }
        Ok(self.status())
    }

    /// Stop narration; a no-op when nothing is playing
    pub fn stop(&mut self) -> NarrationStatus {
        if self.progress.read().state.is_active() {
            self.send(PlaybackCommand::Stop, PlaybackState::Stopped);
            tracing::info!("Narration stopped");
        }
        self.status()
    }

    fn send(&self, command: PlaybackCommand, state: PlaybackState) {
        if let Some(control) = &self.control {
            if control.send(command).is_ok() {
                self.progress.write().state = state;
            }
        }
    }

    /// Cancel any previous narration task
    fn shutdown(&mut self) {
        if let Some(control) = self.control.take() {
            let _ = control.send(PlaybackCommand::Stop);
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Narrator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Block while paused. Returns false once narration should end.
async fn wait_until_playing(
    control: &mut watch::Receiver<PlaybackCommand>,
    progress: &SharedProgress,
) -> bool {
    loop {
        if control.has_changed().is_err() {
            return false;
        }
        let command = *control.borrow_and_update();
        match command {
            PlaybackCommand::Play => return true,
            PlaybackCommand::Stop => return false,
            PlaybackCommand::Pause => {
                progress.write().state = PlaybackState::Paused;
                if control.changed().await.is_err() {
                    return false;
                }
            }
        }
    }
}

async fn run_narration(
    engine: Arc<dyn SpeechEngine>,
    utterances: Vec<Utterance>,
    mut control: watch::Receiver<PlaybackCommand>,
    progress: SharedProgress,
    voice: SharedVoice,
) {
    let mut index = 0;

    while index < utterances.len() {
        if !wait_until_playing(&mut control, &progress).await {
            progress.write().state = PlaybackState::Stopped;
            return;
        }

        let utterance = &utterances[index];
        {
            let mut progress = progress.write();
            progress.state = PlaybackState::Playing;
            progress.page = Some(utterance.page);
            progress.sentence = index + 1;
        }

        let settings = *voice.read();
        let outcome = tokio::select! {
            result = engine.speak(&utterance.text, &settings) => Some(result),
            _ = control.changed() => None,
        };

        match outcome {
            Some(Ok(())) => index += 1,
            Some(Err(e)) => {
                tracing::warn!(page = utterance.page, "Narration failed: {}", e);
                let mut progress = progress.write();
                progress.state = PlaybackState::Failed;
                progress.error = Some(e.to_string());
                return;
            }
            // Command changed mid-utterance; re-check before repeating it
            None => continue,
        }
    }

    let mut progress = progress.write();
    // A stop that raced the last sentence keeps its state
    if progress.state == PlaybackState::Playing {
        progress.state = PlaybackState::Finished;
        tracing::debug!(sentences = utterances.len(), "Narration finished");
    }
}
