//! Text-to-speech narration
//!
//! - `engine`: the [`SpeechEngine`] seam and the command line implementation
//! - `narrator`: cancellable page-by-page playback

mod engine;
mod narrator;

pub use engine::{CommandSpeechEngine, SpeechEngine, VoiceSettings, MAX_RATE, MIN_RATE};
pub use narrator::{NarrationStatus, Narrator, PageText, PlaybackState};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Text-to-speech engine not available: {0}")]
    Unavailable(String),
    #[error("Speech engine failed: {0}")]
    Engine(String),
    #[error("No text to read. Please extract text from PDF first")]
    NoText,
    #[error("Nothing is being read")]
    NotPlaying,
}
