//! Speech engines
//!
//! An engine speaks one sentence per call. Dropping the returned future must
//! abort the utterance so narration can be stopped mid-sentence.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use super::SpeechError;

pub const MIN_RATE: u32 = 50;
pub const MAX_RATE: u32 = 300;

/// Voice rate (words per minute) and volume (0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub rate: u32,
    pub volume: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            rate: 150,
            volume: 0.9,
        }
    }
}

impl VoiceSettings {
    pub fn new(rate: u32, volume: f32) -> Self {
        Self::default().with(Some(rate), Some(volume))
    }

    /// Apply optional overrides, clamping into the supported ranges
    pub fn with(self, rate: Option<u32>, volume: Option<f32>) -> Self {
        let volume = volume.unwrap_or(self.volume);
        Self {
            rate: rate.unwrap_or(self.rate).clamp(MIN_RATE, MAX_RATE),
            volume: if volume.is_finite() { volume.clamp(0.0, 1.0) } else { self.volume },
        }
    }
}

#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Speak a single sentence, returning once playback finished
    async fn speak(&self, sentence: &str, voice: &VoiceSettings) -> Result<(), SpeechError>;

    fn name(&self) -> &str;
}

/// Speaks through an eSpeak-compatible command line synthesizer
/// (`<command> -s <rate> -a <amplitude> <text>`)
pub struct CommandSpeechEngine {
    program: String,
}

impl CommandSpeechEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// eSpeak amplitude runs 0-200
    fn amplitude(volume: f32) -> u32 {
        (volume.clamp(0.0, 1.0) * 200.0).round() as u32
    }
}

#[async_trait]
impl SpeechEngine for CommandSpeechEngine {
    async fn speak(&self, sentence: &str, voice: &VoiceSettings) -> Result<(), SpeechError> {
        let status = Command::new(&self.program)
            .arg("-s")
            .arg(voice.rate.to_string())
            .arg("-a")
            .arg(Self::amplitude(voice.volume).to_string())
            .arg("--")
            .arg(sentence)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| SpeechError::Unavailable(format!("{}: {}", self.program, e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(SpeechError::Engine(format!("{} exited with {}", self.program, status)))
        }
    }

    fn name(&self) -> &str {
        &self.program
    }
}
