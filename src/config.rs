//! Configuration management for the PDF Study Server

use std::env;
use std::str::FromStr;

/// 16 MiB, matching the upload limit of the web client
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub render: RenderConfig,
    pub model: ModelConfig,
    pub speech: SpeechConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Zoom used for the first page after upload and when none is requested
    pub default_zoom: f32,
    /// Rendered pages kept per session
    pub page_cache_size: usize,
}

/// Optional hosted model endpoints (Hugging Face inference API shape)
#[derive(Debug, Clone, Default)]
pub struct ModelConfig {
    pub summary_url: Option<String>,
    pub generation_url: Option<String>,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub command: String,
    pub rate: u32,
    pub volume: f32,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sessions kept before the least recently used one is dropped
    pub max_sessions: usize,
    /// Seconds without a request before a session may be dropped; 0 disables
    pub idle_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            render: RenderConfig {
                default_zoom: 1.5,
                page_cache_size: 32,
            },
            model: ModelConfig {
                summary_url: None,
                generation_url: None,
                api_token: None,
                timeout_secs: 30,
            },
            speech: SpeechConfig {
                command: "espeak-ng".to_string(),
                rate: 150,
                volume: 0.9,
            },
            session: SessionConfig {
                max_sessions: 256,
                idle_timeout_secs: 3600,
            },
        }
    }
}

impl Config {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port),
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", defaults.server.max_upload_bytes),
            },
            render: RenderConfig {
                default_zoom: parse_var("DEFAULT_ZOOM", defaults.render.default_zoom),
                page_cache_size: parse_var("PAGE_CACHE_SIZE", defaults.render.page_cache_size),
            },
            model: ModelConfig {
                summary_url: non_empty_var("SUMMARY_MODEL_URL"),
                generation_url: non_empty_var("GENERATION_MODEL_URL"),
                api_token: non_empty_var("MODEL_API_TOKEN"),
                timeout_secs: parse_var("MODEL_TIMEOUT_SECS", defaults.model.timeout_secs),
            },
            speech: SpeechConfig {
                command: env::var("TTS_COMMAND").unwrap_or(defaults.speech.command),
                rate: parse_var("TTS_RATE", defaults.speech.rate),
                volume: parse_var("TTS_VOLUME", defaults.speech.volume),
            },
            session: SessionConfig {
                max_sessions: parse_var("MAX_SESSIONS", defaults.session.max_sessions),
                idle_timeout_secs: parse_var("SESSION_IDLE_SECS", defaults.session.idle_timeout_secs),
            },
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value '{}' for {}, using default {}", raw, name, default);
            default
        }),
        Err(_) => default,
    }
}
