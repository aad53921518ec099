//! Command-line parsing and validation helpers.

mod defaults;
#[cfg(test)]
mod tests;
mod validation;

use clap::Parser;
use std::path::PathBuf;

pub use defaults::{
    DEFAULT_ADVANCE_BLOCK_THRESHOLD, DEFAULT_CHANNEL_CAPACITY, DEFAULT_MAX_CAPTURE_MS,
    DEFAULT_MIN_CLIP_BYTES, DEFAULT_RECOGNIZER_MODEL, DEFAULT_RECOGNIZER_TIMEOUT_MS,
    DEFAULT_RECOGNIZER_URL, DEFAULT_SILENCE_TIMEOUT_MS, DEFAULT_SPEECH_THRESHOLD,
    DEFAULT_WARMUP_MS, MAX_CAPTURE_HARD_LIMIT_MS,
};

/// CLI options for the recite practice session. Validated values keep the
/// capture pipeline and recognizer client within sane bounds.
#[derive(Debug, Parser, Clone)]
#[command(about = "Spoken reading practice with automatic scoring", author, version)]
pub struct AppConfig {
    /// Practice text given inline
    #[arg(long)]
    pub text: Option<String>,

    /// Read the practice text from a file
    #[arg(long = "text-file")]
    pub text_file: Option<PathBuf>,

    /// Preferred audio input device name
    #[arg(long)]
    pub input_device: Option<String>,

    /// Print detected audio input devices and exit
    #[arg(long = "list-input-devices", default_value_t = false)]
    pub list_input_devices: bool,

    /// Transcription endpoint (OpenAI-compatible)
    #[arg(long = "recognizer-url", default_value = DEFAULT_RECOGNIZER_URL)]
    pub recognizer_url: String,

    /// Model name sent to the transcription endpoint
    #[arg(long = "recognizer-model", default_value = DEFAULT_RECOGNIZER_MODEL)]
    pub recognizer_model: String,

    /// Bearer token for the transcription endpoint
    #[arg(long = "api-key", env = "RECITE_API_KEY")]
    pub api_key: Option<String>,

    /// Recognizer request timeout (milliseconds)
    #[arg(
        long = "recognizer-timeout-ms",
        default_value_t = DEFAULT_RECOGNIZER_TIMEOUT_MS
    )]
    pub recognizer_timeout_ms: u64,

    /// RMS energy above which a frame counts as speech
    #[arg(long = "speech-threshold", default_value_t = DEFAULT_SPEECH_THRESHOLD)]
    pub speech_threshold: f32,

    /// Trailing silence before capture stops automatically (milliseconds)
    #[arg(long = "silence-timeout-ms", default_value_t = DEFAULT_SILENCE_TIMEOUT_MS)]
    pub silence_timeout_ms: u64,

    /// Mic warm-up before an attempt starts counting (milliseconds)
    #[arg(long = "warmup-ms", default_value_t = DEFAULT_WARMUP_MS)]
    pub warmup_ms: u64,

    /// Clips smaller than this are discarded without recognition (bytes)
    #[arg(long = "min-clip-bytes", default_value_t = DEFAULT_MIN_CLIP_BYTES)]
    pub min_clip_bytes: usize,

    /// Missed words above this count block advancing to the next sentence
    #[arg(
        long = "advance-block-threshold",
        default_value_t = DEFAULT_ADVANCE_BLOCK_THRESHOLD
    )]
    pub advance_block_threshold: usize,

    /// Maximum capture duration before a hard stop (milliseconds)
    #[arg(long = "max-capture-ms", default_value_t = DEFAULT_MAX_CAPTURE_MS)]
    pub max_capture_ms: u64,

    /// Frame channel capacity between the device callback and the worker
    #[arg(long = "channel-capacity", default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    pub channel_capacity: usize,

    /// Enable file logging (debug)
    #[arg(long = "logs", env = "RECITE_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "RECITE_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Allow logging transcript snippets (debug log only)
    #[arg(long = "log-content", env = "RECITE_LOG_CONTENT", default_value_t = false)]
    pub log_content: bool,
}

/// Tunable parameters for the capture + scoring pipeline, snapshotted from
/// the CLI for downstream consumers.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub sample_rate: u32,
    pub frame_samples: usize,
    pub speech_threshold: f32,
    pub silence_timeout_ms: u64,
    pub warmup_ms: u64,
    pub min_clip_bytes: usize,
    pub advance_block_threshold: usize,
    pub max_capture_ms: u64,
    pub channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: crate::audio::TARGET_RATE,
            frame_samples: crate::audio::FRAME_SAMPLES,
            speech_threshold: DEFAULT_SPEECH_THRESHOLD,
            silence_timeout_ms: DEFAULT_SILENCE_TIMEOUT_MS,
            warmup_ms: DEFAULT_WARMUP_MS,
            min_clip_bytes: DEFAULT_MIN_CLIP_BYTES,
            advance_block_threshold: DEFAULT_ADVANCE_BLOCK_THRESHOLD,
            max_capture_ms: DEFAULT_MAX_CAPTURE_MS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}
