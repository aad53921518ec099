//! Default values for CLI flags, collected here so validation and help text
//! stay in sync.

pub const DEFAULT_RECOGNIZER_URL: &str = "http://127.0.0.1:8000/v1/audio/transcriptions";
pub const DEFAULT_RECOGNIZER_MODEL: &str = "whisper-1";
pub const DEFAULT_RECOGNIZER_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_SPEECH_THRESHOLD: f32 = 0.035;
pub const DEFAULT_SILENCE_TIMEOUT_MS: u64 = 4_000;
pub const DEFAULT_WARMUP_MS: u64 = 1_500;
pub const DEFAULT_MIN_CLIP_BYTES: usize = 1_024;
pub const DEFAULT_ADVANCE_BLOCK_THRESHOLD: usize = 3;
pub const DEFAULT_MAX_CAPTURE_MS: u64 = 120_000;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Hard ceiling on capture duration regardless of flags.
pub const MAX_CAPTURE_HARD_LIMIT_MS: u64 = 600_000;
