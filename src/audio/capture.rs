//! Sample buffering for one capture attempt.
//!
//! Every frame that reaches the session worker lands here; when capture
//! stops the buffer is rendered into a single WAV clip for recognition.

use super::wav::encode_wav;
use anyhow::Result;

/// Why a capture ended, carried in the attempt metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopCause {
    /// VAD silence timeout fired.
    AutoSilence { tail_ms: u64 },
    /// The user asked to stop.
    Manual,
    /// Stopped during warm-up; the attempt is discarded.
    Cancelled,
    /// Hard duration ceiling reached.
    MaxDuration,
    /// The input stream went away.
    StreamClosed,
}

impl StopCause {
    pub fn label(&self) -> &'static str {
        match self {
            StopCause::AutoSilence { .. } => "auto_silence",
            StopCause::Manual => "manual",
            StopCause::Cancelled => "cancelled",
            StopCause::MaxDuration => "max_duration",
            StopCause::StreamClosed => "stream_closed",
        }
    }
}

/// Observability numbers for one capture, logged after every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureMetrics {
    pub capture_ms: u64,
    pub speech_ms: u64,
    pub silence_tail_ms: u64,
    pub frames_processed: usize,
    pub stop_cause: StopCause,
}

impl Default for CaptureMetrics {
    fn default() -> Self {
        Self {
            capture_ms: 0,
            speech_ms: 0,
            silence_tail_ms: 0,
            frames_processed: 0,
            stop_cause: StopCause::Manual,
        }
    }
}

/// Accumulates raw f32 samples for the duration of one capture.
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    samples: Vec<f32>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&mut self, frame: &[f32]) {
        self.samples.extend_from_slice(frame);
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Render the buffered audio as one WAV clip. An empty buffer encodes
    /// to a valid header-only file rather than an error.
    pub fn finish(self) -> Result<Vec<u8>> {
        encode_wav(&self.samples)
    }
}
