//! Energy-based voice activity detection.
//!
//! Classifies each audio frame as speech or silence by RMS energy and tracks
//! how long the learner has been quiet. Once the silence run exceeds the
//! configured timeout the frame carries a one-shot auto-stop signal.

use super::samples_to_ms;
use crate::config::EngineConfig;

/// Tuning for the per-frame VAD.
#[derive(Debug, Clone)]
pub struct VadConfig {
    pub sample_rate: u32,
    /// RMS above this counts as speech. Deliberately above naive noise-floor
    /// thresholds so coughs and room noise do not reset the silence clock.
    pub speech_threshold: f32,
    /// Silence run that triggers auto-stop.
    pub silence_timeout_ms: u64,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            sample_rate: super::TARGET_RATE,
            speech_threshold: 0.035,
            silence_timeout_ms: 4_000,
        }
    }
}

impl From<&EngineConfig> for VadConfig {
    fn from(cfg: &EngineConfig) -> Self {
        Self {
            sample_rate: cfg.sample_rate,
            speech_threshold: cfg.speech_threshold,
            silence_timeout_ms: cfg.silence_timeout_ms,
        }
    }
}

/// Per-frame VAD output, forwarded to the session for UI feedback
/// ("stopping in 2s...") and auto-stop handling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VadFrame {
    pub rms: f32,
    pub is_speech: bool,
    /// Milliseconds since the last frame that exceeded the speech threshold.
    pub silence_ms: u64,
    /// Set exactly once per silence run; the reference clock resets after
    /// firing so subsequent silent frames do not re-trigger.
    pub auto_stop: bool,
}

/// Frame-synchronous silence tracker.
///
/// Time advances by each frame's duration (derived from its sample count),
/// which keeps the detector deterministic: frames arriving from a live
/// microphone advance it in real time, frames replayed from a buffer advance
/// it identically without waiting.
#[derive(Debug)]
pub struct Vad {
    cfg: VadConfig,
    clock_ms: u64,
    last_speech_ms: u64,
}

impl Vad {
    pub fn new(cfg: VadConfig) -> Self {
        Self {
            cfg,
            clock_ms: 0,
            last_speech_ms: 0,
        }
    }

    /// Process one frame; non-blocking, no side effects beyond internal time.
    pub fn process_frame(&mut self, samples: &[f32]) -> VadFrame {
        self.clock_ms += samples_to_ms(samples.len(), self.cfg.sample_rate);

        let rms = rms(samples);
        let is_speech = rms > self.cfg.speech_threshold;
        if is_speech {
            self.last_speech_ms = self.clock_ms;
        }

        let silence_ms = self.clock_ms - self.last_speech_ms;
        let auto_stop = silence_ms > self.cfg.silence_timeout_ms;
        if auto_stop {
            self.last_speech_ms = self.clock_ms;
        }

        VadFrame {
            rms,
            is_speech,
            silence_ms,
            auto_stop,
        }
    }

    /// Restart the silence clock, e.g. for a fresh capture.
    pub fn reset(&mut self) {
        self.clock_ms = 0;
        self.last_speech_ms = 0;
    }
}

/// Root-mean-square energy of a frame; 0.0 for empty input.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy: f32 = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    energy.sqrt()
}
