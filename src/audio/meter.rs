//! Live VAD telemetry shared between the capture worker and the UI thread.
//!
//! Lock-free snapshot of the most recent frame's RMS, speech flag, and
//! silence run, so a consumer can render level meters and "stopping in
//! 2s..." countdowns without touching the worker.

use super::vad::VadFrame;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct VadTelemetry {
    inner: Arc<TelemetryCells>,
}

#[derive(Debug, Default)]
struct TelemetryCells {
    rms_bits: AtomicU32,
    is_speech: AtomicBool,
    silence_ms: AtomicU64,
}

impl VadTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, frame: &VadFrame) {
        self.inner.rms_bits.store(frame.rms.to_bits(), Ordering::Relaxed);
        self.inner.is_speech.store(frame.is_speech, Ordering::Relaxed);
        self.inner
            .silence_ms
            .store(frame.silence_ms, Ordering::Relaxed);
    }

    /// Clear the snapshot, e.g. when capture ends.
    pub fn reset(&self) {
        self.inner.rms_bits.store(0f32.to_bits(), Ordering::Relaxed);
        self.inner.is_speech.store(false, Ordering::Relaxed);
        self.inner.silence_ms.store(0, Ordering::Relaxed);
    }

    pub fn rms(&self) -> f32 {
        f32::from_bits(self.inner.rms_bits.load(Ordering::Relaxed))
    }

    pub fn is_speech(&self) -> bool {
        self.inner.is_speech.load(Ordering::Relaxed)
    }

    pub fn silence_ms(&self) -> u64 {
        self.inner.silence_ms.load(Ordering::Relaxed)
    }
}
