//! Audio capture pipeline: microphone input, frame dispatch, energy-based
//! voice activity detection, and PCM/WAV clip encoding.
//!
//! Audio flows as fixed-size 16 kHz mono f32 frames from an [`AudioSource`]
//! into the session worker, which buffers every frame and feeds it to the
//! VAD. Stopping renders the buffer as a single 16-bit PCM WAV clip for the
//! recognition boundary.

/// Sample rate every frame is normalized to before buffering and VAD.
pub const TARGET_RATE: u32 = 16_000;

/// Mono throughout the pipeline.
pub const TARGET_CHANNELS: u16 = 1;

/// Nominal frame size in samples (~256 ms at 16 kHz).
pub const FRAME_SAMPLES: usize = 4096;

mod capture;
mod dispatch;
mod meter;
mod mic;
mod resample;
mod source;
#[cfg(test)]
mod tests;
mod vad;
mod wav;

pub use capture::{CaptureBuffer, CaptureMetrics, StopCause};
pub use meter::VadTelemetry;
pub use mic::Microphone;
pub use source::{AudioSource, InputStream, PcmPlayback};
pub use vad::{Vad, VadConfig, VadFrame};
pub use wav::encode_wav;

/// Milliseconds of audio represented by `samples` at `sample_rate`.
pub(crate) fn samples_to_ms(samples: usize, sample_rate: u32) -> u64 {
    if sample_rate == 0 {
        return 0;
    }
    (samples as u64 * 1000) / u64::from(sample_rate)
}
