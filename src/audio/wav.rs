//! WAV clip rendering.
//!
//! Recognizer endpoints expect a plain mono 16 kHz 16-bit little-endian PCM
//! file with the standard 44-byte RIFF header, so the encoder reproduces
//! exactly that layout. An empty capture still yields a valid header-only
//! file with a zero-length data chunk.

use super::{TARGET_CHANNELS, TARGET_RATE};
use anyhow::{Context, Result};
use std::io::Cursor;

/// Convert one float sample to i16 PCM.
///
/// Clamped to [-1, 1] and scaled asymmetrically (negatives by 0x8000,
/// positives by 0x7FFF) so both rails map onto the full i16 range.
pub(super) fn sample_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32_768.0) as i16
    } else {
        (clamped * 32_767.0) as i16
    }
}

/// Encode float samples as a complete mono 16 kHz 16-bit WAV file.
pub fn encode_wav(samples: &[f32]) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: TARGET_CHANNELS,
        sample_rate: TARGET_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .context("failed to start WAV writer")?;
        for &sample in samples {
            writer
                .write_sample(sample_to_i16(sample))
                .context("failed to write PCM sample")?;
        }
        writer.finalize().context("failed to finalize WAV clip")?;
    }
    Ok(cursor.into_inner())
}
