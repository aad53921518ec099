use super::capture::CaptureBuffer;
use super::dispatch::{append_downmixed, FrameDispatcher};
use super::resample::{adjust_frame_length, convert_frame_to_target, resample_linear};
use super::source::{AudioSource, PcmPlayback};
use super::vad::{rms, Vad, VadConfig};
use super::wav::{encode_wav, sample_to_i16};
use super::{samples_to_ms, VadTelemetry, FRAME_SAMPLES, TARGET_RATE};
use crossbeam_channel::bounded;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn silent_frame() -> Vec<f32> {
    vec![0.0; FRAME_SAMPLES]
}

fn speech_frame() -> Vec<f32> {
    vec![0.5; FRAME_SAMPLES]
}

#[test]
fn rms_of_empty_frame_is_zero() {
    assert_eq!(rms(&[]), 0.0);
}

#[test]
fn rms_of_constant_frame_matches_amplitude() {
    let frame = vec![0.5f32; 1024];
    assert!((rms(&frame) - 0.5).abs() < 1e-6);
    let loud = vec![1.0f32, -1.0, 1.0, -1.0];
    assert!((rms(&loud) - 1.0).abs() < 1e-6);
}

#[test]
fn vad_flags_speech_above_threshold() {
    let mut vad = Vad::new(VadConfig::default());
    let frame = vad.process_frame(&speech_frame());
    assert!(frame.is_speech);
    assert_eq!(frame.silence_ms, 0);
    assert!(!frame.auto_stop);

    let frame = vad.process_frame(&silent_frame());
    assert!(!frame.is_speech);
    assert_eq!(frame.silence_ms, 256);
}

#[test]
fn vad_auto_stop_fires_once_after_timeout() {
    let mut vad = Vad::new(VadConfig::default());
    // 4096 samples at 16 kHz is 256 ms per frame; the run crosses the
    // 4000 ms timeout on the 16th silent frame.
    let mut fired_at = None;
    for i in 0..16 {
        let frame = vad.process_frame(&silent_frame());
        if frame.auto_stop {
            fired_at = Some(i);
            break;
        }
    }
    assert_eq!(fired_at, Some(15));

    // The reference clock reset on firing, so continued silence does not
    // re-trigger until another full timeout elapses.
    for _ in 0..15 {
        let frame = vad.process_frame(&silent_frame());
        assert!(!frame.auto_stop);
    }
    assert!(vad.process_frame(&silent_frame()).auto_stop);
}

#[test]
fn vad_speech_resets_silence_run() {
    let mut vad = Vad::new(VadConfig::default());
    for _ in 0..10 {
        vad.process_frame(&silent_frame());
    }
    let frame = vad.process_frame(&speech_frame());
    assert_eq!(frame.silence_ms, 0);
    for _ in 0..15 {
        assert!(!vad.process_frame(&silent_frame()).auto_stop);
    }
    assert!(vad.process_frame(&silent_frame()).auto_stop);
}

#[test]
fn vad_reset_restarts_the_clock() {
    let mut vad = Vad::new(VadConfig::default());
    for _ in 0..15 {
        vad.process_frame(&silent_frame());
    }
    vad.reset();
    assert_eq!(vad.process_frame(&silent_frame()).silence_ms, 256);
}

#[test]
fn vad_honours_configured_timeout() {
    let cfg = VadConfig {
        silence_timeout_ms: 600,
        ..VadConfig::default()
    };
    let mut vad = Vad::new(cfg);
    assert!(!vad.process_frame(&silent_frame()).auto_stop);
    assert!(!vad.process_frame(&silent_frame()).auto_stop);
    // 768 ms > 600 ms.
    assert!(vad.process_frame(&silent_frame()).auto_stop);
}

#[test]
fn sample_conversion_covers_both_rails() {
    assert_eq!(sample_to_i16(0.0), 0);
    assert_eq!(sample_to_i16(-1.0), -32_768);
    assert_eq!(sample_to_i16(1.0), 32_767);
    assert_eq!(sample_to_i16(-2.0), -32_768);
    assert_eq!(sample_to_i16(2.0), 32_767);
    assert_eq!(sample_to_i16(0.5), 16_383);
    assert_eq!(sample_to_i16(-0.5), -16_384);
}

#[test]
fn empty_capture_encodes_to_header_only_wav() {
    let bytes = encode_wav(&[]).unwrap();
    assert_eq!(bytes.len(), 44);
    assert_eq!(&bytes[..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WAVE");
    assert_eq!(u32::from_le_bytes(bytes[40..44].try_into().unwrap()), 0);
}

#[test]
fn wav_header_describes_mono_16khz_pcm() {
    let samples = vec![0.0f32, 0.5, -0.5, 1.0];
    let bytes = encode_wav(&samples).unwrap();
    assert_eq!(bytes.len(), 44 + samples.len() * 2);
    assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 36 + 8);
    // fmt chunk: PCM, mono, 16 kHz, 16-bit.
    assert_eq!(u16::from_le_bytes(bytes[20..22].try_into().unwrap()), 1);
    assert_eq!(u16::from_le_bytes(bytes[22..24].try_into().unwrap()), 1);
    assert_eq!(
        u32::from_le_bytes(bytes[24..28].try_into().unwrap()),
        TARGET_RATE
    );
    assert_eq!(
        u32::from_le_bytes(bytes[28..32].try_into().unwrap()),
        TARGET_RATE * 2
    );
    assert_eq!(u16::from_le_bytes(bytes[32..34].try_into().unwrap()), 2);
    assert_eq!(u16::from_le_bytes(bytes[34..36].try_into().unwrap()), 16);
    assert_eq!(
        u32::from_le_bytes(bytes[40..44].try_into().unwrap()),
        samples.len() as u32 * 2
    );
    // First payload sample is 0.
    assert_eq!(i16::from_le_bytes(bytes[44..46].try_into().unwrap()), 0);
    assert_eq!(
        i16::from_le_bytes(bytes[50..52].try_into().unwrap()),
        32_767
    );
}

#[test]
fn capture_buffer_accumulates_frames() {
    let mut buffer = CaptureBuffer::new();
    assert!(buffer.is_empty());
    buffer.push_frame(&[0.1, 0.2]);
    buffer.push_frame(&[0.3]);
    assert_eq!(buffer.sample_count(), 3);
    let bytes = buffer.finish().unwrap();
    assert_eq!(bytes.len(), 44 + 6);
}

#[test]
fn downmixes_multi_channel_audio() {
    let mut buf = Vec::new();
    let samples = [1.0f32, -1.0, 0.5, 0.5];
    append_downmixed(&mut buf, &samples, 2, |sample| sample);
    assert_eq!(buf, vec![0.0, 0.5]);
}

#[test]
fn preserves_single_channel_audio() {
    let mut buf = Vec::new();
    let samples = [0.1f32, 0.2, 0.3];
    append_downmixed(&mut buf, &samples, 1, |sample| sample);
    assert_eq!(buf, samples);
}

#[test]
fn downmix_averages_trailing_partial_frame() {
    let mut buf = Vec::new();
    let samples = [1.0f32, 0.0, 0.6];
    append_downmixed(&mut buf, &samples, 2, |sample| sample);
    assert_eq!(buf, vec![0.5, 0.6]);
}

#[test]
fn dispatcher_chunks_into_fixed_frames() {
    let (sender, receiver) = bounded(8);
    let dropped = Arc::new(AtomicUsize::new(0));
    let mut pump = FrameDispatcher::new(4, 4, TARGET_RATE, TARGET_RATE, sender, dropped.clone());

    pump.push(&[0.1f32, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9], 1, |s| s);
    assert_eq!(receiver.recv().unwrap(), vec![0.1, 0.2, 0.3, 0.4]);
    assert_eq!(receiver.recv().unwrap(), vec![0.5, 0.6, 0.7, 0.8]);
    assert!(receiver.try_recv().is_err());

    // The ninth sample is still pending.
    pump.push(&[1.0f32, 1.0, 1.0], 1, |s| s);
    assert_eq!(receiver.recv().unwrap(), vec![0.9, 1.0, 1.0, 1.0]);
    assert_eq!(dropped.load(Ordering::Relaxed), 0);
}

#[test]
fn dispatcher_counts_dropped_frames_when_channel_is_full() {
    let (sender, receiver) = bounded(1);
    let dropped = Arc::new(AtomicUsize::new(0));
    let mut pump = FrameDispatcher::new(2, 2, TARGET_RATE, TARGET_RATE, sender, dropped.clone());

    pump.push(&[0.0f32; 6], 1, |s| s);
    assert_eq!(dropped.load(Ordering::Relaxed), 2);
    assert_eq!(receiver.recv().unwrap().len(), 2);
}

#[test]
fn dispatcher_converts_samples_through_callback() {
    let (sender, receiver) = bounded(4);
    let dropped = Arc::new(AtomicUsize::new(0));
    let mut pump = FrameDispatcher::new(2, 2, TARGET_RATE, TARGET_RATE, sender, dropped);

    pump.push(&[16_384i16, -16_384], 1, |s| s as f32 / 32_768.0);
    let frame = receiver.recv().unwrap();
    assert!((frame[0] - 0.5).abs() < 1e-6);
    assert!((frame[1] + 0.5).abs() < 1e-6);
}

#[test]
fn resample_identity_keeps_samples() {
    let input = vec![0.1f32, 0.2, 0.3];
    assert_eq!(resample_linear(&input, 1.0), input);
}

#[test]
fn resample_linear_scales_length() {
    let input = vec![0.0f32, 1.0, 2.0, 3.0];
    let halved = resample_linear(&input, 0.5);
    assert_eq!(halved.len(), 2);
    let doubled = resample_linear(&input, 2.0);
    assert_eq!(doubled.len(), 8);
    assert!((doubled[0] - 0.0).abs() < 1e-6);
}

#[test]
fn adjust_frame_length_pads_and_truncates() {
    assert_eq!(adjust_frame_length(vec![1.0, 2.0], 4), vec![1.0, 2.0, 0.0, 0.0]);
    assert_eq!(adjust_frame_length(vec![1.0, 2.0, 3.0], 2), vec![1.0, 2.0]);
}

#[test]
fn convert_frame_passes_matching_rates_through() {
    let frame = vec![0.1f32, 0.2, 0.3, 0.4];
    assert_eq!(
        convert_frame_to_target(frame.clone(), TARGET_RATE, TARGET_RATE, 4),
        frame
    );
}

#[test]
fn convert_frame_downsamples_to_target_length() {
    let frame: Vec<f32> = (0..96).map(|i| i as f32 / 96.0).collect();
    let out = convert_frame_to_target(frame, 48_000, TARGET_RATE, 32);
    assert_eq!(out.len(), 32);
}

#[test]
fn telemetry_snapshot_tracks_latest_frame() {
    let telemetry = VadTelemetry::new();
    let mut vad = Vad::new(VadConfig::default());

    telemetry.update(&vad.process_frame(&speech_frame()));
    assert!(telemetry.is_speech());
    assert!((telemetry.rms() - 0.5).abs() < 1e-6);
    assert_eq!(telemetry.silence_ms(), 0);

    telemetry.update(&vad.process_frame(&silent_frame()));
    assert!(!telemetry.is_speech());
    assert_eq!(telemetry.silence_ms(), 256);

    telemetry.reset();
    assert_eq!(telemetry.rms(), 0.0);
    assert!(!telemetry.is_speech());
}

#[test]
fn pcm_playback_delivers_buffer_then_silence() {
    let samples = vec![0.5f32; 6];
    let source = PcmPlayback::new(samples);
    let (sender, receiver) = bounded(16);
    let mut stream = source.open(4, sender).unwrap();

    let first = receiver.recv().unwrap();
    assert_eq!(first, vec![0.5, 0.5, 0.5, 0.5]);
    let second = receiver.recv().unwrap();
    assert_eq!(second, vec![0.5, 0.5, 0.0, 0.0]);
    let third = receiver.recv().unwrap();
    assert_eq!(third, vec![0.0; 4]);

    stream.close();
    stream.close();
}

#[test]
fn samples_to_ms_uses_sample_rate() {
    assert_eq!(samples_to_ms(16_000, 16_000), 1_000);
    assert_eq!(samples_to_ms(4_096, 16_000), 256);
    assert_eq!(samples_to_ms(100, 0), 0);
}
