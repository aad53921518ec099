//! Sample-rate conversion for microphone input.
//!
//! Devices rarely run at 16 kHz natively; linear interpolation is enough for
//! speech that only feeds an energy detector and a speech recognizer.

/// Resample `input` by `ratio` (output rate / input rate) with linear
/// interpolation.
pub(super) fn resample_linear(input: &[f32], ratio: f64) -> Vec<f32> {
    if input.is_empty() || ratio <= 0.0 {
        return Vec::new();
    }
    let out_len = ((input.len() as f64) * ratio).round().max(1.0) as usize;
    let mut output = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 / ratio;
        let idx = pos.floor() as usize;
        let frac = (pos - idx as f64) as f32;
        let a = input[idx.min(input.len() - 1)];
        let b = input[(idx + 1).min(input.len() - 1)];
        output.push(a + (b - a) * frac);
    }
    output
}

/// Pad or truncate `frame` to exactly `target_len` samples so downstream
/// consumers always see fixed-size frames.
pub(super) fn adjust_frame_length(mut frame: Vec<f32>, target_len: usize) -> Vec<f32> {
    if frame.len() > target_len {
        frame.truncate(target_len);
    } else {
        frame.resize(target_len, 0.0);
    }
    frame
}

/// Convert one device-rate frame into a fixed-size target-rate frame.
pub(super) fn convert_frame_to_target(
    frame: Vec<f32>,
    device_rate: u32,
    target_rate: u32,
    target_len: usize,
) -> Vec<f32> {
    if device_rate == 0 || target_rate == 0 || device_rate == target_rate {
        return adjust_frame_length(frame, target_len);
    }
    let ratio = f64::from(target_rate) / f64::from(device_rate);
    adjust_frame_length(resample_linear(&frame, ratio), target_len)
}
