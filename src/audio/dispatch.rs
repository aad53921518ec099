//! Turns the device callback's arbitrary sample bursts into fixed-size
//! 16 kHz mono frames on a bounded channel.
//!
//! Runs inside the audio callback, so each step stays cheap: downmix,
//! accumulate, chunk, resample linearly, try-send. A full channel drops the
//! frame and counts it rather than blocking the device thread.

use super::resample::convert_frame_to_target;
use crossbeam_channel::{Sender, TrySendError};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Downmix interleaved multi-channel input to mono while converting each
/// sample to f32.
pub(super) fn append_downmixed<T, F>(buf: &mut Vec<f32>, data: &[T], channels: usize, mut convert: F)
where
    T: Copy,
    F: FnMut(T) -> f32,
{
    if channels <= 1 {
        buf.extend(data.iter().copied().map(&mut convert));
        return;
    }

    let mut acc = 0.0f32;
    let mut count = 0usize;
    for sample in data.iter().copied() {
        acc += convert(sample);
        count += 1;
        if count == channels {
            buf.push(acc / channels as f32);
            acc = 0.0;
            count = 0;
        }
    }
    if count > 0 {
        buf.push(acc / count as f32);
    }
}

pub(super) struct FrameDispatcher {
    device_frame_samples: usize,
    target_frame_samples: usize,
    device_rate: u32,
    target_rate: u32,
    pending: Vec<f32>,
    scratch: Vec<f32>,
    sender: Sender<Vec<f32>>,
    dropped: Arc<AtomicUsize>,
}

impl FrameDispatcher {
    pub(super) fn new(
        device_frame_samples: usize,
        target_frame_samples: usize,
        device_rate: u32,
        target_rate: u32,
        sender: Sender<Vec<f32>>,
        dropped: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            device_frame_samples: device_frame_samples.max(1),
            target_frame_samples: target_frame_samples.max(1),
            device_rate,
            target_rate,
            pending: Vec::with_capacity(device_frame_samples),
            scratch: Vec::new(),
            sender,
            dropped,
        }
    }

    pub(super) fn push<T, F>(&mut self, data: &[T], channels: usize, convert: F)
    where
        T: Copy,
        F: FnMut(T) -> f32,
    {
        self.scratch.clear();
        append_downmixed(&mut self.scratch, data, channels, convert);
        self.pending.extend_from_slice(&self.scratch);

        while self.pending.len() >= self.device_frame_samples {
            let device_frame: Vec<f32> = self.pending.drain(..self.device_frame_samples).collect();
            let frame = convert_frame_to_target(
                device_frame,
                self.device_rate,
                self.target_rate,
                self.target_frame_samples,
            );
            match self.sender.try_send(frame) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
                Err(TrySendError::Disconnected(_)) => break,
            }
        }
    }
}
