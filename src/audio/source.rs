//! The audio input boundary.
//!
//! A source is opened on the capture worker's thread and pushes fixed-size
//! 16 kHz mono frames into the worker's channel until its stream handle is
//! closed. [`Microphone`](super::Microphone) is the live implementation;
//! [`PcmPlayback`] replays a buffer for offline runs and tests.

use anyhow::Result;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Something that can be opened to produce a live sequence of audio frames.
///
/// `open` is called on the worker thread; the returned stream need not be
/// `Send`. Implementations deliver frames of exactly `frame_samples`
/// samples at the pipeline's target rate.
pub trait AudioSource: Send + Sync {
    fn open(&self, frame_samples: usize, sink: Sender<Vec<f32>>) -> Result<Box<dyn InputStream>>;
}

/// Handle to an opened input stream. Dropping or closing it releases the
/// underlying device.
pub trait InputStream {
    /// Stop delivering frames and release the device. Idempotent.
    fn close(&mut self);
}

/// Replays a fixed PCM buffer as frames, then silence until closed.
///
/// Frames are paced at the nominal 16 kHz frame rate, so warm-up windows and
/// the VAD's silence timeout elapse exactly as they would against a live
/// microphone in a quiet room.
pub struct PcmPlayback {
    samples: Vec<f32>,
}

impl PcmPlayback {
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples }
    }
}

impl AudioSource for PcmPlayback {
    fn open(&self, frame_samples: usize, sink: Sender<Vec<f32>>) -> Result<Box<dyn InputStream>> {
        let frame_samples = frame_samples.max(1);
        let samples = self.samples.clone();
        let closed = Arc::new(AtomicBool::new(false));
        let closed_thread = closed.clone();

        let pace = Duration::from_millis((frame_samples * 1_000 / super::TARGET_RATE as usize) as u64);

        let handle = thread::spawn(move || {
            for chunk in samples.chunks(frame_samples) {
                let mut frame = chunk.to_vec();
                frame.resize(frame_samples, 0.0);
                if !deliver(&sink, &closed_thread, frame) {
                    return;
                }
                thread::sleep(pace);
            }
            // Quiet room from here on.
            while !closed_thread.load(Ordering::Relaxed) {
                if !deliver(&sink, &closed_thread, vec![0.0; frame_samples]) {
                    return;
                }
                thread::sleep(pace);
            }
        });

        Ok(Box::new(PlaybackStream {
            closed,
            handle: Some(handle),
        }))
    }
}

/// Try-send with backoff so a full channel never wedges the thread past a
/// close request. Returns false when delivery should stop.
fn deliver(sink: &Sender<Vec<f32>>, closed: &AtomicBool, frame: Vec<f32>) -> bool {
    let mut frame = frame;
    loop {
        if closed.load(Ordering::Relaxed) {
            return false;
        }
        match sink.try_send(frame) {
            Ok(()) => return true,
            Err(crossbeam_channel::TrySendError::Full(returned)) => {
                frame = returned;
                thread::sleep(Duration::from_millis(1));
            }
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => return false,
        }
    }
}

struct PlaybackStream {
    closed: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl InputStream for PlaybackStream {
    fn close(&mut self) {
        self.closed.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PlaybackStream {
    fn drop(&mut self) {
        self.close();
    }
}
