//! System microphone input via CPAL.
//!
//! Handles device enumeration and per-format sample conversion. The callback
//! thread feeds a [`FrameDispatcher`], which normalizes everything to
//! fixed-size 16 kHz mono f32 frames before they reach the session worker.

use super::dispatch::FrameDispatcher;
use super::source::{AudioSource, InputStream};
use super::TARGET_RATE;
use crate::log_debug;
use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Audio input device wrapper.
pub struct Microphone {
    device: cpal::Device,
}

impl Microphone {
    /// List microphone names so the CLI can expose a selector.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().context("no input devices available")?;
        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Open a microphone, optionally forcing a specific device so users can
    /// pick the right input when a laptop exposes several.
    pub fn new(preferred_device: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = match preferred_device {
            Some(name) => {
                let mut devices = host.input_devices().context("no input devices available")?;
                devices
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| anyhow!("input device '{name}' not found"))?
            }
            None => host
                .default_input_device()
                .with_context(|| format!("no default input device available. {}", mic_permission_hint()))?,
        };
        Ok(Self { device })
    }

    /// Name of the active input device.
    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string())
    }
}

impl AudioSource for Microphone {
    fn open(&self, frame_samples: usize, sink: Sender<Vec<f32>>) -> Result<Box<dyn InputStream>> {
        let default_config = self
            .device
            .default_input_config()
            .with_context(|| format!("failed to query input format. {}", mic_permission_hint()))?;
        let format = default_config.sample_format();
        let device_config: StreamConfig = default_config.into();
        let device_sample_rate = device_config.sample_rate.0;
        let channels = usize::from(device_config.channels.max(1));

        // Keep each device-side chunk the same duration as a target frame so
        // resampling maps one to one.
        let device_frame_samples = ((u64::from(device_sample_rate) * frame_samples as u64)
            / u64::from(TARGET_RATE))
        .max(1) as usize;

        log_debug(&format!(
            "mic config: format={format:?} sample_rate={device_sample_rate}Hz channels={channels}"
        ));

        let dropped = Arc::new(AtomicUsize::new(0));
        let dispatcher = Arc::new(Mutex::new(FrameDispatcher::new(
            device_frame_samples,
            frame_samples,
            device_sample_rate,
            TARGET_RATE,
            sink,
            dropped.clone(),
        )));

        // Keep the error callback quiet on screen and mirror issues into the log.
        let err_fn = |err| log_debug(&format!("audio_stream_error: {err}"));

        // Convert every supported sample type to f32 up front so the rest of
        // the pipeline stays format-agnostic.
        let stream = match format {
            SampleFormat::F32 => {
                let dispatcher = dispatcher.clone();
                let dropped = dropped.clone();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[f32], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, |sample| sample);
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::I16 => {
                let dispatcher = dispatcher.clone();
                let dropped = dropped.clone();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[i16], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, |sample| sample as f32 / 32_768.0);
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::U16 => {
                let dispatcher = dispatcher.clone();
                let dropped = dropped.clone();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[u16], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, |sample| {
                                (sample as f32 - 32_768.0) / 32_768.0
                            });
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            other => return Err(anyhow!("unsupported sample format: {other:?}")),
        };

        stream
            .play()
            .with_context(|| format!("failed to start audio stream. {}", mic_permission_hint()))?;

        Ok(Box::new(MicStream {
            stream: Some(stream),
            dropped,
        }))
    }
}

struct MicStream {
    stream: Option<cpal::Stream>,
    dropped: Arc<AtomicUsize>,
}

impl InputStream for MicStream {
    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.pause() {
                log_debug(&format!("failed to pause audio stream: {err}"));
            }
            drop(stream);
            let dropped = self.dropped.load(Ordering::Relaxed);
            if dropped > 0 {
                log_debug(&format!("capture dropped {dropped} frames under backpressure"));
            }
        }
    }
}

impl Drop for MicStream {
    fn drop(&mut self) {
        self.close();
    }
}

fn mic_permission_hint() -> &'static str {
    #[cfg(target_os = "macos")]
    {
        "macOS: System Settings > Privacy & Security > Microphone (enable your terminal)."
    }
    #[cfg(target_os = "linux")]
    {
        "Linux: check PipeWire/PulseAudio permissions and ensure the device is not muted."
    }
    #[cfg(target_os = "windows")]
    {
        "Windows: Settings > Privacy & Security > Microphone (allow access for your terminal)."
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        "Check OS microphone permissions."
    }
}
