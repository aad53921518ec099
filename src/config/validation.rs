use super::defaults::MAX_CAPTURE_HARD_LIMIT_MS;
use super::{AppConfig, EngineConfig};
use crate::audio::{FRAME_SAMPLES, TARGET_RATE};
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;

impl AppConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values before any device or network work starts.
    pub fn validate(&self) -> Result<()> {
        if !self.list_input_devices && self.text.is_none() && self.text_file.is_none() {
            bail!("provide practice text with --text or --text-file");
        }
        if self.text.is_some() && self.text_file.is_some() {
            bail!("--text and --text-file are mutually exclusive");
        }
        if let Some(text) = &self.text {
            if text.trim().is_empty() {
                bail!("--text must not be empty");
            }
        }
        if let Some(path) = &self.text_file {
            if !path.exists() {
                bail!("text file '{}' does not exist", path.display());
            }
        }

        if self.recognizer_url.trim().is_empty() {
            bail!("--recognizer-url must not be empty");
        }
        if !(self.recognizer_url.starts_with("http://")
            || self.recognizer_url.starts_with("https://"))
        {
            bail!(
                "--recognizer-url must be an http(s) URL, got '{}'",
                self.recognizer_url
            );
        }
        if self.recognizer_model.trim().is_empty() {
            bail!("--recognizer-model must not be empty");
        }
        if !(1_000..=300_000).contains(&self.recognizer_timeout_ms) {
            bail!(
                "--recognizer-timeout-ms must be between 1000 and 300000, got {}",
                self.recognizer_timeout_ms
            );
        }

        if !(0.0..=1.0).contains(&self.speech_threshold) || self.speech_threshold == 0.0 {
            bail!(
                "--speech-threshold must be between 0.0 (exclusive) and 1.0, got {}",
                self.speech_threshold
            );
        }
        if self.max_capture_ms == 0 || self.max_capture_ms > MAX_CAPTURE_HARD_LIMIT_MS {
            bail!(
                "--max-capture-ms must be between 1 and {MAX_CAPTURE_HARD_LIMIT_MS} ms, got {}",
                self.max_capture_ms
            );
        }
        if self.silence_timeout_ms < 200 || self.silence_timeout_ms > self.max_capture_ms {
            bail!(
                "--silence-timeout-ms must be >=200 and <= --max-capture-ms ({})",
                self.max_capture_ms
            );
        }
        if self.warmup_ms > self.max_capture_ms {
            bail!(
                "--warmup-ms ({}) cannot exceed --max-capture-ms ({})",
                self.warmup_ms,
                self.max_capture_ms
            );
        }
        // 44 bytes is a header-only WAV; anything at or below it is empty.
        if self.min_clip_bytes <= 44 {
            bail!(
                "--min-clip-bytes must be larger than the 44-byte WAV header, got {}",
                self.min_clip_bytes
            );
        }
        if !(8..=1024).contains(&self.channel_capacity) {
            bail!(
                "--channel-capacity must be between 8 and 1024, got {}",
                self.channel_capacity
            );
        }

        Ok(())
    }

    /// Snapshot the current CLI-controlled pipeline settings.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            sample_rate: TARGET_RATE,
            frame_samples: FRAME_SAMPLES,
            speech_threshold: self.speech_threshold,
            silence_timeout_ms: self.silence_timeout_ms,
            warmup_ms: self.warmup_ms,
            min_clip_bytes: self.min_clip_bytes,
            advance_block_threshold: self.advance_block_threshold,
            max_capture_ms: self.max_capture_ms,
            channel_capacity: self.channel_capacity,
        }
    }

    /// Resolve the practice text from whichever flag supplied it.
    pub fn practice_text(&self) -> Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        if let Some(path) = &self.text_file {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read text file '{}'", path.display()))?;
            if content.trim().is_empty() {
                bail!("text file '{}' is empty", path.display());
            }
            return Ok(content);
        }
        bail!("no practice text configured")
    }
}
