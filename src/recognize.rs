//! Speech recognition boundary.
//!
//! The session hands a finished WAV clip to a [`Recognizer`] and gets back a
//! raw transcript string. The production implementation posts the clip to an
//! OpenAI-compatible `/audio/transcriptions` endpoint; tests substitute a
//! scripted fake behind the same trait.

use crate::log_debug;
use serde::Deserialize;
use std::time::Duration;

/// Failures crossing the recognition boundary.
#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("recognizer transport error: {0}")]
    Transport(String),
    #[error("recognizer returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("recognizer response was not understood: {0}")]
    BadResponse(String),
}

/// Turns a WAV clip into a transcript.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, wav: &[u8]) -> Result<String, RecognitionError>;
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// HTTP client for OpenAI-compatible transcription endpoints.
pub struct HttpRecognizer {
    client: reqwest::blocking::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpRecognizer {
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RecognitionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RecognitionError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            model: model.into(),
            api_key,
        })
    }
}

impl Recognizer for HttpRecognizer {
    fn recognize(&self, wav: &[u8]) -> Result<String, RecognitionError> {
        let file = reqwest::blocking::multipart::Part::bytes(wav.to_vec())
            .file_name("attempt.wav")
            .mime_str("audio/wav")
            .map_err(|err| RecognitionError::Transport(err.to_string()))?;
        let form = reqwest::blocking::multipart::Form::new()
            .part("file", file)
            .text("model", self.model.clone());

        let mut request = self.client.post(&self.url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|err| RecognitionError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            log_debug(&format!("recognizer_http_error: status={status} body={message}"));
            return Err(RecognitionError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body: TranscriptionResponse = response
            .json()
            .map_err(|err| RecognitionError::BadResponse(err.to_string()))?;
        Ok(body.text)
    }
}
