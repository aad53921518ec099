//! Practice session engine: one sentence at a time, one capture attempt at a
//! time.
//!
//! An attempt runs on a background worker so the UI stays responsive: the
//! worker owns the input stream, feeds every frame to the silence detector,
//! and walks the clip through recognition and alignment when capture stops.
//! A single busy flag taken before the stream opens guarantees there is never
//! more than one live capture, and every stop request carries the capture's
//! id so signals from an abandoned attempt cannot touch a newer one.

use crate::align::{self, Alignment, Struggle};
use crate::audio::{
    self, AudioSource, CaptureBuffer, CaptureMetrics, StopCause, Vad, VadConfig,
    VadTelemetry,
};
use crate::config::EngineConfig;
use crate::log_debug;
use crate::recognize::{RecognitionError, Recognizer};
use crate::text::{self, Token};
use regex::Regex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex, OnceLock};
use std::thread;
use std::time::Duration;

/// Identity of one capture attempt. Stop signals must present the id they
/// were issued for; anything else is treated as stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureId(u64);

/// Where the session currently is in its attempt lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No capture running.
    Idle,
    /// Stream opened, mic warming up; frames are discarded.
    Arming,
    /// Live capture, frames buffered and monitored.
    Recording,
    /// Capture stopped, clip in recognition/scoring.
    Processing,
    /// Last attempt matched every word of the sentence.
    Success,
}

/// Why an attempt produced no score.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("audio device error: {0}")]
    Device(String),
    #[error("clip too short ({got} bytes, need at least {min})")]
    TooShort { got: usize, min: usize },
    #[error(transparent)]
    Recognition(#[from] RecognitionError),
    #[error("recognizer heard no speech")]
    EmptyTranscript,
}

/// Terminal message of one attempt, sent once from the worker.
#[derive(Debug)]
pub enum AttemptReport {
    Scored {
        transcript: String,
        alignment: Alignment,
    },
    /// Stopped during warm-up; nothing was recorded or counted.
    Cancelled,
    Failed(AttemptError),
}

/// Why an attempt could not start.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StartError {
    #[error("an attempt is already in progress")]
    Busy,
    #[error("all sentences are finished")]
    Completed,
}

/// Why the session refused to advance to the next sentence.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AdvanceError {
    #[error("an attempt is still in progress")]
    Busy,
    #[error("too many missed words; try this sentence again")]
    Blocked,
    #[error("all sentences are finished")]
    Completed,
}

/// Running totals across the whole session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressStats {
    pub sentences_completed: usize,
    pub attempts_total: usize,
    pub successes: usize,
}

/// Render state for one token of the current sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// Non-word token; never scored.
    Punctuation,
    /// No scored attempt yet.
    Unread,
    Matched,
    Missed,
}

/// A display token paired with its scoring status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedToken {
    pub display: String,
    pub status: TokenStatus,
}

/// Handle the caller uses to wait for the worker's single report.
#[derive(Debug)]
pub struct AttemptHandle {
    pub id: CaptureId,
    pub receiver: mpsc::Receiver<AttemptReport>,
    pub handle: Option<thread::JoinHandle<()>>,
}

impl AttemptHandle {
    /// Block until the attempt finishes and its worker has fully unwound.
    pub fn wait(mut self) -> AttemptReport {
        let report = self
            .receiver
            .recv()
            .unwrap_or(AttemptReport::Failed(AttemptError::Device(
                "attempt worker vanished".to_string(),
            )));
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        report
    }
}

const STOP_NONE: u8 = 0;
const STOP_MANUAL: u8 = 1;
const STOP_AUTO: u8 = 2;

struct ActiveCapture {
    id: CaptureId,
    stop: Arc<std::sync::atomic::AtomicU8>,
}

struct Sentence {
    text: String,
    tokens: Vec<Token>,
}

#[derive(Default)]
struct AttemptResults {
    transcript: Option<String>,
    alignment: Option<Alignment>,
    clip: Option<Vec<u8>>,
}

struct Inner {
    cfg: EngineConfig,
    source: Arc<dyn AudioSource>,
    recognizer: Arc<dyn Recognizer>,
    sentences: Vec<Sentence>,
    sentence_index: AtomicUsize,
    busy: AtomicBool,
    capture_seq: AtomicU64,
    active: Mutex<Option<ActiveCapture>>,
    state: Mutex<SessionState>,
    telemetry: VadTelemetry,
    progress: Mutex<ProgressStats>,
    results: Mutex<AttemptResults>,
}

impl Inner {
    fn set_state(&self, state: SessionState) {
        *self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    /// Deliver a stop signal, but only if `id` still names the live capture.
    fn signal_stop(&self, id: CaptureId, code: u8) {
        let active = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match active.as_ref() {
            Some(capture) if capture.id == id => {
                let _ = capture
                    .stop
                    .compare_exchange(STOP_NONE, code, Ordering::AcqRel, Ordering::Acquire);
            }
            _ => log_debug(&format!("stale stop signal for capture {id:?} ignored")),
        }
    }
}

/// Drives one learner through a list of sentences. Clones share the same
/// session.
#[derive(Clone)]
pub struct PracticeSession {
    inner: Arc<Inner>,
}

impl PracticeSession {
    pub fn new(
        cfg: EngineConfig,
        source: Arc<dyn AudioSource>,
        recognizer: Arc<dyn Recognizer>,
        sentences: Vec<String>,
    ) -> Self {
        let sentences = sentences
            .into_iter()
            .map(|text| {
                let tokens = text::tokenize(&text);
                Sentence { text, tokens }
            })
            .collect();
        Self {
            inner: Arc::new(Inner {
                cfg,
                source,
                recognizer,
                sentences,
                sentence_index: AtomicUsize::new(0),
                busy: AtomicBool::new(false),
                capture_seq: AtomicU64::new(0),
                active: Mutex::new(None),
                state: Mutex::new(SessionState::Idle),
                telemetry: VadTelemetry::new(),
                progress: Mutex::new(ProgressStats::default()),
                results: Mutex::new(AttemptResults::default()),
            }),
        }
    }

    /// Begin a capture attempt on the current sentence.
    ///
    /// The busy flag is taken before any device work so a double-tap cannot
    /// open two streams; it is released only when the whole pipeline for
    /// this attempt has finished.
    pub fn start_attempt(&self) -> Result<AttemptHandle, StartError> {
        let inner = &self.inner;
        if inner.sentence_index.load(Ordering::Acquire) >= inner.sentences.len() {
            return Err(StartError::Completed);
        }
        if inner
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StartError::Busy);
        }

        let id = CaptureId(inner.capture_seq.fetch_add(1, Ordering::AcqRel) + 1);
        let stop = Arc::new(std::sync::atomic::AtomicU8::new(STOP_NONE));
        *inner
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(ActiveCapture {
            id,
            stop: stop.clone(),
        });
        inner.set_state(SessionState::Arming);

        let (tx, rx) = mpsc::sync_channel(1);
        let worker_inner = inner.clone();
        let handle = thread::spawn(move || {
            run_attempt(worker_inner, id, stop, tx);
        });

        Ok(AttemptHandle {
            id,
            receiver: rx,
            handle: Some(handle),
        })
    }

    /// Ask the live capture to stop and process what was recorded. Signals
    /// carrying a stale id are ignored.
    pub fn request_stop(&self, id: CaptureId) {
        self.inner.signal_stop(id, STOP_MANUAL);
    }

    pub fn state(&self) -> SessionState {
        *self
            .inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Live RMS/silence snapshot for meters and countdown hints.
    pub fn telemetry(&self) -> VadTelemetry {
        self.inner.telemetry.clone()
    }

    pub fn progress(&self) -> ProgressStats {
        *self
            .inner
            .progress
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn sentence_index(&self) -> usize {
        self.inner.sentence_index.load(Ordering::Acquire)
    }

    pub fn sentence_count(&self) -> usize {
        self.inner.sentences.len()
    }

    /// Current sentence text, or None once the session is finished.
    pub fn sentence(&self) -> Option<String> {
        self.inner
            .sentences
            .get(self.sentence_index())
            .map(|s| s.text.clone())
    }

    /// Missed words from the last scored attempt, in sentence order.
    pub fn struggles(&self) -> Vec<Struggle> {
        self.inner
            .results
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .alignment
            .as_ref()
            .map(|a| a.struggles.clone())
            .unwrap_or_default()
    }

    pub fn last_transcript(&self) -> Option<String> {
        self.inner
            .results
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .transcript
            .clone()
    }

    /// WAV bytes of the last processed clip, for playback.
    pub fn last_clip(&self) -> Option<Vec<u8>> {
        self.inner
            .results
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clip
            .clone()
    }

    /// Current sentence tokens annotated with per-word verdicts.
    pub fn annotated_tokens(&self) -> Vec<AnnotatedToken> {
        let Some(sentence) = self.inner.sentences.get(self.sentence_index()) else {
            return Vec::new();
        };
        let results = self
            .inner
            .results
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sentence
            .tokens
            .iter()
            .enumerate()
            .map(|(i, token)| {
                let status = if !token.is_word {
                    TokenStatus::Punctuation
                } else {
                    match results.alignment.as_ref() {
                        None => TokenStatus::Unread,
                        Some(alignment) => alignment
                            .verdicts
                            .iter()
                            .find(|v| v.token_index == i)
                            .map(|v| {
                                if v.matched {
                                    TokenStatus::Matched
                                } else {
                                    TokenStatus::Missed
                                }
                            })
                            .unwrap_or(TokenStatus::Unread),
                    }
                };
                AnnotatedToken {
                    display: token.display.clone(),
                    status,
                }
            })
            .collect()
    }

    /// True when the session may move on. A sentence nobody has attempted is
    /// always skippable; once an attempt is scored, advancing blocks only
    /// while the miss count exceeds the block threshold.
    pub fn can_advance(&self) -> bool {
        self.inner
            .results
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .alignment
            .as_ref()
            .map_or(true, |a| a.struggles.len() <= self.inner.cfg.advance_block_threshold)
    }

    /// Move to the next sentence, resetting per-attempt state but keeping
    /// session totals.
    pub fn advance_sentence(&self) -> Result<(), AdvanceError> {
        let inner = &self.inner;
        if inner.busy.load(Ordering::Acquire) {
            return Err(AdvanceError::Busy);
        }
        if self.sentence_index() >= inner.sentences.len() {
            return Err(AdvanceError::Completed);
        }
        if !self.can_advance() {
            return Err(AdvanceError::Blocked);
        }

        inner.sentence_index.fetch_add(1, Ordering::AcqRel);
        {
            let mut progress = inner
                .progress
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            progress.sentences_completed += 1;
        }
        *inner
            .results
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = AttemptResults::default();
        inner.set_state(SessionState::Idle);
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.sentence_index() >= self.inner.sentences.len()
    }
}

/// Releases the capture slot when the attempt pipeline fully unwinds, never
/// earlier: recognition and scoring must finish before a new capture can
/// start.
struct BusyGuard {
    inner: Arc<Inner>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        *self
            .inner
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        self.inner.telemetry.reset();
        self.inner.busy.store(false, Ordering::Release);
    }
}

fn run_attempt(
    inner: Arc<Inner>,
    id: CaptureId,
    stop: Arc<std::sync::atomic::AtomicU8>,
    tx: mpsc::SyncSender<AttemptReport>,
) {
    let _guard = BusyGuard {
        inner: inner.clone(),
    };
    let cfg = inner.cfg.clone();

    let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Vec<f32>>(cfg.channel_capacity.max(1));
    let mut stream = match inner.source.open(cfg.frame_samples, frame_tx) {
        Ok(stream) => stream,
        Err(err) => {
            inner.set_state(SessionState::Idle);
            let _ = tx.send(AttemptReport::Failed(AttemptError::Device(format!(
                "{err:#}"
            ))));
            return;
        }
    };

    let mut vad = Vad::new(VadConfig::from(&cfg));
    let mut buffer = CaptureBuffer::new();
    let mut metrics = CaptureMetrics::default();
    let frame_ms = (cfg.frame_samples as u64 * 1000 / u64::from(cfg.sample_rate.max(1))).max(1);
    let wait_time = Duration::from_millis(frame_ms);

    // Time derives from sample counts, not the wall clock, so an offline
    // source replays identically to a live microphone.
    let mut elapsed_ms: u64 = 0;
    let mut warmup_done = cfg.warmup_ms == 0;
    if warmup_done {
        inner.set_state(SessionState::Recording);
    }
    let stop_cause;

    loop {
        match stop.load(Ordering::Acquire) {
            STOP_MANUAL => {
                stop_cause = if warmup_done {
                    StopCause::Manual
                } else {
                    StopCause::Cancelled
                };
                break;
            }
            STOP_AUTO => {
                stop_cause = StopCause::AutoSilence {
                    tail_ms: metrics.silence_tail_ms,
                };
                break;
            }
            _ => {}
        }

        match frame_rx.recv_timeout(wait_time) {
            Ok(frame) => {
                elapsed_ms += audio::samples_to_ms(frame.len(), cfg.sample_rate);
                if !warmup_done {
                    // Warm-up audio is discarded so the attempt starts clean.
                    if elapsed_ms >= cfg.warmup_ms {
                        warmup_done = true;
                        vad.reset();
                        inner.set_state(SessionState::Recording);
                    }
                    continue;
                }

                metrics.frames_processed += 1;
                buffer.push_frame(&frame);
                let vframe = vad.process_frame(&frame);
                inner.telemetry.update(&vframe);
                if vframe.is_speech {
                    metrics.speech_ms += audio::samples_to_ms(frame.len(), cfg.sample_rate);
                }
                metrics.silence_tail_ms = vframe.silence_ms;

                if vframe.auto_stop {
                    // Routed through the same identity check as manual stops.
                    inner.signal_stop(id, STOP_AUTO);
                    continue;
                }

                metrics.capture_ms = elapsed_ms.saturating_sub(cfg.warmup_ms);
                if metrics.capture_ms >= cfg.max_capture_ms {
                    stop_cause = StopCause::MaxDuration;
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                stop_cause = StopCause::StreamClosed;
                break;
            }
        }
    }

    stream.close();
    metrics.stop_cause = stop_cause;
    log_attempt_metrics(&metrics);

    if metrics.stop_cause == StopCause::Cancelled {
        inner.set_state(SessionState::Idle);
        let _ = tx.send(AttemptReport::Cancelled);
        return;
    }

    inner.set_state(SessionState::Processing);
    {
        let mut progress = inner
            .progress
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        progress.attempts_total += 1;
    }

    let clip = match buffer.finish() {
        Ok(clip) => clip,
        Err(err) => {
            inner.set_state(SessionState::Idle);
            let _ = tx.send(AttemptReport::Failed(AttemptError::Device(format!(
                "{err:#}"
            ))));
            return;
        }
    };

    if clip.len() < cfg.min_clip_bytes {
        inner.set_state(SessionState::Idle);
        let _ = tx.send(AttemptReport::Failed(AttemptError::TooShort {
            got: clip.len(),
            min: cfg.min_clip_bytes,
        }));
        return;
    }

    {
        let mut results = inner
            .results
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        results.clip = Some(clip.clone());
    }

    let raw = match inner.recognizer.recognize(&clip) {
        Ok(raw) => raw,
        Err(err) => {
            inner.set_state(SessionState::Idle);
            let _ = tx.send(AttemptReport::Failed(AttemptError::Recognition(err)));
            return;
        }
    };

    let transcript = sanitize_transcript(&raw);
    if transcript.is_empty() {
        inner.set_state(SessionState::Idle);
        let _ = tx.send(AttemptReport::Failed(AttemptError::EmptyTranscript));
        return;
    }
    crate::log_debug_content(&format!("attempt transcript: {transcript}"));

    let sentence_index = inner.sentence_index.load(Ordering::Acquire);
    let Some(sentence) = inner.sentences.get(sentence_index) else {
        inner.set_state(SessionState::Idle);
        let _ = tx.send(AttemptReport::Failed(AttemptError::Device(
            "no active sentence".to_string(),
        )));
        return;
    };

    let words = text::normalize_transcript(&transcript);
    let alignment = align::align(&sentence.tokens, &words);
    let success = alignment.is_perfect();
    let missed = alignment.struggles.len();

    {
        let mut results = inner
            .results
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        results.transcript = Some(transcript.clone());
        results.alignment = Some(alignment.clone());
    }
    if success {
        let mut progress = inner
            .progress
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        progress.successes += 1;
    }

    tracing::info!(
        sentence = sentence_index,
        capture_ms = metrics.capture_ms,
        speech_ms = metrics.speech_ms,
        stop_cause = metrics.stop_cause.label(),
        missed,
        success,
        "attempt scored"
    );

    inner.set_state(if success {
        SessionState::Success
    } else {
        SessionState::Idle
    });
    let _ = tx.send(AttemptReport::Scored {
        transcript,
        alignment,
    });
}

/// Strip non-speech markers that recognizers emit for quiet clips, then
/// collapse whitespace.
pub fn sanitize_transcript(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    static NON_SPEECH_RE: OnceLock<Regex> = OnceLock::new();
    let re = NON_SPEECH_RE.get_or_init(|| {
        Regex::new(
            r"(?i)\[\s*\]|\(\s*\)|\[(?:\s*(?:silence|noise|inaudible|blank_audio|blank audio|music|laughter|applause|cough|breath(?:ing)?|wind|background)\s*)\]|\((?:\s*(?:silence|noise|inaudible|blank audio|music|laughter|applause|cough|breath(?:ing)?|wind|background|wind blowing)\s*)\)",
        )
        .expect("non-speech regex should compile")
    });
    let without_markers = re.replace_all(trimmed, " ");
    without_markers
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Emit structured metrics after every capture.
fn log_attempt_metrics(metrics: &CaptureMetrics) {
    log_debug(&format!(
        "attempt_metrics|capture_ms={}|speech_ms={}|silence_tail_ms={}|frames_processed={}|stop_cause={}",
        metrics.capture_ms,
        metrics.speech_ms,
        metrics.silence_tail_ms,
        metrics.frames_processed,
        metrics.stop_cause.label()
    ));
}
