//! End-to-end session flow through the public API, with an offline audio
//! source and a scripted recognizer standing in at the process boundaries.

use recite::audio::PcmPlayback;
use recite::config::EngineConfig;
use recite::recognize::{RecognitionError, Recognizer};
use recite::session::{AdvanceError, AttemptReport, SessionState};
use recite::text::split_sentences;
use recite::PracticeSession;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct ScriptedRecognizer {
    transcripts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedRecognizer {
    fn new(transcripts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            transcripts: Mutex::new(transcripts.iter().rev().map(|t| t.to_string()).collect()),
            calls: AtomicUsize::new(0),
        })
    }
}

impl Recognizer for ScriptedRecognizer {
    fn recognize(&self, wav: &[u8]) -> Result<String, RecognitionError> {
        assert_eq!(&wav[..4], b"RIFF", "clip should be a WAV file");
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.transcripts.lock().unwrap().pop().unwrap_or_default())
    }
}

fn engine_config() -> EngineConfig {
    EngineConfig {
        frame_samples: 160,
        silence_timeout_ms: 200,
        warmup_ms: 0,
        min_clip_bytes: 45,
        advance_block_threshold: 0,
        ..EngineConfig::default()
    }
}

fn spoken_audio() -> Arc<PcmPlayback> {
    Arc::new(PcmPlayback::new(vec![0.4; 3_200]))
}

#[test]
fn full_session_walks_every_sentence() {
    let sentences = split_sentences("The cat sat. Mr. Dursley was proud.");
    assert_eq!(sentences.len(), 2);

    let recognizer = ScriptedRecognizer::new(&[
        "um, the cat sat",
        "mister dursley was proud", // "mister" vs "mr" fails, retry needed
        "mr dursley was proud",
    ]);
    let session = PracticeSession::new(
        engine_config(),
        spoken_audio(),
        recognizer.clone(),
        sentences,
    );

    // First sentence: filler word is dropped, clean read.
    let handle = session.start_attempt().expect("attempt should start");
    match handle.wait() {
        AttemptReport::Scored { alignment, .. } => assert!(alignment.is_perfect()),
        other => panic!("expected scored report, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Success);
    session.advance_sentence().expect("clean read advances");

    // Second sentence: first try misses "Mr", second try lands it.
    let handle = session.start_attempt().expect("attempt should start");
    match handle.wait() {
        AttemptReport::Scored { alignment, .. } => {
            assert_eq!(alignment.struggles.len(), 1);
            assert_eq!(alignment.struggles[0].word, "mr");
        }
        other => panic!("expected scored report, got {other:?}"),
    }
    assert_eq!(session.advance_sentence().unwrap_err(), AdvanceError::Blocked);

    let handle = session.start_attempt().expect("retry should start");
    match handle.wait() {
        AttemptReport::Scored { alignment, .. } => assert!(alignment.is_perfect()),
        other => panic!("expected scored report, got {other:?}"),
    }
    session.advance_sentence().expect("clean retry advances");

    assert!(session.is_finished());
    let progress = session.progress();
    assert_eq!(progress.sentences_completed, 2);
    assert_eq!(progress.attempts_total, 3);
    assert_eq!(progress.successes, 2);
    assert_eq!(recognizer.calls.load(Ordering::Relaxed), 3);
}
