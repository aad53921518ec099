//! Interactive reading-practice CLI.
//!
//! Presents one sentence at a time, records the learner through the default
//! (or chosen) microphone, and scores the recognized speech against the
//! sentence. Capture stops on its own after a run of silence; pressing Enter
//! stops it early.

use anyhow::{bail, Context, Result};
use recite::audio::Microphone;
use recite::config::AppConfig;
use recite::recognize::HttpRecognizer;
use recite::session::{
    AdvanceError, AttemptError, AttemptReport, PracticeSession, SessionState, TokenStatus,
};
use recite::text::split_sentences;
use recite::{init_logging, init_tracing, log_debug};
use std::io::{self, BufRead, Write};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;

    if config.list_input_devices {
        return list_input_devices();
    }

    init_logging(&config);
    init_tracing(&config);
    log_debug("=== recite started ===");

    let text = config.practice_text()?;
    let sentences = split_sentences(&text);
    if sentences.is_empty() {
        bail!("practice text contains no sentences");
    }

    let mic = Microphone::new(config.input_device.as_deref())?;
    println!("Using input device: {}", mic.device_name());

    let recognizer = HttpRecognizer::new(
        config.recognizer_url.clone(),
        config.recognizer_model.clone(),
        config.api_key.clone(),
        Duration::from_millis(config.recognizer_timeout_ms),
    )
    .context("failed to build recognizer client")?;

    let session = PracticeSession::new(
        config.engine_config(),
        Arc::new(mic),
        Arc::new(recognizer),
        sentences,
    );

    // One reader owns stdin for the whole run; everyone else consumes lines
    // from the channel. EOF closes the channel and ends the session loop.
    let (line_tx, line_rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    while let Some(sentence) = session.sentence() {
        println!();
        println!(
            "Sentence {}/{}:",
            session.sentence_index() + 1,
            session.sentence_count()
        );
        println!("  {sentence}");
        // Drop any Enter typed after the last capture already stopped.
        while line_rx.try_recv().is_ok() {}
        print!("Press Enter to start reading (q to quit): ");
        io::stdout().flush()?;
        match line_rx.recv() {
            Ok(line) if line.trim().eq_ignore_ascii_case("q") => break,
            Ok(_) => {}
            Err(_) => break,
        }

        let mut handle = match session.start_attempt() {
            Ok(handle) => handle,
            Err(err) => {
                eprintln!("could not start: {err}");
                continue;
            }
        };
        println!("Recording... stop with Enter, or pause until it stops on its own.");

        let report = loop {
            match handle.receiver.recv_timeout(Duration::from_millis(50)) {
                Ok(report) => break report,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    if line_rx.try_recv().is_ok() {
                        session.request_stop(handle.id);
                    }
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    break AttemptReport::Failed(AttemptError::Device(
                        "attempt worker vanished".to_string(),
                    ));
                }
            }
        };
        if let Some(worker) = handle.handle.take() {
            let _ = worker.join();
        }

        match report {
            AttemptReport::Cancelled => {
                println!("Stopped before recording began; nothing was scored.");
            }
            AttemptReport::Failed(err) => {
                eprintln!("Attempt failed: {err}");
            }
            AttemptReport::Scored { transcript, .. } => {
                println!("Heard: {transcript}");
                print_verdicts(&session);

                let struggles = session.struggles();
                if session.state() == SessionState::Success {
                    println!("Perfect read!");
                } else if !struggles.is_empty() {
                    let words: Vec<&str> =
                        struggles.iter().map(|s| s.word.as_str()).collect();
                    println!("Missed: {}", words.join(", "));
                }

                match session.advance_sentence() {
                    Ok(()) => {}
                    Err(AdvanceError::Blocked) => {
                        println!("Too many missed words; read this sentence again.")
                    }
                    Err(AdvanceError::Completed) => break,
                    Err(AdvanceError::Busy) => {}
                }
            }
        }
    }

    let progress = session.progress();
    println!();
    println!(
        "Finished {}/{} sentences, {} clean reads in {} attempts.",
        progress.sentences_completed,
        session.sentence_count(),
        progress.successes,
        progress.attempts_total
    );
    Ok(())
}

/// Show the sentence with every missed word bracketed.
fn print_verdicts(session: &PracticeSession) {
    let mut rendered = String::new();
    for token in session.annotated_tokens() {
        match token.status {
            TokenStatus::Missed => {
                rendered.push('[');
                rendered.push_str(&token.display);
                rendered.push(']');
            }
            _ => rendered.push_str(&token.display),
        }
    }
    println!("  {rendered}");
}

fn list_input_devices() -> Result<()> {
    let devices = Microphone::list_devices()?;
    if devices.is_empty() {
        println!("No audio input devices detected.");
    } else {
        println!("Audio input devices:");
        for name in devices {
            println!("  {name}");
        }
    }
    Ok(())
}
