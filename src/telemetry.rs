//! Structured attempt telemetry as JSON lines.
//!
//! Shares the debug log's enable gate: when file logging is on, every
//! `tracing` event (one per scored attempt) is appended to a JSONL file in
//! the temp directory so capture metrics can be inspected offline.

use crate::config::AppConfig;
use crate::logging::file_logging_enabled;
use std::env;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_subscriber::fmt::time::UtcTime;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

pub(crate) fn tracing_log_path() -> PathBuf {
    env::var("RECITE_TRACE_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("recite_trace.jsonl"))
}

fn open_sink() -> Option<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(tracing_log_path())
        .ok()
}

/// Install the process-wide JSON subscriber. Calling again, or calling with
/// file logging disabled, is a no-op; an unwritable sink silently drops the
/// events rather than failing startup.
pub fn init_tracing(config: &AppConfig) {
    if !file_logging_enabled(config) {
        return;
    }

    let _ = TRACING_INIT.get_or_init(|| {
        let Some(file) = open_sink() else { return };
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_timer(UtcTime::rfc_3339())
            .with_writer(file)
            .with_current_span(false)
            .with_span_list(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
