pub mod align;
pub mod audio;
pub mod config;
pub mod logging;
pub mod phonetics;
pub mod recognize;
pub mod session;
mod telemetry;
pub mod text;

pub use logging::{init_logging, log_debug, log_debug_content};
pub use session::{
    AttemptError, AttemptHandle, AttemptReport, CaptureId, PracticeSession, ProgressStats,
    SessionState, StartError,
};
pub use telemetry::init_tracing;
