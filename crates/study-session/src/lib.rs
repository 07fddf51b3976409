//! Study Session Control
//!
//! Drives the attention engine frame by frame, gates alerts, runs the
//! pomodoro timer, and turns a finished session into a persisted record.

pub mod controller;
pub mod pomodoro;
pub mod settings;
pub mod source;

pub use controller::{FrameReport, StudySession};
pub use pomodoro::PomodoroTimer;
pub use settings::{AppConfig, LoggingSettings};
pub use source::{CameraFeed, ObservationSource, TraceReader};

use alerting::AlertError;
use attention::AttentionError;
use camera_capture::CameraError;
use storage::StorageError;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Session errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Attention engine: {0}")]
    Attention(#[from] AttentionError),

    #[error("Alerting: {0}")]
    Alert(#[from] AlertError),

    #[error("Camera: {0}")]
    Camera(#[from] CameraError),

    #[error("Storage: {0}")]
    Storage(#[from] StorageError),

    #[error("Trace line {line}: {message}")]
    Trace { line: usize, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Initialize logging
pub fn init_logging(settings: &LoggingSettings) -> Result<(), SessionError> {
    let level: Level = settings
        .level
        .parse()
        .map_err(|_| SessionError::Config(format!("unknown log level '{}'", settings.level)))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if settings.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| SessionError::Config(format!("failed to set tracing subscriber: {}", e)))
}
