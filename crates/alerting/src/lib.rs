//! Alerting System
//!
//! Provides per-kind cooldown gating, alert counting, and advisory messages.

mod gate;

pub use gate::{AlertConfig, AlertDecision, AlertGate, AlertKind, AlertState, DEFAULT_COOLDOWN};

use thiserror::Error;

/// Alerting errors
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Configuration error: {0}")]
    Config(String),
}
