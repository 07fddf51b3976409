//! Pomodoro focus timer

use std::time::Duration;

use tracing::info;

/// Classic 25 minute focus block
pub const DEFAULT_POMODORO: Duration = Duration::from_secs(25 * 60);

/// Countdown running on session time
#[derive(Debug, Clone)]
pub struct PomodoroTimer {
    duration: Duration,
    started_at: Option<Duration>,
}

impl PomodoroTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started_at: None,
        }
    }

    /// Start counting down from `now`; no-op if already running
    pub fn start(&mut self, now: Duration) -> bool {
        if self.started_at.is_some() {
            return false;
        }
        info!("Pomodoro started ({}s)", self.duration.as_secs());
        self.started_at = Some(now);
        true
    }

    pub fn stop(&mut self) {
        self.started_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Time left, `None` when not running
    pub fn remaining(&self, now: Duration) -> Option<Duration> {
        self.started_at
            .map(|start| self.duration.saturating_sub(now.saturating_sub(start)))
    }

    /// Returns `true` exactly once, on the first poll at or after the deadline
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.remaining(now) {
            Some(left) if left.is_zero() => {
                info!("Pomodoro complete");
                self.started_at = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for PomodoroTimer {
    fn default() -> Self {
        Self::new(DEFAULT_POMODORO)
    }
}

/// `mm:ss` countdown text
pub fn format_remaining(left: Duration) -> String {
    let secs = left.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
