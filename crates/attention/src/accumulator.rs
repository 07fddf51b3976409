//! Time-in-state bookkeeping for one session

use serde::{Deserialize, Serialize};

use crate::config::TimeStep;
use crate::state::Classification;

/// Turns frame timestamps into per-frame time increments
#[derive(Debug, Clone)]
pub struct FrameClock {
    step: TimeStep,
    last_timestamp_ns: Option<u64>,
}

impl FrameClock {
    pub fn new(step: TimeStep) -> Self {
        Self {
            step,
            last_timestamp_ns: None,
        }
    }

    /// Seconds the frame at `timestamp_ns` accounts for
    pub fn advance(&mut self, timestamp_ns: u64) -> f64 {
        match self.step {
            TimeStep::Fixed { seconds } => seconds,
            TimeStep::Measured { nominal_seconds } => {
                let delta = match self.last_timestamp_ns {
                    // Out-of-order timestamps count as zero time
                    Some(last) => timestamp_ns.saturating_sub(last) as f64 / 1e9,
                    None => nominal_seconds,
                };
                let latest = self
                    .last_timestamp_ns
                    .map_or(timestamp_ns, |last| last.max(timestamp_ns));
                self.last_timestamp_ns = Some(latest);
                delta
            }
        }
    }
}

/// Running totals, cheap to copy into per-frame reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionTotals {
    pub focused_seconds: f64,
    pub drowsy_seconds: f64,
    pub distracted_seconds: f64,
    /// Alerts actually emitted past their cooldown
    pub alert_count: u32,
}

impl SessionTotals {
    pub fn total_seconds(&self) -> f64 {
        self.focused_seconds + self.drowsy_seconds + self.distracted_seconds
    }

    /// Share of time spent focused, in percent (denominator floored at one second)
    pub fn focus_percent(&self) -> f64 {
        self.focused_seconds / self.total_seconds().max(1.0) * 100.0
    }
}

/// Session accumulator; buckets only ever grow
#[derive(Debug, Clone, Default)]
pub struct SessionAccumulator {
    totals: SessionTotals,
    frames: u64,
}

impl SessionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `seconds` to the bucket of `state`
    pub fn add(&mut self, state: Classification, seconds: f64) {
        let seconds = seconds.max(0.0);
        match state {
            Classification::Focused => self.totals.focused_seconds += seconds,
            Classification::Drowsy => self.totals.drowsy_seconds += seconds,
            Classification::Distracted => self.totals.distracted_seconds += seconds,
        }
        self.frames += 1;
    }

    /// Count one emitted alert
    pub fn record_alert(&mut self) {
        self.totals.alert_count += 1;
    }

    pub fn seconds_in(&self, state: Classification) -> f64 {
        match state {
            Classification::Focused => self.totals.focused_seconds,
            Classification::Drowsy => self.totals.drowsy_seconds,
            Classification::Distracted => self.totals.distracted_seconds,
        }
    }

    pub fn totals(&self) -> SessionTotals {
        self.totals
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Final read at session end; the accumulator is consumed
    pub fn finalize(self) -> SessionTotals {
        self.totals
    }
}
