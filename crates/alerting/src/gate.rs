//! Alert Gate Implementation

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use attention::AlertSignals;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::AlertError;

/// Default time between two emissions of the same kind
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Minimum time between two emissions of the same kind (seconds)
    pub cooldown_seconds: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: DEFAULT_COOLDOWN.as_secs_f64(),
        }
    }
}

impl AlertConfig {
    /// Cooldown as a duration; rejects negative, non-finite and
    /// out-of-range values
    pub fn cooldown(&self) -> Result<Duration, AlertError> {
        let seconds = self.cooldown_seconds;
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(AlertError::Config(format!(
                "cooldown_seconds must be a finite number >= 0, got {}",
                seconds
            )));
        }
        Duration::try_from_secs_f64(seconds).map_err(|e| {
            AlertError::Config(format!("cooldown_seconds {} out of range: {}", seconds, e))
        })
    }

    pub fn validate(&self) -> Result<(), AlertError> {
        self.cooldown().map(|_| ())
    }
}

/// User-facing alert kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Drowsy,
    Yawn,
    Emotion,
    Posture,
}

impl AlertKind {
    /// Text shown next to the video feed
    pub fn message(&self) -> &'static str {
        match self {
            AlertKind::Drowsy => "Drowsy!",
            AlertKind::Yawn => "Yawning!",
            AlertKind::Emotion => "Distracted emotion detected!",
            AlertKind::Posture => "Sit upright!",
        }
    }

    /// Discrete events go through cooldown, play a sound and are counted.
    /// Posture is advisory only and shown for as long as it lasts.
    pub fn is_gated(&self) -> bool {
        !matches!(self, AlertKind::Posture)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Drowsy => "drowsy",
            AlertKind::Yawn => "yawn",
            AlertKind::Emotion => "emotion",
            AlertKind::Posture => "posture",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emission history of one alert kind
#[derive(Debug, Clone)]
pub struct AlertState {
    /// Session time of the last emission
    pub last_fired: Duration,
    /// Number of emissions
    pub fire_count: usize,
}

/// Outcome of one frame's gating
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertDecision {
    /// Alerts emitted this frame (sound + text, counted)
    pub emitted: Vec<AlertKind>,
    /// Advisory alerts shown this frame (text only, never counted)
    pub advisories: Vec<AlertKind>,
}

impl AlertDecision {
    pub fn is_empty(&self) -> bool {
        self.emitted.is_empty() && self.advisories.is_empty()
    }

    /// Whether an audible alert should play
    pub fn audible(&self) -> bool {
        !self.emitted.is_empty()
    }

    /// Alert line as rendered by the UI, e.g. "⚠️ Drowsy! ⚠️ Sit upright!"
    pub fn text(&self) -> String {
        self.emitted
            .iter()
            .chain(self.advisories.iter())
            .map(|kind| format!("⚠️ {}", kind.message()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Cooldown table keyed by alert kind.
///
/// Times are session-relative durations supplied by the caller, so the gate
/// works the same for live capture and for replayed traces.
pub struct AlertGate {
    /// Minimum time between two emissions of the same kind
    cooldown: Duration,
    /// Alert states by kind
    states: HashMap<AlertKind, AlertState>,
    /// Emitted alerts this session
    total_fired: usize,
}

impl AlertGate {
    /// Create a new alert gate
    pub fn new(config: AlertConfig) -> Result<Self, AlertError> {
        let cooldown = config.cooldown()?;
        info!("Creating alert gate with cooldown {:?}", cooldown);
        Ok(Self::with_cooldown(cooldown))
    }

    fn with_cooldown(cooldown: Duration) -> Self {
        Self {
            cooldown,
            states: HashMap::new(),
            total_fired: 0,
        }
    }

    /// Whether `kind` may fire at `now`: never fired, or strictly more than
    /// the cooldown since its last emission
    pub fn should_fire(&self, kind: AlertKind, now: Duration) -> bool {
        if !kind.is_gated() {
            return true;
        }
        match self.states.get(&kind) {
            Some(state) => {
                let elapsed = now.saturating_sub(state.last_fired);
                if elapsed > self.cooldown {
                    true
                } else {
                    debug!("Alert {} suppressed: in cooldown period", kind);
                    false
                }
            }
            None => true,
        }
    }

    /// Record that an alert was fired
    pub fn record_fire(&mut self, kind: AlertKind, now: Duration) {
        self.total_fired += 1;

        let state = self.states.entry(kind).or_insert(AlertState {
            last_fired: now,
            fire_count: 0,
        });
        state.last_fired = now;
        state.fire_count += 1;

        info!("Alert emitted: {} (count: {})", kind, state.fire_count);
    }

    /// Gate every active signal of a frame
    pub fn evaluate(&mut self, signals: &AlertSignals, now: Duration) -> AlertDecision {
        let mut decision = AlertDecision::default();

        let gated = [
            (signals.blink, AlertKind::Drowsy),
            (signals.yawn, AlertKind::Yawn),
            (signals.emotion, AlertKind::Emotion),
        ];
        for (active, kind) in gated {
            if active && self.should_fire(kind, now) {
                self.record_fire(kind, now);
                decision.emitted.push(kind);
            }
        }

        if signals.posture {
            decision.advisories.push(AlertKind::Posture);
        }

        decision
    }

    /// Emission history of one kind
    pub fn state(&self, kind: AlertKind) -> Option<&AlertState> {
        self.states.get(&kind)
    }

    /// Emitted alerts so far
    pub fn total_fired(&self) -> usize {
        self.total_fired
    }
}

impl Default for AlertGate {
    fn default() -> Self {
        Self::with_cooldown(DEFAULT_COOLDOWN)
    }
}
