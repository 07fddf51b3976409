//! Per-frame attention state

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::signals::AlertSignals;

/// Mutually exclusive per-frame classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    #[default]
    Focused,
    Drowsy,
    Distracted,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Focused => "focused",
            Classification::Drowsy => "drowsy",
            Classification::Distracted => "distracted",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve signals into one state.
///
/// Priority: Drowsy > Distracted > Focused. A frame without a face is
/// always distracted.
pub fn resolve(signals: &AlertSignals, face_present: bool) -> Classification {
    if !face_present {
        Classification::Distracted
    } else if signals.blink {
        Classification::Drowsy
    } else if signals.any_distraction() {
        Classification::Distracted
    } else {
        Classification::Focused
    }
}
