//! Eye-closure debounce

/// Counts consecutive closed-eye frames.
///
/// The closed signal rises only after `consec_frames` low-EAR frames in a
/// row and drops on the first frame whose EAR is back at or above threshold.
#[derive(Debug, Clone)]
pub struct EyeClosureTracker {
    threshold: f64,
    consec_frames: u32,
    counter: u32,
}

impl EyeClosureTracker {
    pub fn new(threshold: f64, consec_frames: u32) -> Self {
        Self {
            threshold,
            consec_frames,
            counter: 0,
        }
    }

    /// Feed one frame's EAR, returns whether eyes count as closed
    pub fn update(&mut self, ear: f64) -> bool {
        if ear < self.threshold {
            self.counter = self.counter.saturating_add(1);
        } else {
            self.counter = 0;
        }
        self.is_closed()
    }

    pub fn is_closed(&self) -> bool {
        self.counter >= self.consec_frames
    }

    /// Consecutive low-EAR frames so far
    pub fn counter(&self) -> u32 {
        self.counter
    }
}
