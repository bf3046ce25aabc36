//! Low-speed stall detection
//!
//! The simulation counts as blocked (a crash, a jammed intersection) when the
//! vehicle runs below a small speed epsilon for a sustained streak of ticks.
//! Abort is a signal to restart the episode, not an error.

/// Consecutive low-speed tick counter with an abort latch
#[derive(Debug, Clone)]
pub struct StallDetector {
    epsilon: f64,
    limit: u32,
    streak: u32,
    tripped: bool,
}

impl StallDetector {
    pub fn new(epsilon: f64, limit: u32) -> Self {
        Self {
            epsilon,
            limit,
            streak: 0,
            tripped: false,
        }
    }

    /// Feed one forward-speed reading; returns true exactly once, on the
    /// tick where the low-speed streak first exceeds the limit.
    ///
    /// Any reading at or above epsilon resets the streak (and the latch)
    /// to zero.
    pub fn observe(&mut self, forward_speed: f64) -> bool {
        if forward_speed >= self.epsilon {
            self.streak = 0;
            self.tripped = false;
            return false;
        }

        self.streak += 1;
        if self.streak > self.limit && !self.tripped {
            self.tripped = true;
            return true;
        }
        false
    }

    /// Current consecutive low-speed streak (written to the debug log)
    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Clear streak and latch, for a fresh episode
    pub fn reset(&mut self) {
        self.streak = 0;
        self.tripped = false;
    }
}
