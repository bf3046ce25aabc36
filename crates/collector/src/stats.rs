//! Run statistics.

use std::time::Duration;

/// Statistics from one collection run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Episodes started (across reconnects)
    pub episodes_started: u64,

    /// Frames read from the simulator (warm-up included)
    pub frames_seen: u64,

    /// Frames accepted by the novelty filter and persisted
    pub frames_accepted: u64,

    /// Episodes aborted by the stall detector
    pub stall_aborts: u64,

    /// Full restarts triggered by transport failures
    pub reconnects: u64,

    /// Total wall time of the run
    pub duration: Duration,
}

impl RunStats {
    /// Fraction of seen frames that were accepted, as a percentage
    pub fn acceptance_rate(&self) -> f64 {
        if self.frames_seen > 0 {
            (self.frames_accepted as f64 / self.frames_seen as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Collection Summary ===");
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Episodes started: {}", self.episodes_started);
        println!("  Frames seen: {}", self.frames_seen);
        println!(
            "  Frames accepted: {} ({:.1}%)",
            self.frames_accepted,
            self.acceptance_rate()
        );
        println!("  Stall aborts: {}", self.stall_aborts);
        println!("  Reconnects: {}", self.reconnects);
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acceptance_rate_handles_empty_run() {
        assert_eq!(RunStats::default().acceptance_rate(), 0.0);
    }

    #[test]
    fn acceptance_rate() {
        let stats = RunStats {
            frames_seen: 200,
            frames_accepted: 50,
            ..Default::default()
        };
        assert!((stats.acceptance_rate() - 25.0).abs() < f64::EPSILON);
    }
}
