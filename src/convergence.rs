//! Running-mean convergence tracking, block by block.
//!
//! Informational only: non-convergence never aborts a run, it is surfaced
//! so the caller can decide to re-run with a larger iteration budget.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Convergence {
    pub achieved: bool,
    pub final_relative_change: f64,
}

/// Blocks needed below threshold back to back before the estimate counts
/// as stable.
const STABLE_BLOCKS: usize = 2;

#[derive(Debug, Clone)]
pub struct ConvergenceMonitor {
    threshold: f64,
    total_sum: f64,
    total_count: usize,
    previous_mean: Option<f64>,
    stable_streak: usize,
    achieved: bool,
    last_relative_change: f64,
}

impl ConvergenceMonitor {
    pub fn new(threshold: f64) -> Self {
        assert!(
            threshold.is_finite() && threshold > 0.0,
            "threshold must be finite and > 0"
        );
        Self {
            threshold,
            total_sum: 0.0,
            total_count: 0,
            previous_mean: None,
            stable_streak: 0,
            achieved: false,
            last_relative_change: f64::INFINITY,
        }
    }

    /// Folds one completed block into the running mean and updates the
    /// stability streak.
    pub fn observe_block(&mut self, block_sum: f64, block_len: usize) {
        if block_len == 0 {
            return;
        }

        self.total_sum += block_sum;
        self.total_count += block_len;
        let mean = self.total_sum / self.total_count as f64;

        if let Some(prev) = self.previous_mean {
            let denom = prev.abs().max(f64::MIN_POSITIVE);
            let change = (mean - prev).abs() / denom;
            self.last_relative_change = change;

            if change < self.threshold {
                self.stable_streak += 1;
                if self.stable_streak >= STABLE_BLOCKS {
                    self.achieved = true;
                }
            } else {
                self.stable_streak = 0;
            }
        }

        self.previous_mean = Some(mean);
    }

    pub fn finalize(&self) -> Convergence {
        Convergence {
            achieved: self.achieved,
            final_relative_change: if self.last_relative_change.is_finite() {
                self.last_relative_change
            } else {
                // Fewer than two blocks observed; no change to report.
                0.0
            },
        }
    }
}
