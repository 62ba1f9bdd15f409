//! Error taxonomy for the simulation engine.
//!
//! Every failure path surfaces as a typed variant; validation errors are
//! raised before any sampling begins and are never retried internally.

use thiserror::Error;

use crate::convergence::Convergence;

#[derive(Debug, Clone, Error)]
pub enum SimulationError {
    /// Malformed distribution or configuration input, rejected up front.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Distribution tag that the engine does not implement.
    #[error("unsupported distribution: {0}")]
    UnsupportedDistribution(String),

    /// Correlation matrix that cannot be factored even after repair.
    #[error("invalid correlation matrix: {detail}")]
    InvalidCorrelationMatrix { detail: String },

    /// Runtime sampling failure; the whole run is discarded.
    #[error("simulation failed: {0}")]
    SimulationFailed(String),

    /// Wall-clock budget exceeded between iteration batches. Carries the
    /// convergence state reached so far; the run itself is incomplete.
    #[error("simulation exceeded {budget_ms} ms after {completed_iterations} iterations")]
    SimulationTimeout {
        budget_ms: u64,
        completed_iterations: usize,
        convergence: Convergence,
    },

    /// Zero-cost mitigation: return on investment is undefined.
    #[error("mitigation cost is zero, ROI is undefined")]
    DivisionByZero,
}
