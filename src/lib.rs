//! risk-mc - Monte Carlo risk simulation engine
//!
//! Turns a project's risk register (cost and schedule risks modeled as
//! probability distributions, with declared correlations) into a
//! statistical distribution of possible outcomes, for contingency
//! sizing, scenario comparison, and mitigation ROI analysis.

pub mod api;
pub mod contribution;
pub mod convergence;
pub mod correlation;
pub mod distributions;
pub mod error;
pub mod io;
pub mod mitigation;
pub mod risk;
pub mod runner;
pub mod scenario;
pub mod settings;
pub mod special;
pub mod stats;

// Re-export main types
pub use contribution::RiskContribution;
pub use convergence::Convergence;
pub use distributions::Distribution;
pub use error::SimulationError;
pub use mitigation::{apply_mitigation, mitigation_roi, MitigationRoi, MitigationStrategy};
pub use risk::{CorrelationPair, Risk, RiskCategory, SimulationConfig};
pub use runner::{run_simulation, RunPhase, SimulationResult, SimulationRunner};
pub use scenario::{run_scenario_set, Scenario, ScenarioAnalysis, ScenarioSet};
pub use settings::EngineSettings;
pub use stats::{ConfidenceIntervals, Percentiles};
