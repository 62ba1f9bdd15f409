//! Risk register model: typed risks, correlation declarations, and the
//! per-run simulation configuration.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::distributions::Distribution;
use crate::error::SimulationError;

pub const MIN_ITERATIONS: usize = 1_000;
pub const DEFAULT_ITERATIONS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Cost,
    Schedule,
    Technical,
    Resource,
    External,
    Quality,
    Regulatory,
}

/// One entry of the risk register for a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub id: String,
    pub category: RiskCategory,
    pub distribution: Distribution,
}

/// Declared co-movement between two risks. The matrix diagonal is
/// implicit; undeclared pairs sample independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub risk_id_a: String,
    pub risk_id_b: String,
    pub coefficient: f64,
}

/// Everything one run needs. The whole engine is a pure function from
/// this configuration to a result; nothing here mutates during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default)]
    pub random_seed: Option<u64>,
    #[serde(default)]
    pub baseline_cost: f64,
    pub risks: Vec<Risk>,
    #[serde(default)]
    pub correlations: Vec<CorrelationPair>,
}

fn default_iterations() -> usize {
    DEFAULT_ITERATIONS
}

impl SimulationConfig {
    /// Full pre-run validation. Nothing is sampled until this passes.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.iterations < MIN_ITERATIONS {
            return Err(SimulationError::InvalidParameters(format!(
                "iterations must be at least {MIN_ITERATIONS} (got {})",
                self.iterations
            )));
        }
        if !self.baseline_cost.is_finite() {
            return Err(SimulationError::InvalidParameters(format!(
                "baseline_cost must be finite (got {})",
                self.baseline_cost
            )));
        }
        if self.risks.is_empty() {
            return Err(SimulationError::InvalidParameters(
                "risk register is empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for risk in &self.risks {
            if risk.id.is_empty() {
                return Err(SimulationError::InvalidParameters(
                    "risk id must be non-empty".to_string(),
                ));
            }
            if !seen.insert(risk.id.as_str()) {
                return Err(SimulationError::InvalidParameters(format!(
                    "duplicate risk id '{}'",
                    risk.id
                )));
            }
            risk.distribution.validate()?;
        }

        for pair in &self.correlations {
            if !seen.contains(pair.risk_id_a.as_str()) {
                return Err(SimulationError::InvalidParameters(format!(
                    "correlation references unknown risk '{}'",
                    pair.risk_id_a
                )));
            }
            if !seen.contains(pair.risk_id_b.as_str()) {
                return Err(SimulationError::InvalidParameters(format!(
                    "correlation references unknown risk '{}'",
                    pair.risk_id_b
                )));
            }
            if pair.risk_id_a == pair.risk_id_b {
                return Err(SimulationError::InvalidParameters(format!(
                    "risk '{}' cannot be correlated with itself",
                    pair.risk_id_a
                )));
            }
            if !pair.coefficient.is_finite() || pair.coefficient.abs() > 1.0 {
                return Err(SimulationError::InvalidParameters(format!(
                    "correlation coefficient for ({}, {}) must be in [-1, 1] (got {})",
                    pair.risk_id_a, pair.risk_id_b, pair.coefficient
                )));
            }
        }

        Ok(())
    }

    /// Index of a risk by id, in declaration order.
    pub fn risk_index(&self, id: &str) -> Option<usize> {
        self.risks.iter().position(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::{CorrelationPair, Risk, RiskCategory, SimulationConfig};
    use crate::distributions::Distribution;

    fn one_risk(id: &str) -> Risk {
        Risk {
            id: id.to_string(),
            category: RiskCategory::Cost,
            distribution: Distribution::Uniform {
                min: 0.0,
                max: 100.0,
            },
        }
    }

    fn base_config() -> SimulationConfig {
        SimulationConfig {
            iterations: 1_000,
            random_seed: Some(1),
            baseline_cost: 0.0,
            risks: vec![one_risk("a"), one_risk("b")],
            correlations: Vec::new(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn too_few_iterations_are_rejected() {
        let mut cfg = base_config();
        cfg.iterations = 999;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn duplicate_risk_ids_are_rejected() {
        let mut cfg = base_config();
        cfg.risks.push(one_risk("a"));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn out_of_range_coefficient_is_rejected() {
        let mut cfg = base_config();
        cfg.correlations.push(CorrelationPair {
            risk_id_a: "a".to_string(),
            risk_id_b: "b".to_string(),
            coefficient: 1.2,
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn self_correlation_is_rejected() {
        let mut cfg = base_config();
        cfg.correlations.push(CorrelationPair {
            risk_id_a: "a".to_string(),
            risk_id_b: "a".to_string(),
            coefficient: 0.5,
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_correlation_target_is_rejected() {
        let mut cfg = base_config();
        cfg.correlations.push(CorrelationPair {
            risk_id_a: "a".to_string(),
            risk_id_b: "ghost".to_string(),
            coefficient: 0.5,
        });
        assert!(cfg.validate().is_err());
    }
}
