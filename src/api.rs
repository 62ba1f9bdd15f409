//! Wire contract with the surrounding application.
//!
//! Requests arrive with distributions as a type tag plus a flat parameter
//! map; decoding turns them into the typed register, rejecting anything
//! malformed before a single sample is drawn. Responses carry the summary
//! statistics only, never the raw sample array.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::convergence::Convergence;
use crate::distributions::Distribution;
use crate::error::SimulationError;
use crate::mitigation::{MitigationRoi, MitigationStrategy};
use crate::risk::{CorrelationPair, Risk, RiskCategory, SimulationConfig, DEFAULT_ITERATIONS};
use crate::runner::SimulationResult;
use crate::scenario::{Scenario, ScenarioAnalysis, ScenarioComparison, ScenarioSet};
use crate::stats::{ConfidenceIntervals, Percentiles};

#[derive(Debug, Clone, Deserialize)]
pub struct RiskDto {
    pub id: String,
    pub category: RiskCategory,
    pub distribution_type: String,
    pub parameters: BTreeMap<String, f64>,
    #[serde(default)]
    pub correlated_with: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationRequest {
    pub risks: Vec<RiskDto>,
    #[serde(default)]
    pub correlations: Vec<CorrelationPair>,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default)]
    pub random_seed: Option<u64>,
    #[serde(default)]
    pub baseline_cost: f64,
}

fn default_iterations() -> usize {
    DEFAULT_ITERATIONS
}

impl SimulationRequest {
    /// Decodes and fully validates the request into a runnable config.
    pub fn into_config(self) -> Result<SimulationConfig, SimulationError> {
        let mut risks = Vec::with_capacity(self.risks.len());
        for dto in &self.risks {
            let distribution = build_distribution(&dto.distribution_type, &dto.parameters)?;
            risks.push(Risk {
                id: dto.id.clone(),
                category: dto.category,
                distribution,
            });
        }

        // A correlated_with declaration without a coefficient in the
        // correlations list has no defined strength; reject it instead of
        // inventing one.
        for dto in &self.risks {
            for other in &dto.correlated_with {
                let declared = self.correlations.iter().any(|p| {
                    (p.risk_id_a == dto.id && p.risk_id_b == *other)
                        || (p.risk_id_b == dto.id && p.risk_id_a == *other)
                });
                if !declared {
                    return Err(SimulationError::InvalidParameters(format!(
                        "risk '{}' lists '{}' in correlated_with but no coefficient was supplied",
                        dto.id, other
                    )));
                }
            }
        }

        let config = SimulationConfig {
            iterations: self.iterations,
            random_seed: self.random_seed,
            baseline_cost: self.baseline_cost,
            risks,
            correlations: self.correlations,
        };
        config.validate()?;
        Ok(config)
    }
}

fn need(
    parameters: &BTreeMap<String, f64>,
    kind: &str,
    key: &str,
) -> Result<f64, SimulationError> {
    parameters.get(key).copied().ok_or_else(|| {
        SimulationError::InvalidParameters(format!("{kind} requires parameter '{key}'"))
    })
}

/// Maps the wire tag plus parameter map onto the closed distribution set.
pub fn build_distribution(
    distribution_type: &str,
    parameters: &BTreeMap<String, f64>,
) -> Result<Distribution, SimulationError> {
    let dist = match distribution_type.to_ascii_lowercase().as_str() {
        "triangular" => Distribution::Triangular {
            min: need(parameters, "triangular", "min")?,
            mode: need(parameters, "triangular", "mode")?,
            max: need(parameters, "triangular", "max")?,
        },
        "normal" => Distribution::Normal {
            mean: need(parameters, "normal", "mean")?,
            std_dev: need(parameters, "normal", "std_dev")?,
        },
        "lognormal" => Distribution::LogNormal {
            mu: need(parameters, "lognormal", "mu")?,
            sigma: need(parameters, "lognormal", "sigma")?,
        },
        "uniform" => Distribution::Uniform {
            min: need(parameters, "uniform", "min")?,
            max: need(parameters, "uniform", "max")?,
        },
        "beta" => Distribution::Beta {
            alpha: need(parameters, "beta", "alpha")?,
            beta: need(parameters, "beta", "beta")?,
            min: need(parameters, "beta", "min")?,
            max: need(parameters, "beta", "max")?,
        },
        other => {
            return Err(SimulationError::UnsupportedDistribution(other.to_string()));
        }
    };
    dist.validate()?;
    Ok(dist)
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskContributionDto {
    pub risk_id: String,
    pub contribution_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationResponse {
    pub mean: f64,
    pub std_dev: f64,
    pub percentiles: Percentiles,
    pub confidence_intervals: ConfidenceIntervals,
    pub convergence: Convergence,
    pub risk_contributions: Vec<RiskContributionDto>,
    /// Non-zero when the correlation matrix needed a nearest-PSD repair.
    pub correlation_correction: f64,
}

impl From<&SimulationResult> for SimulationResponse {
    fn from(result: &SimulationResult) -> Self {
        Self {
            mean: result.mean,
            std_dev: result.std_dev,
            percentiles: result.percentiles,
            confidence_intervals: result.confidence_intervals,
            convergence: result.convergence,
            risk_contributions: result
                .risk_contributions
                .iter()
                .map(|c| RiskContributionDto {
                    risk_id: c.risk_id.clone(),
                    contribution_percentage: c.variance_share,
                })
                .collect(),
            correlation_correction: result.correlation_correction,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioDto {
    pub name: String,
    #[serde(flatten)]
    pub request: SimulationRequest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioRequest {
    pub scenarios: Vec<ScenarioDto>,
    #[serde(default)]
    pub random_seed: Option<u64>,
    #[serde(default)]
    pub mitigation: Option<MitigationStrategy>,
}

impl ScenarioRequest {
    pub fn into_set(self) -> Result<ScenarioSet, SimulationError> {
        let mut scenarios = Vec::with_capacity(self.scenarios.len());
        for dto in self.scenarios {
            let name = dto.name;
            scenarios.push(Scenario {
                name,
                config: dto.request.into_config()?,
            });
        }
        Ok(ScenarioSet {
            random_seed: self.random_seed,
            scenarios,
            mitigation: self.mitigation,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedSimulationResponse {
    pub name: String,
    #[serde(flatten)]
    pub response: SimulationResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResponse {
    pub scenarios: Vec<NamedSimulationResponse>,
    pub comparisons: Vec<ScenarioComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mitigation_roi: Option<MitigationRoi>,
}

impl From<&ScenarioAnalysis> for ScenarioResponse {
    fn from(analysis: &ScenarioAnalysis) -> Self {
        Self {
            scenarios: analysis
                .outcomes
                .iter()
                .map(|o| NamedSimulationResponse {
                    name: o.name.clone(),
                    response: SimulationResponse::from(&o.result),
                })
                .collect(),
            comparisons: analysis.comparisons.clone(),
            mitigation_roi: analysis.mitigation_roi,
        }
    }
}
