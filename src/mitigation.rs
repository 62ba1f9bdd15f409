//! Mitigation strategies: deriving a reduced risk register and pricing
//! the intervention against the P90 contingency shift it buys.

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::risk::SimulationConfig;
use crate::runner::SimulationResult;

/// A candidate intervention. Lives only long enough to derive a mitigated
/// register and price the result; nothing persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MitigationStrategy {
    pub cost: f64,
    /// How much of each affected risk's impact the mitigation removes.
    pub effectiveness_percentage: f64,
    pub risk_ids_affected: Vec<String>,
}

impl MitigationStrategy {
    pub fn validate(&self, config: &SimulationConfig) -> Result<(), SimulationError> {
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(SimulationError::InvalidParameters(format!(
                "mitigation cost must be finite and >= 0 (got {})",
                self.cost
            )));
        }
        if !(0.0..=100.0).contains(&self.effectiveness_percentage) {
            return Err(SimulationError::InvalidParameters(format!(
                "effectiveness_percentage must be in [0, 100] (got {})",
                self.effectiveness_percentage
            )));
        }
        if self.risk_ids_affected.is_empty() {
            return Err(SimulationError::InvalidParameters(
                "mitigation affects no risks".to_string(),
            ));
        }
        for id in &self.risk_ids_affected {
            if config.risk_index(id).is_none() {
                return Err(SimulationError::InvalidParameters(format!(
                    "mitigation references unknown risk '{id}'"
                )));
            }
        }
        Ok(())
    }
}

/// Derives the mitigated register: affected risks keep their shape but
/// shrink by the mitigation's effectiveness; everything else is untouched.
pub fn apply_mitigation(
    config: &SimulationConfig,
    strategy: &MitigationStrategy,
) -> Result<SimulationConfig, SimulationError> {
    strategy.validate(config)?;

    let factor = 1.0 - strategy.effectiveness_percentage / 100.0;
    let mut mitigated = config.clone();
    for risk in &mut mitigated.risks {
        if strategy.risk_ids_affected.iter().any(|id| *id == risk.id) {
            risk.distribution = risk.distribution.scaled(factor);
        }
    }
    Ok(mitigated)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MitigationRoi {
    /// P90 contingency freed by the mitigation.
    pub risk_reduction: f64,
    /// (risk_reduction - cost) / cost.
    pub roi: f64,
}

impl MitigationRoi {
    /// Prices a mitigation from the two P90 outcomes. A zero cost leaves
    /// the ratio undefined and is rejected rather than fabricated.
    pub fn from_p90(
        baseline_p90: f64,
        mitigated_p90: f64,
        strategy: &MitigationStrategy,
    ) -> Result<Self, SimulationError> {
        if strategy.cost == 0.0 {
            return Err(SimulationError::DivisionByZero);
        }
        let risk_reduction = baseline_p90 - mitigated_p90;
        Ok(Self {
            risk_reduction,
            roi: (risk_reduction - strategy.cost) / strategy.cost,
        })
    }
}

/// ROI of a mitigation given the baseline and mitigated run results.
pub fn mitigation_roi(
    baseline: &SimulationResult,
    mitigated: &SimulationResult,
    strategy: &MitigationStrategy,
) -> Result<MitigationRoi, SimulationError> {
    MitigationRoi::from_p90(
        baseline.percentiles.p90,
        mitigated.percentiles.p90,
        strategy,
    )
}

#[cfg(test)]
mod tests {
    use super::{apply_mitigation, MitigationRoi, MitigationStrategy};
    use crate::distributions::Distribution;
    use crate::error::SimulationError;
    use crate::risk::{Risk, RiskCategory, SimulationConfig};

    fn strategy(cost: f64) -> MitigationStrategy {
        MitigationStrategy {
            cost,
            effectiveness_percentage: 50.0,
            risk_ids_affected: vec!["a".to_string()],
        }
    }

    fn config() -> SimulationConfig {
        SimulationConfig {
            iterations: 1_000,
            random_seed: Some(1),
            baseline_cost: 0.0,
            risks: vec![
                Risk {
                    id: "a".to_string(),
                    category: RiskCategory::Cost,
                    distribution: Distribution::Triangular {
                        min: 100.0,
                        mode: 200.0,
                        max: 400.0,
                    },
                },
                Risk {
                    id: "b".to_string(),
                    category: RiskCategory::Schedule,
                    distribution: Distribution::Uniform {
                        min: 0.0,
                        max: 50.0,
                    },
                },
            ],
            correlations: Vec::new(),
        }
    }

    #[test]
    fn roi_from_the_worked_example() {
        let roi = MitigationRoi::from_p90(1_450_000.0, 1_350_000.0, &strategy(25_000.0)).unwrap();
        assert!((roi.risk_reduction - 100_000.0).abs() < 1e-9);
        assert!((roi.roi - 3.0).abs() < 1e-9);
    }

    #[test]
    fn zero_cost_is_rejected_not_fabricated() {
        let err = MitigationRoi::from_p90(100.0, 50.0, &strategy(0.0)).unwrap_err();
        assert!(matches!(err, SimulationError::DivisionByZero));
    }

    #[test]
    fn negative_reduction_yields_negative_roi() {
        // Mitigated P90 got worse; ROI must reflect the loss.
        let roi = MitigationRoi::from_p90(100.0, 120.0, &strategy(10.0)).unwrap();
        assert!(roi.roi < -1.0);
    }

    #[test]
    fn apply_scales_only_affected_risks() {
        let cfg = config();
        let mitigated = apply_mitigation(&cfg, &strategy(10.0)).unwrap();
        let original_mean = cfg.risks[0].distribution.mean();
        assert!((mitigated.risks[0].distribution.mean() - 0.5 * original_mean).abs() < 1e-9);
        assert_eq!(mitigated.risks[1].distribution, cfg.risks[1].distribution);
    }

    #[test]
    fn unknown_affected_risk_is_rejected() {
        let mut s = strategy(10.0);
        s.risk_ids_affected = vec!["ghost".to_string()];
        assert!(apply_mitigation(&config(), &s).is_err());
    }

    #[test]
    fn out_of_range_effectiveness_is_rejected() {
        let mut s = strategy(10.0);
        s.effectiveness_percentage = 120.0;
        assert!(apply_mitigation(&config(), &s).is_err());
    }
}
