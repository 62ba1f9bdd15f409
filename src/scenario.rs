//! Named scenario runs and cross-scenario comparison.
//!
//! Every scenario in a set shares one master seed, so differences between
//! results come from the registers, not from sampling noise.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::mitigation::{apply_mitigation, mitigation_roi, MitigationRoi, MitigationStrategy};
use crate::risk::SimulationConfig;
use crate::runner::{run_simulation, SimulationResult};
use crate::settings::EngineSettings;
use crate::stats::Percentiles;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub config: SimulationConfig,
}

/// Ordered collection of scenarios, baseline first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSet {
    #[serde(default)]
    pub random_seed: Option<u64>,
    pub scenarios: Vec<Scenario>,
    #[serde(default)]
    pub mitigation: Option<MitigationStrategy>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub name: String,
    pub result: SimulationResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub scenario_a: String,
    pub scenario_b: String,
    /// mean_b - mean_a.
    pub cost_difference: f64,
    /// Per-percentile deltas, b minus a.
    pub percentile_differences: Percentiles,
    /// Cohen's d from pooled standard deviation. Reported, not asserted
    /// as significant; interpretation is the caller's.
    pub effect_size: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioAnalysis {
    pub outcomes: Vec<ScenarioOutcome>,
    pub comparisons: Vec<ScenarioComparison>,
    pub mitigation_roi: Option<MitigationRoi>,
}

/// Runs every scenario under one shared seed and compares each pair.
/// When a mitigation is supplied, a derived scenario is appended from the
/// baseline register and priced against it.
pub fn run_scenario_set(
    set: &ScenarioSet,
    settings: &EngineSettings,
) -> Result<ScenarioAnalysis, SimulationError> {
    if set.scenarios.is_empty() {
        return Err(SimulationError::InvalidParameters(
            "scenario set is empty".to_string(),
        ));
    }

    let seed = set
        .random_seed
        .or(set.scenarios[0].config.random_seed)
        .unwrap_or_else(|| OsRng.next_u64());

    let mut outcomes = Vec::with_capacity(set.scenarios.len() + 1);
    for scenario in &set.scenarios {
        let mut config = scenario.config.clone();
        config.random_seed = Some(seed);
        let result = run_simulation(&config, settings)?;
        outcomes.push(ScenarioOutcome {
            name: scenario.name.clone(),
            result,
        });
    }

    let roi = match &set.mitigation {
        Some(strategy) => {
            let baseline = &set.scenarios[0];
            let mut mitigated_config = apply_mitigation(&baseline.config, strategy)?;
            mitigated_config.random_seed = Some(seed);
            let mitigated_result = run_simulation(&mitigated_config, settings)?;
            let roi = mitigation_roi(&outcomes[0].result, &mitigated_result, strategy)?;
            outcomes.push(ScenarioOutcome {
                name: format!("{}-mitigated", baseline.name),
                result: mitigated_result,
            });
            Some(roi)
        }
        None => None,
    };

    let mut comparisons = Vec::new();
    for i in 0..outcomes.len() {
        for j in (i + 1)..outcomes.len() {
            comparisons.push(compare_outcomes(&outcomes[i], &outcomes[j]));
        }
    }

    Ok(ScenarioAnalysis {
        outcomes,
        comparisons,
        mitigation_roi: roi,
    })
}

/// Pairwise record between two completed scenarios.
pub fn compare_outcomes(a: &ScenarioOutcome, b: &ScenarioOutcome) -> ScenarioComparison {
    let ra = &a.result;
    let rb = &b.result;

    ScenarioComparison {
        scenario_a: a.name.clone(),
        scenario_b: b.name.clone(),
        cost_difference: rb.mean - ra.mean,
        percentile_differences: Percentiles {
            p10: rb.percentiles.p10 - ra.percentiles.p10,
            p50: rb.percentiles.p50 - ra.percentiles.p50,
            p90: rb.percentiles.p90 - ra.percentiles.p90,
            p95: rb.percentiles.p95 - ra.percentiles.p95,
        },
        effect_size: cohens_d(
            ra.mean,
            ra.std_dev,
            ra.samples.len(),
            rb.mean,
            rb.std_dev,
            rb.samples.len(),
        ),
    }
}

/// Standardized mean difference from pooled standard deviation.
fn cohens_d(
    mean_a: f64,
    std_a: f64,
    n_a: usize,
    mean_b: f64,
    std_b: f64,
    n_b: usize,
) -> f64 {
    if n_a < 2 || n_b < 2 {
        return 0.0;
    }
    let pooled_var = ((n_a - 1) as f64 * std_a * std_a + (n_b - 1) as f64 * std_b * std_b)
        / (n_a + n_b - 2) as f64;
    let pooled = pooled_var.sqrt();
    if pooled == 0.0 {
        return 0.0;
    }
    (mean_b - mean_a) / pooled
}

#[cfg(test)]
mod tests {
    use super::{run_scenario_set, Scenario, ScenarioSet};
    use crate::distributions::Distribution;
    use crate::mitigation::MitigationStrategy;
    use crate::risk::{Risk, RiskCategory, SimulationConfig};
    use crate::settings::EngineSettings;

    fn register(max: f64) -> SimulationConfig {
        SimulationConfig {
            iterations: 2_000,
            random_seed: None,
            baseline_cost: 1_000.0,
            risks: vec![Risk {
                id: "overrun".to_string(),
                category: RiskCategory::Cost,
                distribution: Distribution::Triangular {
                    min: 0.0,
                    mode: max / 2.0,
                    max,
                },
            }],
            correlations: Vec::new(),
        }
    }

    fn set(scenarios: Vec<Scenario>) -> ScenarioSet {
        ScenarioSet {
            random_seed: Some(21),
            scenarios,
            mitigation: None,
        }
    }

    #[test]
    fn scenario_compared_with_itself_is_flat() {
        let analysis = run_scenario_set(
            &set(vec![
                Scenario {
                    name: "baseline".to_string(),
                    config: register(10_000.0),
                },
                Scenario {
                    name: "baseline-copy".to_string(),
                    config: register(10_000.0),
                },
            ]),
            &EngineSettings::default(),
        )
        .unwrap();

        let cmp = &analysis.comparisons[0];
        assert_eq!(cmp.cost_difference, 0.0);
        assert_eq!(cmp.effect_size, 0.0);
        assert_eq!(cmp.percentile_differences.p90, 0.0);
    }

    #[test]
    fn pessimistic_scenario_shows_positive_difference() {
        let analysis = run_scenario_set(
            &set(vec![
                Scenario {
                    name: "baseline".to_string(),
                    config: register(10_000.0),
                },
                Scenario {
                    name: "pessimistic".to_string(),
                    config: register(40_000.0),
                },
            ]),
            &EngineSettings::default(),
        )
        .unwrap();

        let cmp = &analysis.comparisons[0];
        assert!(cmp.cost_difference > 0.0);
        assert!(cmp.effect_size > 0.0);
        assert!(cmp.percentile_differences.p90 > 0.0);
    }

    #[test]
    fn shared_seed_makes_scenarios_comparable() {
        let analysis = run_scenario_set(
            &set(vec![
                Scenario {
                    name: "a".to_string(),
                    config: register(10_000.0),
                },
                Scenario {
                    name: "b".to_string(),
                    config: register(10_000.0),
                },
            ]),
            &EngineSettings::default(),
        )
        .unwrap();

        assert_eq!(
            analysis.outcomes[0].result.samples,
            analysis.outcomes[1].result.samples
        );
    }

    #[test]
    fn mitigation_appends_a_derived_scenario_with_roi() {
        let mut s = set(vec![Scenario {
            name: "baseline".to_string(),
            config: register(100_000.0),
        }]);
        s.mitigation = Some(MitigationStrategy {
            cost: 5_000.0,
            effectiveness_percentage: 60.0,
            risk_ids_affected: vec!["overrun".to_string()],
        });

        let analysis = run_scenario_set(&s, &EngineSettings::default()).unwrap();
        assert_eq!(analysis.outcomes.len(), 2);
        assert_eq!(analysis.outcomes[1].name, "baseline-mitigated");

        let roi = analysis.mitigation_roi.unwrap();
        // Shrinking the dominant risk by 60% must free P90 contingency.
        assert!(roi.risk_reduction > 0.0);
    }

    #[test]
    fn empty_set_is_rejected() {
        let s = ScenarioSet {
            random_seed: None,
            scenarios: Vec::new(),
            mitigation: None,
        };
        assert!(run_scenario_set(&s, &EngineSettings::default()).is_err());
    }
}
