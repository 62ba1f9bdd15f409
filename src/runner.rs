//! Iteration orchestration: a validated configuration in, an immutable
//! result out.
//!
//! Iterations are grouped into fixed-size blocks. Every block owns a
//! ChaCha stream derived from the master seed and the block index, so the
//! merged sample array is bit-identical no matter how many workers run or
//! in which order blocks finish. The wall-clock budget is checked between
//! waves of blocks, never mid-iteration.

use std::time::{Duration, Instant};

use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::contribution::{risk_contributions, RiskContribution};
use crate::convergence::{Convergence, ConvergenceMonitor};
use crate::correlation::CorrelationModel;
use crate::error::SimulationError;
use crate::risk::SimulationConfig;
use crate::settings::EngineSettings;
use crate::stats::{summarize, ConfidenceIntervals, Percentiles};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Sampling,
    Aggregating,
    Complete,
    Failed,
}

/// Immutable outcome of one simulation run. May be shared freely for
/// reading; nothing mutates it after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub samples: Vec<f64>,
    pub iterations: usize,
    /// Effective master seed (generated when the config left it unset).
    pub seed: u64,
    pub mean: f64,
    pub std_dev: f64,
    pub percentiles: Percentiles,
    pub confidence_intervals: ConfidenceIntervals,
    pub convergence: Convergence,
    pub risk_contributions: Vec<RiskContribution>,
    /// Nearest-PSD repair magnitude applied to the correlation matrix,
    /// zero when the declared matrix factored cleanly.
    pub correlation_correction: f64,
}

#[derive(Debug, Clone, Copy)]
struct BlockSpec {
    index: usize,
    len: usize,
}

pub struct SimulationRunner {
    settings: EngineSettings,
    phase: RunPhase,
}

impl SimulationRunner {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            phase: RunPhase::Idle,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Executes one full run. Fails atomically: a partial sample set is
    /// never surfaced as a result.
    pub fn run(&mut self, config: &SimulationConfig) -> Result<SimulationResult, SimulationError> {
        self.phase = RunPhase::Idle;
        let result = self.run_inner(config);
        self.phase = match &result {
            Ok(_) => RunPhase::Complete,
            Err(_) => RunPhase::Failed,
        };
        result
    }

    fn run_inner(
        &mut self,
        config: &SimulationConfig,
    ) -> Result<SimulationResult, SimulationError> {
        config.validate()?;
        let entries = correlation_entries(config);
        let model =
            CorrelationModel::build(config.risks.len(), &entries, self.settings.psd_floor)?;
        let seed = config.random_seed.unwrap_or_else(|| OsRng.next_u64());

        self.phase = RunPhase::Sampling;
        let started = Instant::now();
        let budget = self.settings.max_runtime_ms.map(Duration::from_millis);

        let pool = match self.settings.threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| {
                        SimulationError::SimulationFailed(format!(
                            "failed to build worker pool: {e}"
                        ))
                    })?,
            ),
            None => None,
        };
        let width = self
            .settings
            .threads
            .unwrap_or_else(rayon::current_num_threads)
            .max(1);

        let blocks = block_plan(config.iterations, self.settings.block_size);
        let mut samples = Vec::with_capacity(config.iterations);
        let mut monitor = ConvergenceMonitor::new(self.settings.convergence_threshold);

        for wave in blocks.chunks(width) {
            if let Some(limit) = budget {
                if started.elapsed() > limit {
                    return Err(SimulationError::SimulationTimeout {
                        budget_ms: limit.as_millis() as u64,
                        completed_iterations: samples.len(),
                        convergence: monitor.finalize(),
                    });
                }
            }

            let work = || {
                wave.par_iter()
                    .map(|block| run_block(block, config, &model, seed))
                    .collect::<Result<Vec<Vec<f64>>, SimulationError>>()
            };
            let produced = match &pool {
                Some(p) => p.install(work),
                None => work(),
            }?;

            for block_samples in produced {
                monitor.observe_block(block_samples.iter().sum(), block_samples.len());
                samples.extend_from_slice(&block_samples);
            }
        }

        self.phase = RunPhase::Aggregating;
        let summary = summarize(&samples);
        let contributions =
            risk_contributions(config, seed, self.settings.contribution_iterations)?;

        Ok(SimulationResult {
            iterations: samples.len(),
            samples,
            seed,
            mean: summary.mean,
            std_dev: summary.std_dev,
            percentiles: summary.percentiles,
            confidence_intervals: summary.confidence_intervals,
            convergence: monitor.finalize(),
            risk_contributions: contributions,
            correlation_correction: model.correction,
        })
    }
}

/// One-shot convenience over [`SimulationRunner`].
pub fn run_simulation(
    config: &SimulationConfig,
    settings: &EngineSettings,
) -> Result<SimulationResult, SimulationError> {
    SimulationRunner::new(settings.clone()).run(config)
}

fn correlation_entries(config: &SimulationConfig) -> Vec<(usize, usize, f64)> {
    config
        .correlations
        .iter()
        .map(|pair| {
            // Ids were checked during validation.
            let i = config.risk_index(&pair.risk_id_a).unwrap();
            let j = config.risk_index(&pair.risk_id_b).unwrap();
            (i, j, pair.coefficient)
        })
        .collect()
}

fn block_plan(iterations: usize, block_size: usize) -> Vec<BlockSpec> {
    let mut blocks = Vec::new();
    let mut remaining = iterations;
    let mut index = 0;
    while remaining > 0 {
        let len = remaining.min(block_size);
        blocks.push(BlockSpec { index, len });
        remaining -= len;
        index += 1;
    }
    blocks
}

fn run_block(
    block: &BlockSpec,
    config: &SimulationConfig,
    model: &CorrelationModel,
    seed: u64,
) -> Result<Vec<f64>, SimulationError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    // Stream 0 is never used; block streams start at 1 and contribution
    // analysis lives in a disjoint range.
    rng.set_stream(block.index as u64 + 1);

    let mut out = Vec::with_capacity(block.len);
    for _ in 0..block.len {
        let uniforms = model.correlated_uniforms(&mut rng);
        let mut total = config.baseline_cost;
        for (risk, &u) in config.risks.iter().zip(uniforms.iter()) {
            total += risk.distribution.sample(u);
        }
        if !total.is_finite() {
            return Err(SimulationError::SimulationFailed(format!(
                "non-finite outcome in block {}",
                block.index
            )));
        }
        out.push(total);
    }
    Ok(out)
}
