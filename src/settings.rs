//! Engine tuning knobs, independent of any one risk register.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BLOCK_SIZE: usize = 1_000;
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 0.001;
pub const DEFAULT_CONTRIBUTION_ITERATIONS: usize = 1_000;
pub const DEFAULT_PSD_FLOOR: f64 = 1.0e-10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Iterations per convergence/scheduling block.
    pub block_size: usize,
    /// Relative running-mean change below which a block counts as stable.
    pub convergence_threshold: f64,
    /// Iterations used per risk by the variance-contribution estimate.
    pub contribution_iterations: usize,
    /// Eigenvalue floor applied during nearest-PSD repair.
    pub psd_floor: f64,
    /// Wall-clock budget for one run; unset means unbounded.
    pub max_runtime_ms: Option<u64>,
    /// Worker threads; unset uses the process-wide default pool.
    pub threads: Option<usize>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
            contribution_iterations: DEFAULT_CONTRIBUTION_ITERATIONS,
            psd_floor: DEFAULT_PSD_FLOOR,
            max_runtime_ms: None,
            threads: None,
        }
    }
}

impl EngineSettings {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file: {}", path.display()))?;
        let settings: EngineSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse TOML settings: {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            bail!("block_size must be > 0");
        }
        if self.convergence_threshold <= 0.0 || !self.convergence_threshold.is_finite() {
            bail!("convergence_threshold must be finite and > 0");
        }
        if self.contribution_iterations == 0 {
            bail!("contribution_iterations must be > 0");
        }
        if self.psd_floor <= 0.0 || !self.psd_floor.is_finite() {
            bail!("psd_floor must be finite and > 0");
        }
        if self.threads == Some(0) {
            bail!("threads must be > 0 when set");
        }
        Ok(())
    }
}
