//! Parameterized impact distributions and their inverse-CDF samplers.
//!
//! Every draw is shaped from a uniform value in (0, 1) supplied by the
//! correlation engine, so co-movement between risks is decided before the
//! marginal shape is applied.

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::special::{inv_inc_beta, inv_std_normal_cdf};

/// Closed set of supported impact distributions. Each variant carries its
/// own statically-checked parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Distribution {
    Triangular { min: f64, mode: f64, max: f64 },
    Normal { mean: f64, std_dev: f64 },
    LogNormal { mu: f64, sigma: f64 },
    Uniform { min: f64, max: f64 },
    Beta { alpha: f64, beta: f64, min: f64, max: f64 },
}

impl Distribution {
    pub fn name(&self) -> &'static str {
        match self {
            Distribution::Triangular { .. } => "triangular",
            Distribution::Normal { .. } => "normal",
            Distribution::LogNormal { .. } => "lognormal",
            Distribution::Uniform { .. } => "uniform",
            Distribution::Beta { .. } => "beta",
        }
    }

    /// Rejects parameter sets that violate ordering or positivity rules.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let invalid = |msg: String| Err(SimulationError::InvalidParameters(msg));

        match *self {
            Distribution::Triangular { min, mode, max } => {
                if !(min.is_finite() && mode.is_finite() && max.is_finite()) {
                    return invalid(format!(
                        "triangular parameters must be finite (min={min}, mode={mode}, max={max})"
                    ));
                }
                if !(min <= mode && mode <= max) {
                    return invalid(format!(
                        "triangular requires min <= mode <= max (min={min}, mode={mode}, max={max})"
                    ));
                }
            }
            Distribution::Normal { mean, std_dev } => {
                if !mean.is_finite() || !std_dev.is_finite() {
                    return invalid(format!(
                        "normal parameters must be finite (mean={mean}, std_dev={std_dev})"
                    ));
                }
                if std_dev <= 0.0 {
                    return invalid(format!("normal requires std_dev > 0 (std_dev={std_dev})"));
                }
            }
            Distribution::LogNormal { mu, sigma } => {
                if !mu.is_finite() || !sigma.is_finite() {
                    return invalid(format!(
                        "lognormal parameters must be finite (mu={mu}, sigma={sigma})"
                    ));
                }
                if sigma <= 0.0 {
                    return invalid(format!("lognormal requires sigma > 0 (sigma={sigma})"));
                }
            }
            Distribution::Uniform { min, max } => {
                if !min.is_finite() || !max.is_finite() {
                    return invalid(format!(
                        "uniform parameters must be finite (min={min}, max={max})"
                    ));
                }
                if min > max {
                    return invalid(format!("uniform requires min <= max (min={min}, max={max})"));
                }
            }
            Distribution::Beta {
                alpha,
                beta,
                min,
                max,
            } => {
                if !(alpha.is_finite() && beta.is_finite() && min.is_finite() && max.is_finite()) {
                    return invalid(format!(
                        "beta parameters must be finite (alpha={alpha}, beta={beta}, min={min}, max={max})"
                    ));
                }
                if alpha <= 0.0 || beta <= 0.0 {
                    return invalid(format!(
                        "beta requires alpha > 0 and beta > 0 (alpha={alpha}, beta={beta})"
                    ));
                }
                if min > max {
                    return invalid(format!("beta requires min <= max (min={min}, max={max})"));
                }
            }
        }

        Ok(())
    }

    /// Inverse-CDF draw at uniform `u` in (0, 1). Parameters are assumed
    /// validated; degenerate zero-width supports collapse to their single
    /// point.
    pub fn sample(&self, u: f64) -> f64 {
        debug_assert!(u > 0.0 && u < 1.0, "u must be in (0, 1)");

        match *self {
            Distribution::Triangular { min, mode, max } => {
                let span = max - min;
                if span == 0.0 {
                    return min;
                }
                let fc = (mode - min) / span;
                if u < fc {
                    min + (u * span * (mode - min)).sqrt()
                } else {
                    max - ((1.0 - u) * span * (max - mode)).sqrt()
                }
            }
            Distribution::Normal { mean, std_dev } => mean + std_dev * inv_std_normal_cdf(u),
            Distribution::LogNormal { mu, sigma } => (mu + sigma * inv_std_normal_cdf(u)).exp(),
            Distribution::Uniform { min, max } => min + u * (max - min),
            Distribution::Beta {
                alpha,
                beta,
                min,
                max,
            } => min + (max - min) * inv_inc_beta(alpha, beta, u),
        }
    }

    /// Theoretical mean, used when other risks are held at their expected
    /// value during contribution analysis.
    pub fn mean(&self) -> f64 {
        match *self {
            Distribution::Triangular { min, mode, max } => (min + mode + max) / 3.0,
            Distribution::Normal { mean, .. } => mean,
            Distribution::LogNormal { mu, sigma } => (mu + 0.5 * sigma * sigma).exp(),
            Distribution::Uniform { min, max } => 0.5 * (min + max),
            Distribution::Beta {
                alpha,
                beta,
                min,
                max,
            } => min + (max - min) * alpha / (alpha + beta),
        }
    }

    /// Distribution of the impact multiplied by `factor` in [0, 1].
    /// A factor of zero eliminates the risk entirely.
    pub fn scaled(&self, factor: f64) -> Distribution {
        debug_assert!(
            (0.0..=1.0).contains(&factor),
            "scale factor must be in [0, 1]"
        );

        if factor == 0.0 {
            return Distribution::Uniform { min: 0.0, max: 0.0 };
        }

        match *self {
            Distribution::Triangular { min, mode, max } => Distribution::Triangular {
                min: min * factor,
                mode: mode * factor,
                max: max * factor,
            },
            Distribution::Normal { mean, std_dev } => Distribution::Normal {
                mean: mean * factor,
                std_dev: std_dev * factor,
            },
            // factor * exp(N(mu, sigma)) = exp(N(mu + ln factor, sigma))
            Distribution::LogNormal { mu, sigma } => Distribution::LogNormal {
                mu: mu + factor.ln(),
                sigma,
            },
            Distribution::Uniform { min, max } => Distribution::Uniform {
                min: min * factor,
                max: max * factor,
            },
            Distribution::Beta {
                alpha,
                beta,
                min,
                max,
            } => Distribution::Beta {
                alpha,
                beta,
                min: min * factor,
                max: max * factor,
            },
        }
    }
}
