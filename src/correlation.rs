//! Gaussian-copula correlation engine.
//!
//! The correlation matrix is factored once per run; each iteration then
//! turns k independent standard normals into k correlated uniforms, which
//! the distribution samplers shape into impacts. What a risk looks like
//! and how it co-moves with the others stay decoupled.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::SimulationError;
use crate::special::std_normal_cdf;

/// Uniforms handed to the inverse CDFs are kept strictly inside (0, 1).
const UNIT_EPS: f64 = 1.0e-12;

/// Factored correlation structure for one run.
#[derive(Debug, Clone)]
pub struct CorrelationModel {
    l: DMatrix<f64>,
    k: usize,
    identity: bool,
    /// Magnitude of the nearest-PSD eigenvalue correction, zero when the
    /// declared matrix was usable as-is. Surfaced so the approximation is
    /// never hidden from the caller.
    pub correction: f64,
}

impl CorrelationModel {
    /// Assembles the k-by-k matrix from declared pairs (identity
    /// everywhere else), factors it, repairing once if needed.
    pub fn build(
        k: usize,
        entries: &[(usize, usize, f64)],
        psd_floor: f64,
    ) -> Result<Self, SimulationError> {
        if entries.is_empty() {
            return Ok(Self {
                l: DMatrix::identity(k, k),
                k,
                identity: true,
                correction: 0.0,
            });
        }

        let mut matrix = DMatrix::<f64>::identity(k, k);
        for &(i, j, rho) in entries {
            debug_assert!(i < k && j < k && i != j, "entry indices out of range");
            debug_assert!(rho.abs() <= 1.0, "coefficient out of range");

            let existing = matrix[(i, j)];
            if existing != 0.0 && existing != rho {
                return Err(SimulationError::InvalidParameters(format!(
                    "conflicting coefficients for risk pair ({i}, {j}): {existing} vs {rho}"
                )));
            }
            matrix[(i, j)] = rho;
            matrix[(j, i)] = rho;
        }

        if let Some(chol) = matrix.clone().cholesky() {
            return Ok(Self {
                l: chol.l(),
                k,
                identity: false,
                correction: 0.0,
            });
        }

        let (repaired, correction) = nearest_psd(&matrix, psd_floor);
        match repaired.clone().cholesky() {
            Some(chol) => Ok(Self {
                l: chol.l(),
                k,
                identity: false,
                correction,
            }),
            None => Err(SimulationError::InvalidCorrelationMatrix {
                detail: format!(
                    "matrix is not positive semi-definite and could not be repaired:\n{}",
                    render_matrix(&matrix)
                ),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.k
    }

    pub fn is_empty(&self) -> bool {
        self.k == 0
    }

    /// One correlated uniform vector: z ~ N(0, I), y = L z, u_i = Phi(y_i).
    pub fn correlated_uniforms<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        let z = DVector::<f64>::from_fn(self.k, |_, _| rng.sample(StandardNormal));
        let y = if self.identity { z } else { &self.l * z };
        y.iter()
            .map(|&v| std_normal_cdf(v).clamp(UNIT_EPS, 1.0 - UNIT_EPS))
            .collect()
    }
}

/// Nearest positive-semi-definite projection: clamp the symmetric eigen
/// spectrum to `floor` and rescale back to a unit diagonal. Returns the
/// repaired matrix together with the correction magnitude (how far the
/// smallest eigenvalue fell below the floor).
pub fn nearest_psd(matrix: &DMatrix<f64>, floor: f64) -> (DMatrix<f64>, f64) {
    let eigen = matrix.clone().symmetric_eigen();
    let min_eigenvalue = eigen.eigenvalues.iter().copied().fold(f64::INFINITY, f64::min);
    let correction = (floor - min_eigenvalue).max(0.0);

    if correction == 0.0 {
        return (matrix.clone(), 0.0);
    }

    let clamped = DVector::from_iterator(
        eigen.eigenvalues.len(),
        eigen.eigenvalues.iter().map(|&v| v.max(floor)),
    );
    let recomposed =
        &eigen.eigenvectors * DMatrix::from_diagonal(&clamped) * eigen.eigenvectors.transpose();

    // Rescale so the diagonal is exactly 1 again.
    let k = recomposed.nrows();
    let mut repaired = DMatrix::<f64>::identity(k, k);
    for i in 0..k {
        for j in 0..k {
            if i != j {
                let scale = (recomposed[(i, i)] * recomposed[(j, j)]).sqrt();
                repaired[(i, j)] = recomposed[(i, j)] / scale;
            }
        }
    }

    (repaired, correction)
}

fn render_matrix(matrix: &DMatrix<f64>) -> String {
    let mut out = String::new();
    for i in 0..matrix.nrows() {
        let row: Vec<String> = (0..matrix.ncols())
            .map(|j| format!("{:+.4}", matrix[(i, j)]))
            .collect();
        out.push_str(&format!("[{}]\n", row.join(", ")));
    }
    out
}
