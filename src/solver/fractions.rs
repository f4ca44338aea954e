//! Biomixing of the solid composition
//!
//! With biomixing enabled the volume fractions of the solid components
//! diffuse through the bioturbated zone with the particle biodiffusivity.
//! The update is an implicit finite-volume step on points `0..=pbio` with
//! no-flux faces at both ends:
//!
//! $$
//! w_i \frac{f_i^{n+1} - f_i^n}{\Delta t}
//!   = D_{i+½} \frac{f_{i+1}^{n+1} - f_i^{n+1}}{z_{i+1} - z_i}
//!   - D_{i-½} \frac{f_i^{n+1} - f_{i-1}^{n+1}}{z_i - z_{i-1}}
//! $$
//!
//! where `w_i` is the control width of point `i`. Every component obeys the
//! same linear operator, which maps a constant to itself, so `Σ_j f_j = 1`
//! is preserved at every point and `Σ_i w_i f_i` is conserved per component.

use nalgebra::DMatrix;

use crate::grid::GridTopology;
use crate::physics::BioturbationProps;

/// Implicit diffusion of the fraction matrix over the bioturbated zone
#[derive(Debug, Clone)]
pub struct PhaseFractionSolver {
    z: Vec<f64>,
    diffusivity: Vec<f64>,
}

impl PhaseFractionSolver {
    /// `z` and `diffusivity` cover points `0..=pbio`
    pub fn new(z: &[f64], diffusivity: Vec<f64>) -> Self {
        Self { z: z[..diffusivity.len()].to_vec(), diffusivity }
    }

    /// Solver for the current bioturbated zone of `topology`
    pub fn for_topology(topology: &GridTopology, bio: &BioturbationProps) -> Option<Self> {
        let pbio = topology.bio_index()?;
        let z = topology.z();
        let diffusivity = (0..=pbio).map(|i| bio.particle * bio.intensity(z[i] - z[0])).collect();
        Some(Self::new(z, diffusivity))
    }

    /// Control width of every point in the mixed zone
    pub fn widths(&self) -> Vec<f64> {
        let n = self.z.len();
        (0..n)
            .map(|i| {
                let up = if i > 0 { self.z[i] - self.z[i - 1] } else { 0.0 };
                let down = if i + 1 < n { self.z[i + 1] - self.z[i] } else { 0.0 };
                0.5 * (up + down)
            })
            .collect()
    }

    /// Advances `fractions` (components × points) by `dt`
    ///
    /// Columns beyond the mixed zone are copied. Returns `None` when the
    /// step matrix cannot be factorized.
    pub fn step(&self, fractions: &DMatrix<f64>, dt: f64) -> Option<DMatrix<f64>> {
        let n = self.z.len();
        if n < 2 {
            return Some(fractions.clone());
        }

        let widths = self.widths();
        let mut matrix = DMatrix::zeros(n, n);
        for i in 0..n {
            matrix[(i, i)] = widths[i] / dt;
        }
        for i in 0..n - 1 {
            let face = 0.5 * (self.diffusivity[i] + self.diffusivity[i + 1]) / (self.z[i + 1] - self.z[i]);
            matrix[(i, i)] += face;
            matrix[(i, i + 1)] -= face;
            matrix[(i + 1, i + 1)] += face;
            matrix[(i + 1, i)] -= face;
        }

        // one right-hand side per component
        let rhs = DMatrix::from_fn(n, fractions.nrows(), |i, j| widths[i] / dt * fractions[(j, i)]);
        let solved = matrix.lu().solve(&rhs)?;

        let mut out = fractions.clone();
        for i in 0..n {
            for j in 0..fractions.nrows() {
                out[(j, i)] = solved[(i, j)];
            }
        }
        Some(out)
    }
}
