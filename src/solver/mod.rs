//! Numerical solvers
//!
//! A solver turns a [`Scenario`] (WHAT to solve: a normalized [`Model`])
//! into a [`SimulationOutput`]. The numerical method lives entirely in this
//! module; the physics it discretizes lives in [`crate::physics`].
//!
//! # Module Organization
//!
//! - **`traits`**: the [`Solver`] trait and the [`TimeScheme`] weights
//! - **`scenario`**: problem definition
//! - **`assembler`**: interior rows of the step system, Newton Jacobian
//! - **`boundary`**: top, bottom and interface rows
//! - **`fractions`**: biomixing of the solid composition
//! - **`stepper`**: [`TransportSolver`], the time loop
//!
//! # Workflow
//!
//! ```text
//! ┌────────┐    ┌──────────┐    ┌─────────────────┐    ┌──────────────────┐
//! │ Config │───▶│ Scenario │───▶│ TransportSolver │───▶│ SimulationOutput │
//! └────────┘    │ (Model)  │    │  (time loop)    │    │ (user units)     │
//!               └──────────┘    └─────────────────┘    └──────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sedcap_rs::config::*;
//! use sedcap_rs::solver::{Scenario, Solver, TransportSolver};
//!
//! let scenario = Scenario::new(&config)?;
//! let output = TransportSolver::new().solve(&scenario)?;
//! ```
//!
//! # Error Handling
//!
//! Every failure is a [`SolverError`](crate::error::SolverError) carrying the
//! step and the time at which it happened: a singular step matrix, a
//! non-finite value (usually a time step too large for the reactions), or a
//! Newton-Raphson correction that did not settle within its iteration cap.

mod assembler;
mod boundary;
mod fractions;
mod scenario;
mod stepper;
mod traits;

// =================================================================================================
// Parallel Execution Threshold
// =================================================================================================
//
// Independent scenarios (sensitivity sweeps, uncertainty runs) can be solved
// on the Rayon pool. Small batches are cheaper to run in sequence. The
// threshold is an AtomicUsize so benchmarks and tests can change it at
// runtime; Relaxed ordering is enough for a performance hint.
// =================================================================================================

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default batch size from which [`run_batch`] dispatches to Rayon
const DEFAULT_PARALLEL_THRESHOLD: usize = 2;

static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);

/// Return the current parallel-execution threshold.
///
/// ```rust
/// use sedcap_rs::solver::parallel_threshold;
///
/// assert!(parallel_threshold() > 0);
/// ```
pub fn parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

/// Set the parallel-execution threshold to a new value.
///
/// # Panics
///
/// Panics when `threshold == 0`.
pub fn set_parallel_threshold(threshold: usize) {
    assert!(threshold > 0, "parallel threshold must be at least 1");
    PARALLEL_THRESHOLD.store(threshold, Ordering::Relaxed);
}

/// Saves the threshold on construction and restores it on drop
#[cfg(test)]
pub(crate) struct ThresholdGuard {
    previous: usize,
}

#[cfg(test)]
impl ThresholdGuard {
    pub(crate) fn save(new_value: usize) -> Self {
        let previous = parallel_threshold();
        set_parallel_threshold(new_value);
        Self { previous }
    }
}

#[cfg(test)]
impl Drop for ThresholdGuard {
    fn drop(&mut self) {
        PARALLEL_THRESHOLD.store(self.previous, Ordering::Relaxed);
    }
}

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use assembler::{LinearSystem, TransportMatrixAssembler};
pub use fractions::PhaseFractionSolver;
pub use scenario::Scenario;
pub use stepper::TransportSolver;
pub use traits::{Solver, TimeScheme};

// =================================================================================================
// Helper Functions
// =================================================================================================

use nalgebra::DVector;

use crate::error::{SolverError, SolverResult};
use crate::grid::SlotLayout;
use crate::output::SimulationOutput;
use crate::physics::Model;

/// Fails on the first NaN or Inf in the unknown vector
pub(crate) fn validate_state(
    values: &DVector<f64>,
    layout: &SlotLayout,
    model: &Model,
    step: usize,
    time: f64,
) -> SolverResult<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(slot) => Err(SolverError::NonFinite {
            species: model.species_label(layout.species_of(slot)),
            step,
            time,
        }),
        None => Ok(()),
    }
}

/// Solves independent scenarios, in parallel when the `parallel` feature is on
///
/// Results come back in the order of `scenarios`.
pub fn run_batch<S: Solver>(solver: &S, scenarios: &[Scenario]) -> Vec<SolverResult<SimulationOutput>> {
    #[cfg(feature = "parallel")]
    {
        if scenarios.len() >= parallel_threshold() {
            use rayon::prelude::*;
            log::debug!("solving {} scenarios on the rayon pool", scenarios.len());
            return scenarios.par_iter().map(|s| solver.solve(s)).collect();
        }
    }
    scenarios.iter().map(|s| solver.solve(s)).collect()
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::*;
    use crate::grid::{DepositionState, GridTopology};

    fn config(concentration: f64) -> Config {
        Config::new(SolverOptions::new(0.5, 0.1))
            .with_chemical(Chemical::new("A", 1e-5))
            .with_component(Component::new("sand", 0.5, 1.3, 0.0))
            .with_matrix(Matrix::pure("sand", "sand"))
            .with_layer(Layer::new("cap", 2.0, 5, "sand"))
            .with_boundary(BoundaryCondition::new(
                "A",
                TopBoundary::FixedConcentration { concentration },
                BottomBoundary::ZeroGradient,
            ))
    }

    #[test]
    #[should_panic(expected = "parallel threshold must be at least 1")]
    fn test_zero_threshold_panics() {
        set_parallel_threshold(0);
    }

    #[test]
    fn test_threshold_guard_restores_previous_value() {
        let before = parallel_threshold();
        {
            let _guard = ThresholdGuard::save(42);
            assert_eq!(parallel_threshold(), 42);
        }
        assert_eq!(parallel_threshold(), before);
    }

    #[test]
    fn test_validate_state_names_species() {
        let model = Model::from_config(&config(1.0)).unwrap();
        let topology = GridTopology::build(&model, DepositionState::default()).unwrap();
        let layout = SlotLayout::new(&model, &topology);
        let mut values = DVector::zeros(layout.len());
        assert!(validate_state(&values, &layout, &model, 1, 0.1).is_ok());

        values[3] = f64::NAN;
        let err = validate_state(&values, &layout, &model, 4, 0.4).unwrap_err();
        assert_eq!(err, SolverError::NonFinite { species: "A".into(), step: 4, time: 0.4 });
    }

    #[test]
    fn test_batch_keeps_scenario_order() {
        let scenarios: Vec<Scenario> = [1.0, 2.0, 3.0]
            .iter()
            .map(|&c| Scenario::new(&config(c)).unwrap())
            .collect();
        let results = run_batch(&TransportSolver::new(), &scenarios);
        assert_eq!(results.len(), 3);
        for (result, expected) in results.iter().zip([1.0, 2.0, 3.0]) {
            let output = result.as_ref().unwrap();
            let surface = output.final_snapshot().unwrap().value(crate::output::Field::PoreWater, 0, 0);
            approx::assert_relative_eq!(surface.unwrap(), expected, epsilon = 1e-12);
        }
    }
}
