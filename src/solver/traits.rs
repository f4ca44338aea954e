//! Solver trait and time-scheme selection
//!
//! # Stability Guarantee
//!
//! - `Solver` trait: one entry point, `solve(&Scenario)`
//! - `TimeScheme` enum: EXTENSIBLE (new variants can be added)

use serde::{Deserialize, Serialize};

use crate::error::SolverResult;
use crate::output::SimulationOutput;

use super::Scenario;

/// Time discretization of the transport equation
///
/// Both schemes are θ-methods: the operator is weighted `w_new` at the new
/// time level and `w_old` at the previous one.
///
/// ```rust
/// use sedcap_rs::solver::TimeScheme;
///
/// assert_eq!(TimeScheme::CrankNicolson.implicit_weight(), 0.5);
/// assert_eq!(TimeScheme::Implicit.explicit_weight(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeScheme {
    /// Second order in time, weights ½/½
    #[default]
    CrankNicolson,
    /// Backward Euler, first order, L-stable
    Implicit,
}

impl TimeScheme {
    /// Weight of the new time level
    pub fn implicit_weight(self) -> f64 {
        match self {
            TimeScheme::CrankNicolson => 0.5,
            TimeScheme::Implicit => 1.0,
        }
    }

    /// Weight of the previous time level
    pub fn explicit_weight(self) -> f64 {
        1.0 - self.implicit_weight()
    }

    pub fn name(self) -> &'static str {
        match self {
            TimeScheme::CrankNicolson => "Crank-Nicolson",
            TimeScheme::Implicit => "Implicit",
        }
    }
}

/// A numerical method that runs a [`Scenario`] to completion
///
/// Implementations must be thread-safe so scenarios can run in parallel
/// (see [`run_batch`](super::run_batch)).
pub trait Solver: Send + Sync {
    /// Runs the whole time window and returns the output snapshots
    fn solve(&self, scenario: &Scenario) -> SolverResult<SimulationOutput>;

    /// Solver name for reporting
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_weights_sum_to_one() {
        for scheme in [TimeScheme::CrankNicolson, TimeScheme::Implicit] {
            assert_eq!(scheme.implicit_weight() + scheme.explicit_weight(), 1.0);
        }
    }

    #[test]
    fn test_scheme_serializes_by_name() {
        let json = serde_json::to_string(&TimeScheme::Implicit).unwrap();
        assert_eq!(json, "\"Implicit\"");
        assert_eq!(TimeScheme::default(), TimeScheme::CrankNicolson);
    }
}
