//! sedcap-rs: contaminant transport through layered sediment caps
//!
//! A one-dimensional engine for dissolved and sorbed chemicals in a stack of
//! cap and sediment layers below a water body. It solves
//!
//! ```text
//! R·∂C/∂t = ∂/∂z (D·∂C/∂z) + U·θ·∂C/∂z + reactions
//! ```
//!
//! on a depth grid with `z` increasing downward, with equilibrium or kinetic
//! sorption on several solid components, user reactions of arbitrary order,
//! bioturbation, consolidation or tidal flow, and deposition of new material
//! at the surface.
//!
//! # Architecture
//!
//! The physics is kept apart from the numerics:
//!
//! 1. **Configuration** ([`config`]): named, unit-bearing user input
//! 2. **Physics** ([`physics`], [`models`]): the normalized [`Model`](physics::Model)
//!    and the coefficients it implies at every grid point
//! 3. **Grid** ([`grid`]): segments, point roles, slot layout and deposition regridding
//! 4. **Solver** ([`solver`]): matrix assembly, Newton-Raphson and the time loop
//! 5. **Output** ([`output`]): profiles at the requested times, in user units
//!
//! # Quick Start
//!
//! ```rust
//! use sedcap_rs::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::new(SolverOptions::new(1.0, 0.05).with_outputs(3))
//!     .with_chemical(Chemical::new("PCB", 5e-6).with_log_koc(3.0))
//!     .with_component(Component::new("sand", 0.4, 2.6, 0.001))
//!     .with_matrix(Matrix::pure("sand", "sand"))
//!     .with_layer(Layer::new("cap", 10.0, 21, "sand"))
//!     .with_boundary(BoundaryCondition::new(
//!         "PCB",
//!         TopBoundary::FixedConcentration { concentration: 0.0 },
//!         BottomBoundary::FixedConcentration { concentration: 1.0 },
//!     ));
//!
//! let scenario = Scenario::new(&config)?;
//! let output = TransportSolver::new().solve(&scenario)?;
//! assert_eq!(output.len(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`config`]: user input and units
//! - [`physics`]: normalized model and point coefficients
//! - [`models`]: sorption isotherms, reactions, species table
//! - [`grid`]: grid topology and deposition
//! - [`solver`]: numerical solvers
//! - [`output`]: snapshots and derived profiles
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod grid;
pub mod models;
pub mod output;
pub mod physics;
pub mod solver;

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use sedcap_rs::prelude::*;
    //! ```
    pub use crate::config::{
        BottomBoundary, BoundaryCondition, Chemical, Component, Config, InitialCondition, Layer, Matrix, Profile,
        SolverOptions, TimeScheme, TopBoundary, UnitSystem,
    };
    pub use crate::error::{ConfigError, SolverError, SolverResult};
    pub use crate::output::{Field, SimulationOutput, Snapshot};
    pub use crate::physics::Model;
    pub use crate::solver::{Scenario, Solver, TransportSolver, run_batch};
}
