//! Physical description of a run
//!
//! This module turns a user [`Config`](crate::config::Config) into numbers the
//! solver can use directly.
//!
//! # Core Concepts
//!
//! - **Model** ([`Model`]): the configuration after name resolution and unit
//!   normalization. Chemicals, components and layers are indices; lengths
//!   are cm, times are years, diffusivities are cm²/yr.
//! - **Transport parameters** ([`TransportParameters`]): porosity, solid
//!   loadings, diffusivities and velocity at every grid point for one time
//!   level. Recomputed whenever the grid, the fractions or the velocity
//!   change.
//!
//! # Architecture
//!
//! The physics is **separate from the numerics**:
//! - `physics` says what the coefficients are
//! - [`solver`](crate::solver) says how the discrete system is built and solved
//!
//! ```rust
//! use sedcap_rs::config::*;
//! use sedcap_rs::physics::Model;
//!
//! let config = Config::new(SolverOptions::new(1.0, 0.01))
//!     .with_chemical(Chemical::new("PCB", 5e-6).with_log_koc(5.0))
//!     .with_component(Component::new("sand", 0.4, 2.6, 0.001))
//!     .with_matrix(Matrix::pure("sand", "sand"))
//!     .with_layer(Layer::new("cap", 30.0, 31, "sand"))
//!     .with_boundary(BoundaryCondition::new(
//!         "PCB",
//!         TopBoundary::FixedConcentration { concentration: 0.0 },
//!         BottomBoundary::FixedConcentration { concentration: 1.0 },
//!     ));
//!
//! let model = Model::from_config(&config).unwrap();
//! assert_eq!(model.n_chemicals(), 1);
//! ```

// =================================================================================================
// Module Declarations
// =================================================================================================

pub mod model;
pub mod transport;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use model::{ChemicalProps, ComponentProps, DepositionProps, LayerProps, Model, Partition, TimeWindow};
pub use transport::{
    BioShape, BioturbationProps, PointParameters, SegmentParameters, TransportParameters, VelocityLaw,
    bulk_diffusivity,
};
