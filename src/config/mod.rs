//! Simulation input
//!
//! The configuration is a plain, serde-(de)serializable description of one
//! run, written by the user-facing layer and consumed by
//! [`Scenario::new`](crate::solver::Scenario::new). Entities refer to each
//! other by name; names are resolved to indices exactly once, when the
//! configuration is normalized into a [`Model`](crate::physics::Model).
//!
//! Nothing here checks physical plausibility (fractions summing to one,
//! porosity in `(0, 1)`); normalization only rejects inputs that cannot
//! describe a grid or a rate law.
//!
//! # Example
//!
//! ```rust
//! use sedcap_rs::config::*;
//!
//! let config = Config::new(SolverOptions::new(1.0, 0.01))
//!     .with_chemical(Chemical::new("PCB", 1e-5).with_log_koc(3.0))
//!     .with_component(Component::new("sand", 0.5, 1.3, 0.01))
//!     .with_matrix(Matrix::pure("sand", "sand"))
//!     .with_layer(Layer::new("cap", 10.0, 21, "sand"))
//!     .with_sorption(SorptionEntry::equilibrium(
//!         "sand", "PCB", IsothermSpec::LinearKocFoc { log_koc: None },
//!     ))
//!     .with_boundary(BoundaryCondition::new(
//!         "PCB",
//!         TopBoundary::FixedConcentration { concentration: 1.0 },
//!         BottomBoundary::ZeroGradient,
//!     ));
//! assert_eq!(config.layers.len(), 1);
//! ```

pub mod units;
mod chemistry;
mod conditions;
mod materials;
mod options;

use serde::{Deserialize, Serialize};

pub use chemistry::{
    Coefficient, IsothermSpec, KineticsSpec, Reaction, ReactionModel, ReactionSpecies, SorptionEntry,
};
pub use conditions::{BottomBoundary, BoundaryCondition, InitialCondition, Profile, TopBoundary};
pub use materials::{Chemical, Component, Layer, Matrix, MatrixComponent, Tortuosity};
pub use options::{BioProfile, Bioturbation, Deposition, SolverOptions, VelocityModel};
pub use units::UnitSystem;

pub use crate::solver::TimeScheme;

/// Complete description of one simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub units: UnitSystem,
    pub chemicals: Vec<Chemical>,
    pub components: Vec<Component>,
    pub matrices: Vec<Matrix>,
    /// Top to bottom
    pub layers: Vec<Layer>,
    /// Pairs missing from the table do not sorb
    #[serde(default)]
    pub sorption: Vec<SorptionEntry>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    /// Missing (layer, reaction) pairs have a zero rate constant
    #[serde(default)]
    pub coefficients: Vec<Coefficient>,
    /// Exactly one entry per chemical
    pub boundaries: Vec<BoundaryCondition>,
    /// Missing entries start at zero
    #[serde(default)]
    pub initial: Vec<InitialCondition>,
    pub options: SolverOptions,
}

impl Config {
    pub fn new(options: SolverOptions) -> Self {
        Self {
            units: UnitSystem::default(),
            chemicals: Vec::new(),
            components: Vec::new(),
            matrices: Vec::new(),
            layers: Vec::new(),
            sorption: Vec::new(),
            reactions: Vec::new(),
            coefficients: Vec::new(),
            boundaries: Vec::new(),
            initial: Vec::new(),
            options,
        }
    }

    pub fn with_units(mut self, units: UnitSystem) -> Self {
        self.units = units;
        self
    }

    pub fn with_chemical(mut self, chemical: Chemical) -> Self {
        self.chemicals.push(chemical);
        self
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_matrix(mut self, matrix: Matrix) -> Self {
        self.matrices.push(matrix);
        self
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn with_sorption(mut self, entry: SorptionEntry) -> Self {
        self.sorption.push(entry);
        self
    }

    pub fn with_reaction(mut self, reaction: Reaction) -> Self {
        self.reactions.push(reaction);
        self
    }

    pub fn with_coefficient(mut self, coefficient: Coefficient) -> Self {
        self.coefficients.push(coefficient);
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryCondition) -> Self {
        self.boundaries.push(boundary);
        self
    }

    pub fn with_initial(mut self, initial: InitialCondition) -> Self {
        self.initial.push(initial);
        self
    }
}
