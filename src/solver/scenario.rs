//! Simulation scenario definition
//!
//! A scenario is a normalized [`Model`] with a name. It is the "WHAT to
//! solve"; the same scenario can be run by any [`Solver`](super::Solver).

use crate::config::Config;
use crate::error::ConfigResult;
use crate::physics::Model;

/// Simulation scenario
///
/// # Examples
///
/// ```rust
/// use sedcap_rs::config::*;
/// use sedcap_rs::solver::Scenario;
///
/// let config = Config::new(SolverOptions::new(1.0, 0.1))
///     .with_chemical(Chemical::new("A", 1e-5))
///     .with_component(Component::new("sand", 0.4, 2.6, 0.0))
///     .with_matrix(Matrix::pure("sand", "sand"))
///     .with_layer(Layer::new("cap", 10.0, 11, "sand"))
///     .with_boundary(BoundaryCondition::new(
///         "A",
///         TopBoundary::FixedConcentration { concentration: 1.0 },
///         BottomBoundary::ZeroGradient,
///     ));
///
/// let scenario = Scenario::new(&config).unwrap().with_name("sand cap");
/// assert_eq!(scenario.name(), "sand cap");
/// ```
#[derive(Clone)]
pub struct Scenario {
    name: String,
    model: Model,
}

impl Scenario {
    /// Normalizes `config`; fails on structural errors
    pub fn new(config: &Config) -> ConfigResult<Self> {
        Ok(Self::from_model(Model::from_config(config)?))
    }

    pub fn from_model(model: Model) -> Self {
        let name = model
            .chemicals
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Self { name, model }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn layers(&self) -> usize {
        self.model.base_layers().len()
    }

    pub fn species(&self) -> usize {
        self.model.species.len()
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name())
            .field("layers", &self.layers())
            .field("species", &self.species())
            .field("scheme", &self.model.scheme)
            .field("deposition", &self.model.deposition.is_some())
            .finish()
    }
}

// ================================================================================================
// Tests
// ================================================================================================
