//! Run options: time window, scheme, nonlinear solver, flow and surface processes

use serde::{Deserialize, Serialize};

use super::TimeScheme;

fn default_tolerance() -> f64 {
    1e-6
}

fn default_max_newton_iterations() -> usize {
    50
}

fn default_outputs() -> usize {
    11
}

fn default_coarsening_ratio() -> usize {
    3
}

/// Time-dependent part of the Darcy velocity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum VelocityModel {
    #[default]
    Steady,
    /// Consolidation expels pore water: `Vc·exp(−ln10·t/t90)` added to the base velocity
    Consolidation { initial_velocity: f64, t90: f64 },
    /// Tidal pumping: `A·sin(2πt/P)` added to the base velocity
    Tidal { amplitude: f64, period: f64 },
}

/// Depth profile of the biodiffusion coefficients
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum BioProfile {
    #[default]
    Uniform,
    /// `D(z) = D₀·exp(−z²/2σ²)` with `z` below the current surface
    Gaussian { sigma: f64 },
}

/// Biological mixing of the surface sediment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bioturbation {
    #[serde(default)]
    pub profile: BioProfile,
    /// Mixing depth below the current surface (length unit)
    pub depth: f64,
    /// Particle biodiffusivity (diffusivity unit)
    pub particle_diffusivity: f64,
    /// Pore-water biodiffusivity (diffusivity unit)
    #[serde(default)]
    pub porewater_diffusivity: f64,
    /// Also mix the solid composition (component fractions)
    #[serde(default)]
    pub biomix: bool,
}

/// Sediment accretion at the top of the domain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Deposition {
    /// Deposition velocity (length/time)
    pub velocity: f64,
    /// Spacing of newly deposited grid points (length unit)
    pub grid_spacing: f64,
    /// Number of fine intervals merged into one coarse interval
    #[serde(default = "default_coarsening_ratio")]
    pub coarsening_ratio: usize,
}

/// Options of one simulation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    #[serde(default)]
    pub start_time: f64,
    pub end_time: f64,
    pub time_step: f64,
    /// Number of evenly spaced output snapshots, `start_time` and `end_time` included
    #[serde(default = "default_outputs")]
    pub outputs: usize,
    #[serde(default)]
    pub scheme: TimeScheme,
    #[serde(default = "default_tolerance")]
    pub nonlinear_tolerance: f64,
    #[serde(default = "default_max_newton_iterations")]
    pub max_newton_iterations: usize,
    /// Base Darcy velocity, positive upward (length/time)
    #[serde(default)]
    pub darcy_velocity: f64,
    #[serde(default)]
    pub velocity: VelocityModel,
    #[serde(default)]
    pub bioturbation: Option<Bioturbation>,
    #[serde(default)]
    pub deposition: Option<Deposition>,
}

impl SolverOptions {
    pub fn new(end_time: f64, time_step: f64) -> Self {
        Self {
            start_time: 0.0,
            end_time,
            time_step,
            outputs: default_outputs(),
            scheme: TimeScheme::default(),
            nonlinear_tolerance: default_tolerance(),
            max_newton_iterations: default_max_newton_iterations(),
            darcy_velocity: 0.0,
            velocity: VelocityModel::Steady,
            bioturbation: None,
            deposition: None,
        }
    }

    pub fn with_outputs(mut self, outputs: usize) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_scheme(mut self, scheme: TimeScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_darcy_velocity(mut self, velocity: f64) -> Self {
        self.darcy_velocity = velocity;
        self
    }

    pub fn with_velocity_model(mut self, velocity: VelocityModel) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_bioturbation(mut self, bioturbation: Bioturbation) -> Self {
        self.bioturbation = Some(bioturbation);
        self
    }

    pub fn with_deposition(mut self, deposition: Deposition) -> Self {
        self.deposition = Some(deposition);
        self
    }

    pub fn with_nonlinear(mut self, tolerance: f64, max_iterations: usize) -> Self {
        self.nonlinear_tolerance = tolerance;
        self.max_newton_iterations = max_iterations;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_fields() {
        let options: SolverOptions = serde_json::from_str(r#"{"end_time":1.0,"time_step":0.01}"#).unwrap();
        assert_eq!(options.start_time, 0.0);
        assert_eq!(options.outputs, 11);
        assert_eq!(options.scheme, TimeScheme::CrankNicolson);
        assert_eq!(options.max_newton_iterations, 50);
        assert_eq!(options.velocity, VelocityModel::Steady);
        assert!(options.deposition.is_none());
    }

    #[test]
    fn test_deposition_default_ratio() {
        let dep: Deposition = serde_json::from_str(r#"{"velocity":1.0,"grid_spacing":0.1}"#).unwrap();
        assert_eq!(dep.coarsening_ratio, 3);
    }
}
