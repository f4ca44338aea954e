//! Boundary and initial conditions

use serde::{Deserialize, Serialize};

/// Condition at the sediment/water interface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TopBoundary {
    /// Pore water at the surface is held at `concentration`
    FixedConcentration { concentration: f64 },
    /// Benthic-boundary-layer exchange `−D∂C/∂z = k·(Cw − C₀)`
    MassTransfer { coefficient: f64, water_concentration: f64 },
    /// Well-mixed overlying water column of `depth` flushed with residence time `residence_time`
    MixedWaterColumn {
        depth: f64,
        residence_time: f64,
        #[serde(default)]
        inflow_concentration: f64,
    },
}

impl TopBoundary {
    /// Concentration carried by the overlying water when it is known up front
    ///
    /// A mixed water column evolves with the solution, so it returns `None`.
    pub fn water_concentration(&self) -> Option<f64> {
        match self {
            TopBoundary::FixedConcentration { concentration } => Some(*concentration),
            TopBoundary::MassTransfer { water_concentration, .. } => Some(*water_concentration),
            TopBoundary::MixedWaterColumn { .. } => None,
        }
    }
}

/// Condition at the bottom of the domain
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum BottomBoundary {
    FixedConcentration { concentration: f64 },
    /// Flux continuity with an underlying reservoir at `concentration`
    FluxMatching { concentration: f64 },
    #[default]
    ZeroGradient,
}

/// Top and bottom conditions of one chemical
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCondition {
    pub chemical: String,
    pub top: TopBoundary,
    #[serde(default)]
    pub bottom: BottomBoundary,
}

impl BoundaryCondition {
    pub fn new(chemical: impl Into<String>, top: TopBoundary, bottom: BottomBoundary) -> Self {
        Self { chemical: chemical.into(), top, bottom }
    }
}

/// Concentration profile inside one layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Profile {
    Uniform { value: f64 },
    /// Varies linearly from the top of the layer to its bottom
    Linear { top: f64, bottom: f64 },
}

impl Profile {
    /// Value at relative position `s ∈ [0, 1]` from the top of the layer
    pub fn at(&self, s: f64) -> f64 {
        match self {
            Profile::Uniform { value } => *value,
            Profile::Linear { top, bottom } => top + (bottom - top) * s.clamp(0.0, 1.0),
        }
    }

    /// Value at the top of the layer
    pub fn top(&self) -> f64 {
        self.at(0.0)
    }
}

/// Initial pore-water (or sorbed, when `component` is set) concentration in a layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialCondition {
    pub layer: String,
    pub chemical: String,
    #[serde(default)]
    pub component: Option<String>,
    pub profile: Profile,
}

impl InitialCondition {
    pub fn dissolved(layer: impl Into<String>, chemical: impl Into<String>, profile: Profile) -> Self {
        Self { layer: layer.into(), chemical: chemical.into(), component: None, profile }
    }

    pub fn sorbed(
        layer: impl Into<String>,
        component: impl Into<String>,
        chemical: impl Into<String>,
        profile: Profile,
    ) -> Self {
        Self {
            layer: layer.into(),
            chemical: chemical.into(),
            component: Some(component.into()),
            profile,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_profile_interpolates_and_clamps() {
        let p = Profile::Linear { top: 2.0, bottom: 0.0 };
        assert_eq!(p.at(0.0), 2.0);
        assert_eq!(p.at(0.5), 1.0);
        assert_eq!(p.at(1.5), 0.0);
        assert_eq!(Profile::Uniform { value: 3.0 }.at(0.7), 3.0);
    }

    #[test]
    fn test_water_concentration_of_top_boundaries() {
        let fixed = TopBoundary::FixedConcentration { concentration: 1.0 };
        let bbl = TopBoundary::MassTransfer { coefficient: 5.0, water_concentration: 0.2 };
        let cstr = TopBoundary::MixedWaterColumn { depth: 100.0, residence_time: 1.0, inflow_concentration: 0.0 };
        assert_eq!(fixed.water_concentration(), Some(1.0));
        assert_eq!(bbl.water_concentration(), Some(0.2));
        assert_eq!(cstr.water_concentration(), None);
    }

    #[test]
    fn test_bottom_defaults_to_zero_gradient() {
        let bc: BoundaryCondition = serde_json::from_str(
            r#"{"chemical":"A","top":{"kind":"FixedConcentration","concentration":1.0}}"#,
        )
        .unwrap();
        assert_eq!(bc.bottom, BottomBoundary::ZeroGradient);
    }
}
