//! Chemicals, solid components, matrices and layers

use serde::{Deserialize, Serialize};

/// A dissolved contaminant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chemical {
    pub name: String,

    /// Molecular weight **\[g/mol\]**, informational
    #[serde(default)]
    pub molecular_weight: f64,

    /// Aqueous molecular diffusivity `Dw` (diffusivity unit)
    pub diffusivity: f64,

    /// log10 of the organic-carbon partition coefficient **\[L/kg\]**
    #[serde(default)]
    pub log_koc: f64,

    /// log10 of the DOC partition coefficient **\[L/kg\]**; no DOC binding when absent
    #[serde(default)]
    pub log_kdoc: Option<f64>,
}

impl Chemical {
    pub fn new(name: impl Into<String>, diffusivity: f64) -> Self {
        Self {
            name: name.into(),
            molecular_weight: 0.0,
            diffusivity,
            log_koc: 0.0,
            log_kdoc: None,
        }
    }

    pub fn with_molecular_weight(mut self, molecular_weight: f64) -> Self {
        self.molecular_weight = molecular_weight;
        self
    }

    pub fn with_log_koc(mut self, log_koc: f64) -> Self {
        self.log_koc = log_koc;
        self
    }

    pub fn with_log_kdoc(mut self, log_kdoc: f64) -> Self {
        self.log_kdoc = Some(log_kdoc);
        self
    }
}

/// A solid constituent of the sediment/cap matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    /// Porosity `e` of a bed made only of this component
    pub porosity: f64,
    /// Bulk density `ρ` **\[kg/L\]**
    pub density: f64,
    /// Organic-carbon fraction
    #[serde(default)]
    pub foc: f64,
}

impl Component {
    pub fn new(name: impl Into<String>, porosity: f64, density: f64, foc: f64) -> Self {
        Self { name: name.into(), porosity, density, foc }
    }
}

/// A component and its volumetric share inside a [`Matrix`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixComponent {
    pub component: String,
    pub fraction: f64,
}

/// Named material: a mixture of components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub name: String,
    pub components: Vec<MatrixComponent>,
}

impl Matrix {
    /// Single-component material
    pub fn pure(name: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: vec![MatrixComponent { component: component.into(), fraction: 1.0 }],
        }
    }

    pub fn mixture(name: impl Into<String>, parts: &[(&str, f64)]) -> Self {
        Self {
            name: name.into(),
            components: parts
                .iter()
                .map(|(component, fraction)| MatrixComponent {
                    component: component.to_string(),
                    fraction: *fraction,
                })
                .collect(),
        }
    }
}

/// Tortuosity correction applied to the molecular diffusivity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tortuosity {
    /// `D = e·Dw`
    None,
    /// `D = e^(4/3)·Dw`
    #[default]
    MillingtonQuirk,
    /// `D = e·Dw / (1 − ln e²)`
    Boudreau,
}

/// A horizontal slab of the domain, listed top to bottom
///
/// With deposition enabled the first layer describes the deposited material;
/// its `thickness` and `points` are ignored because it starts empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    /// Thickness (length unit)
    pub thickness: f64,
    /// Grid points including both end points
    pub points: usize,
    /// Name of the [`Matrix`] filling the layer
    pub matrix: String,
    #[serde(default)]
    pub tortuosity: Tortuosity,
    /// Dissolved organic carbon **\[mg/L\]**
    #[serde(default)]
    pub doc: f64,
    /// Hydrodynamic dispersivity `α` (length unit)
    #[serde(default)]
    pub dispersivity: f64,
}

impl Layer {
    pub fn new(name: impl Into<String>, thickness: f64, points: usize, matrix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            thickness,
            points,
            matrix: matrix.into(),
            tortuosity: Tortuosity::default(),
            doc: 0.0,
            dispersivity: 0.0,
        }
    }

    pub fn with_tortuosity(mut self, tortuosity: Tortuosity) -> Self {
        self.tortuosity = tortuosity;
        self
    }

    pub fn with_doc(mut self, doc: f64) -> Self {
        self.doc = doc;
        self
    }

    pub fn with_dispersivity(mut self, dispersivity: f64) -> Self {
        self.dispersivity = dispersivity;
        self
    }
}
