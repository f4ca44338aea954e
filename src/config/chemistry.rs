//! Sorption table entries, reactions and per-layer rate constants

use serde::{Deserialize, Serialize};

/// Equilibrium relation between pore-water and sorbed concentration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum IsothermSpec {
    /// `q = Kd·C`
    LinearKd { kd: f64 },
    /// `q = 10^logKoc·foc·C`; uses the chemical's `log_koc` when `log_koc` is absent
    LinearKocFoc {
        #[serde(default)]
        log_koc: Option<f64>,
    },
    /// `q = Kf·C^N`
    Freundlich { kf: f64, n: f64 },
    /// `q = qmax·b·C / (1 + b·C)`
    Langmuir { qmax: f64, b: f64 },
}

/// Whether the sorbed phase is at equilibrium or relaxes towards it
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum KineticsSpec {
    #[default]
    Equilibrium,
    /// Desorption rate constant (1/time); the sorption rate is derived from it
    /// so that the kinetic steady state reproduces the isotherm
    Transient { kdesorp: f64 },
}

/// Sorption of one chemical onto one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SorptionEntry {
    pub component: String,
    pub chemical: String,
    pub isotherm: IsothermSpec,
    #[serde(default)]
    pub kinetics: KineticsSpec,
}

impl SorptionEntry {
    pub fn equilibrium(component: impl Into<String>, chemical: impl Into<String>, isotherm: IsothermSpec) -> Self {
        Self {
            component: component.into(),
            chemical: chemical.into(),
            isotherm,
            kinetics: KineticsSpec::Equilibrium,
        }
    }

    pub fn transient(
        component: impl Into<String>,
        chemical: impl Into<String>,
        isotherm: IsothermSpec,
        kdesorp: f64,
    ) -> Self {
        Self {
            component: component.into(),
            chemical: chemical.into(),
            isotherm,
            kinetics: KineticsSpec::Transient { kdesorp },
        }
    }
}

/// Rate law of a user reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReactionModel {
    /// Mass action: each reactant's order equals its stoichiometric coefficient
    #[default]
    Fundamental,
    /// Each reactant carries its own order (defaults to 1)
    UserDefined,
}

/// One participant of a reaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionSpecies {
    pub chemical: String,
    pub coefficient: f64,
    #[serde(default)]
    pub order: Option<f64>,
}

impl ReactionSpecies {
    pub fn new(chemical: impl Into<String>, coefficient: f64) -> Self {
        Self { chemical: chemical.into(), coefficient, order: None }
    }

    pub fn with_order(mut self, order: f64) -> Self {
        self.order = Some(order);
        self
    }
}

/// A pore-water reaction between dissolved chemicals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub name: String,
    pub reactants: Vec<ReactionSpecies>,
    #[serde(default)]
    pub products: Vec<ReactionSpecies>,
    #[serde(default)]
    pub model: ReactionModel,
}

impl Reaction {
    /// `reactant → product` with first-order kinetics
    pub fn first_order(name: impl Into<String>, reactant: &str, product: Option<&str>) -> Self {
        Self {
            name: name.into(),
            reactants: vec![ReactionSpecies::new(reactant, 1.0)],
            products: product.map(|p| vec![ReactionSpecies::new(p, 1.0)]).unwrap_or_default(),
            model: ReactionModel::Fundamental,
        }
    }
}

/// Rate constant of a reaction inside a layer (1/time for first order)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub layer: String,
    pub reaction: String,
    pub rate: f64,
}

impl Coefficient {
    pub fn new(layer: impl Into<String>, reaction: impl Into<String>, rate: f64) -> Self {
        Self { layer: layer.into(), reaction: reaction.into(), rate }
    }
}
