//! Sorption isotherms
//!
//! # Isotherms
//!
//! | Kind           | $q(C)$                              | $K = q/C$                 | $dq/dC$                      |
//! |----------------|-------------------------------------|---------------------------|------------------------------|
//! | Linear Kd      | $K_d C$                             | $K_d$                     | $K_d$                        |
//! | Linear Koc·foc | $K_{oc} f_{oc} C$                   | $K_{oc} f_{oc}$           | $K_{oc} f_{oc}$              |
//! | Freundlich     | $K_f C^N$                           | $K_f C^{N-1}$             | $N K_f C^{N-1}$              |
//! | Langmuir       | $\frac{q_{max} b C}{1 + bC}$        | $\frac{q_{max} b}{1+bC}$  | $\frac{q_{max} b}{(1+bC)^2}$ |
//!
//! `K` and `dq/dC` are evaluated at `max(C, Cmax·1e-10)`: the running maximum
//! `Cmax` of the chemical scales the floor, which keeps `C^{N-1}` finite for
//! Freundlich exponents below one.
//!
//! # Kinetic sorption
//!
//! Under transient kinetics the sorbed concentration `q` is its own unknown,
//! driven by a forward and a reverse reaction on the solid (`fρ` scaled):
//!
//! | Kind       | sorption rate             | desorption rate       |
//! |------------|---------------------------|-----------------------|
//! | Linear     | $k_s C$                   | $k_d q$               |
//! | Freundlich | $k_s C$                   | $k_d q^{1/N}$         |
//! | Langmuir   | $k_s C (q_{max} - q)$     | $k_d q$               |
//!
//! with $k_s$ derived from $k_d$ so that the kinetic steady state is the isotherm:
//! $K k_d$, $K_f^{1/N} k_d$ and $b k_d$ respectively.

use super::reactions::{Participant, RateConstant, RateLaw, RateScale, ReactionTerm};

/// Relative floor applied to concentrations before evaluating `K` or `dq/dC`
pub const CONCENTRATION_FLOOR: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Isotherm {
    LinearKd { kd: f64 },
    LinearKocFoc { koc: f64, foc: f64 },
    Freundlich { kf: f64, n: f64 },
    Langmuir { qmax: f64, b: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kinetics {
    Equilibrium,
    Transient { ksorp: f64, kdesorp: f64 },
}

/// Sorption of one chemical on one solid component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SorptionModel {
    pub isotherm: Isotherm,
    pub kinetics: Kinetics,
}

fn floored(c: f64, cmax: f64) -> f64 {
    let floor = if cmax > 0.0 { cmax * CONCENTRATION_FLOOR } else { CONCENTRATION_FLOOR };
    c.max(floor)
}

impl SorptionModel {
    pub fn equilibrium(isotherm: Isotherm) -> Self {
        Self { isotherm, kinetics: Kinetics::Equilibrium }
    }

    /// Transient sorption with desorption rate `kdesorp` (1/yr)
    pub fn transient(isotherm: Isotherm, kdesorp: f64) -> Self {
        let ksorp = match isotherm {
            Isotherm::LinearKd { kd } => kd * kdesorp,
            Isotherm::LinearKocFoc { koc, foc } => koc * foc * kdesorp,
            Isotherm::Freundlich { kf, n } => kf.powf(1.0 / n) * kdesorp,
            Isotherm::Langmuir { b, .. } => b * kdesorp,
        };
        Self { isotherm, kinetics: Kinetics::Transient { ksorp, kdesorp } }
    }

    pub fn is_kinetic(&self) -> bool {
        matches!(self.kinetics, Kinetics::Transient { .. })
    }

    /// Whether `K` depends on concentration
    pub fn is_nonlinear(&self) -> bool {
        match self.isotherm {
            Isotherm::LinearKd { .. } | Isotherm::LinearKocFoc { .. } => false,
            Isotherm::Freundlich { n, .. } => (n - 1.0).abs() > 1e-12,
            Isotherm::Langmuir { .. } => true,
        }
    }

    /// Effective partition coefficient `q(C)/C`
    pub fn partition(&self, c: f64, cmax: f64) -> f64 {
        match self.isotherm {
            Isotherm::LinearKd { kd } => kd,
            Isotherm::LinearKocFoc { koc, foc } => koc * foc,
            Isotherm::Freundlich { kf, n } => kf * floored(c, cmax).powf(n - 1.0),
            Isotherm::Langmuir { qmax, b } => qmax * b / (1.0 + b * floored(c, cmax)),
        }
    }

    /// Derivative `dq/dC` used by the Newton-Raphson Jacobian
    pub fn derivative(&self, c: f64, cmax: f64) -> f64 {
        match self.isotherm {
            Isotherm::LinearKd { kd } => kd,
            Isotherm::LinearKocFoc { koc, foc } => koc * foc,
            Isotherm::Freundlich { kf, n } => n * kf * floored(c, cmax).powf(n - 1.0),
            Isotherm::Langmuir { qmax, b } => {
                let denom = 1.0 + b * floored(c, cmax);
                qmax * b / (denom * denom)
            }
        }
    }

    /// Sorbed concentration at equilibrium with `c`
    pub fn sorbed(&self, c: f64) -> f64 {
        match self.isotherm {
            Isotherm::LinearKd { kd } => kd * c,
            Isotherm::LinearKocFoc { koc, foc } => koc * foc * c,
            Isotherm::Freundlich { kf, n } => {
                if c > 0.0 { kf * c.powf(n) } else { 0.0 }
            }
            Isotherm::Langmuir { qmax, b } => {
                if c > 0.0 { qmax * b * c / (1.0 + b * c) } else { 0.0 }
            }
        }
    }

    /// Forward and reverse reaction terms for a kinetic pair
    ///
    /// Returns `None` for equilibrium sorption.
    pub fn kinetic_terms(
        &self,
        label: &str,
        component: usize,
        solute: usize,
        sorbed: usize,
    ) -> Option<[ReactionTerm; 2]> {
        let Kinetics::Transient { ksorp, kdesorp } = self.kinetics else {
            return None;
        };
        let scale = RateScale::Solid { component };

        let sorption_law = match self.isotherm {
            Isotherm::Langmuir { qmax, .. } => RateLaw::Langmuir { capacity: qmax, site: sorbed },
            _ => RateLaw::MassAction,
        };
        let desorption_order = match self.isotherm {
            Isotherm::Freundlich { n, .. } => 1.0 / n,
            _ => 1.0,
        };

        let sorption = ReactionTerm {
            name: format!("sorption {label}"),
            reactants: vec![Participant::new(solute, 1.0, 1.0)],
            products: vec![Participant::new(sorbed, 1.0, 0.0)],
            law: sorption_law,
            scale,
            constant: RateConstant::Fixed(ksorp),
        };
        let desorption = ReactionTerm {
            name: format!("desorption {label}"),
            reactants: vec![Participant::new(sorbed, 1.0, desorption_order)],
            products: vec![Participant::new(solute, 1.0, 0.0)],
            law: RateLaw::MassAction,
            scale,
            constant: RateConstant::Fixed(kdesorp),
        };
        Some([sorption, desorption])
    }
}
