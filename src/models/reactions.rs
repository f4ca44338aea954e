//! Reaction network
//!
//! # Rate laws
//!
//! Every reaction produces a volumetric rate `r` (mass per bulk volume per
//! time) at each grid point:
//!
//! - **Mass action**: $r = \kappa \prod_s C_s^{o_s}$ over the reactants
//! - **Langmuir**: $r = \kappa \, C_x \, (q_{max} - q)$ where `q` is the
//!   sorbed species filling the sites
//!
//! The point factor $\kappa$ is the rate constant times a phase scale: the
//! porosity `e` for pore-water reactions, `fρ` for reactions on the solid
//! component (kinetic sorption).
//!
//! Species `s` gains $\nu_s r$: $\nu_s = -$coefficient for reactants and
//! $+$coefficient for products.
//!
//! # Classification
//!
//! A term is **linear** when it is mass action with exactly one reactant of
//! order 1: its contribution $\nu_s \kappa C_x$ is folded directly into the
//! operator. Everything else is **nonlinear** and enters as an explicit rate
//! vector with an analytic Jacobian for the Newton-Raphson correction.
//!
//! A mass-action or Langmuir rate is zero (and so is its gradient) as soon
//! as one of its reactants is non-positive.

/// One reactant or product of a reaction term
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Participant {
    pub species: usize,
    pub coefficient: f64,
    /// Reaction order (reactants only)
    pub order: f64,
}

impl Participant {
    pub fn new(species: usize, coefficient: f64, order: f64) -> Self {
        Self { species, coefficient, order }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateLaw {
    MassAction,
    /// Site-limited uptake onto the sorbed species `site` with capacity `capacity`
    Langmuir { capacity: f64, site: usize },
}

/// Phase a reaction happens in, which sets the point factor κ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateScale {
    /// Scaled by porosity
    Porewater,
    /// Scaled by `f·ρ` of the component
    Solid { component: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateConstant {
    /// Looked up per layer; the index is the user reaction index
    Layer(usize),
    Fixed(f64),
}

/// A reaction with names already resolved to species ids
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionTerm {
    pub name: String,
    pub reactants: Vec<Participant>,
    pub products: Vec<Participant>,
    pub law: RateLaw,
    pub scale: RateScale,
    pub constant: RateConstant,
}

impl ReactionTerm {
    pub fn is_linear(&self) -> bool {
        matches!(self.law, RateLaw::MassAction)
            && self.reactants.len() == 1
            && (self.reactants[0].order - 1.0).abs() < 1e-12
    }

    /// The lone reactant of a linear term
    pub fn linear_reactant(&self) -> Option<usize> {
        self.is_linear().then(|| self.reactants[0].species)
    }

    /// `(species, ν)` pairs: negative for reactants, positive for products
    pub fn stoichiometry(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.reactants
            .iter()
            .map(|p| (p.species, -p.coefficient))
            .chain(self.products.iter().map(|p| (p.species, p.coefficient)))
    }

    /// Every species the term reads or writes
    pub fn involves(&self, species: usize) -> bool {
        self.reactants.iter().chain(self.products.iter()).any(|p| p.species == species)
            || matches!(self.law, RateLaw::Langmuir { site, .. } if site == species)
    }

    pub fn species(&self) -> impl Iterator<Item = usize> + '_ {
        let site = match self.law {
            RateLaw::Langmuir { site, .. } => Some(site),
            RateLaw::MassAction => None,
        };
        self.reactants
            .iter()
            .chain(self.products.iter())
            .map(|p| p.species)
            .chain(site)
    }

    fn blocked(&self, value: &impl Fn(usize) -> f64) -> bool {
        self.reactants.iter().any(|p| value(p.species) <= 0.0)
    }

    /// Volumetric rate for point factor `kappa`
    pub fn rate(&self, kappa: f64, value: impl Fn(usize) -> f64) -> f64 {
        if kappa == 0.0 || self.blocked(&value) {
            return 0.0;
        }
        match self.law {
            RateLaw::MassAction => {
                kappa
                    * self
                        .reactants
                        .iter()
                        .map(|p| value(p.species).powf(p.order))
                        .product::<f64>()
            }
            RateLaw::Langmuir { capacity, site } => {
                let solute = self.reactants[0].species;
                kappa * value(solute) * (capacity - value(site))
            }
        }
    }

    /// `∂r/∂C_s` as `(species, derivative)` pairs; a species may appear twice
    pub fn rate_gradient(&self, kappa: f64, value: impl Fn(usize) -> f64) -> Vec<(usize, f64)> {
        if kappa == 0.0 || self.blocked(&value) {
            return Vec::new();
        }
        match self.law {
            RateLaw::MassAction => (0..self.reactants.len())
                .map(|i| {
                    let own = self.reactants[i];
                    let others: f64 = self
                        .reactants
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .map(|(_, p)| value(p.species).powf(p.order))
                        .product();
                    let d = own.order * value(own.species).powf(own.order - 1.0);
                    (own.species, kappa * d * others)
                })
                .collect(),
            RateLaw::Langmuir { capacity, site } => {
                let solute = self.reactants[0].species;
                vec![
                    (solute, kappa * (capacity - value(site))),
                    (site, -kappa * value(solute)),
                ]
            }
        }
    }
}

/// All reaction terms of a model, split once into linear and nonlinear sets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReactionNetwork {
    terms: Vec<ReactionTerm>,
    linear: Vec<usize>,
    nonlinear: Vec<usize>,
}

impl ReactionNetwork {
    pub fn new(terms: Vec<ReactionTerm>) -> Self {
        let (linear, nonlinear): (Vec<usize>, Vec<usize>) =
            (0..terms.len()).partition(|&i| terms[i].is_linear());
        Self { terms, linear, nonlinear }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[ReactionTerm] {
        &self.terms
    }

    /// Linear terms with their lone reactant
    pub fn linear_terms(&self) -> impl Iterator<Item = (usize, &ReactionTerm)> + '_ {
        self.linear
            .iter()
            .filter_map(|&i| self.terms[i].linear_reactant().map(|reactant| (reactant, &self.terms[i])))
    }

    pub fn nonlinear_terms(&self) -> impl Iterator<Item = &ReactionTerm> + '_ {
        self.nonlinear.iter().map(|&i| &self.terms[i])
    }

    pub fn has_nonlinear(&self) -> bool {
        !self.nonlinear.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn decay(order: f64) -> ReactionTerm {
        ReactionTerm {
            name: "decay".into(),
            reactants: vec![Participant::new(0, 1.0, order)],
            products: vec![Participant::new(1, 1.0, 0.0)],
            law: RateLaw::MassAction,
            scale: RateScale::Porewater,
            constant: RateConstant::Layer(0),
        }
    }

    // ── classification ────────────────────────────────────────────────────

    #[test]
    fn test_first_order_single_reactant_is_linear() {
        assert!(decay(1.0).is_linear());
        assert_eq!(decay(1.0).linear_reactant(), Some(0));
    }

    #[test]
    fn test_fractional_order_is_nonlinear() {
        assert!(!decay(0.5).is_linear());
        assert_eq!(decay(0.5).linear_reactant(), None);
    }

    #[test]
    fn test_two_reactants_are_nonlinear() {
        let mut term = decay(1.0);
        term.reactants.push(Participant::new(2, 1.0, 1.0));
        assert!(!term.is_linear());
    }

    #[test]
    fn test_langmuir_is_never_linear() {
        let mut term = decay(1.0);
        term.law = RateLaw::Langmuir { capacity: 10.0, site: 1 };
        assert!(!term.is_linear());
    }

    #[test]
    fn test_network_partitions_terms() {
        let network = ReactionNetwork::new(vec![decay(1.0), decay(2.0), decay(1.0)]);
        assert_eq!(network.len(), 3);
        assert_eq!(network.linear_terms().count(), 2);
        assert!(network.linear_terms().all(|(reactant, term)| reactant == 0 && term.is_linear()));
        assert_eq!(network.nonlinear_terms().count(), 1);
        assert!(network.has_nonlinear());
    }

    // ── rates ─────────────────────────────────────────────────────────────

    #[test]
    fn test_mass_action_rate_and_gradient() {
        let term = decay(2.0);
        let c = [3.0, 0.0];
        assert_relative_eq!(term.rate(0.5, |s| c[s]), 0.5 * 9.0, epsilon = 1e-12);

        let grad = term.rate_gradient(0.5, |s| c[s]);
        assert_eq!(grad.len(), 1);
        assert_eq!(grad[0].0, 0);
        assert_relative_eq!(grad[0].1, 0.5 * 2.0 * 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rate_clamped_when_reactant_non_positive() {
        let term = decay(0.5);
        assert_eq!(term.rate(1.0, |_| 0.0), 0.0);
        assert_eq!(term.rate(1.0, |_| -1e-3), 0.0);
        assert!(term.rate_gradient(1.0, |_| -1e-3).is_empty());
    }

    #[test]
    fn test_langmuir_rate_and_gradient() {
        let term = ReactionTerm {
            name: "sorption".into(),
            reactants: vec![Participant::new(0, 1.0, 1.0)],
            products: vec![Participant::new(1, 1.0, 0.0)],
            law: RateLaw::Langmuir { capacity: 10.0, site: 1 },
            scale: RateScale::Solid { component: 0 },
            constant: RateConstant::Fixed(2.0),
        };
        let c = [0.5, 4.0];
        assert_relative_eq!(term.rate(2.0, |s| c[s]), 2.0 * 0.5 * 6.0, epsilon = 1e-12);
        let grad = term.rate_gradient(2.0, |s| c[s]);
        assert_eq!(grad, vec![(0, 12.0), (1, -1.0)]);
        assert!(term.involves(1));
    }

    #[test]
    fn test_stoichiometry_signs() {
        let nu: Vec<_> = decay(1.0).stoichiometry().collect();
        assert_eq!(nu, vec![(0, -1.0), (1, 1.0)]);
    }
}
