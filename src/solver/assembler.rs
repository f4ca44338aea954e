//! Discrete transport system
//!
//! One time step solves
//!
//! $$
//! A\,C^{n+1} + a = B\,C^n + b
//! $$
//!
//! where `A`/`a` hold the new-level terms (they depend on the Newton guess
//! through nonlinear sorption and reactions) and `B`/`b` the previous-level
//! terms (assembled once per step). With the θ-weights `w_new`/`w_old` of
//! the [`TimeScheme`](super::TimeScheme), an interior row reads
//!
//! ```text
//! A[r,r] += R_new/Δt      A[r,·] −= w_new·L_new      a[r] −= w_new·N(guess)
//! B[r,r] += R_old/Δt      B[r,·] += w_old·L_old      b[r] += w_old·N(Cⁿ)
//! ```
//!
//! with `R` the retardation (`eθ + ΣfρK` dissolved, `fρ` sorbed), `L` the
//! conservative diffusion plus upwind-biased advection operator and linear
//! reactions, and `N` the nonlinear reaction rates. End points under a
//! flux condition follow the same pattern over a half control volume; their
//! outer-face exchange, fixed concentrations and interface rows live in
//! [`boundary`](super::boundary).
//!
//! # Newton Jacobian
//!
//! `J = A + diag((Σfρ·q′ − ΣfρK)/Δt) − w_new·∂N/∂C`, i.e. the exact
//! derivative of the accumulation and reaction terms. The dependence of the
//! diffusivity on `C` (particle biodiffusion of nonlinear sorption) is left
//! out.

use nalgebra::{DMatrix, DVector};

use crate::grid::{GridTopology, PointRole, SlotLayout};
use crate::models::{RateScale, ReactionTerm, Species};
use crate::physics::{Model, TransportParameters};

/// Component fraction below which a sorbed species row degenerates to identity
pub(crate) const FRACTION_EPS: f64 = 1e-12;

/// Buffers of one step's linear system
#[derive(Debug, Clone)]
pub struct LinearSystem {
    pub a_matrix: DMatrix<f64>,
    pub a_vector: DVector<f64>,
    pub b_matrix: DMatrix<f64>,
    pub b_vector: DVector<f64>,
    pub jacobian: DMatrix<f64>,
}

impl LinearSystem {
    pub fn new(size: usize) -> Self {
        Self {
            a_matrix: DMatrix::zeros(size, size),
            a_vector: DVector::zeros(size),
            b_matrix: DMatrix::zeros(size, size),
            b_vector: DVector::zeros(size),
            jacobian: DMatrix::zeros(size, size),
        }
    }

    pub fn size(&self) -> usize {
        self.a_vector.len()
    }

    /// Resizes after a regrid; contents are cleared by the next assembly
    pub fn resize(&mut self, size: usize) {
        if self.size() != size {
            *self = Self::new(size);
        }
    }

    /// `B·Cⁿ + b`
    pub fn explicit_side(&self, previous: &DVector<f64>) -> DVector<f64> {
        &self.b_matrix * previous + &self.b_vector
    }

    /// `A·x + a − rhs`
    pub fn residual(&self, x: &DVector<f64>, rhs: &DVector<f64>) -> DVector<f64> {
        &self.a_matrix * x + &self.a_vector - rhs
    }
}

/// Time level a set of coefficients is evaluated at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Level {
    Current,
    Next,
}

/// Coefficients of one species at one point on one side
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Coefficients {
    /// Retardation `R`
    pub capacity: f64,
    /// `∂(R·C)/∂C`
    pub slope: f64,
    pub diffusivity: f64,
    /// `U·θ`
    pub advection: f64,
}

/// Interior-row contributions, before time weighting
#[derive(Debug, Default)]
struct Contributions {
    accumulation: Vec<(usize, f64, f64)>,
    operator: Vec<(usize, usize, f64)>,
    rates: Vec<(usize, f64)>,
    gradient: Vec<(usize, usize, f64)>,
    identity: Vec<usize>,
}

/// Builds `A`, `a`, `B`, `b` and the Newton Jacobian for one step
pub struct TransportMatrixAssembler<'a> {
    pub(crate) model: &'a Model,
    pub(crate) topology: &'a GridTopology,
    pub(crate) layout: &'a SlotLayout,
    pub(crate) current: &'a TransportParameters,
    pub(crate) next: &'a TransportParameters,
    pub(crate) previous: &'a DVector<f64>,
    pub(crate) cmax: &'a [f64],
    pub(crate) dt: f64,
}

impl<'a> TransportMatrixAssembler<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model: &'a Model,
        topology: &'a GridTopology,
        layout: &'a SlotLayout,
        current: &'a TransportParameters,
        next: &'a TransportParameters,
        previous: &'a DVector<f64>,
        cmax: &'a [f64],
        dt: f64,
    ) -> Self {
        Self { model, topology, layout, current, next, previous, cmax, dt }
    }

    pub(crate) fn params(&self, level: Level) -> &TransportParameters {
        match level {
            Level::Current => self.current,
            Level::Next => self.next,
        }
    }

    /// Coefficients of `species` at `point` seen from `segment`
    pub(crate) fn coefficients(
        &self,
        level: Level,
        conc: &DVector<f64>,
        segment: usize,
        point: usize,
        species: usize,
    ) -> Coefficients {
        let params = self.params(level);
        let local = self.topology.segment(segment).local(point);
        let p = params.point(segment, local);
        match self.model.species.get(species) {
            Species::Dissolved { chemical } => {
                let c = self.layout.slot(point, chemical).map_or(0.0, |slot| conc[slot]);
                let partition = self.model.equilibrium_partition(&p.solid, chemical, c, self.cmax[chemical]);
                let water = p.water_capacity(chemical);
                Coefficients {
                    capacity: water + partition.capacity,
                    slope: water + partition.slope,
                    diffusivity: p.dissolved_diffusivity(chemical, partition.capacity),
                    advection: params.velocity * p.theta[chemical],
                }
            }
            Species::Sorbed { component, .. } => Coefficients {
                capacity: p.solid[component],
                slope: p.solid[component],
                diffusivity: p.sorbed_diffusivity(component),
                advection: 0.0,
            },
        }
    }

    /// Whether a sorbed row has lost its solid phase at the new level
    pub(crate) fn is_degenerate(&self, segment: usize, point: usize, species: usize) -> bool {
        match self.model.species.get(species) {
            Species::Dissolved { .. } => false,
            Species::Sorbed { component, .. } => {
                let local = self.topology.segment(segment).local(point);
                self.next.point(segment, local).fraction[component] < FRACTION_EPS
            }
        }
    }

    // ── interior rows ─────────────────────────────────────────────────────

    fn interior(&self, level: Level, conc: &DVector<f64>, with_gradient: bool) -> Contributions {
        let mut out = Contributions::default();
        for point in 0..self.topology.n_points() {
            let segment = match self.topology.role(point) {
                PointRole::Interior { segment } => segment,
                PointRole::Top { segment } => {
                    self.half_cell(level, conc, segment, point, point + 1, with_gradient, &mut out);
                    continue;
                }
                PointRole::Bottom { segment } => {
                    self.half_cell(level, conc, segment, point, point - 1, with_gradient, &mut out);
                    continue;
                }
                PointRole::Interface { .. } => continue,
            };
            for (row, species) in self.layout.slots_at(point) {
                if self.is_degenerate(segment, point, species) {
                    out.identity.push(row);
                    continue;
                }
                let here = self.coefficients(level, conc, segment, point, species);
                out.accumulation.push((row, here.capacity, here.slope));
                self.transport(level, conc, segment, point, species, here, row, &mut out.operator);
            }
            self.reactions(level, conc, segment, point, with_gradient, |_| true, &mut out);
        }
        out
    }

    /// Half control volume at a flux boundary, per unit volume of the half cell
    ///
    /// Storage, diffusion through the inner face and reactions; the exchange
    /// through the outer face is added with the boundary rows.
    #[allow(clippy::too_many_arguments)]
    fn half_cell(
        &self,
        level: Level,
        conc: &DVector<f64>,
        segment: usize,
        point: usize,
        neighbour: usize,
        with_gradient: bool,
        out: &mut Contributions,
    ) {
        let h = self.topology.segment(segment).spacing;
        let mut any = false;
        for (row, species) in self.layout.slots_at(point) {
            if !self.is_half_cell(point, species) {
                continue;
            }
            let here = self.coefficients(level, conc, segment, point, species);
            let inner = self.coefficients(level, conc, segment, neighbour, species);
            let face = 0.5 * (here.diffusivity + inner.diffusivity) * 2.0 / (h * h);
            out.accumulation.push((row, here.capacity, here.slope));
            if let Some(col) = self.layout.slot(neighbour, species) {
                out.operator.push((row, col, face));
                out.operator.push((row, row, -face));
            }
            any = true;
        }
        if any {
            self.reactions(level, conc, segment, point, with_gradient, |species| self.is_half_cell(point, species), out);
        }
    }

    /// Conservative diffusion and upwind-biased advection of one interior row
    #[allow(clippy::too_many_arguments)]
    fn transport(
        &self,
        level: Level,
        conc: &DVector<f64>,
        segment: usize,
        point: usize,
        species: usize,
        here: Coefficients,
        row: usize,
        operator: &mut Vec<(usize, usize, f64)>,
    ) {
        let seg = self.topology.segment(segment);
        let h = seg.spacing;
        let above = self.coefficients(level, conc, segment, point - 1, species);
        let below = self.coefficients(level, conc, segment, point + 1, species);
        let d_minus = 0.5 * (above.diffusivity + here.diffusivity);
        let d_plus = 0.5 * (here.diffusivity + below.diffusivity);

        // stencils stay inside a segment that carries the species
        let mut push = |i: usize, coef: f64| {
            if let Some(col) = self.layout.slot(i, species) {
                operator.push((row, col, coef));
            }
        };
        push(point - 1, d_minus / (h * h));
        push(point, -(d_minus + d_plus) / (h * h));
        push(point + 1, d_plus / (h * h));

        let v = here.advection;
        if v == 0.0 {
            return;
        }
        let mut weights = seg.centered_derivative(point);
        let upwind = if v > 0.0 && point + 2 <= seg.end {
            Some(vec![(point, -1.5 / h), (point + 1, 2.0 / h), (point + 2, -0.5 / h)])
        } else if v < 0.0 && point >= seg.start + 2 {
            Some(vec![(point, 1.5 / h), (point - 1, -2.0 / h), (point - 2, 0.5 / h)])
        } else {
            None
        };
        if let Some(upwind) = upwind {
            for w in &mut weights {
                w.1 *= 2.0 / 3.0;
            }
            weights.extend(upwind.into_iter().map(|(i, w)| (i, w / 3.0)));
        }
        for (i, w) in weights {
            push(i, v * w);
        }
    }

    /// Reaction terms at one point, entered into the rows `accepts` selects
    #[allow(clippy::too_many_arguments)]
    fn reactions(
        &self,
        level: Level,
        conc: &DVector<f64>,
        segment: usize,
        point: usize,
        with_gradient: bool,
        accepts: impl Fn(usize) -> bool,
        out: &mut Contributions,
    ) {
        let layer = self.topology.segment(segment).layer;
        let local = self.topology.segment(segment).local(point);
        let p = self.params(level).point(segment, local);
        let live = |species: usize| {
            self.layout
                .slot(point, species)
                .filter(|_| accepts(species) && !self.is_degenerate(segment, point, species))
        };

        let scaled_constant = |term: &ReactionTerm| {
            if term.species().any(|s| self.layout.slot(point, s).is_none()) {
                return 0.0;
            }
            let scale = match term.scale {
                RateScale::Porewater => p.porosity,
                RateScale::Solid { component } => p.solid[component],
            };
            self.model.rate_constant(layer, term) * scale
        };

        for (reactant, term) in self.model.reactions.linear_terms() {
            let kappa = scaled_constant(term);
            if kappa == 0.0 {
                continue;
            }
            let Some(col) = self.layout.slot(point, reactant) else {
                continue;
            };
            for (species, nu) in term.stoichiometry() {
                if let Some(row) = live(species) {
                    out.operator.push((row, col, nu * kappa));
                }
            }
        }

        let value = |s: usize| self.layout.slot(point, s).map_or(0.0, |slot| conc[slot]);
        for term in self.model.reactions.nonlinear_terms() {
            let kappa = scaled_constant(term);
            if kappa == 0.0 {
                continue;
            }
            let rate = term.rate(kappa, value);
            let gradient = if with_gradient { term.rate_gradient(kappa, value) } else { Vec::new() };
            for (species, nu) in term.stoichiometry() {
                let Some(row) = live(species) else {
                    continue;
                };
                out.rates.push((row, nu * rate));
                for &(y, d) in &gradient {
                    if let Some(col) = self.layout.slot(point, y) {
                        out.gradient.push((row, col, nu * d));
                    }
                }
            }
        }
    }

    // ── public assembly ───────────────────────────────────────────────────

    /// Previous-level side `B`, `b`; assembled once per step
    pub fn assemble_explicit(&self, system: &mut LinearSystem) {
        system.b_matrix.fill(0.0);
        system.b_vector.fill(0.0);
        let w_old = self.model.scheme.explicit_weight();
        let parts = self.interior(Level::Current, self.previous, false);

        for &(row, capacity, _) in &parts.accumulation {
            system.b_matrix[(row, row)] += capacity / self.dt;
        }
        if w_old > 0.0 {
            for &(row, col, coef) in &parts.operator {
                system.b_matrix[(row, col)] += w_old * coef;
            }
            for &(row, rate) in &parts.rates {
                system.b_vector[row] += w_old * rate;
            }
        }
        for &row in &parts.identity {
            system.b_matrix[(row, row)] = 1.0;
        }
        self.boundary_explicit(system);
    }

    /// New-level side `A`, `a` at the Newton guess; the Jacobian too when requested
    pub fn assemble_implicit(&self, guess: &DVector<f64>, system: &mut LinearSystem, with_jacobian: bool) {
        system.a_matrix.fill(0.0);
        system.a_vector.fill(0.0);
        let w_new = self.model.scheme.implicit_weight();
        let parts = self.interior(Level::Next, guess, with_jacobian);

        for &(row, capacity, _) in &parts.accumulation {
            system.a_matrix[(row, row)] += capacity / self.dt;
        }
        for &(row, col, coef) in &parts.operator {
            system.a_matrix[(row, col)] -= w_new * coef;
        }
        for &(row, rate) in &parts.rates {
            system.a_vector[row] -= w_new * rate;
        }
        for &row in &parts.identity {
            system.a_matrix[(row, row)] = 1.0;
        }
        self.boundary_implicit(guess, system);

        if with_jacobian {
            system.jacobian.copy_from(&system.a_matrix);
            for &(row, capacity, slope) in &parts.accumulation {
                system.jacobian[(row, row)] += (slope - capacity) / self.dt;
            }
            for &(row, col, d) in &parts.gradient {
                system.jacobian[(row, col)] -= w_new * d;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::*;
    use crate::grid::DepositionState;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    struct Fixture {
        model: Model,
        topology: GridTopology,
        layout: SlotLayout,
        params: TransportParameters,
    }

    fn fixture(config: Config) -> Fixture {
        let model = Model::from_config(&config).unwrap();
        let topology = GridTopology::build(&model, DepositionState::default()).unwrap();
        let layout = SlotLayout::new(&model, &topology);
        let fractions = DMatrix::from_fn(model.n_components(), topology.n_points(), |j, i| {
            model.layers[topology.segment(topology.owner(i)).layer].composition[j]
        });
        let params = TransportParameters::evaluate(&model, &topology, &fractions, 0.0);
        Fixture { model, topology, layout, params }
    }

    fn sand(options: SolverOptions) -> Config {
        Config::new(options)
            .with_chemical(Chemical::new("A", 1e-5))
            .with_component(Component::new("sand", 0.5, 1.3, 0.0))
            .with_matrix(Matrix::pure("sand", "sand"))
            .with_layer(Layer::new("cap", 4.0, 5, "sand").with_tortuosity(Tortuosity::None))
            .with_boundary(BoundaryCondition::new(
                "A",
                TopBoundary::FixedConcentration { concentration: 1.0 },
                BottomBoundary::ZeroGradient,
            ))
    }

    // ── operator structure ────────────────────────────────────────────────

    #[test]
    fn test_diffusion_rows_conserve_mass() {
        let f = fixture(sand(SolverOptions::new(1.0, 0.1).with_scheme(TimeScheme::Implicit)));
        let previous = DVector::zeros(f.layout.len());
        let cmax = [1.0];
        let assembler =
            TransportMatrixAssembler::new(&f.model, &f.topology, &f.layout, &f.params, &f.params, &previous, &cmax, 0.1);
        let mut system = LinearSystem::new(f.layout.len());
        assembler.assemble_implicit(&previous, &mut system, false);

        // interior rows: R/dt on the diagonal, diffusion sums to zero
        let d = 0.5 * 315.576;
        for row in 1..4 {
            let sum: f64 = system.a_matrix.row(row).iter().sum();
            assert_relative_eq!(sum, 0.5 / 0.1, epsilon = 1e-9);
            assert_relative_eq!(system.a_matrix[(row, row)], 0.5 / 0.1 + 2.0 * d, epsilon = 1e-9);
        }
        // fixed top; the zero-gradient bottom is a half cell with the same storage
        assert_eq!(system.a_matrix[(0, 0)], 1.0);
        assert_eq!(system.a_vector[0], -1.0);
        assert_relative_eq!(system.a_matrix.row(4).iter().sum::<f64>(), 0.5 / 0.1, epsilon = 1e-9);
        assert_relative_eq!(system.a_matrix[(4, 3)], -2.0 * d, epsilon = 1e-9);
    }

    #[test]
    fn test_crank_nicolson_splits_operator() {
        let f = fixture(sand(SolverOptions::new(1.0, 0.1)));
        let previous = DVector::from_element(f.layout.len(), 2.0);
        let cmax = [2.0];
        let assembler =
            TransportMatrixAssembler::new(&f.model, &f.topology, &f.layout, &f.params, &f.params, &previous, &cmax, 0.1);
        let mut system = LinearSystem::new(f.layout.len());
        assembler.assemble_explicit(&mut system);
        assembler.assemble_implicit(&previous, &mut system, false);

        // a uniform profile is a fixed point of interior rows: A·C = B·C
        let lhs = &system.a_matrix * &previous;
        let rhs = system.explicit_side(&previous);
        for row in 1..4 {
            assert_relative_eq!(lhs[row], rhs[row], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_advection_stencil_is_exact_for_linear_profiles() {
        let options = SolverOptions::new(1.0, 0.1).with_darcy_velocity(3.0).with_scheme(TimeScheme::Implicit);
        let f = fixture(sand(options));
        let previous = DVector::zeros(f.layout.len());
        let cmax = [1.0];
        let assembler =
            TransportMatrixAssembler::new(&f.model, &f.topology, &f.layout, &f.params, &f.params, &previous, &cmax, 0.1);
        let mut system = LinearSystem::new(f.layout.len());
        assembler.assemble_implicit(&previous, &mut system, false);

        // C = z: diffusion vanishes, -U·θ·∂C/∂z = -3 remains after removing R/dt·C
        let profile = DVector::from_iterator(5, f.topology.z().iter().copied());
        let applied = &system.a_matrix * &profile;
        for row in 1..4 {
            let accumulation = 0.5 / 0.1 * profile[row];
            assert_relative_eq!(applied[row] - accumulation, -3.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_first_order_decay_enters_operator() {
        let config = sand(SolverOptions::new(1.0, 0.1).with_scheme(TimeScheme::Implicit))
            .with_reaction(Reaction::first_order("decay", "A", None))
            .with_coefficient(Coefficient::new("cap", "decay", 2.0));
        let f = fixture(config);
        let previous = DVector::zeros(f.layout.len());
        let cmax = [1.0];
        let assembler =
            TransportMatrixAssembler::new(&f.model, &f.topology, &f.layout, &f.params, &f.params, &previous, &cmax, 0.1);
        let mut system = LinearSystem::new(f.layout.len());
        assembler.assemble_implicit(&previous, &mut system, false);
        let sum: f64 = system.a_matrix.row(2).iter().sum();
        // κ = k·e
        assert_relative_eq!(sum, 0.5 / 0.1 + 2.0 * 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_second_order_term_enters_rates() {
        let dimerization = Reaction {
            name: "dimer".into(),
            reactants: vec![ReactionSpecies::new("A", 2.0)],
            products: vec![],
            model: ReactionModel::Fundamental,
        };
        let config = sand(SolverOptions::new(1.0, 0.1).with_scheme(TimeScheme::Implicit))
            .with_reaction(dimerization)
            .with_coefficient(Coefficient::new("cap", "dimer", 2.0));
        let f = fixture(config);
        let guess = DVector::from_element(f.layout.len(), 3.0);
        let cmax = [3.0];
        let assembler =
            TransportMatrixAssembler::new(&f.model, &f.topology, &f.layout, &f.params, &f.params, &guess, &cmax, 0.1);
        let mut system = LinearSystem::new(f.layout.len());
        assembler.assemble_implicit(&guess, &mut system, true);

        // rate κ·C² with κ = k·e = 1, ν = −2: nothing in the operator
        let sum: f64 = system.a_matrix.row(2).iter().sum();
        assert_relative_eq!(sum, 0.5 / 0.1, epsilon = 1e-9);
        assert_relative_eq!(system.a_vector[2], 2.0 * 9.0, epsilon = 1e-9);
        // −w·∂N/∂C = 2·2κC
        assert_relative_eq!(system.jacobian[(2, 2)] - system.a_matrix[(2, 2)], 12.0, epsilon = 1e-9);
        // the zero-gradient half cell reacts too
        assert_relative_eq!(system.a_vector[4], 2.0 * 9.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sorbed_species_confined_to_upper_layer() {
        let config = Config::new(SolverOptions::new(1.0, 0.1).with_scheme(TimeScheme::Implicit))
            .with_chemical(Chemical::new("A", 1e-5))
            .with_component(Component::new("sand", 0.4, 2.6, 0.0))
            .with_component(Component::new("ac", 0.6, 0.5, 0.0))
            .with_matrix(Matrix::pure("sand", "sand"))
            .with_matrix(Matrix::mixture("amended", &[("sand", 0.9), ("ac", 0.1)]))
            .with_layer(Layer::new("amended", 2.0, 3, "amended"))
            .with_layer(Layer::new("sand", 2.0, 3, "sand"))
            .with_sorption(SorptionEntry::transient("ac", "A", IsothermSpec::LinearKd { kd: 100.0 }, 1.0))
            .with_boundary(BoundaryCondition::new(
                "A",
                TopBoundary::FixedConcentration { concentration: 0.0 },
                BottomBoundary::ZeroGradient,
            ));
        let f = fixture(config);
        let sorbed = f.model.species.sorbed_id(1, 0).unwrap();
        assert_eq!(f.layout.slots_of(sorbed).len(), 3);

        let previous = DVector::from_element(f.layout.len(), 1.0);
        let cmax = [1.0];
        let assembler =
            TransportMatrixAssembler::new(&f.model, &f.topology, &f.layout, &f.params, &f.params, &previous, &cmax, 0.1);
        let mut system = LinearSystem::new(f.layout.len());
        assembler.assemble_explicit(&mut system);
        assembler.assemble_implicit(&previous, &mut system, true);

        // the interface follows the amended side; sand rows never see the sorbed column
        let interface = f.layout.slot(2, sorbed).unwrap();
        assert_eq!(system.a_matrix[(interface, interface)], 1.0);
        assert_eq!(system.a_matrix[(interface, f.layout.slot(1, sorbed).unwrap())], -1.0);
        for point in 3..5 {
            let row = f.layout.slot(point, 0).unwrap();
            assert_eq!(system.a_matrix[(row, interface)], 0.0);
            assert!(system.a_vector[row].is_finite());
        }
    }

    #[test]
    fn test_freundlich_jacobian_uses_isotherm_slope() {
        let config = sand(SolverOptions::new(1.0, 0.1).with_scheme(TimeScheme::Implicit))
            .with_sorption(SorptionEntry::equilibrium("sand", "A", IsothermSpec::Freundlich { kf: 2.0, n: 0.5 }));
        let f = fixture(config);
        let guess = DVector::from_element(f.layout.len(), 4.0);
        let cmax = [4.0];
        let assembler =
            TransportMatrixAssembler::new(&f.model, &f.topology, &f.layout, &f.params, &f.params, &guess, &cmax, 0.1);
        let mut system = LinearSystem::new(f.layout.len());
        assembler.assemble_implicit(&guess, &mut system, true);

        // K = 2·4^(−0.5) = 1, q′ = 0.5·K
        let k = 1.0;
        let diff = system.jacobian[(2, 2)] - system.a_matrix[(2, 2)];
        assert_relative_eq!(diff, 1.3 * (0.5 * k - k) / 0.1, epsilon = 1e-9);
    }
}
