//! Boundary and interface rows
//!
//! Fixed concentrations and every interface point are algebraic
//! constraints at the new time level (`A`/`a` only). The other dissolved
//! boundary conditions close a half control volume of width `h/2` around the
//! end point: the assembler supplies its storage, diffusion through the inner
//! face and reactions, and this module adds the exchange through the outer
//! face, taken at the new time level under either scheme. Rows are scaled
//! per unit volume of the half cell, so an exchange flux `F` enters as `2F/h`.
//!
//! # Top (point 0)
//!
//! | Condition          | Outer face                                                  |
//! |--------------------|-------------------------------------------------------------|
//! | Fixed              | `C₀ = c` (algebraic)                                        |
//! | Mass transfer      | `F = k·(Cw − C₀)`                                           |
//! | Mixed water column | `h_w·dC₀/dt` of extra storage, `F = Uθ·C₀ − h_w·(C₀ − C_in)/τ` |
//!
//! # Bottom (point N)
//!
//! | Condition     | Outer face                 |
//! |---------------|----------------------------|
//! | Fixed         | `C_N = c` (algebraic)      |
//! | Flux matching | `F = U·c − Uθ·C_N`         |
//! | Zero gradient | `F = 0`                    |
//!
//! The overlying water is well mixed with the surface pore water, so the
//! water column and the top half cell share one unknown and one balance.
//!
//! # Interfaces
//!
//! Dissolved species: the downward flux `−D·∂C/∂z − Uθ·C` computed with the
//! upper side's coefficients and a backward stencil equals the one computed
//! with the lower side's coefficients and a forward stencil.
//!
//! Sorbed species: particle-flux continuity when bioturbation mixes across
//! the interface and both sides hold the component; otherwise the interface
//! value follows the side that carries the species.
//!
//! Sorbed species at the top and bottom have zero gradient (`q₀ = q₁`,
//! `q_N = q_{N−1}`).

use nalgebra::DVector;

use crate::config::{BottomBoundary, TopBoundary};
use crate::grid::PointRole;
use crate::models::Species;

use super::assembler::{FRACTION_EPS, LinearSystem, Level, TransportMatrixAssembler};

/// Particle-mixing coefficients below this value fall back to value equality
const MIXING_EPS: f64 = 1e-300;

/// Outer-face exchange of a half cell, per unit volume
///
/// The flux into the cell is `gain·C + source`; `storage` is held on top of
/// the cell's own retardation.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Exchange {
    storage: f64,
    gain: f64,
    source: f64,
}

impl TransportMatrixAssembler<'_> {
    fn equal_to(&self, system: &mut LinearSystem, row: usize, neighbour: usize, species: usize) {
        system.a_matrix[(row, row)] = 1.0;
        if let Some(col) = self.layout.slot(neighbour, species) {
            system.a_matrix[(row, col)] = -1.0;
        }
    }

    fn add_derivative(&self, system: &mut LinearSystem, row: usize, species: usize, weights: &[(usize, f64)], scale: f64) {
        for &(point, w) in weights {
            if let Some(col) = self.layout.slot(point, species) {
                system.a_matrix[(row, col)] += scale * w;
            }
        }
    }

    /// Concentration imposed on `chemical` at the end `point`, if any
    fn imposed(&self, point: usize, chemical: usize) -> Option<f64> {
        match (point, &self.model.top[chemical], &self.model.bottom[chemical]) {
            (0, TopBoundary::FixedConcentration { concentration }, _) => Some(*concentration),
            (0, ..) => None,
            (_, _, BottomBoundary::FixedConcentration { concentration }) => Some(*concentration),
            _ => None,
        }
    }

    /// Whether the row of `species` at the end `point` balances a half cell
    pub(crate) fn is_half_cell(&self, point: usize, species: usize) -> bool {
        let species = self.model.species.get(species);
        species.is_dissolved() && self.imposed(point, species.chemical()).is_none()
    }

    fn exchange(&self, level: Level, conc: &DVector<f64>, segment: usize, point: usize, species: usize) -> Exchange {
        let to_volume = 2.0 / self.topology.segment(segment).spacing;
        let chemical = self.model.species.get(species).chemical();
        let here = self.coefficients(level, conc, segment, point, species);
        let velocity = self.params(level).velocity;

        let (storage, gain, source) = if point == 0 {
            match self.model.top[chemical] {
                TopBoundary::FixedConcentration { .. } => (0.0, 0.0, 0.0),
                TopBoundary::MassTransfer { coefficient, water_concentration } => {
                    (0.0, -coefficient, coefficient * water_concentration)
                }
                TopBoundary::MixedWaterColumn { depth, residence_time, inflow_concentration } => (
                    depth,
                    here.advection - depth / residence_time,
                    depth * inflow_concentration / residence_time,
                ),
            }
        } else {
            match self.model.bottom[chemical] {
                BottomBoundary::FixedConcentration { .. } | BottomBoundary::ZeroGradient => (0.0, 0.0, 0.0),
                BottomBoundary::FluxMatching { concentration } => (0.0, -here.advection, velocity * concentration),
            }
        };
        Exchange { storage: to_volume * storage, gain: to_volume * gain, source: to_volume * source }
    }

    /// End points and the segment that owns each
    fn ends(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let last = self.topology.n_points() - 1;
        [0, last].into_iter().filter_map(move |point| match self.topology.role(point) {
            PointRole::Top { segment } | PointRole::Bottom { segment } => Some((point, segment)),
            PointRole::Interior { .. } | PointRole::Interface { .. } => None,
        })
    }

    /// Previous-level part of the boundary rows: extra storage of the half cells
    pub(crate) fn boundary_explicit(&self, system: &mut LinearSystem) {
        for (point, segment) in self.ends() {
            for (row, species) in self.layout.slots_at(point) {
                if self.is_half_cell(point, species) {
                    let exchange = self.exchange(Level::Current, self.previous, segment, point, species);
                    system.b_matrix[(row, row)] += exchange.storage / self.dt;
                }
            }
        }
    }

    /// New-level boundary and interface rows at the Newton guess
    pub(crate) fn boundary_implicit(&self, guess: &DVector<f64>, system: &mut LinearSystem) {
        let last = self.topology.n_points() - 1;
        for point in 0..=last {
            match self.topology.role(point) {
                PointRole::Top { segment } => self.end_rows(guess, system, segment, point, 1),
                PointRole::Bottom { segment } => self.end_rows(guess, system, segment, point, point - 1),
                PointRole::Interface { upper, lower } => self.interface_rows(guess, system, point, upper, lower),
                PointRole::Interior { .. } => {}
            }
        }
    }

    fn end_rows(&self, guess: &DVector<f64>, system: &mut LinearSystem, segment: usize, point: usize, inner: usize) {
        for (row, species) in self.layout.slots_at(point) {
            let kind = self.model.species.get(species);
            if !kind.is_dissolved() {
                self.equal_to(system, row, inner, species);
            } else if let Some(concentration) = self.imposed(point, kind.chemical()) {
                system.a_matrix[(row, row)] = 1.0;
                system.a_vector[row] = -concentration;
            } else {
                let exchange = self.exchange(Level::Next, guess, segment, point, species);
                system.a_matrix[(row, row)] += exchange.storage / self.dt - exchange.gain;
                system.a_vector[row] -= exchange.source;
            }
        }
    }

    fn interface_rows(&self, guess: &DVector<f64>, system: &mut LinearSystem, point: usize, upper: usize, lower: usize) {
        let upper_weights = self.topology.segment(upper).end_derivative(point);
        let lower_weights = self.topology.segment(lower).end_derivative(point);
        let mixed_across = self.topology.bio_index().is_some_and(|pbio| pbio > point);

        for (row, species) in self.layout.slots_at(point) {
            let in_upper = self.layout.segment_has(upper, species);
            let in_lower = self.layout.segment_has(lower, species);
            let up = self.coefficients(Level::Next, guess, upper, point, species);
            let down = self.coefficients(Level::Next, guess, lower, point, species);

            match self.model.species.get(species) {
                Species::Dissolved { .. } => {
                    // −D_u·∂C/∂z|_u − Uθ_u·C = −D_l·∂C/∂z|_l − Uθ_l·C
                    self.add_derivative(system, row, species, &upper_weights, -up.diffusivity);
                    self.add_derivative(system, row, species, &lower_weights, down.diffusivity);
                    system.a_matrix[(row, row)] += down.advection - up.advection;
                }
                Species::Sorbed { .. } => {
                    let continuous = in_upper
                        && in_lower
                        && mixed_across
                        && !self.is_degenerate(upper, point, species)
                        && !self.is_degenerate(lower, point, species)
                        && up.diffusivity.max(down.diffusivity) > MIXING_EPS
                        && up.capacity.min(down.capacity) > FRACTION_EPS;
                    if continuous {
                        self.add_derivative(system, row, species, &upper_weights, up.diffusivity);
                        self.add_derivative(system, row, species, &lower_weights, -down.diffusivity);
                    } else if in_upper {
                        self.equal_to(system, row, point - 1, species);
                    } else {
                        self.equal_to(system, row, point + 1, species);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::*;
    use crate::grid::{DepositionState, GridTopology, SlotLayout};
    use crate::physics::{Model, TransportParameters};
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    fn assemble(config: Config, guess_value: f64) -> LinearSystem {
        let model = Model::from_config(&config).unwrap();
        let topology = GridTopology::build(&model, DepositionState::default()).unwrap();
        let layout = SlotLayout::new(&model, &topology);
        let fractions = DMatrix::from_fn(model.n_components(), topology.n_points(), |j, i| {
            model.layers[topology.segment(topology.owner(i)).layer].composition[j]
        });
        let params = TransportParameters::evaluate(&model, &topology, &fractions, 0.0);
        let guess = DVector::from_element(layout.len(), guess_value);
        let cmax = vec![1.0; model.n_chemicals()];
        let assembler = TransportMatrixAssembler::new(&model, &topology, &layout, &params, &params, &guess, &cmax, 0.1);
        let mut system = LinearSystem::new(layout.len());
        assembler.assemble_explicit(&mut system);
        assembler.assemble_implicit(&guess, &mut system, false);
        system
    }

    fn two_layers(top: TopBoundary, bottom: BottomBoundary) -> Config {
        Config::new(SolverOptions::new(1.0, 0.1).with_scheme(TimeScheme::Implicit))
            .with_chemical(Chemical::new("A", 1e-5))
            .with_component(Component::new("sand", 0.4, 2.6, 0.0))
            .with_component(Component::new("silt", 0.6, 2.4, 0.0))
            .with_matrix(Matrix::pure("sand", "sand"))
            .with_matrix(Matrix::pure("silt", "silt"))
            .with_layer(Layer::new("cap", 2.0, 3, "sand").with_tortuosity(Tortuosity::None))
            .with_layer(Layer::new("sediment", 4.0, 3, "silt").with_tortuosity(Tortuosity::None))
            .with_boundary(BoundaryCondition::new("A", top, bottom))
    }

    #[test]
    fn test_interface_row_balances_fluxes() {
        let config = two_layers(
            TopBoundary::FixedConcentration { concentration: 0.0 },
            BottomBoundary::ZeroGradient,
        );
        let system = assemble(config, 0.0);
        // point 2: upper D = 0.4·Dw, h = 1; lower D = 0.6·Dw, h = 2
        let dw = 315.576;
        let (du, dl) = (0.4 * dw, 0.6 * dw);
        assert_relative_eq!(system.a_matrix[(2, 2)], -du * 1.5 + dl * -0.75, epsilon = 1e-9);
        assert_relative_eq!(system.a_matrix[(2, 1)], du * 2.0, epsilon = 1e-9);
        assert_relative_eq!(system.a_matrix[(2, 3)], dl * 1.0, epsilon = 1e-9);
        // a piecewise-linear profile with matching flux satisfies the row
        let profile = DVector::from_vec(vec![0.0, dl, 2.0 * dl, 2.0 * dl + 2.0 * du, 2.0 * dl + 4.0 * du]);
        let residual: f64 = (system.a_matrix.row(2) * &profile)[0];
        assert_relative_eq!(residual, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mass_transfer_half_cell() {
        let system = assemble(
            two_layers(
                TopBoundary::MassTransfer { coefficient: 5.0, water_concentration: 2.0 },
                BottomBoundary::ZeroGradient,
            ),
            0.0,
        );
        // h = 1: storage 0.4/Δt, face 2·D/h², exchange 2k/h
        let du = 0.4 * 315.576;
        assert_relative_eq!(system.a_matrix[(0, 0)], 4.0 + 2.0 * du + 10.0, epsilon = 1e-9);
        assert_relative_eq!(system.a_matrix[(0, 1)], -2.0 * du, epsilon = 1e-9);
        assert_relative_eq!(system.a_vector[0], -20.0, epsilon = 1e-12);
        assert_relative_eq!(system.b_matrix[(0, 0)], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_flux_matching_half_cell() {
        let mut config = two_layers(
            TopBoundary::FixedConcentration { concentration: 0.0 },
            BottomBoundary::FluxMatching { concentration: 3.0 },
        );
        config.options.darcy_velocity = 2.0;
        let system = assemble(config, 0.0);
        // h = 2: face 2·D/h² = D/2, outflow 2·Uθ/h, inflow 2·U·c/h
        let dl = 0.6 * 315.576;
        assert_relative_eq!(system.a_matrix[(4, 4)], 6.0 + 0.5 * dl + 2.0, epsilon = 1e-9);
        assert_relative_eq!(system.a_matrix[(4, 3)], -0.5 * dl, epsilon = 1e-9);
        assert_relative_eq!(system.a_vector[4], -6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_gradient_half_cell_sums_to_storage() {
        let system = assemble(
            two_layers(TopBoundary::FixedConcentration { concentration: 0.0 }, BottomBoundary::ZeroGradient),
            0.0,
        );
        let dl = 0.6 * 315.576;
        assert_relative_eq!(system.a_matrix[(4, 4)], 6.0 + 0.5 * dl, epsilon = 1e-9);
        assert_relative_eq!(system.a_matrix.row(4).iter().sum::<f64>(), 6.0, epsilon = 1e-9);
        assert_eq!(system.a_vector[4], 0.0);
    }

    #[test]
    fn test_mixed_water_column_storage_on_both_sides() {
        let system = assemble(
            two_layers(
                TopBoundary::MixedWaterColumn { depth: 10.0, residence_time: 0.5, inflow_concentration: 1.0 },
                BottomBoundary::ZeroGradient,
            ),
            0.0,
        );
        // per unit volume of the half cell (h = 1) the water holds 2·h_w/h
        assert_relative_eq!(system.b_matrix[(0, 0)], 4.0 + 200.0, epsilon = 1e-9);
        assert_relative_eq!(system.a_vector[0], -2.0 * 10.0 * 1.0 / 0.5, epsilon = 1e-12);
        let du = 0.4 * 315.576;
        assert_relative_eq!(system.a_matrix[(0, 0)], 4.0 + 200.0 + 2.0 * du + 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_closed_column_conserves_mass_under_crank_nicolson() {
        // one segment, h = 1: half cells weigh 1/2, interior points 1
        let config = Config::new(SolverOptions::new(1.0, 0.1))
            .with_chemical(Chemical::new("A", 1e-5))
            .with_component(Component::new("sand", 0.4, 2.6, 0.0))
            .with_matrix(Matrix::pure("sand", "sand"))
            .with_layer(Layer::new("cap", 4.0, 5, "sand").with_tortuosity(Tortuosity::None))
            .with_boundary(BoundaryCondition::new(
                "A",
                TopBoundary::MixedWaterColumn { depth: 1.0, residence_time: 1e30, inflow_concentration: 0.0 },
                BottomBoundary::ZeroGradient,
            ));
        let system = assemble(config, 0.0);
        let volume = DVector::from_vec(vec![0.5, 1.0, 1.0, 1.0, 0.5]);

        // Σ volume·(A − B) vanishes column by column: no mass is created for any profile
        let new_side = system.a_matrix.tr_mul(&volume);
        let old_side = system.b_matrix.tr_mul(&volume);
        for j in 0..5 {
            assert_relative_eq!(new_side[j], old_side[j], epsilon = 1e-9);
        }
        // storage: water 1 cm plus 0.4 over the half cell
        assert_relative_eq!(old_side[0], (1.0 + 0.4 * 0.5) / 0.1, epsilon = 1e-9);
    }
}
