//! Time loop
//!
//! [`TransportSolver`] advances the unknown vector from the start to the end
//! of the time window with fixed steps (the last one may be shorter). Each
//! step runs, in order:
//!
//! 1. deposition: lay down new material and regrid, carrying the previous
//!    solution and the solid composition onto the new points;
//! 2. biomixing of the solid composition;
//! 3. evaluation of the new-level transport parameters;
//! 4. assembly of `B`/`b` from the previous level and a linear solve of
//!    `A·x = B·Cⁿ + b − a` with coefficients lagged at `Cⁿ`;
//! 5. Newton-Raphson correction when sorption or reactions are nonlinear;
//! 6. output interpolation for every output time inside the step.

use nalgebra::{DMatrix, DVector};

use crate::error::{SolverError, SolverResult};
use crate::grid::{DepositionGrid, DepositionState, GridTopology, PointSource, SlotLayout, remap_columns, remap_values};
use crate::models::Species;
use crate::output::{FluxCalculator, OutputAccumulator, SimulationOutput};
use crate::physics::{Model, TransportParameters};

use super::assembler::{FRACTION_EPS, LinearSystem, TransportMatrixAssembler};
use super::fractions::PhaseFractionSolver;
use super::{Scenario, Solver, validate_state};

/// Finite-difference transport solver with θ-weighted time stepping
///
/// # Example
///
/// ```rust,ignore
/// use sedcap_rs::solver::{Scenario, Solver, TransportSolver};
///
/// let scenario = Scenario::new(&config)?;
/// let output = TransportSolver::new().solve(&scenario)?;
/// println!("{} snapshots", output.len());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportSolver;

impl TransportSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Solver for TransportSolver {
    fn solve(&self, scenario: &Scenario) -> SolverResult<SimulationOutput> {
        let model = scenario.model();
        let mut run = Run::new(model)?;
        let steps = model.time.steps();

        log::info!(
            "solving '{}' with {} ({}): {} points, {} unknowns, {} steps",
            scenario.name(),
            self.name(),
            model.scheme.name(),
            run.topology.n_points(),
            run.layout.len(),
            steps
        );

        let mut accumulator = OutputAccumulator::new(model.time.output_times());
        let initial = run.calculator().snapshot(&run.params, &run.conc, model.time.start);
        accumulator.start(&initial);

        for k in 1..=steps {
            run.step(k, &mut accumulator)?;
        }

        log::info!(
            "'{}' finished: {} steps, {} Newton iterations, {} regrids, {} points",
            scenario.name(),
            run.stats.steps,
            run.stats.newton_iterations,
            run.stats.regrids,
            run.topology.n_points()
        );

        let mut output =
            SimulationOutput::new(model.chemical_names(), model.component_names(), accumulator.finish(), &model.units);
        output.set_metadata("solver", self.name());
        output.set_metadata("scheme", model.scheme.name());
        output.set_metadata("steps", run.stats.steps);
        output.set_metadata("newton_iterations", run.stats.newton_iterations);
        output.set_metadata("regrids", run.stats.regrids);
        output.set_metadata("points", run.topology.n_points());
        Ok(output)
    }

    fn name(&self) -> &str {
        "Finite-difference transport"
    }
}

#[derive(Debug, Default, Clone)]
struct RunStats {
    steps: usize,
    newton_iterations: usize,
    regrids: usize,
    /// Per species: whether it has been reported without solid
    reported_empty_solid: Vec<bool>,
}

/// Mutable state of one run
struct Run<'m> {
    model: &'m Model,
    topology: GridTopology,
    layout: SlotLayout,
    conc: DVector<f64>,
    /// Component fractions, one column per point
    fractions: DMatrix<f64>,
    /// Parameters at the current level
    params: TransportParameters,
    deposition: Option<DepositionGrid>,
    system: LinearSystem,
    /// Running maximum of every chemical's concentration
    cmax: Vec<f64>,
    stats: RunStats,
}

impl<'m> Run<'m> {
    fn new(model: &'m Model) -> SolverResult<Self> {
        let topology = GridTopology::build(model, DepositionState::default())?;
        let layout = SlotLayout::new(model, &topology);
        let conc = initial_values(model, &topology, &layout);
        let fractions = layer_fractions(model, &topology);
        let params = TransportParameters::evaluate(model, &topology, &fractions, model.time.start);

        if model.biomix() && topology.bio_index().is_some_and(|p| p == 0) {
            log::warn!(
                "bioturbation depth reaches no grid point below the surface; the solid composition will not mix"
            );
        }

        let mut run = Self {
            model,
            system: LinearSystem::new(layout.len()),
            topology,
            layout,
            conc,
            fractions,
            params,
            deposition: model.deposition.map(DepositionGrid::new),
            cmax: vec![0.0; model.n_chemicals()],
            stats: RunStats { reported_empty_solid: vec![false; model.species.len()], ..RunStats::default() },
        };
        run.update_cmax();
        Ok(run)
    }

    fn calculator(&self) -> FluxCalculator<'_> {
        FluxCalculator::new(self.model, &self.topology, &self.layout, &self.cmax)
    }

    fn update_cmax(&mut self) {
        for chemical in 0..self.model.n_chemicals() {
            let largest = self
                .layout
                .slots_of(chemical)
                .iter()
                .fold(self.model.boundary_scale(chemical), |m, &slot| m.max(self.conc[slot].abs()));
            self.cmax[chemical] = self.cmax[chemical].max(largest);
        }
    }

    /// Lays down material deposited by `time`; returns whether the grid changed
    fn deposit(&mut self, time: f64) -> SolverResult<bool> {
        let model = self.model;
        let Some(layer) = model.deposition_layer() else {
            return Ok(false);
        };
        let Some(grid) = self.deposition.as_mut() else {
            return Ok(false);
        };
        let Some(regrid) = grid.advance(time - model.time.start, self.topology.n_points()) else {
            return Ok(false);
        };

        let topology = GridTopology::build(model, regrid.state)?;
        let layout = SlotLayout::new(model, &topology);
        let surface = |chemical: usize| -> f64 {
            model.top[chemical].water_concentration().unwrap_or_else(|| {
                self.layout.slot(0, chemical).map_or(0.0, |slot| self.conc[slot])
            })
        };
        let fill = |_point: usize, species: usize| match model.species.get(species) {
            Species::Dissolved { chemical } => surface(chemical),
            Species::Sorbed { .. } => model.initial_profile(layer, species).map_or(0.0, |p| p.top()),
        };
        let conc = remap_values(&self.layout, &layout, &self.conc, &regrid.map, fill);
        let fractions = remap_columns(&self.fractions, &regrid.map, &model.layers[layer].composition);

        log::debug!(
            "deposition at t = {time}: {} new point(s), {} merge(s), {} points ({} fine + {} coarse intervals)",
            regrid.inserted,
            regrid.merged,
            topology.n_points(),
            regrid.state.fine,
            regrid.state.coarse
        );
        debug_assert_eq!(regrid.map.iter().filter(|s| **s == PointSource::New).count(), regrid.inserted);

        self.system.resize(layout.len());
        self.topology = topology;
        self.layout = layout;
        self.conc = conc;
        self.fractions = fractions;
        self.params = TransportParameters::evaluate(model, &self.topology, &self.fractions, self.params.time);
        self.stats.regrids += 1;
        Ok(true)
    }

    /// Warns once per species when it sits on points where its component has vanished
    ///
    /// Those rows hold their previous value until the component returns.
    fn report_empty_solid(&mut self, params: &TransportParameters, time: f64) {
        let model = self.model;
        for (id, component, _) in model.species.sorbed() {
            if self.stats.reported_empty_solid[id] {
                continue;
            }
            let empty = (0..self.topology.n_points())
                .filter(|&point| self.layout.slot(point, id).is_some())
                .filter(|&point| {
                    let g = self.topology.owner(point);
                    params.point(g, self.topology.segment(g).local(point)).fraction[component] < FRACTION_EPS
                })
                .count();
            if empty > 0 {
                log::warn!(
                    "t = {time}: '{}' has no solid at {empty} point(s); those rows keep their value",
                    model.species_label(id)
                );
                self.stats.reported_empty_solid[id] = true;
            }
        }
    }

    /// Advances from step `k − 1` to step `k`
    fn step(&mut self, k: usize, accumulator: &mut OutputAccumulator) -> SolverResult<()> {
        let model = self.model;
        let time = model.time.time_of_step(k - 1);
        let next_time = model.time.time_of_step(k);
        let dt = next_time - time;
        let singular = || SolverError::SingularMatrix { step: k, time: next_time };

        self.deposit(next_time)?;

        if let Some(bio) = model.bioturbation.filter(|b| b.biomix)
            && let Some(mixer) = PhaseFractionSolver::for_topology(&self.topology, &bio)
        {
            self.fractions = mixer.step(&self.fractions, dt).ok_or_else(singular)?;
        }
        let next = TransportParameters::evaluate(model, &self.topology, &self.fractions, next_time);
        self.update_cmax();
        self.report_empty_solid(&next, next_time);

        let previous = &self.conc;
        let assembler = TransportMatrixAssembler::new(
            model,
            &self.topology,
            &self.layout,
            &self.params,
            &next,
            previous,
            &self.cmax,
            dt,
        );
        let system = &mut self.system;

        assembler.assemble_explicit(system);
        let rhs = system.explicit_side(previous);
        assembler.assemble_implicit(previous, system, false);
        let mut x = system
            .a_matrix
            .clone()
            .lu()
            .solve(&(&rhs - &system.a_vector))
            .ok_or_else(singular)?;

        if model.is_nonlinear() {
            let mut converged = false;
            let mut worst = (0, f64::INFINITY);
            for iteration in 1..=model.max_newton_iterations {
                assembler.assemble_implicit(&x, system, true);
                let residual = system.residual(&x, &rhs);
                let dx = system.jacobian.clone().lu().solve(&residual).ok_or_else(singular)?;
                x -= &dx;
                self.stats.newton_iterations += 1;

                worst = largest_correction(&self.layout, model, &x, &dx);
                log::trace!(
                    "step {k} Newton iteration {iteration}: {} moves by {:e}",
                    model.species_label(worst.0),
                    worst.1
                );
                if worst.1 < model.tolerance {
                    converged = true;
                    break;
                }
            }
            if !converged {
                return Err(SolverError::NotConverged {
                    step: k,
                    time: next_time,
                    iterations: model.max_newton_iterations,
                    species: model.species_label(worst.0),
                    error: worst.1,
                });
            }
        }

        validate_state(&x, &self.layout, model, k, next_time)?;

        if accumulator.wants(next_time) {
            let calculator = self.calculator();
            let before = calculator.snapshot(&self.params, &self.conc, time);
            let after = calculator.snapshot(&next, &x, next_time);
            accumulator.record(&before, &after);
        }

        self.conc = x;
        self.params = next;
        self.stats.steps += 1;
        Ok(())
    }
}

/// Initial unknowns from the layer profiles
///
/// A point shared by two segments takes the profile of the lower one.
fn initial_values(model: &Model, topology: &GridTopology, layout: &SlotLayout) -> DVector<f64> {
    let z = topology.z();
    let mut values = DVector::zeros(layout.len());
    for point in 0..topology.n_points() {
        for (slot, species) in layout.slots_at(point) {
            let Some(g) = topology.segments_at(point).filter(|&g| layout.segment_has(g, species)).last() else {
                continue;
            };
            let segment = topology.segment(g);
            let s = (z[point] - z[segment.start]) / (z[segment.end] - z[segment.start]);
            values[slot] = model.initial_profile(segment.layer, species).map_or(0.0, |p| p.at(s));
        }
    }
    values
}

/// Component fractions of the layer every point is reported in
fn layer_fractions(model: &Model, topology: &GridTopology) -> DMatrix<f64> {
    DMatrix::from_fn(model.n_components(), topology.n_points(), |j, i| {
        model.layers[topology.segment(topology.owner(i)).layer].composition[j]
    })
}

/// Species with the largest relative Newton correction, `rms(Δx) / mean|x|`
fn largest_correction(layout: &SlotLayout, model: &Model, x: &DVector<f64>, dx: &DVector<f64>) -> (usize, f64) {
    let mut worst = (0, 0.0);
    for species in 0..model.species.len() {
        let slots = layout.slots_of(species);
        if slots.is_empty() {
            continue;
        }
        let n = slots.len() as f64;
        let rms = (slots.iter().map(|&s| dx[s] * dx[s]).sum::<f64>() / n).sqrt();
        let scale = slots.iter().map(|&s| x[s].abs()).sum::<f64>() / n;
        let error = if scale > 0.0 { rms / scale } else { rms };
        if error > worst.1 || error.is_nan() {
            worst = (species, error);
        }
    }
    worst
}
