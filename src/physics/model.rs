//! Normalized model
//!
//! [`Model::from_config`] is the single normalization pass of the crate:
//!
//! 1. every name is resolved to an index (chemical, component, layer, reaction);
//! 2. every dimensional quantity is converted to the internal cm/yr system;
//! 3. sorption entries become [`SorptionModel`]s and kinetic pairs become
//!    sorbed species plus derived sorption/desorption reactions;
//! 4. structural errors are reported as [`ConfigError`].
//!
//! After normalization nothing in the crate looks up a name again.

use std::collections::HashMap;
use std::ops::Range;

use crate::config::{
    BottomBoundary, Config, IsothermSpec, KineticsSpec, Profile, ReactionModel, Tortuosity, TopBoundary,
    UnitSystem, VelocityModel,
};
use crate::error::{ConfigError, ConfigResult};
use crate::grid::{DepositionState, GridTopology};
use crate::models::{
    Isotherm, Participant, RateConstant, RateLaw, RateScale, ReactionNetwork, ReactionTerm, SorptionModel,
    SpeciesTable,
};
use crate::solver::TimeScheme;

use super::transport::{BioShape, BioturbationProps, VelocityLaw};

/// DOC is configured in mg/L and used in kg/L
const MG_PER_KG: f64 = 1.0e6;

#[derive(Debug, Clone, PartialEq)]
pub struct ChemicalProps {
    pub name: String,
    pub molecular_weight: f64,
    /// cm²/yr
    pub diffusivity: f64,
    /// L/kg
    pub koc: f64,
    /// L/kg
    pub kdoc: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentProps {
    pub name: String,
    pub porosity: f64,
    pub density: f64,
    pub foc: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerProps {
    pub name: String,
    /// cm
    pub thickness: f64,
    pub points: usize,
    /// Volumetric fraction of every component (indexed like `Model::components`)
    pub composition: Vec<f64>,
    pub tortuosity: Tortuosity,
    /// kg/L
    pub doc: f64,
    /// cm
    pub dispersivity: f64,
}

/// Simulated time window, in years
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
    pub step: f64,
    pub outputs: usize,
}

impl TimeWindow {
    /// Number of internal steps covering the window; the last one may be shorter
    pub fn steps(&self) -> usize {
        ((self.end - self.start) / self.step - 1e-9).ceil().max(1.0) as usize
    }

    /// Time of the end of step `k` (1-based), computed without accumulation
    pub fn time_of_step(&self, k: usize) -> f64 {
        (self.start + k as f64 * self.step).min(self.end)
    }

    /// Evenly spaced output times, both ends included
    pub fn output_times(&self) -> Vec<f64> {
        match self.outputs {
            0 => Vec::new(),
            1 => vec![self.end],
            n => (0..n)
                .map(|k| self.start + (self.end - self.start) * k as f64 / (n - 1) as f64)
                .collect(),
        }
    }
}

/// Deposition parameters in internal units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepositionProps {
    /// cm/yr
    pub velocity: f64,
    /// cm
    pub spacing: f64,
    pub ratio: usize,
}

/// Equilibrium sorption summed over the components present at a point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Partition {
    /// Σ fρ·K(C)
    pub capacity: f64,
    /// Σ fρ·dq/dC
    pub slope: f64,
}

/// Fully resolved, unit-normalized description of a run
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub units: UnitSystem,
    pub chemicals: Vec<ChemicalProps>,
    pub components: Vec<ComponentProps>,
    pub layers: Vec<LayerProps>,
    pub species: SpeciesTable,
    pub reactions: ReactionNetwork,
    pub top: Vec<TopBoundary>,
    pub bottom: Vec<BottomBoundary>,
    pub time: TimeWindow,
    pub scheme: TimeScheme,
    pub tolerance: f64,
    pub max_newton_iterations: usize,
    pub velocity: VelocityLaw,
    pub bioturbation: Option<BioturbationProps>,
    pub deposition: Option<DepositionProps>,
    /// `[component * n_chemicals + chemical]`
    sorption: Vec<Option<SorptionModel>>,
    /// `[layer][user reaction]`
    rate_constants: Vec<Vec<f64>>,
    /// `[layer][species]`
    initial: Vec<Vec<Option<Profile>>>,
}

fn index_names<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> ConfigResult<HashMap<&'a str, usize>> {
    let mut map = HashMap::new();
    for (i, name) in names.enumerate() {
        if map.insert(name, i).is_some() {
            return Err(ConfigError::DuplicateName { kind, name: name.to_string() });
        }
    }
    Ok(map)
}

fn lookup(map: &HashMap<&str, usize>, kind: &'static str, name: &str) -> ConfigResult<usize> {
    map.get(name)
        .copied()
        .ok_or_else(|| ConfigError::UnknownName { kind, name: name.to_string() })
}

fn positive(what: &str, value: f64) -> ConfigResult<f64> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive { what: what.to_string(), value })
    }
}

impl Model {
    /// Resolves names, converts units and validates the structure of `config`
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        let units = config.units;
        if config.chemicals.is_empty() {
            return Err(ConfigError::Missing("chemicals"));
        }
        if config.components.is_empty() {
            return Err(ConfigError::Missing("components"));
        }
        if config.layers.is_empty() {
            return Err(ConfigError::Missing("layers"));
        }

        let chemical_ix = index_names("chemical", config.chemicals.iter().map(|c| c.name.as_str()))?;
        let component_ix = index_names("component", config.components.iter().map(|c| c.name.as_str()))?;
        let matrix_ix = index_names("matrix", config.matrices.iter().map(|m| m.name.as_str()))?;
        let layer_ix = index_names("layer", config.layers.iter().map(|l| l.name.as_str()))?;
        let reaction_ix = index_names("reaction", config.reactions.iter().map(|r| r.name.as_str()))?;
        let n_chem = config.chemicals.len();
        let n_comp = config.components.len();

        // ── chemicals, components ─────────────────────────────────────────
        let chemicals: Vec<ChemicalProps> = config
            .chemicals
            .iter()
            .map(|c| ChemicalProps {
                name: c.name.clone(),
                molecular_weight: c.molecular_weight,
                diffusivity: units.diffusivity(c.diffusivity),
                koc: 10f64.powf(c.log_koc),
                kdoc: c.log_kdoc.map_or(0.0, |k| 10f64.powf(k)),
            })
            .collect();

        let components: Vec<ComponentProps> = config
            .components
            .iter()
            .map(|c| ComponentProps {
                name: c.name.clone(),
                porosity: c.porosity,
                density: c.density,
                foc: c.foc,
            })
            .collect();

        // ── layers ────────────────────────────────────────────────────────
        let mut layers = Vec::with_capacity(config.layers.len());
        for layer in &config.layers {
            let matrix = &config.matrices[lookup(&matrix_ix, "matrix", &layer.matrix)?];
            let mut composition = vec![0.0; n_comp];
            for part in &matrix.components {
                composition[lookup(&component_ix, "component", &part.component)?] += part.fraction;
            }
            layers.push(LayerProps {
                name: layer.name.clone(),
                thickness: units.length(layer.thickness),
                points: layer.points,
                composition,
                tortuosity: layer.tortuosity,
                doc: layer.doc / MG_PER_KG,
                dispersivity: units.length(layer.dispersivity),
            });
        }

        // ── sorption ──────────────────────────────────────────────────────
        let mut sorption: Vec<Option<SorptionModel>> = vec![None; n_comp * n_chem];
        let mut kinetic_pairs = Vec::new();
        for entry in &config.sorption {
            let component = lookup(&component_ix, "component", &entry.component)?;
            let chemical = lookup(&chemical_ix, "chemical", &entry.chemical)?;
            let slot = &mut sorption[component * n_chem + chemical];
            if slot.is_some() {
                return Err(ConfigError::DuplicateName {
                    kind: "sorption pair",
                    name: format!("{}/{}", entry.chemical, entry.component),
                });
            }
            let isotherm = match entry.isotherm {
                IsothermSpec::LinearKd { kd } => Isotherm::LinearKd { kd },
                IsothermSpec::LinearKocFoc { log_koc } => Isotherm::LinearKocFoc {
                    koc: log_koc.map_or(chemicals[chemical].koc, |k| 10f64.powf(k)),
                    foc: components[component].foc,
                },
                IsothermSpec::Freundlich { kf, n } => Isotherm::Freundlich {
                    kf,
                    n: positive("Freundlich exponent", n)?,
                },
                IsothermSpec::Langmuir { qmax, b } => Isotherm::Langmuir { qmax, b },
            };
            *slot = Some(match entry.kinetics {
                KineticsSpec::Equilibrium => SorptionModel::equilibrium(isotherm),
                KineticsSpec::Transient { kdesorp } => {
                    kinetic_pairs.push((component, chemical));
                    SorptionModel::transient(isotherm, units.rate(positive("desorption rate", kdesorp)?))
                }
            });
        }
        let species = SpeciesTable::new(n_chem, kinetic_pairs.iter().copied());

        // ── reactions ─────────────────────────────────────────────────────
        let mut terms = Vec::with_capacity(config.reactions.len() + 2 * kinetic_pairs.len());
        for (r, reaction) in config.reactions.iter().enumerate() {
            if reaction.reactants.is_empty() {
                return Err(ConfigError::EmptyReaction(reaction.name.clone()));
            }
            let mut reactants = Vec::with_capacity(reaction.reactants.len());
            for part in &reaction.reactants {
                let order = match reaction.model {
                    ReactionModel::Fundamental => part.coefficient,
                    ReactionModel::UserDefined => part.order.unwrap_or(1.0),
                };
                reactants.push(Participant::new(
                    lookup(&chemical_ix, "chemical", &part.chemical)?,
                    part.coefficient,
                    order,
                ));
            }
            let mut products = Vec::with_capacity(reaction.products.len());
            for part in &reaction.products {
                products.push(Participant::new(
                    lookup(&chemical_ix, "chemical", &part.chemical)?,
                    part.coefficient,
                    0.0,
                ));
            }
            terms.push(ReactionTerm {
                name: reaction.name.clone(),
                reactants,
                products,
                law: RateLaw::MassAction,
                scale: RateScale::Porewater,
                constant: RateConstant::Layer(r),
            });
        }
        for &(component, chemical) in &kinetic_pairs {
            let model = sorption[component * n_chem + chemical].as_ref();
            let sorbed = species.sorbed_id(component, chemical);
            if let (Some(model), Some(sorbed)) = (model, sorbed) {
                let label = format!("{}/{}", chemicals[chemical].name, components[component].name);
                if let Some(pair) = model.kinetic_terms(&label, component, chemical, sorbed) {
                    terms.extend(pair);
                }
            }
        }
        let reactions = ReactionNetwork::new(terms);

        let mut rate_constants = vec![vec![0.0; config.reactions.len()]; layers.len()];
        for coefficient in &config.coefficients {
            let layer = lookup(&layer_ix, "layer", &coefficient.layer)?;
            let reaction = lookup(&reaction_ix, "reaction", &coefficient.reaction)?;
            rate_constants[layer][reaction] = units.rate(coefficient.rate);
        }
        for (r, reaction) in config.reactions.iter().enumerate() {
            if rate_constants.iter().all(|row| row[r] == 0.0) {
                log::warn!("reaction '{}' has no rate coefficient in any layer and stays inert", reaction.name);
            }
        }

        // ── boundary conditions ───────────────────────────────────────────
        let mut top: Vec<Option<TopBoundary>> = vec![None; n_chem];
        let mut bottom: Vec<BottomBoundary> = vec![BottomBoundary::ZeroGradient; n_chem];
        for bc in &config.boundaries {
            let chemical = lookup(&chemical_ix, "chemical", &bc.chemical)?;
            if top[chemical].is_some() {
                return Err(ConfigError::DuplicateName { kind: "boundary condition", name: bc.chemical.clone() });
            }
            top[chemical] = Some(match bc.top {
                TopBoundary::FixedConcentration { concentration } => TopBoundary::FixedConcentration { concentration },
                TopBoundary::MassTransfer { coefficient, water_concentration } => TopBoundary::MassTransfer {
                    coefficient: units.velocity(positive("mass-transfer coefficient", coefficient)?),
                    water_concentration,
                },
                TopBoundary::MixedWaterColumn { depth, residence_time, inflow_concentration } => {
                    TopBoundary::MixedWaterColumn {
                        depth: units.length(positive("water column depth", depth)?),
                        residence_time: units.time(positive("water residence time", residence_time)?),
                        inflow_concentration,
                    }
                }
            });
            bottom[chemical] = bc.bottom;
        }
        let top: Vec<TopBoundary> = top.into_iter().flatten().collect();
        if top.len() != n_chem {
            return Err(ConfigError::LengthMismatch {
                what: "boundary conditions".to_string(),
                expected: n_chem,
                found: top.len(),
            });
        }

        // ── initial conditions ────────────────────────────────────────────
        let mut initial = vec![vec![None; species.len()]; layers.len()];
        for ic in &config.initial {
            let layer = lookup(&layer_ix, "layer", &ic.layer)?;
            let chemical = lookup(&chemical_ix, "chemical", &ic.chemical)?;
            let id = match &ic.component {
                None => chemical,
                Some(name) => {
                    let component = lookup(&component_ix, "component", name)?;
                    species.sorbed_id(component, chemical).ok_or_else(|| ConfigError::UnknownName {
                        kind: "kinetic sorption pair",
                        name: format!("{}/{}", ic.chemical, name),
                    })?
                }
            };
            initial[layer][id] = Some(ic.profile);
        }

        // ── options ───────────────────────────────────────────────────────
        let options = &config.options;
        if options.end_time <= options.start_time {
            return Err(ConfigError::TimeWindow { start: options.start_time, end: options.end_time });
        }
        let time = TimeWindow {
            start: units.time(options.start_time),
            end: units.time(options.end_time),
            step: units.time(positive("time step", options.time_step)?),
            outputs: options.outputs,
        };
        positive("output count", options.outputs as f64)?;
        positive("nonlinear tolerance", options.nonlinear_tolerance)?;
        positive("Newton iteration cap", options.max_newton_iterations as f64)?;

        let base = units.velocity(options.darcy_velocity);
        let velocity = match options.velocity {
            VelocityModel::Steady => VelocityLaw::Steady { base },
            VelocityModel::Consolidation { initial_velocity, t90 } => VelocityLaw::Consolidation {
                base,
                initial: units.velocity(initial_velocity),
                t90: units.time(positive("consolidation t90", t90)?),
            },
            VelocityModel::Tidal { amplitude, period } => VelocityLaw::Tidal {
                base,
                amplitude: units.velocity(amplitude),
                period: units.time(positive("tidal period", period)?),
            },
        };

        let bioturbation = match options.bioturbation {
            None => None,
            Some(bio) => Some(BioturbationProps {
                shape: match bio.profile {
                    crate::config::BioProfile::Uniform => BioShape::Uniform,
                    crate::config::BioProfile::Gaussian { sigma } => BioShape::Gaussian {
                        sigma: units.length(positive("bioturbation sigma", sigma)?),
                    },
                },
                depth: units.length(positive("bioturbation depth", bio.depth)?),
                particle: units.diffusivity(bio.particle_diffusivity),
                porewater: units.diffusivity(bio.porewater_diffusivity),
                biomix: bio.biomix,
            }),
        };

        let deposition = match options.deposition {
            None => None,
            Some(dep) => {
                if layers.len() < 2 {
                    return Err(ConfigError::DepositionWithoutBase(layers.len()));
                }
                if dep.coarsening_ratio < 2 {
                    return Err(ConfigError::OutOfRange {
                        what: "deposition coarsening ratio".to_string(),
                        value: dep.coarsening_ratio as f64,
                        expected: "at least 2",
                    });
                }
                Some(DepositionProps {
                    velocity: units.velocity(positive("deposition velocity", dep.velocity)?),
                    spacing: units.length(positive("deposition grid spacing", dep.grid_spacing)?),
                    ratio: dep.coarsening_ratio,
                })
            }
        };

        let model = Model {
            units,
            chemicals,
            components,
            layers,
            species,
            reactions,
            top,
            bottom,
            time,
            scheme: options.scheme,
            tolerance: options.nonlinear_tolerance,
            max_newton_iterations: options.max_newton_iterations,
            velocity,
            bioturbation,
            deposition,
            sorption,
            rate_constants,
            initial,
        };

        // grid errors (too few points, non-positive thickness) surface here
        GridTopology::build(&model, DepositionState::default())?;
        Ok(model)
    }

    pub fn n_chemicals(&self) -> usize {
        self.chemicals.len()
    }

    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    pub fn chemical_names(&self) -> Vec<String> {
        self.chemicals.iter().map(|c| c.name.clone()).collect()
    }

    pub fn component_names(&self) -> Vec<String> {
        self.components.iter().map(|c| c.name.clone()).collect()
    }

    pub fn species_label(&self, id: usize) -> String {
        self.species.label(id, &self.chemical_names(), &self.component_names())
    }

    pub fn sorption(&self, component: usize, chemical: usize) -> Option<&SorptionModel> {
        self.sorption[component * self.chemicals.len() + chemical].as_ref()
    }

    /// Rate constant of `term` inside `layer`
    pub fn rate_constant(&self, layer: usize, term: &ReactionTerm) -> f64 {
        match term.constant {
            RateConstant::Layer(r) => self.rate_constants[layer][r],
            RateConstant::Fixed(k) => k,
        }
    }

    pub fn initial_profile(&self, layer: usize, species: usize) -> Option<Profile> {
        self.initial[layer][species]
    }

    /// Index of the deposition layer, when deposition is active
    pub fn deposition_layer(&self) -> Option<usize> {
        self.deposition.map(|_| 0)
    }

    /// Layers that exist from the start of the run
    pub fn base_layers(&self) -> Range<usize> {
        match self.deposition {
            Some(_) => 1..self.layers.len(),
            None => 0..self.layers.len(),
        }
    }

    pub fn biomix(&self) -> bool {
        self.bioturbation.is_some_and(|b| b.biomix)
    }

    /// Whether a step needs the Newton-Raphson correction
    pub fn is_nonlinear(&self) -> bool {
        self.reactions.has_nonlinear()
            || self
                .sorption
                .iter()
                .flatten()
                .any(|s| !s.is_kinetic() && s.is_nonlinear())
    }

    /// Equilibrium sorption of `chemical` at concentration `c` for solid loadings `solid` (fρ)
    pub fn equilibrium_partition(&self, solid: &[f64], chemical: usize, c: f64, cmax: f64) -> Partition {
        let mut partition = Partition::default();
        for (component, &load) in solid.iter().enumerate() {
            if load <= 0.0 {
                continue;
            }
            if let Some(model) = self.sorption(component, chemical)
                && !model.is_kinetic()
            {
                partition.capacity += load * model.partition(c, cmax);
                partition.slope += load * model.derivative(c, cmax);
            }
        }
        partition
    }

    /// Largest concentration the boundary conditions impose on `chemical`
    pub fn boundary_scale(&self, chemical: usize) -> f64 {
        let top = match self.top[chemical] {
            TopBoundary::FixedConcentration { concentration } => concentration,
            TopBoundary::MassTransfer { water_concentration, .. } => water_concentration,
            TopBoundary::MixedWaterColumn { inflow_concentration, .. } => inflow_concentration,
        };
        let bottom = match self.bottom[chemical] {
            BottomBoundary::FixedConcentration { concentration }
            | BottomBoundary::FluxMatching { concentration } => concentration,
            BottomBoundary::ZeroGradient => 0.0,
        };
        top.abs().max(bottom.abs())
    }
}
