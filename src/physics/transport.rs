//! Transport parameters
//!
//! Evaluates the coefficients of the transport equation at every grid point
//! for one time level:
//!
//! $$
//! R\,\frac{\partial C}{\partial t} = \frac{\partial}{\partial z}\left(D\,\frac{\partial C}{\partial z}\right)
//!   + U\theta\,\frac{\partial C}{\partial z} + \text{reactions}
//! $$
//!
//! with `z` positive downward and the Darcy velocity `U` positive upward.
//!
//! Parameters are stored **per segment**: a point shared by two segments (an
//! interface) has one entry on each side, so flux continuity can use the
//! coefficients of each material. The concentration-dependent parts
//! (retardation and the particle-biodiffusion share of `D`) are left to the
//! assembler, which combines these values with the sorption models.

use nalgebra::DMatrix;

use crate::config::Tortuosity;
use crate::grid::GridTopology;

use super::model::Model;

/// Effective molecular diffusivity of the pore water in bulk sediment
pub fn bulk_diffusivity(tortuosity: Tortuosity, porosity: f64, dw: f64) -> f64 {
    if porosity <= 0.0 {
        return 0.0;
    }
    match tortuosity {
        Tortuosity::None => porosity * dw,
        Tortuosity::MillingtonQuirk => porosity.powf(4.0 / 3.0) * dw,
        Tortuosity::Boudreau => porosity * dw / (1.0 - (porosity * porosity).ln()),
    }
}

/// Darcy velocity as a function of the time elapsed since the start of the run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VelocityLaw {
    Steady { base: f64 },
    /// Decays by one decade every `t90`
    Consolidation { base: f64, initial: f64, t90: f64 },
    Tidal { base: f64, amplitude: f64, period: f64 },
}

impl VelocityLaw {
    pub fn at(&self, elapsed: f64) -> f64 {
        match *self {
            VelocityLaw::Steady { base } => base,
            VelocityLaw::Consolidation { base, initial, t90 } => {
                base + initial * (-std::f64::consts::LN_10 * elapsed / t90).exp()
            }
            VelocityLaw::Tidal { base, amplitude, period } => {
                base + amplitude * (2.0 * std::f64::consts::PI * elapsed / period).sin()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BioShape {
    Uniform,
    Gaussian { sigma: f64 },
}

/// Bioturbation in internal units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BioturbationProps {
    pub shape: BioShape,
    /// cm below the current surface
    pub depth: f64,
    /// Particle biodiffusivity at the surface, cm²/yr
    pub particle: f64,
    /// Pore-water biodiffusivity at the surface, cm²/yr
    pub porewater: f64,
    pub biomix: bool,
}

impl BioturbationProps {
    /// Relative mixing intensity at `depth` cm below the surface
    pub fn intensity(&self, depth: f64) -> f64 {
        match self.shape {
            BioShape::Uniform => 1.0,
            BioShape::Gaussian { sigma } => (-depth * depth / (2.0 * sigma * sigma)).exp(),
        }
    }
}

/// Coefficients at one point on one side
#[derive(Debug, Clone, PartialEq)]
pub struct PointParameters {
    pub porosity: f64,
    /// Volume fraction `f` of every component
    pub fraction: Vec<f64>,
    /// `f·ρ` of every component (kg/L of bulk)
    pub solid: Vec<f64>,
    /// `1 + Kdoc·DOC`, per chemical
    pub theta: Vec<f64>,
    /// Tortuosity-corrected molecular diffusivity, per chemical
    pub molecular: Vec<f64>,
    /// `α·|U|`
    pub dispersion: f64,
    pub bio_particle: f64,
    pub bio_porewater: f64,
}

impl PointParameters {
    fn new(model: &Model, layer: usize, fraction: Vec<f64>, velocity: f64, bio: (f64, f64)) -> Self {
        let props = &model.layers[layer];
        let porosity: f64 = fraction
            .iter()
            .zip(&model.components)
            .map(|(f, c)| f * c.porosity)
            .sum();
        let solid = fraction
            .iter()
            .zip(&model.components)
            .map(|(f, c)| f * c.density)
            .collect();
        let theta = model.chemicals.iter().map(|c| 1.0 + c.kdoc * props.doc).collect();
        let molecular = model
            .chemicals
            .iter()
            .map(|c| bulk_diffusivity(props.tortuosity, porosity, c.diffusivity))
            .collect();
        Self {
            porosity,
            fraction,
            solid,
            theta,
            molecular,
            dispersion: props.dispersivity * velocity.abs(),
            bio_particle: bio.0,
            bio_porewater: bio.1,
        }
    }

    /// Effective diffusivity of a dissolved chemical given `Σ fρK` of its equilibrium sorption
    pub fn dissolved_diffusivity(&self, chemical: usize, capacity: f64) -> f64 {
        self.molecular[chemical]
            + self.dispersion
            + self.bio_porewater * self.porosity * self.theta[chemical]
            + self.bio_particle * capacity
    }

    /// Particle mixing coefficient of a species sorbed on `component`
    pub fn sorbed_diffusivity(&self, component: usize) -> f64 {
        self.bio_particle * self.solid[component]
    }

    /// Pore-water capacity `e·θ` of a chemical
    pub fn water_capacity(&self, chemical: usize) -> f64 {
        self.porosity * self.theta[chemical]
    }
}

/// Parameters of the points of one segment, `points[i - segment.start]`
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentParameters {
    pub layer: usize,
    pub points: Vec<PointParameters>,
}

/// All transport coefficients of one time level
#[derive(Debug, Clone, PartialEq)]
pub struct TransportParameters {
    pub time: f64,
    /// Darcy velocity, cm/yr, positive upward
    pub velocity: f64,
    pub segments: Vec<SegmentParameters>,
}

impl TransportParameters {
    /// Evaluates every segment at `time` for the given component fractions
    ///
    /// Without biomixing the fractions of a segment are its layer composition
    /// at every point (an interface takes each side's own composition);
    /// with biomixing the mixed field `fractions` is used point by point.
    pub fn evaluate(model: &Model, topology: &GridTopology, fractions: &DMatrix<f64>, time: f64) -> Self {
        let velocity = model.velocity.at(time - model.time.start);
        let biomix = model.biomix();
        let z = topology.z();
        let segments = topology
            .segments()
            .iter()
            .map(|segment| {
                let composition = &model.layers[segment.layer].composition;
                let points = (segment.start..=segment.end)
                    .map(|i| {
                        let fraction = if biomix {
                            fractions.column(i).iter().copied().collect()
                        } else {
                            composition.clone()
                        };
                        let bio = match (model.bioturbation, topology.bio_index()) {
                            (Some(b), Some(pbio)) if i <= pbio => {
                                let w = b.intensity(z[i] - z[0]);
                                (b.particle * w, b.porewater * w)
                            }
                            _ => (0.0, 0.0),
                        };
                        PointParameters::new(model, segment.layer, fraction, velocity, bio)
                    })
                    .collect();
                SegmentParameters { layer: segment.layer, points }
            })
            .collect();
        Self { time, velocity, segments }
    }

    pub fn point(&self, segment: usize, local: usize) -> &PointParameters {
        &self.segments[segment].points[local]
    }
}
