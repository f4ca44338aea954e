//! Reported quantities from a solution vector
//!
//! [`FluxCalculator`] evaluates the pore-water, flux, solid, total, fraction
//! and overlying-water profiles of one time level in internal units.
//!
//! The flux at point `i` uses the coefficients of the segment the point is
//! reported in from above: centered differences inside a segment, forward
//! at the top, backward at the bottom and at interfaces (upper side).

use nalgebra::DVector;
use ndarray::{Array1, Array2};

use crate::config::TopBoundary;
use crate::grid::{GridTopology, PointRole, SlotLayout};
use crate::physics::{Model, TransportParameters};

use super::{Field, Snapshot};

pub struct FluxCalculator<'a> {
    model: &'a Model,
    topology: &'a GridTopology,
    layout: &'a SlotLayout,
    cmax: &'a [f64],
}

impl<'a> FluxCalculator<'a> {
    pub fn new(model: &'a Model, topology: &'a GridTopology, layout: &'a SlotLayout, cmax: &'a [f64]) -> Self {
        Self { model, topology, layout, cmax }
    }

    fn value(&self, conc: &DVector<f64>, point: usize, species: usize) -> Option<f64> {
        self.layout.slot(point, species).map(|slot| conc[slot])
    }

    /// Segment a flux at `point` is computed in
    fn flux_segment(&self, point: usize) -> usize {
        match self.topology.role(point) {
            PointRole::Top { segment } | PointRole::Interior { segment } | PointRole::Bottom { segment } => segment,
            PointRole::Interface { upper, .. } => upper,
        }
    }

    /// Sorbed concentration of `chemical` on `component` at `point`
    fn sorbed(&self, conc: &DVector<f64>, point: usize, component: usize, chemical: usize) -> f64 {
        if let Some(id) = self.model.species.sorbed_id(component, chemical) {
            return self.value(conc, point, id).unwrap_or(0.0);
        }
        match self.model.sorption(component, chemical) {
            Some(model) => self.value(conc, point, chemical).map_or(0.0, |c| model.sorbed(c)),
            None => 0.0,
        }
    }

    fn flux(&self, params: &TransportParameters, conc: &DVector<f64>, point: usize, chemical: usize) -> f64 {
        let g = self.flux_segment(point);
        let segment = self.topology.segment(g);
        let p = params.point(g, segment.local(point));
        let weights = segment.derivative(point);
        let gradient = |species: usize| -> f64 {
            weights
                .iter()
                .map(|&(i, w)| w * self.value(conc, i, species).unwrap_or(0.0))
                .sum()
        };

        let c = self.value(conc, point, chemical).unwrap_or(0.0);
        let partition = self.model.equilibrium_partition(&p.solid, chemical, c, self.cmax[chemical]);
        let diffusivity = p.dissolved_diffusivity(chemical, partition.capacity);
        let mut flux = -diffusivity * gradient(chemical) - params.velocity * p.theta[chemical] * c;

        for (id, component, owner) in self.model.species.sorbed() {
            if owner == chemical && self.layout.segment_has(g, id) {
                flux -= p.sorbed_diffusivity(component) * gradient(id);
            }
        }
        flux
    }

    /// Every reported field at `time`
    pub fn snapshot(&self, params: &TransportParameters, conc: &DVector<f64>, time: f64) -> Snapshot {
        let n_points = self.topology.n_points();
        let n_chem = self.model.n_chemicals();
        let n_comp = self.model.n_components();

        let mut pore = Array2::zeros((n_chem, n_points));
        let mut flux = Array2::zeros((n_chem, n_points));
        let mut solid = Array2::zeros((n_chem, n_points));
        let mut total = Array2::zeros((n_chem, n_points));
        let mut fraction = Array2::zeros((n_comp, n_points));
        let mut by_component = vec![Array2::zeros((n_chem, n_points)); n_comp];

        for point in 0..n_points {
            let g = self.topology.owner(point);
            let p = params.point(g, self.topology.segment(g).local(point));
            let loading: f64 = p.solid.iter().sum();
            for j in 0..n_comp {
                fraction[[j, point]] = p.fraction[j];
            }
            for c in 0..n_chem {
                let value = self.value(conc, point, c).unwrap_or(0.0);
                let mut sorbed_mass = 0.0;
                for (j, q_out) in by_component.iter_mut().enumerate() {
                    let q = self.sorbed(conc, point, j, c);
                    q_out[[c, point]] = q;
                    sorbed_mass += p.solid[j] * q;
                }
                pore[[c, point]] = value;
                flux[[c, point]] = self.flux(params, conc, point, c);
                solid[[c, point]] = if loading > 0.0 { sorbed_mass / loading } else { 0.0 };
                total[[c, point]] = p.water_capacity(c) * value + sorbed_mass;
            }
        }

        let depth = Array1::from_vec(self.topology.z().to_vec());
        let mut snapshot = Snapshot::new(time, depth);
        snapshot.set(Field::PoreWater, pore);
        snapshot.set(Field::Flux, flux);
        snapshot.set(Field::Solid, solid);
        snapshot.set(Field::Total, total);
        snapshot.set(Field::Fraction, fraction);
        for (j, values) in by_component.into_iter().enumerate() {
            snapshot.set(Field::SolidComponent(j), values);
        }

        let mixed = self
            .model
            .top
            .iter()
            .any(|top| matches!(top, TopBoundary::MixedWaterColumn { .. }));
        if mixed {
            snapshot.overlying_water = Some(Array1::from_iter((0..n_chem).map(|c| {
                self.model.top[c]
                    .water_concentration()
                    .unwrap_or_else(|| self.value(conc, 0, c).unwrap_or(0.0))
            })));
        }
        snapshot
    }
}
