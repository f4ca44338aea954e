//! Slot layout of the unknown vector
//!
//! Unknowns are stored point-major: all species of point 0, then all
//! species of point 1, and so on. The species present at a point is the
//! union of the species of the segments containing it, so the number of
//! slots per point varies and the layout keeps an offset table.
//!
//! A segment carries every dissolved chemical, plus the sorbed species of
//! kinetic pairs whose component is present in its layer (all kinetic
//! pairs when the solid composition is biomixed).

use crate::physics::Model;

use super::GridTopology;

#[derive(Debug, Clone, PartialEq)]
pub struct SlotLayout {
    /// `offsets[i]..offsets[i + 1]` are the slots of point `i`
    offsets: Vec<usize>,
    /// Species id of every slot
    species: Vec<usize>,
    /// Sorted species ids of every segment
    segment_species: Vec<Vec<usize>>,
    /// Slots of every species id, top to bottom
    by_species: Vec<Vec<usize>>,
}

impl SlotLayout {
    pub fn new(model: &Model, topology: &GridTopology) -> Self {
        let biomix = model.biomix();
        let segment_species: Vec<Vec<usize>> = topology
            .segments()
            .iter()
            .map(|segment| {
                let composition = &model.layers[segment.layer].composition;
                (0..model.n_chemicals())
                    .chain(
                        model
                            .species
                            .sorbed()
                            .filter(|&(_, component, _)| biomix || composition[component] > 0.0)
                            .map(|(id, _, _)| id),
                    )
                    .collect()
            })
            .collect();

        let mut offsets = Vec::with_capacity(topology.n_points() + 1);
        let mut species = Vec::new();
        let mut by_species = vec![Vec::new(); model.species.len()];
        for point in 0..topology.n_points() {
            offsets.push(species.len());
            let mut here: Vec<usize> = topology
                .segments_at(point)
                .flat_map(|g| segment_species[g].iter().copied())
                .collect();
            here.sort_unstable();
            here.dedup();
            for id in here {
                by_species[id].push(species.len());
                species.push(id);
            }
        }
        offsets.push(species.len());

        Self { offsets, species, segment_species, by_species }
    }

    /// Total number of unknowns
    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    pub fn n_points(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Species ids present at a point, ascending
    pub fn species_at(&self, point: usize) -> &[usize] {
        &self.species[self.offsets[point]..self.offsets[point + 1]]
    }

    /// `(slot, species)` pairs of a point
    pub fn slots_at(&self, point: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.offsets[point]..self.offsets[point + 1]).map(|slot| (slot, self.species[slot]))
    }

    /// Position of `species` at `point` in the unknown vector
    pub fn slot(&self, point: usize, species: usize) -> Option<usize> {
        let here = self.species_at(point);
        here.binary_search(&species).ok().map(|k| self.offsets[point] + k)
    }

    pub fn species_of(&self, slot: usize) -> usize {
        self.species[slot]
    }

    pub fn segment_has(&self, segment: usize, species: usize) -> bool {
        self.segment_species[segment].binary_search(&species).is_ok()
    }

    /// Every slot holding `species`, top to bottom
    pub fn slots_of(&self, species: usize) -> &[usize] {
        &self.by_species[species]
    }

    /// Slot offsets of the segment boundary points
    pub fn boundary_offsets(&self, topology: &GridTopology) -> Vec<usize> {
        topology.boundaries().into_iter().map(|p| self.offsets[p]).collect()
    }
}
