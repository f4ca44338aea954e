//! Transported species
//!
//! Every chemical is transported dissolved in pore water. Under kinetic
//! sorption a (component, chemical) pair also carries its sorbed
//! concentration as an additional unknown; those sorbed species follow the
//! dissolved ones in the table.

/// Identity of one transported unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    Dissolved { chemical: usize },
    Sorbed { component: usize, chemical: usize },
}

impl Species {
    pub fn chemical(&self) -> usize {
        match self {
            Species::Dissolved { chemical } | Species::Sorbed { chemical, .. } => *chemical,
        }
    }

    pub fn is_dissolved(&self) -> bool {
        matches!(self, Species::Dissolved { .. })
    }
}

/// Index table of species: ids `0..n_chemicals` are dissolved, the rest sorbed
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesTable {
    entries: Vec<Species>,
    n_chemicals: usize,
}

impl SpeciesTable {
    /// Builds the table from the kinetic (component, chemical) pairs
    ///
    /// Pairs are stored in the order given; duplicates are ignored.
    pub fn new(n_chemicals: usize, kinetic_pairs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut entries: Vec<Species> = (0..n_chemicals)
            .map(|chemical| Species::Dissolved { chemical })
            .collect();
        for (component, chemical) in kinetic_pairs {
            let species = Species::Sorbed { component, chemical };
            if !entries.contains(&species) {
                entries.push(species);
            }
        }
        Self { entries, n_chemicals }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn n_chemicals(&self) -> usize {
        self.n_chemicals
    }

    pub fn get(&self, id: usize) -> Species {
        self.entries[id]
    }

    /// Ids of the sorbed species only
    pub fn sorbed(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.entries[self.n_chemicals..]
            .iter()
            .enumerate()
            .filter_map(move |(offset, species)| match species {
                Species::Sorbed { component, chemical } => Some((self.n_chemicals + offset, *component, *chemical)),
                Species::Dissolved { .. } => None,
            })
    }

    pub fn sorbed_id(&self, component: usize, chemical: usize) -> Option<usize> {
        self.entries
            .iter()
            .position(|s| *s == Species::Sorbed { component, chemical })
    }

    /// Human-readable label used in diagnostics
    pub fn label(&self, id: usize, chemicals: &[String], components: &[String]) -> String {
        match self.entries[id] {
            Species::Dissolved { chemical } => chemicals[chemical].clone(),
            Species::Sorbed { component, chemical } => {
                format!("{} sorbed on {}", chemicals[chemical], components[component])
            }
        }
    }
}
