//! Simulation output
//!
//! # Architecture
//!
//! ```text
//! output/
//! ├── mod.rs          ← SimulationOutput (user units, metadata)
//! ├── snapshot.rs     ← Field, Snapshot (profiles at one time)
//! ├── flux.rs         ← FluxCalculator (profiles from a solution vector)
//! └── accumulator.rs  ← OutputAccumulator (output times, interpolation)
//! ```
//!
//! Snapshots are computed in internal units (cm, yr) and converted once, when
//! the [`SimulationOutput`] is assembled: depths and times back to the
//! user's length and time units, fluxes to concentration·length/time.
//! Concentrations never change unit.
//!
//! # Example
//!
//! ```rust,ignore
//! use sedcap_rs::output::Field;
//!
//! let output = solver.solve(&scenario)?;
//! let last = output.final_snapshot().unwrap();
//! let pcb = output.chemical_index("PCB").unwrap();
//! let surface_flux = last.value(Field::Flux, pcb, 0);
//! ```

pub mod accumulator;
pub mod flux;
pub mod snapshot;

pub use accumulator::OutputAccumulator;
pub use flux::FluxCalculator;
pub use snapshot::{Field, Snapshot};

use std::collections::HashMap;

use crate::config::UnitSystem;

/// Result of one run
#[derive(Debug, Clone)]
pub struct SimulationOutput {
    pub chemicals: Vec<String>,
    pub components: Vec<String>,
    /// One snapshot per output time, in user units
    pub snapshots: Vec<Snapshot>,
    metadata: HashMap<String, String>,
}

impl SimulationOutput {
    /// Converts internal-unit snapshots to the user's units
    pub fn new(chemicals: Vec<String>, components: Vec<String>, snapshots: Vec<Snapshot>, units: &UnitSystem) -> Self {
        let snapshots = snapshots
            .into_iter()
            .map(|mut s| {
                s.time = units.time_out(s.time);
                s.depth.mapv_inplace(|z| units.depth_out(z));
                if let Some(flux) = s.get_mut(Field::Flux) {
                    flux.mapv_inplace(|f| units.flux_out(f));
                }
                s
            })
            .collect();
        Self { chemicals, components, snapshots, metadata: HashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.snapshots.iter().map(|s| s.time).collect()
    }

    pub fn final_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn chemical_index(&self, name: &str) -> Option<usize> {
        self.chemicals.iter().position(|c| c == name)
    }

    pub fn component_index(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c == name)
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl ToString) {
        self.metadata.insert(key.into(), value.to_string());
    }

    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }
}
