//! Output snapshots
//!
//! A [`Snapshot`] holds every reported profile at one output time. Profiles
//! are keyed by [`Field`], the same way a state container keys its
//! quantities, and are stored as `ndarray` arrays of shape
//! `(rows, points)`: one row per chemical, or per component for
//! [`Field::Fraction`].

use std::collections::HashMap;
use std::ops::{Add, Mul};

use ndarray::{Array1, Array2, ArrayView1};

/// Reported profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Dissolved concentration `C`
    PoreWater,
    /// Downward flux `−D·∂C/∂z − Uθ·C` plus particle mixing of kinetic sorbed species
    Flux,
    /// Solid-weighted sorbed concentration `Σfρq / Σfρ`
    Solid,
    /// Bulk concentration `eθC + Σfρq`
    Total,
    /// Volume fraction of every component
    Fraction,
    /// Sorbed concentration `q` on one component
    SolidComponent(usize),
}

impl Field {
    pub fn name(&self) -> String {
        match self {
            Field::PoreWater => "pore water".to_string(),
            Field::Flux => "flux".to_string(),
            Field::Solid => "solid".to_string(),
            Field::Total => "total".to_string(),
            Field::Fraction => "fraction".to_string(),
            Field::SolidComponent(j) => format!("solid component {j}"),
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// All reported profiles at one time
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub time: f64,
    /// Depth of every grid point, positive downward
    pub depth: Array1<f64>,
    fields: HashMap<Field, Array2<f64>>,
    /// Overlying-water concentration per chemical, when a mixed water column is simulated
    pub overlying_water: Option<Array1<f64>>,
}

impl Snapshot {
    pub fn new(time: f64, depth: Array1<f64>) -> Self {
        Self { time, depth, fields: HashMap::new(), overlying_water: None }
    }

    pub fn n_points(&self) -> usize {
        self.depth.len()
    }

    pub fn get(&self, field: Field) -> Option<&Array2<f64>> {
        self.fields.get(&field)
    }

    pub fn set(&mut self, field: Field, values: Array2<f64>) {
        self.fields.insert(field, values);
    }

    pub fn get_mut(&mut self, field: Field) -> Option<&mut Array2<f64>> {
        self.fields.get_mut(&field)
    }

    pub fn available_fields(&self) -> Vec<Field> {
        self.fields.keys().copied().collect()
    }

    /// Depth profile of one row of a field
    pub fn profile(&self, field: Field, row: usize) -> Option<ArrayView1<'_, f64>> {
        self.fields
            .get(&field)
            .filter(|values| row < values.nrows())
            .map(|values| values.row(row))
    }

    pub fn value(&self, field: Field, row: usize, point: usize) -> Option<f64> {
        self.profile(field, row).and_then(|p| p.get(point).copied())
    }

    /// Linear blend `(1 − w)·self + w·other`, stamped with `time`
    pub fn blend(&self, other: &Snapshot, weight: f64, time: f64) -> Snapshot {
        let mut out = self.clone() * (1.0 - weight) + other.clone() * weight;
        out.time = time;
        out
    }
}

// Arithmetic used for interpolation between time levels; depth is a
// coordinate and follows the left operand

impl Add for Snapshot {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        for (field, values) in rhs.fields {
            if let Some(existing) = self.fields.get_mut(&field) {
                *existing += &values;
            } else {
                self.fields.insert(field, values);
            }
        }
        self.overlying_water = match (self.overlying_water, rhs.overlying_water) {
            (Some(a), Some(b)) => Some(a + b),
            (a, b) => a.or(b),
        };
        self.time += rhs.time;
        self
    }
}

impl Mul<f64> for Snapshot {
    type Output = Self;

    fn mul(mut self, scalar: f64) -> Self::Output {
        for values in self.fields.values_mut() {
            *values *= scalar;
        }
        if let Some(water) = self.overlying_water.as_mut() {
            *water *= scalar;
        }
        self.time *= scalar;
        self
    }
}
