//! Deposition regridding
//!
//! Deposited material accumulates on top of the domain in **fine intervals**
//! of spacing `h_dep`. Once `2r` fine intervals exist, the `r` oldest ones
//! (those closest to the original surface) merge into one **coarse
//! interval** of spacing `r·h_dep`, so the point count grows like
//! `elapsed / r` instead of `elapsed`.
//!
//! The number of deposited fine units after `elapsed` years is
//! `⌊V·elapsed / h_dep + 1e-9⌋`; the fine/coarse split is a pure function of
//! that count ([`DepositionState::for_units`]), so the grid at a given time
//! does not depend on the time step.
//!
//! A regrid is described by a [`PointSource`] per new point. Maps for
//! insertions and merges are built separately and chained with [`compose`];
//! [`remap_values`] and [`remap_columns`] then carry the unknown vector and
//! the fraction matrix to the new grid.

use nalgebra::{DMatrix, DVector};
use num::integer::div_rem;

use crate::physics::DepositionProps;

use super::SlotLayout;

/// Tolerance on the deposited unit count
const UNIT_TOLERANCE: f64 = 1e-9;

/// Number of fine and coarse deposited intervals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DepositionState {
    pub fine: usize,
    pub coarse: usize,
}

impl DepositionState {
    /// Canonical split of `units` fine units with coarsening ratio `ratio`
    ///
    /// The fine segment always keeps between `r` and `2r − 1` intervals once
    /// coarsening has started.
    pub fn for_units(units: usize, ratio: usize) -> Self {
        if units < 2 * ratio {
            return Self { fine: units, coarse: 0 };
        }
        let (coarse, rest) = div_rem(units - ratio, ratio);
        Self { fine: ratio + rest, coarse }
    }

    /// Deposited thickness in fine units
    pub fn units(&self, ratio: usize) -> usize {
        self.fine + ratio * self.coarse
    }
}

/// Where a point of the new grid takes its values from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointSource {
    Old(usize),
    /// Freshly deposited point
    New,
}

/// `inserted` new points on top of a grid of `old_points` points
pub fn insertion_map(old_points: usize, inserted: usize) -> Vec<PointSource> {
    (0..inserted)
        .map(|_| PointSource::New)
        .chain((0..old_points).map(PointSource::Old))
        .collect()
}

/// Merge of the `ratio` deepest fine intervals of a fine segment with `fine` intervals
///
/// Points `fine − ratio + 1 ..= fine − 1` are dropped.
pub fn coarsening_map(old_points: usize, fine: usize, ratio: usize) -> Vec<PointSource> {
    let dropped = (fine + 1 - ratio)..fine;
    (0..old_points)
        .filter(|i| !dropped.contains(i))
        .map(PointSource::Old)
        .collect()
}

/// Chains two maps: `second` refers to points of the grid produced by `first`
pub fn compose(first: &[PointSource], second: &[PointSource]) -> Vec<PointSource> {
    second
        .iter()
        .map(|source| match *source {
            PointSource::Old(i) => first[i],
            PointSource::New => PointSource::New,
        })
        .collect()
}

/// Carries an unknown vector across a regrid
///
/// `fill(point, species)` supplies values at new points and for species a
/// kept point did not carry before.
pub fn remap_values(
    old_layout: &SlotLayout,
    new_layout: &SlotLayout,
    values: &DVector<f64>,
    map: &[PointSource],
    fill: impl Fn(usize, usize) -> f64,
) -> DVector<f64> {
    let mut out = DVector::zeros(new_layout.len());
    for (point, source) in map.iter().enumerate() {
        for (slot, species) in new_layout.slots_at(point) {
            out[slot] = match *source {
                PointSource::Old(old) => match old_layout.slot(old, species) {
                    Some(old_slot) => values[old_slot],
                    None => fill(point, species),
                },
                PointSource::New => fill(point, species),
            };
        }
    }
    out
}

/// Carries a per-point matrix (one column per point) across a regrid
pub fn remap_columns(matrix: &DMatrix<f64>, map: &[PointSource], fill: &[f64]) -> DMatrix<f64> {
    DMatrix::from_fn(matrix.nrows(), map.len(), |row, point| match map[point] {
        PointSource::Old(old) => matrix[(row, old)],
        PointSource::New => fill[row],
    })
}

/// Outcome of one deposition advance
#[derive(Debug, Clone, PartialEq)]
pub struct Regrid {
    pub state: DepositionState,
    pub inserted: usize,
    pub merged: usize,
    pub map: Vec<PointSource>,
}

/// Tracks the deposited thickness and produces regrid maps
#[derive(Debug, Clone, PartialEq)]
pub struct DepositionGrid {
    props: DepositionProps,
    state: DepositionState,
}

impl DepositionGrid {
    pub fn new(props: DepositionProps) -> Self {
        Self { props, state: DepositionState::default() }
    }

    pub fn state(&self) -> DepositionState {
        self.state
    }

    /// Fine units deposited after `elapsed` years
    pub fn target_units(&self, elapsed: f64) -> usize {
        let units = self.props.velocity * elapsed.max(0.0) / self.props.spacing + UNIT_TOLERANCE;
        units.floor() as usize
    }

    /// Advances to `elapsed`; returns the regrid when new material was laid down
    pub fn advance(&mut self, elapsed: f64, old_points: usize) -> Option<Regrid> {
        let ratio = self.props.ratio;
        let current = self.state.units(ratio);
        let target = self.target_units(elapsed);
        if target <= current {
            return None;
        }

        let inserted = target - current;
        let mut map = insertion_map(old_points, inserted);
        let mut fine = self.state.fine + inserted;
        let mut merged = 0;
        while fine >= 2 * ratio {
            map = compose(&map, &coarsening_map(map.len(), fine, ratio));
            fine -= ratio;
            merged += 1;
        }

        let state = DepositionState { fine, coarse: self.state.coarse + merged };
        debug_assert_eq!(state, DepositionState::for_units(target, ratio));
        self.state = state;
        Some(Regrid { state, inserted, merged, map })
    }
}
