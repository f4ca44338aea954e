//! Spatial grid
//!
//! The domain is a stack of **segments**, top to bottom. Each segment is
//! uniformly spaced and belongs to one layer; consecutive segments share
//! their boundary point (an **interface**). Depth `z` increases downward,
//! `z = 0` is the original sediment surface and deposited material sits at
//! negative depth.
//!
//! ```text
//!  point 0  ── top (z < 0 with deposition)
//!     │   deposited, fine     spacing h_dep
//!  point nf ── interface
//!     │   deposited, coarse   spacing r·h_dep
//!  z = 0   ── interface
//!     │   layer 1 ...
//!  point N  ── bottom
//! ```
//!
//! - [`GridTopology`]: point depths, segments, the role of every point and
//!   the bioturbation index.
//! - [`SlotLayout`]: which species live at which point and where they sit
//!   in the flat unknown vector.
//! - [`deposition`]: growth of the top of the grid and the point maps used
//!   to carry state across a regrid.

pub mod deposition;
pub mod layout;

pub use deposition::{DepositionGrid, DepositionState, PointSource, Regrid, remap_columns, remap_values};
pub use layout::SlotLayout;

use crate::error::{ConfigError, ConfigResult};
use crate::physics::Model;

/// Relative tolerance of the bioturbation depth test
const BIO_DEPTH_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Layer,
    DepositedFine,
    DepositedCoarse,
}

/// A uniformly spaced run of points `start..=end` inside one layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub layer: usize,
    pub kind: SegmentKind,
    pub start: usize,
    pub end: usize,
    /// cm
    pub spacing: f64,
}

impl Segment {
    pub fn intervals(&self) -> usize {
        self.end - self.start
    }

    pub fn contains(&self, point: usize) -> bool {
        (self.start..=self.end).contains(&point)
    }

    /// Local index of a global point
    pub fn local(&self, point: usize) -> usize {
        point - self.start
    }

    /// One-sided `∂/∂z` weights at an end point, looking into the segment
    ///
    /// Second order (3 points) when the segment has at least two intervals,
    /// first order otherwise.
    pub fn end_derivative(&self, point: usize) -> Vec<(usize, f64)> {
        let h = self.spacing;
        let wide = self.intervals() >= 2;
        if point == self.start {
            if wide {
                vec![(point, -1.5 / h), (point + 1, 2.0 / h), (point + 2, -0.5 / h)]
            } else {
                vec![(point, -1.0 / h), (point + 1, 1.0 / h)]
            }
        } else if wide {
            vec![(point, 1.5 / h), (point - 1, -2.0 / h), (point - 2, 0.5 / h)]
        } else {
            vec![(point, 1.0 / h), (point - 1, -1.0 / h)]
        }
    }

    /// Centered `∂/∂z` weights at an interior point
    pub fn centered_derivative(&self, point: usize) -> Vec<(usize, f64)> {
        let h = self.spacing;
        vec![(point - 1, -0.5 / h), (point + 1, 0.5 / h)]
    }

    /// Derivative weights used for reporting at `point`: centered inside, one-sided at the ends
    pub fn derivative(&self, point: usize) -> Vec<(usize, f64)> {
        if point == self.start || point == self.end {
            self.end_derivative(point)
        } else {
            self.centered_derivative(point)
        }
    }
}

/// What kind of equation a grid point carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointRole {
    Top { segment: usize },
    Interior { segment: usize },
    Interface { upper: usize, lower: usize },
    Bottom { segment: usize },
}

impl PointRole {
    /// Segment whose material the point is reported in (the lower side of an interface)
    pub fn owner(&self) -> usize {
        match *self {
            PointRole::Top { segment } | PointRole::Interior { segment } | PointRole::Bottom { segment } => segment,
            PointRole::Interface { lower, .. } => lower,
        }
    }
}

#[derive(Debug, Clone)]
struct Piece {
    layer: usize,
    kind: SegmentKind,
    top: f64,
    bottom: f64,
    intervals: usize,
}

/// Geometry of the grid at one moment of the run
#[derive(Debug, Clone, PartialEq)]
pub struct GridTopology {
    z: Vec<f64>,
    segments: Vec<Segment>,
    roles: Vec<PointRole>,
    bio_index: Option<usize>,
    deposition: DepositionState,
}

impl GridTopology {
    /// Builds the grid of `model` for the given amount of deposited material
    pub fn build(model: &Model, deposition: DepositionState) -> ConfigResult<Self> {
        let mut pieces = Vec::new();

        if let (Some(props), Some(layer)) = (model.deposition, model.deposition_layer()) {
            let h = props.spacing;
            let coarse_depth = (props.ratio * deposition.coarse) as f64 * h;
            let top = -(deposition.fine as f64) * h - coarse_depth;
            if deposition.fine > 0 {
                pieces.push(Piece {
                    layer,
                    kind: SegmentKind::DepositedFine,
                    top,
                    bottom: -coarse_depth,
                    intervals: deposition.fine,
                });
            }
            if deposition.coarse > 0 {
                pieces.push(Piece {
                    layer,
                    kind: SegmentKind::DepositedCoarse,
                    top: -coarse_depth,
                    bottom: 0.0,
                    intervals: deposition.coarse,
                });
            }
        }

        let mut depth = 0.0;
        for layer in model.base_layers() {
            let props = &model.layers[layer];
            if props.points < 2 {
                return Err(ConfigError::TooFewPoints { layer: props.name.clone(), points: props.points });
            }
            if !(props.thickness > 0.0) {
                return Err(ConfigError::NonPositive {
                    what: format!("thickness of layer '{}'", props.name),
                    value: props.thickness,
                });
            }
            pieces.push(Piece {
                layer,
                kind: SegmentKind::Layer,
                top: depth,
                bottom: depth + props.thickness,
                intervals: props.points - 1,
            });
            depth += props.thickness;
        }
        if pieces.is_empty() {
            return Err(ConfigError::Missing("layers"));
        }

        let bio_depth = model.bioturbation.map(|b| b.depth);
        Ok(Self::from_pieces(&pieces, bio_depth, deposition))
    }

    fn from_pieces(pieces: &[Piece], bio_depth: Option<f64>, deposition: DepositionState) -> Self {
        let mut z = vec![pieces[0].top];
        let mut segments = Vec::with_capacity(pieces.len());
        for piece in pieces {
            let start = z.len() - 1;
            for k in 1..=piece.intervals {
                z.push(piece.top + (piece.bottom - piece.top) * k as f64 / piece.intervals as f64);
            }
            segments.push(Segment {
                layer: piece.layer,
                kind: piece.kind,
                start,
                end: start + piece.intervals,
                spacing: (piece.bottom - piece.top) / piece.intervals as f64,
            });
        }

        let last = z.len() - 1;
        let mut roles: Vec<PointRole> = Vec::with_capacity(z.len());
        for (g, segment) in segments.iter().enumerate() {
            for i in segment.start..=segment.end {
                let role = if i == 0 {
                    PointRole::Top { segment: g }
                } else if i == last {
                    PointRole::Bottom { segment: g }
                } else if i == segment.start {
                    continue;
                } else if i == segment.end {
                    PointRole::Interface { upper: g, lower: g + 1 }
                } else {
                    PointRole::Interior { segment: g }
                };
                roles.push(role);
            }
        }

        let bio_index = bio_depth.map(|depth| {
            let limit = depth * (1.0 + BIO_DEPTH_TOLERANCE);
            z.iter().rposition(|&zi| zi - z[0] <= limit).unwrap_or(0)
        });

        Self { z, segments, roles, bio_index, deposition }
    }

    pub fn n_points(&self) -> usize {
        self.z.len()
    }

    /// Depth of every point, cm
    pub fn z(&self) -> &[f64] {
        &self.z
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> &Segment {
        &self.segments[index]
    }

    pub fn role(&self, point: usize) -> PointRole {
        self.roles[point]
    }

    /// Segment index the point is reported in
    pub fn owner(&self, point: usize) -> usize {
        self.roles[point].owner()
    }

    /// Segments containing the point (one, or two at an interface)
    pub fn segments_at(&self, point: usize) -> impl Iterator<Item = usize> + '_ {
        self.segments
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.contains(point))
            .map(|(g, _)| g)
    }

    /// Deepest point inside the bioturbated zone
    pub fn bio_index(&self) -> Option<usize> {
        self.bio_index
    }

    pub fn deposition(&self) -> DepositionState {
        self.deposition
    }

    /// First point of every segment followed by the bottom point
    pub fn boundaries(&self) -> Vec<usize> {
        let mut points: Vec<usize> = self.segments.iter().map(|s| s.start).collect();
        points.push(self.n_points() - 1);
        points
    }
}
