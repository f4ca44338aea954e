//! Output times and interpolation between internal steps

use super::Snapshot;

/// Collects snapshots at prescribed output times
///
/// Each internal step offers the snapshots at both ends of the step; every
/// pending output time inside `(t₀, t₁]` is filled by linear interpolation.
#[derive(Debug, Clone)]
pub struct OutputAccumulator {
    times: Vec<f64>,
    tolerance: f64,
    snapshots: Vec<Snapshot>,
}

impl OutputAccumulator {
    pub fn new(times: Vec<f64>) -> Self {
        let scale = times.iter().fold(1.0_f64, |m, t| m.max(t.abs()));
        Self { times, tolerance: 1e-9 * scale, snapshots: Vec::new() }
    }

    fn pending(&self) -> Option<f64> {
        self.times.get(self.snapshots.len()).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.pending().is_none()
    }

    /// Whether an output time falls at or before `time`
    pub fn wants(&self, time: f64) -> bool {
        self.pending().is_some_and(|t| t <= time + self.tolerance)
    }

    /// Records the initial state for output times at the start of the run
    pub fn start(&mut self, initial: &Snapshot) {
        while let Some(t) = self.pending() {
            if t > initial.time + self.tolerance {
                break;
            }
            let mut snapshot = initial.clone();
            snapshot.time = t;
            self.snapshots.push(snapshot);
        }
    }

    /// Fills every pending output time up to `after.time`
    pub fn record(&mut self, before: &Snapshot, after: &Snapshot) {
        let span = after.time - before.time;
        while let Some(t) = self.pending() {
            if t > after.time + self.tolerance {
                break;
            }
            let weight = if span > 0.0 { ((t - before.time) / span).clamp(0.0, 1.0) } else { 1.0 };
            self.snapshots.push(before.blend(after, weight, t));
        }
    }

    pub fn finish(self) -> Vec<Snapshot> {
        self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Field;
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};

    fn snapshot(time: f64, value: f64) -> Snapshot {
        let mut s = Snapshot::new(time, array![0.0]);
        s.set(Field::PoreWater, Array2::from_elem((1, 1), value));
        s
    }

    #[test]
    fn test_start_records_initial_time_only() {
        let mut acc = OutputAccumulator::new(vec![0.0, 0.5, 1.0]);
        acc.start(&snapshot(0.0, 1.0));
        assert!(!acc.wants(0.2));
        assert!(acc.wants(0.5));
        assert!(!acc.is_complete());
    }

    #[test]
    fn test_record_interpolates_inside_step() {
        let mut acc = OutputAccumulator::new(vec![0.0, 0.5, 1.0]);
        acc.start(&snapshot(0.0, 0.0));
        acc.record(&snapshot(0.4, 4.0), &snapshot(0.6, 6.0));
        acc.record(&snapshot(0.6, 6.0), &snapshot(1.0, 10.0));
        assert!(acc.is_complete());

        let out = acc.finish();
        assert_eq!(out.len(), 3);
        assert_relative_eq!(out[1].time, 0.5);
        assert_relative_eq!(out[1].value(Field::PoreWater, 0, 0).unwrap(), 5.0, epsilon = 1e-12);
        assert_relative_eq!(out[2].value(Field::PoreWater, 0, 0).unwrap(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_output_at_end() {
        let mut acc = OutputAccumulator::new(vec![2.0]);
        acc.start(&snapshot(0.0, 0.0));
        assert!(!acc.is_complete());
        acc.record(&snapshot(1.0, 1.0), &snapshot(2.0, 2.0));
        assert_eq!(acc.finish().len(), 1);
    }
}
