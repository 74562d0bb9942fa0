//! Chord-length distances along a sampled curve.
//!
//! Distances are measured on points translated so that the first sample is
//! the origin; the translation does not change any length.

use crate::bezier::SampledCurve;

/// Length of the chord ending at sample `index` (from `index - 1`).
pub(crate) fn segment_length(curve: &SampledCurve, index: usize) -> f64 {
    let points = curve.points();
    let origin = points[0];
    (points[index] - origin).distance(points[index - 1] - origin)
}

/// Sum of chord lengths from sample 0 up to `upto`, clamped to the last sample.
pub fn cumulative_distance(curve: &SampledCurve, upto: usize) -> f64 {
    if curve.is_empty() {
        return 0.0;
    }
    let upto = upto.min(curve.last_index());
    (1..=upto).map(|i| segment_length(curve, i)).sum()
}

pub fn total_length(curve: &SampledCurve) -> f64 {
    cumulative_distance(curve, curve.last_index())
}

/// First sample index `i >= 1` whose cumulative distance reaches `target`.
///
/// Returns 1 for targets at or before the start of the curve and the last
/// index when the curve is shorter than `target`.
pub fn find_start_index(curve: &SampledCurve, target: f64) -> usize {
    if target <= 0.0 {
        return 1;
    }

    let last = curve.last_index();
    let mut distance = 0.0;
    for i in 1..=last {
        distance += segment_length(curve, i);
        if distance >= target {
            return i;
        }
    }
    last
}
