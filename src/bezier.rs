//! Dense sampling of cubic Bézier arcs.

use crate::geometry::Point;

/// Parametric steps per arc: samples are taken every 0.001 in `t`.
pub const DEFAULT_SEGMENTS: usize = 1000;

/// The four control points of one cubic arc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoints {
    pub p0: Point,
    pub p1: Point,
    pub p2: Point,
    pub p3: Point,
}

impl ControlPoints {
    pub const fn new(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// `B(t) = (1-t)³P0 + 3t(1-t)²P1 + 3(1-t)t²P2 + t³P3`
    pub fn position(&self, t: f64) -> Point {
        let tt = t * t;
        let one_minus_t = 1.0 - t;
        let one_minus_t_sq = one_minus_t * one_minus_t;

        (one_minus_t_sq * one_minus_t) * self.p0
            + (3.0 * t * one_minus_t_sq) * self.p1
            + (3.0 * one_minus_t * tt) * self.p2
            + (tt * t) * self.p3
    }

    /// `B'(t) = 3(1-t)²(P1-P0) + 6(1-t)t(P2-P1) + 3t²(P3-P2)`
    pub fn derivative(&self, t: f64) -> Point {
        let one_minus_t = 1.0 - t;

        (3.0 * one_minus_t * one_minus_t) * (self.p1 - self.p0)
            + (6.0 * one_minus_t * t) * (self.p2 - self.p1)
            + (3.0 * t * t) * (self.p3 - self.p2)
    }
}

/// Positions and tangents of an arc at evenly spaced `t`, index-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledCurve {
    points: Vec<Point>,
    tangents: Vec<Point>,
}

impl SampledCurve {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn tangents(&self) -> &[Point] {
        &self.tangents
    }

    /// Number of samples (segments + 1).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.points.len().saturating_sub(1)
    }
}

/// Samples `points` at the default resolution.
pub fn sample(points: &ControlPoints) -> SampledCurve {
    sample_with(points, DEFAULT_SEGMENTS)
}

/// Samples `t = i / segments` for every `i` in `0..=segments`.
pub fn sample_with(points: &ControlPoints, segments: usize) -> SampledCurve {
    let segments = segments.max(1);
    let mut positions = Vec::with_capacity(segments + 1);
    let mut tangents = Vec::with_capacity(segments + 1);

    for i in 0..=segments {
        let t = i as f64 / segments as f64;
        positions.push(points.position(t));
        tangents.push(points.derivative(t));
    }

    SampledCurve {
        points: positions,
        tangents,
    }
}
