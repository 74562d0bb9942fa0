//! Placement of a styled run along a sampled curve.
//!
//! Each glyph consumes curve samples until the chord length walked exceeds
//! its advance plus kern. It is anchored at the sample just before its span
//! and rotated to the tangent near the middle of the span.

use log::{debug, trace};

use crate::arc_length::{find_start_index, segment_length, total_length};
use crate::bezier::SampledCurve;
use crate::geometry::Point;
use crate::text::{Alignment, StyledTextRun};

/// Where and at what angle one glyph is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPlacement {
    /// Index into the run's glyphs
    pub glyph_index: usize,
    /// Cursor sample where the glyph's span begins
    pub start_index: usize,
    /// Sample where the span was satisfied; the next glyph starts here
    pub end_index: usize,
    pub anchor: Point,
    /// Tangent direction in radians
    pub angle: f64,
}

/// Distance from the curve start at which the text begins.
pub fn start_distance(run: &StyledTextRun, curve: &SampledCurve) -> f64 {
    match run.alignment() {
        Alignment::Left => 0.0,
        Alignment::Right => total_length(curve) - run.width(),
        Alignment::Center => (total_length(curve) - run.width()) * 0.5,
    }
}

/// Sample index at which the first glyph's span begins.
pub fn start_index(run: &StyledTextRun, curve: &SampledCurve) -> usize {
    match run.alignment() {
        Alignment::Left => 1,
        Alignment::Center | Alignment::Right => {
            find_start_index(curve, start_distance(run, curve))
        }
    }
}

/// Tangent sample for the span `start..end`, biased toward its start and
/// clamped into the curve.
fn tangent_index(start: usize, end: usize, last: usize) -> usize {
    ((end - start) / 2 + start).saturating_sub(1).min(last)
}

/// Places glyphs in order until the curve runs out.
pub fn layout(run: &StyledTextRun, curve: &SampledCurve) -> Vec<GlyphPlacement> {
    let points = curve.points();
    let tangents = curve.tangents();
    let last = curve.last_index();
    let mut placements = Vec::with_capacity(run.len());

    let mut j = start_index(run, curve);
    for (i, glyph) in run.glyphs().iter().enumerate() {
        let width = glyph.span_width();

        let mut distance = 0.0;
        let mut end = None;
        for k in j..=last {
            distance += segment_length(curve, k);
            if width < distance {
                end = Some(k);
                break;
            }
        }

        let Some(k) = end else {
            debug!(
                "curve exhausted at sample {j}: placed {} of {} glyphs",
                placements.len(),
                run.len()
            );
            break;
        };

        let tangent = tangents[tangent_index(j, k, last)];
        let placement = GlyphPlacement {
            glyph_index: i,
            start_index: j,
            end_index: k,
            anchor: points[j - 1],
            angle: tangent.angle(),
        };
        trace!("glyph {i}: {placement:?}");
        placements.push(placement);
        j = k;
    }

    placements
}
