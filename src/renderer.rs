//! Renders the top and bottom dial labels along their arcs.

use log::{debug, trace};

use crate::bezier::{sample_with, ControlPoints};
use crate::config::DialTextConfig;
use crate::error::Result;
use crate::geometry::{Point, Rect, Size};
use crate::layout::layout;
use crate::surface::{RasterImage, RasterSurface};
use crate::text::{Label, StyledTextRun, TextStyleResolver};

/// Values shared by every step of one render call
pub struct RenderContext<'a> {
    pub config: &'a DialTextConfig,
    pub resolver: &'a dyn TextStyleResolver,
    /// Surface bounds in pixels
    pub bounds: Rect,
    pub size_delta: f64,
}

impl<'a> RenderContext<'a> {
    pub fn new(config: &'a DialTextConfig, resolver: &'a dyn TextStyleResolver, bounds: Rect) -> Self {
        Self {
            config,
            resolver,
            bounds,
            size_delta: resolver
                .font_size_delta()
                .min(config.maximum_font_size_delta),
        }
    }

    /// Inset of the top arc. Larger text sizes shrink the extra leading.
    pub fn top_line_height(&self, font_size: f64) -> f64 {
        let factor = self.config.top_line_height_factor;
        let leading = if self.size_delta >= 0.0 {
            factor * (1.0 - self.size_delta / self.config.maximum_font_size_delta)
        } else {
            factor
        };
        font_size * (1.0 + leading)
    }

    /// Inset of the bottom arc. Larger text sizes pull the arc outward.
    pub fn bottom_line_height(&self, font_size: f64) -> f64 {
        let factor = self.config.bottom_line_height_factor;
        let shrink = if self.size_delta >= 0.0 {
            (1.0 - factor) * (self.size_delta / self.config.maximum_font_size_delta)
        } else {
            0.0
        };
        font_size * (1.0 - shrink)
    }

    /// Arc across the upper part of the dial, bulging toward the top edge.
    pub fn top_arc(&self, font_size: f64) -> ControlPoints {
        self.arc(self.bounds.inset(self.top_line_height(font_size)), 1.0)
    }

    /// Arc across the lower part of the dial, bulging toward the bottom edge.
    pub fn bottom_arc(&self, font_size: f64) -> ControlPoints {
        self.arc(self.bounds.inset(self.bottom_line_height(font_size)), -1.0)
    }

    fn arc(&self, frame: Rect, direction: f64) -> ControlPoints {
        let Rect { origin, size } = frame;
        let mid_y = frame.mid_y();
        let control_y = mid_y + direction * size.height * self.config.arc_bulge;
        let inset = self.config.control_point_inset;

        ControlPoints::new(
            Point::new(origin.x, mid_y),
            Point::new(origin.x + size.width * inset, control_y),
            Point::new(origin.x + size.width * (1.0 - inset), control_y),
            Point::new(origin.x + size.width, mid_y),
        )
    }
}

/// Renders `top` and `bottom` along the dial's arcs into a `frame`-sized
/// image at the configured device scale.
///
/// Returns `Ok(None)` when the frame has no area.
pub fn render_rounded_text(
    top: &Label,
    bottom: &Label,
    frame: Size,
    resolver: &dyn TextStyleResolver,
    config: &DialTextConfig,
) -> Result<Option<RasterImage>> {
    let mut surface = RasterSurface::new(frame.width, frame.height, config.device_scale)?;
    if surface.is_empty() {
        debug!("empty frame {frame:?}, nothing to render");
        return Ok(None);
    }

    let context = RenderContext::new(config, resolver, surface.bounds());

    let top_style = resolver.resolve(&top.attributes);
    let top_run = StyledTextRun::shape(&top.text, &top_style, resolver);
    let top_arc = context.top_arc(f64::from(top_style.font.size));
    draw_label(&mut surface, &context, &top_run, &top_arc);

    let bottom_style = resolver.resolve(&bottom.attributes);
    let bottom_run = StyledTextRun::shape(&bottom.text, &bottom_style, resolver);
    let bottom_arc = context.bottom_arc(f64::from(bottom_style.font.size));
    draw_label(&mut surface, &context, &bottom_run, &bottom_arc);

    Ok(surface.into_image())
}

/// Lays `run` out along `arc` and draws every placed glyph.
pub fn draw_label(
    surface: &mut RasterSurface,
    context: &RenderContext<'_>,
    run: &StyledTextRun,
    arc: &ControlPoints,
) {
    let curve = sample_with(arc, context.config.curve_segments);
    if context.config.stroke_guides {
        surface.stroke_polyline(
            curve.points(),
            context.config.guide_width,
            context.config.guide_color,
        );
    }

    let placements = layout(run, &curve);
    debug!(
        "arc {:?} -> {:?}: placed {} of {} glyphs",
        arc.p0,
        arc.p3,
        placements.len(),
        run.len()
    );

    for placement in &placements {
        let glyph = &run.glyphs()[placement.glyph_index];
        let Some(face) = context.resolver.face_or_default(&glyph.font.family) else {
            trace!("no face for glyph {}, skipped", placement.glyph_index);
            continue;
        };

        let mut state = surface.save();
        state.set_fill_color(glyph.color);
        state.set_font(face, glyph.font.size);
        state.translate(placement.anchor);
        state.rotate(placement.angle);
        state.show_glyph(glyph.id);
    }
}
