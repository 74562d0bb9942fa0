//! Pixel buffer and drawing context for curved labels.
//!
//! The user space is y-up with the origin at the bottom-left pixel corner,
//! the way bitmap graphics contexts behave; rows in the buffer run top to
//! bottom. Pixels are RGBA, 8 bits per channel, premultiplied alpha.

use std::ops::{Deref, DerefMut};

use log::{debug, trace};
use rusttype::{point, Font, GlyphId};

use crate::config::Color;
use crate::error::{DialTextError, Result};
use crate::geometry::{Point, Rect};
use crate::text::scale_for_point_size;

/// Largest accepted surface side in pixels.
pub const MAX_SURFACE_DIMENSION: usize = 16_384;

// ============================================================================
// TRANSFORMS
// ============================================================================

/// Affine map `x' = a·x + c·y + tx`, `y' = b·x + d·y + ty`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Maps y-up user space onto buffer rows of a surface `height` pixels tall.
    pub fn flip_vertical(height: f64) -> Self {
        Transform {
            d: -1.0,
            ty: height,
            ..Transform::IDENTITY
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }

    /// Moves the local origin to `offset`, in the current local space.
    pub fn translate(&self, offset: Point) -> Self {
        Transform {
            tx: self.a * offset.x + self.c * offset.y + self.tx,
            ty: self.b * offset.x + self.d * offset.y + self.ty,
            ..*self
        }
    }

    /// Rotates the local axes by `angle` radians, counter-clockwise in y-up space.
    pub fn rotate(&self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Transform {
            a: self.a * cos + self.c * sin,
            b: self.b * cos + self.d * sin,
            c: self.c * cos - self.a * sin,
            d: self.d * cos - self.b * sin,
            ..*self
        }
    }
}

// ============================================================================
// GRAPHICS STATE
// ============================================================================

#[derive(Clone)]
struct GraphicsState {
    transform: Transform,
    fill: Color,
    font: Option<(Font<'static>, f32)>,
}

/// Restores the surface's graphics state when dropped.
///
/// Dereferences to the surface, so drawing goes through the guard.
pub struct StateGuard<'a> {
    surface: &'a mut RasterSurface,
    saved: Option<GraphicsState>,
}

impl Deref for StateGuard<'_> {
    type Target = RasterSurface;

    fn deref(&self) -> &RasterSurface {
        self.surface
    }
}

impl DerefMut for StateGuard<'_> {
    fn deref_mut(&mut self) -> &mut RasterSurface {
        self.surface
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.surface.state = saved;
        }
    }
}

// ============================================================================
// SURFACE
// ============================================================================

/// Finished premultiplied RGBA8 image, rows top to bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RasterImage {
    /// Premultiplied RGBA at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// True when no pixel has any coverage.
    pub fn is_blank(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }
}

pub struct RasterSurface {
    width: usize,
    height: usize,
    frame: Vec<u8>,
    state: GraphicsState,
}

impl RasterSurface {
    /// Allocates a transparent surface of `width × height` logical units at
    /// `scale` pixels per unit.
    pub fn new(width: f64, height: f64, scale: f64) -> Result<Self> {
        let valid = width.is_finite()
            && height.is_finite()
            && scale.is_finite()
            && width >= 0.0
            && height >= 0.0
            && scale > 0.0;
        if !valid {
            return Err(DialTextError::InvalidDimensions {
                width,
                height,
                scale,
            });
        }

        let pixel_width = (width * scale) as usize;
        let pixel_height = (height * scale) as usize;
        if pixel_width > MAX_SURFACE_DIMENSION || pixel_height > MAX_SURFACE_DIMENSION {
            return Err(DialTextError::SurfaceTooLarge {
                width: pixel_width,
                height: pixel_height,
                max: MAX_SURFACE_DIMENSION,
            });
        }

        debug!("allocating {pixel_width}x{pixel_height} surface (scale {scale})");
        Ok(Self {
            width: pixel_width,
            height: pixel_height,
            frame: vec![0; pixel_width * pixel_height * 4],
            state: GraphicsState {
                transform: Transform::flip_vertical(pixel_height as f64),
                fill: Color::BLACK,
                font: None,
            },
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The whole surface in user space.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f64, self.height as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn transform(&self) -> Transform {
        self.state.transform
    }

    pub fn fill_color(&self) -> Color {
        self.state.fill
    }

    /// Saves the graphics state; it is restored when the guard drops.
    pub fn save(&mut self) -> StateGuard<'_> {
        let saved = Some(self.state.clone());
        StateGuard {
            surface: self,
            saved,
        }
    }

    pub fn translate(&mut self, offset: Point) {
        self.state.transform = self.state.transform.translate(offset);
    }

    pub fn rotate(&mut self, angle: f64) {
        self.state.transform = self.state.transform.rotate(angle);
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.state.fill = color;
    }

    pub fn set_font(&mut self, font: &Font<'static>, size: f32) {
        self.state.font = Some((font.clone(), size));
    }

    /// Draws glyph `id` of the current font with its baseline origin at the
    /// local origin. Does nothing without a font or for blank glyphs.
    pub fn show_glyph(&mut self, id: u16) {
        let Some((font, size)) = self.state.font.clone() else {
            trace!("no font set, skipping glyph {id}");
            return;
        };

        if !size.is_finite() || size <= 0.0 {
            trace!("font size {size} draws nothing, skipping glyph {id}");
            return;
        }

        let scale = scale_for_point_size(&font, size);
        let glyph = font
            .glyph(GlyphId(id))
            .scaled(scale)
            .positioned(point(0.0, 0.0));
        let Some(bb) = glyph.pixel_bounding_box() else {
            return;
        };

        let transform = self.state.transform;
        let color = self.state.fill;
        glyph.draw(|gx, gy, v| {
            if v > 0.001 {
                // glyph rows grow downward from the baseline, user space grows upward
                let local = Point::new(
                    f64::from(bb.min.x) + f64::from(gx) + 0.5,
                    -(f64::from(bb.min.y) + f64::from(gy) + 0.5),
                );
                self.splat(transform.apply(local), color, v);
            }
        });
    }

    /// Strokes the polyline through `points` with an anti-aliased line
    /// `width` pixels wide.
    pub fn stroke_polyline(&mut self, points: &[Point], width: f64, color: Color) {
        let transform = self.state.transform;
        for pair in points.windows(2) {
            let from = transform.apply(pair[0]);
            let to = transform.apply(pair[1]);
            self.draw_thick_line_aa(from, to, width, color);
        }
    }

    /// The composited image, or `None` for a zero-area surface.
    pub fn into_image(self) -> Option<RasterImage> {
        if self.is_empty() {
            return None;
        }
        Some(RasterImage {
            width: u32::try_from(self.width).ok()?,
            height: u32::try_from(self.height).ok()?,
            data: self.frame,
        })
    }

    // ------------------------------------------------------------------------
    // Pixel primitives, in buffer coordinates (pixel centres at +0.5)
    // ------------------------------------------------------------------------

    /// Source-over blend of `color` at `coverage` into one pixel.
    fn blend_pixel(&mut self, x: i64, y: i64, color: Color, coverage: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let alpha = coverage.clamp(0.0, 1.0) * f32::from(color.a) / 255.0;
        if alpha <= 0.0 {
            return;
        }

        let idx = (y as usize * self.width + x as usize) * 4;
        let src = [
            f32::from(color.r) * alpha,
            f32::from(color.g) * alpha,
            f32::from(color.b) * alpha,
            255.0 * alpha,
        ];
        for (channel, s) in src.iter().enumerate() {
            let dst = f32::from(self.frame[idx + channel]);
            self.frame[idx + channel] = (s + dst * (1.0 - alpha)).round().min(255.0) as u8;
        }
    }

    /// Spreads one coverage sample over the four nearest pixels.
    fn splat(&mut self, at: Point, color: Color, coverage: f32) {
        let x = at.x - 0.5;
        let y = at.y - 0.5;
        let x_floor = x.floor();
        let y_floor = y.floor();
        let x_frac = x - x_floor;
        let y_frac = y - y_floor;
        let (px, py) = (x_floor as i64, y_floor as i64);

        let samples = [
            (px, py, (1.0 - x_frac) * (1.0 - y_frac)),
            (px + 1, py, x_frac * (1.0 - y_frac)),
            (px, py + 1, (1.0 - x_frac) * y_frac),
            (px + 1, py + 1, x_frac * y_frac),
        ];
        for (sx, sy, weight) in samples {
            let alpha = coverage * weight as f32;
            if alpha > 0.001 {
                self.blend_pixel(sx, sy, color, alpha);
            }
        }
    }

    fn draw_thick_line_aa(&mut self, from: Point, to: Point, thickness: f64, color: Color) {
        let reach = thickness.ceil() + 1.0;
        let min_x = (from.x.min(to.x) - reach).floor() as i64;
        let max_x = (from.x.max(to.x) + reach).ceil() as i64;
        let min_y = (from.y.min(to.y) - reach).floor() as i64;
        let max_y = (from.y.max(to.y) + reach).ceil() as i64;

        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let len_sq = dx * dx + dy * dy;
        for y in min_y.max(0)..=max_y.min(self.height as i64 - 1) {
            for x in min_x.max(0)..=max_x.min(self.width as i64 - 1) {
                let centre = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let t = if len_sq > 0.0 {
                    (((centre.x - from.x) * dx + (centre.y - from.y) * dy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let nearest = Point::new(from.x + t * dx, from.y + t * dy);
                let dist = nearest.distance(centre);
                let aa = (1.0 - (dist - thickness / 2.0).clamp(0.0, 1.0)).clamp(0.0, 1.0);
                if aa > 0.01 {
                    self.blend_pixel(x, y, color, aa as f32);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::tests::system_font;

    fn alpha_at(image: &RasterImage, x: u32, y: u32) -> u8 {
        image.pixel(x, y).unwrap()[3]
    }

    #[test_log::test]
    fn dimensions_follow_the_device_scale() {
        let surface = RasterSurface::new(100.0, 50.0, 2.0).unwrap();
        assert_eq!((surface.width(), surface.height()), (200, 100));
        assert_eq!(surface.bounds(), Rect::new(0.0, 0.0, 200.0, 100.0));
    }

    #[test_log::test]
    fn zero_area_surface_has_no_image() {
        let surface = RasterSurface::new(0.0, 120.0, 3.0).unwrap();
        assert!(surface.is_empty());
        assert!(surface.into_image().is_none());
    }

    #[test_log::test]
    fn invalid_dimensions_are_rejected() {
        assert!(matches!(
            RasterSurface::new(-1.0, 10.0, 1.0),
            Err(DialTextError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            RasterSurface::new(10.0, f64::NAN, 1.0),
            Err(DialTextError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            RasterSurface::new(10.0, 10.0, 0.0),
            Err(DialTextError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            RasterSurface::new(1.0e6, 10.0, 1.0),
            Err(DialTextError::SurfaceTooLarge { .. })
        ));
    }

    #[test_log::test]
    fn transform_composes_translate_then_rotate() {
        let t = Transform::IDENTITY
            .translate(Point::new(10.0, 20.0))
            .rotate(std::f64::consts::FRAC_PI_2);
        let p = t.apply(Point::new(1.0, 0.0));
        assert!((p.x - 10.0).abs() < 1e-12 && (p.y - 21.0).abs() < 1e-12, "{p:?}");

        let flip = Transform::flip_vertical(100.0);
        assert_eq!(flip.apply(Point::new(3.0, 0.0)), Point::new(3.0, 100.0));
        assert_eq!(flip.apply(Point::new(3.0, 100.0)), Point::new(3.0, 0.0));
    }

    #[test_log::test]
    fn guard_restores_state_on_drop() {
        let mut surface = RasterSurface::new(20.0, 20.0, 1.0).unwrap();
        let before = surface.transform();
        {
            let mut guard = surface.save();
            guard.translate(Point::new(5.0, 5.0));
            guard.rotate(1.0);
            guard.set_fill_color(Color::RED);
            assert_ne!(guard.transform(), before);
            assert_eq!(guard.fill_color(), Color::RED);
        }
        assert_eq!(surface.transform(), before);
        assert_eq!(surface.fill_color(), Color::BLACK);
    }

    #[test_log::test]
    fn nested_guards_unwind_in_order() {
        let mut surface = RasterSurface::new(20.0, 20.0, 1.0).unwrap();
        let base = surface.transform();
        let mut outer = surface.save();
        outer.translate(Point::new(1.0, 0.0));
        let shifted = outer.transform();
        {
            let mut inner = outer.save();
            inner.rotate(0.5);
        }
        assert_eq!(outer.transform(), shifted);
        drop(outer);
        assert_eq!(surface.transform(), base);
    }

    #[test_log::test]
    fn user_space_is_y_up() {
        let mut surface = RasterSurface::new(40.0, 40.0, 1.0).unwrap();
        surface.stroke_polyline(
            &[Point::new(5.0, 30.5), Point::new(35.0, 30.5)],
            1.0,
            Color::WHITE,
        );
        let image = surface.into_image().unwrap();
        // y = 30.5 up from the bottom lands in row 9 from the top
        assert_eq!(alpha_at(&image, 20, 9), 255);
        assert_eq!(alpha_at(&image, 20, 30), 0);
        assert_eq!(image.pixel(20, 9), Some([255, 255, 255, 255]));
        assert_eq!(image.pixel(40, 9), None);
        assert_eq!(image.pixel(0, 40), None);
    }

    #[test_log::test]
    fn blending_is_premultiplied() {
        let mut surface = RasterSurface::new(10.0, 10.0, 1.0).unwrap();
        surface.stroke_polyline(
            &[Point::new(0.0, 5.5), Point::new(10.0, 5.5)],
            1.0,
            Color::rgba(200, 100, 0, 128),
        );
        let image = surface.into_image().unwrap();
        let [r, g, b, a] = image.pixel(5, 4).unwrap();
        assert_eq!(a, 128);
        assert!(r <= a && g <= a && b <= a);
        assert_eq!(r, 100);
        assert_eq!(image.pixel(5, 0), Some([0, 0, 0, 0]));
    }

    #[test_log::test]
    fn glyph_without_font_draws_nothing() {
        let mut surface = RasterSurface::new(10.0, 10.0, 1.0).unwrap();
        surface.show_glyph(36);
        assert!(surface.into_image().unwrap().is_blank());
    }

    #[test_log::test]
    fn unusable_font_sizes_draw_nothing() {
        let Some(data) = system_font() else {
            return;
        };
        let font = Font::try_from_vec(data).unwrap();
        let id = font.glyph('H').id().0;
        let mut surface = RasterSurface::new(64.0, 64.0, 1.0).unwrap();
        for size in [-40.0, 0.0, f32::NAN, f32::INFINITY] {
            let mut guard = surface.save();
            guard.translate(Point::new(8.0, 16.0));
            guard.set_font(&font, size);
            guard.show_glyph(id);
        }
        assert!(surface.into_image().unwrap().is_blank());
    }

    #[test_log::test]
    fn glyph_ink_sits_above_the_baseline() {
        let Some(data) = system_font() else {
            log::warn!("no system font found, skipping glyph raster check");
            return;
        };
        let font = Font::try_from_vec(data).unwrap();
        let mut surface = RasterSurface::new(64.0, 64.0, 1.0).unwrap();
        {
            let mut guard = surface.save();
            guard.translate(Point::new(8.0, 16.0));
            guard.set_font(&font, 32.0);
            guard.set_fill_color(Color::BLACK);
            let id = font.glyph('H').id().0;
            guard.show_glyph(id);
        }
        let image = surface.into_image().unwrap();
        assert!(!image.is_blank());
        // baseline at y = 16 up is row 48 down; nothing below it
        for y in 50..64 {
            for x in 0..64 {
                assert_eq!(alpha_at(&image, x, y), 0, "ink below baseline at {x},{y}");
            }
        }
    }

    #[test_log::test]
    fn rotated_glyph_extends_along_the_tangent() {
        let Some(data) = system_font() else {
            log::warn!("no system font found, skipping rotated glyph check");
            return;
        };
        let font = Font::try_from_vec(data).unwrap();
        let mut surface = RasterSurface::new(64.0, 64.0, 1.0).unwrap();
        {
            let mut guard = surface.save();
            guard.translate(Point::new(40.0, 8.0));
            guard.rotate(std::f64::consts::FRAC_PI_2);
            guard.set_font(&font, 32.0);
            guard.show_glyph(font.glyph('H').id().0);
        }
        let image = surface.into_image().unwrap();
        // turned a quarter counter-clockwise, the glyph rises from the anchor
        // and its ink lies to the left of x = 40
        let mut inked = 0;
        for y in 0..64 {
            for x in 0..64 {
                if alpha_at(&image, x, y) > 0 {
                    inked += 1;
                    assert!(x <= 42, "ink right of the baseline at {x},{y}");
                }
            }
        }
        assert!(inked > 0);
    }
}
