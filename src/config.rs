use bon::Builder;

/// Straight (non-premultiplied) RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::new(0xff, 0xff, 0xff);
    pub const RED: Color = Color::new(0xff, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Builds a color from unit-range components, clamping each one.
    pub fn from_unit(r: f32, g: f32, b: f32, a: f32) -> Self {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::rgba(to_u8(r), to_u8(g), to_u8(b), to_u8(a))
    }

    pub const fn as_tuple(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Largest point-size increase any content size category may request.
pub const MAXIMUM_FONT_SIZE_DELTA: f64 = 35.0;

/// User preferred text size, from smallest to the largest accessibility step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentSizeCategory {
    ExtraSmall,
    Small,
    Medium,
    #[default]
    Large,
    ExtraLarge,
    ExtraExtraLarge,
    ExtraExtraExtraLarge,
    AccessibilityMedium,
    AccessibilityLarge,
    AccessibilityExtraLarge,
    AccessibilityExtraExtraLarge,
    AccessibilityExtraExtraExtraLarge,
}

impl ContentSizeCategory {
    pub const ALL: [ContentSizeCategory; 12] = [
        ContentSizeCategory::ExtraSmall,
        ContentSizeCategory::Small,
        ContentSizeCategory::Medium,
        ContentSizeCategory::Large,
        ContentSizeCategory::ExtraLarge,
        ContentSizeCategory::ExtraExtraLarge,
        ContentSizeCategory::ExtraExtraExtraLarge,
        ContentSizeCategory::AccessibilityMedium,
        ContentSizeCategory::AccessibilityLarge,
        ContentSizeCategory::AccessibilityExtraLarge,
        ContentSizeCategory::AccessibilityExtraExtraLarge,
        ContentSizeCategory::AccessibilityExtraExtraExtraLarge,
    ];

    /// Point-size delta for this category, following the Title 3 row of the
    /// platform dynamic type table.
    pub const fn font_size_delta(self) -> f64 {
        match self {
            ContentSizeCategory::ExtraSmall => -3.0,
            ContentSizeCategory::Small => -2.0,
            ContentSizeCategory::Medium => -1.0,
            ContentSizeCategory::Large => 0.0,
            ContentSizeCategory::ExtraLarge => 2.0,
            ContentSizeCategory::ExtraExtraLarge => 4.0,
            ContentSizeCategory::ExtraExtraExtraLarge => 6.0,
            ContentSizeCategory::AccessibilityMedium => 11.0,
            ContentSizeCategory::AccessibilityLarge => 17.0,
            ContentSizeCategory::AccessibilityExtraLarge => 23.0,
            ContentSizeCategory::AccessibilityExtraExtraLarge => 29.0,
            ContentSizeCategory::AccessibilityExtraExtraExtraLarge => MAXIMUM_FONT_SIZE_DELTA,
        }
    }
}

// ============================================================================
// RENDERER CONFIGURATION
// ============================================================================

/// Tunables for the curved label renderer
#[derive(Debug, Clone, Builder)]
pub struct DialTextConfig {
    /// Physical pixels per logical unit
    #[builder(default = 1.0)]
    pub device_scale: f64,
    /// Number of parametric steps per arc; the sampled curve holds one more point
    #[builder(default = 1000)]
    pub curve_segments: usize,

    // Arc inset from the surface edges
    #[builder(default = 0.7)]
    pub top_line_height_factor: f64,
    #[builder(default = 0.3)]
    pub bottom_line_height_factor: f64,
    #[builder(default = MAXIMUM_FONT_SIZE_DELTA)]
    pub maximum_font_size_delta: f64,

    // Arc shape, as fractions of the inset text frame
    #[builder(default = 0.05)]
    pub control_point_inset: f64,
    #[builder(default = 1.0 / 1.5)]
    pub arc_bulge: f64,

    // Debug guides
    #[builder(default = false)]
    pub stroke_guides: bool,
    #[builder(default = Color::RED)]
    pub guide_color: Color,
    #[builder(default = 1.0)]
    pub guide_width: f64,
}

impl Default for DialTextConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn content_size_table_is_ordered_and_capped() {
        let deltas: Vec<f64> = ContentSizeCategory::ALL
            .iter()
            .map(|c| c.font_size_delta())
            .collect();
        assert_eq!(deltas.first(), Some(&-3.0));
        assert_eq!(deltas.last(), Some(&MAXIMUM_FONT_SIZE_DELTA));
        assert!(deltas.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ContentSizeCategory::default().font_size_delta(), 0.0);
    }

    #[test_log::test]
    fn builder_defaults_match_default_impl() {
        let config = DialTextConfig::default();
        assert_eq!(config.curve_segments, 1000);
        assert_eq!(config.device_scale, 1.0);
        assert_eq!(config.top_line_height_factor, 0.7);
        assert_eq!(config.bottom_line_height_factor, 0.3);
        assert!(!config.stroke_guides);

        let scaled = DialTextConfig::builder().device_scale(2.0).build();
        assert_eq!(scaled.device_scale, 2.0);
        assert_eq!(scaled.curve_segments, 1000);
    }

    #[test_log::test]
    fn unit_colors_are_clamped() {
        assert_eq!(Color::from_unit(0.54, 0.54, 0.54, 1.0), Color::new(138, 138, 138));
        assert_eq!(Color::from_unit(2.0, -1.0, 0.0, 0.5), Color::rgba(255, 0, 0, 128));
    }
}
