//! Styled text runs and font resolution.
//!
//! Labels arrive as a string plus uniform attributes. A [`TextStyleResolver`]
//! fills in whatever the attributes leave out, and [`StyledTextRun::shape`]
//! turns the resolved label into one [`StyledGlyph`] per character.

use std::collections::HashMap;

use log::{debug, warn};
use rusttype::{Font, Scale};

use crate::config::{Color, ContentSizeCategory, MAXIMUM_FONT_SIZE_DELTA};
use crate::error::{DialTextError, Result};

/// Point size used when a label carries no font.
pub const DEFAULT_FONT_SIZE: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// A font family name and point size
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

/// Attributes applied uniformly to a label; unset values fall back at resolve time
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextAttributes {
    pub font: Option<FontSpec>,
    pub color: Option<Color>,
    pub kern: f32,
    pub alignment: Alignment,
}

/// A string with its attributes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Label {
    pub text: String,
    pub attributes: TextAttributes,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attributes: TextAttributes::default(),
        }
    }

    pub fn font(mut self, family: impl Into<String>, size: f32) -> Self {
        self.attributes.font = Some(FontSpec::new(family, size));
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.attributes.color = Some(color);
        self
    }

    pub fn kern(mut self, kern: f32) -> Self {
        self.attributes.kern = kern;
        self
    }

    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.attributes.alignment = alignment;
        self
    }
}

/// Attributes after fallback substitution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub font: FontSpec,
    pub color: Color,
    pub kern: f32,
    pub alignment: Alignment,
}

// ============================================================================
// STYLE RESOLUTION
// ============================================================================

/// Supplies fonts and user text-size preferences to the renderer.
pub trait TextStyleResolver {
    /// The face registered for `family`, if any.
    fn face(&self, family: &str) -> Option<&Font<'static>>;

    /// Font used when a label does not name one.
    fn default_font(&self) -> FontSpec;

    fn has_face(&self, family: &str) -> bool {
        self.face(family).is_some()
    }

    /// Signed point-size adjustment requested by the user's text size setting.
    fn font_size_delta(&self) -> f64 {
        0.0
    }

    /// Fills in missing attributes:
    ///
    /// - no font: [`TextStyleResolver::default_font`]
    /// - non-finite size: the default font's size
    /// - the size delta is applied only when the family has a face
    /// - sizes never go below zero
    /// - no color: opaque black
    fn resolve(&self, attributes: &TextAttributes) -> ResolvedStyle {
        let mut font = attributes
            .font
            .clone()
            .unwrap_or_else(|| self.default_font());
        if !font.size.is_finite() {
            debug!("unusable size {} for {:?}", font.size, font.family);
            font.size = self.default_font().size;
        }
        if self.has_face(&font.family) {
            font.size += self.font_size_delta() as f32;
        } else {
            debug!("no face for {:?}, keeping {}pt", font.family, font.size);
        }
        font.size = font.size.max(0.0);

        ResolvedStyle {
            font,
            color: attributes.color.unwrap_or(Color::BLACK),
            kern: attributes.kern,
            alignment: attributes.alignment,
        }
    }

    /// The face for `family`, falling back to the default family.
    fn face_or_default(&self, family: &str) -> Option<&Font<'static>> {
        self.face(family).or_else(|| {
            let fallback = self.default_font().family;
            debug!("font family {family:?} not found, using {fallback:?}");
            self.face(&fallback)
        })
    }
}

/// Named `rusttype` faces plus the active text-size preference
pub struct FontBook {
    faces: HashMap<String, Font<'static>>,
    default_family: String,
    default_size: f32,
    size_delta: f64,
}

impl FontBook {
    /// Creates a book whose default family is backed by `data`.
    pub fn new(default_family: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let default_family = default_family.into();
        let mut book = Self {
            faces: HashMap::new(),
            default_family: default_family.clone(),
            default_size: DEFAULT_FONT_SIZE,
            size_delta: 0.0,
        };
        book.add_face(default_family, data)?;
        Ok(book)
    }

    pub fn add_face(&mut self, family: impl Into<String>, data: Vec<u8>) -> Result<()> {
        let family = family.into();
        let font = Font::try_from_vec(data).ok_or_else(|| DialTextError::FontParse(family.clone()))?;
        debug!("registered face {family:?}");
        self.faces.insert(family, font);
        Ok(())
    }

    pub fn with_content_size(self, category: ContentSizeCategory) -> Self {
        self.with_font_size_delta(category.font_size_delta())
    }

    /// Sets a raw size delta, capped at the largest accessibility step.
    pub fn with_font_size_delta(mut self, delta: f64) -> Self {
        self.size_delta = delta.min(MAXIMUM_FONT_SIZE_DELTA);
        self
    }

    pub fn with_default_size(mut self, size: f32) -> Self {
        self.default_size = size;
        self
    }
}

impl TextStyleResolver for FontBook {
    fn face(&self, family: &str) -> Option<&Font<'static>> {
        self.faces.get(family)
    }

    fn default_font(&self) -> FontSpec {
        FontSpec::new(self.default_family.clone(), self.default_size)
    }

    fn font_size_delta(&self) -> f64 {
        self.size_delta
    }
}

/// `rusttype` scales by pixel height (ascent to descent); point sizes are em
/// sizes, so convert through the face's units per em.
pub fn scale_for_point_size(font: &Font<'_>, point_size: f32) -> Scale {
    let v_metrics = font.v_metrics_unscaled();
    let units_per_em = f32::from(font.units_per_em());
    let height = v_metrics.ascent - v_metrics.descent;
    if units_per_em <= 0.0 || height <= 0.0 {
        return Scale::uniform(point_size);
    }
    Scale::uniform(point_size * height / units_per_em)
}

// ============================================================================
// STYLED RUNS
// ============================================================================

/// One glyph with its metrics and style
#[derive(Debug, Clone, PartialEq)]
pub struct StyledGlyph {
    pub id: u16,
    /// Horizontal advance at `font.size`
    pub advance: f32,
    pub kern: f32,
    pub font: FontSpec,
    pub color: Color,
}

impl StyledGlyph {
    /// Distance this glyph occupies along the curve.
    pub fn span_width(&self) -> f64 {
        f64::from(self.advance) + f64::from(self.kern)
    }
}

/// A single-paragraph line of glyphs
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyledTextRun {
    glyphs: Vec<StyledGlyph>,
    alignment: Alignment,
}

impl StyledTextRun {
    pub fn new(glyphs: Vec<StyledGlyph>, alignment: Alignment) -> Self {
        Self { glyphs, alignment }
    }

    /// Maps each character of `text` to a glyph of the resolved face.
    ///
    /// Yields an empty run when neither the requested nor the default family
    /// has a face.
    pub fn shape(text: &str, style: &ResolvedStyle, resolver: &dyn TextStyleResolver) -> Self {
        let Some(face) = resolver.face_or_default(&style.font.family) else {
            warn!("no face available to shape {text:?}");
            return Self::new(Vec::new(), style.alignment);
        };

        let scale = scale_for_point_size(face, style.font.size);
        let glyphs = text
            .chars()
            .map(|c| {
                let glyph = face.glyph(c).scaled(scale);
                StyledGlyph {
                    id: glyph.id().0,
                    advance: glyph.h_metrics().advance_width,
                    kern: style.kern,
                    font: style.font.clone(),
                    color: style.color,
                }
            })
            .collect();

        Self::new(glyphs, style.alignment)
    }

    pub fn glyphs(&self) -> &[StyledGlyph] {
        &self.glyphs
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Sum of every glyph's advance plus kern.
    pub fn width(&self) -> f64 {
        self.glyphs.iter().map(StyledGlyph::span_width).sum()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Resolver without real faces; `known` families behave as if loaded.
    pub(crate) struct StubResolver {
        pub known: Vec<&'static str>,
        pub delta: f64,
    }

    impl TextStyleResolver for StubResolver {
        fn face(&self, _family: &str) -> Option<&Font<'static>> {
            None
        }

        fn has_face(&self, family: &str) -> bool {
            self.known.contains(&family)
        }

        fn default_font(&self) -> FontSpec {
            FontSpec::new("System", DEFAULT_FONT_SIZE)
        }

        fn font_size_delta(&self) -> f64 {
            self.delta
        }
    }

    /// Any scalable font installed on the machine running the tests.
    pub(crate) fn system_font() -> Option<Vec<u8>> {
        const CANDIDATES: [&str; 7] = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
        ];
        CANDIDATES
            .iter()
            .filter_map(|path| std::fs::read(path).ok())
            .find(|data| Font::try_from_vec(data.clone()).is_some())
    }

    pub(crate) fn glyph(advance: f32, kern: f32) -> StyledGlyph {
        StyledGlyph {
            id: 1,
            advance,
            kern,
            font: FontSpec::new("System", 12.0),
            color: Color::BLACK,
        }
    }

    #[test_log::test]
    fn missing_attributes_fall_back() {
        let resolver = StubResolver {
            known: vec![],
            delta: 4.0,
        };
        let style = resolver.resolve(&TextAttributes::default());
        assert_eq!(style.font, FontSpec::new("System", 12.0));
        assert_eq!(style.color, Color::BLACK);
        assert_eq!(style.alignment, Alignment::Left);
    }

    #[test_log::test]
    fn size_delta_applies_to_known_families_only() {
        let resolver = StubResolver {
            known: vec!["Avenir-Heavy", "System"],
            delta: 6.0,
        };
        let label = Label::new("ACCOUNT BALANCE")
            .font("Avenir-Heavy", 45.0)
            .color(Color::new(138, 138, 138))
            .kern(1.5)
            .alignment(Alignment::Center);
        let style = resolver.resolve(&label.attributes);
        assert_eq!(style.font.size, 51.0);
        assert_eq!(style.kern, 1.5);
        assert_eq!(style.alignment, Alignment::Center);

        let unknown = resolver.resolve(&Label::new("x").font("Missing", 20.0).attributes);
        assert_eq!(unknown.font.size, 20.0);

        let system = resolver.resolve(&TextAttributes::default());
        assert_eq!(system.font.size, 18.0);
    }

    #[test_log::test]
    fn negative_delta_never_produces_negative_sizes() {
        let resolver = StubResolver {
            known: vec!["Tiny"],
            delta: -3.0,
        };
        let style = resolver.resolve(&Label::new("a").font("Tiny", 2.0).attributes);
        assert_eq!(style.font.size, 0.0);
    }

    #[test_log::test]
    fn unknown_families_are_clamped_too() {
        let resolver = StubResolver {
            known: vec!["System"],
            delta: 4.0,
        };
        let negative = resolver.resolve(&Label::new("a").font("Missing", -40.0).attributes);
        assert_eq!(negative.font.size, 0.0);

        // non-finite sizes take the default size before the delta
        let nan = resolver.resolve(&Label::new("a").font("System", f32::NAN).attributes);
        assert_eq!(nan.font.size, DEFAULT_FONT_SIZE + 4.0);
        let inf = resolver.resolve(&Label::new("a").font("Missing", f32::INFINITY).attributes);
        assert_eq!(inf.font.size, DEFAULT_FONT_SIZE);
    }

    #[test_log::test]
    fn shaping_without_faces_is_empty() {
        let resolver = StubResolver {
            known: vec![],
            delta: 0.0,
        };
        let style = resolver.resolve(&TextAttributes::default());
        let run = StyledTextRun::shape("HELLO", &style, &resolver);
        assert!(run.is_empty());
        assert_eq!(run.width(), 0.0);
    }

    #[test_log::test]
    fn run_width_includes_kern() {
        let run = StyledTextRun::new(
            vec![glyph(10.0, 1.5), glyph(8.0, 1.5), glyph(4.0, -1.0)],
            Alignment::Right,
        );
        assert_eq!(run.len(), 3);
        assert!((run.width() - 24.0).abs() < 1e-9);
        assert_eq!(run.alignment(), Alignment::Right);
    }

    #[test_log::test]
    fn shaping_uses_face_advances() {
        let Some(data) = system_font() else {
            log::warn!("no system font found, skipping shaping check");
            return;
        };
        let book = FontBook::new("Sans", data)
            .unwrap()
            .with_content_size(ContentSizeCategory::ExtraLarge);
        let label = Label::new("MM i").font("Sans", 20.0).kern(1.5);
        let style = book.resolve(&label.attributes);
        assert_eq!(style.font.size, 22.0);

        let run = StyledTextRun::shape(&label.text, &style, &book);
        assert_eq!(run.len(), 4);
        let glyphs = run.glyphs();
        assert_eq!(glyphs[0], glyphs[1]);
        assert!(glyphs[0].advance > glyphs[3].advance);
        assert!(glyphs.iter().all(|g| g.kern == 1.5 && g.advance > 0.0));
        assert!(glyphs[0].advance < 22.0 * 1.5);

        // unknown families shape with the default face at their own size
        let fallback = book.resolve(&Label::new("MM").font("Nope", 20.0).attributes);
        let run = StyledTextRun::shape("MM", &fallback, &book);
        assert_eq!(run.len(), 2);
        assert_eq!(run.glyphs()[0].font.family, "Nope");
    }

    #[test_log::test]
    fn size_delta_is_capped() {
        let Some(data) = system_font() else {
            return;
        };
        let book = FontBook::new("Sans", data).unwrap().with_font_size_delta(80.0);
        assert_eq!(book.font_size_delta(), MAXIMUM_FONT_SIZE_DELTA);
        let book = book.with_font_size_delta(-3.0);
        assert_eq!(book.font_size_delta(), -3.0);
    }

    #[test_log::test]
    fn font_book_rejects_invalid_data() {
        let err = FontBook::new("Broken", vec![0, 1, 2, 3]).err();
        assert!(matches!(err, Some(DialTextError::FontParse(family)) if family == "Broken"));
    }
}
