//! Curved label rendering for the payment dial.
//!
//! The dial face carries two decorative labels: one arching across the top
//! and one across the bottom. Each label is laid out glyph by glyph along a
//! cubic Bézier arc, every glyph rotated to the arc's tangent, and the result
//! is composited into a premultiplied RGBA image.
//!
//! ```no_run
//! use payment_dial::{render_rounded_text, DialTextConfig, FontBook, Label, Size};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let book = FontBook::new("Sans", std::fs::read("Sans.ttf")?)?;
//! let top = Label::new("ACCOUNT BALANCE").font("Sans", 45.0);
//! let bottom = Label::new("SHOW ME THE MONEY").font("Sans", 45.0);
//! let config = DialTextConfig::builder().device_scale(2.0).build();
//! let image = render_rounded_text(&top, &bottom, Size::new(300.0, 300.0), &book, &config)?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// MODULES
// ============================================================================

pub mod arc_length;
pub mod bezier;
pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod renderer;
pub mod surface;
pub mod text;

// ============================================================================
// PUBLIC API
// ============================================================================

pub use arc_length::{cumulative_distance, find_start_index, total_length};
pub use bezier::{sample, sample_with, ControlPoints, SampledCurve};
pub use config::{Color, ContentSizeCategory, DialTextConfig, MAXIMUM_FONT_SIZE_DELTA};
pub use error::{DialTextError, Result};
pub use geometry::{Point, Rect, Size};
pub use layout::{layout, start_distance, start_index, GlyphPlacement};
pub use renderer::{render_rounded_text, RenderContext};
pub use surface::{RasterImage, RasterSurface, StateGuard, Transform};
pub use text::{
    Alignment, FontBook, FontSpec, Label, ResolvedStyle, StyledGlyph, StyledTextRun,
    TextAttributes, TextStyleResolver,
};
