use thiserror::Error;

/// Errors that prevent a label image from being produced at all
#[derive(Error, Debug)]
pub enum DialTextError {
    #[error("invalid surface dimensions {width}x{height} at scale {scale}")]
    InvalidDimensions { width: f64, height: f64, scale: f64 },

    #[error("surface of {width}x{height} pixels exceeds the {max} pixel limit per side")]
    SurfaceTooLarge {
        width: usize,
        height: usize,
        max: usize,
    },

    #[error("failed to parse font data for family {0:?}")]
    FontParse(String),
}

pub type Result<T> = std::result::Result<T, DialTextError>;
