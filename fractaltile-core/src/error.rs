//! Request parameter errors.

use thiserror::Error;

/// A rejected request. Raised before any computation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("image size must be positive, got {width}x{height}")]
    NonPositiveSize { width: u32, height: u32 },

    #[error("max iterations must be positive")]
    NonPositiveIterations,

    #[error("viewport bounds must be finite")]
    NonFiniteBounds,

    #[error("x_min ({x_min}) must be less than x_max ({x_max})")]
    InvertedXBounds { x_min: f64, x_max: f64 },

    #[error("y_min ({y_min}) must be less than y_max ({y_max})")]
    InvertedYBounds { y_min: f64, y_max: f64 },

    #[error("julia rendering requires both c_real and c_imag")]
    MissingJuliaConstant,

    #[error("julia constant must be finite")]
    NonFiniteJuliaConstant,

    #[error("unsupported fractal type: {0}")]
    UnsupportedFractal(String),
}

/// The output grid for a request could not be allocated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot allocate a {width}x{height} grid")]
pub struct GridAllocationError {
    pub width: u32,
    pub height: u32,
}
