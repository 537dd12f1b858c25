//! Request parameters for a fractal render.

use crate::{Complex, ParameterError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Escape-time fractal family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FractalKind {
    /// z₀ = 0, c = pixel
    Mandelbrot,
    /// z₀ = pixel, c = fixed constant
    Julia,
}

impl FractalKind {
    pub const ALL: [FractalKind; 2] = [FractalKind::Mandelbrot, FractalKind::Julia];

    /// Stable identifier, also used as the cache namespace prefix.
    pub fn id(&self) -> &'static str {
        match self {
            FractalKind::Mandelbrot => "mandelbrot",
            FractalKind::Julia => "julia",
        }
    }
}

impl fmt::Display for FractalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FractalKind {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FractalKind::ALL
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParameterError::UnsupportedFractal(s.to_string()))
    }
}

/// Everything needed to render one viewport.
///
/// Constructed once per request and never mutated; the `with_*` helpers
/// consume and return a new value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FractalParameters {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    pub max_iterations: u32,
    /// Continuous escape values instead of integer iteration counts
    pub smooth: bool,
    /// Only interpreted by the color-mapping stage
    pub color_scheme: String,
    /// Fixed constant for Julia renders
    #[serde(default)]
    pub julia: Option<Complex>,
}

impl FractalParameters {
    pub const DEFAULT_COLOR_SCHEME: &'static str = "classic";

    /// Generic defaults: the square [-2, 2]², 800x600, 100 iterations, smooth.
    pub fn defaults() -> Self {
        Self {
            x_min: -2.0,
            x_max: 2.0,
            y_min: -2.0,
            y_max: 2.0,
            width: 800,
            height: 600,
            max_iterations: 100,
            smooth: true,
            color_scheme: Self::DEFAULT_COLOR_SCHEME.to_string(),
            julia: None,
        }
    }

    /// Defaults framing the whole Mandelbrot set.
    pub fn mandelbrot_defaults() -> Self {
        Self::defaults().with_bounds(-2.5, 1.0, -1.25, 1.25)
    }

    /// Defaults for the "dragon" Julia set, c = -0.7 + 0.27015i.
    pub fn julia_defaults() -> Self {
        Self::defaults().with_julia(Complex::new(-0.7, 0.27015))
    }

    pub fn with_bounds(self, x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
            ..self
        }
    }

    pub fn with_size(self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..self
        }
    }

    pub fn with_max_iterations(self, max_iterations: u32) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }

    pub fn with_smooth(self, smooth: bool) -> Self {
        Self { smooth, ..self }
    }

    pub fn with_color_scheme(self, color_scheme: impl Into<String>) -> Self {
        Self {
            color_scheme: color_scheme.into(),
            ..self
        }
    }

    pub fn with_julia(self, c: Complex) -> Self {
        Self {
            julia: Some(c),
            ..self
        }
    }

    /// Set the Julia constant from separately supplied parts.
    ///
    /// Both absent clears the constant; exactly one present is an error.
    pub fn with_julia_parts(
        self,
        c_real: Option<f64>,
        c_imag: Option<f64>,
    ) -> Result<Self, ParameterError> {
        let julia = match (c_real, c_imag) {
            (Some(re), Some(im)) => Some(Complex::new(re, im)),
            (None, None) => None,
            _ => return Err(ParameterError::MissingJuliaConstant),
        };
        Ok(Self { julia, ..self })
    }

    /// Reject parameters that cannot be rendered as `kind`.
    pub fn validate(&self, kind: FractalKind) -> Result<(), ParameterError> {
        if self.width == 0 || self.height == 0 {
            return Err(ParameterError::NonPositiveSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.max_iterations == 0 {
            return Err(ParameterError::NonPositiveIterations);
        }
        let bounds = [self.x_min, self.x_max, self.y_min, self.y_max];
        if bounds.iter().any(|v| !v.is_finite()) {
            return Err(ParameterError::NonFiniteBounds);
        }
        if self.x_min >= self.x_max {
            return Err(ParameterError::InvertedXBounds {
                x_min: self.x_min,
                x_max: self.x_max,
            });
        }
        if self.y_min >= self.y_max {
            return Err(ParameterError::InvertedYBounds {
                y_min: self.y_min,
                y_max: self.y_max,
            });
        }
        if kind == FractalKind::Julia {
            let c = self.julia.ok_or(ParameterError::MissingJuliaConstant)?;
            if !c.re.is_finite() || !c.im.is_finite() {
                return Err(ParameterError::NonFiniteJuliaConstant);
            }
        }
        Ok(())
    }

    /// Total number of pixels in the requested image.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}
