//! Escape-time evaluation of z ← z² + c.
//!
//! Pure and allocation-free: called once per pixel, never logs.

use fractaltile_core::{Complex, FractalKind, FractalParameters, ParameterError, INTERIOR};
use std::f64::consts::LN_2;

/// Escape radius² for integer iteration counts.
pub const DISCRETE_ESCAPE_RADIUS_SQ: f64 = 4.0;

/// Escape radius² for smooth values. The larger radius keeps
/// `ln(ln|z|)` well away from zero at the escape step.
pub const SMOOTH_ESCAPE_RADIUS_SQ: f64 = 256.0;

/// Iterate from `z0` with constant `c`.
///
/// Returns the iteration count at escape (discrete), the renormalized
/// continuous count (smooth), or [`INTERIOR`] if `max_iterations` is reached.
#[inline]
pub fn evaluate(z0: Complex, c: Complex, max_iterations: u32, smooth: bool) -> f64 {
    let escape_radius_sq = if smooth {
        SMOOTH_ESCAPE_RADIUS_SQ
    } else {
        DISCRETE_ESCAPE_RADIUS_SQ
    };

    let mut z = z0;
    let mut iteration = 0;
    while iteration < max_iterations && z.norm_sq() < escape_radius_sq {
        z = z.square().add(&c);
        iteration += 1;
    }

    if iteration == max_iterations {
        return INTERIOR;
    }
    if !smooth {
        return iteration as f64;
    }

    // Loop exit guarantees |z|² >= 256 here, so ln(|z|²)/2 >= ln 16 > 0.
    let log_zn = libm::log(z.norm_sq()) / 2.0;
    let nu = libm::log(log_zn / LN_2) / LN_2;
    let value = iteration as f64 + 1.0 - nu;

    // A start already far outside the radius can push the correction below
    // zero. Non-finite values (overflowed |z|²) pass through for the caller.
    if value.is_finite() {
        value.max(0.0)
    } else {
        value
    }
}

/// Mandelbrot: z₀ = 0, c = pixel.
#[inline]
pub fn mandelbrot(c: Complex, max_iterations: u32, smooth: bool) -> f64 {
    if in_main_cardioid_or_bulb(c) {
        return INTERIOR;
    }
    evaluate(Complex::ZERO, c, max_iterations, smooth)
}

/// Julia: z₀ = pixel, c fixed.
#[inline]
pub fn julia(z0: Complex, c: Complex, max_iterations: u32, smooth: bool) -> f64 {
    evaluate(z0, c, max_iterations, smooth)
}

/// Closed-form membership test for the main cardioid and the period-2 bulb.
/// Points inside never escape, so skipping their iteration does not change
/// the result.
#[inline]
pub fn in_main_cardioid_or_bulb(c: Complex) -> bool {
    let x = c.re;
    let y_sq = c.im * c.im;

    let q = (x - 0.25) * (x - 0.25) + y_sq;
    if q * (q + (x - 0.25)) < 0.25 * y_sq {
        return true;
    }

    (x + 1.0) * (x + 1.0) + y_sq < 0.0625
}

/// Which recurrence a pixel is fed into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Formula {
    Mandelbrot,
    Julia { c: Complex },
}

impl Formula {
    /// Resolve the formula for `kind`. Julia requires the constant.
    pub fn new(kind: FractalKind, julia: Option<Complex>) -> Result<Self, ParameterError> {
        match kind {
            FractalKind::Mandelbrot => Ok(Formula::Mandelbrot),
            FractalKind::Julia => julia
                .map(|c| Formula::Julia { c })
                .ok_or(ParameterError::MissingJuliaConstant),
        }
    }

    pub fn kind(&self) -> FractalKind {
        match self {
            Formula::Mandelbrot => FractalKind::Mandelbrot,
            Formula::Julia { .. } => FractalKind::Julia,
        }
    }

    /// Fixed constant, present for Julia only.
    pub fn julia_constant(&self) -> Option<Complex> {
        match self {
            Formula::Mandelbrot => None,
            Formula::Julia { c } => Some(*c),
        }
    }

    #[inline]
    pub fn evaluate(&self, point: Complex, max_iterations: u32, smooth: bool) -> f64 {
        match self {
            Formula::Mandelbrot => mandelbrot(point, max_iterations, smooth),
            Formula::Julia { c } => julia(point, *c, max_iterations, smooth),
        }
    }
}

/// Everything besides tile geometry that determines a tile's values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EscapeSettings {
    pub formula: Formula,
    pub max_iterations: u32,
    pub smooth: bool,
}

impl EscapeSettings {
    /// Validate `params` for `kind` and extract the evaluation settings.
    pub fn from_params(
        kind: FractalKind,
        params: &FractalParameters,
    ) -> Result<Self, ParameterError> {
        params.validate(kind)?;
        Ok(Self {
            formula: Formula::new(kind, params.julia)?,
            max_iterations: params.max_iterations,
            smooth: params.smooth,
        })
    }

    #[inline]
    pub fn evaluate(&self, point: Complex) -> f64 {
        self.formula.evaluate(point, self.max_iterations, self.smooth)
    }
}
