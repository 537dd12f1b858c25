//! Quantized cache keys.

use crate::escape_time::{EscapeSettings, Formula};
use fractaltile_core::{FractalKind, TileBounds};
use std::fmt;

/// Scale applied before rounding plane coordinates into a key. Values closer
/// than `0.5 / KEY_SCALE` share a key.
pub const KEY_SCALE: f64 = 10_000.0;

/// Quantize a plane coordinate for use in a key.
///
/// Saturates for values beyond `i64` range; [`is_keyable`] keeps such tiles
/// out of the store.
#[inline]
pub fn quantize(value: f64) -> i64 {
    (value * KEY_SCALE).round() as i64
}

/// Whether neighbouring tiles of this size get distinct keys.
///
/// Tiles narrower than one key step in either direction round onto the keys
/// of their neighbours, and coordinates past `MAX_KEYED_COORD` no longer
/// quantize exactly. Both must bypass the store.
#[inline]
pub fn is_keyable(bounds: &TileBounds) -> bool {
    let min_span = 1.0 / KEY_SCALE;
    let in_range = [bounds.x_min, bounds.x_max, bounds.y_min, bounds.y_max]
        .iter()
        .all(|v| v.abs() < MAX_KEYED_COORD);
    in_range && bounds.x_max - bounds.x_min >= min_span && bounds.y_max - bounds.y_min >= min_span
}

/// Largest coordinate whose scaled value is still an exact integer in `f64`.
const MAX_KEYED_COORD: f64 = (1u64 << 53) as f64 / KEY_SCALE;

/// Identity of a cached tile.
///
/// Two tiles with equal keys are treated as interchangeable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: FractalKind,
    pub max_iterations: u32,
    pub smooth: bool,
    pub x_min: i64,
    pub y_min: i64,
    pub x_max: i64,
    pub y_max: i64,
    /// Quantized Julia constant; `None` for Mandelbrot
    pub julia: Option<(i64, i64)>,
}

impl CacheKey {
    pub fn new(settings: &EscapeSettings, bounds: &TileBounds) -> Self {
        let julia = match settings.formula {
            Formula::Mandelbrot => None,
            Formula::Julia { c } => Some((quantize(c.re), quantize(c.im))),
        };

        Self {
            kind: settings.formula.kind(),
            max_iterations: settings.max_iterations,
            smooth: settings.smooth,
            x_min: quantize(bounds.x_min),
            y_min: quantize(bounds.y_min),
            x_max: quantize(bounds.x_max),
            y_max: quantize(bounds.y_max),
            julia,
        }
    }

    /// Namespace of the external store, e.g. `mandelbrot_tile`.
    pub fn namespace(&self) -> String {
        format!("{}_tile", self.kind.id())
    }
}

/// Stable string form for byte-oriented stores:
/// `mandelbrot_tile:100_true_-20000_-15000_-12500_-11250`.
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_tile:{}_{}_{}_{}_{}_{}",
            self.kind.id(),
            self.max_iterations,
            self.smooth,
            self.x_min,
            self.y_min,
            self.x_max,
            self.y_max
        )?;
        if let Some((re, im)) = self.julia {
            write!(f, "_{re}_{im}")?;
        }
        Ok(())
    }
}
