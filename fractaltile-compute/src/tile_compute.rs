//! Computes the escape values of one tile.

use crate::error::ComputeError;
use crate::escape_time::EscapeSettings;
use fractaltile_core::{TileBounds, TileGrid, TILE_SIZE};

/// Produces the value grid for a tile.
///
/// Implementations must be pure in `(settings, bounds)`: the cache stores
/// whatever they return under a key derived from those two values alone.
pub trait TileComputer: Send + Sync {
    fn compute(
        &self,
        settings: &EscapeSettings,
        bounds: &TileBounds,
    ) -> Result<TileGrid, ComputeError>;
}

/// Escape-time iteration over the full `TILE_SIZE`² pixel block.
#[derive(Clone, Copy, Debug, Default)]
pub struct EscapeTimeComputer;

impl TileComputer for EscapeTimeComputer {
    fn compute(
        &self,
        settings: &EscapeSettings,
        bounds: &TileBounds,
    ) -> Result<TileGrid, ComputeError> {
        compute_tile(settings, bounds)
    }
}

/// Evaluate every pixel of a tile.
///
/// Edge tiles are computed at full size too; the assembler drops the cells
/// that fall outside the image.
pub fn compute_tile(
    settings: &EscapeSettings,
    bounds: &TileBounds,
) -> Result<TileGrid, ComputeError> {
    let grid = TileGrid::from_fn(TILE_SIZE, TILE_SIZE, |x, y| {
        settings.evaluate(bounds.point_at(x, y))
    });

    if let Some(index) = grid.values().iter().position(|v| !v.is_finite()) {
        let index = index as u32;
        return Err(ComputeError::NonFinite {
            x: index % TILE_SIZE,
            y: index / TILE_SIZE,
        });
    }

    Ok(grid)
}
