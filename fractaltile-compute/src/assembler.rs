//! Stitches tile grids into the full image grid.

use crate::error::{ComputeError, TileFailure};
use fractaltile_core::{
    AssembledGrid, FractalParameters, GridAllocationError, TileCoordinate, TileGrid, TileLayout,
    TILE_SIZE,
};
use rayon::prelude::*;
use std::collections::HashSet;

/// Outcome of one tile, as handed to the assembler.
pub type TileResult = (TileCoordinate, Result<TileGrid, ComputeError>);

#[derive(Clone, Debug, PartialEq)]
pub struct Assembly {
    pub grid: AssembledGrid,
    /// Tiles whose region was left at zero, in row-major order
    pub failures: Vec<TileFailure>,
}

/// Allocate the image grid and place every tile result into it.
pub fn assemble(
    results: impl IntoIterator<Item = TileResult>,
    params: &FractalParameters,
) -> Result<Assembly, GridAllocationError> {
    let grid = AssembledGrid::try_new(params.width, params.height)?;
    Ok(assemble_into(grid, results, &TileLayout::new(params)))
}

/// Copy each successful tile to its pixel origin, clamped to the image.
///
/// Results may arrive in any order. Each band of `TILE_SIZE` image rows is
/// written by one rayon task, so no two tasks touch the same slice.
pub fn assemble_into(
    mut grid: AssembledGrid,
    results: impl IntoIterator<Item = TileResult>,
    layout: &TileLayout,
) -> Assembly {
    let mut bands: Vec<Vec<(u32, TileGrid)>> = vec![Vec::new(); layout.tiles_y() as usize];
    let mut seen = HashSet::with_capacity(layout.tile_count());
    let mut failures = Vec::new();

    for (coord, result) in results {
        if !layout.contains(coord) {
            log::warn!(
                "skipping tile {coord:?} outside the {}x{} tile layout",
                layout.tiles_x(),
                layout.tiles_y()
            );
            continue;
        }
        if !seen.insert(coord) {
            log::warn!("skipping duplicate tile {coord:?}");
            continue;
        }
        match result {
            Ok(tile) => bands[coord.tile_y as usize].push((coord.tile_x, tile)),
            Err(error) => {
                log::warn!("tile {coord:?} failed: {error}");
                failures.push(TileFailure { coord, error });
            }
        }
    }
    failures.sort_by_key(|f| (f.coord.tile_y, f.coord.tile_x));

    let width = grid.width() as usize;
    let band_len = width * TILE_SIZE as usize;
    if band_len > 0 {
        grid.values_mut()
            .par_chunks_mut(band_len)
            .zip(bands.par_iter())
            .for_each(|(band, tiles)| {
                for (tile_x, tile) in tiles {
                    copy_tile(band, width, *tile_x, tile);
                }
            });
    }

    Assembly { grid, failures }
}

/// Copy `tile` into a band of full image rows, dropping cells past the edge.
fn copy_tile(band: &mut [f64], width: usize, tile_x: u32, tile: &TileGrid) {
    let origin_x = (tile_x * TILE_SIZE) as usize;
    let cols = (tile.width() as usize).min(width.saturating_sub(origin_x));
    let rows = (tile.height() as usize).min(band.len() / width);

    for y in 0..rows {
        let dst = y * width + origin_x;
        band[dst..dst + cols].copy_from_slice(&tile.row(y as u32)[..cols]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(width: u32, height: u32) -> FractalParameters {
        FractalParameters::defaults().with_size(width, height)
    }

    /// Tile whose cells encode their global pixel position.
    fn marker_tile(coord: TileCoordinate) -> TileGrid {
        let (ox, oy) = coord.pixel_origin();
        TileGrid::from_fn(TILE_SIZE, TILE_SIZE, |x, y| ((oy + y) * 1000 + (ox + x)) as f64)
    }

    fn all_tiles(width: u32, height: u32) -> Vec<TileResult> {
        TileLayout::new(&params(width, height))
            .coordinates()
            .map(|c| (c, Ok(marker_tile(c))))
            .collect()
    }

    #[test]
    fn places_every_pixel_at_its_origin() {
        let assembly = assemble(all_tiles(100, 70), &params(100, 70)).unwrap();

        assert!(assembly.failures.is_empty());
        for y in 0..70 {
            for x in 0..100 {
                assert_eq!(assembly.grid.get(x, y), Some((y * 1000 + x) as f64));
            }
        }
    }

    #[test]
    fn order_of_results_does_not_matter() {
        let mut reversed = all_tiles(100, 70);
        reversed.reverse();

        let forward = assemble(all_tiles(100, 70), &params(100, 70)).unwrap();
        let backward = assemble(reversed, &params(100, 70)).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn small_image_takes_corner_of_single_tile() {
        let assembly = assemble(all_tiles(5, 3), &params(5, 3)).unwrap();
        assert_eq!(assembly.grid.row(2), &[2000.0, 2001.0, 2002.0, 2003.0, 2004.0]);
    }

    #[test]
    fn undersized_tiles_are_clamped_to_their_own_size() {
        let coord = TileCoordinate::new(0, 0);
        let tile = TileGrid::from_fn(2, 2, |_, _| 7.0);
        let assembly = assemble(vec![(coord, Ok(tile))], &params(4, 4)).unwrap();

        assert_eq!(assembly.grid.row(0), &[7.0, 7.0, 0.0, 0.0]);
        assert_eq!(assembly.grid.row(2), &[0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn failed_tiles_leave_zeros_and_are_reported() {
        let failed = TileCoordinate::new(1, 1);
        let results = all_tiles(64, 64).into_iter().map(|(c, r)| {
            if c == failed {
                (c, Err(ComputeError::Panicked("boom".into())))
            } else {
                (c, r)
            }
        });

        let assembly = assemble(results, &params(64, 64)).unwrap();

        assert_eq!(
            assembly.failures,
            vec![TileFailure {
                coord: failed,
                error: ComputeError::Panicked("boom".into())
            }]
        );
        assert_eq!(assembly.grid.get(40, 40), Some(0.0));
        assert_eq!(assembly.grid.get(10, 40), Some(40010.0));
    }

    #[test]
    fn duplicates_and_strays_are_skipped() {
        let origin = TileCoordinate::new(0, 0);
        let results = vec![
            (origin, Ok(TileGrid::from_fn(TILE_SIZE, TILE_SIZE, |_, _| 1.0))),
            (origin, Ok(TileGrid::from_fn(TILE_SIZE, TILE_SIZE, |_, _| 2.0))),
            (
                TileCoordinate::new(5, 0),
                Ok(TileGrid::from_fn(TILE_SIZE, TILE_SIZE, |_, _| 3.0)),
            ),
        ];

        let assembly = assemble(results, &params(32, 32)).unwrap();
        assert!(assembly.grid.values().iter().all(|v| *v == 1.0));
    }

    #[test]
    fn missing_tiles_stay_zero() {
        let assembly = assemble(Vec::new(), &params(40, 40)).unwrap();
        assert!(assembly.grid.values().iter().all(|v| *v == 0.0));
        assert!(assembly.failures.is_empty());
    }
}
