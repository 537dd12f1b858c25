//! Turns one request into an assembled escape-value grid.

use crate::assembler::assemble_into;
use crate::cache::{CacheOutcome, CachedTile, TileCache};
use crate::cancellation::{CancellationChecker, NeverCancel, WithDeadline};
use crate::error::{ComputeError, RenderError, TileFailure};
use crate::escape_time::EscapeSettings;
use crate::render_config::RenderConfig;
use crate::tile_compute::{EscapeTimeComputer, TileComputer};
use fractaltile_core::{AssembledGrid, FractalKind, FractalParameters, TileCoordinate, TileLayout};
use rayon::prelude::*;
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RenderStats {
    pub tiles_total: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// Result handed to the color-mapping stage.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderOutput {
    pub grid: AssembledGrid,
    /// Tiles left at zero; empty for a complete render
    pub failed_tiles: Vec<TileFailure>,
    pub color_scheme: String,
    pub smooth: bool,
    pub stats: RenderStats,
}

impl RenderOutput {
    pub fn is_complete(&self) -> bool {
        self.failed_tiles.is_empty()
    }
}

/// Validates requests, fans tiles out over rayon and assembles the results.
pub struct FractalRenderer<C = EscapeTimeComputer> {
    cache: TileCache<C>,
    /// Dedicated pool; `None` runs on rayon's global pool
    pool: Option<rayon::ThreadPool>,
    timeout: Option<Duration>,
}

impl FractalRenderer {
    pub fn new(config: &RenderConfig) -> Result<Self, RenderError> {
        Self::with_cache(TileCache::from_config(&config.cache), config)
    }
}

impl Default for FractalRenderer {
    fn default() -> Self {
        Self {
            cache: TileCache::from_config(&Default::default()),
            pool: None,
            timeout: None,
        }
    }
}

impl<C: TileComputer> FractalRenderer<C> {
    /// Build around an existing cache. `config.cache` is ignored.
    pub fn with_cache(cache: TileCache<C>, config: &RenderConfig) -> Result<Self, RenderError> {
        let pool = match config.num_threads {
            Some(num_threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .thread_name(|i| format!("fractaltile-{i}"))
                    .build()?,
            ),
            None => None,
        };

        Ok(Self {
            cache,
            pool,
            timeout: config.timeout(),
        })
    }

    pub fn cache(&self) -> &TileCache<C> {
        &self.cache
    }

    pub fn render(
        &self,
        kind: FractalKind,
        params: &FractalParameters,
    ) -> Result<RenderOutput, RenderError> {
        self.render_with_cancel(kind, params, &NeverCancel)
    }

    /// Render by fractal type id, e.g. `"mandelbrot"`.
    pub fn render_str(
        &self,
        type_id: &str,
        params: &FractalParameters,
    ) -> Result<RenderOutput, RenderError> {
        let kind = type_id.parse::<FractalKind>()?;
        self.render(kind, params)
    }

    /// Tiled, cached render.
    ///
    /// Each tile checks `cancel` (and the configured timeout) before it
    /// starts. Tiles finished before cancellation stay cached.
    pub fn render_with_cancel<K: CancellationChecker>(
        &self,
        kind: FractalKind,
        params: &FractalParameters,
        cancel: &K,
    ) -> Result<RenderOutput, RenderError> {
        let start = Instant::now();
        let settings = EscapeSettings::from_params(kind, params)?;
        let layout = TileLayout::new(params);
        let grid = AssembledGrid::try_new(params.width, params.height)?;
        let checker = WithDeadline::new(cancel.clone(), self.timeout);

        log::debug!(
            "rendering {kind} {}x{} as {} tiles (max_iterations={}, smooth={})",
            params.width,
            params.height,
            layout.tile_count(),
            params.max_iterations,
            params.smooth
        );

        let coords: Vec<TileCoordinate> = layout.coordinates().collect();
        let results: Vec<(TileCoordinate, Result<CachedTile, ComputeError>)> = self.install(|| {
            coords
                .par_iter()
                .map(|&coord| (coord, self.render_tile(&settings, &layout, coord, &checker)))
                .collect()
        });

        if results
            .iter()
            .any(|(_, result)| matches!(result, Err(ComputeError::Cancelled)))
        {
            log::info!("render of {kind} cancelled after {:?}", start.elapsed());
            return Err(RenderError::Cancelled);
        }

        let cache_hits = results
            .iter()
            .filter(|(_, result)| matches!(result, Ok(tile) if tile.outcome == CacheOutcome::Hit))
            .count();
        let cache_misses = results
            .iter()
            .filter(|(_, result)| matches!(result, Ok(tile) if tile.outcome == CacheOutcome::Miss))
            .count();
        let tiles_total = results.len();

        let tiles = results
            .into_iter()
            .map(|(coord, result)| (coord, result.map(|tile| tile.grid)));
        let assembly = assemble_into(grid, tiles, &layout);

        let stats = RenderStats {
            tiles_total,
            cache_hits,
            cache_misses,
            failed: assembly.failures.len(),
            elapsed: start.elapsed(),
        };
        log::info!(
            "rendered {kind} {}x{}: {} tiles, {} cached, {} failed in {:?}",
            params.width,
            params.height,
            stats.tiles_total,
            stats.cache_hits,
            stats.failed,
            stats.elapsed
        );

        Ok(RenderOutput {
            grid: assembly.grid,
            failed_tiles: assembly.failures,
            color_scheme: params.color_scheme.clone(),
            smooth: params.smooth,
            stats,
        })
    }

    /// Uncached full-grid render, one rayon task per image row.
    ///
    /// Maps pixels through the same tile geometry as [`render`](Self::render),
    /// so both paths produce identical values.
    pub fn render_direct(
        &self,
        kind: FractalKind,
        params: &FractalParameters,
    ) -> Result<RenderOutput, RenderError> {
        let start = Instant::now();
        let settings = EscapeSettings::from_params(kind, params)?;
        let layout = TileLayout::new(params);
        let mut grid = AssembledGrid::try_new(params.width, params.height)?;
        let checker = WithDeadline::new(NeverCancel, self.timeout);
        let width = params.width as usize;

        self.install(|| {
            grid.values_mut()
                .par_chunks_mut(width)
                .enumerate()
                .try_for_each(|(py, row)| {
                    if checker.is_cancelled() {
                        return Err(RenderError::Cancelled);
                    }
                    for (px, value) in row.iter_mut().enumerate() {
                        *value = settings.evaluate(layout.pixel_to_plane(px as u32, py as u32));
                    }
                    Ok(())
                })
        })?;

        let failed_tiles = zero_non_finite_tiles(&mut grid, &layout);
        if !failed_tiles.is_empty() {
            log::warn!(
                "{} tiles with non-finite values zeroed in direct {kind} render",
                failed_tiles.len()
            );
        }

        let elapsed = start.elapsed();
        log::info!(
            "rendered {kind} {}x{} directly in {elapsed:?}",
            params.width,
            params.height
        );

        Ok(RenderOutput {
            grid,
            color_scheme: params.color_scheme.clone(),
            smooth: params.smooth,
            stats: RenderStats {
                tiles_total: layout.tile_count(),
                failed: failed_tiles.len(),
                elapsed,
                ..RenderStats::default()
            },
            failed_tiles,
        })
    }

    /// One tile through the cache, with panics turned into a tile failure.
    fn render_tile<K: CancellationChecker>(
        &self,
        settings: &EscapeSettings,
        layout: &TileLayout,
        coord: TileCoordinate,
        checker: &K,
    ) -> Result<CachedTile, ComputeError> {
        if checker.is_cancelled() {
            return Err(ComputeError::Cancelled);
        }

        let bounds = layout.tile_bounds(coord);
        panic::catch_unwind(AssertUnwindSafe(|| {
            self.cache.get_or_compute(settings, &bounds)
        }))
        .unwrap_or_else(|payload| Err(ComputeError::Panicked(panic_message(payload.as_ref()))))
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

/// Zero every tile region of a directly rendered grid that holds a
/// non-finite value, reporting it the way a failed tile is reported.
/// Failures come out in row-major tile order.
fn zero_non_finite_tiles(grid: &mut AssembledGrid, layout: &TileLayout) -> Vec<TileFailure> {
    let width = grid.width() as usize;
    let mut failures = Vec::new();

    for coord in layout.coordinates() {
        let Some(rect) = layout.pixel_rect(coord) else {
            continue;
        };
        let first = (rect.y..rect.y + rect.height)
            .flat_map(|py| (rect.x..rect.x + rect.width).map(move |px| (px, py)))
            .find(|&(px, py)| grid.get(px, py).is_some_and(|v| !v.is_finite()));
        let Some((px, py)) = first else {
            continue;
        };

        let values = grid.values_mut();
        for py in rect.y..rect.y + rect.height {
            let start = py as usize * width + rect.x as usize;
            values[start..start + rect.width as usize].fill(0.0);
        }
        failures.push(TileFailure {
            coord,
            error: ComputeError::NonFinite {
                x: px - rect.x,
                y: py - rect.y,
            },
        });
    }

    failures
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}
