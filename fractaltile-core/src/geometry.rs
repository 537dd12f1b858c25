//! Viewport to tile-grid geometry.
//!
//! Every complex-plane coordinate used for caching or computing goes through
//! [`TileLayout::tile_bounds`] and [`TileBounds::point_at`]. The cache key and
//! the pixel values are both derived from these two functions, so they can
//! never disagree about where a tile sits.

use crate::{Complex, FractalParameters, PixelRect};
use serde::{Deserialize, Serialize};

/// Edge length of a square tile in pixels. Also the unit of cache granularity.
pub const TILE_SIZE: u32 = 32;

/// Position of a tile in the grid, in tile units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoordinate {
    pub tile_x: u32,
    pub tile_y: u32,
}

impl TileCoordinate {
    pub fn new(tile_x: u32, tile_y: u32) -> Self {
        Self { tile_x, tile_y }
    }

    /// Pixel-space origin of this tile (top-left).
    pub fn pixel_origin(&self) -> (u32, u32) {
        (self.tile_x * TILE_SIZE, self.tile_y * TILE_SIZE)
    }
}

/// Complex-plane rectangle covered by one tile.
///
/// Never stored on its own; always recomputed from the request by
/// [`TileLayout::tile_bounds`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl TileBounds {
    /// Plane distance between neighbouring pixels of this tile.
    #[inline]
    pub fn pixel_step(&self) -> (f64, f64) {
        (
            (self.x_max - self.x_min) / TILE_SIZE as f64,
            (self.y_max - self.y_min) / TILE_SIZE as f64,
        )
    }

    /// Plane coordinate of the tile-local pixel `(local_x, local_y)`.
    #[inline]
    pub fn point_at(&self, local_x: u32, local_y: u32) -> Complex {
        let (step_x, step_y) = self.pixel_step();
        Complex::new(
            self.x_min + local_x as f64 * step_x,
            self.y_min + local_y as f64 * step_y,
        )
    }
}

/// Tile grid covering one requested viewport.
///
/// Tiles split the plane range evenly (`range / tiles`), and every tile
/// samples `TILE_SIZE` pixels across its share. When the image size is not a
/// multiple of `TILE_SIZE` the last row/column of tiles is cropped in pixel
/// space, so the rendered region ends slightly before `x_max`/`y_max`.
#[derive(Clone, Debug, PartialEq)]
pub struct TileLayout {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    width: u32,
    height: u32,
    tiles_x: u32,
    tiles_y: u32,
}

impl TileLayout {
    pub fn new(params: &FractalParameters) -> Self {
        Self {
            x_min: params.x_min,
            x_max: params.x_max,
            y_min: params.y_min,
            y_max: params.y_max,
            width: params.width,
            height: params.height,
            tiles_x: params.width.div_ceil(TILE_SIZE),
            tiles_y: params.height.div_ceil(TILE_SIZE),
        }
    }

    pub fn tiles_x(&self) -> u32 {
        self.tiles_x
    }

    pub fn tiles_y(&self) -> u32 {
        self.tiles_y
    }

    pub fn tile_count(&self) -> usize {
        self.tiles_x as usize * self.tiles_y as usize
    }

    /// Image size in pixels.
    pub fn canvas(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width, self.height)
    }

    pub fn contains(&self, coord: TileCoordinate) -> bool {
        coord.tile_x < self.tiles_x && coord.tile_y < self.tiles_y
    }

    /// All tile coordinates in row-major order.
    pub fn coordinates(&self) -> impl Iterator<Item = TileCoordinate> + '_ {
        (0..self.tiles_y).flat_map(move |tile_y| {
            (0..self.tiles_x).map(move |tile_x| TileCoordinate::new(tile_x, tile_y))
        })
    }

    /// Plane bounds of one tile. The single source of truth for tile geometry.
    pub fn tile_bounds(&self, coord: TileCoordinate) -> TileBounds {
        let tile_width = (self.x_max - self.x_min) / self.tiles_x as f64;
        let tile_height = (self.y_max - self.y_min) / self.tiles_y as f64;
        TileBounds {
            x_min: self.x_min + coord.tile_x as f64 * tile_width,
            x_max: self.x_min + (coord.tile_x + 1) as f64 * tile_width,
            y_min: self.y_min + coord.tile_y as f64 * tile_height,
            y_max: self.y_min + (coord.tile_y + 1) as f64 * tile_height,
        }
    }

    /// Pixel region of a tile inside the image, clamped at the right/bottom edge.
    pub fn pixel_rect(&self, coord: TileCoordinate) -> Option<PixelRect> {
        let (x, y) = coord.pixel_origin();
        PixelRect::new(x, y, TILE_SIZE, TILE_SIZE).intersect(&self.canvas())
    }

    /// Plane coordinate of a global pixel, routed through its owning tile.
    pub fn pixel_to_plane(&self, px: u32, py: u32) -> Complex {
        let coord = TileCoordinate::new(px / TILE_SIZE, py / TILE_SIZE);
        self.tile_bounds(coord).point_at(px % TILE_SIZE, py % TILE_SIZE)
    }
}
