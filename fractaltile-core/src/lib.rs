pub mod complex;
pub mod config;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod params;
pub mod pixel_rect;

pub use complex::Complex;
pub use config::{
    fractal_config, get_fractal_config, julia_preset, FractalConfig, JuliaPreset, COLOR_SCHEMES,
    FRACTAL_CONFIGS, JULIA_PRESETS,
};
pub use error::{GridAllocationError, ParameterError};
pub use geometry::{TileBounds, TileCoordinate, TileLayout, TILE_SIZE};
pub use grid::{is_escape_value, AssembledGrid, TileGrid, INTERIOR};
pub use params::{FractalKind, FractalParameters};
pub use pixel_rect::PixelRect;
