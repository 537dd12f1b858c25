pub mod assembler;
pub mod cache;
pub mod cancellation;
pub mod error;
pub mod escape_time;
pub mod render_config;
pub mod renderer;
pub mod tile_compute;

pub use assembler::{assemble, assemble_into, Assembly, TileResult};
pub use cache::{
    is_keyable, ByteStore, CacheKey, CacheOutcome, CachedTile, JsonTileStore, MemoryTileStore,
    NoopTileStore, TileCache, TileCacheConfig, TileStore, DEFAULT_TILE_TTL, KEY_SCALE,
};
pub use cancellation::{
    AtomicBoolChecker, CancellationChecker, Deadline, NeverCancel, WithDeadline,
};
pub use error::{ComputeError, RenderError, StoreError, TileFailure};
pub use escape_time::{EscapeSettings, Formula};
pub use render_config::RenderConfig;
pub use renderer::{FractalRenderer, RenderOutput, RenderStats};
pub use tile_compute::{compute_tile, EscapeTimeComputer, TileComputer};

// Re-export core types for convenience
pub use fractaltile_core::*;
