//! Tile memoization keyed by quantized tile geometry.
//!
//! The cache never changes results: a hit returns exactly what a miss would
//! have computed, and store failures degrade to recomputation.

mod json_store;
mod key;
mod store;

pub use json_store::{ByteStore, JsonTileStore};
pub use key::{is_keyable, quantize, CacheKey, KEY_SCALE};
pub use store::{MemoryTileStore, NoopTileStore, TileStore};

use crate::error::{ComputeError, StoreError};
use crate::escape_time::EscapeSettings;
use crate::tile_compute::{EscapeTimeComputer, TileComputer};
use fractaltile_core::{TileBounds, TileGrid};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Tiles live for three hours unless configured otherwise.
pub const DEFAULT_TILE_TTL: Duration = Duration::from_secs(3 * 60 * 60);

/// Runtime cache settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileCacheConfig {
    /// `false` swaps in a store that never hits
    pub enabled: bool,
    pub ttl_secs: u64,
    /// Maximum number of tiles held by the in-memory store
    pub capacity: Option<usize>,
}

impl Default for TileCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: DEFAULT_TILE_TTL.as_secs(),
            capacity: None,
        }
    }
}

impl TileCacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// In-process store matching this configuration.
    pub fn build_store(&self) -> Arc<dyn TileStore> {
        match (self.enabled, self.capacity) {
            (false, _) => Arc::new(NoopTileStore),
            (true, Some(capacity)) => Arc::new(MemoryTileStore::with_capacity(capacity)),
            (true, None) => Arc::new(MemoryTileStore::new()),
        }
    }
}

/// Whether a tile came from the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CachedTile {
    pub grid: TileGrid,
    pub outcome: CacheOutcome,
}

/// Read-through cache in front of a [`TileComputer`].
pub struct TileCache<C = EscapeTimeComputer> {
    store: Arc<dyn TileStore>,
    computer: C,
    ttl: Duration,
}

impl TileCache {
    pub fn new(store: Arc<dyn TileStore>) -> Self {
        Self::with_computer(store, EscapeTimeComputer)
    }

    pub fn from_config(config: &TileCacheConfig) -> Self {
        Self::new(config.build_store()).with_ttl(config.ttl())
    }
}

impl<C: TileComputer> TileCache<C> {
    pub fn with_computer(store: Arc<dyn TileStore>, computer: C) -> Self {
        Self {
            store,
            computer,
            ttl: DEFAULT_TILE_TTL,
        }
    }

    pub fn with_ttl(self, ttl: Duration) -> Self {
        Self { ttl, ..self }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn store(&self) -> &Arc<dyn TileStore> {
        &self.store
    }

    /// Return the cached tile, computing and storing it on a miss.
    ///
    /// Compute errors are returned and never stored. Tiles that are not
    /// [`is_keyable`] are always computed.
    pub fn get_or_compute(
        &self,
        settings: &EscapeSettings,
        bounds: &TileBounds,
    ) -> Result<CachedTile, ComputeError> {
        if !is_keyable(bounds) {
            log::trace!("tile not keyable, computing uncached: {bounds:?}");
            return Ok(CachedTile {
                grid: self.computer.compute(settings, bounds)?,
                outcome: CacheOutcome::Miss,
            });
        }

        let key = CacheKey::new(settings, bounds);

        match self.store.get(&key) {
            Ok(Some(grid)) => {
                log::trace!("tile cache hit: {key}");
                return Ok(CachedTile {
                    grid,
                    outcome: CacheOutcome::Hit,
                });
            }
            Ok(None) => log::trace!("tile cache miss: {key}"),
            Err(e) => log::warn!("tile cache read failed for {key}, recomputing: {e}"),
        }

        let grid = self.computer.compute(settings, bounds)?;

        if let Err(e) = self.store.put(&key, &grid, self.ttl) {
            log::warn!("tile cache write failed for {key}: {e}");
        }

        Ok(CachedTile {
            grid,
            outcome: CacheOutcome::Miss,
        })
    }

    /// Drop one tile from the store.
    pub fn evict(&self, settings: &EscapeSettings, bounds: &TileBounds) -> Result<(), StoreError> {
        let key = CacheKey::new(settings, bounds);
        log::debug!("evicting cached tile {key}");
        self.store.evict(&key)
    }

    /// Drop every cached tile.
    pub fn clear(&self) -> Result<(), StoreError> {
        log::info!("clearing tile cache");
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape_time::Formula;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingComputer {
        calls: AtomicUsize,
    }

    impl TileComputer for CountingComputer {
        fn compute(
            &self,
            settings: &EscapeSettings,
            bounds: &TileBounds,
        ) -> Result<TileGrid, ComputeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            EscapeTimeComputer.compute(settings, bounds)
        }
    }

    struct FailingComputer;

    impl TileComputer for FailingComputer {
        fn compute(&self, _: &EscapeSettings, _: &TileBounds) -> Result<TileGrid, ComputeError> {
            Err(ComputeError::NonFinite { x: 0, y: 0 })
        }
    }

    struct BrokenStore;

    impl TileStore for BrokenStore {
        fn get(&self, _: &CacheKey) -> Result<Option<TileGrid>, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }

        fn put(&self, _: &CacheKey, _: &TileGrid, _: Duration) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }

        fn evict(&self, _: &CacheKey) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }

        fn clear(&self) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
    }

    fn settings() -> EscapeSettings {
        EscapeSettings {
            formula: Formula::Mandelbrot,
            max_iterations: 50,
            smooth: true,
        }
    }

    fn bounds() -> TileBounds {
        TileBounds {
            x_min: -2.0,
            x_max: -1.25,
            y_min: -1.5,
            y_max: -1.125,
        }
    }

    fn counting_cache(store: Arc<dyn TileStore>) -> TileCache<CountingComputer> {
        TileCache::with_computer(
            store,
            CountingComputer {
                calls: AtomicUsize::new(0),
            },
        )
    }

    #[test]
    fn second_lookup_hits_and_returns_identical_grid() {
        let cache = counting_cache(Arc::new(MemoryTileStore::new()));

        let first = cache.get_or_compute(&settings(), &bounds()).unwrap();
        let second = cache.get_or_compute(&settings(), &bounds()).unwrap();

        assert_eq!(first.outcome, CacheOutcome::Miss);
        assert_eq!(second.outcome, CacheOutcome::Hit);
        assert_eq!(first.grid, second.grid);
        assert_eq!(cache.computer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn store_failures_fall_back_to_computing() {
        let cache = counting_cache(Arc::new(BrokenStore));

        let tile = cache.get_or_compute(&settings(), &bounds()).unwrap();
        let again = cache.get_or_compute(&settings(), &bounds()).unwrap();

        assert_eq!(tile.outcome, CacheOutcome::Miss);
        assert_eq!(tile.grid, again.grid);
        assert_eq!(
            tile.grid,
            EscapeTimeComputer.compute(&settings(), &bounds()).unwrap()
        );
        assert_eq!(cache.computer.calls.load(Ordering::SeqCst), 2);
        assert!(cache.clear().is_err());
    }

    #[test]
    fn compute_errors_are_not_stored() {
        let store = Arc::new(MemoryTileStore::new());
        let cache = TileCache::with_computer(store.clone(), FailingComputer);

        let result = cache.get_or_compute(&settings(), &bounds());
        assert_eq!(result, Err(ComputeError::NonFinite { x: 0, y: 0 }));
        assert!(store.is_empty());
    }

    #[test]
    fn evict_and_clear_force_recomputation() {
        let cache = counting_cache(Arc::new(MemoryTileStore::new()));

        cache.get_or_compute(&settings(), &bounds()).unwrap();
        cache.evict(&settings(), &bounds()).unwrap();
        let after_evict = cache.get_or_compute(&settings(), &bounds()).unwrap();
        assert_eq!(after_evict.outcome, CacheOutcome::Miss);

        cache.clear().unwrap();
        let after_clear = cache.get_or_compute(&settings(), &bounds()).unwrap();
        assert_eq!(after_clear.outcome, CacheOutcome::Miss);
        assert_eq!(cache.computer.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn tiles_below_key_resolution_bypass_the_store() {
        let store = Arc::new(MemoryTileStore::new());
        let cache = counting_cache(store.clone());
        let tiny = TileBounds {
            x_min: -0.7436,
            x_max: -0.74359,
            y_min: 0.1318,
            y_max: 0.13181,
        };

        let first = cache.get_or_compute(&settings(), &tiny).unwrap();
        let second = cache.get_or_compute(&settings(), &tiny).unwrap();

        assert_eq!(first.outcome, CacheOutcome::Miss);
        assert_eq!(second.outcome, CacheOutcome::Miss);
        assert_eq!(first.grid, second.grid);
        assert_eq!(cache.computer.calls.load(Ordering::SeqCst), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn disabled_config_never_hits() {
        let config = TileCacheConfig {
            enabled: false,
            ..TileCacheConfig::default()
        };
        let cache = TileCache::from_config(&config);

        cache.get_or_compute(&settings(), &bounds()).unwrap();
        let again = cache.get_or_compute(&settings(), &bounds()).unwrap();
        assert_eq!(again.outcome, CacheOutcome::Miss);
    }

    #[test]
    fn config_defaults_and_json() {
        let config = TileCacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.ttl(), Duration::from_secs(10_800));

        let config: TileCacheConfig =
            serde_json::from_str(r#"{"ttl_secs": 60, "capacity": 512}"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.ttl(), Duration::from_secs(60));
        assert_eq!(config.capacity, Some(512));
        assert_eq!(TileCache::from_config(&config).ttl(), Duration::from_secs(60));
    }
}
