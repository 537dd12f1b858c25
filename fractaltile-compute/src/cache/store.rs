//! Tile store backends.

use super::CacheKey;
use crate::error::StoreError;
use fractaltile_core::TileGrid;
use moka::sync::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};

/// Key/value storage for computed tiles.
///
/// Shared across rayon workers; implementations synchronize internally.
pub trait TileStore: Send + Sync {
    fn get(&self, key: &CacheKey) -> Result<Option<TileGrid>, StoreError>;

    /// Store `grid`, expiring after `ttl`.
    fn put(&self, key: &CacheKey, grid: &TileGrid, ttl: Duration) -> Result<(), StoreError>;

    fn evict(&self, key: &CacheKey) -> Result<(), StoreError>;

    /// Drop every tile.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Cache disabled: every lookup misses and writes are discarded.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTileStore;

impl TileStore for NoopTileStore {
    fn get(&self, _key: &CacheKey) -> Result<Option<TileGrid>, StoreError> {
        Ok(None)
    }

    fn put(&self, _key: &CacheKey, _grid: &TileGrid, _ttl: Duration) -> Result<(), StoreError> {
        Ok(())
    }

    fn evict(&self, _key: &CacheKey) -> Result<(), StoreError> {
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Clone)]
struct StoredTile {
    grid: TileGrid,
    ttl: Duration,
}

/// Expires each tile after the TTL it was written with.
struct PerTileTtl;

impl Expiry<CacheKey, StoredTile> for PerTileTtl {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &StoredTile,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &StoredTile,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process store with per-entry expiry and an optional entry limit,
/// backed by a `moka` cache. Expired entries are removed by the cache's
/// housekeeping; the limit evicts by the cache's admission policy.
pub struct MemoryTileStore {
    tiles: Cache<CacheKey, StoredTile>,
}

impl Default for MemoryTileStore {
    fn default() -> Self {
        Self::build(None)
    }
}

impl MemoryTileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::build(Some(capacity))
    }

    fn build(capacity: Option<usize>) -> Self {
        let mut builder = Cache::builder().expire_after(PerTileTtl);
        if let Some(capacity) = capacity {
            builder = builder.max_capacity(capacity as u64);
        }
        Self {
            tiles: builder.build(),
        }
    }

    /// Number of live entries, after pending evictions are applied.
    pub fn len(&self) -> usize {
        self.tiles.run_pending_tasks();
        self.tiles.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TileStore for MemoryTileStore {
    fn get(&self, key: &CacheKey) -> Result<Option<TileGrid>, StoreError> {
        Ok(self.tiles.get(key).map(|tile| tile.grid))
    }

    fn put(&self, key: &CacheKey, grid: &TileGrid, ttl: Duration) -> Result<(), StoreError> {
        // Already expired: only drop what the key held before
        if ttl.is_zero() {
            self.tiles.invalidate(key);
            return Ok(());
        }
        self.tiles.insert(
            *key,
            StoredTile {
                grid: grid.clone(),
                ttl,
            },
        );
        Ok(())
    }

    fn evict(&self, key: &CacheKey) -> Result<(), StoreError> {
        self.tiles.invalidate(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.tiles.invalidate_all();
        Ok(())
    }
}
