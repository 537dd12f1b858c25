//! Adapter for external byte-oriented key/value servers.

use super::{CacheKey, TileStore};
use crate::error::StoreError;
use fractaltile_core::{FractalKind, TileGrid, TILE_SIZE};
use std::time::Duration;

/// Minimal client surface of an external key/value server with TTL support.
pub trait ByteStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Delete every key starting with `prefix`.
    fn delete_prefix(&self, prefix: &str) -> Result<(), StoreError>;
}

/// Stores tiles as JSON under their string key.
pub struct JsonTileStore<B> {
    backend: B,
}

impl<B: ByteStore> JsonTileStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: ByteStore> TileStore for JsonTileStore<B> {
    fn get(&self, key: &CacheKey) -> Result<Option<TileGrid>, StoreError> {
        let key = key.to_string();
        let Some(bytes) = self.backend.get(&key)? else {
            return Ok(None);
        };

        let grid: TileGrid = serde_json::from_slice(&bytes)?;
        if !grid.is_consistent() || grid.width() != TILE_SIZE || grid.height() != TILE_SIZE {
            return Err(StoreError::Malformed { key });
        }
        Ok(Some(grid))
    }

    fn put(&self, key: &CacheKey, grid: &TileGrid, ttl: Duration) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(grid)?;
        self.backend.set(&key.to_string(), bytes, ttl)
    }

    fn evict(&self, key: &CacheKey) -> Result<(), StoreError> {
        self.backend.delete(&key.to_string())
    }

    fn clear(&self) -> Result<(), StoreError> {
        for kind in FractalKind::ALL {
            self.backend.delete_prefix(&format!("{}_tile:", kind.id()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape_time::{EscapeSettings, Formula};
    use fractaltile_core::{Complex, TileBounds};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapBytes {
        entries: Mutex<HashMap<String, (Vec<u8>, Duration)>>,
    }

    impl ByteStore for MapBytes {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Ok(self.entries.lock().unwrap().get(key).map(|(v, _)| v.clone()))
        }

        fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value, ttl));
            Ok(())
        }

        fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }

        fn delete_prefix(&self, prefix: &str) -> Result<(), StoreError> {
            self.entries
                .lock()
                .unwrap()
                .retain(|key, _| !key.starts_with(prefix));
            Ok(())
        }
    }

    fn key(formula: Formula) -> CacheKey {
        let settings = EscapeSettings {
            formula,
            max_iterations: 100,
            smooth: true,
        };
        let bounds = TileBounds {
            x_min: -2.0,
            x_max: -1.25,
            y_min: -1.5,
            y_max: -1.125,
        };
        CacheKey::new(&settings, &bounds)
    }

    #[test]
    fn stores_json_under_string_key_with_ttl() {
        let store = JsonTileStore::new(MapBytes::default());
        let grid = TileGrid::from_fn(TILE_SIZE, TILE_SIZE, |x, _| x as f64 + 0.5);
        let ttl = Duration::from_secs(10_800);

        store.put(&key(Formula::Mandelbrot), &grid, ttl).unwrap();

        let entries = store.backend().entries.lock().unwrap();
        let (bytes, stored_ttl) = &entries["mandelbrot_tile:100_true_-20000_-15000_-12500_-11250"];
        assert_eq!(*stored_ttl, ttl);
        let json: serde_json::Value = serde_json::from_slice(bytes).unwrap();
        assert_eq!(json["width"], 32);
        assert_eq!(json["values"][0], 0.5);
        assert_eq!(json["values"][1], 1.5);
        drop(entries);

        assert_eq!(store.get(&key(Formula::Mandelbrot)).unwrap(), Some(grid));
    }

    #[test]
    fn missing_key_is_a_miss() {
        let store = JsonTileStore::new(MapBytes::default());
        assert_eq!(store.get(&key(Formula::Mandelbrot)).unwrap(), None);
    }

    #[test]
    fn undecodable_value_is_an_error() {
        let store = JsonTileStore::new(MapBytes::default());
        let k = key(Formula::Mandelbrot);
        store
            .backend()
            .set(&k.to_string(), b"not json".to_vec(), Duration::ZERO)
            .unwrap();

        assert!(matches!(store.get(&k), Err(StoreError::Serialization(_))));
    }

    #[test]
    fn inconsistent_grid_is_rejected() {
        let store = JsonTileStore::new(MapBytes::default());
        let k = key(Formula::Mandelbrot);
        let bytes = br#"{"width":32,"height":32,"values":[1.0]}"#.to_vec();
        store.backend().set(&k.to_string(), bytes, Duration::ZERO).unwrap();

        assert!(matches!(store.get(&k), Err(StoreError::Malformed { .. })));
    }

    #[test]
    fn grid_of_wrong_size_is_rejected() {
        let store = JsonTileStore::new(MapBytes::default());
        let k = key(Formula::Mandelbrot);
        let small = TileGrid::from_fn(1, 1, |_, _| 7.0);
        store.put(&k, &small, Duration::from_secs(60)).unwrap();

        assert!(matches!(store.get(&k), Err(StoreError::Malformed { .. })));
    }

    #[test]
    fn clear_removes_only_tile_namespaces() {
        let store = JsonTileStore::new(MapBytes::default());
        let grid = TileGrid::from_fn(1, 1, |_, _| 3.0);
        let julia = key(Formula::Julia {
            c: Complex::new(-0.7, 0.27015),
        });
        store.put(&key(Formula::Mandelbrot), &grid, Duration::ZERO).unwrap();
        store.put(&julia, &grid, Duration::ZERO).unwrap();
        store
            .backend()
            .set("session:abc", vec![1], Duration::ZERO)
            .unwrap();

        store.evict(&julia).unwrap();
        assert_eq!(store.get(&julia).unwrap(), None);

        store.clear().unwrap();
        let entries = store.backend().entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("session:abc"));
    }
}
