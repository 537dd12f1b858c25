use crate::cache::TileCacheConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime settings for a [`FractalRenderer`](crate::FractalRenderer).
///
/// Every field has a default, so a partial JSON object is enough:
/// `{"num_threads": 4, "cache": {"ttl_secs": 600}}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Size of a dedicated tile pool; `None` uses rayon's global pool
    pub num_threads: Option<usize>,
    /// Requests running longer are cancelled
    pub timeout_ms: Option<u64>,
    pub cache: TileCacheConfig,
}

impl RenderConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
