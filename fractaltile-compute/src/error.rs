//! Compute, cache and render error types.

use fractaltile_core::{GridAllocationError, ParameterError, TileCoordinate};
use serde::Serialize;
use thiserror::Error;

/// Failure of a single tile. Isolated: the rest of the render continues.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum ComputeError {
    #[error("non-finite escape value at local pixel ({x}, {y})")]
    NonFinite { x: u32, y: u32 },

    #[error("tile computation panicked: {0}")]
    Panicked(String),

    #[error("tile computation cancelled")]
    Cancelled,
}

/// Tile store backend failure. Recovered inside the cache: a failed read is a
/// miss, a failed write is dropped.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache backend unavailable: {0}")]
    Backend(String),

    #[error("cached tile could not be encoded or decoded: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cached tile for {key} is malformed")]
    Malformed { key: String },
}

/// Whole-request failure.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(#[from] ParameterError),

    #[error("render cancelled")]
    Cancelled,

    #[error(transparent)]
    Allocation(#[from] GridAllocationError),

    #[error("failed to build render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl RenderError {
    /// Caused by the request itself rather than by the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, RenderError::InvalidParameters(_))
    }
}

/// A tile that did not make it into the assembled grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileFailure {
    pub coord: TileCoordinate,
    pub error: ComputeError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_parameter_errors_are_client_errors() {
        let invalid = RenderError::from(ParameterError::NonPositiveIterations);
        assert!(invalid.is_client_error());
        assert_eq!(
            invalid.to_string(),
            "invalid parameters: max iterations must be positive"
        );

        let alloc = RenderError::from(GridAllocationError {
            width: 1,
            height: 2,
        });
        assert!(!alloc.is_client_error());
        assert_eq!(alloc.to_string(), "cannot allocate a 1x2 grid");

        assert!(!RenderError::Cancelled.is_client_error());
    }

    #[test]
    fn compute_error_messages() {
        assert_eq!(
            ComputeError::NonFinite { x: 3, y: 4 }.to_string(),
            "non-finite escape value at local pixel (3, 4)"
        );
        assert_eq!(
            ComputeError::Panicked("boom".into()).to_string(),
            "tile computation panicked: boom"
        );
    }
}
