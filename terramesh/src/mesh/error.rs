//! Error types for mesh decoding.

use std::time::Duration;

use thiserror::Error;

use crate::provider::ProviderError;

/// Errors reported by the mesh-generation service for one tile.
///
/// A decode error is never fatal to the layer: the tile contributes no
/// geometry and its siblings are unaffected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The elevation raster could not be fetched.
    #[error("Elevation fetch failed: {0}")]
    Fetch(#[from] ProviderError),

    /// The elevation raster could not be decoded as an image.
    #[error("Malformed elevation raster: {0}")]
    Raster(String),

    /// Raster size does not form a `2^n + 1` grid.
    #[error("Expected grid size to be 2^n+1, got {0}")]
    InvalidGridSize(u32),

    /// Options rejected before any work was done.
    #[error("Invalid decode options: {0}")]
    InvalidOptions(String),

    /// Simplification produced no vertices.
    #[error("Mesh has no vertices")]
    EmptyMesh,

    /// The service did not answer in time.
    #[error("Decode timed out after {0:?}")]
    Timeout(Duration),

    /// The blocking worker running the decode failed.
    #[error("Decode worker failed: {0}")]
    Worker(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_provider_error() {
        let err: DecodeError = ProviderError::HttpError("reset".to_string()).into();
        assert!(matches!(err, DecodeError::Fetch(_)));
        assert_eq!(err.to_string(), "Elevation fetch failed: HTTP error: reset");
    }

    #[test]
    fn test_display_grid_size() {
        assert_eq!(
            DecodeError::InvalidGridSize(258).to_string(),
            "Expected grid size to be 2^n+1, got 258"
        );
    }

    #[test]
    fn test_display_timeout() {
        let err = DecodeError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Decode timed out after 250ms");
    }
}
