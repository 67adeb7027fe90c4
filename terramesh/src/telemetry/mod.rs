//! Layer telemetry for observability and user feedback.
//!
//! Lock-free counters recorded by the tile loader and the terrain layer.
//!
//! ```text
//! TileDataLoader ─┐
//!                 ├──► LayerMetrics ─────► MetricsSnapshot ─────► Views
//! TerrainLayer ───┘    (atomic counters)   (point-in-time copy)   (CLI, logs)
//! ```
//!
//! # Example
//!
//! ```
//! use terramesh::telemetry::LayerMetrics;
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(LayerMetrics::new());
//! metrics.tile_requested();
//! metrics.mesh_decoded();
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.tiles_requested, 1);
//! assert_eq!(snapshot.meshes_decoded, 1);
//! ```

mod metrics;

pub use metrics::{LayerMetrics, MetricsSnapshot};
