//! Terramesh - Tiled terrain meshes from elevation rasters
//!
//! This library turns RGB-encoded elevation tiles into simplified triangle
//! meshes, streams them per visible tile, and keeps the vertical extent of
//! the loaded terrain for the renderer.
//!
//! The moving parts, leaves first:
//!
//! - [`mesh`]: the mesh decoder adapter and the built-in RTIN decoder
//! - [`loader`]: per-tile mesh decode plus texture fetch
//! - [`extent`]: the widening-only zRange aggregate
//! - [`layer`]: the terrain layer state machine tying it together
//!
//! ```ignore
//! use terramesh::layer::{TerrainLayer, TerrainProps};
//! use terramesh::loader::{TileDataLoader, TileDescriptor};
//! use terramesh::mesh::MartiniDecoder;
//! use terramesh::provider::AsyncReqwestClient;
//!
//! let http = AsyncReqwestClient::new()?;
//! let loader = TileDataLoader::new(MartiniDecoder::new(http.clone()), http);
//! let mut layer = TerrainLayer::new(loader);
//!
//! layer.apply_props(props)?;
//! layer.request_tiles(&visible_tiles);
//! layer.settle().await;
//! layer.on_viewport_tiles_loaded(&visible_coords);
//! let sub_layers = layer.build_sub_layers();
//! ```

pub mod config;
pub mod coord;
pub mod extent;
pub mod layer;
pub mod loader;
pub mod logging;
pub mod mesh;
pub mod provider;
pub mod telemetry;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
