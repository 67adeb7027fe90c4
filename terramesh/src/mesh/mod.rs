//! Terrain mesh generation
//!
//! Turns RGB-encoded elevation rasters into simplified triangle meshes.
//!
//! The pipeline per tile is:
//!
//! 1. fetch the raster bytes through an [`AsyncHttpClient`](crate::provider::AsyncHttpClient)
//! 2. decode the image and map each pixel to a height with an [`ElevationDecoder`]
//! 3. simplify the height grid with the RTIN [`Martini`] hierarchy
//! 4. place the surviving vertices in world space and emit a [`MeshPayload`]
//!
//! Steps 2-4 are CPU bound and run on the blocking pool.

mod decoder;
mod error;
mod martini;
mod terrain;
mod types;

pub use decoder::{decode_raster, MartiniDecoder, MeshDecoder};
pub use error::DecodeError;
pub use martini::{GridMesh, Martini, MartiniTile};
pub use terrain::{build_mesh, elevation_grid, mesh_attributes};
pub use types::{BoundingBox, DecodeOptions, ElevationDecoder, MeshPayload};

#[cfg(test)]
pub use decoder::tests::{mesh_with_z_range, png_raster, MockMeshDecoder};
