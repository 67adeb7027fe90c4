use std::sync::Arc;

use bytes::Bytes;

use crate::coord::{tile_bounds, TileBounds, TileCoord};
use crate::mesh::MeshPayload;

/// A tile handed over by the external tile grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileDescriptor {
    pub coord: TileCoord,
    pub bounds: TileBounds,
}

impl TileDescriptor {
    pub fn new(coord: TileCoord, bounds: TileBounds) -> Self {
        Self { coord, bounds }
    }

    /// Descriptor with bounds computed from the Web Mercator tile scheme.
    pub fn from_coord(coord: TileCoord) -> Self {
        Self {
            coord,
            bounds: tile_bounds(&coord),
        }
    }
}

/// Result of loading one tile.
///
/// `mesh` is `None` when the tile was skipped or failed to decode;
/// `texture` is `None` when no texture is configured or its fetch failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TilePayload {
    pub mesh: Option<Arc<MeshPayload>>,
    pub texture: Option<Bytes>,
}

impl TilePayload {
    /// Nothing to render.
    pub fn is_empty(&self) -> bool {
        self.mesh.is_none() && self.texture.is_none()
    }
}
