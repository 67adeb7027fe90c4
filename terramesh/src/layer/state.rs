use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::extent::ZRange;
use crate::mesh::MeshPayload;

/// Lifecycle phase of a terrain layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerPhase {
    /// No data source applied yet, or torn down.
    Uninitialized,
    /// Tiles are loaded on demand by the tile grid.
    TiledActive,
    /// A single-mesh load is in flight.
    SingleLoading,
    /// The single mesh (or its failure) has arrived.
    SingleReady,
}

impl fmt::Display for LayerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerPhase::Uninitialized => "uninitialized",
            LayerPhase::TiledActive => "tiled",
            LayerPhase::SingleLoading => "single (loading)",
            LayerPhase::SingleReady => "single (ready)",
        };
        f.write_str(name)
    }
}

/// Mutable state owned by the layer.
///
/// Created on the first data source, replaced on every data source change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerState {
    pub is_tiled: bool,
    /// Single-mode mesh; always `None` in tiled mode.
    pub terrain: Option<Arc<MeshPayload>>,
    pub terrain_texture: Option<Bytes>,
    pub z_range: Option<ZRange>,
}

impl LayerState {
    pub fn new(is_tiled: bool) -> Self {
        Self {
            is_tiled,
            ..Self::default()
        }
    }
}
