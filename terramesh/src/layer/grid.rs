use crate::extent::ZRange;

use super::props::{TerrainProps, UpdateTriggers};

/// Settings handed to the external tile grid.
///
/// The grid decides which tiles are visible and how many requests run at
/// once; `z_range` keeps its culling consistent with the terrain loaded
/// so far.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGridConfig {
    pub tile_size: u32,
    pub min_zoom: u8,
    pub max_zoom: Option<u8>,
    pub extent: Option<[f64; 4]>,
    pub max_requests: usize,
    pub z_range: Option<ZRange>,
    pub update_triggers: UpdateTriggers,
}

impl TileGridConfig {
    pub fn new(props: &TerrainProps, z_range: Option<ZRange>) -> Self {
        Self {
            tile_size: props.tile_size,
            min_zoom: props.min_zoom,
            max_zoom: props.max_zoom,
            extent: props.extent,
            max_requests: props.max_requests,
            z_range,
            update_triggers: props.update_triggers(),
        }
    }
}
