use std::sync::Arc;

use bytes::Bytes;

use crate::coord::TileCoord;
use crate::loader::TilePayload;
use crate::mesh::MeshPayload;

use super::props::TerrainProps;

/// Id of the single-mode sub-layer.
pub const SINGLE_SUB_LAYER_ID: &str = "terrain";

/// Everything a renderer needs to draw one mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableSubLayer {
    /// Stable id: `tiles-{z}-{x}-{y}` or `terrain`.
    pub id: String,
    pub mesh: Arc<MeshPayload>,
    /// Encoded texture raster; drawn with `color` when absent.
    pub texture: Option<Bytes>,
    pub color: [u8; 3],
    pub wireframe: bool,
    pub material: bool,
}

impl RenderableSubLayer {
    pub fn is_textured(&self) -> bool {
        self.texture.is_some()
    }
}

/// Sub-layer id of a tile.
pub fn tile_sub_layer_id(coord: &TileCoord) -> String {
    format!("tiles-{}-{}-{}", coord.z, coord.x, coord.y)
}

/// Describe one resolved payload for the renderer.
///
/// Payloads without a mesh render as gaps and yield `None`.
pub fn render_sub_layer(
    id: impl Into<String>,
    payload: &TilePayload,
    props: &TerrainProps,
) -> Option<RenderableSubLayer> {
    let mesh = payload.mesh.clone()?;
    Some(RenderableSubLayer {
        id: id.into(),
        mesh,
        texture: payload.texture.clone(),
        color: props.color,
        wireframe: props.wireframe,
        material: props.material,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::mesh_with_z_range;

    #[test]
    fn test_tile_id() {
        assert_eq!(tile_sub_layer_id(&TileCoord::new(3, 7, 4)), "tiles-4-3-7");
    }

    #[test]
    fn test_missing_mesh_renders_nothing() {
        let payload = TilePayload {
            mesh: None,
            texture: Some(Bytes::from_static(b"jpg")),
        };
        assert!(render_sub_layer("x", &payload, &TerrainProps::default()).is_none());
    }

    #[test]
    fn test_untextured_uses_fallback_color() {
        let payload = TilePayload {
            mesh: Some(Arc::new(mesh_with_z_range(0.0, 1.0))),
            texture: None,
        };
        let props = TerrainProps {
            color: [10, 20, 30],
            wireframe: true,
            ..TerrainProps::default()
        };
        let sub_layer = render_sub_layer(SINGLE_SUB_LAYER_ID, &payload, &props).unwrap();
        assert_eq!(sub_layer.id, "terrain");
        assert!(!sub_layer.is_textured());
        assert_eq!(sub_layer.color, [10, 20, 30]);
        assert!(sub_layer.wireframe);
        assert!(sub_layer.material);
    }
}
