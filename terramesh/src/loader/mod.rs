//! Tile data loading.
//!
//! For each tile, the loader projects the tile bounds into world space and
//! runs the mesh decode and the texture fetch concurrently. The two never
//! block each other and a texture failure never costs the tile its mesh.

mod payload;

pub use payload::{TileDescriptor, TilePayload};

use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::coord::{Projection, ProjectionReference, TileCoord, WebMercatorProjection};
use crate::layer::TerrainProps;
use crate::mesh::{DecodeOptions, MeshDecoder, MeshPayload};
use crate::provider::{AsyncHttpClient, UrlTemplate};
use crate::telemetry::LayerMetrics;

/// Loads tile payloads through a mesh decoder and a byte-fetch client.
pub struct TileDataLoader<D, H, P = WebMercatorProjection> {
    decoder: D,
    http_client: H,
    projection: P,
    metrics: Arc<LayerMetrics>,
}

impl<D, H> TileDataLoader<D, H, WebMercatorProjection>
where
    D: MeshDecoder,
    H: AsyncHttpClient,
{
    pub fn new(decoder: D, http_client: H) -> Self {
        Self::with_projection(decoder, http_client, WebMercatorProjection)
    }
}

impl<D, H, P> TileDataLoader<D, H, P>
where
    D: MeshDecoder,
    H: AsyncHttpClient,
    P: Projection,
{
    pub fn with_projection(decoder: D, http_client: H, projection: P) -> Self {
        Self {
            decoder,
            http_client,
            projection,
            metrics: Arc::new(LayerMetrics::new()),
        }
    }

    /// Record events into a shared metrics instance.
    pub fn with_metrics(mut self, metrics: Arc<LayerMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<LayerMetrics> {
        &self.metrics
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// World box `[min_x, min_y, max_x, max_y]` of a tile.
    ///
    /// The south-west corner gives the minimum, the north-east corner the
    /// maximum, both projected around the tile midpoint at the tile's zoom.
    pub fn bounds_world(&self, tile: &TileDescriptor) -> [f64; 4] {
        let bounds = &tile.bounds;
        let reference = ProjectionReference::for_tile(bounds, tile.coord.z);
        let bottom_left = self
            .projection
            .project_flat(bounds.west, bounds.south, &reference);
        let top_right = self
            .projection
            .project_flat(bounds.east, bounds.north, &reference);
        [bottom_left[0], bottom_left[1], top_right[0], top_right[1]]
    }

    /// Load one tile of the tiled layer.
    ///
    /// Tiles outside `[min_zoom, max_zoom]` resolve to an empty payload
    /// without touching the decoder or the network.
    pub async fn load_tile(&self, tile: &TileDescriptor, props: &TerrainProps) -> TilePayload {
        let coord = tile.coord;
        if !props.in_zoom_range(coord.z) {
            self.metrics.out_of_zoom_skipped();
            debug!(tile = %coord, "Tile outside zoom range, skipping");
            return TilePayload::default();
        }
        let Some(source) = props.elevation_data.as_ref() else {
            debug!(tile = %coord, "No elevation source, skipping");
            return TilePayload::default();
        };

        let options = props.decode_options(Some(self.bounds_world(tile)));
        self.load(coord, source, &options, props.texture.as_ref())
            .await
    }

    /// Load a batch of tiles with at most `props.max_requests` in flight.
    ///
    /// Results come back in completion order.
    pub async fn load_tiles(
        &self,
        tiles: &[TileDescriptor],
        props: &TerrainProps,
    ) -> Vec<(TileCoord, TilePayload)> {
        stream::iter(tiles)
            .map(|tile| async move { (tile.coord, self.load_tile(tile, props).await) })
            .buffer_unordered(props.max_requests.max(1))
            .collect()
            .await
    }

    /// Load the single mesh of the non-tiled mode.
    ///
    /// Returns `None` without invoking the decoder when there is no tile to
    /// load. The mesh is placed in `props.bounds`, or raster pixel space
    /// when no bounds are set.
    pub async fn load_terrain(&self, props: &TerrainProps) -> Option<TilePayload> {
        let tile = props.single_tile?;
        let source = props.elevation_data.as_ref()?;
        let options = props.decode_options(props.bounds);
        Some(
            self.load(tile, source, &options, props.texture.as_ref())
                .await,
        )
    }

    async fn load(
        &self,
        coord: TileCoord,
        source: &UrlTemplate,
        options: &DecodeOptions,
        texture: Option<&UrlTemplate>,
    ) -> TilePayload {
        let (mesh, texture) = tokio::join!(
            self.decode_mesh(coord, source, options),
            self.fetch_texture(coord, texture)
        );
        TilePayload { mesh, texture }
    }

    async fn decode_mesh(
        &self,
        coord: TileCoord,
        source: &UrlTemplate,
        options: &DecodeOptions,
    ) -> Option<Arc<MeshPayload>> {
        match self.decoder.decode(coord, source, options).await {
            Ok(mesh) => {
                self.metrics.mesh_decoded();
                Some(Arc::new(mesh))
            }
            Err(e) => {
                self.metrics.decode_failed();
                warn!(tile = %coord, error = %e, "Mesh decode failed");
                None
            }
        }
    }

    async fn fetch_texture(&self, coord: TileCoord, texture: Option<&UrlTemplate>) -> Option<Bytes> {
        let url = texture?.url_for(&coord);
        match self.http_client.get(&url).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                self.metrics.texture_failed();
                debug!(tile = %coord, url = %url, error = %e, "Texture fetch failed, using fallback color");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{tile_bounds, world_to_lng_lat, TileBounds};
    use crate::mesh::{mesh_with_z_range, DecodeError, MockMeshDecoder};
    use crate::provider::{MockAsyncHttpClient, ProviderError};

    fn props() -> TerrainProps {
        TerrainProps {
            elevation_data: Some(UrlTemplate::new("https://e.example.com/{z}/{x}/{y}.png").unwrap()),
            texture: Some(UrlTemplate::new("https://t.example.com/{z}/{x}/{y}.jpg").unwrap()),
            min_zoom: 2,
            max_zoom: Some(12),
            ..TerrainProps::default()
        }
    }

    fn loader(
        decoder: MockMeshDecoder,
        client: MockAsyncHttpClient,
    ) -> TileDataLoader<MockMeshDecoder, MockAsyncHttpClient> {
        TileDataLoader::new(decoder, client)
    }

    #[tokio::test]
    async fn test_out_of_zoom_tiles_touch_nothing() {
        let client = MockAsyncHttpClient::ok(vec![1u8]);
        let loader = loader(MockMeshDecoder::ok(mesh_with_z_range(0.0, 1.0)), client.clone());

        for coord in [TileCoord::new(0, 0, 1), TileCoord::new(0, 0, 13)] {
            let payload = loader
                .load_tile(&TileDescriptor::from_coord(coord), &props())
                .await;
            assert!(payload.is_empty());
        }

        assert_eq!(loader.decoder.call_count(), 0);
        assert_eq!(client.call_count(), 0);
        assert_eq!(loader.metrics().snapshot().out_of_zoom_skips, 2);
    }

    #[tokio::test]
    async fn test_texture_failure_keeps_mesh() {
        let client = MockAsyncHttpClient::with_response(Err(ProviderError::Status {
            status: 404,
            url: "https://t.example.com/5/3/4.jpg".to_string(),
        }));
        let loader = loader(MockMeshDecoder::ok(mesh_with_z_range(0.0, 1.0)), client.clone());

        let payload = loader
            .load_tile(&TileDescriptor::from_coord(TileCoord::new(3, 4, 5)), &props())
            .await;

        assert!(payload.mesh.is_some());
        assert!(payload.texture.is_none());
        assert_eq!(client.urls(), vec!["https://t.example.com/5/3/4.jpg".to_string()]);
        assert_eq!(loader.metrics().snapshot().texture_failures, 1);
    }

    #[tokio::test]
    async fn test_decode_failure_keeps_texture() {
        let client = MockAsyncHttpClient::ok(vec![9u8, 9, 9]);
        let loader = loader(MockMeshDecoder::failing(DecodeError::EmptyMesh), client);

        let payload = loader
            .load_tile(&TileDescriptor::from_coord(TileCoord::new(3, 4, 5)), &props())
            .await;

        assert!(payload.mesh.is_none());
        assert_eq!(payload.texture.as_deref(), Some(&[9u8, 9, 9][..]));
        assert_eq!(loader.metrics().snapshot().decode_failures, 1);
    }

    #[tokio::test]
    async fn test_no_texture_configured_skips_fetch() {
        let client = MockAsyncHttpClient::ok(vec![1u8]);
        let loader = loader(MockMeshDecoder::ok(mesh_with_z_range(0.0, 1.0)), client.clone());
        let mut props = props();
        props.texture = None;

        let payload = loader
            .load_tile(&TileDescriptor::from_coord(TileCoord::new(1, 1, 3)), &props)
            .await;
        assert!(payload.mesh.is_some());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_slow_decode_still_joins_texture() {
        let mut decoder = MockMeshDecoder::ok(mesh_with_z_range(0.0, 1.0));
        decoder.delay = Some(std::time::Duration::from_millis(50));
        let client = MockAsyncHttpClient::ok(vec![1u8]);
        let loader = loader(decoder, client.clone());

        let payload = loader
            .load_tile(&TileDescriptor::from_coord(TileCoord::new(1, 1, 3)), &props())
            .await;
        assert!(payload.mesh.is_some());
        assert!(payload.texture.is_some());
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn test_bounds_world_corners() {
        let loader = loader(
            MockMeshDecoder::ok(mesh_with_z_range(0.0, 1.0)),
            MockAsyncHttpClient::ok(vec![]),
        );
        // Whole world at zoom 0 spans the full common space.
        let world = loader.bounds_world(&TileDescriptor::from_coord(TileCoord::new(0, 0, 0)));
        for (actual, expected) in world.iter().zip([0.0, 0.0, 512.0, 512.0]) {
            assert!((actual - expected).abs() < 1e-9, "{:?}", world);
        }

        // Equator / prime meridian quadrant.
        let quadrant = TileDescriptor::new(
            TileCoord::new(1, 0, 1),
            TileBounds::new(0.0, 0.0, 180.0, crate::coord::MAX_LAT),
        );
        let world = loader.bounds_world(&quadrant);
        assert!((world[0] - 256.0).abs() < 1e-9);
        assert!((world[1] - 256.0).abs() < 1e-9);
        assert!((world[2] - 512.0).abs() < 1e-9);
        assert!((world[3] - 512.0).abs() < 1e-6);
    }

    #[test]
    fn test_bounds_world_round_trip_z10() {
        let loader = loader(
            MockMeshDecoder::ok(mesh_with_z_range(0.0, 1.0)),
            MockAsyncHttpClient::ok(vec![]),
        );
        let coord = TileCoord::new(512, 512, 10);
        let bounds = tile_bounds(&coord);
        let world = loader.bounds_world(&TileDescriptor::from_coord(coord));

        let [west, south] = world_to_lng_lat(world[0], world[1]);
        let [east, north] = world_to_lng_lat(world[2], world[3]);
        assert!((west - bounds.west).abs() < 1e-9);
        assert!((south - bounds.south).abs() < 1e-9);
        assert!((east - bounds.east).abs() < 1e-9);
        assert!((north - bounds.north).abs() < 1e-9);
        assert!(world[0] < world[2] && world[1] < world[3]);
    }

    #[tokio::test]
    async fn test_load_tiles_batch() {
        let client = MockAsyncHttpClient::ok(vec![1u8]);
        let loader = loader(MockMeshDecoder::ok(mesh_with_z_range(0.0, 1.0)), client.clone());
        let mut props = props();
        props.max_requests = 2;
        let batch: Vec<TileDescriptor> = (0..4)
            .map(|x| TileDescriptor::from_coord(TileCoord::new(x, 0, 2)))
            .collect();

        let mut results = loader.load_tiles(&batch, &props).await;
        results.sort_by_key(|(coord, _)| *coord);

        assert_eq!(results.len(), 4);
        assert_eq!(results[3].0, TileCoord::new(3, 0, 2));
        assert!(results.iter().all(|(_, p)| p.mesh.is_some()));
        assert_eq!(loader.decoder.call_count(), 4);
        assert_eq!(client.call_count(), 4);
    }

    #[tokio::test]
    async fn test_load_terrain_without_tile_skips_decoder() {
        let loader = loader(
            MockMeshDecoder::ok(mesh_with_z_range(0.0, 1.0)),
            MockAsyncHttpClient::ok(vec![]),
        );
        let props = TerrainProps {
            bounds: None,
            single_tile: None,
            ..props()
        };
        assert!(loader.load_terrain(&props).await.is_none());
        assert_eq!(loader.decoder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_load_terrain_ignores_zoom_range() {
        let loader = loader(
            MockMeshDecoder::ok(mesh_with_z_range(0.0, 1.0)),
            MockAsyncHttpClient::ok(vec![1u8]),
        );
        let props = TerrainProps {
            bounds: Some([0.0, 0.0, 10.0, 10.0]),
            single_tile: Some(TileCoord::new(0, 0, 0)),
            ..props()
        };
        let payload = loader.load_terrain(&props).await.unwrap();
        assert!(payload.mesh.is_some());
        assert_eq!(loader.decoder.call_count(), 1);
    }
}
