//! Mesh decoder adapter.
//!
//! [`MeshDecoder`] is the boundary between the tile pipeline and the
//! mesh-generation service: one tile request in, one mesh (or error) out.
//! [`MartiniDecoder`] is the built-in service. It fetches the elevation raster,
//! decodes it and simplifies it on the blocking pool.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::coord::TileCoord;
use crate::provider::{AsyncHttpClient, UrlTemplate};

use super::error::DecodeError;
use super::martini::Martini;
use super::terrain::{build_mesh, elevation_grid};
use super::types::{DecodeOptions, MeshPayload};

/// Mesh-generation service.
///
/// Implementations must be thread-safe (`Send + Sync`) since tiles are
/// decoded concurrently.
pub trait MeshDecoder: Send + Sync {
    /// Decode the elevation raster of `tile` from `source` into a mesh.
    fn decode(
        &self,
        tile: TileCoord,
        source: &UrlTemplate,
        options: &DecodeOptions,
    ) -> impl Future<Output = Result<MeshPayload, DecodeError>> + Send;
}

/// RTIN decoder for RGB-encoded elevation rasters.
pub struct MartiniDecoder<H: AsyncHttpClient> {
    http_client: H,
    /// One triangle hierarchy per grid size, shared by all tiles.
    martinis: Arc<DashMap<usize, Arc<Martini>>>,
    timeout: Option<Duration>,
}

impl<H: AsyncHttpClient> MartiniDecoder<H> {
    pub fn new(http_client: H) -> Self {
        Self {
            http_client,
            martinis: Arc::new(DashMap::new()),
            timeout: None,
        }
    }

    /// Fail decodes that take longer than `timeout` (fetch included).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Number of distinct grid sizes seen so far.
    pub fn cached_grid_sizes(&self) -> usize {
        self.martinis.len()
    }

    async fn fetch_and_decode(
        &self,
        tile: TileCoord,
        source: &UrlTemplate,
        options: &DecodeOptions,
    ) -> Result<MeshPayload, DecodeError> {
        let started = Instant::now();
        let url = source.url_for(&tile);
        let raster = self.http_client.get(&url).await?;

        let martinis = Arc::clone(&self.martinis);
        let options = options.clone();
        let mesh = tokio::task::spawn_blocking(move || decode_raster(&martinis, &raster, &options))
            .await
            .map_err(|e| DecodeError::Worker(e.to_string()))??;

        debug!(
            tile = %tile,
            vertices = mesh.vertex_count,
            triangles = mesh.triangle_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Decoded terrain mesh"
        );
        Ok(mesh)
    }
}

impl<H: AsyncHttpClient> MeshDecoder for MartiniDecoder<H> {
    async fn decode(
        &self,
        tile: TileCoord,
        source: &UrlTemplate,
        options: &DecodeOptions,
    ) -> Result<MeshPayload, DecodeError> {
        options.validate()?;

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetch_and_decode(tile, source, options))
                .await
                .map_err(|_| DecodeError::Timeout(limit))?,
            None => self.fetch_and_decode(tile, source, options).await,
        }
    }
}

/// Decode an encoded raster (PNG, JPEG, WebP) into a mesh.
pub fn decode_raster(
    martinis: &DashMap<usize, Arc<Martini>>,
    raster: &[u8],
    options: &DecodeOptions,
) -> Result<MeshPayload, DecodeError> {
    let image = image::load_from_memory(raster)
        .map_err(|e| DecodeError::Raster(e.to_string()))?
        .to_rgb8();

    let (width, height) = image.dimensions();
    if width != height {
        return Err(DecodeError::Raster(format!(
            "expected a square raster, got {}x{}",
            width, height
        )));
    }

    let tile_size = width as usize;
    let grid_size = tile_size + 1;
    let martini = martinis
        .entry(grid_size)
        .or_try_insert_with(|| Martini::new(grid_size).map(Arc::new))?
        .value()
        .clone();

    let terrain = elevation_grid(image.as_raw(), tile_size, 3, &options.elevation_decoder)?;
    build_mesh(&martini, terrain, options)
}
