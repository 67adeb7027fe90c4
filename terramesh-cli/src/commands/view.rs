//! View command - drive the tiled layer over a small viewport.
//!
//! Stands in for the external tile grid: picks the tiles around a point,
//! requests them through [`TerrainLayer`], waits for the batch and reports
//! the resulting sub-layers and zRange.

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use terramesh::coord::{to_tile_coords, TileCoord};
use terramesh::layer::{TerrainLayer, TerrainMode};
use terramesh::loader::{TileDataLoader, TileDescriptor};
use terramesh::mesh::{MartiniDecoder, MeshDecoder};
use terramesh::provider::AsyncHttpClient;

use super::common::{print_metrics, resolve_props, SourceArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the view command.
#[derive(Debug, Args)]
pub struct ViewCommand {
    /// Viewport centre latitude
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Viewport centre longitude
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Zoom level
    #[arg(long, default_value_t = 12)]
    pub zoom: u8,

    /// Tiles around the centre tile to load in each direction
    #[arg(long, default_value_t = 1)]
    pub radius: u32,

    #[command(flatten)]
    pub source: SourceArgs,
}

/// Tiles within `radius` of `center`, clipped to the world.
pub fn viewport_tiles(center: TileCoord, radius: u32) -> Vec<TileCoord> {
    let max_index = (1u32 << center.z) - 1;
    let x_range = center.x.saturating_sub(radius)..=center.x.saturating_add(radius).min(max_index);
    let y_range = center.y.saturating_sub(radius)..=center.y.saturating_add(radius).min(max_index);

    y_range
        .flat_map(|y| x_range.clone().map(move |x| TileCoord::new(x, y, center.z)))
        .collect()
}

/// Request `tiles` the way the tile grid does, keeping at most
/// `max_requests` loads in flight.
pub async fn load_viewport<D, H>(
    layer: &mut TerrainLayer<D, H>,
    tiles: &[TileDescriptor],
    progress: &ProgressBar,
) where
    D: MeshDecoder + 'static,
    H: AsyncHttpClient + 'static,
{
    let max_requests = layer
        .tile_grid_config()
        .map_or(1, |grid| grid.max_requests)
        .max(1);
    let mut queued = tiles.iter();
    let mut exhausted = false;

    loop {
        while !exhausted && layer.in_flight_count() < max_requests {
            match queued.next() {
                Some(tile) => {
                    // skipped tiles (out of zoom, already loaded) count as done
                    if layer.request_tiles(std::slice::from_ref(tile)) == 0 {
                        progress.inc(1);
                    }
                }
                None => exhausted = true,
            }
        }
        match layer.next_completion().await {
            Some(_) => progress.inc(1),
            None if exhausted => break,
            None => {}
        }
    }
}

/// Run the view command.
pub fn run(runner: &CliRunner, args: ViewCommand) -> Result<(), CliError> {
    runner.log_startup("view");
    let mut props = resolve_props(&args.source, runner.config())?;
    props.mode = TerrainMode::Tiled;

    let center = to_tile_coords(args.lat, args.lon, args.zoom)?;
    let coords = viewport_tiles(center, args.radius);
    let tiles: Vec<TileDescriptor> = coords.iter().copied().map(TileDescriptor::from_coord).collect();

    let http = runner.http_client()?;
    let loader = TileDataLoader::new(MartiniDecoder::new(http.clone()), http);
    let runtime = runner.runtime()?;

    runtime.block_on(async {
        let mut layer = TerrainLayer::new(loader);
        layer.apply_props(props)?;

        let progress = ProgressBar::new(tiles.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} tiles {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        load_viewport(&mut layer, &tiles, &progress).await;
        progress.finish_with_message("loaded");

        let widened = layer.on_viewport_tiles_loaded(&coords);

        println!();
        println!("Viewport around {} ({} tiles)", center, coords.len());
        println!("==========================");
        for sub_layer in layer.build_sub_layers() {
            println!(
                "  {:<20} {:>6} vertices  {:>6} triangles  z [{:.1}, {:.1}]{}",
                sub_layer.id,
                sub_layer.mesh.vertex_count,
                sub_layer.mesh.triangle_count(),
                sub_layer.mesh.bounding_box.min_z(),
                sub_layer.mesh.bounding_box.max_z(),
                if sub_layer.is_textured() { "  textured" } else { "" }
            );
        }
        println!();
        match layer.z_range() {
            Some(range) if widened => println!("  zRange:    {} (grid refreshed)", range),
            Some(range) => println!("  zRange:    {}", range),
            None => println!("  zRange:    (no elevation data)"),
        }
        print_metrics(&layer.metrics().snapshot());
        Ok::<(), CliError>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use terramesh::layer::TerrainProps;
    use terramesh::mesh::{DecodeError, DecodeOptions, MeshPayload};
    use terramesh::provider::{AsyncReqwestClient, UrlTemplate};

    /// Decoder that records how many decodes overlap.
    #[derive(Default)]
    struct ConcurrencyDecoder {
        active: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
        calls: Arc<AtomicUsize>,
    }

    impl MeshDecoder for ConcurrencyDecoder {
        async fn decode(
            &self,
            _tile: TileCoord,
            _source: &UrlTemplate,
            _options: &DecodeOptions,
        ) -> Result<MeshPayload, DecodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            MeshPayload::from_buffers(
                vec![0, 1, 2],
                vec![0.0, 0.0, 1.0, 1.0, 0.0, 2.0, 0.0, 1.0, 3.0],
                vec![0.0, 1.0, 1.0, 1.0, 0.0, 0.0],
            )
        }
    }

    #[tokio::test]
    async fn test_load_viewport_respects_max_requests() {
        let decoder = ConcurrencyDecoder::default();
        let (peak, calls) = (Arc::clone(&decoder.peak), Arc::clone(&decoder.calls));
        let http = AsyncReqwestClient::new().unwrap();
        let mut layer = TerrainLayer::new(TileDataLoader::new(decoder, http));

        let props = TerrainProps {
            elevation_data: Some(UrlTemplate::new("https://e.example.com/{z}/{x}/{y}.png").unwrap()),
            max_requests: 2,
            ..TerrainProps::default()
        };
        layer.apply_props(props).unwrap();

        let tiles: Vec<TileDescriptor> = viewport_tiles(TileCoord::new(10, 10, 5), 1)
            .into_iter()
            .map(TileDescriptor::from_coord)
            .collect();
        let progress = ProgressBar::hidden();
        load_viewport(&mut layer, &tiles, &progress).await;

        assert_eq!(calls.load(Ordering::SeqCst), 9);
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(layer.loaded_tile_count(), 9);
        assert_eq!(progress.position(), 9);
    }

    #[test]
    fn test_viewport_tiles_interior() {
        let tiles = viewport_tiles(TileCoord::new(10, 20, 6), 1);
        assert_eq!(tiles.len(), 9);
        assert_eq!(tiles[0], TileCoord::new(9, 19, 6));
        assert_eq!(tiles[8], TileCoord::new(11, 21, 6));
    }

    #[test]
    fn test_viewport_tiles_clipped_at_corner() {
        let tiles = viewport_tiles(TileCoord::new(0, 0, 1), 2);
        assert_eq!(tiles.len(), 4);
        assert!(tiles.iter().all(|t| t.x <= 1 && t.y <= 1));
    }

    #[test]
    fn test_viewport_tiles_zoom_zero() {
        assert_eq!(viewport_tiles(TileCoord::new(0, 0, 0), 3), vec![TileCoord::new(0, 0, 0)]);
    }
}
