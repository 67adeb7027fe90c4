//! Terrain composite layer.
//!
//! [`TerrainLayer`] is the orchestration state machine. It owns all layer
//! state, decides between tiled and single-mesh mode, starts tile loads and
//! folds their results back in, and feeds the aggregated zRange into the
//! tile-grid configuration.
//!
//! # Concurrency
//!
//! Loads run as spawned Tokio tasks. Their results come back over a channel
//! and are applied by the layer itself ([`TerrainLayer::process_completions`]
//! or [`TerrainLayer::next_completion`]), so state has a single writer and
//! needs no lock. Every load captures the signature it was started with; a
//! result whose signature no longer matches is discarded on arrival.
//!
//! ```text
//! apply_props ──► reset / sweep ──► request_tiles ──► tokio::spawn(load_tile)
//!                                                            │
//! build_sub_layers ◄── tile cache ◄── process_completions ◄──┘ (mpsc)
//! ```

mod error;
mod grid;
mod props;
mod state;
mod sublayer;

pub use error::LayerError;
pub use grid::TileGridConfig;
pub use props::{SingleSignature, TerrainMode, TerrainProps, UpdateTriggers};
pub use state::{LayerPhase, LayerState};
pub use sublayer::{render_sub_layer, tile_sub_layer_id, RenderableSubLayer, SINGLE_SUB_LAYER_ID};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::coord::{Projection, TileCoord, WebMercatorProjection};
use crate::extent::{aggregate, ZRange, ZRangeUpdate};
use crate::loader::{TileDataLoader, TileDescriptor, TilePayload};
use crate::mesh::MeshDecoder;
use crate::provider::AsyncHttpClient;
use crate::telemetry::LayerMetrics;

/// A cached tile result and the signature it was produced under.
#[derive(Debug, Clone)]
struct LoadedTile {
    payload: TilePayload,
    triggers: UpdateTriggers,
}

/// Result delivered by a load task.
enum Completion {
    Tile {
        coord: TileCoord,
        triggers: UpdateTriggers,
        payload: TilePayload,
    },
    Single {
        request_id: u64,
        payload: Option<TilePayload>,
    },
}

/// What [`TerrainLayer::apply_props`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropsChange {
    /// Full reset: zRange cleared, mode recomputed, all tiles dropped.
    pub data_source_changed: bool,
    pub triggers_changed: bool,
    /// Cached tiles swept because their signature went stale.
    pub evicted: usize,
    /// A new single-mesh load was started.
    pub single_reload: bool,
}

/// The terrain composite layer.
///
/// Must be driven from within a Tokio runtime.
pub struct TerrainLayer<D, H, P = WebMercatorProjection> {
    loader: Arc<TileDataLoader<D, H, P>>,
    metrics: Arc<LayerMetrics>,
    props: Option<Arc<TerrainProps>>,
    state: Option<LayerState>,
    phase: LayerPhase,
    triggers: UpdateTriggers,
    tiles: HashMap<TileCoord, LoadedTile>,
    /// Signature of the newest load started per tile.
    in_flight: HashMap<TileCoord, UpdateTriggers>,
    /// Id of the newest single-mesh load; older ids are stale.
    single_request: u64,
    /// Spawned tasks whose result has not been received yet.
    pending: usize,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    cancellation: CancellationToken,
}

impl<D, H, P> TerrainLayer<D, H, P>
where
    D: MeshDecoder + 'static,
    H: AsyncHttpClient + 'static,
    P: Projection + 'static,
{
    pub fn new(loader: TileDataLoader<D, H, P>) -> Self {
        let metrics = Arc::clone(loader.metrics());
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            loader: Arc::new(loader),
            metrics,
            props: None,
            state: None,
            phase: LayerPhase::Uninitialized,
            triggers: UpdateTriggers::default(),
            tiles: HashMap::new(),
            in_flight: HashMap::new(),
            single_request: 0,
            pending: 0,
            completions_tx,
            completions_rx,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn phase(&self) -> LayerPhase {
        self.phase
    }

    pub fn state(&self) -> Option<&LayerState> {
        self.state.as_ref()
    }

    pub fn props(&self) -> Option<&TerrainProps> {
        self.props.as_deref()
    }

    pub fn z_range(&self) -> Option<ZRange> {
        self.state.as_ref().and_then(|s| s.z_range)
    }

    pub fn metrics(&self) -> &Arc<LayerMetrics> {
        &self.metrics
    }

    /// Current signature of tiled results.
    pub fn update_triggers(&self) -> &UpdateTriggers {
        &self.triggers
    }

    pub fn tile_payload(&self, coord: &TileCoord) -> Option<&TilePayload> {
        self.tiles.get(coord).map(|t| &t.payload)
    }

    pub fn loaded_tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.pending
    }

    fn is_tiled(&self) -> bool {
        self.state.as_ref().map_or(false, |s| s.is_tiled)
    }

    /// Apply a new set of props, diffing against the previously applied set.
    ///
    /// Invalid props are rejected before anything changes.
    pub fn apply_props(&mut self, props: TerrainProps) -> Result<PropsChange, LayerError> {
        props.validate()?;

        let mut change = PropsChange::default();
        let old = self.props.take();
        let triggers = props.update_triggers();
        let props = Arc::new(props);
        self.props = Some(Arc::clone(&props));

        if props.elevation_data.is_none() {
            if self.state.is_some() {
                info!("Elevation source cleared, resetting terrain layer");
                self.reset();
            }
            self.triggers = triggers;
            return Ok(change);
        }

        let data_source_changed = self.state.is_none()
            || old
                .as_ref()
                .map_or(true, |o| o.update_triggers().data_source_changed(&triggers));

        if data_source_changed {
            change.data_source_changed = true;
            self.reset();
            let is_tiled = props.mode == TerrainMode::Tiled;
            self.state = Some(LayerState::new(is_tiled));
            self.phase = if is_tiled {
                LayerPhase::TiledActive
            } else {
                LayerPhase::SingleLoading
            };
            info!(
                source = %triggers.elevation_data,
                mode = %self.phase,
                "Terrain data source applied"
            );
        } else if old.as_ref().map_or(false, |o| o.mode != props.mode) {
            debug!("Mode change takes effect with the next data source");
        }

        if triggers != self.triggers {
            change.triggers_changed = true;
            let before = self.tiles.len();
            self.tiles.retain(|_, tile| tile.triggers == triggers);
            change.evicted = before - self.tiles.len();
            if !data_source_changed {
                info!(
                    evicted = change.evicted,
                    "Update triggers changed, reloading visible tiles"
                );
            }
            self.triggers = triggers;
        }

        let zoom_changed = old
            .as_ref()
            .map_or(false, |o| (o.min_zoom, o.max_zoom) != (props.min_zoom, props.max_zoom));
        if zoom_changed && !data_source_changed {
            let before = self.tiles.len();
            self.tiles.retain(|coord, _| props.in_zoom_range(coord.z));
            self.in_flight.retain(|coord, _| props.in_zoom_range(coord.z));
            change.evicted += before - self.tiles.len();
        }

        if !self.is_tiled() {
            let reload = data_source_changed
                || old
                    .as_ref()
                    .map_or(true, |o| o.single_signature() != props.single_signature());
            if reload {
                change.single_reload = true;
                self.start_single_load(props);
            }
        }

        Ok(change)
    }

    /// Drop everything tied to the current data source.
    fn reset(&mut self) {
        self.tiles.clear();
        self.in_flight.clear();
        // Outstanding single loads become stale.
        self.single_request += 1;
        self.state = None;
        self.phase = LayerPhase::Uninitialized;
    }

    fn start_single_load(&mut self, props: Arc<TerrainProps>) {
        self.single_request += 1;
        let request_id = self.single_request;
        self.phase = LayerPhase::SingleLoading;

        let loader = Arc::clone(&self.loader);
        let tx = self.completions_tx.clone();
        let cancellation = self.cancellation.clone();
        self.pending += 1;
        debug!(request_id, "Starting single terrain load");

        tokio::spawn(async move {
            tokio::select! {
                payload = loader.load_terrain(&props) => {
                    let _ = tx.send(Completion::Single { request_id, payload });
                }
                _ = cancellation.cancelled() => {
                    debug!(request_id, "Single terrain load cancelled");
                }
            }
        });
    }

    /// Start loads for the tiles the grid wants.
    ///
    /// Tiles already cached or in flight under the current signature are
    /// skipped. Tiles outside the zoom range are skipped without being
    /// cached, so widening the range later makes them loadable. Returns the
    /// number of loads started.
    pub fn request_tiles(&mut self, tiles: &[TileDescriptor]) -> usize {
        let Some(props) = self.props.clone() else {
            return 0;
        };
        if !self.is_tiled() {
            debug!("Tile request ignored outside tiled mode");
            return 0;
        }

        let mut started = 0;
        for tile in tiles {
            let coord = tile.coord;
            if !props.in_zoom_range(coord.z) {
                self.metrics.out_of_zoom_skipped();
                debug!(tile = %coord, "Tile outside zoom range, skipping");
                continue;
            }
            if self.tiles.contains_key(&coord) || self.in_flight.get(&coord) == Some(&self.triggers)
            {
                continue;
            }

            let triggers = self.triggers.clone();
            self.in_flight.insert(coord, triggers.clone());
            self.spawn_tile_load(*tile, triggers, Arc::clone(&props));
            started += 1;
        }

        if started > 0 {
            debug!(started, in_flight = self.pending, "Requested tiles");
        }
        started
    }

    fn spawn_tile_load(
        &mut self,
        tile: TileDescriptor,
        triggers: UpdateTriggers,
        props: Arc<TerrainProps>,
    ) {
        let loader = Arc::clone(&self.loader);
        let tx = self.completions_tx.clone();
        let cancellation = self.cancellation.clone();
        self.pending += 1;
        self.metrics.tile_requested();

        tokio::spawn(async move {
            tokio::select! {
                payload = loader.load_tile(&tile, &props) => {
                    let _ = tx.send(Completion::Tile { coord: tile.coord, triggers, payload });
                }
                _ = cancellation.cancelled() => {
                    debug!(tile = %tile.coord, "Tile load cancelled");
                }
            }
        });
    }

    /// Apply every result that has already arrived.
    ///
    /// Returns the number of results accepted (stale ones excluded).
    pub fn process_completions(&mut self) -> usize {
        let mut accepted = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            if self.apply_completion(completion) {
                accepted += 1;
            }
        }
        accepted
    }

    /// Wait for the next result and apply it.
    ///
    /// Returns `None` when nothing is in flight, otherwise whether the
    /// result was accepted.
    pub async fn next_completion(&mut self) -> Option<bool> {
        if self.pending == 0 {
            return None;
        }
        let completion = self.completions_rx.recv().await?;
        Some(self.apply_completion(completion))
    }

    /// Wait until nothing is in flight. Returns the number accepted.
    pub async fn settle(&mut self) -> usize {
        let mut accepted = 0;
        while let Some(was_accepted) = self.next_completion().await {
            if was_accepted {
                accepted += 1;
            }
        }
        accepted
    }

    fn apply_completion(&mut self, completion: Completion) -> bool {
        self.pending = self.pending.saturating_sub(1);
        match completion {
            Completion::Tile {
                coord,
                triggers,
                payload,
            } => {
                let current = triggers == self.triggers
                    && self.in_flight.get(&coord) == Some(&triggers)
                    && self.is_tiled();
                if !current {
                    self.metrics.stale_discarded();
                    debug!(tile = %coord, "Discarding stale tile result");
                    return false;
                }
                self.in_flight.remove(&coord);
                self.tiles.insert(coord, LoadedTile { payload, triggers });
                true
            }
            Completion::Single {
                request_id,
                payload,
            } => {
                let current = request_id == self.single_request && !self.is_tiled();
                let Some(state) = self.state.as_mut().filter(|_| current) else {
                    self.metrics.stale_discarded();
                    debug!(request_id, "Discarding stale single terrain result");
                    return false;
                };
                let payload = payload.unwrap_or_default();
                state.terrain = payload.mesh;
                state.terrain_texture = payload.texture;
                self.phase = LayerPhase::SingleReady;
                debug!(
                    request_id,
                    has_mesh = state.terrain.is_some(),
                    "Single terrain ready"
                );
                true
            }
        }
    }

    /// Notification from the tile grid that a batch of tiles resolved.
    ///
    /// Folds their meshes into the zRange. Returns `true` when the range
    /// widened and the grid configuration must be refreshed.
    pub fn on_viewport_tiles_loaded(&mut self, tiles: &[TileCoord]) -> bool {
        let payloads = tiles
            .iter()
            .filter_map(|coord| self.tiles.get(coord))
            .map(|tile| &tile.payload);
        let Some(state) = self.state.as_ref() else {
            return false;
        };

        match aggregate(payloads, state.z_range) {
            ZRangeUpdate::Widened(range) => {
                if let Some(state) = self.state.as_mut() {
                    state.z_range = Some(range);
                }
                self.metrics.z_range_widened();
                debug!(z_range = %range, "zRange widened");
                true
            }
            ZRangeUpdate::Unchanged => false,
        }
    }

    /// Configuration for the external tile grid; `None` outside tiled mode.
    pub fn tile_grid_config(&self) -> Option<TileGridConfig> {
        let props = self.props.as_deref()?;
        if !self.is_tiled() {
            return None;
        }
        Some(TileGridConfig::new(props, self.z_range()))
    }

    /// Renderable descriptions of everything loaded.
    ///
    /// Tiles are ordered by coordinate; tiles without a mesh are omitted.
    pub fn build_sub_layers(&self) -> Vec<RenderableSubLayer> {
        let (Some(props), Some(state)) = (self.props.as_deref(), self.state.as_ref()) else {
            return Vec::new();
        };

        if state.is_tiled {
            let ordered: BTreeMap<&TileCoord, &LoadedTile> = self.tiles.iter().collect();
            ordered
                .into_iter()
                .filter_map(|(coord, tile)| {
                    render_sub_layer(tile_sub_layer_id(coord), &tile.payload, props)
                })
                .collect()
        } else {
            let payload = TilePayload {
                mesh: state.terrain.clone(),
                texture: state.terrain_texture.clone(),
            };
            render_sub_layer(SINGLE_SUB_LAYER_ID, &payload, props)
                .into_iter()
                .collect()
        }
    }

    /// Forget tiles the grid evicted. In-flight loads for them go stale.
    pub fn release_tiles(&mut self, tiles: &[TileCoord]) {
        for coord in tiles {
            self.tiles.remove(coord);
            self.in_flight.remove(coord);
        }
    }

    /// Cancel all async work and return to `Uninitialized`.
    ///
    /// Cancelled loads never deliver results. The layer can be reused by
    /// applying props again.
    pub fn teardown(&mut self) {
        self.cancellation.cancel();
        self.cancellation = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel();
        self.completions_tx = tx;
        self.completions_rx = rx;
        self.pending = 0;
        self.reset();
        self.props = None;
        self.triggers = UpdateTriggers::default();
        info!("Terrain layer torn down");
    }
}

impl<D, H, P> Drop for TerrainLayer<D, H, P> {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}
