use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by every component of one terrain layer.
///
/// Clone the surrounding `Arc` for each component that records events.
#[derive(Debug, Default)]
pub struct LayerMetrics {
    tiles_requested: AtomicU64,
    meshes_decoded: AtomicU64,
    decode_failures: AtomicU64,
    texture_failures: AtomicU64,
    out_of_zoom_skips: AtomicU64,
    stale_discarded: AtomicU64,
    z_range_widenings: AtomicU64,
}

impl LayerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tile_requested(&self) {
        self.tiles_requested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mesh_decoded(&self) {
        self.meshes_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decode_failed(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn texture_failed(&self) {
        self.texture_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn out_of_zoom_skipped(&self) {
        self.out_of_zoom_skips.fetch_add(1, Ordering::Relaxed);
    }

    /// A superseded async result arrived and was dropped.
    pub fn stale_discarded(&self) {
        self.stale_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn z_range_widened(&self) {
        self.z_range_widenings.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tiles_requested: self.tiles_requested.load(Ordering::Relaxed),
            meshes_decoded: self.meshes_decoded.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            texture_failures: self.texture_failures.load(Ordering::Relaxed),
            out_of_zoom_skips: self.out_of_zoom_skips.load(Ordering::Relaxed),
            stale_discarded: self.stale_discarded.load(Ordering::Relaxed),
            z_range_widenings: self.z_range_widenings.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`LayerMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub tiles_requested: u64,
    pub meshes_decoded: u64,
    pub decode_failures: u64,
    pub texture_failures: u64,
    pub out_of_zoom_skips: u64,
    pub stale_discarded: u64,
    pub z_range_widenings: u64,
}

impl MetricsSnapshot {
    /// Fraction of requested tiles that produced a mesh.
    pub fn decode_success_rate(&self) -> f64 {
        if self.tiles_requested == 0 {
            return 0.0;
        }
        self.meshes_decoded as f64 / self.tiles_requested as f64
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tiles: {} requested, {} decoded, {} failed, {} skipped (zoom) | \
             textures failed: {} | stale discarded: {} | zRange widened: {}",
            self.tiles_requested,
            self.meshes_decoded,
            self.decode_failures,
            self.out_of_zoom_skips,
            self.texture_failures,
            self.stale_discarded,
            self.z_range_widenings
        )
    }
}
