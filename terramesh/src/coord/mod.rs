//! Coordinate conversion module
//!
//! Provides tile → geographic bounds conversion and the flat Web Mercator
//! projection used to place tile meshes in world space.
//!
//! World space follows the common-space convention of 512 units across the
//! whole world at zoom 0, with `y` growing northward.

mod types;

pub use types::{CoordError, TileBounds, TileCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON};

use std::f64::consts::{FRAC_PI_4, PI};

/// Size of the world in projected units at zoom 0.
pub const WORLD_SIZE: f64 = 512.0;

/// Reference view used when projecting a tile.
///
/// The loader builds one per tile, centred on the tile midpoint at the
/// tile's zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionReference {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
}

impl ProjectionReference {
    /// Reference centred on the midpoint of `bounds` at zoom `z`.
    pub fn for_tile(bounds: &TileBounds, z: u8) -> Self {
        let (longitude, latitude) = bounds.center();
        Self {
            longitude,
            latitude,
            zoom: z as f64,
        }
    }
}

/// Geographic → world projection supplied by the hosting map.
pub trait Projection: Send + Sync {
    /// Project `(lon, lat)` in degrees to world `(x, y)`.
    fn project_flat(&self, lon: f64, lat: f64, reference: &ProjectionReference) -> [f64; 2];

    /// Inverse of [`Projection::project_flat`].
    fn unproject_flat(&self, x: f64, y: f64, reference: &ProjectionReference) -> [f64; 2];
}

/// Spherical Web Mercator in common space.
///
/// Flat projection does not depend on the reference view; the reference is
/// accepted so that view-relative projections can share the trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercatorProjection;

impl Projection for WebMercatorProjection {
    fn project_flat(&self, lon: f64, lat: f64, _reference: &ProjectionReference) -> [f64; 2] {
        lng_lat_to_world(lon, lat)
    }

    fn unproject_flat(&self, x: f64, y: f64, _reference: &ProjectionReference) -> [f64; 2] {
        world_to_lng_lat(x, y)
    }
}

/// Converts geographic coordinates to world coordinates.
///
/// Latitude is clamped to the Web Mercator range so the poles stay finite.
#[inline]
pub fn lng_lat_to_world(lon: f64, lat: f64) -> [f64; 2] {
    let lambda = lon.to_radians();
    let phi = lat.clamp(MIN_LAT, MAX_LAT).to_radians();
    let x = WORLD_SIZE * (lambda + PI) / (2.0 * PI);
    let y = WORLD_SIZE * (PI + (FRAC_PI_4 + phi * 0.5).tan().ln()) / (2.0 * PI);
    [x, y]
}

/// Converts world coordinates back to `[lon, lat]` in degrees.
#[inline]
pub fn world_to_lng_lat(x: f64, y: f64) -> [f64; 2] {
    let lambda = (x / WORLD_SIZE) * (2.0 * PI) - PI;
    let phi = 2.0 * (((y / WORLD_SIZE) * (2.0 * PI) - PI).exp().atan() - FRAC_PI_4);
    [lambda.to_degrees(), phi.to_degrees()]
}

/// Converts tile coordinates to the latitude/longitude of the tile's
/// northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    let n = tile.tiles_per_axis();
    let lon = tile.x as f64 / n * 360.0 - 180.0;
    let lat = row_to_lat(tile.y as f64, n);
    (lat, lon)
}

/// Computes the geographic bounding box of a tile.
pub fn tile_bounds(tile: &TileCoord) -> TileBounds {
    let n = tile.tiles_per_axis();
    TileBounds {
        west: tile.x as f64 / n * 360.0 - 180.0,
        east: (tile.x as f64 + 1.0) / n * 360.0 - 180.0,
        north: row_to_lat(tile.y as f64, n),
        south: row_to_lat(tile.y as f64 + 1.0, n),
    }
}

/// Converts geographic coordinates to the tile containing them.
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);
    let max_index = n - 1.0;
    let x = ((lon + 180.0) / 360.0 * n).floor().min(max_index) as u32;
    let lat_rad = lat.to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n)
        .floor()
        .clamp(0.0, max_index) as u32;

    Ok(TileCoord { x, y, z: zoom })
}

#[inline]
fn row_to_lat(row: f64, n: f64) -> f64 {
    (PI * (1.0 - 2.0 * row / n)).sinh().atan().to_degrees()
}
