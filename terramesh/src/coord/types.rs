//! Coordinate types for the quad-tree tiling scheme.

use std::fmt;

use thiserror::Error;

/// Maximum latitude representable in Web Mercator (degrees).
pub const MAX_LAT: f64 = 85.051_128_779_806_59;

/// Minimum latitude representable in Web Mercator (degrees).
pub const MIN_LAT: f64 = -MAX_LAT;

/// Minimum longitude (degrees).
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude (degrees).
pub const MAX_LON: f64 = 180.0;

/// Highest zoom level accepted by [`TileCoord::try_new`].
pub const MAX_ZOOM: u8 = 24;

/// Errors produced by coordinate validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude outside the Web Mercator range.
    #[error("Invalid latitude: {0}")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180].
    #[error("Invalid longitude: {0}")]
    InvalidLongitude(f64),

    /// Zoom level above [`MAX_ZOOM`].
    #[error("Invalid zoom level: {0}")]
    InvalidZoom(u8),

    /// Column or row does not exist at the given zoom.
    #[error("Tile {x}/{y} does not exist at zoom {z}")]
    OutOfRange { x: u32, y: u32, z: u8 },
}

/// A quad-tree tile identifier.
///
/// `x` grows eastward and `y` grows southward, both in `0..2^z`.
/// Issued by the external tiling system and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Column (west to east)
    pub x: u32,
    /// Row (north to south)
    pub y: u32,
    /// Zoom level
    pub z: u8,
}

impl TileCoord {
    /// Create a tile coordinate without validation.
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Create a tile coordinate, checking that it exists at its zoom level.
    pub fn try_new(x: u32, y: u32, z: u8) -> Result<Self, CoordError> {
        if z > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(z));
        }
        let n = 1u64 << z;
        if u64::from(x) >= n || u64::from(y) >= n {
            return Err(CoordError::OutOfRange { x, y, z });
        }
        Ok(Self { x, y, z })
    }

    /// Number of tiles along one axis at this tile's zoom level.
    #[inline]
    pub fn tiles_per_axis(&self) -> f64 {
        2.0_f64.powi(self.z as i32)
    }

    /// Row index in TMS convention (row 0 at the south edge).
    #[inline]
    pub fn tms_y(&self) -> u32 {
        ((1u64 << self.z) - 1 - u64::from(self.y)) as u32
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Geographic bounding box of a tile, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl TileBounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Midpoint of the box as (longitude, latitude).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.west + self.east) / 2.0,
            (self.south + self.north) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_new_accepts_valid_tile() {
        let tile = TileCoord::try_new(512, 511, 10).unwrap();
        assert_eq!(tile, TileCoord::new(512, 511, 10));
    }

    #[test]
    fn test_try_new_rejects_out_of_range() {
        assert!(matches!(
            TileCoord::try_new(4, 0, 2),
            Err(CoordError::OutOfRange { x: 4, y: 0, z: 2 })
        ));
        assert!(matches!(
            TileCoord::try_new(0, 0, 30),
            Err(CoordError::InvalidZoom(30))
        ));
    }

    #[test]
    fn test_tms_row_flip() {
        assert_eq!(TileCoord::new(0, 0, 3).tms_y(), 7);
        assert_eq!(TileCoord::new(0, 7, 3).tms_y(), 0);
        assert_eq!(TileCoord::new(0, 0, 0).tms_y(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(TileCoord::new(3, 5, 4).to_string(), "4/3/5");
    }

    #[test]
    fn test_bounds_center() {
        let bounds = TileBounds::new(-10.0, 20.0, 10.0, 40.0);
        assert_eq!(bounds.center(), (0.0, 30.0));
    }
}
