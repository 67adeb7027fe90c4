//! Mesh data model: decode options and decoded payloads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DecodeError;

/// Per-channel coefficients mapping raster colors to elevation.
///
/// `elevation = r * r_scaler + g * g_scaler + b * b_scaler + offset`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevationDecoder {
    pub r_scaler: f32,
    pub g_scaler: f32,
    pub b_scaler: f32,
    pub offset: f32,
}

impl ElevationDecoder {
    pub const fn new(r_scaler: f32, g_scaler: f32, b_scaler: f32, offset: f32) -> Self {
        Self {
            r_scaler,
            g_scaler,
            b_scaler,
            offset,
        }
    }

    /// Mapzen/AWS Terrarium encoding.
    pub const fn terrarium() -> Self {
        Self::new(256.0, 1.0, 1.0 / 256.0, -32768.0)
    }

    /// Mapbox Terrain-RGB encoding.
    pub const fn mapbox() -> Self {
        Self::new(6553.6, 25.6, 0.1, -10000.0)
    }

    #[inline]
    pub fn decode(&self, r: u8, g: u8, b: u8) -> f32 {
        r as f32 * self.r_scaler + g as f32 * self.g_scaler + b as f32 * self.b_scaler + self.offset
    }

    pub fn is_finite(&self) -> bool {
        self.r_scaler.is_finite()
            && self.g_scaler.is_finite()
            && self.b_scaler.is_finite()
            && self.offset.is_finite()
    }

    /// Bit patterns of the coefficients, for structural comparison and hashing.
    pub fn to_bits(&self) -> [u32; 4] {
        [
            self.r_scaler.to_bits(),
            self.g_scaler.to_bits(),
            self.b_scaler.to_bits(),
            self.offset.to_bits(),
        ]
    }
}

impl Default for ElevationDecoder {
    fn default() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }
}

impl FromStr for ElevationDecoder {
    type Err = DecodeError;

    /// Parses `terrarium`, `mapbox`, or `r,g,b,offset`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "terrarium" => return Ok(Self::terrarium()),
            "mapbox" => return Ok(Self::mapbox()),
            _ => {}
        }

        let values: Vec<f32> = s
            .split(',')
            .map(|v| v.trim().parse::<f32>())
            .collect::<Result<_, _>>()
            .map_err(|e| DecodeError::InvalidOptions(format!("elevation decoder '{}': {}", s, e)))?;

        match values.as_slice() {
            [r, g, b, offset] => Ok(Self::new(*r, *g, *b, *offset)),
            _ => Err(DecodeError::InvalidOptions(format!(
                "elevation decoder '{}' needs 4 coefficients, got {}",
                s,
                values.len()
            ))),
        }
    }
}

impl fmt::Display for ElevationDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.r_scaler, self.g_scaler, self.b_scaler, self.offset
        )
    }
}

/// Options for a single decode call.
///
/// Derived fresh from the layer props for every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeOptions {
    /// Target world box `[min_x, min_y, max_x, max_y]`; `None` keeps raster
    /// pixel space.
    pub bounds: Option<[f64; 4]>,
    /// Simplification tolerance in elevation units; 0 keeps the full grid.
    pub mesh_max_error: f32,
    pub elevation_decoder: ElevationDecoder,
}

impl DecodeOptions {
    pub fn validate(&self) -> Result<(), DecodeError> {
        if !self.mesh_max_error.is_finite() || self.mesh_max_error < 0.0 {
            return Err(DecodeError::InvalidOptions(format!(
                "mesh_max_error must be a finite value >= 0, got {}",
                self.mesh_max_error
            )));
        }
        if !self.elevation_decoder.is_finite() {
            return Err(DecodeError::InvalidOptions(
                "elevation decoder coefficients must be finite".to_string(),
            ));
        }
        if let Some(bounds) = self.bounds {
            if bounds.iter().any(|v| !v.is_finite()) {
                return Err(DecodeError::InvalidOptions(format!(
                    "bounds must be finite, got {:?}",
                    bounds
                )));
            }
        }
        Ok(())
    }
}

/// Axis-aligned 3D bounding box of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl BoundingBox {
    /// Bounding box of a stride-3 position buffer; `None` when empty.
    pub fn from_positions(positions: &[f32]) -> Option<Self> {
        let mut points = positions.chunks_exact(3);
        let first = points.next()?;
        let mut min = [first[0], first[1], first[2]];
        let mut max = min;
        for p in points {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Some(Self { min, max })
    }

    #[inline]
    pub fn min_z(&self) -> f32 {
        self.min[2]
    }

    #[inline]
    pub fn max_z(&self) -> f32 {
        self.max[2]
    }
}

/// A decoded terrain mesh.
///
/// All buffers are owned; nothing borrows from the service that produced
/// them. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshPayload {
    /// Number of distinct vertices (`positions.len() / 3`).
    pub vertex_count: u32,
    pub bounding_box: BoundingBox,
    /// Triangle list, three indices per triangle.
    pub indices: Vec<u32>,
    /// Stride-3 `x, y, z` positions.
    pub positions: Vec<f32>,
    /// Stride-2 `u, v` texture coordinates.
    pub tex_coords: Vec<f32>,
}

impl MeshPayload {
    /// Assemble a payload from raw buffers, computing the bounding box.
    pub fn from_buffers(
        indices: Vec<u32>,
        positions: Vec<f32>,
        tex_coords: Vec<f32>,
    ) -> Result<Self, DecodeError> {
        let bounding_box = BoundingBox::from_positions(&positions).ok_or(DecodeError::EmptyMesh)?;
        Ok(Self {
            vertex_count: (positions.len() / 3) as u32,
            bounding_box,
            indices,
            positions,
            tex_coords,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether every index addresses an existing vertex.
    pub fn indices_in_range(&self) -> bool {
        self.indices.iter().all(|&i| i < self.vertex_count)
    }
}
