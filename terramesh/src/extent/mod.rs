//! Extent aggregation across loaded tiles.
//!
//! The vertical range (zRange) of all loaded terrain only ever widens while
//! tiles stream in. Narrowing it would make the depth bounds jump as tiles
//! arrive, so only an explicit reset (a new data source) clears it.

use std::fmt;

use serde::Serialize;

use crate::loader::TilePayload;

/// Closed elevation interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZRange {
    pub min: f32,
    pub max: f32,
}

impl ZRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Whether `other` lies entirely within this range.
    pub fn contains(&self, other: &ZRange) -> bool {
        other.min >= self.min && other.max <= self.max
    }

    /// Smallest range covering both.
    pub fn union(&self, other: &ZRange) -> ZRange {
        ZRange {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

impl fmt::Display for ZRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Outcome of feeding a batch of payloads to [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZRangeUpdate {
    /// The range widened; consumers must re-render with the new value.
    Widened(ZRange),
    /// Nothing to do.
    Unchanged,
}

/// Combine the meshes of `payloads` into `current`.
///
/// Payloads without a mesh are ignored. The result is `Widened` only if the
/// batch reaches below `current.min` or above `current.max` (or there was
/// no range yet).
pub fn aggregate<'a, I>(payloads: I, current: Option<ZRange>) -> ZRangeUpdate
where
    I: IntoIterator<Item = &'a TilePayload>,
{
    let batch = payloads
        .into_iter()
        .filter_map(|payload| payload.mesh.as_deref())
        .map(|mesh| ZRange::new(mesh.bounding_box.min_z(), mesh.bounding_box.max_z()))
        .reduce(|a, b| a.union(&b));

    let Some(batch) = batch else {
        return ZRangeUpdate::Unchanged;
    };

    match current {
        None => ZRangeUpdate::Widened(batch),
        Some(current) if current.contains(&batch) => ZRangeUpdate::Unchanged,
        Some(current) => ZRangeUpdate::Widened(current.union(&batch)),
    }
}
