//! Right-triangulated irregular network (RTIN) mesh simplification.
//!
//! A square height grid of `2^n + 1` samples per side is recursively split
//! into right triangles. Each split point stores the largest interpolation
//! error of its subtree; extracting a mesh descends only where that error
//! exceeds the requested tolerance.
//!
//! [`Martini`] holds the triangle index structure for one grid size and is
//! shared between tiles; [`MartiniTile`] holds the per-tile error map.

use super::error::DecodeError;

/// Triangle hierarchy for a fixed grid size.
#[derive(Debug)]
pub struct Martini {
    grid_size: usize,
    num_triangles: usize,
    num_parent_triangles: usize,
    /// `ax, ay, bx, by` of every triangle's hypotenuse, four entries each.
    coords: Vec<u32>,
}

impl Martini {
    /// Build the triangle hierarchy for a `grid_size × grid_size` grid.
    pub fn new(grid_size: usize) -> Result<Self, DecodeError> {
        let tile_size = grid_size
            .checked_sub(1)
            .filter(|size| *size >= 2 && size.is_power_of_two())
            .ok_or(DecodeError::InvalidGridSize(grid_size as u32))?;

        let num_triangles = tile_size * tile_size * 2 - 2;
        let num_parent_triangles = num_triangles - tile_size * tile_size;
        let mut coords = vec![0u32; num_triangles * 4];
        let size = tile_size as u32;

        for i in 0..num_triangles {
            let mut id = i + 2;
            let (mut ax, mut ay, mut bx, mut by, mut cx, mut cy) = (0u32, 0u32, 0u32, 0u32, 0u32, 0u32);
            if id & 1 == 1 {
                // bottom-left root triangle
                bx = size;
                by = size;
                cx = size;
            } else {
                // top-right root triangle
                ax = size;
                ay = size;
                cy = size;
            }

            id >>= 1;
            while id > 1 {
                let mx = (ax + bx) >> 1;
                let my = (ay + by) >> 1;
                if id & 1 == 1 {
                    // left half
                    bx = ax;
                    by = ay;
                    ax = cx;
                    ay = cy;
                } else {
                    // right half
                    ax = bx;
                    ay = by;
                    bx = cx;
                    by = cy;
                }
                cx = mx;
                cy = my;
                id >>= 1;
            }

            let k = i * 4;
            coords[k] = ax;
            coords[k + 1] = ay;
            coords[k + 2] = bx;
            coords[k + 3] = by;
        }

        Ok(Self {
            grid_size,
            num_triangles,
            num_parent_triangles,
            coords,
        })
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Compute the error map of a height grid.
    ///
    /// `terrain` must hold `grid_size²` samples in row-major order.
    pub fn create_tile(&self, terrain: Vec<f32>) -> Result<MartiniTile<'_>, DecodeError> {
        let expected = self.grid_size * self.grid_size;
        if terrain.len() != expected {
            return Err(DecodeError::Raster(format!(
                "Expected terrain data of length {} ({} x {}), got {}",
                expected,
                self.grid_size,
                self.grid_size,
                terrain.len()
            )));
        }

        let mut tile = MartiniTile {
            martini: self,
            errors: vec![0.0; terrain.len()],
            terrain,
        };
        tile.update();
        Ok(tile)
    }
}

/// Height grid plus its error map.
#[derive(Debug)]
pub struct MartiniTile<'a> {
    martini: &'a Martini,
    terrain: Vec<f32>,
    errors: Vec<f32>,
}

/// Simplified mesh in grid space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridMesh {
    /// Grid `x, y` pairs, one per vertex.
    pub vertices: Vec<u32>,
    /// Triangle list of vertex indices.
    pub triangles: Vec<u32>,
}

impl GridMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 2
    }
}

impl<'a> MartiniTile<'a> {
    pub fn terrain(&self) -> &[f32] {
        &self.terrain
    }

    fn update(&mut self) {
        let martini = self.martini;
        let size = martini.grid_size;
        let coords = &martini.coords;
        let terrain = &self.terrain;
        let errors = &mut self.errors;

        // Bottom-up so that children are resolved before parents.
        for i in (0..martini.num_triangles).rev() {
            let k = i * 4;
            let ax = coords[k] as usize;
            let ay = coords[k + 1] as usize;
            let bx = coords[k + 2] as usize;
            let by = coords[k + 3] as usize;
            let mx = (ax + bx) >> 1;
            let my = (ay + by) >> 1;
            let cx = mx + my - ay;
            let cy = my + ax - mx;

            let interpolated = (terrain[ay * size + ax] + terrain[by * size + bx]) / 2.0;
            let middle = my * size + mx;
            let middle_error = (interpolated - terrain[middle]).abs();
            errors[middle] = errors[middle].max(middle_error);

            if i < martini.num_parent_triangles {
                let left = ((ay + cy) >> 1) * size + ((ax + cx) >> 1);
                let right = ((by + cy) >> 1) * size + ((bx + cx) >> 1);
                errors[middle] = errors[middle].max(errors[left]).max(errors[right]);
            }
        }
    }

    /// Extract a mesh whose vertical error stays within `max_error`.
    pub fn mesh(&self, max_error: f32) -> GridMesh {
        let size = self.martini.grid_size;
        let max = (size - 1) as i64;
        let mut builder = MeshBuilder {
            size,
            errors: &self.errors,
            max_error,
            indices: vec![0; size * size],
            vertices: Vec::new(),
            triangles: Vec::new(),
            num_vertices: 0,
            num_triangles: 0,
        };

        builder.count(0, 0, max, max, max, 0);
        builder.count(max, max, 0, 0, 0, max);

        builder.vertices = vec![0; builder.num_vertices as usize * 2];
        builder.triangles = Vec::with_capacity(builder.num_triangles * 3);

        builder.process(0, 0, max, max, max, 0);
        builder.process(max, max, 0, 0, 0, max);

        GridMesh {
            vertices: builder.vertices,
            triangles: builder.triangles,
        }
    }
}

struct MeshBuilder<'e> {
    size: usize,
    errors: &'e [f32],
    max_error: f32,
    /// 1-based vertex index per grid cell, 0 when unused.
    indices: Vec<u32>,
    vertices: Vec<u32>,
    triangles: Vec<u32>,
    num_vertices: u32,
    num_triangles: usize,
}

impl MeshBuilder<'_> {
    #[inline]
    fn cell(&self, x: i64, y: i64) -> usize {
        y as usize * self.size + x as usize
    }

    #[inline]
    fn should_split(&self, ax: i64, ay: i64, bx: i64, by: i64, cx: i64, cy: i64) -> bool {
        let mx = (ax + bx) >> 1;
        let my = (ay + by) >> 1;
        (ax - cx).abs() + (ay - cy).abs() > 1 && self.errors[self.cell(mx, my)] > self.max_error
    }

    fn count(&mut self, ax: i64, ay: i64, bx: i64, by: i64, cx: i64, cy: i64) {
        if self.should_split(ax, ay, bx, by, cx, cy) {
            let mx = (ax + bx) >> 1;
            let my = (ay + by) >> 1;
            self.count(cx, cy, ax, ay, mx, my);
            self.count(bx, by, cx, cy, mx, my);
        } else {
            for (x, y) in [(ax, ay), (bx, by), (cx, cy)] {
                let cell = self.cell(x, y);
                if self.indices[cell] == 0 {
                    self.num_vertices += 1;
                    self.indices[cell] = self.num_vertices;
                }
            }
            self.num_triangles += 1;
        }
    }

    fn process(&mut self, ax: i64, ay: i64, bx: i64, by: i64, cx: i64, cy: i64) {
        if self.should_split(ax, ay, bx, by, cx, cy) {
            let mx = (ax + bx) >> 1;
            let my = (ay + by) >> 1;
            self.process(cx, cy, ax, ay, mx, my);
            self.process(bx, by, cx, cy, mx, my);
        } else {
            for (x, y) in [(ax, ay), (bx, by), (cx, cy)] {
                let vertex = self.indices[self.cell(x, y)] - 1;
                self.vertices[2 * vertex as usize] = x as u32;
                self.vertices[2 * vertex as usize + 1] = y as u32;
                self.triangles.push(vertex);
            }
        }
    }
}
