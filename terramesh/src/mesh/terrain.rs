//! Elevation raster → height grid → mesh buffers.

use super::error::DecodeError;
use super::martini::{GridMesh, Martini};
use super::types::{DecodeOptions, ElevationDecoder, MeshPayload};

/// Convert an RGB raster into a `(tile_size + 1)²` height grid.
///
/// `pixels` holds `tile_size²` pixels with `stride` bytes each (3 for RGB,
/// 4 for RGBA). The extra bottom row and right column are back-filled from
/// their neighbours.
pub fn elevation_grid(
    pixels: &[u8],
    tile_size: usize,
    stride: usize,
    decoder: &ElevationDecoder,
) -> Result<Vec<f32>, DecodeError> {
    let expected = tile_size * tile_size * stride;
    if pixels.len() != expected {
        return Err(DecodeError::Raster(format!(
            "expected {} bytes for a {}x{} raster, got {}",
            expected,
            tile_size,
            tile_size,
            pixels.len()
        )));
    }

    let grid_size = tile_size + 1;
    let mut terrain = vec![0.0f32; grid_size * grid_size];

    for (i, pixel) in pixels.chunks_exact(stride).enumerate() {
        let x = i % tile_size;
        let y = i / tile_size;
        terrain[y * grid_size + x] = decoder.decode(pixel[0], pixel[1], pixel[2]);
    }

    // bottom row
    let last_row = grid_size * (grid_size - 1);
    for x in 0..grid_size - 1 {
        terrain[last_row + x] = terrain[last_row - grid_size + x];
    }
    // right column
    for y in 0..grid_size {
        terrain[grid_size * y + grid_size - 1] = terrain[grid_size * y + grid_size - 2];
    }

    Ok(terrain)
}

/// Place grid vertices in world space.
///
/// Returns stride-3 positions and stride-2 texture coordinates. Grid row 0
/// maps to `max_y` so that north stays up.
pub fn mesh_attributes(
    vertices: &[u32],
    terrain: &[f32],
    tile_size: usize,
    bounds: Option<[f64; 4]>,
) -> (Vec<f32>, Vec<f32>) {
    let grid_size = tile_size + 1;
    let size = tile_size as f64;
    let [min_x, min_y, max_x, max_y] = bounds.unwrap_or([0.0, 0.0, size, size]);
    let x_scale = (max_x - min_x) / size;
    let y_scale = (max_y - min_y) / size;

    let vertex_count = vertices.len() / 2;
    let mut positions = Vec::with_capacity(vertex_count * 3);
    let mut tex_coords = Vec::with_capacity(vertex_count * 2);

    for xy in vertices.chunks_exact(2) {
        let (x, y) = (xy[0] as usize, xy[1] as usize);
        positions.push((x as f64 * x_scale + min_x) as f32);
        positions.push((max_y - y as f64 * y_scale) as f32);
        positions.push(terrain[y * grid_size + x]);

        tex_coords.push((x as f64 / size) as f32);
        tex_coords.push((y as f64 / size) as f32);
    }

    (positions, tex_coords)
}

/// Run simplification on a height grid and assemble the payload.
pub fn build_mesh(
    martini: &Martini,
    terrain: Vec<f32>,
    options: &DecodeOptions,
) -> Result<MeshPayload, DecodeError> {
    let tile_size = martini.grid_size() - 1;
    let tile = martini.create_tile(terrain)?;
    let GridMesh {
        vertices,
        triangles,
    } = tile.mesh(options.mesh_max_error);
    let (positions, tex_coords) =
        mesh_attributes(&vertices, tile.terrain(), tile_size, options.bounds);
    MeshPayload::from_buffers(triangles, positions, tex_coords)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(bounds: Option<[f64; 4]>) -> DecodeOptions {
        DecodeOptions {
            bounds,
            mesh_max_error: 0.0,
            elevation_decoder: ElevationDecoder::default(),
        }
    }

    #[test]
    fn test_elevation_grid_backfills_borders() {
        // 2x2 RGB raster, red channel = height
        let pixels = [10, 0, 0, 20, 0, 0, 30, 0, 0, 40, 0, 0];
        let grid = elevation_grid(&pixels, 2, 3, &ElevationDecoder::default()).unwrap();
        assert_eq!(
            grid,
            vec![
                10.0, 20.0, 20.0, //
                30.0, 40.0, 40.0, //
                30.0, 40.0, 40.0,
            ]
        );
    }

    #[test]
    fn test_elevation_grid_rgba_stride() {
        let pixels = [128, 0, 0, 255, 128, 1, 0, 255, 128, 2, 0, 255, 128, 3, 0, 255];
        let grid = elevation_grid(&pixels, 2, 4, &ElevationDecoder::terrarium()).unwrap();
        assert_eq!(&grid[0..2], &[0.0, 1.0]);
        assert_eq!(&grid[3..5], &[2.0, 3.0]);
    }

    #[test]
    fn test_elevation_grid_rejects_short_buffer() {
        let result = elevation_grid(&[0; 5], 2, 3, &ElevationDecoder::default());
        assert!(matches!(result, Err(DecodeError::Raster(_))));
    }

    #[test]
    fn test_mesh_attributes_pixel_space() {
        let terrain = vec![1.0, 2.0, 3.0, 4.0];
        let (positions, tex_coords) = mesh_attributes(&[0, 0, 1, 1], &terrain, 1, None);
        assert_eq!(positions, vec![0.0, 1.0, 1.0, 1.0, 0.0, 4.0]);
        assert_eq!(tex_coords, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_mesh_attributes_world_bounds() {
        let terrain = vec![0.0; 9];
        let bounds = Some([100.0, 200.0, 104.0, 202.0]);
        let (positions, _) = mesh_attributes(&[0, 0, 2, 2, 1, 0], &terrain, 2, bounds);
        // top-left corner of the raster is (min_x, max_y)
        assert_eq!(&positions[0..2], &[100.0, 202.0]);
        // bottom-right corner is (max_x, min_y)
        assert_eq!(&positions[3..5], &[104.0, 200.0]);
        assert_eq!(&positions[6..8], &[102.0, 202.0]);
    }

    #[test]
    fn test_build_mesh_flat_tile() {
        let martini = Martini::new(5).unwrap();
        let payload = build_mesh(&martini, vec![7.0; 25], &options(Some([0.0, 0.0, 1.0, 1.0]))).unwrap();
        assert_eq!(payload.vertex_count, 4);
        assert_eq!(payload.triangle_count(), 2);
        assert_eq!(payload.bounding_box.min, [0.0, 0.0, 7.0]);
        assert_eq!(payload.bounding_box.max, [1.0, 1.0, 7.0]);
        assert_eq!(payload.tex_coords.len(), 8);
        assert!(payload.indices_in_range());
    }
}
