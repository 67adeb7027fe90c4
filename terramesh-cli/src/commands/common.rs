//! Arguments and helpers shared across the loading commands.

use clap::Args;
use terramesh::config::ConfigFile;
use terramesh::coord::TileCoord;
use terramesh::layer::TerrainProps;
use terramesh::mesh::{ElevationDecoder, MeshPayload};
use terramesh::provider::UrlTemplate;
use terramesh::telemetry::MetricsSnapshot;

use crate::error::CliError;

/// Raster sources and decode settings. Each falls back to the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Elevation URL template ({x} {y} {z} {-y}; ';' separates mirrors)
    #[arg(long)]
    pub elevation_url: Option<String>,

    /// Texture URL template
    #[arg(long)]
    pub texture_url: Option<String>,

    /// Elevation decoder: terrarium, mapbox, or r,g,b,offset
    #[arg(long)]
    pub decoder: Option<String>,

    /// Mesh simplification tolerance in metres (0 keeps the full grid)
    #[arg(long)]
    pub max_error: Option<f32>,
}

/// Tile address.
#[derive(Debug, Clone, Args)]
pub struct TileArgs {
    /// Zoom level
    #[arg(short, long)]
    pub z: u8,
    /// Column
    #[arg(short, long)]
    pub x: u32,
    /// Row
    #[arg(short, long)]
    pub y: u32,
}

impl TileArgs {
    pub fn coord(&self) -> Result<TileCoord, CliError> {
        Ok(TileCoord::try_new(self.x, self.y, self.z)?)
    }
}

/// Build layer props from the config file, then apply CLI overrides.
pub fn resolve_props(args: &SourceArgs, config: &ConfigFile) -> Result<TerrainProps, CliError> {
    let mut props = TerrainProps::from_config(config)?;

    if let Some(url) = &args.elevation_url {
        props.elevation_data = Some(url.parse::<UrlTemplate>()?);
    }
    if let Some(url) = &args.texture_url {
        props.texture = Some(url.parse::<UrlTemplate>()?);
    }
    if let Some(decoder) = &args.decoder {
        props.elevation_decoder = decoder
            .parse::<ElevationDecoder>()
            .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
    }
    if let Some(max_error) = args.max_error {
        props.mesh_max_error = max_error;
    }

    if props.elevation_data.is_none() {
        return Err(CliError::Config(
            "No elevation source. Set terrain.elevation_url in config.ini or use --elevation-url"
                .to_string(),
        ));
    }
    props.validate()?;
    Ok(props)
}

/// Print the headline numbers of a mesh.
pub fn print_mesh_summary(mesh: &MeshPayload) {
    let bbox = &mesh.bounding_box;
    println!("  Vertices:  {}", mesh.vertex_count);
    println!("  Triangles: {}", mesh.triangle_count());
    println!(
        "  X range:   {:.4} .. {:.4}",
        bbox.min[0], bbox.max[0]
    );
    println!(
        "  Y range:   {:.4} .. {:.4}",
        bbox.min[1], bbox.max[1]
    );
    println!("  Elevation: {:.1} .. {:.1}", bbox.min_z(), bbox.max_z());
}

/// JSON summary of a mesh, without the raw buffers.
pub fn mesh_summary_json(mesh: &MeshPayload) -> serde_json::Value {
    serde_json::json!({
        "vertexCount": mesh.vertex_count,
        "triangleCount": mesh.triangle_count(),
        "boundingBox": mesh.bounding_box,
    })
}

pub fn print_metrics(snapshot: &MetricsSnapshot) {
    println!();
    println!("Session Summary");
    println!("───────────────");
    println!("  {}", snapshot);
}
