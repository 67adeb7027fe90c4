//! Terrain command - single-mesh mode for one raster.

use clap::Args;
use terramesh::layer::{LayerPhase, TerrainLayer, TerrainMode};
use terramesh::loader::TileDataLoader;
use terramesh::mesh::MartiniDecoder;

use super::common::{print_mesh_summary, print_metrics, resolve_props, SourceArgs, TileArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the terrain command.
#[derive(Debug, Args)]
pub struct TerrainCommand {
    #[command(flatten)]
    pub tile: TileArgs,

    #[command(flatten)]
    pub source: SourceArgs,

    /// World bounds of the mesh as min_x,min_y,max_x,max_y (default: raster pixels)
    #[arg(long, value_delimiter = ',', num_args = 4, allow_hyphen_values = true)]
    pub bounds: Option<Vec<f64>>,
}

/// Run the terrain command.
pub fn run(runner: &CliRunner, args: TerrainCommand) -> Result<(), CliError> {
    runner.log_startup("terrain");
    let mut props = resolve_props(&args.source, runner.config())?;
    props.mode = TerrainMode::Single;
    props.single_tile = Some(args.tile.coord()?);
    props.bounds = match args.bounds.as_deref() {
        Some(&[min_x, min_y, max_x, max_y]) => Some([min_x, min_y, max_x, max_y]),
        Some(other) => {
            return Err(CliError::InvalidArgument(format!(
                "--bounds needs 4 values, got {}",
                other.len()
            )))
        }
        None => None,
    };

    let http = runner.http_client()?;
    let loader = TileDataLoader::new(MartiniDecoder::new(http.clone()), http);
    let runtime = runner.runtime()?;

    runtime.block_on(async {
        let mut layer = TerrainLayer::new(loader);
        layer.apply_props(props)?;
        layer.settle().await;

        if layer.phase() != LayerPhase::SingleReady {
            return Err(CliError::Runtime("single terrain load did not finish".to_string()));
        }

        let sub_layers = layer.build_sub_layers();
        let Some(sub_layer) = sub_layers.first() else {
            return Err(CliError::Runtime(
                "Terrain failed to decode (run with --verbose for details)".to_string(),
            ));
        };

        println!("Terrain ({})", sub_layer.id);
        println!("=========");
        print_mesh_summary(&sub_layer.mesh);
        println!(
            "  Texture:   {}",
            if sub_layer.is_textured() {
                "yes"
            } else {
                "none (fallback color)"
            }
        );
        print_metrics(&layer.metrics().snapshot());
        Ok(())
    })
}
