//! Tile command - load one tile and report its mesh.

use clap::Args;
use terramesh::loader::{TileDataLoader, TileDescriptor};
use terramesh::mesh::MartiniDecoder;

use super::common::{mesh_summary_json, print_mesh_summary, resolve_props, SourceArgs, TileArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the tile command.
#[derive(Debug, Args)]
pub struct TileCommand {
    #[command(flatten)]
    pub tile: TileArgs,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Print a JSON summary instead of text
    #[arg(long)]
    pub json: bool,
}

/// Run the tile command.
pub fn run(runner: &CliRunner, args: TileCommand) -> Result<(), CliError> {
    runner.log_startup("tile");
    let props = resolve_props(&args.source, runner.config())?;
    let coord = args.tile.coord()?;
    let tile = TileDescriptor::from_coord(coord);

    let http = runner.http_client()?;
    let loader = TileDataLoader::new(MartiniDecoder::new(http.clone()), http);
    let bounds_world = loader.bounds_world(&tile);

    let runtime = runner.runtime()?;
    let payload = runtime.block_on(loader.load_tile(&tile, &props));
    let snapshot = loader.metrics().snapshot();

    if snapshot.out_of_zoom_skips > 0 {
        return Err(CliError::InvalidArgument(format!(
            "zoom {} is outside the configured range",
            coord.z
        )));
    }
    let Some(mesh) = payload.mesh else {
        return Err(CliError::Runtime(format!(
            "Tile {} failed to decode (run with --verbose for details)",
            coord
        )));
    };

    if args.json {
        let summary = serde_json::json!({
            "tile": coord.to_string(),
            "boundsWorld": bounds_world,
            "mesh": mesh_summary_json(&mesh),
            "textureBytes": payload.texture.as_ref().map(|t| t.len()),
        });
        println!("{}", summary);
        return Ok(());
    }

    println!("Tile {}", coord);
    println!("========");
    println!(
        "  World box: [{:.4}, {:.4}, {:.4}, {:.4}]",
        bounds_world[0], bounds_world[1], bounds_world[2], bounds_world[3]
    );
    print_mesh_summary(&mesh);
    match payload.texture {
        Some(texture) => println!("  Texture:   {} bytes", texture.len()),
        None => println!("  Texture:   none (fallback color)"),
    }
    Ok(())
}
