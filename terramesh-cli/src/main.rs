//! terramesh - command-line driver for the terrain tile pipeline.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use terramesh::config::config_file_path;

use commands::config::ConfigCommands;
use commands::terrain::TerrainCommand;
use commands::tile::TileCommand;
use commands::view::ViewCommand;
use error::CliError;
use runner::CliRunner;

#[derive(Debug, Parser)]
#[command(name = "terramesh", version, about = "Terrain meshes from elevation tiles")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (default: ~/.terramesh/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Decode one elevation tile into a mesh
    Tile(TileCommand),

    /// Load the tiles around a point through the tiled layer
    View(ViewCommand),

    /// Build a single terrain mesh from one raster
    Terrain(TerrainCommand),

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn run(cli: Cli) -> Result<(), CliError> {
    if let Commands::Config { command } = cli.command {
        let path = cli.config.unwrap_or_else(config_file_path);
        return commands::config::run(command, &path);
    }

    let runner = CliRunner::new(cli.config.as_deref(), cli.verbose)?;
    match cli.command {
        Commands::Tile(args) => commands::tile::run(&runner, args),
        Commands::View(args) => commands::view::run(&runner, args),
        Commands::Terrain(args) => commands::terrain::run(&runner, args),
        Commands::Config { .. } => Ok(()),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_view_with_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "terramesh", "view", "--lat", "-33.9", "--lon", "-70.6", "--zoom", "9",
        ])
        .unwrap();
        match cli.command {
            Commands::View(args) => {
                assert_eq!(args.lat, -33.9);
                assert_eq!(args.radius, 1);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parses_terrain_bounds() {
        let cli = Cli::try_parse_from([
            "terramesh", "terrain", "-z", "3", "-x", "1", "-y", "2", "--bounds", "0,0,10,10",
        ])
        .unwrap();
        match cli.command {
            Commands::Terrain(args) => assert_eq!(args.bounds, Some(vec![0.0, 0.0, 10.0, 10.0])),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
