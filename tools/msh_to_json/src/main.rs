//! MSH to JSON converter
//!
//! Reads a Gmsh mesh and writes its nodes and linear tetrahedra as JSON.
//!
//! Usage: msh_to_json [INPUT] [OUTPUT] [--config export.toml] [--index-mode offset|tag-map]

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

use mesh_export::foundation::logging;
use mesh_export::{Config, ExportConfig, IndexMode};

fn build_cli() -> Command {
    Command::new("msh_to_json")
        .about("Exports the tetrahedra of a Gmsh .msh file as a JSON document")
        .arg(
            Arg::new("input")
                .value_name("INPUT")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Mesh file to read (.msh, ASCII format 2.2 or 4.1)"),
        )
        .arg(
            Arg::new("output")
                .value_name("OUTPUT")
                .value_parser(clap::value_parser!(PathBuf))
                .help("JSON file to write, replaced if it exists"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Load settings from a .toml or .ron file; other arguments override it"),
        )
        .arg(
            Arg::new("index-mode")
                .long("index-mode")
                .value_name("MODE")
                .value_parser(["offset", "tag-map"])
                .help("Map node references by subtracting one (offset) or through node tags (tag-map)"),
        )
        .arg(
            Arg::new("indent")
                .long("indent")
                .value_name("SPACES")
                .value_parser(clap::value_parser!(usize))
                .help("JSON indent width (0 to 16), 0 for a single line"),
        )
        .arg(
            Arg::new("validate-indices")
                .long("validate-indices")
                .action(ArgAction::SetTrue)
                .help("Fail if a tetrahedron references a node that does not exist"),
        )
}

/// Merge the optional config file with command-line overrides
fn resolve_config(matches: &ArgMatches) -> Result<ExportConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ExportConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ExportConfig::default(),
    };

    if let Some(input) = matches.get_one::<PathBuf>("input") {
        config.input.clone_from(input);
    }
    if let Some(output) = matches.get_one::<PathBuf>("output") {
        config.output.clone_from(output);
    }
    if let Some(mode) = matches.get_one::<String>("index-mode") {
        config.index_mode = mode.parse::<IndexMode>().map_err(anyhow::Error::msg)?;
    }
    if let Some(&indent) = matches.get_one::<usize>("indent") {
        config.indent = indent;
    }
    if matches.get_flag("validate-indices") {
        config.validate_indices = true;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    logging::init();

    let matches = build_cli().get_matches();
    let config = resolve_config(&matches)?;

    let report = mesh_export::export(&config)
        .with_context(|| format!("Failed to export {}", config.input.display()))?;

    log::info!("Successfully exported mesh");
    log::info!("  Input:  {}", config.input.display());
    log::info!("  Output: {} ({} bytes)", report.output.display(), report.bytes_written);
    log::info!("  Stats:  {}", report.summary);
    Ok(())
}
