// Copyright (c) 2026 Paradux Project. MIT License.
// See LICENSE for details.

//! # Paradux CLI
//!
//! Entry point for the `paradux` binary. Parses CLI arguments, initializes
//! logging, and dispatches to the matching [`Command`] in an explicit
//! registry built once here, mapping each command name to a handler
//! value conforming to a small capability set, in place of dynamic
//! command discovery.
//!
//! Every command that mounts the container binds its `MountGuard` so the
//! container unmounts on every exit path, including an early `?` return.

mod cli;
mod commands;
mod cryptsetup;
mod editor;
mod logging;
mod process;

use anyhow::Result;
use clap::Parser;

use cli::{Commands, ParaduxCli};
use commands::{Command, GlobalArgs};
use logging::LogFormat;

fn main() -> Result<()> {
    let cli = ParaduxCli::parse();

    let level = match cli.verbose {
        0 => "paradux=warn,paradux_core=warn",
        1 => "paradux=info,paradux_core=info",
        _ => "paradux=trace,paradux_core=trace",
    };
    let format = if cli.debug { LogFormat::Json } else { LogFormat::Pretty };
    logging::init_logging(level, format);

    let global = GlobalArgs {
        paradux_dir: cli.paradux_dir.unwrap_or_else(paradux_core::paths::default_paradux_dir),
    };

    // An explicit registry mapping each command name to a handler value,
    // rather than dynamic dispatch over the raw clap enum: every command
    // is a `Box<dyn Command>` exposing only `name()` and `run()`, so
    // `main` never needs to know a command's internal argument shape.
    let handler: Box<dyn Command> = match cli.command {
        Commands::Init(args) => Box::new(commands::init::InitCommand { args }),
        Commands::EditStewards(args) => Box::new(commands::edit::EditStewardsCommand { args }),
        Commands::EditDatasets(args) => Box::new(commands::edit::EditDatasetsCommand { args }),
        Commands::EditUser(args) => Box::new(commands::edit::EditUserCommand { args }),
        Commands::EditMetadataLocations(args) => Box::new(commands::edit::EditMetadataLocationsCommand { args }),
        Commands::ExportStewardPackages(args) => Box::new(commands::export::ExportStewardPackagesCommand { args }),
        Commands::PublishMetadata => Box::new(commands::publish::PublishMetadataCommand),
        Commands::Recover(args) => Box::new(commands::recover::RecoverCommand { args }),
    };

    let registry: Vec<Box<dyn Command>> = vec![handler];
    let command = registry
        .into_iter()
        .next()
        .expect("exactly one command is always selected by the clap parse above");

    tracing::debug!(command = command.name(), "dispatching");
    command.run(&global)
}
