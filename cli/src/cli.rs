//! # CLI Interface
//!
//! Defines the command-line argument structure for `paradux` using `clap`
//! derive: `init`, the four `edit-*` commands, `export-steward-packages`,
//! `publish-metadata`, and `recover`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Paradux disaster-recovery tool.
///
/// Keeps an everyday passphrase and a Shamir-split recovery secret inside
/// an encrypted container, and distributes one share of the recovery
/// secret to each of a configured quorum of trusted stewards.
#[derive(Parser, Debug)]
#[command(name = "paradux", about = "Paradux disaster-recovery tool", version, propagate_version = true)]
pub struct ParaduxCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (info). Repeat (`-vv`) for trace.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit log records as JSON lines instead of pretty-printed text.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Override the default Paradux directory (`$HOME/.paradux`).
    #[arg(long, env = "PARADUX_DIR", global = true)]
    pub paradux_dir: Option<PathBuf>,
}

/// Top-level subcommands for the `paradux` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Creates a new encrypted container and its initial recovery secret.
    Init(InitArgs),
    /// Edits the list of trusted stewards.
    EditStewards(EditArgs),
    /// Edits the list of data sets to back up.
    EditDatasets(EditArgs),
    /// Edits the owner's own contact details.
    EditUser(EditArgs),
    /// Edits the list of metadata publication locations.
    EditMetadataLocations(EditArgs),
    /// Renders the steward package(s) to issue.
    ExportStewardPackages(ExportStewardPackagesArgs),
    /// Publishes the exported metadata copy to every configured location.
    PublishMetadata,
    /// Reconstructs the recovery secret from a quorum of steward packages.
    Recover(RecoverArgs),
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Size of the container image, in bytes.
    #[arg(long, default_value_t = 64 * 1024 * 1024)]
    pub image_size: u64,

    /// Minimum number of stewards required to reconstruct the recovery
    /// secret (the Shamir threshold).
    #[arg(long)]
    pub min_stewards: u32,

    /// Bit length of the Mersenne prime field the recovery secret is
    /// drawn from.
    #[arg(long, default_value_t = 521)]
    pub bit_length: u32,
}

/// Arguments shared by every `edit-*` subcommand.
#[derive(Parser, Debug)]
pub struct EditArgs {
    /// Discard any pending (possibly invalid) edits left over from an
    /// earlier invocation before launching the editor, instead of
    /// resuming them.
    #[arg(long)]
    pub clean: bool,
}

/// Arguments for `export-steward-packages`.
#[derive(Parser, Debug)]
pub struct ExportStewardPackagesArgs {
    /// Render as JSON instead of the human-readable letter template.
    #[arg(long)]
    pub json: bool,

    /// Only export the package for this one steward.
    #[arg(long = "steward-id")]
    pub steward_id: Option<String>,
}

/// Arguments for `recover`.
#[derive(Parser, Debug)]
pub struct RecoverArgs {
    /// Read the JSON array of steward-package fragments from this path
    /// instead of stdin.
    #[arg(long)]
    pub input: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        ParaduxCli::command().debug_assert();
    }
}
