//! `edit-stewards`, `edit-datasets`, `edit-user`, `edit-metadata-locations`
//! — each mounts the container, runs the shared edit/validate/promote/
//! abort loop against its own `ConfigStore`, and unmounts.

use anyhow::Result;
use paradux_core::store::datasets::DatasetsStore;
use paradux_core::store::metadata_locations::MetadataLocationsStore;
use paradux_core::store::stewards::StewardsStore;
use paradux_core::store::user::UserStore;
use paradux_core::store::ConfigStore;

use super::{container, Command, GlobalArgs};
use crate::cli::EditArgs;
use crate::editor::SystemEditor;

/// Runs the shared edit loop for a single `ConfigStore`: mount, discard
/// a pending temp file first if `--clean` was passed, copy the master
/// file to its temp sibling (unless one is already pending), launch
/// `$EDITOR`, validate, print the report, and promote on success.
/// Always unmounts on the way out.
fn edit_loop<S: ConfigStore>(
    paradux_dir: &std::path::Path,
    master: &std::path::Path,
    temp: &std::path::Path,
    args: &EditArgs,
) -> Result<()> {
    let manager = container::mount_with_prompt(paradux_dir)?;
    let _guard = manager.guard();

    if args.clean {
        // Discard a previously pending (and possibly invalid) temp file
        // so the editor starts from a fresh copy of master.
        S::abort_temp(temp)?;
    }
    let report = S::edit_and_report(master, temp, &SystemEditor)?;
    for item in &report.items {
        println!("{:?}: {}", item.level, item.message);
    }
    if report.all_ok() {
        S::promote_temp(master, temp)?;
        println!("changes promoted");
    } else {
        println!("validation failed; edits left pending in {}", temp.display());
    }
    Ok(())
}

pub struct EditStewardsCommand {
    pub args: EditArgs,
}

impl Command for EditStewardsCommand {
    fn name(&self) -> &'static str {
        "edit-stewards"
    }

    fn run(&self, global: &GlobalArgs) -> Result<()> {
        let layout = paradux_core::paths::Layout::new(global.paradux_dir.clone());
        edit_loop::<StewardsStore>(&global.paradux_dir, &layout.stewards_master(), &layout.stewards_temp(), &self.args)
    }
}

pub struct EditDatasetsCommand {
    pub args: EditArgs,
}

impl Command for EditDatasetsCommand {
    fn name(&self) -> &'static str {
        "edit-datasets"
    }

    fn run(&self, global: &GlobalArgs) -> Result<()> {
        let layout = paradux_core::paths::Layout::new(global.paradux_dir.clone());
        edit_loop::<DatasetsStore>(&global.paradux_dir, &layout.datasets_master(), &layout.datasets_temp(), &self.args)
    }
}

pub struct EditUserCommand {
    pub args: EditArgs,
}

impl Command for EditUserCommand {
    fn name(&self) -> &'static str {
        "edit-user"
    }

    fn run(&self, global: &GlobalArgs) -> Result<()> {
        let layout = paradux_core::paths::Layout::new(global.paradux_dir.clone());
        edit_loop::<UserStore>(&global.paradux_dir, &layout.user_master(), &layout.user_temp(), &self.args)
    }
}

pub struct EditMetadataLocationsCommand {
    pub args: EditArgs,
}

impl Command for EditMetadataLocationsCommand {
    fn name(&self) -> &'static str {
        "edit-metadata-locations"
    }

    fn run(&self, global: &GlobalArgs) -> Result<()> {
        let layout = paradux_core::paths::Layout::new(global.paradux_dir.clone());
        edit_loop::<MetadataLocationsStore>(&global.paradux_dir, &layout.metadata_master(), &layout.metadata_temp(), &self.args)
    }
}
