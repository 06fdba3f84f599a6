//! `export-steward-packages` — renders the package each configured
//! steward should receive, issuing shares as needed.

use anyhow::{Context, Result};
use paradux_core::packager::{build_package_for, build_packages};
use paradux_core::store::secrets::SecretsRecord;
use paradux_core::store::stewards::{StewardId, StewardsStore};
use paradux_core::store::user::UserStore;
use paradux_core::store::{metadata_locations::MetadataLocationsStore, ConfigStore};

use super::{container, Command, GlobalArgs};
use crate::cli::ExportStewardPackagesArgs;

pub struct ExportStewardPackagesCommand {
    pub args: ExportStewardPackagesArgs,
}

impl Command for ExportStewardPackagesCommand {
    fn name(&self) -> &'static str {
        "export-steward-packages"
    }

    fn run(&self, global: &GlobalArgs) -> Result<()> {
        let manager = container::mount_with_prompt(&global.paradux_dir)?;
        let _guard = manager.guard();
        let layout = paradux_core::paths::Layout::new(global.paradux_dir.clone());

        let user = UserStore::load(&layout.user_master())?;
        let stewards = StewardsStore::load(&layout.stewards_master())?;
        let metadata = MetadataLocationsStore::load(&layout.metadata_master())?;
        let mut secrets = SecretsRecord::load(&layout.secrets_master())?;

        let rendered = match &self.args.steward_id {
            Some(id) => {
                let (package, issued_new) =
                    build_package_for(&user, &stewards, &mut secrets, &metadata, &StewardId(id.clone()))?;
                if issued_new {
                    secrets.save(&layout.secrets_master())?;
                }
                vec![package]
            }
            None => {
                let (packages, issued_new) = build_packages(&user, &stewards, &mut secrets, &metadata)?;
                if issued_new {
                    secrets.save(&layout.secrets_master())?;
                }
                packages
            }
        };

        for package in &rendered {
            if self.args.json {
                println!("{}", package.as_json().context("failed to export steward packages")?);
            } else {
                println!("{}", package.as_text());
            }
        }

        Ok(())
    }
}
