//! `init` — creates a new container and its initial recovery secret.

use anyhow::{Context, Result};
use paradux_core::shamir::{MersennePrime, RecoverySecret, ShamirField};
use paradux_core::store::datasets::DatasetsFile;
use paradux_core::store::metadata_locations::MetadataLocationsFile;
use paradux_core::store::secrets::SecretsRecord;
use paradux_core::store::stewards::StewardRegistry;
use paradux_core::store::user::User;

use super::{container, Command, GlobalArgs};
use crate::cli::InitArgs;

pub struct InitCommand {
    pub args: InitArgs,
}

impl Command for InitCommand {
    fn name(&self) -> &'static str {
        "init"
    }

    fn run(&self, global: &GlobalArgs) -> Result<()> {
        let manager = container::manager(&global.paradux_dir);
        manager.check_can_create().context("container already initialized")?;

        let everyday = crate::editor::prompt_passphrase("Choose an everyday passphrase: ")
            .context("failed to read everyday passphrase")?;

        let prime = MersennePrime::for_bit_length(self.args.bit_length).context("unsupported bit length")?;
        let field = ShamirField::new(prime);
        let secret = RecoverySecret::generate(&field);

        manager
            .create_and_mount(&secret, self.args.image_size, &everyday)
            .context("failed to create the container")?;
        let _guard = manager.guard();

        populate_initial(&global.paradux_dir, prime, self.args.min_stewards, secret)?;
        println!("Paradux initialized at {}", global.paradux_dir.display());
        Ok(())
    }
}

fn populate_initial(
    paradux_dir: &std::path::Path,
    prime: MersennePrime,
    min_stewards: u32,
    secret: RecoverySecret,
) -> Result<()> {
    let layout = paradux_core::paths::Layout::new(paradux_dir.to_path_buf());

    let secrets = SecretsRecord::new(prime.exponent(), min_stewards, secret.0).context("failed to split the recovery secret")?;
    secrets.save(&layout.secrets_master()).context("failed to write secrets.json")?;

    write_initial_json(&layout.user_master(), &User::default())?;
    write_initial_json(&layout.stewards_master(), &StewardRegistry::new())?;
    write_initial_json(&layout.datasets_master(), &DatasetsFile::default())?;
    write_initial_json(&layout.metadata_master(), &MetadataLocationsFile::default())?;

    Ok(())
}

fn write_initial_json<T: serde::Serialize>(path: &std::path::Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    paradux_core::store::atomic::atomic_write(path, json.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
