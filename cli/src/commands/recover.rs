//! `recover` — reconstructs the recovery secret from a quorum of steward
//! packages and installs a new everyday passphrase.

use std::io::Read;

use anyhow::{Context, Result};

use super::{container, Command, GlobalArgs};
use crate::cli::RecoverArgs;

pub struct RecoverCommand {
    pub args: RecoverArgs,
}

impl Command for RecoverCommand {
    fn name(&self) -> &'static str {
        "recover"
    }

    fn run(&self, global: &GlobalArgs) -> Result<()> {
        let input_json = match &self.args.input {
            Some(path) => std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?,
            None => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("failed to read steward packages from stdin")?;
                buf
            }
        };

        let new_everyday = crate::editor::prompt_passphrase("New everyday passphrase: ")
            .context("failed to read the new everyday passphrase")?;

        let manager = container::manager(&global.paradux_dir);
        paradux_core::recovery::recover(&manager, &input_json, &new_everyday).context("recovery failed")?;

        println!("recovery secret reconstructed; everyday passphrase updated");
        Ok(())
    }
}
