//! # Command registry
//!
//! Every CLI subcommand is a small struct implementing [`Command`]; `main`
//! builds the matching one and runs it through this single trait, rather
//! than dispatching on the raw `clap` enum throughout the codebase.

pub mod edit;
pub mod export;
pub mod init;
pub mod publish;
pub mod recover;

use std::path::PathBuf;

use anyhow::Result;

/// Arguments shared by every command, resolved once in `main`.
pub struct GlobalArgs {
    pub paradux_dir: PathBuf,
}

/// A runnable CLI command.
pub trait Command {
    /// Stable name, used for logging and for locating this command in the
    /// registry.
    fn name(&self) -> &'static str;

    /// Executes the command. Any fatal error propagates to `main`, which
    /// turns it into a single-line summary and a non-zero exit code.
    fn run(&self, global: &GlobalArgs) -> Result<()>;
}

/// Shared helpers for mounting the container, common to every command
/// that needs it.
pub(crate) mod container {
    use std::path::Path;

    use anyhow::{Context, Result};
    use paradux_core::container::ContainerManager;
    use paradux_core::paths::Layout;

    use crate::cryptsetup::SystemCryptSetup;
    use crate::process::RealSubprocess;

    pub type Backend = SystemCryptSetup<RealSubprocess>;

    pub fn manager(paradux_dir: &Path) -> ContainerManager<Backend> {
        let layout = Layout::new(paradux_dir.to_path_buf());
        ContainerManager::new(layout, SystemCryptSetup::new(RealSubprocess))
    }

    /// Prompts for the everyday passphrase and mounts the container with
    /// it. Callers should immediately take `manager.guard()` so the
    /// container unmounts when that guard drops, on every exit path.
    pub fn mount_with_prompt(paradux_dir: &Path) -> Result<ContainerManager<Backend>> {
        let manager = manager(paradux_dir);
        let passphrase =
            crate::editor::prompt_passphrase("Everyday passphrase: ").context("failed to read everyday passphrase")?;
        manager.mount(&passphrase).context("failed to mount the Paradux container")?;
        Ok(manager)
    }
}
