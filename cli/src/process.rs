//! Real subprocess invocation, shared by [`crate::cryptsetup::SystemCryptSetup`]
//! and the [`paradux_core::transfer::scp::ScpBackend`] instance `main`
//! constructs.

use std::process::Command;

use paradux_core::error::ParaduxResult;
use paradux_core::ports::{Subprocess, SubprocessOutput};

/// Shells out via `std::process::Command`. Never treats a non-zero exit
/// as an error itself — the caller (e.g. `ContainerManager`, `ScpBackend`)
/// decides what that means.
pub struct RealSubprocess;

impl Subprocess for RealSubprocess {
    fn run(&self, command: &str, args: &[&str]) -> ParaduxResult<SubprocessOutput> {
        let output = Command::new(command).args(args).output()?;
        Ok(SubprocessOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
