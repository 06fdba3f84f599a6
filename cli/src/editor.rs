//! Real `$EDITOR` invocation, implementing `paradux_core::ports::Editor`.

use std::path::Path;
use std::process::Command;

use paradux_core::error::{ParaduxError, ParaduxResult};
use paradux_core::ports::Editor;
use zeroize::Zeroizing;

/// Launches whatever interactive editor the user has configured via
/// `$EDITOR` and waits for it to exit.
pub struct SystemEditor;

impl Editor for SystemEditor {
    fn launch(&self, path: &Path) -> ParaduxResult<()> {
        let editor = std::env::var("EDITOR").map_err(|_| ParaduxError::EditorUnavailable)?;

        let status = Command::new(&editor)
            .arg(path)
            .status()
            .map_err(|_| ParaduxError::EditorUnavailable)?;

        if status.success() {
            Ok(())
        } else {
            Err(ParaduxError::EditorFailed(status.code()))
        }
    }
}

/// Prompts for a passphrase on the terminal with input hidden. The
/// returned buffer is zeroed on drop.
pub fn prompt_passphrase(prompt: &str) -> ParaduxResult<Zeroizing<Vec<u8>>> {
    let passphrase = rpassword::prompt_password(prompt).map_err(ParaduxError::Io)?;
    Ok(Zeroizing::new(passphrase.into_bytes()))
}
