//! # External Collaborator Ports
//!
//! Three external collaborators the core engine depends on but does not
//! own the implementation of: the interactive text editor, the
//! disk-encryption subprocess, and the data-transfer
//! backends. Each is expressed here as a small trait so core logic
//! (`ConfigStore`, `ContainerManager`, the `DataTransfer` dispatcher) can
//! be exercised in tests against a fake, while `paradux-cli` supplies the
//! real subprocess-backed implementation.

use std::path::Path;

use crate::error::ParaduxResult;

/// Invokes an interactive editor on a file and waits for it to exit.
pub trait Editor {
    /// Launches the editor on `path`. Returns `EditorUnavailable` if no
    /// editor is configured, `EditorFailed` if it exits non-zero.
    fn launch(&self, path: &Path) -> ParaduxResult<()>;
}

/// The subset of `cryptsetup` (or an equivalent LUKS tool) the container
/// lifecycle depends on. Every method is presumed to invoke an opaque
/// subprocess with a deterministic exit code.
pub trait CryptSetupBackend {
    /// Formats `image_path` as a LUKS container, installing `passphrase`
    /// at `slot`.
    fn format(&self, image_path: &Path, slot: u32, passphrase: &[u8]) -> ParaduxResult<()>;

    /// Opens (unlocks) `image_path` using the passphrase at any populated
    /// slot, mapping it to a block device named `map_name`. Returns the
    /// path to the mapped device.
    fn open(&self, image_path: &Path, map_name: &str, passphrase: &[u8]) -> ParaduxResult<std::path::PathBuf>;

    /// Closes (un-maps) a previously opened device. Must tolerate being
    /// called when nothing is mapped.
    fn close(&self, map_name: &str) -> ParaduxResult<()>;

    /// Installs `passphrase` into `slot`, unlocking with `unlock_passphrase`.
    fn add_key(&self, image_path: &Path, slot: u32, unlock_passphrase: &[u8], passphrase: &[u8]) -> ParaduxResult<()>;

    /// Removes whatever passphrase occupies `slot`. Must not fail if the
    /// slot is already empty.
    fn kill_slot(&self, image_path: &Path, slot: u32) -> ParaduxResult<()>;

    /// Returns the set of currently populated key slot indices, parsed
    /// from the tool's textual header dump.
    fn populated_slots(&self, image_path: &Path) -> ParaduxResult<Vec<u32>>;

    /// Formats the block device at `device_path` with a standard
    /// journaling filesystem.
    fn mkfs(&self, device_path: &Path) -> ParaduxResult<()>;

    /// Mounts `device_path` at `mount_point`.
    fn mount(&self, device_path: &Path, mount_point: &Path) -> ParaduxResult<()>;

    /// Unmounts whatever is mounted at `mount_point`. Must tolerate being
    /// called when nothing is mounted there.
    fn unmount(&self, mount_point: &Path) -> ParaduxResult<()>;
}

/// A destination-specific upload mechanism, selected by URL scheme.
pub trait UploadBackend {
    /// Whether this backend can handle the given URL scheme (e.g. `"scp"`).
    fn supports(&self, scheme: &str) -> bool;

    /// Uploads the file at `local_path` to `destination`. Returns `Ok(true)`
    /// on success, `Ok(false)` if the backend declined without erroring.
    fn upload(&self, local_path: &Path, destination: &crate::store::datasets::DataLocation) -> ParaduxResult<bool>;
}

/// Thin seam over subprocess invocation shared by the real
/// `CryptSetupBackend` and `UploadBackend` implementations in
/// `paradux-cli`. Exists so both can be exercised with a fake `Subprocess`
/// in tests without spawning real processes.
pub trait Subprocess {
    /// Runs `command` with `args`, returning captured stdout and the exit
    /// status. Implementations should NOT treat a non-zero exit as an
    /// error themselves — callers decide what that means.
    fn run(&self, command: &str, args: &[&str]) -> ParaduxResult<SubprocessOutput>;
}

/// Captured result of running an external command.
#[derive(Debug, Clone)]
pub struct SubprocessOutput {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl SubprocessOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}
