//! Real `CryptSetupBackend`: shells out to `cryptsetup`, `mkfs.ext4`,
//! `mount`, and `umount`.
//!
//! Every method that takes a passphrase materializes it into a mode-`0600`
//! temp file for the duration of the call and unlinks it on every exit
//! path (success or error) — the responsibility `core/src/container.rs`
//! deliberately leaves to the real backend.

use std::fs;
use std::path::{Path, PathBuf};

use paradux_core::error::{ParaduxError, ParaduxResult};
use paradux_core::ports::{CryptSetupBackend, Subprocess};

struct TempKeyFile {
    path: PathBuf,
}

impl TempKeyFile {
    fn write(passphrase: &[u8]) -> ParaduxResult<Self> {
        let path = std::env::temp_dir().join(format!("paradux-key-{}", uuid::Uuid::new_v4()));
        fs::write(&path, passphrase)?;
        paradux_core::store::atomic::set_mode(&path, paradux_core::paths::SECRET_FILE_MODE)?;
        Ok(Self { path })
    }
}

impl Drop for TempKeyFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to unlink cryptsetup temp key file");
            }
        }
    }
}

/// `CryptSetupBackend` backed by the real `cryptsetup` binary (or
/// equivalent LUKS tool), generic over the subprocess seam.
pub struct SystemCryptSetup<S: Subprocess> {
    subprocess: S,
}

impl<S: Subprocess> SystemCryptSetup<S> {
    pub fn new(subprocess: S) -> Self {
        Self { subprocess }
    }

    fn run(&self, command: &str, args: &[&str]) -> ParaduxResult<()> {
        let output = self.subprocess.run(command, args)?;
        if !output.success() {
            return Err(ParaduxError::SubprocessFailed {
                command: command.to_string(),
                exit_code: output.status,
                stderr: output.stderr,
            });
        }
        Ok(())
    }
}

impl<S: Subprocess> CryptSetupBackend for SystemCryptSetup<S> {
    fn format(&self, image_path: &Path, slot: u32, passphrase: &[u8]) -> ParaduxResult<()> {
        let key_file = TempKeyFile::write(passphrase)?;
        let slot_str = slot.to_string();
        self.run(
            "cryptsetup",
            &[
                "luksFormat",
                "--batch-mode",
                "--key-slot",
                &slot_str,
                "--key-file",
                &key_file.path.to_string_lossy(),
                &image_path.to_string_lossy(),
            ],
        )
    }

    fn open(&self, image_path: &Path, map_name: &str, passphrase: &[u8]) -> ParaduxResult<PathBuf> {
        let key_file = TempKeyFile::write(passphrase)?;
        self.run(
            "cryptsetup",
            &[
                "open",
                "--key-file",
                &key_file.path.to_string_lossy(),
                &image_path.to_string_lossy(),
                map_name,
            ],
        )?;
        Ok(PathBuf::from("/dev/mapper").join(map_name))
    }

    fn close(&self, map_name: &str) -> ParaduxResult<()> {
        self.run("cryptsetup", &["close", map_name])
    }

    fn add_key(&self, image_path: &Path, slot: u32, unlock_passphrase: &[u8], passphrase: &[u8]) -> ParaduxResult<()> {
        let unlock_file = TempKeyFile::write(unlock_passphrase)?;
        let new_key_file = TempKeyFile::write(passphrase)?;
        let slot_str = slot.to_string();
        self.run(
            "cryptsetup",
            &[
                "luksAddKey",
                "--batch-mode",
                "--key-slot",
                &slot_str,
                "--key-file",
                &unlock_file.path.to_string_lossy(),
                &image_path.to_string_lossy(),
                &new_key_file.path.to_string_lossy(),
            ],
        )
    }

    fn kill_slot(&self, image_path: &Path, slot: u32) -> ParaduxResult<()> {
        let slot_str = slot.to_string();
        self.run(
            "cryptsetup",
            &["luksKillSlot", "--batch-mode", &image_path.to_string_lossy(), &slot_str],
        )
    }

    fn populated_slots(&self, image_path: &Path) -> ParaduxResult<Vec<u32>> {
        let output = self.subprocess.run("cryptsetup", &["luksDump", &image_path.to_string_lossy()])?;
        if !output.success() {
            return Err(ParaduxError::SubprocessFailed {
                command: "cryptsetup".to_string(),
                exit_code: output.status,
                stderr: output.stderr,
            });
        }
        Ok(parse_populated_slots(&output.stdout))
    }

    fn mkfs(&self, device_path: &Path) -> ParaduxResult<()> {
        self.run("mkfs.ext4", &["-q", &device_path.to_string_lossy()])
    }

    fn mount(&self, device_path: &Path, mount_point: &Path) -> ParaduxResult<()> {
        self.run("mount", &[&device_path.to_string_lossy(), &mount_point.to_string_lossy()])
    }

    fn unmount(&self, mount_point: &Path) -> ParaduxResult<()> {
        self.run("umount", &[&mount_point.to_string_lossy()])
    }
}

/// Parses the key-slot indices out of `cryptsetup luksDump`'s textual
/// output. LUKS2 dumps a `Keyslots:` section with indented lines like
/// `  0: luks2`; LUKS1 dumps `Key Slot 0: ENABLED`. Both forms are
/// accepted.
///
/// A LUKS2 dump also has `Tokens:`, `Digests:`, and `Data segments:`
/// sections whose entries are numbered the same way (`  0: pbkdf2`,
/// `  0: crypt`), so the digit-prefixed lines are only counted while
/// inside `Keyslots:`. A non-indented line starts a new top-level
/// section and resets that tracking, matching the section boundary the
/// other sections' headers also create.
fn parse_populated_slots(dump: &str) -> Vec<u32> {
    let mut slots = Vec::new();
    let mut in_keyslots = false;
    for line in dump.lines() {
        let starts_non_whitespace = line.chars().next().is_some_and(|c| !c.is_whitespace());
        if starts_non_whitespace {
            if let Some(rest) = line.strip_prefix("Key Slot ") {
                if let Some((index, status)) = rest.split_once(':') {
                    if status.trim() == "ENABLED" {
                        if let Ok(n) = index.trim().parse() {
                            slots.push(n);
                        }
                    }
                }
            }
            in_keyslots = line.starts_with("Keyslots:");
            continue;
        }

        if in_keyslots {
            let trimmed = line.trim();
            if let Some((index, _)) = trimmed.split_once(':') {
                if !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()) {
                    if let Ok(n) = index.parse() {
                        slots.push(n);
                    }
                }
            }
        }
    }
    slots
}
