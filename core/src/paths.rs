//! # On-Disk Layout & Constants
//!
//! Every magic number describing the Paradux directory layout lives here.
//! If you find yourself hardcoding a file name or a key-slot index
//! somewhere else, it belongs in this module instead.

use std::path::PathBuf;

/// Name of the encrypted container image, relative to the Paradux directory.
pub const IMAGE_FILE_NAME: &str = "configuration.img";

/// Name of the mount point directory, relative to the Paradux directory.
pub const MOUNT_DIR_NAME: &str = "configuration";

pub const USER_FILE: &str = "user.json";
pub const USER_TEMP_FILE: &str = "user.tmp.json";
pub const STEWARDS_FILE: &str = "stewards.json";
pub const STEWARDS_TEMP_FILE: &str = "stewards.temp.json";
pub const DATASETS_FILE: &str = "datasets.json";
pub const DATASETS_TEMP_FILE: &str = "datasets.temp.json";
pub const METADATA_FILE: &str = "metadata.json";
pub const METADATA_TEMP_FILE: &str = "metadata.temp.json";
pub const SECRETS_FILE: &str = "secrets.json";

/// Key slot holding the everyday passphrase the operator types daily.
pub const EVERYDAY_KEY_SLOT: u32 = 0;

/// Key slot holding the stable passphrase encoding of the recovery secret.
pub const RECOVERY_KEY_SLOT: u32 = 7;

/// Mode applied to every config file, key file, and temp file we write.
pub const SECRET_FILE_MODE: u32 = 0o600;

/// Mode applied to the mount point once it is ours.
pub const MOUNT_DIR_MODE: u32 = 0o700;

/// Returns `$HOME/.paradux`, the default Paradux directory.
///
/// Panics only if `$HOME` cannot be resolved at all — callers that need a
/// softer failure mode should resolve their own override path instead of
/// calling this.
pub fn default_paradux_dir() -> PathBuf {
    let home = std::env::var_os("HOME").expect("$HOME must be set to locate the Paradux directory");
    PathBuf::from(home).join(".paradux")
}

/// Layout of a mounted (or about-to-be-mounted) Paradux directory: the
/// image file path and the mount point, both resolved from a single base
/// directory.
#[derive(Debug, Clone)]
pub struct Layout {
    pub base_dir: PathBuf,
}

impl Layout {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn image_path(&self) -> PathBuf {
        self.base_dir.join(IMAGE_FILE_NAME)
    }

    pub fn mount_dir(&self) -> PathBuf {
        self.base_dir.join(MOUNT_DIR_NAME)
    }

    pub fn user_master(&self) -> PathBuf {
        self.mount_dir().join(USER_FILE)
    }

    pub fn user_temp(&self) -> PathBuf {
        self.mount_dir().join(USER_TEMP_FILE)
    }

    pub fn stewards_master(&self) -> PathBuf {
        self.mount_dir().join(STEWARDS_FILE)
    }

    pub fn stewards_temp(&self) -> PathBuf {
        self.mount_dir().join(STEWARDS_TEMP_FILE)
    }

    pub fn datasets_master(&self) -> PathBuf {
        self.mount_dir().join(DATASETS_FILE)
    }

    pub fn datasets_temp(&self) -> PathBuf {
        self.mount_dir().join(DATASETS_TEMP_FILE)
    }

    pub fn metadata_master(&self) -> PathBuf {
        self.mount_dir().join(METADATA_FILE)
    }

    pub fn metadata_temp(&self) -> PathBuf {
        self.mount_dir().join(METADATA_TEMP_FILE)
    }

    pub fn secrets_master(&self) -> PathBuf {
        self.mount_dir().join(SECRETS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_are_rooted_at_base_dir() {
        let layout = Layout::new(PathBuf::from("/tmp/paradux-test"));
        assert_eq!(
            layout.image_path(),
            PathBuf::from("/tmp/paradux-test/configuration.img")
        );
        assert_eq!(
            layout.mount_dir(),
            PathBuf::from("/tmp/paradux-test/configuration")
        );
        assert_eq!(
            layout.stewards_master(),
            PathBuf::from("/tmp/paradux-test/configuration/stewards.json")
        );
    }

    #[test]
    fn key_slots_are_distinct() {
        assert_ne!(EVERYDAY_KEY_SLOT, RECOVERY_KEY_SLOT);
    }
}
