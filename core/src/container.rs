//! # ContainerManager
//!
//! Owns the LUKS-style encrypted image and its two key slots
//! ([`paths::EVERYDAY_KEY_SLOT`], [`paths::RECOVERY_KEY_SLOT`]). All
//! actual encryption work is delegated to a [`CryptSetupBackend`]; this
//! module only sequences calls to it, manages the sparse image file, and
//! implements the stable recovery-secret-to-passphrase encoding.
//! Materializing a passphrase into a mode-`0600` temp file for the
//! underlying tool, and unlinking it on every exit path, is the real
//! backend's responsibility (`paradux-cli`'s `CryptSetupBackend` impl) —
//! this trait's methods take passphrase bytes directly.

use std::fs;
use std::path::{Path, PathBuf};

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use tracing::{debug, warn};

use crate::error::{ParaduxError, ParaduxResult};
use crate::paths::{self, Layout};
use crate::ports::CryptSetupBackend;
use crate::shamir::RecoverySecret;

const MINC: u32 = 32;
const MAXC: u32 = 127;
const DC: u32 = MAXC - MINC;
const MAX_PASSPHRASE_LEN: usize = 512;

/// Encodes a recovery secret into a stable LUKS passphrase.
///
/// MUST be bit-for-bit stable across versions: changing `MINC`, `MAXC`,
/// `DC`, the loop bound, or the digit order breaks every existing
/// deployment. Digits are emitted least-significant-first in
/// base `DC`, truncated (not rejected) at 512 bytes.
pub fn recovery_secret_to_passphrase(secret: &BigUint) -> Vec<u8> {
    let mut s = secret.clone();
    let divisor = BigUint::from(DC);
    let mut out = Vec::new();
    while !s.is_zero() && out.len() < MAX_PASSPHRASE_LEN {
        let digit = (&s % &divisor).to_u32().expect("remainder mod DC fits in u32");
        out.push((MINC + digit) as u8);
        s /= &divisor;
    }
    out
}

/// LUKS image lifecycle. Generic over the `cryptsetup`-equivalent
/// backend so core logic stays subprocess-free and unit-testable
/// against a fake.
pub struct ContainerManager<B: CryptSetupBackend> {
    layout: Layout,
    backend: B,
    map_name: String,
}

impl<B: CryptSetupBackend> ContainerManager<B> {
    pub fn new(layout: Layout, backend: B) -> Self {
        Self {
            layout,
            backend,
            map_name: "paradux".to_string(),
        }
    }

    fn mapped_device_path(&self) -> PathBuf {
        PathBuf::from("/dev/mapper").join(&self.map_name)
    }

    /// Fails `ImageExists` if the image already exists.
    pub fn check_can_create(&self) -> ParaduxResult<()> {
        if self.layout.image_path().exists() {
            return Err(ParaduxError::ImageExists(self.layout.image_path().display().to_string()));
        }
        Ok(())
    }

    /// Allocates the sparse image, installs the recovery key at slot 7,
    /// installs `everyday_passphrase` at slot 0, opens and formats the
    /// container, and mounts it with mode `0700`.
    pub fn create_and_mount(
        &self,
        recovery_secret: &RecoverySecret,
        image_size_bytes: u64,
        everyday_passphrase: &[u8],
    ) -> ParaduxResult<()> {
        self.check_can_create()?;

        let image_path = self.layout.image_path();
        {
            let file = fs::File::create(&image_path)?;
            file.set_len(image_size_bytes)?;
        }

        let recovery_passphrase = recovery_secret_to_passphrase(&recovery_secret.0);
        self.backend.format(&image_path, paths::RECOVERY_KEY_SLOT, &recovery_passphrase)?;
        self.backend.add_key(&image_path, paths::EVERYDAY_KEY_SLOT, &recovery_passphrase, everyday_passphrase)?;

        let device_path = self.backend.open(&image_path, &self.map_name, everyday_passphrase)?;
        self.backend.mkfs(&device_path)?;

        let mount_dir = self.layout.mount_dir();
        fs::create_dir_all(&mount_dir)?;
        self.backend.mount(&device_path, &mount_dir)?;
        crate::store::atomic::set_mode(&mount_dir, paths::MOUNT_DIR_MODE)?;

        debug!(image = %image_path.display(), "container created and mounted");
        Ok(())
    }

    /// Opens the container with `everyday_passphrase` and mounts it.
    /// Fails `ImageMissing` if the image does not exist.
    pub fn mount(&self, everyday_passphrase: &[u8]) -> ParaduxResult<()> {
        let image_path = self.layout.image_path();
        if !image_path.exists() {
            return Err(ParaduxError::ImageMissing(image_path.display().to_string()));
        }

        let device_path = self.backend.open(&image_path, &self.map_name, everyday_passphrase)?;
        let mount_dir = self.layout.mount_dir();
        fs::create_dir_all(&mount_dir)?;
        self.backend.mount(&device_path, &mount_dir)?;
        Ok(())
    }

    /// Unmounts and closes the container. Tolerant of partial or absent
    /// state: called from every exit path, must never itself fail.
    pub fn cleanup(&self) {
        if let Err(e) = self.backend.unmount(&self.layout.mount_dir()) {
            warn!(error = %e, "cleanup: unmount failed (continuing)");
        }
        if let Err(e) = self.backend.close(&self.map_name) {
            warn!(error = %e, "cleanup: close failed (continuing)");
        }
    }

    /// Borrows `self` for a [`MountGuard`] whose `Drop` impl runs
    /// [`ContainerManager::cleanup`]. Call after a successful `mount` or
    /// `create_and_mount` so the container is unmounted on every exit
    /// path from the caller's scope, including an early `?` return.
    pub fn guard(&self) -> MountGuard<'_, B> {
        MountGuard { manager: self }
    }

    /// Whether `slot` is populated, parsed from the backend's header dump.
    pub fn has_slot(&self, slot: u32) -> ParaduxResult<bool> {
        let slots = self.backend.populated_slots(&self.layout.image_path())?;
        Ok(slots.contains(&slot))
    }

    /// Copies the image to `dest_path` and strips the everyday key from
    /// the copy, leaving only the recovery key. Verifies the
    /// post-conditions (slot 7 populated, slot 0 empty) and fails
    /// `ExportIntegrityFailure` if either does not hold.
    pub fn export_metadata(&self, dest_path: &Path) -> ParaduxResult<()> {
        fs::copy(self.layout.image_path(), dest_path)?;
        self.backend.kill_slot(dest_path, paths::EVERYDAY_KEY_SLOT)?;

        let slots = self.backend.populated_slots(dest_path)?;
        if !slots.contains(&paths::RECOVERY_KEY_SLOT) {
            return Err(ParaduxError::ExportIntegrityFailure(
                "exported copy is missing the recovery key slot".into(),
            ));
        }
        if slots.contains(&paths::EVERYDAY_KEY_SLOT) {
            return Err(ParaduxError::ExportIntegrityFailure(
                "exported copy still carries the everyday key slot".into(),
            ));
        }
        Ok(())
    }

    /// The image exists and slot 7 is populated. Kills slot 0 (ignoring
    /// failure, it may already be empty), then installs
    /// `new_everyday_passphrase` at slot 0 using the recovery-derived
    /// passphrase (held only in a scoped temp file) as the unlock key.
    pub fn recover_set_everyday(
        &self,
        recovery_secret: &RecoverySecret,
        new_everyday_passphrase: &[u8],
    ) -> ParaduxResult<()> {
        let image_path = self.layout.image_path();
        if !image_path.exists() {
            return Err(ParaduxError::ImageMissing(image_path.display().to_string()));
        }

        if let Err(e) = self.backend.kill_slot(&image_path, paths::EVERYDAY_KEY_SLOT) {
            debug!(error = %e, "recover_set_everyday: kill_slot(0) failed, assuming already empty");
        }

        let recovery_passphrase = recovery_secret_to_passphrase(&recovery_secret.0);
        self.backend
            .add_key(&image_path, paths::EVERYDAY_KEY_SLOT, &recovery_passphrase, new_everyday_passphrase)
    }
}

/// RAII handle returned by [`ContainerManager::guard`]: runs
/// [`ContainerManager::cleanup`] when dropped, so a scope that mounts the
/// container unmounts it on every exit path without an explicit call at
/// each `return`/`?`.
pub struct MountGuard<'a, B: CryptSetupBackend> {
    manager: &'a ContainerManager<B>,
}

impl<'a, B: CryptSetupBackend> Drop for MountGuard<'a, B> {
    fn drop(&mut self) {
        self.manager.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use tempfile::tempdir;

    #[test]
    fn passphrase_zero_is_empty() {
        assert_eq!(recovery_secret_to_passphrase(&BigUint::zero()), Vec::<u8>::new());
    }

    #[test]
    fn passphrase_one_is_single_char() {
        assert_eq!(recovery_secret_to_passphrase(&BigUint::from(1u32)), vec![33u8]);
    }

    #[test]
    fn passphrase_ninety_five_is_two_chars_little_endian() {
        // Scenario 5: digit 0 (=' ') then digit 1 (='!').
        assert_eq!(recovery_secret_to_passphrase(&BigUint::from(95u32)), vec![32u8, 33u8]);
    }

    #[test]
    fn passphrase_never_exceeds_max_len() {
        let huge = (BigUint::from(1u32) << 9689u32) - BigUint::from(1u32);
        assert!(recovery_secret_to_passphrase(&huge).len() <= MAX_PASSPHRASE_LEN);
    }

    #[derive(Default)]
    struct FakeBackend {
        formatted: RefCell<Option<(PathBuf, u32)>>,
        slots: RefCell<HashSet<u32>>,
        opened: RefCell<bool>,
        mounted: RefCell<bool>,
    }

    impl CryptSetupBackend for FakeBackend {
        fn format(&self, _image_path: &Path, slot: u32, _passphrase: &[u8]) -> ParaduxResult<()> {
            self.slots.borrow_mut().insert(slot);
            Ok(())
        }
        fn open(&self, _image_path: &Path, _map_name: &str, _passphrase: &[u8]) -> ParaduxResult<PathBuf> {
            *self.opened.borrow_mut() = true;
            Ok(PathBuf::from("/dev/mapper/fake"))
        }
        fn close(&self, _map_name: &str) -> ParaduxResult<()> {
            *self.opened.borrow_mut() = false;
            Ok(())
        }
        fn add_key(&self, _image_path: &Path, slot: u32, _unlock: &[u8], _passphrase: &[u8]) -> ParaduxResult<()> {
            self.slots.borrow_mut().insert(slot);
            Ok(())
        }
        fn kill_slot(&self, _image_path: &Path, slot: u32) -> ParaduxResult<()> {
            self.slots.borrow_mut().remove(&slot);
            Ok(())
        }
        fn populated_slots(&self, _image_path: &Path) -> ParaduxResult<Vec<u32>> {
            Ok(self.slots.borrow().iter().copied().collect())
        }
        fn mkfs(&self, _device_path: &Path) -> ParaduxResult<()> {
            Ok(())
        }
        fn mount(&self, _device_path: &Path, _mount_point: &Path) -> ParaduxResult<()> {
            *self.mounted.borrow_mut() = true;
            Ok(())
        }
        fn unmount(&self, _mount_point: &Path) -> ParaduxResult<()> {
            *self.mounted.borrow_mut() = false;
            Ok(())
        }
    }

    #[test]
    fn create_and_mount_populates_both_slots() {
        let dir = tempdir().unwrap();
        let layout = Layout::new(dir.path().to_path_buf());
        let manager = ContainerManager::new(layout, FakeBackend::default());

        let secret = RecoverySecret(BigUint::from(42u32));
        manager.create_and_mount(&secret, 1024 * 1024, b"everyday").unwrap();

        assert!(manager.has_slot(paths::EVERYDAY_KEY_SLOT).unwrap());
        assert!(manager.has_slot(paths::RECOVERY_KEY_SLOT).unwrap());
    }

    #[test]
    fn guard_unmounts_on_drop() {
        let dir = tempdir().unwrap();
        let layout = Layout::new(dir.path().to_path_buf());
        let manager = ContainerManager::new(layout, FakeBackend::default());
        let secret = RecoverySecret(BigUint::from(1u32));
        manager.create_and_mount(&secret, 1024, b"everyday").unwrap();

        assert!(*manager.backend.mounted.borrow());
        {
            let _guard = manager.guard();
        }
        assert!(!*manager.backend.mounted.borrow());
    }

    #[test]
    fn check_can_create_fails_when_image_exists() {
        let dir = tempdir().unwrap();
        let layout = Layout::new(dir.path().to_path_buf());
        fs::write(layout.image_path(), b"x").unwrap();
        let manager = ContainerManager::new(layout, FakeBackend::default());
        assert!(matches!(manager.check_can_create(), Err(ParaduxError::ImageExists(_))));
    }

    #[test]
    fn export_metadata_strips_everyday_slot() {
        let dir = tempdir().unwrap();
        let layout = Layout::new(dir.path().to_path_buf());
        let manager = ContainerManager::new(layout, FakeBackend::default());
        let secret = RecoverySecret(BigUint::from(1u32));
        manager.create_and_mount(&secret, 1024, b"everyday").unwrap();

        let dest = dir.path().join("export.img");
        manager.export_metadata(&dest).unwrap();
    }

    #[test]
    fn recover_set_everyday_requires_existing_image() {
        let dir = tempdir().unwrap();
        let layout = Layout::new(dir.path().to_path_buf());
        let manager = ContainerManager::new(layout, FakeBackend::default());
        let secret = RecoverySecret(BigUint::from(1u32));
        let result = manager.recover_set_everyday(&secret, b"new-everyday");
        assert!(matches!(result, Err(ParaduxError::ImageMissing(_))));
    }
}
