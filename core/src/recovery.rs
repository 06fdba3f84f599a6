//! # Recovery flow
//!
//! Turns a quorum of steward-package fragments (typically pasted by the
//! operator from wherever each steward sent theirs back) into a
//! reconstructed recovery secret, then installs a new everyday
//! passphrase.

use serde::Deserialize;

use crate::container::ContainerManager;
use crate::error::{ParaduxError, ParaduxResult};
use crate::ports::CryptSetupBackend;
use crate::shamir::{MersennePrime, Share, ShareEngine};

/// The subset of a rendered [`crate::packager::StewardPackage`] the
/// recovery flow needs. Other fields (user, steward contact info) are
/// ignored if present.
#[derive(Debug, Clone, Deserialize)]
struct RecoveryFragment {
    mersenne: usize,
    #[serde(rename = "min-stewards")]
    min_stewards: u32,
    #[serde(rename = "stewardshare")]
    share: Share,
}

/// Parses a JSON array of steward-package fragments, reconstructs the
/// recovery secret, and installs `new_everyday_passphrase` via
/// `container.recover_set_everyday`. Guarantees `container.cleanup()`
/// runs on every exit, successful or not.
pub fn recover<B: CryptSetupBackend>(
    container: &ContainerManager<B>,
    input_json: &str,
    new_everyday_passphrase: &[u8],
) -> ParaduxResult<()> {
    let result = recover_inner(container, input_json, new_everyday_passphrase);
    container.cleanup();
    result
}

fn recover_inner<B: CryptSetupBackend>(
    container: &ContainerManager<B>,
    input_json: &str,
    new_everyday_passphrase: &[u8],
) -> ParaduxResult<()> {
    let fragments: Vec<RecoveryFragment> = serde_json::from_str(input_json).map_err(|source| ParaduxError::JsonMalformed {
        path: "<recovery input>".to_string(),
        source,
    })?;

    if fragments.is_empty() {
        return Err(ParaduxError::InconsistentRecoveryInput("no steward packages supplied".into()));
    }

    let mersenne = fragments[0].mersenne;
    let min_stewards = fragments[0].min_stewards;
    if fragments.iter().any(|f| f.mersenne != mersenne || f.min_stewards != min_stewards) {
        return Err(ParaduxError::InconsistentRecoveryInput(
            "submitted packages disagree on mersenne index or min-stewards".into(),
        ));
    }

    if fragments.len() as u32 != min_stewards {
        return Err(ParaduxError::InconsistentRecoveryInput(format!(
            "expected exactly {min_stewards} packages, got {}",
            fragments.len()
        )));
    }

    let shares: Vec<Share> = fragments.into_iter().map(|f| f.share).collect();
    let prime = MersennePrime::from_index(mersenne)?;
    let engine = ShareEngine::new(prime);
    let secret = engine.reconstruct(&shares)?;

    container.recover_set_everyday(&crate::shamir::RecoverySecret(secret), new_everyday_passphrase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParaduxResult as Result_;
    use crate::paths::Layout;
    use crate::ports::CryptSetupBackend;
    use num_bigint::BigUint;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    #[derive(Default)]
    struct FakeBackend {
        slots: RefCell<HashSet<u32>>,
    }

    impl CryptSetupBackend for FakeBackend {
        fn format(&self, _i: &Path, slot: u32, _p: &[u8]) -> Result_<()> {
            self.slots.borrow_mut().insert(slot);
            Ok(())
        }
        fn open(&self, _i: &Path, _m: &str, _p: &[u8]) -> Result_<PathBuf> {
            Ok(PathBuf::from("/dev/mapper/fake"))
        }
        fn close(&self, _m: &str) -> Result_<()> {
            Ok(())
        }
        fn add_key(&self, _i: &Path, slot: u32, _u: &[u8], _p: &[u8]) -> Result_<()> {
            self.slots.borrow_mut().insert(slot);
            Ok(())
        }
        fn kill_slot(&self, _i: &Path, slot: u32) -> Result_<()> {
            self.slots.borrow_mut().remove(&slot);
            Ok(())
        }
        fn populated_slots(&self, _i: &Path) -> Result_<Vec<u32>> {
            Ok(self.slots.borrow().iter().copied().collect())
        }
        fn mkfs(&self, _d: &Path) -> Result_<()> {
            Ok(())
        }
        fn mount(&self, _d: &Path, _m: &Path) -> Result_<()> {
            Ok(())
        }
        fn unmount(&self, _m: &Path) -> Result_<()> {
            Ok(())
        }
    }

    fn setup_container(dir: &std::path::Path) -> ContainerManager<FakeBackend> {
        let layout = Layout::new(dir.to_path_buf());
        let manager = ContainerManager::new(layout, FakeBackend::default());
        let secret = crate::shamir::RecoverySecret(BigUint::from(42u32));
        manager.create_and_mount(&secret, 1024, b"initial-everyday").unwrap();
        manager
    }

    fn fragment_json(mersenne: usize, min_stewards: u32, x: u32, y: &str) -> String {
        format!(r#"{{"mersenne":{mersenne},"min-stewards":{min_stewards},"stewardshare":{{"x":"{x}","y":"{y}"}}}}"#)
    }

    #[test]
    fn rejects_mismatched_mersenne_across_fragments() {
        let dir = tempdir().unwrap();
        let container = setup_container(dir.path());
        let input = format!("[{},{}]", fragment_json(12, 2, 1, "10"), fragment_json(13, 2, 2, "20"));
        let result = recover(&container, &input, b"new-everyday");
        assert!(matches!(result, Err(ParaduxError::InconsistentRecoveryInput(_))));
    }

    #[test]
    fn rejects_too_many_shares() {
        let dir = tempdir().unwrap();
        let container = setup_container(dir.path());
        let input = format!(
            "[{},{},{}]",
            fragment_json(12, 2, 1, "10"),
            fragment_json(12, 2, 2, "20"),
            fragment_json(12, 2, 3, "30")
        );
        let result = recover(&container, &input, b"new-everyday");
        assert!(matches!(result, Err(ParaduxError::InconsistentRecoveryInput(_))));
    }

    #[test]
    fn reconstructs_and_installs_new_everyday_key() {
        let dir = tempdir().unwrap();
        let container = setup_container(dir.path());

        let prime = MersennePrime::for_bit_length(127).unwrap();
        let engine = ShareEngine::new(prime);
        let secret = BigUint::from(55555u64);
        let polynomial = engine.split(&secret, 2).unwrap();
        let x1 = BigUint::from(1u32);
        let x2 = BigUint::from(2u32);
        let y1 = engine.evaluate(&secret, &polynomial, &x1);
        let y2 = engine.evaluate(&secret, &polynomial, &x2);

        let input = format!(
            "[{},{}]",
            fragment_json(prime.index(), 2, 1, &y1.to_string()),
            fragment_json(prime.index(), 2, 2, &y2.to_string())
        );

        recover(&container, &input, b"brand-new-everyday").unwrap();
        assert!(container.has_slot(crate::paths::EVERYDAY_KEY_SLOT).unwrap());
    }
}
