//! Shared rename-based atomicity primitives used by every `ConfigStore`
//! and by `SecretsStore::save`.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::ParaduxResult;
use crate::paths::SECRET_FILE_MODE;

/// Writes `contents` to a sibling temp file and renames it over `path`.
///
/// POSIX guarantees `rename` within the same filesystem is atomic, so
/// readers of `path` only ever see the fully-written old or new content —
/// never a partial write. The temp file is created with
/// [`SECRET_FILE_MODE`] before any data is written to it.
pub fn atomic_write(path: &Path, contents: &[u8]) -> ParaduxResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp_path = dir.join(format!(
        ".{}.atomic-tmp",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("paradux")
    ));

    {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        set_mode(&tmp_path, SECRET_FILE_MODE)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> ParaduxResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: u32) -> ParaduxResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_creates_file_with_expected_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        atomic_write(&path, b"{\"a\":1}").unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "{\"a\":1}");
    }

    #[test]
    fn atomic_write_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[cfg(unix)]
    #[test]
    fn atomic_write_sets_owner_only_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        atomic_write(&path, b"x").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, SECRET_FILE_MODE);
    }
}
