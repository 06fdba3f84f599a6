//! The `scp` upload backend: requires `SshCredentials`,
//! materialises the private key into a mode-`0600` temp file, invokes
//! the external `scp` binary via a [`Subprocess`], and unlinks the key
//! on every exit path.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{ParaduxError, ParaduxResult};
use crate::paths::SECRET_FILE_MODE;
use crate::ports::{Subprocess, UploadBackend};
use crate::store::datasets::{Credentials, DataLocation};

struct TempKeyFile {
    path: PathBuf,
}

impl TempKeyFile {
    fn write(private_key: &str) -> ParaduxResult<Self> {
        let path = std::env::temp_dir().join(format!("paradux-scp-{}", uuid::Uuid::new_v4()));
        fs::write(&path, private_key)?;
        crate::store::atomic::set_mode(&path, SECRET_FILE_MODE)?;
        Ok(Self { path })
    }
}

impl Drop for TempKeyFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to unlink scp temp key file");
            }
        }
    }
}

/// Uploads over `scp`, generic over the subprocess seam so it can be
/// exercised against a fake in tests.
pub struct ScpBackend<S: Subprocess> {
    subprocess: S,
}

impl<S: Subprocess> ScpBackend<S> {
    pub fn new(subprocess: S) -> Self {
        Self { subprocess }
    }
}

impl<S: Subprocess> UploadBackend for ScpBackend<S> {
    fn supports(&self, scheme: &str) -> bool {
        scheme == "scp"
    }

    fn upload(&self, local_path: &Path, destination: &DataLocation) -> ParaduxResult<bool> {
        let (username, private_key) = match &destination.credentials {
            Some(Credentials::Ssh { username, private_key }) => (username, private_key),
            _ => {
                return Err(ParaduxError::SchemaViolation(
                    "scp destination requires SshCredentials".into(),
                ))
            }
        };

        let key_file = TempKeyFile::write(private_key)?;

        let host = destination
            .url
            .host_str()
            .ok_or_else(|| ParaduxError::SchemaViolation("scp destination URL has no host".into()))?;
        let remote_path = destination.url.path();
        let remote = format!("{username}@{host}:{remote_path}");

        let local_path_str = local_path.to_string_lossy();
        let key_path_str = key_file.path.to_string_lossy();
        let output = self
            .subprocess
            .run("scp", &["-i", &key_path_str, &local_path_str, &remote])?;

        if !output.success() {
            return Err(ParaduxError::SubprocessFailed {
                command: "scp".to_string(),
                exit_code: output.status,
                stderr: output.stderr,
            });
        }

        Ok(true)
    }
}
