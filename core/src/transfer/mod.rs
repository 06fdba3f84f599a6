//! # DataTransfer dispatcher
//!
//! Discovery-based: enumerate the available
//! [`UploadBackend`]s and pick the first one whose `supports` matches the
//! destination URL's scheme.

pub mod scp;

use std::path::Path;

use crate::error::ParaduxResult;
use crate::ports::UploadBackend;
use crate::store::datasets::DataLocation;

/// Holds the corpus of available backends and dispatches by scheme.
pub struct DataTransfer {
    backends: Vec<Box<dyn UploadBackend>>,
}

impl DataTransfer {
    pub fn new(backends: Vec<Box<dyn UploadBackend>>) -> Self {
        Self { backends }
    }

    /// Uploads `local_path` to `destination` using the first backend that
    /// supports its URL scheme. Returns `Ok(false)` if no backend
    /// supports the scheme at all, mirroring a backend's own declined-
    /// upload signal.
    pub fn upload(&self, local_path: &Path, destination: &DataLocation) -> ParaduxResult<bool> {
        let scheme = destination.url.scheme();
        for backend in &self.backends {
            if backend.supports(scheme) {
                return backend.upload(local_path, destination);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeBackend {
        scheme: &'static str,
        result: bool,
    }

    impl UploadBackend for FakeBackend {
        fn supports(&self, scheme: &str) -> bool {
            scheme == self.scheme
        }
        fn upload(&self, _local_path: &Path, _destination: &DataLocation) -> ParaduxResult<bool> {
            Ok(self.result)
        }
    }

    fn location(url: &str) -> DataLocation {
        DataLocation {
            name: None,
            description: None,
            url: url.parse().unwrap(),
            credentials: None,
        }
    }

    #[test]
    fn dispatches_to_the_matching_backend() {
        let transfer = DataTransfer::new(vec![
            Box::new(FakeBackend { scheme: "scp", result: true }),
            Box::new(FakeBackend { scheme: "s3", result: true }),
        ]);
        let result = transfer.upload(Path::new("/tmp/x"), &location("scp://host/path")).unwrap();
        assert!(result);
    }

    #[test]
    fn returns_false_when_no_backend_supports_the_scheme() {
        let transfer = DataTransfer::new(vec![Box::new(FakeBackend { scheme: "scp", result: true })]);
        let result = transfer.upload(Path::new("/tmp/x"), &location("s3://bucket/key")).unwrap();
        assert!(!result);
    }
}
