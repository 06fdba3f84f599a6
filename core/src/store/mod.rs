//! # ConfigStore — edit / validate / promote / abort
//!
//! An editable JSON config file with safe revision semantics:
//!
//! ```text
//!   clean ── edit ──► dirty ── validate ──► {valid, invalid}
//!    ▲                                          │
//!    └──── promote (on valid) / abort ──────────┘
//! ```
//!
//! Concrete stores ([`stewards`], [`user`], [`datasets`],
//! [`metadata_locations`]) implement [`ConfigStore::validate`]; the
//! edit/promote/abort state machine is shared here so every store gets
//! the same crash-safety guarantees for free.

pub mod atomic;
pub mod comments;
pub mod datasets;
pub mod metadata_locations;
pub mod secrets;
pub mod stewards;
pub mod user;

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ParaduxError, ParaduxResult};
use crate::paths::SECRET_FILE_MODE;
use crate::ports::Editor;

/// Severity of a single validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Notice,
}

/// A single finding produced while validating a temp file.
#[derive(Debug, Clone)]
pub struct ValidationItem {
    pub level: Level,
    pub message: String,
}

/// Ordered sequence of [`ValidationItem`]s produced by one validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub items: Vec<ValidationItem>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.items.push(ValidationItem {
            level: Level::Error,
            message: message.into(),
        });
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.items.push(ValidationItem {
            level: Level::Warning,
            message: message.into(),
        });
    }

    pub fn notice(&mut self, message: impl Into<String>) {
        self.items.push(ValidationItem {
            level: Level::Notice,
            message: message.into(),
        });
    }

    /// True iff no `ERROR` items were recorded.
    pub fn all_ok(&self) -> bool {
        !self.items.iter().any(|item| item.level == Level::Error)
    }
}

/// Shared edit/validate/promote/abort protocol for a single config file.
///
/// Implementors only need to supply [`ConfigStore::validate`]; the
/// remaining operations are provided and identical across every store.
pub trait ConfigStore {
    /// The strongly-typed view this store parses its JSON file into.
    type Model: Serialize + DeserializeOwned;

    /// Parses (after comment-stripping) and validates file contents.
    /// Returns the model only when parsing succeeded; a report with
    /// `ERROR` items can still accompany `Some` (e.g. schema warnings on
    /// an otherwise-parseable file) or `None` (unparseable JSON).
    fn validate(contents: &str) -> (ValidationReport, Option<Self::Model>);

    /// Loads and parses the master file directly, bypassing the temp/edit
    /// machinery — used by read-only operations (packaging, recovery).
    fn load(master_path: &Path) -> ParaduxResult<Self::Model> {
        let raw = fs::read_to_string(master_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ParaduxError::FileMissing(master_path.display().to_string())
            } else {
                ParaduxError::Io(e)
            }
        })?;
        let stripped = comments::strip_comments(&raw);
        serde_json::from_str(&stripped).map_err(|source| ParaduxError::JsonMalformed {
            path: master_path.display().to_string(),
            source,
        })
    }

    /// Copies `master_path` over `temp_path` (if the temp file doesn't
    /// already exist), invokes the editor on it, then validates the
    /// result. Never promotes or aborts — that's a separate, explicit
    /// step so the caller can show the report to the operator first.
    fn edit_and_report(
        master_path: &Path,
        temp_path: &Path,
        editor: &dyn Editor,
    ) -> ParaduxResult<ValidationReport> {
        if !temp_path.exists() {
            fs::copy(master_path, temp_path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ParaduxError::FileMissing(master_path.display().to_string())
                } else {
                    ParaduxError::Io(e)
                }
            })?;
            atomic::set_mode(temp_path, SECRET_FILE_MODE)?;
        }

        editor.launch(temp_path)?;

        let raw = fs::read_to_string(temp_path)?;
        let stripped = comments::strip_comments(&raw);
        let (report, _model) = Self::validate(&stripped);
        Ok(report)
    }

    /// Atomically renames `temp_path` over `master_path`. A no-op if the
    /// temp file doesn't exist, so a second call is equivalent to the
    /// first.
    fn promote_temp(master_path: &Path, temp_path: &Path) -> ParaduxResult<()> {
        if temp_path.exists() {
            fs::rename(temp_path, master_path)?;
        }
        Ok(())
    }

    /// Removes `temp_path`. A no-op if it doesn't exist — in particular,
    /// calling this after `promote_temp` already consumed the temp file
    /// is harmless.
    fn abort_temp(temp_path: &Path) -> ParaduxResult<()> {
        if temp_path.exists() {
            fs::remove_file(temp_path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct FakeEditor {
        write: &'static str,
        exit_ok: bool,
    }

    impl Editor for FakeEditor {
        fn launch(&self, path: &Path) -> ParaduxResult<()> {
            fs::write(path, self.write)?;
            if self.exit_ok {
                Ok(())
            } else {
                Err(ParaduxError::EditorFailed(Some(1)))
            }
        }
    }

    struct DummyStore;

    impl ConfigStore for DummyStore {
        type Model = serde_json::Value;

        fn validate(contents: &str) -> (ValidationReport, Option<Self::Model>) {
            let mut report = ValidationReport::new();
            match serde_json::from_str::<serde_json::Value>(contents) {
                Ok(value) => (report, Some(value)),
                Err(e) => {
                    report.error(format!("malformed JSON: {e}"));
                    (report, None)
                }
            }
        }
    }

    #[test]
    fn edit_abort_leaves_master_untouched() {
        let dir = tempdir().unwrap();
        let master = dir.path().join("m.json");
        let temp = dir.path().join("m.tmp.json");
        fs::write(&master, b"{\"a\":1}").unwrap();

        let editor = FakeEditor {
            write: "not json {{{",
            exit_ok: true,
        };
        let report = DummyStore::edit_and_report(&master, &temp, &editor).unwrap();
        assert!(!report.all_ok());

        DummyStore::abort_temp(&temp).unwrap();
        assert!(!temp.exists());
        assert_eq!(fs::read_to_string(&master).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn edit_promote_replaces_master() {
        let dir = tempdir().unwrap();
        let master = dir.path().join("m.json");
        let temp = dir.path().join("m.tmp.json");
        fs::write(&master, b"{\"a\":1}").unwrap();

        let editor = FakeEditor {
            write: "{\"a\":2}",
            exit_ok: true,
        };
        let report = DummyStore::edit_and_report(&master, &temp, &editor).unwrap();
        assert!(report.all_ok());

        DummyStore::promote_temp(&master, &temp).unwrap();
        assert!(!temp.exists());
        assert_eq!(fs::read_to_string(&master).unwrap(), "{\"a\":2}");
    }

    #[test]
    fn promote_twice_is_a_noop_the_second_time() {
        let dir = tempdir().unwrap();
        let master = dir.path().join("m.json");
        let temp = dir.path().join("m.tmp.json");
        fs::write(&master, b"{\"a\":1}").unwrap();
        fs::write(&temp, b"{\"a\":2}").unwrap();

        DummyStore::promote_temp(&master, &temp).unwrap();
        assert_eq!(fs::read_to_string(&master).unwrap(), "{\"a\":2}");

        // Second call: temp no longer exists, so this must be a no-op.
        DummyStore::promote_temp(&master, &temp).unwrap();
        assert_eq!(fs::read_to_string(&master).unwrap(), "{\"a\":2}");
    }

    #[test]
    fn abort_after_promote_is_a_noop() {
        let dir = tempdir().unwrap();
        let master = dir.path().join("m.json");
        let temp = dir.path().join("m.tmp.json");
        fs::write(&master, b"{\"a\":1}").unwrap();
        fs::write(&temp, b"{\"a\":2}").unwrap();

        DummyStore::promote_temp(&master, &temp).unwrap();
        DummyStore::abort_temp(&temp).unwrap(); // must not error
        assert_eq!(fs::read_to_string(&master).unwrap(), "{\"a\":2}");
    }

    #[test]
    fn editor_failure_is_surfaced() {
        let dir = tempdir().unwrap();
        let master = dir.path().join("m.json");
        let temp = dir.path().join("m.tmp.json");
        fs::write(&master, b"{\"a\":1}").unwrap();

        let editor = FakeEditor {
            write: "{\"a\":2}",
            exit_ok: false,
        };
        let result = DummyStore::edit_and_report(&master, &temp, &editor);
        assert!(matches!(result, Err(ParaduxError::EditorFailed(_))));
    }
}
