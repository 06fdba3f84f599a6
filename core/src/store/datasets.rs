//! DatasetsStore — the user-maintained list of data sets to back up, each
//! with a source location and one or more destination locations.

use serde::{Deserialize, Serialize};
use url::Url;

use super::{ConfigStore, ValidationReport};
use crate::error::{ParaduxError, ParaduxResult};

/// A credential bundle, tagged by which transfer scheme it is valid for.
/// Untyped dictionaries are rejected in favor of this sum type: unknown
/// or conflicting shapes fail `SchemaViolation` rather than being
/// accepted as opaque JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Credentials {
    Password { username: String, password: String },
    #[serde(rename_all = "kebab-case")]
    Ssh { username: String, private_key: String },
    #[serde(rename_all = "kebab-case")]
    AwsApi { access_key_id: String, secret_access_key: String },
}

impl Credentials {
    /// The URL schemes this credential kind is valid for. Checked at
    /// parse time so a scheme/credential mismatch surfaces as
    /// `SchemaViolation` rather than failing later inside a transfer
    /// backend.
    fn compatible_schemes(&self) -> &'static [&'static str] {
        match self {
            Credentials::Password { .. } => &["http", "https", "ftp"],
            Credentials::Ssh { .. } => &["scp", "sftp", "ssh"],
            Credentials::AwsApi { .. } => &["s3"],
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Credentials::Password { .. } => "password",
            Credentials::Ssh { .. } => "ssh",
            Credentials::AwsApi { .. } => "aws-api",
        }
    }
}

/// `{ name?, description?, url, credentials? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

impl DataLocation {
    /// Validates that `credentials` (if present) is compatible with
    /// `url`'s scheme. Called both from `serde` deserialization sites
    /// (indirectly, via `DatasetsStore::validate`) and wherever a
    /// `DataLocation` is constructed programmatically.
    pub fn check_scheme_compatibility(&self) -> ParaduxResult<()> {
        let scheme = self.url.scheme();
        match &self.credentials {
            Some(creds) if !creds.compatible_schemes().contains(&scheme) => {
                Err(ParaduxError::SchemaViolation(format!(
                    "{} credentials are not valid for scheme {scheme:?}",
                    creds.kind()
                )))
            }
            _ => Ok(()),
        }
    }
}

/// `{ name, description?, source, destinations }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: DataLocation,
    pub destinations: Vec<DataLocation>,
}

/// Top-level shape: `{ "datasets": [ ... ] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetsFile {
    #[serde(default)]
    pub datasets: Vec<Dataset>,
}

/// Marker type implementing the edit/validate/promote/abort protocol for
/// `datasets.json`.
pub struct DatasetsStore;

impl ConfigStore for DatasetsStore {
    type Model = DatasetsFile;

    fn validate(contents: &str) -> (ValidationReport, Option<Self::Model>) {
        let mut report = ValidationReport::new();
        let file: DatasetsFile = match serde_json::from_str(contents) {
            Ok(file) => file,
            Err(e) => {
                report.error(format!("malformed JSON: {e}"));
                return (report, None);
            }
        };

        for dataset in &file.datasets {
            if dataset.name.trim().is_empty() {
                report.error("dataset name must not be empty");
            }
            if dataset.destinations.is_empty() {
                report.warning(format!("dataset {:?} has no destinations", dataset.name));
            }
            if let Err(e) = dataset.source.check_scheme_compatibility() {
                report.error(format!("dataset {:?} source: {e}", dataset.name));
            }
            for dest in &dataset.destinations {
                if let Err(e) = dest.check_scheme_compatibility() {
                    report.error(format!("dataset {:?} destination: {e}", dataset.name));
                }
            }
        }

        (report, Some(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_dataset_round_trips() {
        let json = r#"{
            "datasets": [
                {
                    "name": "photos",
                    "source": { "url": "https://example.com/photos" },
                    "destinations": [
                        { "url": "scp://backup.example.com/photos",
                          "credentials": { "type": "ssh", "username": "u", "private-key": "KEY" } }
                    ]
                }
            ]
        }"#;
        let (report, file) = DatasetsStore::validate(json);
        assert!(report.all_ok(), "{:?}", report.items);
        assert_eq!(file.unwrap().datasets[0].name, "photos");
    }

    #[test]
    fn scheme_credential_mismatch_is_a_schema_violation() {
        let json = r#"{
            "datasets": [
                {
                    "name": "photos",
                    "source": { "url": "https://example.com/photos",
                                "credentials": { "type": "ssh", "username": "u", "private-key": "KEY" } },
                    "destinations": []
                }
            ]
        }"#;
        let (report, _) = DatasetsStore::validate(json);
        assert!(!report.all_ok());
    }

    #[test]
    fn empty_destinations_is_a_warning_not_an_error() {
        let json = r#"{
            "datasets": [
                { "name": "photos", "source": { "url": "https://example.com/photos" }, "destinations": [] }
            ]
        }"#;
        let (report, _) = DatasetsStore::validate(json);
        assert!(report.all_ok());
        assert!(report.items.iter().any(|i| i.level == super::super::Level::Warning));
    }
}
