//! MetadataLocationsStore — the list of places a steward package's
//! metadata (list of data-source URLs) is published to.

use serde::{Deserialize, Serialize};

use super::datasets::DataLocation;
use super::{ConfigStore, ValidationReport};

/// Top-level shape: `{ "locations": [ ... ] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataLocationsFile {
    #[serde(default)]
    pub locations: Vec<DataLocation>,
}

/// Marker type implementing the edit/validate/promote/abort protocol for
/// `metadata.json`.
pub struct MetadataLocationsStore;

impl ConfigStore for MetadataLocationsStore {
    type Model = MetadataLocationsFile;

    fn validate(contents: &str) -> (ValidationReport, Option<Self::Model>) {
        let mut report = ValidationReport::new();
        let file: MetadataLocationsFile = match serde_json::from_str(contents) {
            Ok(file) => file,
            Err(e) => {
                report.error(format!("malformed JSON: {e}"));
                return (report, None);
            }
        };

        if file.locations.is_empty() {
            report.warning("no metadata locations configured; publish-metadata will have nothing to do");
        }
        for location in &file.locations {
            if let Err(e) = location.check_scheme_compatibility() {
                report.error(format!("metadata location: {e}"));
            }
        }

        (report, Some(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_locations_list_is_a_warning() {
        let (report, file) = MetadataLocationsStore::validate(r#"{"locations":[]}"#);
        assert!(report.all_ok());
        assert!(!report.items.is_empty());
        assert!(file.unwrap().locations.is_empty());
    }

    #[test]
    fn valid_locations_round_trip() {
        let json = r#"{"locations":[{"url":"https://example.com/meta"}]}"#;
        let (report, file) = MetadataLocationsStore::validate(json);
        assert!(report.all_ok());
        assert_eq!(file.unwrap().locations.len(), 1);
    }
}
