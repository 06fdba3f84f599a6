//! # StewardPackager
//!
//! Given a mounted container's stores, issues (idempotently) a share for
//! each configured steward and renders the bundle each one receives.

use std::fmt::Write as _;

use serde::Serialize;

use crate::error::ParaduxResult;
use crate::shamir::Share;
use crate::store::metadata_locations::MetadataLocationsFile;
use crate::store::secrets::SecretsRecord;
use crate::store::stewards::{Steward, StewardId, StewardRegistry};
use crate::store::user::User;

/// The version string embedded in every rendered package. Bumped
/// alongside on-disk format changes.
pub const PARADUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `{ user, steward, share, mersenne, minStewards, metadataLocations,
/// version }`.
#[derive(Debug, Clone, Serialize)]
pub struct StewardPackage {
    pub user: User,
    pub steward: Steward,
    #[serde(rename = "stewardshare")]
    pub share: Share,
    pub mersenne: usize,
    #[serde(rename = "min-stewards")]
    pub min_stewards: u32,
    #[serde(rename = "metadata-locations")]
    pub metadata_locations: Vec<String>,
    pub version: String,
}

impl StewardPackage {
    /// Stable key names: `user, steward, stewardshare, mersenne, min-stewards`.
    pub fn as_json(&self) -> ParaduxResult<String> {
        serde_json::to_string_pretty(self).map_err(|source| crate::error::ParaduxError::JsonMalformed {
            path: "<steward package>".to_string(),
            source,
        })
    }

    /// Fixed multi-paragraph template addressed to the steward by name.
    /// Wording is not part of the compatibility surface; the fields
    /// present are.
    pub fn as_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Dear {},", self.steward.name);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{} is asking you to hold a share of their Paradux recovery secret.",
            self.user.name
        );
        let _ = writeln!(out, "You can reach them at:");
        if let Some(address) = &self.user.address {
            let _ = writeln!(out, "  address: {address}");
        }
        if let Some(email) = &self.user.contact_email {
            let _ = writeln!(out, "  email: {email}");
        }
        if let Some(phone) = &self.user.contact_phone {
            let _ = writeln!(out, "  phone: {phone}");
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Paradux version: {}", self.version);
        let _ = writeln!(out);
        let _ = writeln!(out, "Your share:");
        let _ = writeln!(
            out,
            "  x = {}, y = {}, m = {}, k = {}",
            self.share.x, self.share.y, self.mersenne, self.min_stewards
        );
        let _ = writeln!(out);
        if self.metadata_locations.is_empty() {
            let _ = writeln!(out, "No metadata locations are currently published.");
        } else {
            let _ = writeln!(out, "Metadata is published at:");
            for location in &self.metadata_locations {
                let _ = writeln!(out, "  {location}");
            }
        }
        out
    }
}

/// Assembles one [`StewardPackage`] per steward in `stewards`, issuing
/// shares from `secrets` as needed. Returns `true` alongside the
/// packages if any new shares were issued (callers MUST `secrets.save`
/// before surfacing these packages, so a crash can never hand out a
/// share that isn't persisted).
pub fn build_packages(
    user: &User,
    stewards: &StewardRegistry,
    secrets: &mut SecretsRecord,
    metadata_locations: &MetadataLocationsFile,
) -> ParaduxResult<(Vec<StewardPackage>, bool)> {
    let locations: Vec<String> = metadata_locations
        .locations
        .iter()
        .map(|loc| loc.url.to_string())
        .collect();

    let mut packages = Vec::with_capacity(stewards.len());
    let mut issued_anything_new = false;

    for (id, steward) in stewards.iter() {
        let had_share_before = secrets.issued_share(id).is_some();
        let share = secrets.issue_share(id.clone())?;
        if !had_share_before {
            issued_anything_new = true;
        }

        packages.push(StewardPackage {
            user: user.clone(),
            steward: steward.clone(),
            share,
            mersenne: secrets.mersenne(),
            min_stewards: secrets.min_stewards(),
            metadata_locations: locations.clone(),
            version: PARADUX_VERSION.to_string(),
        });
    }

    Ok((packages, issued_anything_new))
}

/// Builds the package for a single steward, for `export-steward-packages
/// --steward-id`.
pub fn build_package_for(
    user: &User,
    stewards: &StewardRegistry,
    secrets: &mut SecretsRecord,
    metadata_locations: &MetadataLocationsFile,
    id: &StewardId,
) -> ParaduxResult<(StewardPackage, bool)> {
    let steward = stewards
        .get(id)
        .ok_or_else(|| crate::error::ParaduxError::FileMissing(format!("no such steward: {id}")))?;

    let had_share_before = secrets.issued_share(id).is_some();
    let share = secrets.issue_share(id.clone())?;

    let locations: Vec<String> = metadata_locations
        .locations
        .iter()
        .map(|loc| loc.url.to_string())
        .collect();

    Ok((
        StewardPackage {
            user: user.clone(),
            steward: steward.clone(),
            share,
            mersenne: secrets.mersenne(),
            min_stewards: secrets.min_stewards(),
            metadata_locations: locations,
            version: PARADUX_VERSION.to_string(),
        },
        !had_share_before,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::datasets::DataLocation;
    use crate::store::secrets::SecretsRecord;
    use crate::store::stewards::Steward;
    use num_bigint::BigUint;

    fn sample_user() -> User {
        User {
            name: "Ada".into(),
            address: None,
            contact_email: Some("ada@example.com".into()),
            contact_phone: None,
        }
    }

    fn sample_steward(name: &str) -> Steward {
        Steward {
            name: name.to_string(),
            address: None,
            contact_email: None,
            contact_phone: None,
            accepted_ts: 1_700_000_000,
        }
    }

    #[test]
    fn build_packages_issues_one_share_per_steward() {
        let mut stewards = StewardRegistry::new();
        stewards.insert(StewardId("a".into()), sample_steward("Alice"));
        stewards.insert(StewardId("b".into()), sample_steward("Bob"));

        let mut secrets = SecretsRecord::new(127, 2, BigUint::from(99u32)).unwrap();
        let metadata = MetadataLocationsFile {
            locations: vec![DataLocation {
                name: None,
                description: None,
                url: "https://example.com/meta".parse().unwrap(),
                credentials: None,
            }],
        };

        let (packages, issued_new) = build_packages(&sample_user(), &stewards, &mut secrets, &metadata).unwrap();
        assert!(issued_new);
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].share.x, BigUint::from(1u32));
        assert_eq!(packages[1].share.x, BigUint::from(2u32));
        assert_eq!(packages[0].metadata_locations, vec!["https://example.com/meta".to_string()]);
    }

    #[test]
    fn rebuilding_packages_does_not_reissue_shares() {
        let mut stewards = StewardRegistry::new();
        stewards.insert(StewardId("a".into()), sample_steward("Alice"));

        let mut secrets = SecretsRecord::new(127, 2, BigUint::from(99u32)).unwrap();
        let metadata = MetadataLocationsFile::default();

        let (_, issued_new_1) = build_packages(&sample_user(), &stewards, &mut secrets, &metadata).unwrap();
        let (packages_2, issued_new_2) = build_packages(&sample_user(), &stewards, &mut secrets, &metadata).unwrap();
        assert!(issued_new_1);
        assert!(!issued_new_2);
        assert_eq!(packages_2[0].share.x, BigUint::from(1u32));
    }

    #[test]
    fn as_text_omits_unset_contact_fields() {
        let mut stewards = StewardRegistry::new();
        stewards.insert(StewardId("a".into()), sample_steward("Alice"));
        let mut secrets = SecretsRecord::new(127, 2, BigUint::from(99u32)).unwrap();
        let metadata = MetadataLocationsFile::default();

        let (packages, _) = build_packages(&sample_user(), &stewards, &mut secrets, &metadata).unwrap();
        let text = packages[0].as_text();
        assert!(text.contains("Dear Alice"));
        assert!(text.contains("email: ada@example.com"));
        assert!(!text.contains("phone:"));
    }
}
