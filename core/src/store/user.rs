//! UserStore — the owner's own contact details, used to address
//! steward packages ("from <user>").

use serde::{Deserialize, Serialize};

use super::{ConfigStore, ValidationReport};

/// The Paradux owner's contact details — the same shape as `Steward`
/// minus `acceptedTs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(rename = "contact-email", skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(rename = "contact-phone", skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
}

/// Marker type implementing the edit/validate/promote/abort protocol for
/// `user.json`.
pub struct UserStore;

impl ConfigStore for UserStore {
    type Model = User;

    fn validate(contents: &str) -> (ValidationReport, Option<Self::Model>) {
        let mut report = ValidationReport::new();
        match serde_json::from_str::<User>(contents) {
            Ok(user) => {
                if user.name.trim().is_empty() {
                    report.error("user.name must not be empty");
                }
                (report, Some(user))
            }
            Err(e) => {
                report.error(format!("malformed JSON: {e}"));
                (report, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_user_round_trips() {
        let json = r#"{"name":"Ada Lovelace","contact-email":"ada@example.com"}"#;
        let (report, user) = UserStore::validate(json);
        assert!(report.all_ok());
        let user = user.unwrap();
        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.contact_email.as_deref(), Some("ada@example.com"));
        assert!(user.address.is_none());
    }

    #[test]
    fn empty_name_is_an_error() {
        let json = r#"{"name":""}"#;
        let (report, _) = UserStore::validate(json);
        assert!(!report.all_ok());
    }

    #[test]
    fn malformed_json_is_an_error_with_no_model() {
        let (report, user) = UserStore::validate("{not json");
        assert!(!report.all_ok());
        assert!(user.is_none());
    }
}
