//! StewardsStore — the registry of trusted third parties who each hold
//! one Shamir share.

use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{ConfigStore, ValidationReport};
use crate::timestamp;

/// An opaque, unique steward identifier. Assigned when a steward is
/// first entered and never reused, even after deletion.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StewardId(pub String);

impl StewardId {
    pub fn new_random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for StewardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StewardId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

/// A trusted third party holding one share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Steward {
    pub name: String,
    pub address: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    /// POSIX seconds the user recorded the steward's agreement.
    pub accepted_ts: i64,
}

impl Serialize for Steward {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Raw<'a> {
            name: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            address: &'a Option<String>,
            #[serde(rename = "contact-email", skip_serializing_if = "Option::is_none")]
            contact_email: &'a Option<String>,
            #[serde(rename = "contact-phone", skip_serializing_if = "Option::is_none")]
            contact_phone: &'a Option<String>,
            #[serde(rename = "accepted-on")]
            accepted_on: String,
        }
        Raw {
            name: &self.name,
            address: &self.address,
            contact_email: &self.contact_email,
            contact_phone: &self.contact_phone,
            accepted_on: timestamp::format_timestamp(self.accepted_ts),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Steward {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            name: String,
            #[serde(default)]
            address: Option<String>,
            #[serde(default, rename = "contact-email")]
            contact_email: Option<String>,
            #[serde(default, rename = "contact-phone")]
            contact_phone: Option<String>,
            #[serde(rename = "accepted-on")]
            accepted_on: String,
        }
        let raw = Raw::deserialize(deserializer)?;
        let accepted_ts = timestamp::parse_timestamp(&raw.accepted_on).map_err(serde::de::Error::custom)?;
        Ok(Steward {
            name: raw.name,
            address: raw.address,
            contact_email: raw.contact_email,
            contact_phone: raw.contact_phone,
            accepted_ts,
        })
    }
}

/// Insertion-ordered registry of stewards, serialized as a JSON object
/// keyed by [`StewardId`] (`{ "stewards": { <id>: {...} } }`).
///
/// Insertion order is preserved on both serialize and deserialize: the
/// writer emits entries via `collect_map` in push order, and the reader
/// streams map entries in the order they appear in the source document.
#[derive(Debug, Clone, Default)]
pub struct StewardRegistry {
    entries: Vec<(StewardId, Steward)>,
}

impl StewardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new steward, or replaces the entry if `id` already
    /// exists (its position is preserved rather than moved to the end).
    pub fn insert(&mut self, id: StewardId, steward: Steward) {
        if let Some(existing) = self.entries.iter_mut().find(|(eid, _)| eid == &id) {
            existing.1 = steward;
        } else {
            self.entries.push((id, steward));
        }
    }

    pub fn remove(&mut self, id: &StewardId) -> Option<Steward> {
        let pos = self.entries.iter().position(|(eid, _)| eid == id)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn get(&self, id: &StewardId) -> Option<&Steward> {
        self.entries.iter().find(|(eid, _)| eid == id).map(|(_, s)| s)
    }

    /// Stewards in the order they were first inserted.
    pub fn iter(&self) -> impl Iterator<Item = (&StewardId, &Steward)> {
        self.entries.iter().map(|(id, s)| (id, s))
    }

    pub fn ids(&self) -> impl Iterator<Item = &StewardId> {
        self.entries.iter().map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for StewardRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Envelope<'a> {
            stewards: StewardsMap<'a>,
        }
        struct StewardsMap<'a>(&'a StewardRegistry);
        impl<'a> Serialize for StewardsMap<'a> {
            fn serialize<S2: Serializer>(&self, serializer: S2) -> Result<S2::Ok, S2::Error> {
                let mut map = serializer.serialize_map(Some(self.0.entries.len()))?;
                for (id, steward) in &self.0.entries {
                    map.serialize_entry(&id.0, steward)?;
                }
                map.end()
            }
        }
        Envelope {
            stewards: StewardsMap(self),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StewardRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EnvelopeVisitor;

        impl<'de> Visitor<'de> for EnvelopeVisitor {
            type Value = StewardRegistry;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(r#"an object shaped {"stewards": {...}}"#)
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut registry = None;
                while let Some(key) = map.next_key::<String>()? {
                    if key == "stewards" {
                        registry = Some(map.next_value::<StewardsMapDe>()?.0);
                    } else {
                        let _ = map.next_value::<serde::de::IgnoredAny>()?;
                    }
                }
                Ok(registry.unwrap_or_default())
            }
        }

        struct StewardsMapDe(StewardRegistry);

        impl<'de> Deserialize<'de> for StewardsMapDe {
            fn deserialize<D2: Deserializer<'de>>(deserializer: D2) -> Result<Self, D2::Error> {
                struct MapVisitor;
                impl<'de> Visitor<'de> for MapVisitor {
                    type Value = StewardsMapDe;

                    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        f.write_str("a map of steward id to steward")
                    }

                    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                        let mut registry = StewardRegistry::new();
                        while let Some((id, steward)) = map.next_entry::<String, Steward>()? {
                            registry.insert(StewardId(id), steward);
                        }
                        Ok(StewardsMapDe(registry))
                    }
                }
                deserializer.deserialize_map(MapVisitor)
            }
        }

        deserializer.deserialize_map(EnvelopeVisitor)
    }
}

/// Marker type implementing the edit/validate/promote/abort protocol for
/// `stewards.json`.
pub struct StewardsStore;

impl ConfigStore for StewardsStore {
    type Model = StewardRegistry;

    fn validate(contents: &str) -> (ValidationReport, Option<Self::Model>) {
        let mut report = ValidationReport::new();
        match serde_json::from_str::<StewardRegistry>(contents) {
            Ok(registry) => {
                let mut seen_names = std::collections::HashSet::new();
                for (id, steward) in registry.iter() {
                    if steward.name.trim().is_empty() {
                        report.error(format!("steward {id} has an empty name"));
                    }
                    if !seen_names.insert(steward.name.clone()) {
                        report.warning(format!("duplicate steward name: {}", steward.name));
                    }
                }
                (report, Some(registry))
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

    fn steward(name: &str) -> Steward {
        Steward {
            name: name.to_string(),
            address: None,
            contact_email: None,
            contact_phone: None,
            accepted_ts: 1_700_000_000,
        }
    }

    #[test]
    fn round_trips_preserving_insertion_order() {
        let mut registry = StewardRegistry::new();
        registry.insert(StewardId("a".into()), steward("Alice"));
        registry.insert(StewardId("b".into()), steward("Bob"));
        registry.insert(StewardId("c".into()), steward("Carol"));

        let json = serde_json::to_string(&registry).unwrap();
        let parsed: StewardRegistry = serde_json::from_str(&json).unwrap();

        let ids: Vec<String> = parsed.ids().map(|id| id.0.clone()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn serializes_to_keyed_object_shape() {
        let mut registry = StewardRegistry::new();
        registry.insert(StewardId("abc".into()), steward("Alice"));
        let value: serde_json::Value = serde_json::to_value(&registry).unwrap();
        assert!(value["stewards"]["abc"]["name"] == "Alice");
        assert!(value["stewards"]["abc"]["accepted-on"].is_string());
    }

    #[test]
    fn insert_replaces_without_reordering() {
        let mut registry = StewardRegistry::new();
        registry.insert(StewardId("a".into()), steward("Alice"));
        registry.insert(StewardId("b".into()), steward("Bob"));
        registry.insert(StewardId("a".into()), steward("Alice Updated"));

        let ids: Vec<String> = registry.ids().map(|id| id.0.clone()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(registry.get(&StewardId("a".into())).unwrap().name, "Alice Updated");
    }

    #[test]
    fn empty_steward_name_is_an_error() {
        let (report, _) = StewardsStore::validate(r#"{"stewards":{"x":{"name":"","accepted-on":"20231114-221320"}}}"#);
        assert!(!report.all_ok());
    }
}
