//! SecretsStore — the only store that is not user-editable. Persists
//! the [`ShareEngine`] polynomial, the recovery secret, and the
//! append-only ledger of shares issued to stewards.

use std::fmt;
use std::path::Path;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::atomic::atomic_write;
use super::stewards::StewardId;
use crate::error::{ParaduxError, ParaduxResult};
use crate::shamir::{MersennePrime, Polynomial, Share, ShareEngine};
use crate::timestamp;

/// `{ share: (x, y), issuedTs }`. Append-only once present
/// for a steward: the same `(x, y)` is emitted on every subsequent
/// package export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedShare {
    pub share: Share,
    pub issued_ts: i64,
}

impl Serialize for IssuedShare {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Raw<'a> {
            #[serde(rename = "shamir-share")]
            shamir_share: &'a Share,
            #[serde(rename = "issued-on")]
            issued_on: String,
        }
        Raw {
            shamir_share: &self.share,
            issued_on: timestamp::format_timestamp(self.issued_ts),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for IssuedShare {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(rename = "shamir-share")]
            shamir_share: Share,
            #[serde(rename = "issued-on")]
            issued_on: String,
        }
        let raw = Raw::deserialize(deserializer)?;
        let issued_ts = timestamp::parse_timestamp(&raw.issued_on).map_err(serde::de::Error::custom)?;
        Ok(IssuedShare {
            share: raw.shamir_share,
            issued_ts,
        })
    }
}

/// Insertion-ordered ledger of issued shares, serialized as a JSON
/// object keyed by [`StewardId`] (mirrors [`super::stewards::StewardRegistry`]).
#[derive(Debug, Clone, Default)]
struct IssuedShareLedger {
    entries: Vec<(StewardId, IssuedShare)>,
}

impl IssuedShareLedger {
    fn get(&self, id: &StewardId) -> Option<&IssuedShare> {
        self.entries.iter().find(|(eid, _)| eid == id).map(|(_, s)| s)
    }

    fn insert(&mut self, id: StewardId, issued: IssuedShare) {
        self.entries.push((id, issued));
    }

    fn max_x(&self) -> Option<BigUint> {
        self.entries.iter().map(|(_, issued)| issued.share.x.clone()).max()
    }
}

impl Serialize for IssuedShareLedger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, issued) in &self.entries {
            map.serialize_entry(&id.0, issued)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for IssuedShareLedger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LedgerVisitor;
        impl<'de> Visitor<'de> for LedgerVisitor {
            type Value = IssuedShareLedger;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of steward id to issued share")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut ledger = IssuedShareLedger::default();
                while let Some((id, issued)) = map.next_entry::<String, IssuedShare>()? {
                    ledger.insert(StewardId(id), issued);
                }
                Ok(ledger)
            }
        }
        deserializer.deserialize_map(LedgerVisitor)
    }
}

/// Persisted shape of `secrets.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsRecord {
    mersenne: usize,
    polynomial: Polynomial,
    #[serde(rename = "watermark-x", with = "crate::shamir::serde_bigint")]
    watermark_x: BigUint,
    #[serde(rename = "recovery-secret", with = "crate::shamir::serde_bigint")]
    recovery_secret: BigUint,
    #[serde(rename = "issued-shares")]
    issued_shares: IssuedShareLedger,
}

impl SecretsRecord {
    /// Builds a fresh record at initialisation time: a new random
    /// polynomial of the given threshold, over the field selected for
    /// `bit_length`, wrapping `secret`. `watermark_x` starts at 1.
    pub fn new(bit_length: u32, min_stewards: u32, secret: BigUint) -> ParaduxResult<Self> {
        let prime = MersennePrime::for_bit_length(bit_length)?;
        let engine = ShareEngine::new(prime);
        let polynomial = engine.split(&secret, min_stewards)?;
        Ok(SecretsRecord {
            mersenne: prime.index(),
            polynomial,
            watermark_x: BigUint::one(),
            recovery_secret: secret,
            issued_shares: IssuedShareLedger::default(),
        })
    }

    pub fn min_stewards(&self) -> u32 {
        self.polynomial.degree() as u32 + 1
    }

    pub fn mersenne(&self) -> usize {
        self.mersenne
    }

    pub fn recovery_secret(&self) -> &BigUint {
        &self.recovery_secret
    }

    fn engine(&self) -> ParaduxResult<ShareEngine> {
        Ok(ShareEngine::new(MersennePrime::from_index(self.mersenne)?))
    }

    /// `issue_share(stewardId)` is idempotent and watermark-driven.
    /// Callers MUST `save` before surfacing the returned share externally.
    pub fn issue_share(&mut self, id: StewardId) -> ParaduxResult<Share> {
        if let Some(existing) = self.issued_shares.get(&id) {
            return Ok(existing.share.clone());
        }

        let engine = self.engine()?;
        let x = self.watermark_x.clone();
        let y = engine.evaluate(&self.recovery_secret, &self.polynomial, &x);
        let share = Share { x: x.clone(), y };

        self.issued_shares.insert(
            id,
            IssuedShare {
                share: share.clone(),
                issued_ts: timestamp::now(),
            },
        );
        self.watermark_x = &x + BigUint::one();
        Ok(share)
    }

    pub fn issued_share(&self, id: &StewardId) -> Option<&Share> {
        self.issued_shares.get(id).map(|issued| &issued.share)
    }

    /// Atomic rewrite of the JSON file with mode `0600`.
    pub fn save(&self, path: &Path) -> ParaduxResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ParaduxError::JsonMalformed {
            path: path.display().to_string(),
            source,
        })?;
        atomic_write(path, json.as_bytes())
    }

    pub fn load(path: &Path) -> ParaduxResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ParaduxError::FileMissing(path.display().to_string())
            } else {
                ParaduxError::Io(e)
            }
        })?;
        serde_json::from_str(&raw).map_err(|source| ParaduxError::JsonMalformed {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Reasserts the watermark invariant (`watermark_x ≥ 1 + max(x of any
/// issued share)`) — used by tests and by recovery-path sanity checks.
pub fn watermark_is_consistent(record: &SecretsRecord) -> bool {
    match record.issued_shares.max_x() {
        Some(max_x) => record.watermark_x > max_x,
        None => !record.watermark_x.is_zero(),
    }
}
