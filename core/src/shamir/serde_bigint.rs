//! `num-bigint`'s own `serde` feature encodes a `BigUint` as its raw
//! little-endian `u32` digit array, which is not stable, human-readable
//! JSON and cannot round-trip through a JSON number without losing
//! precision for fields up to 9689 bits wide. Every `BigUint` that
//! crosses a JSON file or the recovery-input wire format instead uses
//! these helpers (via `#[serde(with = "...")]`) to render as a decimal
//! string.

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
    value.to_str_radix(10).serialize(serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse::<BigUint>().map_err(serde::de::Error::custom)
}

/// `Vec<BigUint>` variant, for `Polynomial::coefficients`.
pub mod vec {
    use super::*;

    pub fn serialize<S: Serializer>(values: &[BigUint], serializer: S) -> Result<S::Ok, S::Error> {
        let strings: Vec<String> = values.iter().map(|v| v.to_str_radix(10)).collect();
        strings.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<BigUint>, D::Error> {
        let strings = Vec::<String>::deserialize(deserializer)?;
        strings
            .into_iter()
            .map(|s| s.parse::<BigUint>().map_err(serde::de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super")]
        value: BigUint,
    }

    #[test]
    fn round_trips_as_decimal_string() {
        let wrapper = Wrapper {
            value: BigUint::from(123456789012345678901234567890u128),
        };
        let json = serde_json::to_string(&wrapper).unwrap();
        assert!(json.contains("\"123456789012345678901234567890\""));
        let parsed: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.value, wrapper.value);
    }
}
