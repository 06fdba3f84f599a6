//! Shamir Secret Sharing over Mersenne-prime finite fields.
//!
//! Splits what arithmetic (`field`) from what policy (`engine`): field
//! operations never know about thresholds or stewards, and the engine
//! never decides how many shares are "enough" — that's the caller's job
//! (see [`engine::ShareEngine::reconstruct`]).

pub mod engine;
pub mod field;
pub mod serde_bigint;

pub use engine::{Polynomial, RecoverySecret, Share, ShareEngine};
pub use field::{MersennePrime, ShamirField};
