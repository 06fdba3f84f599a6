//! # Shamir Secret Sharing Engine
//!
//! Splits a secret into `(x, y)` shares over a [`ShamirField`] and
//! reconstructs it from a quorum via Lagrange interpolation at `x = 0`.
//! Arithmetic policy (how many shares are "enough") is deliberately kept
//! out of this module — see [`ShareEngine::reconstruct`].

use num_bigint::BigUint;
use num_traits::Zero;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::field::{MersennePrime, ShamirField};
use crate::error::{ParaduxError, ParaduxResult};

/// Ordered polynomial coefficients `[a_1, ..., a_{k-1}]`. The constant
/// term `a_0` (the secret) is stored separately by whoever owns the
/// polynomial, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polynomial {
    #[serde(with = "super::serde_bigint::vec")]
    coefficients: Vec<BigUint>,
}

impl Polynomial {
    /// Samples `threshold - 1` coefficients uniformly from `[0, p)` using
    /// a cryptographically strong generator.
    pub fn sample_random(field: &ShamirField, threshold: u32) -> ParaduxResult<Self> {
        if threshold < 2 {
            return Err(ParaduxError::ThresholdTooSmall(threshold));
        }
        let degree = (threshold - 1) as usize;
        let mut rng = rand::rngs::OsRng;
        let byte_len = (field.modulus().bits() as usize + 7) / 8;
        let coefficients = (0..degree)
            .map(|_| {
                loop {
                    let mut buf = vec![0u8; byte_len];
                    rng.fill_bytes(&mut buf);
                    let candidate = BigUint::from_bytes_be(&buf) % field.modulus();
                    if &candidate < field.modulus() {
                        return candidate;
                    }
                }
            })
            .collect();
        Ok(Self { coefficients })
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len()
    }

    pub fn coefficients(&self) -> &[BigUint] {
        &self.coefficients
    }
}

/// A single `(x, y)` point of a polynomial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    #[serde(with = "super::serde_bigint")]
    pub x: BigUint,
    #[serde(with = "super::serde_bigint")]
    pub y: BigUint,
}

/// The recovery secret: a single integer in `[0, p)`, generated once at
/// container initialisation and never persisted outside the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoverySecret(pub BigUint);

impl RecoverySecret {
    pub fn generate(field: &ShamirField) -> Self {
        let mut rng = rand::rngs::OsRng;
        let byte_len = (field.modulus().bits() as usize + 7) / 8;
        loop {
            let mut buf = vec![0u8; byte_len];
            rng.fill_bytes(&mut buf);
            let candidate = BigUint::from_bytes_be(&buf);
            if field.contains(&candidate) {
                return Self(candidate);
            }
        }
    }
}

/// Split and reconstruct operations over a chosen [`ShamirField`].
pub struct ShareEngine {
    field: ShamirField,
}

impl ShareEngine {
    pub fn new(prime: MersennePrime) -> Self {
        Self {
            field: ShamirField::new(prime),
        }
    }

    pub fn field(&self) -> &ShamirField {
        &self.field
    }

    /// Validates `secret` and `threshold`, then returns the random
    /// polynomial that generates shares for it. The constant term (the
    /// secret itself) is supplied separately to [`Self::evaluate`].
    pub fn split(&self, secret: &BigUint, threshold: u32) -> ParaduxResult<Polynomial> {
        if !self.field.contains(secret) {
            return Err(ParaduxError::SecretTooLarge {
                secret: secret.to_string(),
                modulus: self.field.modulus().to_string(),
            });
        }
        if threshold < 2 {
            return Err(ParaduxError::ThresholdTooSmall(threshold));
        }
        Polynomial::sample_random(&self.field, threshold)
    }

    /// Evaluates `secret + a_1 x + a_2 x^2 + ... + a_{k-1} x^{k-1} mod p`
    /// at the given `x`.
    ///
    /// `polynomial.coefficients()` is stored highest-degree-first
    /// (`[a_{k-1}, ..., a_1]`); Horner's method folds in the constant
    /// term `secret` (`a_0`) last.
    pub fn evaluate(&self, secret: &BigUint, polynomial: &Polynomial, x: &BigUint) -> BigUint {
        let mut result = BigUint::zero();
        for coeff in polynomial.coefficients() {
            result = self.field.add(&self.field.mul(&result, x), coeff);
        }
        self.field.add(&self.field.mul(&result, x), secret)
    }

    /// Reconstructs the polynomial's value at `x = 0` from a set of
    /// shares via Lagrange interpolation. Accepts any `|shares| >= 2`;
    /// the caller is responsible for checking that the count matches the
    /// configured quorum, keeping arithmetic separate from policy.
    pub fn reconstruct(&self, shares: &[Share]) -> ParaduxResult<BigUint> {
        if shares.len() < 2 {
            return Err(ParaduxError::NotEnoughShares(shares.len()));
        }

        let mut sorted: Vec<&Share> = shares.iter().collect();
        sorted.sort_by(|a, b| a.x.cmp(&b.x));
        for pair in sorted.windows(2) {
            if pair[0].x == pair[1].x {
                return Err(ParaduxError::DuplicateX(pair[0].x.to_string()));
            }
        }

        let mut secret = BigUint::zero();
        for (i, share_i) in sorted.iter().enumerate() {
            let mut numerator = num_bigint::BigUint::from(1u32);
            let mut denominator = num_bigint::BigUint::from(1u32);
            for (j, share_j) in sorted.iter().enumerate() {
                if i == j {
                    continue;
                }
                // numerator *= (0 - x_j) = -x_j
                let neg_xj = self.field.sub(&BigUint::zero(), &share_j.x);
                numerator = self.field.mul(&numerator, &neg_xj);
                // denominator *= (x_i - x_j)
                let diff = self.field.sub(&share_i.x, &share_j.x);
                denominator = self.field.mul(&denominator, &diff);
            }
            let lagrange_coefficient = self.field.div(&numerator, &denominator);
            let term = self.field.mul(&share_i.y, &lagrange_coefficient);
            secret = self.field.add(&secret, &term);
        }

        Ok(secret)
    }
}
