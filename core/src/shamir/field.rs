//! # Mersenne-Prime Finite Fields
//!
//! Paradux's Shamir scheme runs over `GF(p)` where `p = 2^E - 1` is a
//! Mersenne prime chosen from a fixed table of exponents. All arithmetic
//! is done over arbitrary-precision integers — fields can be up to 9689
//! bits wide, far past anything that fits in a machine word.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

use crate::error::{ParaduxError, ParaduxResult};

/// Ordered table of Mersenne exponents. `MersennePrime(n)` represents the
/// prime `2^EXPONENTS[n] - 1`.
pub const EXPONENTS: &[u32] = &[
    1, 2, 3, 5, 7, 13, 17, 19, 31, 61, 89, 107, 127, 521, 607, 1279, 2203, 2281, 3217, 4253, 4423,
    9689,
];

/// An index into [`EXPONENTS`], identifying which Mersenne prime a field
/// is built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct MersennePrime(pub usize);

impl MersennePrime {
    /// Picks the smallest Mersenne prime whose exponent is at least `bits`.
    pub fn for_bit_length(bits: u32) -> ParaduxResult<Self> {
        EXPONENTS
            .iter()
            .position(|&e| e >= bits)
            .map(MersennePrime)
            .ok_or(ParaduxError::ParameterOutOfRange {
                requested: bits,
                max: *EXPONENTS.last().expect("EXPONENTS is non-empty"),
            })
    }

    /// The exponent `E[n]` this index refers to.
    pub fn exponent(self) -> u32 {
        EXPONENTS[self.0]
    }

    /// The prime `2^E[n] - 1` as a `BigUint`.
    pub fn prime(self) -> BigUint {
        (BigUint::one() << self.exponent() as usize) - BigUint::one()
    }

    pub fn index(self) -> usize {
        self.0
    }

    /// Reconstructs a `MersennePrime` from a previously-persisted index.
    pub fn from_index(index: usize) -> ParaduxResult<Self> {
        if index < EXPONENTS.len() {
            Ok(MersennePrime(index))
        } else {
            Err(ParaduxError::ParameterOutOfRange {
                requested: index as u32,
                max: EXPONENTS.len() as u32 - 1,
            })
        }
    }
}

/// Arithmetic over `GF(p)` for a single chosen Mersenne prime.
///
/// All values are kept canonicalized to `[0, p)`; `sub` and `inv` use the
/// mathematician's modulo convention rather than Rust's truncating `%`.
#[derive(Debug, Clone)]
pub struct ShamirField {
    modulus: BigUint,
}

impl ShamirField {
    pub fn new(prime: MersennePrime) -> Self {
        Self {
            modulus: prime.prime(),
        }
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub fn contains(&self, value: &BigUint) -> bool {
        value < &self.modulus
    }

    pub fn add(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a + b) % &self.modulus
    }

    pub fn sub(&self, a: &BigUint, b: &BigUint) -> BigUint {
        let a = BigInt::from_biguint(Sign::Plus, a.clone());
        let b = BigInt::from_biguint(Sign::Plus, b.clone());
        let m = BigInt::from_biguint(Sign::Plus, self.modulus.clone());
        let mut diff = (a - b) % &m;
        if diff.sign() == num_bigint::Sign::Minus {
            diff += &m;
        }
        diff.to_biguint().expect("non-negative by construction")
    }

    pub fn mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % &self.modulus
    }

    /// Modular inverse of `a` via the extended Euclidean algorithm.
    ///
    /// `p` is prime so every nonzero `a` has an inverse; callers are
    /// responsible for never passing `a == 0`.
    pub fn inv(&self, a: &BigUint) -> BigUint {
        let (mut old_r, mut r) = (
            BigInt::from_biguint(Sign::Plus, a.clone()),
            BigInt::from_biguint(Sign::Plus, self.modulus.clone()),
        );
        let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());

        while !r.is_zero() {
            let quotient = &old_r / &r;
            let new_r = &old_r - &quotient * &r;
            old_r = std::mem::replace(&mut r, new_r);
            let new_s = &old_s - &quotient * &s;
            old_s = std::mem::replace(&mut s, new_s);
        }

        let m = BigInt::from_biguint(Sign::Plus, self.modulus.clone());
        let mut result = old_s % &m;
        if result.sign() == num_bigint::Sign::Minus {
            result += &m;
        }
        result.to_biguint().expect("non-negative by construction")
    }

    /// `a / b = a * inv(b)`.
    pub fn div(&self, a: &BigUint, b: &BigUint) -> BigUint {
        self.mul(a, &self.inv(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_selection_picks_smallest_sufficient_exponent() {
        // Scenario 1 from the testable properties: b=120 -> mersenne=12, p=2^127-1.
        let prime = MersennePrime::for_bit_length(120).unwrap();
        assert_eq!(prime.index(), 12);
        assert_eq!(prime.exponent(), 127);
    }

    #[test]
    fn field_selection_rejects_too_large_a_request() {
        let result = MersennePrime::for_bit_length(10_000);
        assert!(matches!(
            result,
            Err(ParaduxError::ParameterOutOfRange { .. })
        ));
    }

    #[test]
    fn field_selection_exact_match() {
        let prime = MersennePrime::for_bit_length(127).unwrap();
        assert_eq!(prime.exponent(), 127);
    }

    #[test]
    fn add_sub_mul_roundtrip() {
        let field = ShamirField::new(MersennePrime::for_bit_length(16).unwrap());
        let a = BigUint::from(12345u32);
        let b = BigUint::from(67890u32);
        let sum = field.add(&a, &b);
        assert_eq!(field.sub(&sum, &b), a);
    }

    #[test]
    fn sub_wraps_around_modulus() {
        let field = ShamirField::new(MersennePrime::for_bit_length(16).unwrap());
        let zero = BigUint::zero();
        let one = BigUint::one();
        let wrapped = field.sub(&zero, &one);
        assert_eq!(wrapped, field.modulus() - BigUint::one());
    }

    #[test]
    fn inverse_is_correct() {
        let field = ShamirField::new(MersennePrime::for_bit_length(16).unwrap());
        for v in [1u32, 2, 3, 12345, 65535] {
            let a = BigUint::from(v) % field.modulus();
            if a.is_zero() {
                continue;
            }
            let inv = field.inv(&a);
            assert_eq!(field.mul(&a, &inv), BigUint::one());
        }
    }

    #[test]
    fn div_is_mul_by_inverse() {
        let field = ShamirField::new(MersennePrime::for_bit_length(16).unwrap());
        let a = BigUint::from(100u32);
        let b = BigUint::from(7u32);
        let q = field.div(&a, &b);
        assert_eq!(field.mul(&q, &b), a);
    }
}
