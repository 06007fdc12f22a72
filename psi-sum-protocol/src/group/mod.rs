//! Prime-order groups with commutative exponentiation.
//!
//! The blinding scheme only needs three things from a group: a way to hash
//! identifiers into it, random exponents, and exponentiation that commutes
//! (`(h^k1)^k2 == (h^k2)^k1`). [`DdhGroup`] captures exactly that, and is
//! implemented by:
//!
//! - [`SafePrimeGroup`]: the order-`q` subgroup of `Z*_p` for a safe prime
//!   `p = 2q + 1`.
//! - [`RistrettoGroup`]: the Ristretto255 group (curve25519-dalek), where
//!   exponentiation is scalar multiplication.

use crate::error::Result;
use rand::{CryptoRng, RngCore};
use rayon::prelude::*;
use std::fmt::Debug;
use std::hash::Hash;

mod ristretto;
mod safe_prime;

pub use ristretto::RistrettoGroup;
pub use safe_prime::{SafePrimeGroup, MIN_GROUP_BITS};

/// Domain-separation prefix for hashing identifiers into a group.
pub(crate) const HASH_TO_GROUP_DOMAIN: &[u8] = b"psi-sum/hash-to-group/v1";

/// A cyclic group of prime order in which DDH is assumed hard.
///
/// Elements produced by one group instance must only be compared with
/// elements produced by the same instance.
pub trait DdhGroup: Send + Sync {
    /// A group member, as exchanged between the parties.
    type Element: Clone + Eq + Hash + Debug + Send + Sync;

    /// A secret exponent in `[1, q - 1]`.
    type Exponent: Clone + Debug + Send + Sync;

    /// Deterministically map an identifier to a group element.
    fn hash_to_group(&self, identifier: &[u8]) -> Self::Element;

    /// Sample a uniformly random exponent in `[1, q - 1]`.
    fn random_exponent<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Self::Exponent;

    /// Raise `element` to `exponent`.
    ///
    /// # Errors
    /// Returns `PsiSumError::InvalidGroupElement` if `element` is malformed.
    fn power(&self, element: &Self::Element, exponent: &Self::Exponent) -> Result<Self::Element>;

    /// Full membership check for an element received from the other party.
    ///
    /// # Errors
    /// Returns `PsiSumError::InvalidGroupElement` if `element` is not in the group.
    fn validate_element(&self, element: &Self::Element) -> Result<()>;

    /// Raise every element to `exponent`, in parallel. Output order matches input order.
    fn blind_all(
        &self,
        elements: &[Self::Element],
        exponent: &Self::Exponent,
    ) -> Result<Vec<Self::Element>> {
        elements
            .par_iter()
            .map(|element| self.power(element, exponent))
            .collect()
    }

    /// Compute `hash_to_group(id)^exponent` for every identifier, in parallel.
    fn hash_and_blind_all(
        &self,
        identifiers: &[Vec<u8>],
        exponent: &Self::Exponent,
    ) -> Result<Vec<Self::Element>> {
        identifiers
            .par_iter()
            .map(|identifier| self.power(&self.hash_to_group(identifier), exponent))
            .collect()
    }

    /// Validate every element, failing on the first invalid one.
    fn validate_all(&self, elements: &[Self::Element]) -> Result<()> {
        elements
            .par_iter()
            .try_for_each(|element| self.validate_element(element))
    }
}

/// Prefix `identifier` with the hash-to-group domain tag.
pub(crate) fn domain_separated(identifier: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(HASH_TO_GROUP_DOMAIN.len() + identifier.len());
    input.extend_from_slice(HASH_TO_GROUP_DOMAIN);
    input.extend_from_slice(identifier);
    input
}
