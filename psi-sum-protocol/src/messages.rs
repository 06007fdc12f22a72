//! Message types exchanged between the two PSI-Sum parties.
//!
//! Messages are plain structs over the group's element type; transport and
//! serialization are left to the caller.

use crate::paillier::{Ciphertext, PublicKey};
use num_bigint_dig::BigUint;

/// Setup: Party 2 sends its Paillier public key to Party 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupMessage {
    /// Party 2's public key `(n, g)`
    pub public_key: PublicKey,
}

/// Round 1: Party 1's identifiers blinded with `k1`, shuffled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round1Message<E> {
    /// `H(v)^k1` for every `v` in Party 1's set
    pub blinded_identifiers: Vec<E>,
}

impl<E> Round1Message<E> {
    /// Returns the number of blinded identifiers.
    pub fn len(&self) -> usize {
        self.blinded_identifiers.len()
    }

    /// Returns true if Party 1's set was empty.
    pub fn is_empty(&self) -> bool {
        self.blinded_identifiers.is_empty()
    }
}

/// Round 2: Party 2's response.
///
/// Both lists are shuffled independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round2Message<E> {
    /// `H(v)^(k1*k2)` for every `v` in Party 1's set
    pub double_blinded_identifiers: Vec<E>,
    /// `(H(w)^k2, Enc(t))` for every pair `(w, t)` held by Party 2
    pub blinded_pairs: Vec<(E, Ciphertext)>,
}

impl<E> Round2Message<E> {
    /// Get just the blinded elements of the pairs (without ciphertexts).
    pub fn pair_elements(&self) -> Vec<&E> {
        self.blinded_pairs.iter().map(|(element, _)| element).collect()
    }
}

/// Round 3: Party 1 returns the re-randomized encrypted intersection sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round3Message {
    /// Encryption of the sum of values over the intersection
    pub encrypted_sum: Ciphertext,
}

/// Final result of a PSI-Sum run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolOutput {
    /// Sum of Party 2's values over the intersection, learned by Party 2
    pub sum: BigUint,
    /// Size of the intersection, learned by Party 1
    pub cardinality: usize,
}
