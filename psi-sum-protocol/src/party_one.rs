//! Party 1: holder of the identifier set `V`.

use crate::error::{PsiSumError, Result};
use crate::group::DdhGroup;
use crate::messages::{Round1Message, Round2Message, Round3Message, SetupMessage};
use crate::paillier::{Ciphertext, PublicKey};
use rand::seq::SliceRandom;
use rand::{CryptoRng, RngCore};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

/// Party 1's side of one protocol run.
///
/// The secret exponent `k1` is drawn at construction and dropped when
/// [`PartyOne::round3`] consumes the party, so it cannot be carried into
/// another run.
#[derive(Debug)]
pub struct PartyOne<G: DdhGroup> {
    group: Arc<G>,
    /// Private identifier set `V`
    identifiers: Vec<Vec<u8>>,
    /// Secret blinding exponent `k1`
    secret: G::Exponent,
    /// Party 2's Paillier public key
    public_key: PublicKey,
    round1_sent: bool,
}

/// What Party 1 produces in round 3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyOneOutput {
    /// Message for Party 2
    pub message: Round3Message,
    /// Intersection size, which Party 1 learns while matching
    pub cardinality: usize,
}

impl<G: DdhGroup> PartyOne<G> {
    /// Create Party 1 with a fresh secret exponent.
    ///
    /// # Arguments
    /// * `group` - The group shared with Party 2
    /// * `identifiers` - The private identifier set `V`
    /// * `setup` - Party 2's public key, received before round 1
    /// * `rng` - Source for the secret exponent
    pub fn new<R: RngCore + CryptoRng>(
        group: Arc<G>,
        identifiers: Vec<Vec<u8>>,
        setup: SetupMessage,
        rng: &mut R,
    ) -> Self {
        let secret = group.random_exponent(rng);
        Self {
            group,
            identifiers,
            secret,
            public_key: setup.public_key,
            round1_sent: false,
        }
    }

    /// Number of identifiers held.
    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    /// Returns true if the identifier set is empty.
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// Round 1: send `H(v)^k1` for every `v` in `V`, in random order.
    ///
    /// # Errors
    /// Returns `PsiSumError::ProtocolSequence` if round 1 was already sent.
    pub fn round1<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
    ) -> Result<Round1Message<G::Element>> {
        if self.round1_sent {
            return Err(PsiSumError::ProtocolSequence(
                "round 1 has already been sent".to_string(),
            ));
        }

        let mut blinded_identifiers = self.group.hash_and_blind_all(&self.identifiers, &self.secret)?;
        // Position must carry no information about V's ordering.
        blinded_identifiers.shuffle(rng);

        self.round1_sent = true;
        Ok(Round1Message {
            blinded_identifiers,
        })
    }

    /// Round 3: locate the intersection and return its encrypted value sum.
    ///
    /// Each pair element `H(w)^k2` is raised to `k1`; the pair matches when
    /// the result is among Party 2's `H(v)^(k1*k2)` values. The ciphertexts
    /// of matching pairs are summed homomorphically and the sum is refreshed.
    ///
    /// # Errors
    /// Returns `PsiSumError::ProtocolSequence` if round 1 has not been sent,
    /// `PsiSumError::InvalidGroupElement` or `PsiSumError::InvalidCiphertext`
    /// if any received value is malformed.
    pub fn round3<R: RngCore + CryptoRng>(
        self,
        message: Round2Message<G::Element>,
        rng: &mut R,
    ) -> Result<PartyOneOutput> {
        if !self.round1_sent {
            return Err(PsiSumError::ProtocolSequence(
                "round 3 requires round 1 to have been sent".to_string(),
            ));
        }

        let Round2Message {
            double_blinded_identifiers,
            blinded_pairs,
        } = message;

        self.group.validate_all(&double_blinded_identifiers)?;
        blinded_pairs
            .par_iter()
            .try_for_each(|(element, ciphertext)| {
                self.group.validate_element(element)?;
                self.public_key.validate_ciphertext(ciphertext)
            })?;

        let reference: HashSet<G::Element> = double_blinded_identifiers.into_iter().collect();
        let transformed: Vec<G::Element> = blinded_pairs
            .par_iter()
            .map(|(element, _)| self.group.power(element, &self.secret))
            .collect::<Result<_>>()?;

        let matched: Vec<&Ciphertext> = blinded_pairs
            .iter()
            .zip(transformed.iter())
            .filter_map(|((_, ciphertext), element)| reference.contains(element).then_some(ciphertext))
            .collect();
        let cardinality = matched.len();

        let sum = self.public_key.add_many(matched, rng)?;
        let encrypted_sum = self.public_key.refresh(&sum, rng)?;

        Ok(PartyOneOutput {
            message: Round3Message { encrypted_sum },
            cardinality,
        })
    }
}
