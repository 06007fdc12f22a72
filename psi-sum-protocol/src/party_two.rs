//! Party 2: holder of the identifier/value pairs `W` and the Paillier key.

use crate::error::{PsiSumError, Result};
use crate::group::DdhGroup;
use crate::messages::{Round1Message, Round2Message, Round3Message, SetupMessage};
use crate::paillier::{KeyPair, PublicKey};
use num_bigint_dig::BigUint;
use num_traits::Zero;
use rand::seq::SliceRandom;
use rand::{CryptoRng, RngCore};
use rayon::prelude::*;
use std::sync::Arc;

/// Party 2's side of one protocol run.
///
/// A key pair may be shared across runs, but the exponent `k2` is always
/// drawn fresh at construction and dropped by [`PartyTwo::decrypt_sum`].
#[derive(Debug)]
pub struct PartyTwo<G: DdhGroup> {
    group: Arc<G>,
    /// Private `(identifier, value)` pairs `W`
    pairs: Vec<(Vec<u8>, u64)>,
    /// Secret blinding exponent `k2`
    secret: G::Exponent,
    keypair: KeyPair,
    round2_sent: bool,
}

impl<G: DdhGroup> PartyTwo<G> {
    /// Create Party 2 with a fresh `paillier_bits`-bit key pair.
    ///
    /// # Errors
    /// Fails if key generation fails or if the values cannot be summed
    /// without wrapping modulo `n` (see [`PartyTwo::with_keypair`]).
    pub fn new<R: RngCore + CryptoRng>(
        group: Arc<G>,
        pairs: Vec<(Vec<u8>, u64)>,
        paillier_bits: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let keypair = KeyPair::generate(paillier_bits, rng)?;
        Self::with_keypair(group, pairs, keypair, rng)
    }

    /// Create Party 2 around an existing key pair, with a fresh secret exponent.
    ///
    /// # Errors
    /// Returns `PsiSumError::InvalidPlaintext` if the total of all values is
    /// not below the Paillier modulus, since an intersection sum could then
    /// silently wrap.
    pub fn with_keypair<R: RngCore + CryptoRng>(
        group: Arc<G>,
        pairs: Vec<(Vec<u8>, u64)>,
        keypair: KeyPair,
        rng: &mut R,
    ) -> Result<Self> {
        let total = pairs
            .iter()
            .fold(BigUint::zero(), |total, (_, value)| total + BigUint::from(*value));
        if &total >= keypair.public_key().n() {
            return Err(PsiSumError::InvalidPlaintext(format!(
                "total of values ({}) does not fit below the Paillier modulus; use a larger key",
                total
            )));
        }

        let secret = group.random_exponent(rng);
        Ok(Self {
            group,
            pairs,
            secret,
            keypair,
            round2_sent: false,
        })
    }

    /// Create Party 2 for the cardinality-only variant: every identifier
    /// carries the value 1, so the decrypted sum is the intersection size.
    pub fn cardinality_only<R: RngCore + CryptoRng>(
        group: Arc<G>,
        identifiers: Vec<Vec<u8>>,
        keypair: KeyPair,
        rng: &mut R,
    ) -> Result<Self> {
        let pairs = identifiers.into_iter().map(|id| (id, 1)).collect();
        Self::with_keypair(group, pairs, keypair, rng)
    }

    /// The setup message carrying the public key to Party 1.
    pub fn setup_message(&self) -> SetupMessage {
        SetupMessage {
            public_key: self.keypair.public_key().clone(),
        }
    }

    /// The Paillier public key.
    pub fn public_key(&self) -> &PublicKey {
        self.keypair.public_key()
    }

    /// Number of pairs held.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if no pairs are held.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Round 2: respond to Party 1's blinded identifiers.
    ///
    /// Returns `H(v)^(k1*k2)` for Party 1's set and `(H(w)^k2, Enc(t))` for
    /// every held pair, each list shuffled independently.
    ///
    /// # Errors
    /// Returns `PsiSumError::ProtocolSequence` if round 2 was already sent,
    /// and `PsiSumError::InvalidGroupElement` if a received element is malformed.
    pub fn round2<R: RngCore + CryptoRng>(
        &mut self,
        message: Round1Message<G::Element>,
        rng: &mut R,
    ) -> Result<Round2Message<G::Element>> {
        if self.round2_sent {
            return Err(PsiSumError::ProtocolSequence(
                "round 2 has already been sent".to_string(),
            ));
        }

        let Round1Message {
            blinded_identifiers,
        } = message;
        self.group.validate_all(&blinded_identifiers)?;

        let mut double_blinded_identifiers = self.group.blind_all(&blinded_identifiers, &self.secret)?;
        double_blinded_identifiers.shuffle(rng);

        let public_key = self.keypair.public_key();
        // Nonces come from the caller's RNG; the exponentiations run in parallel.
        let nonces: Vec<BigUint> = self
            .pairs
            .iter()
            .map(|_| public_key.sample_nonce(rng))
            .collect();

        let mut blinded_pairs = self
            .pairs
            .par_iter()
            .zip(nonces.par_iter())
            .map(|((identifier, value), nonce)| -> Result<_> {
                let element = self
                    .group
                    .power(&self.group.hash_to_group(identifier), &self.secret)?;
                let plaintext = BigUint::from(*value) % public_key.n();
                let ciphertext = public_key.encrypt_with_nonce(&plaintext, nonce)?;
                Ok((element, ciphertext))
            })
            .collect::<Result<Vec<_>>>()?;
        blinded_pairs.shuffle(rng);

        self.round2_sent = true;
        Ok(Round2Message {
            double_blinded_identifiers,
            blinded_pairs,
        })
    }

    /// Output: decrypt the intersection sum received in round 3.
    ///
    /// # Errors
    /// Returns `PsiSumError::ProtocolSequence` if round 2 has not been sent,
    /// and `PsiSumError::InvalidCiphertext` if the ciphertext is malformed.
    pub fn decrypt_sum(self, message: Round3Message) -> Result<BigUint> {
        if !self.round2_sent {
            return Err(PsiSumError::ProtocolSequence(
                "decryption requires round 2 to have been sent".to_string(),
            ));
        }
        self.keypair.secret_key().decrypt(&message.encrypted_sum)
    }
}
