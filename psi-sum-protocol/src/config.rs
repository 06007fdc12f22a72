//! Security parameters for a PSI-Sum deployment.
//!
//! Both bit lengths only affect performance and security margin, never the
//! protocol logic.

use crate::error::{PsiSumError, Result};
use crate::group::{SafePrimeGroup, MIN_GROUP_BITS};
use crate::paillier::{KeyPair, MIN_PAILLIER_BITS};
use rand::{CryptoRng, RngCore};

/// Default safe-prime modulus size.
pub const DEFAULT_GROUP_BITS: usize = 2048;

/// Default Paillier modulus size.
pub const DEFAULT_PAILLIER_BITS: usize = 2048;

/// Validated protocol parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolParameters {
    group_bits: usize,
    paillier_bits: usize,
}

impl ProtocolParameters {
    /// Bit length of the safe prime `p`.
    pub fn group_bits(&self) -> usize {
        self.group_bits
    }

    /// Bit length of the Paillier modulus `n`.
    pub fn paillier_bits(&self) -> usize {
        self.paillier_bits
    }

    /// Generate a fresh group of the configured size.
    pub fn generate_group<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<SafePrimeGroup> {
        SafePrimeGroup::generate(self.group_bits, rng)
    }

    /// Generate a Paillier key pair of the configured size.
    pub fn generate_keypair<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<KeyPair> {
        KeyPair::generate(self.paillier_bits, rng)
    }
}

impl Default for ProtocolParameters {
    fn default() -> Self {
        Self {
            group_bits: DEFAULT_GROUP_BITS,
            paillier_bits: DEFAULT_PAILLIER_BITS,
        }
    }
}

/// Builder for [`ProtocolParameters`].
#[derive(Debug, Clone)]
pub struct ProtocolParametersBuilder {
    group_bits: usize,
    paillier_bits: usize,
}

impl ProtocolParametersBuilder {
    /// Creates a new builder with the default sizes.
    pub fn new() -> Self {
        Self {
            group_bits: DEFAULT_GROUP_BITS,
            paillier_bits: DEFAULT_PAILLIER_BITS,
        }
    }

    /// Sets the bit length of the safe prime modulus.
    pub fn set_group_bits(&mut self, bits: usize) -> &mut Self {
        self.group_bits = bits;
        self
    }

    /// Sets the bit length of the Paillier modulus.
    pub fn set_paillier_bits(&mut self, bits: usize) -> &mut Self {
        self.paillier_bits = bits;
        self
    }

    /// Build the parameters.
    ///
    /// # Errors
    /// Returns `PsiSumError::InvalidParameters` if a size is below its
    /// minimum or the Paillier size is odd.
    pub fn build(&self) -> Result<ProtocolParameters> {
        if self.group_bits < MIN_GROUP_BITS {
            return Err(PsiSumError::InvalidParameters(format!(
                "group modulus must have at least {} bits, got {}",
                MIN_GROUP_BITS, self.group_bits
            )));
        }
        if self.paillier_bits < MIN_PAILLIER_BITS || self.paillier_bits % 2 != 0 {
            return Err(PsiSumError::InvalidParameters(format!(
                "Paillier modulus must be an even bit length of at least {}, got {}",
                MIN_PAILLIER_BITS, self.paillier_bits
            )));
        }
        Ok(ProtocolParameters {
            group_bits: self.group_bits,
            paillier_bits: self.paillier_bits,
        })
    }
}

impl Default for ProtocolParametersBuilder {
    fn default() -> Self {
        Self::new()
    }
}
