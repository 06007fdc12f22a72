//! The Ristretto255 prime-order group.

use super::{domain_separated, DdhGroup};
use crate::error::{PsiSumError, Result};
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::traits::IsIdentity;
use curve25519_dalek::Scalar;
use rand::{CryptoRng, RngCore};
use sha2::Sha512;

/// Ristretto255 with elements exchanged in compressed form.
///
/// Exponentiation is scalar multiplication. There are no parameters to
/// generate: the group is fixed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RistrettoGroup;

impl RistrettoGroup {
    /// Create a handle to the Ristretto255 group.
    pub fn new() -> Self {
        Self
    }
}

/// Decompress a point, rejecting invalid encodings.
fn decompress(element: &CompressedRistretto) -> Result<RistrettoPoint> {
    element.decompress().ok_or_else(|| {
        PsiSumError::InvalidGroupElement("not a canonical Ristretto encoding".to_string())
    })
}

impl DdhGroup for RistrettoGroup {
    type Element = CompressedRistretto;
    type Exponent = Scalar;

    fn hash_to_group(&self, identifier: &[u8]) -> CompressedRistretto {
        RistrettoPoint::hash_from_bytes::<Sha512>(&domain_separated(identifier)).compress()
    }

    fn random_exponent<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Scalar {
        loop {
            let scalar = Scalar::random(rng);
            if scalar != Scalar::ZERO {
                return scalar;
            }
        }
    }

    fn power(&self, element: &CompressedRistretto, exponent: &Scalar) -> Result<CompressedRistretto> {
        let point = decompress(element)?;
        Ok((exponent * point).compress())
    }

    fn validate_element(&self, element: &CompressedRistretto) -> Result<()> {
        if decompress(element)?.is_identity() {
            return Err(PsiSumError::InvalidGroupElement(
                "identity element".to_string(),
            ));
        }
        Ok(())
    }
}
