//! The order-`q` subgroup of `Z*_p` for a safe prime `p = 2q + 1`.
//!
//! Parameter search is not constant-time and is meant for the semi-honest
//! setting only.

use super::{domain_separated, DdhGroup};
use crate::error::{PsiSumError, Result};
use num_bigint_dig::prime::probably_prime;
use num_bigint_dig::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

/// Smallest modulus size accepted by [`SafePrimeGroup::generate`].
pub const MIN_GROUP_BITS: usize = 32;

const PRIMALITY_ROUNDS: usize = 20;

/// Candidate budget for the safe-prime search, per bit of modulus.
const SEARCH_ATTEMPTS_PER_BIT: usize = 4_000;

const MAX_GENERATOR_ATTEMPTS: usize = 128;

/// Odd primes used to discard candidates `q` where `q` or `2q + 1` has a small factor.
const SIEVE_PRIMES: [u32; 45] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199,
];

/// A prime-order subgroup of the multiplicative group modulo a safe prime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafePrimeGroup {
    /// Safe prime modulus `p = 2q + 1`
    p: BigUint,
    /// Prime group order `q`
    q: BigUint,
    /// Generator of the order-`q` subgroup
    g: BigUint,
}

impl SafePrimeGroup {
    /// Generate a fresh group with a `bits`-bit safe prime modulus.
    ///
    /// # Errors
    /// Returns `PsiSumError::InvalidParameters` if `bits` is below
    /// [`MIN_GROUP_BITS`], and `PsiSumError::ParameterGeneration` if no safe
    /// prime or generator is found within the attempt budget.
    pub fn generate<R: RngCore + CryptoRng>(bits: usize, rng: &mut R) -> Result<Self> {
        if bits < MIN_GROUP_BITS {
            return Err(PsiSumError::InvalidParameters(format!(
                "group modulus must have at least {} bits, got {}",
                MIN_GROUP_BITS, bits
            )));
        }

        let (p, q) = search_safe_prime(bits, rng)?;
        let g = find_generator(&p, &q, rng)?;
        Ok(Self { p, q, g })
    }

    /// Build a group from externally supplied parameters.
    ///
    /// Checks that `p` and `(p - 1) / 2` are prime and that `g` generates the
    /// order-`q` subgroup.
    ///
    /// # Errors
    /// Returns `PsiSumError::InvalidParameters` if any check fails.
    pub fn from_parameters(p: BigUint, g: BigUint) -> Result<Self> {
        let one = BigUint::one();
        if p <= BigUint::from(5u32) || !probably_prime(&p, PRIMALITY_ROUNDS) {
            return Err(PsiSumError::InvalidParameters(
                "modulus is not an odd prime".to_string(),
            ));
        }
        let q = (&p - &one) >> 1;
        if !probably_prime(&q, PRIMALITY_ROUNDS) {
            return Err(PsiSumError::InvalidParameters(
                "modulus is not a safe prime".to_string(),
            ));
        }
        if g <= one || g >= p || !g.modpow(&q, &p).is_one() {
            return Err(PsiSumError::InvalidParameters(
                "generator does not have order q".to_string(),
            ));
        }
        Ok(Self { p, q, g })
    }

    /// The safe prime modulus `p`.
    pub fn modulus(&self) -> &BigUint {
        &self.p
    }

    /// The prime group order `q`.
    pub fn order(&self) -> &BigUint {
        &self.q
    }

    /// The subgroup generator `g`.
    pub fn generator(&self) -> &BigUint {
        &self.g
    }

    fn check_range(&self, element: &BigUint) -> Result<()> {
        if element.is_zero() || element >= &self.p {
            return Err(PsiSumError::InvalidGroupElement(
                "value outside [1, p - 1]".to_string(),
            ));
        }
        Ok(())
    }
}

impl DdhGroup for SafePrimeGroup {
    type Element = BigUint;
    type Exponent = BigUint;

    fn hash_to_group(&self, identifier: &[u8]) -> BigUint {
        let digest = Sha256::digest(domain_separated(identifier));
        let mut exponent = BigUint::from_bytes_be(&digest) % &self.q;
        // Never hash to the identity.
        if exponent.is_zero() {
            exponent = BigUint::one();
        }
        self.g.modpow(&exponent, &self.p)
    }

    fn random_exponent<R: RngCore + CryptoRng>(&self, rng: &mut R) -> BigUint {
        rng.gen_biguint_range(&BigUint::one(), &self.q)
    }

    fn power(&self, element: &BigUint, exponent: &BigUint) -> Result<BigUint> {
        self.check_range(element)?;
        Ok(element.modpow(exponent, &self.p))
    }

    fn validate_element(&self, element: &BigUint) -> Result<()> {
        self.check_range(element)?;
        if !element.modpow(&self.q, &self.p).is_one() {
            return Err(PsiSumError::InvalidGroupElement(
                "value is not in the order-q subgroup".to_string(),
            ));
        }
        Ok(())
    }
}

/// Search for `(p, q)` with `q` a `bits - 1`-bit prime and `p = 2q + 1` prime.
fn search_safe_prime<R: RngCore + CryptoRng>(
    bits: usize,
    rng: &mut R,
) -> Result<(BigUint, BigUint)> {
    let sieve: Vec<(BigUint, BigUint)> = SIEVE_PRIMES
        .iter()
        .map(|&s| (BigUint::from(s), BigUint::from((s - 1) / 2)))
        .collect();
    let top_bit = BigUint::one() << (bits - 2);
    let max_attempts = bits * SEARCH_ATTEMPTS_PER_BIT;

    for _ in 0..max_attempts {
        let q = rng.gen_biguint(bits - 1) | &top_bit | BigUint::one();

        // s | 2q + 1 exactly when q = (s - 1) / 2 mod s.
        let has_small_factor = sieve.iter().any(|(s, half)| {
            let r = &q % s;
            r.is_zero() || r == *half
        });
        if has_small_factor || !probably_prime(&q, PRIMALITY_ROUNDS) {
            continue;
        }

        let p = (&q << 1) + BigUint::one();
        if probably_prime(&p, PRIMALITY_ROUNDS) {
            return Ok((p, q));
        }
    }

    Err(PsiSumError::ParameterGeneration(format!(
        "no {}-bit safe prime found in {} attempts",
        bits, max_attempts
    )))
}

/// Square a random element of `Z*_p` to land in the order-`q` subgroup.
fn find_generator<R: RngCore + CryptoRng>(
    p: &BigUint,
    q: &BigUint,
    rng: &mut R,
) -> Result<BigUint> {
    let two = BigUint::from(2u32);
    let upper = p - &BigUint::one();

    for _ in 0..MAX_GENERATOR_ATTEMPTS {
        let h = rng.gen_biguint_range(&two, &upper);
        let g = h.modpow(&two, p);
        if !g.is_one() && g.modpow(q, p).is_one() {
            return Ok(g);
        }
    }

    Err(PsiSumError::ParameterGeneration(
        "no generator of the order-q subgroup found".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn test_group() -> SafePrimeGroup {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        SafePrimeGroup::generate(128, &mut rng).unwrap()
    }

    #[test]
    fn test_generated_group_is_valid() {
        let group = test_group();
        let one = BigUint::one();

        assert_eq!(group.modulus(), &((group.order() << 1) + &one));
        assert!(probably_prime(group.modulus(), PRIMALITY_ROUNDS));
        assert!(probably_prime(group.order(), PRIMALITY_ROUNDS));
        assert_eq!(group.modulus().bits(), 128);
        assert!(!group.generator().is_one());
        assert!(group.generator().modpow(group.order(), group.modulus()).is_one());
    }

    #[test]
    fn test_generate_rejects_tiny_modulus() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let result = SafePrimeGroup::generate(16, &mut rng);
        assert!(matches!(result, Err(PsiSumError::InvalidParameters(_))));
    }

    #[test]
    fn test_power_commutes() {
        let group = test_group();
        let mut rng = ChaCha20Rng::seed_from_u64(11);

        for i in 0..8u8 {
            let h = group.hash_to_group(&[i]);
            let k1 = group.random_exponent(&mut rng);
            let k2 = group.random_exponent(&mut rng);

            let a = group.power(&group.power(&h, &k1).unwrap(), &k2).unwrap();
            let b = group.power(&group.power(&h, &k2).unwrap(), &k1).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_hash_to_group_is_deterministic_member() {
        let group = test_group();
        let first = group.hash_to_group(b"userA");
        let second = group.hash_to_group(b"userA");

        assert_eq!(first, second);
        assert_ne!(first, group.hash_to_group(b"userB"));
        assert!(group.validate_element(&first).is_ok());
        assert!(!first.is_one());
    }

    #[test]
    fn test_random_exponent_in_range() {
        let group = test_group();
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        for _ in 0..64 {
            let k = group.random_exponent(&mut rng);
            assert!(!k.is_zero());
            assert!(&k < group.order());
        }
    }

    #[test]
    fn test_out_of_range_elements_rejected() {
        let group = test_group();
        let k = BigUint::from(5u32);

        assert!(matches!(
            group.power(&BigUint::zero(), &k),
            Err(PsiSumError::InvalidGroupElement(_))
        ));
        assert!(matches!(
            group.power(group.modulus(), &k),
            Err(PsiSumError::InvalidGroupElement(_))
        ));
        assert!(group.validate_element(&BigUint::zero()).is_err());
    }

    #[test]
    fn test_non_member_rejected() {
        let group = test_group();
        // p - 1 has order 2.
        let minus_one = group.modulus() - &BigUint::one();
        assert!(matches!(
            group.validate_element(&minus_one),
            Err(PsiSumError::InvalidGroupElement(_))
        ));
    }

    #[test]
    fn test_from_parameters() {
        let group = SafePrimeGroup::from_parameters(BigUint::from(23u32), BigUint::from(4u32));
        assert!(group.is_ok());
        assert_eq!(group.unwrap().order(), &BigUint::from(11u32));

        // 5 is a non-residue mod 23, so its order is 22.
        assert!(SafePrimeGroup::from_parameters(BigUint::from(23u32), BigUint::from(5u32)).is_err());
        // 29 is prime but 14 is not.
        assert!(SafePrimeGroup::from_parameters(BigUint::from(29u32), BigUint::from(4u32)).is_err());
        assert!(SafePrimeGroup::from_parameters(BigUint::from(21u32), BigUint::from(4u32)).is_err());
        assert!(SafePrimeGroup::from_parameters(BigUint::from(23u32), BigUint::one()).is_err());
    }

    #[test]
    fn test_from_parameters_accepts_generated_group() {
        let group = test_group();
        let rebuilt =
            SafePrimeGroup::from_parameters(group.modulus().clone(), group.generator().clone())
                .unwrap();
        assert_eq!(rebuilt, group);
    }
}
