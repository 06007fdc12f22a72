//! Paillier additively homomorphic encryption.
//!
//! The public key uses `g = n + 1`, so `g^m mod n^2 = 1 + m*n` and
//! `L(g^lambda mod n^2) = lambda mod n`. Not constant-time.

use crate::error::{PsiSumError, Result};
use num_bigint_dig::{BigUint, ModInverse, RandBigInt, RandPrime, ToBigUint};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};

/// Smallest modulus size accepted by [`KeyPair::generate`].
pub const MIN_PAILLIER_BITS: usize = 64;

const MAX_KEYGEN_ATTEMPTS: usize = 64;

/// A Paillier ciphertext, an element of `Z*_{n^2}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext(BigUint);

impl Ciphertext {
    /// Wrap a raw value received from the other party.
    ///
    /// The value is validated when it is used against a public key.
    pub fn from_value(value: BigUint) -> Self {
        Self(value)
    }

    /// The underlying integer.
    pub fn value(&self) -> &BigUint {
        &self.0
    }
}

/// Paillier public key `(n, g)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    n: BigUint,
    g: BigUint,
    n_squared: BigUint,
}

/// Paillier secret key `(lambda, mu)`. Never leaves its owner.
#[derive(Debug, Clone)]
pub struct SecretKey {
    lambda: BigUint,
    mu: BigUint,
    n: BigUint,
    n_squared: BigUint,
}

/// A matching public/secret key pair.
#[derive(Debug, Clone)]
pub struct KeyPair {
    public_key: PublicKey,
    secret_key: SecretKey,
}

impl KeyPair {
    /// Generate a key pair whose modulus `n` has exactly `bits` bits.
    ///
    /// The primes are independent of any DDH group parameters.
    ///
    /// # Errors
    /// Returns `PsiSumError::InvalidParameters` if `bits` is odd or below
    /// [`MIN_PAILLIER_BITS`], and `PsiSumError::KeyGeneration` if no valid
    /// key is found within the attempt budget.
    pub fn generate<R: RngCore + CryptoRng>(bits: usize, rng: &mut R) -> Result<Self> {
        if bits < MIN_PAILLIER_BITS || bits % 2 != 0 {
            return Err(PsiSumError::InvalidParameters(format!(
                "Paillier modulus must be an even bit length of at least {}, got {}",
                MIN_PAILLIER_BITS, bits
            )));
        }

        let one = BigUint::one();
        for _ in 0..MAX_KEYGEN_ATTEMPTS {
            let p: BigUint = rng.gen_prime(bits / 2);
            let q: BigUint = rng.gen_prime(bits / 2);
            if p == q {
                continue;
            }

            let n = &p * &q;
            if n.bits() != bits {
                continue;
            }
            let p_minus_one = &p - &one;
            let q_minus_one = &q - &one;
            if !n.gcd(&(&p_minus_one * &q_minus_one)).is_one() {
                continue;
            }

            let lambda = p_minus_one.lcm(&q_minus_one);
            let n_squared = &n * &n;
            let g = &n + &one;

            // mu = L(g^lambda mod n^2)^-1 mod n
            let l = l_function(&g.modpow(&lambda, &n_squared), &n);
            let mu = match l.mod_inverse(&n).and_then(|inv| inv.to_biguint()) {
                Some(mu) => mu,
                None => continue,
            };

            return Ok(Self {
                public_key: PublicKey {
                    n: n.clone(),
                    g,
                    n_squared: n_squared.clone(),
                },
                secret_key: SecretKey {
                    lambda,
                    mu,
                    n,
                    n_squared,
                },
            });
        }

        Err(PsiSumError::KeyGeneration(format!(
            "no {}-bit Paillier modulus found in {} attempts",
            bits, MAX_KEYGEN_ATTEMPTS
        )))
    }

    /// The public half, safe to share.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The secret half.
    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }
}

/// `L(u) = (u - 1) / n`
fn l_function(u: &BigUint, n: &BigUint) -> BigUint {
    (u - &BigUint::one()) / n
}

impl PublicKey {
    /// The modulus `n`.
    pub fn n(&self) -> &BigUint {
        &self.n
    }

    /// The generator `g = n + 1`.
    pub fn g(&self) -> &BigUint {
        &self.g
    }

    /// Largest encryptable plaintext, `n - 1`. Sums wrap modulo `n`.
    pub fn max_plaintext(&self) -> BigUint {
        &self.n - &BigUint::one()
    }

    /// Encrypt `plaintext` under this key.
    ///
    /// # Errors
    /// Returns `PsiSumError::InvalidPlaintext` if `plaintext >= n`.
    pub fn encrypt<R: RngCore + CryptoRng>(
        &self,
        plaintext: &BigUint,
        rng: &mut R,
    ) -> Result<Ciphertext> {
        let nonce = self.sample_nonce(rng);
        self.encrypt_with_nonce(plaintext, &nonce)
    }

    /// Sample an encryption nonce `r` uniform in `[1, n)` with `gcd(r, n) = 1`.
    pub(crate) fn sample_nonce<R: RngCore + CryptoRng>(&self, rng: &mut R) -> BigUint {
        let one = BigUint::one();
        loop {
            let r = rng.gen_biguint_range(&one, &self.n);
            if r.gcd(&self.n).is_one() {
                return r;
            }
        }
    }

    /// `c = g^m * r^n mod n^2`
    pub(crate) fn encrypt_with_nonce(&self, plaintext: &BigUint, nonce: &BigUint) -> Result<Ciphertext> {
        if plaintext >= &self.n {
            return Err(PsiSumError::InvalidPlaintext(
                "plaintext must be below the modulus n".to_string(),
            ));
        }
        let g_m = (BigUint::one() + plaintext * &self.n) % &self.n_squared;
        let r_n = nonce.modpow(&self.n, &self.n_squared);
        Ok(Ciphertext((g_m * r_n) % &self.n_squared))
    }

    /// Check that `c` lies in `Z*_{n^2}`.
    ///
    /// # Errors
    /// Returns `PsiSumError::InvalidCiphertext` otherwise.
    pub fn validate_ciphertext(&self, ciphertext: &Ciphertext) -> Result<()> {
        let c = ciphertext.value();
        if c.is_zero() || c >= &self.n_squared {
            return Err(PsiSumError::InvalidCiphertext(
                "value outside (0, n^2)".to_string(),
            ));
        }
        if !c.gcd(&self.n).is_one() {
            return Err(PsiSumError::InvalidCiphertext(
                "value is not a unit modulo n^2".to_string(),
            ));
        }
        Ok(())
    }

    /// Homomorphic addition: the result decrypts to `(m1 + m2) mod n`.
    pub fn add(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext> {
        self.validate_ciphertext(lhs)?;
        self.validate_ciphertext(rhs)?;
        Ok(Ciphertext((lhs.value() * rhs.value()) % &self.n_squared))
    }

    /// Sum a collection of ciphertexts.
    ///
    /// An empty collection yields a fresh encryption of zero.
    pub fn add_many<'a, I, R>(&self, ciphertexts: I, rng: &mut R) -> Result<Ciphertext>
    where
        I: IntoIterator<Item = &'a Ciphertext>,
        R: RngCore + CryptoRng,
    {
        let mut ciphertexts = ciphertexts.into_iter();
        let first = match ciphertexts.next() {
            Some(first) => first,
            None => return self.encrypt(&BigUint::zero(), rng),
        };
        self.validate_ciphertext(first)?;
        ciphertexts.try_fold(first.clone(), |sum, next| self.add(&sum, next))
    }

    /// Re-randomize a ciphertext by adding a fresh encryption of zero.
    pub fn refresh<R: RngCore + CryptoRng>(
        &self,
        ciphertext: &Ciphertext,
        rng: &mut R,
    ) -> Result<Ciphertext> {
        let zero = self.encrypt(&BigUint::zero(), rng)?;
        self.add(ciphertext, &zero)
    }
}

impl SecretKey {
    /// Decrypt `ciphertext`: `m = L(c^lambda mod n^2) * mu mod n`.
    ///
    /// # Errors
    /// Returns `PsiSumError::InvalidCiphertext` if `ciphertext` is not in `Z*_{n^2}`.
    pub fn decrypt(&self, ciphertext: &Ciphertext) -> Result<BigUint> {
        let c = ciphertext.value();
        if c.is_zero() || c >= &self.n_squared || !c.gcd(&self.n).is_one() {
            return Err(PsiSumError::InvalidCiphertext(
                "ciphertext is not in Z*_{n^2}".to_string(),
            ));
        }
        let l = l_function(&c.modpow(&self.lambda, &self.n_squared), &self.n);
        Ok((l * &self.mu) % &self.n)
    }
}
