//! # Private Intersection-Sum with Cardinality (PSI-Sum)
//!
//! This library implements the DDH-based private intersection-sum protocol
//! in the semi-honest model. Party 1 holds a set of identifiers `V`; Party 2
//! holds identifier/value pairs `W`. At the end Party 2 learns the sum of
//! the values whose identifiers are in both sets, Party 1 learns the size of
//! the intersection, and neither learns which identifiers matched.
//!
//! ## Building Blocks
//!
//! - **Commutative blinding** in a prime-order group ([`DdhGroup`]): both
//!   parties raise hashed identifiers to secret exponents, so matching
//!   identifiers meet at the same `H(x)^(k1*k2)` without being revealed.
//! - **Paillier encryption** ([`paillier`]): Party 2's values travel
//!   encrypted, and Party 1 sums the matching ones homomorphically.
//!
//! ## Protocol Overview
//!
//! | Round | Sender | Payload |
//! |---|---|---|
//! | Setup | Party 2 | Paillier public key |
//! | 1 | Party 1 | shuffled `H(v)^k1` |
//! | 2 | Party 2 | shuffled `H(v)^(k1*k2)`; shuffled `(H(w)^k2, Enc(t))` |
//! | 3 | Party 1 | refreshed `Enc(sum)` |
//! | Output | Party 2 | decrypted sum |
//!
//! The library is transport agnostic: messages are plain structs and
//! exchanging them is left to the caller. [`Session`] runs both parties
//! in-process.
//!
//! ## Example Usage
//!
//! ```ignore
//! use psi_sum_protocol::{PartyOne, PartyTwo, RistrettoGroup};
//! use rand::rngs::OsRng;
//! use std::sync::Arc;
//!
//! let group = Arc::new(RistrettoGroup::new());
//! let mut rng = OsRng;
//!
//! let mut bob = PartyTwo::new(group.clone(), vec![(b"userB".to_vec(), 10)], 2048, &mut rng)?;
//! let mut alice = PartyOne::new(group, vec![b"userB".to_vec()], bob.setup_message(), &mut rng);
//!
//! let round1 = alice.round1(&mut rng)?;
//! let round2 = bob.round2(round1, &mut rng)?;
//! let round3 = alice.round3(round2, &mut rng)?;
//! let sum = bob.decrypt_sum(round3.message)?;
//! # Ok::<(), psi_sum_protocol::PsiSumError>(())
//! ```
//!
//! ## Security Considerations
//!
//! - Semi-honest only: no proofs of correct exponentiation or encryption.
//! - Arithmetic is not constant-time.
//! - Messages should travel over an authenticated channel.
//!
//! ## Modules
//!
//! - [`group`] - Prime-order groups for the blinding
//! - [`paillier`] - Additively homomorphic encryption
//! - [`messages`] - Message types for protocol exchange
//! - [`protocol`] - In-process round sequencing
//! - [`config`] - Security parameters

pub use config::{ProtocolParameters, ProtocolParametersBuilder};
pub use error::{PsiSumError, Result};
pub use group::{DdhGroup, RistrettoGroup, SafePrimeGroup};
pub use messages::{
    ProtocolOutput, Round1Message, Round2Message, Round3Message, SetupMessage,
};
pub use paillier::{Ciphertext, KeyPair, PublicKey, SecretKey};
pub use party_one::{PartyOne, PartyOneOutput};
pub use party_two::PartyTwo;
pub use protocol::{ProtocolState, Session};

pub mod config;
mod error;
pub mod group;
pub mod messages;
pub mod paillier;
mod party_one;
mod party_two;
pub mod protocol;

/// Integration tests for the full PSI-Sum protocol.
#[cfg(test)]
mod integration_tests {
    use super::*;
    use num_bigint_dig::BigUint;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::sync::Arc;

    fn seed_scenario() -> (Vec<Vec<u8>>, Vec<(Vec<u8>, u64)>) {
        let v = vec![
            b"userA".to_vec(),
            b"userB".to_vec(),
            b"userC".to_vec(),
            b"userX".to_vec(),
        ];
        let w = vec![
            (b"userB".to_vec(), 10),
            (b"userC".to_vec(), 20),
            (b"userZ".to_vec(), 7),
        ];
        (v, w)
    }

    fn run<G: DdhGroup>(
        group: Arc<G>,
        v: Vec<Vec<u8>>,
        w: Vec<(Vec<u8>, u64)>,
        rng: &mut ChaCha20Rng,
    ) -> (BigUint, usize) {
        let mut party_two = PartyTwo::new(group.clone(), w, 256, rng).unwrap();
        let mut party_one = PartyOne::new(group, v, party_two.setup_message(), rng);

        let round1 = party_one.round1(rng).unwrap();
        let round2 = party_two.round2(round1, rng).unwrap();
        let round3 = party_one.round3(round2, rng).unwrap();
        let sum = party_two.decrypt_sum(round3.message).unwrap();
        (sum, round3.cardinality)
    }

    #[test]
    fn test_seed_scenario_safe_prime_group() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let group = Arc::new(SafePrimeGroup::generate(128, &mut rng).unwrap());

        for seed in 0..4 {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let (v, w) = seed_scenario();
            let (sum, cardinality) = run(group.clone(), v, w, &mut rng);
            assert_eq!(sum, BigUint::from(30u32));
            assert_eq!(cardinality, 2);
        }
    }

    #[test]
    fn test_seed_scenario_ristretto_group() {
        let group = Arc::new(RistrettoGroup::new());

        for seed in 0..4 {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let (v, w) = seed_scenario();
            let (sum, cardinality) = run(group.clone(), v, w, &mut rng);
            assert_eq!(sum, BigUint::from(30u32));
            assert_eq!(cardinality, 2);
        }
    }

    #[test]
    fn test_disjoint_sets_sum_to_zero() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let group = Arc::new(RistrettoGroup::new());
        let v = vec![b"apple".to_vec(), b"banana".to_vec()];
        let w = vec![(b"cherry".to_vec(), 3), (b"date".to_vec(), 4)];

        let (sum, cardinality) = run(group, v, w, &mut rng);
        assert_eq!(sum, BigUint::from(0u32));
        assert_eq!(cardinality, 0);
    }

    #[test]
    fn test_empty_inputs_sum_to_zero() {
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let group = Arc::new(RistrettoGroup::new());

        let (sum, _) = run(group.clone(), vec![], vec![(b"a".to_vec(), 1)], &mut rng);
        assert_eq!(sum, BigUint::from(0u32));
        let (sum, _) = run(group, vec![b"a".to_vec()], vec![], &mut rng);
        assert_eq!(sum, BigUint::from(0u32));
    }

    #[test]
    fn test_cardinality_only_variant() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let group = Arc::new(RistrettoGroup::new());
        let (v, w) = seed_scenario();
        let identifiers = w.into_iter().map(|(id, _)| id).collect();

        let keypair = KeyPair::generate(256, &mut rng).unwrap();
        let mut party_two =
            PartyTwo::cardinality_only(group.clone(), identifiers, keypair, &mut rng).unwrap();
        let mut party_one = PartyOne::new(group, v, party_two.setup_message(), &mut rng);

        let round1 = party_one.round1(&mut rng).unwrap();
        let round2 = party_two.round2(round1, &mut rng).unwrap();
        let round3 = party_one.round3(round2, &mut rng).unwrap();
        assert_eq!(party_two.decrypt_sum(round3.message).unwrap(), BigUint::from(2u32));
    }

    #[test]
    fn test_large_sets_with_intersection() {
        let mut rng = ChaCha20Rng::seed_from_u64(10);
        let group = Arc::new(RistrettoGroup::new());

        let mut v: Vec<Vec<u8>> = (0..90).map(|i| format!("v-only-{}", i).into_bytes()).collect();
        let mut w: Vec<(Vec<u8>, u64)> =
            (0..90).map(|i| (format!("w-only-{}", i).into_bytes(), 1000)).collect();
        for i in 0..10u64 {
            let common = format!("common-{}", i).into_bytes();
            v.push(common.clone());
            w.push((common, i));
        }

        let (sum, cardinality) = run(group, v, w, &mut rng);
        assert_eq!(sum, BigUint::from(45u32));
        assert_eq!(cardinality, 10);
    }

    #[test]
    fn test_shared_keypair_fresh_exponents() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let group = Arc::new(RistrettoGroup::new());
        let keypair = KeyPair::generate(256, &mut rng).unwrap();

        let mut round1_messages = Vec::new();
        for _ in 0..2 {
            let (v, w) = seed_scenario();
            let mut party_two =
                PartyTwo::with_keypair(group.clone(), w, keypair.clone(), &mut rng).unwrap();
            let mut party_one = PartyOne::new(group.clone(), v, party_two.setup_message(), &mut rng);

            let round1 = party_one.round1(&mut rng).unwrap();
            round1_messages.push(round1.clone());
            let round2 = party_two.round2(round1, &mut rng).unwrap();
            let round3 = party_one.round3(round2, &mut rng).unwrap();
            assert_eq!(
                party_two.decrypt_sum(round3.message).unwrap(),
                BigUint::from(30u32)
            );
        }

        // Fresh k1 per run: no blinded identifier repeats across runs.
        let first: std::collections::HashSet<_> =
            round1_messages[0].blinded_identifiers.iter().collect();
        assert!(round1_messages[1]
            .blinded_identifiers
            .iter()
            .all(|element| !first.contains(element)));
    }

    #[test]
    fn test_pair_orderings_depend_on_randomness() {
        let group = Arc::new(RistrettoGroup::new());
        let v: Vec<Vec<u8>> = (0..16).map(|i| format!("id-{}", i).into_bytes()).collect();
        let w: Vec<(Vec<u8>, u64)> = (0..16).map(|i| (format!("id-{}", i).into_bytes(), i)).collect();

        // The decrypted value at each position identifies which pair landed there.
        let mut pair_orders = Vec::new();
        for seed in [100, 200] {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let keypair = KeyPair::generate(256, &mut rng).unwrap();
            let secret_key = keypair.secret_key().clone();
            let mut party_two =
                PartyTwo::with_keypair(group.clone(), w.clone(), keypair, &mut rng).unwrap();
            let mut party_one =
                PartyOne::new(group.clone(), v.clone(), party_two.setup_message(), &mut rng);

            let round1 = party_one.round1(&mut rng).unwrap();
            let round2 = party_two.round2(round1, &mut rng).unwrap();
            let order: Vec<BigUint> = round2
                .blinded_pairs
                .iter()
                .map(|(_, c)| secret_key.decrypt(c).unwrap())
                .collect();
            pair_orders.push(order);
        }

        let in_order: Vec<BigUint> = (0..16u32).map(BigUint::from).collect();
        assert_ne!(pair_orders[0], in_order);
        assert_ne!(pair_orders[1], in_order);
        assert_ne!(pair_orders[0], pair_orders[1]);
    }

    #[test]
    fn test_session_with_configured_group() {
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        let params = ProtocolParametersBuilder::new()
            .set_group_bits(96)
            .set_paillier_bits(256)
            .build()
            .unwrap();
        let group = Arc::new(params.generate_group(&mut rng).unwrap());
        let (v, w) = seed_scenario();

        let output = Session::setup(group, v, w, &params, &mut rng)
            .unwrap()
            .run(&mut rng)
            .unwrap();
        assert_eq!(output.sum, BigUint::from(30u32));
        assert_eq!(output.cardinality, 2);
    }
}
