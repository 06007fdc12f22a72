//! Sequencing of the three PSI-Sum rounds and the output step.

use crate::config::ProtocolParameters;
use crate::error::{PsiSumError, Result};
use crate::group::DdhGroup;
use crate::messages::{ProtocolOutput, Round1Message, Round2Message, Round3Message};
use crate::party_one::PartyOne;
use crate::party_two::PartyTwo;
use rand::{CryptoRng, RngCore};
use std::sync::Arc;

/// Where a [`Session`] is in the linear round sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolState {
    /// Both parties constructed, public key delivered
    Init,
    /// Party 1 has produced its blinded identifiers
    Round1Sent,
    /// Party 2 has answered with its two shuffled lists
    Round2Sent,
    /// Party 1 has produced the encrypted intersection sum
    Round3Sent,
    /// Party 2 has decrypted the sum
    Complete,
}

/// Runs both parties of one protocol run in-process.
///
/// Each step consumes the previous step's message. A step invoked out of
/// order fails with `PsiSumError::ProtocolSequence`; after any failure the
/// session cannot be resumed.
#[derive(Debug)]
pub struct Session<G: DdhGroup> {
    state: ProtocolState,
    party_one: Option<PartyOne<G>>,
    party_two: Option<PartyTwo<G>>,
    round1: Option<Round1Message<G::Element>>,
    round2: Option<Round2Message<G::Element>>,
    round3: Option<Round3Message>,
    cardinality: usize,
}

impl<G: DdhGroup> Session<G> {
    /// Create a session from two freshly constructed parties.
    pub fn new(party_one: PartyOne<G>, party_two: PartyTwo<G>) -> Self {
        Self {
            state: ProtocolState::Init,
            party_one: Some(party_one),
            party_two: Some(party_two),
            round1: None,
            round2: None,
            round3: None,
            cardinality: 0,
        }
    }

    /// Construct both parties and perform the key setup.
    ///
    /// Party 2 generates a key pair of the configured size, then Party 1 is
    /// created from Party 2's setup message.
    ///
    /// # Arguments
    /// * `group` - The group both parties agree on
    /// * `identifiers` - Party 1's identifier set `V`
    /// * `pairs` - Party 2's `(identifier, value)` pairs `W`
    /// * `params` - Key sizes
    /// * `rng` - Randomness for keys and exponents
    pub fn setup<R: RngCore + CryptoRng>(
        group: Arc<G>,
        identifiers: Vec<Vec<u8>>,
        pairs: Vec<(Vec<u8>, u64)>,
        params: &ProtocolParameters,
        rng: &mut R,
    ) -> Result<Self> {
        let keypair = params.generate_keypair(rng)?;
        let party_two = PartyTwo::with_keypair(group.clone(), pairs, keypair, rng)?;
        let party_one = PartyOne::new(group, identifiers, party_two.setup_message(), rng);
        Ok(Self::new(party_one, party_two))
    }

    /// The current state.
    pub fn state(&self) -> ProtocolState {
        self.state
    }

    fn expect_state(&self, expected: ProtocolState, step: &str) -> Result<()> {
        if self.state != expected {
            return Err(PsiSumError::ProtocolSequence(format!(
                "{} requires state {:?}, session is in {:?}",
                step, expected, self.state
            )));
        }
        Ok(())
    }

    /// Party 1 blinds and sends its identifiers.
    pub fn round1<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Result<&Round1Message<G::Element>> {
        self.expect_state(ProtocolState::Init, "round 1")?;
        let party_one = self
            .party_one
            .as_mut()
            .ok_or_else(|| missing("party one"))?;

        let message = party_one.round1(rng)?;
        self.state = ProtocolState::Round1Sent;
        Ok(&*self.round1.insert(message))
    }

    /// Party 2 double-blinds Party 1's set and sends its blinded pairs.
    pub fn round2<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Result<&Round2Message<G::Element>> {
        self.expect_state(ProtocolState::Round1Sent, "round 2")?;
        let incoming = self.round1.take().ok_or_else(|| missing("round 1 message"))?;
        let party_two = self
            .party_two
            .as_mut()
            .ok_or_else(|| missing("party two"))?;

        let message = party_two.round2(incoming, rng)?;
        self.state = ProtocolState::Round2Sent;
        Ok(&*self.round2.insert(message))
    }

    /// Party 1 matches the intersection and sends the encrypted sum.
    pub fn round3<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Result<&Round3Message> {
        self.expect_state(ProtocolState::Round2Sent, "round 3")?;
        let incoming = self.round2.take().ok_or_else(|| missing("round 2 message"))?;
        let party_one = self.party_one.take().ok_or_else(|| missing("party one"))?;

        let output = party_one.round3(incoming, rng)?;
        self.cardinality = output.cardinality;
        self.state = ProtocolState::Round3Sent;
        Ok(&*self.round3.insert(output.message))
    }

    /// Party 2 decrypts the intersection sum.
    pub fn output(&mut self) -> Result<ProtocolOutput> {
        self.expect_state(ProtocolState::Round3Sent, "output")?;
        let incoming = self.round3.take().ok_or_else(|| missing("round 3 message"))?;
        let party_two = self.party_two.take().ok_or_else(|| missing("party two"))?;

        let sum = party_two.decrypt_sum(incoming)?;
        self.state = ProtocolState::Complete;
        Ok(ProtocolOutput {
            sum,
            cardinality: self.cardinality,
        })
    }

    /// Run all rounds and the output step in order.
    pub fn run<R: RngCore + CryptoRng>(mut self, rng: &mut R) -> Result<ProtocolOutput> {
        self.round1(rng)?;
        self.round2(rng)?;
        self.round3(rng)?;
        self.output()
    }
}

fn missing(what: &str) -> PsiSumError {
    PsiSumError::ProtocolSequence(format!("{} is no longer available", what))
}
