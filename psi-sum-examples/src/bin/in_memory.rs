//! In-memory example of PSI-Sum protocol execution.
//!
//! This example runs both parties within a single process, passing each
//! round's message directly instead of over a network.
//!
//! Run with:
//! ```bash
//! cargo run --bin in_memory
//! ```

use psi_sum_protocol::{
    DdhGroup, PartyOne, PartyTwo, ProtocolParametersBuilder, RistrettoGroup, Session,
};
use rand::rngs::OsRng;
use std::sync::Arc;

/// Run the three rounds step by step, narrating each message.
fn run_step_by_step<G: DdhGroup>(
    group: Arc<G>,
    identifiers: Vec<Vec<u8>>,
    pairs: Vec<(Vec<u8>, u64)>,
    paillier_bits: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = OsRng;

    // === Setup: Party 2 generates its key and shares the public half ===
    println!("\n--- Setup ---");
    let mut party_two = PartyTwo::new(group.clone(), pairs, paillier_bits, &mut rng)?;
    let setup = party_two.setup_message();
    println!(
        "Party 2 generated a {}-bit Paillier key",
        setup.public_key.n().bits()
    );
    let mut party_one = PartyOne::new(group, identifiers, setup, &mut rng);

    // === Round 1: Party 1 -> Party 2 ===
    println!("\n--- Round 1 ---");
    let round1 = party_one.round1(&mut rng)?;
    println!("Party 1 sends {} blinded identifiers", round1.len());

    // === Round 2: Party 2 -> Party 1 ===
    println!("\n--- Round 2 ---");
    let round2 = party_two.round2(round1, &mut rng)?;
    println!(
        "Party 2 sends {} double-blinded identifiers and {} encrypted pairs",
        round2.double_blinded_identifiers.len(),
        round2.blinded_pairs.len()
    );

    // === Round 3: Party 1 -> Party 2 ===
    println!("\n--- Round 3 ---");
    let output = party_one.round3(round2, &mut rng)?;
    println!(
        "Party 1 found {} matches and sends the encrypted sum",
        output.cardinality
    );

    // === Output: Party 2 decrypts ===
    println!("\n--- Output ---");
    let sum = party_two.decrypt_sum(output.message)?;
    println!("Party 2 decrypts the intersection sum: {}", sum);

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== PSI-Sum Protocol In-Memory Example ===\n");

    let identifiers: Vec<Vec<u8>> = vec![
        b"userA".to_vec(),
        b"userB".to_vec(),
        b"userC".to_vec(),
        b"userX".to_vec(),
    ];
    let pairs: Vec<(Vec<u8>, u64)> = vec![
        (b"userB".to_vec(), 10),
        (b"userC".to_vec(), 20),
        (b"userZ".to_vec(), 7),
    ];

    println!("Party 1 identifiers ({}):", identifiers.len());
    for (i, item) in identifiers.iter().enumerate() {
        println!("  {}: {}", i + 1, String::from_utf8_lossy(item));
    }
    println!("\nParty 2 pairs ({}):", pairs.len());
    for (i, (item, value)) in pairs.iter().enumerate() {
        println!("  {}: {} -> {}", i + 1, String::from_utf8_lossy(item), value);
    }
    println!("\nExpected: intersection {{userB, userC}}, sum 30");

    // === Ristretto255 ===
    println!("\n=== Ristretto255 group ===");
    run_step_by_step(
        Arc::new(RistrettoGroup::new()),
        identifiers.clone(),
        pairs.clone(),
        2048,
    )?;

    // === Safe-prime group, via Session ===
    println!("\n\n=== Safe-prime group (Session) ===\n");
    let params = ProtocolParametersBuilder::new()
        .set_group_bits(512)
        .set_paillier_bits(1024)
        .build()?;
    let mut rng = OsRng;

    println!("Searching for a {}-bit safe prime...", params.group_bits());
    let group = Arc::new(params.generate_group(&mut rng)?);
    println!("Found p with {} bits", group.modulus().bits());

    let output = Session::setup(group, identifiers, pairs, &params, &mut rng)?.run(&mut rng)?;
    println!("Intersection sum: {}", output.sum);
    println!("Intersection cardinality: {}", output.cardinality);

    println!("\n✓ Protocol completed successfully!");
    println!("✓ Neither party learned which identifiers matched");

    Ok(())
}
