use consensus_bls::{
    aggregate_signatures, fast_aggregate_verify_with_pop, BatchAggregator, BatchEntry, Keypair,
    ThresholdAssembler,
};

/// Run using
/// ```sh
/// cargo run --example batched
/// ```
fn main() {
    let mut rng = ::rand::thread_rng();
    let keypairs: Vec<Keypair> = (0..4).map(|_| Keypair::generate(&mut rng)).collect();

    // Attestations on different blocks, checked in one pairing product.
    let batch = BatchAggregator::new();
    for (i, k) in keypairs.iter().enumerate() {
        let msg = format!("block {}", i);
        let sig = k.sign(msg.as_bytes());
        let entry = BatchEntry::new(k.public.to_bytes(), msg.as_bytes(), sig.to_bytes())
            .with_tag(&[i as u8]);
        batch.submit(entry).unwrap();
    }
    let (valid, error) = batch.verify_batch();
    assert!(valid && error.is_none());
    assert_eq!(batch.pending(), 0);

    // Votes on one block, aggregated after checking proofs of possession.
    let message = b"block 7";
    let publics: Vec<_> = keypairs.iter().map(|k| k.public).collect();
    let pops: Vec<_> = keypairs.iter().map(|k| k.generate_pop()).collect();
    let sigs: Vec<_> = keypairs.iter().map(|k| k.sign(message)).collect();
    let aggregate = aggregate_signatures(&sigs).unwrap();
    assert!(fast_aggregate_verify_with_pop(&publics, &pops, message, &aggregate));

    // The same votes assembled once three of four arrived.
    let assembler = ThresholdAssembler::new(3).unwrap();
    for (i, sig) in sigs.iter().enumerate().take(3) {
        assembler.add_partial(i as u32, &sig.to_bytes()).unwrap();
    }
    let assembled = assembler.assemble().unwrap();
    assert!(fast_aggregate_verify_with_pop(&publics[..3], &pops[..3], message, &assembled));
    println!("{} votes assembled into {:?}", assembler.count(), assembled);
}
