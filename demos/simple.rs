use consensus_bls::domain::{compute_domain, compute_signing_root, DST_ATTESTATION};
use consensus_bls::{Keypair, PublicKey, Signature};

/// Run using
/// ```sh
/// cargo run --example simple
/// ```
fn main() {
    let keypair = Keypair::generate(&mut ::rand::thread_rng());
    let message = b"Some message";
    let sig = keypair.sign(message);
    assert!(sig.verify(message, &keypair.public));

    // Keys and signatures travel compressed.
    let public = PublicKey::from_bytes(&keypair.public.to_bytes()).unwrap();
    let sig = Signature::from_bytes(&sig.to_bytes()).unwrap();
    assert!(public.verify(message, &sig));

    // An attestation signs a root bound to its fork and chain.
    let domain = compute_domain(&[1, 0, 0, 0], &[0, 0, 0, 0], &[0u8; 32]);
    let root = compute_signing_root(&domain, &[0x42; 32]);
    let attestation = keypair.secret.sign_with_dst(&root, DST_ATTESTATION).unwrap();
    assert!(public.verify_with_dst(&root, &attestation, DST_ATTESTATION));
    assert!(!public.verify(&root, &attestation));
    println!("{:?} signed {:?}", public, attestation);
}
