//! # BLS12-381 signatures for consensus
//!
//! Public keys live in `G1` and signatures in `G2`, which keeps the
//! many keys of a validator set small and puts the cost on the fewer,
//! aggregated signatures.  Messages hash to `G2` with the RFC 9380
//! `BLS12381G2_XMD:SHA-256_SSWU_RO_` suite, and points travel in the
//! 48 and 96 byte compressed encodings shared with Ethereum and zcash.
//!
//! We implement the group law, the point codec and hash to curve
//! ourselves, on top of `ark-bls12-381` field arithmetic.  We do not
//! implement the pairing itself, which `pairing::multi_pairing` borrows
//! from arkworks.
//!
//! On top sit the pieces a consensus client needs:
//!
//! - `single`: keys, plain signatures and IETF `KeyGen`,
//! - `pop`: proofs of possession against rogue key attacks,
//! - `aggregate`: plain, weighted and streaming aggregation, plus
//!   verification of same message and distinct message aggregates,
//! - `batch`: randomized batch verification and a queue around it,
//! - `threshold`: assembly of committee signatures from partials,
//! - `backend`: a process wide choice of verification backend.
//!
//! Aggregating keys is only safe once their proofs of possession were
//! checked, or when every signer signs a distinct message.  Nothing
//! here keeps track of which keys proved possession, so callers must.
//!
//! ```
//! use consensus_bls::{aggregate_signatures, fast_aggregate_verify, Keypair};
//!
//! let mut rng = rand::thread_rng();
//! let alice = Keypair::generate(&mut rng);
//! let bob = Keypair::generate(&mut rng);
//! let message = b"checkpoint 17";
//!
//! let signature = aggregate_signatures(&[alice.sign(message), bob.sign(message)]).unwrap();
//! assert!(fast_aggregate_verify(&[alice.public, bob.public], message, &signature));
//! ```

pub mod aggregate;
pub mod backend;
pub mod batch;
pub mod curve;
pub mod domain;
pub mod error;
pub mod field;
pub mod hash_to_curve;
pub mod pairing;
pub mod pop;
pub mod serialize;
pub mod single;
pub mod threshold;
pub mod validation;

pub use crate::aggregate::{
    aggregate_pubkeys, aggregate_pubkeys_validated, aggregate_signatures,
    aggregate_signatures_validated, aggregate_verify, aggregate_verify_distinct,
    aggregate_weighted, deduplicate_pubkeys, fast_aggregate_verify,
    fast_aggregate_verify_with_pop, has_duplicate_pubkeys, IncrementalAggregator, WeightedPubkey,
};
pub use crate::backend::{
    active_backend, backend_name, set_backend, verify_with_backend, ArkworksBackend, BlsBackend,
    ReferenceBackend,
};
pub use crate::batch::{BatchAggregator, BatchEntry, CoefficientSource, SignatureSet};
pub use crate::curve::{G1Point, G2Point};
pub use crate::error::{BlsError, BlsResult, ErrorKind};
pub use crate::pop::{generate_pop, verify_pop, verify_pops, ProofOfPossession};
pub use crate::serialize::{PointError, SerializableToBytes, G1_COMPRESSED_SIZE, G2_COMPRESSED_SIZE};
pub use crate::single::{Keypair, PublicKey, SecretKey, Signature};
pub use crate::threshold::ThresholdAssembler;
pub use crate::validation::{
    check_g1_subgroup, check_g2_subgroup, decompress_g1, decompress_g2, validate_pubkey,
    validate_signature,
};
