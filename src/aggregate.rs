//! ## Aggregation of public keys and signatures
//!
//! BLS signatures aggregate by plain group addition, in both groups.
//! Adding up keys is only sound once every key proved possession of its
//! secret, or when every signer signed a distinct message, so the
//! verification routines below come in those two flavors.
//!
//! The "fast" routines take decoded keys and signatures and trust that
//! their subgroup checks already ran.  The `_validated` routines and
//! `IncrementalAggregator` take compressed bytes straight from the wire
//! and decode, subgroup check and refuse the identity for every input
//! before adding anything.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use tracing::warn;

use crate::curve::{G1Point, G2Curve, G2Point};
use crate::domain::DST_SIGNATURE;
use crate::error::{BlsError, BlsResult};
use crate::field::Fr;
use crate::hash_to_curve::hash_to_curve_unchecked;
use crate::pairing::multi_pairing;
use crate::pop::{verify_pops, ProofOfPossession};
use crate::serialize::{G1_COMPRESSED_SIZE, G2_COMPRESSED_SIZE};
use crate::single::{verify_hashed, PublicKey, Signature};
use crate::validation::{check_g2_subgroup, pubkey_point, signature_point};

/// Sum of public keys, for signers assumed to have proven possession.
pub fn aggregate_pubkeys(pubkeys: &[PublicKey]) -> BlsResult<PublicKey> {
    if pubkeys.is_empty() {
        return Err(BlsError::NoPubkeys);
    }
    Ok(PublicKey(pubkeys.iter().map(|pk| pk.0).sum()))
}

/// Sum of signatures.
pub fn aggregate_signatures(signatures: &[Signature]) -> BlsResult<Signature> {
    if signatures.is_empty() {
        return Err(BlsError::NoSignatures);
    }
    Ok(Signature(signatures.iter().map(|sig| sig.0).sum()))
}

/// A compressed public key with a positive multiplicity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeightedPubkey {
    pub pubkey: [u8; G1_COMPRESSED_SIZE],
    pub weight: u64,
}

/// `sum(weight_i pk_i)`, validating every key.
///
/// Unit weights give the same key as `aggregate_pubkeys`.
pub fn aggregate_weighted(entries: &[WeightedPubkey]) -> BlsResult<PublicKey> {
    if entries.is_empty() {
        return Err(BlsError::NoPubkeys);
    }
    let mut acc = G1Point::identity();
    for (index, entry) in entries.iter().enumerate() {
        if entry.weight == 0 {
            return Err(BlsError::ZeroWeight { index });
        }
        let point = pubkey_point(&entry.pubkey)?;
        acc += point.mul(&Fr::from(entry.weight));
    }
    Ok(PublicKey(acc))
}

/// Decode and add compressed public keys, refusing the identity or any
/// key outside `G1`.
pub fn aggregate_pubkeys_validated(pubkeys: &[[u8; G1_COMPRESSED_SIZE]]) -> BlsResult<PublicKey> {
    if pubkeys.is_empty() {
        return Err(BlsError::NoPubkeys);
    }
    let mut acc = G1Point::identity();
    for bytes in pubkeys {
        acc += pubkey_point(bytes)?;
    }
    Ok(PublicKey(acc))
}

/// Decode and add compressed signatures, refusing the identity or any
/// signature outside `G2`.
pub fn aggregate_signatures_validated(signatures: &[[u8; G2_COMPRESSED_SIZE]]) -> BlsResult<Signature> {
    if signatures.is_empty() {
        return Err(BlsError::NoSignatures);
    }
    let mut acc = G2Point::identity();
    for bytes in signatures {
        acc += signature_point(bytes)?;
    }
    Ok(Signature(acc))
}

struct RunningSums {
    pubkey: G1Point,
    signature: G2Point,
    seen: HashSet<[u8; G1_COMPRESSED_SIZE]>,
}

/// Streaming aggregation of `(pubkey, signature)` pairs that arrive one
/// at a time, refusing any signer twice.
///
/// All operations, reads included, hold the one internal lock.
pub struct IncrementalAggregator {
    inner: Mutex<RunningSums>,
}

impl Default for IncrementalAggregator {
    fn default() -> Self {
        IncrementalAggregator::new()
    }
}

impl IncrementalAggregator {
    pub fn new() -> Self {
        IncrementalAggregator {
            inner: Mutex::new(RunningSums {
                pubkey: G1Point::identity(),
                signature: G2Point::identity(),
                seen: HashSet::new(),
            }),
        }
    }

    /// Validate both encodings and fold them into the running sums.
    ///
    /// Nothing changes when this returns an error.
    pub fn add(&self, pubkey: &[u8], signature: &[u8]) -> BlsResult<()> {
        let pk = pubkey_point(pubkey)?;
        let sig = signature_point(signature)?;
        let key = pk.to_compressed();

        let mut inner = self.inner.lock();
        if !inner.seen.insert(key) {
            warn!(pubkey = %hex::encode(&key[..8]), "duplicate signer rejected by aggregator");
            return Err(BlsError::DuplicatePubkey);
        }
        inner.pubkey += pk;
        inner.signature += sig;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.inner.lock().seen.len()
    }

    /// Current aggregate signature, the identity while empty.
    pub fn aggregate_signature(&self) -> Signature {
        Signature(self.inner.lock().signature)
    }

    /// Current aggregate public key, the identity while empty.
    pub fn aggregate_pubkey(&self) -> PublicKey {
        PublicKey(self.inner.lock().pubkey)
    }
}

fn hash_message(message: &[u8]) -> G2Point {
    hash_to_curve_unchecked::<G2Curve>(message, DST_SIGNATURE)
}

/// Verify a signature on one message by every key in `pubkeys`.
///
/// Sound only for keys with verified proofs of possession.  False for
/// an empty key list or any identity key or signature.
pub fn fast_aggregate_verify(pubkeys: &[PublicKey], message: &[u8], signature: &Signature) -> bool {
    if pubkeys.is_empty() || pubkeys.iter().any(PublicKey::is_identity) {
        return false;
    }
    let aggregate: G1Point = pubkeys.iter().map(|pk| pk.0).sum();
    verify_hashed(&aggregate, &hash_message(message), &signature.0)
}

/// `fast_aggregate_verify` after checking one proof of possession per key.
pub fn fast_aggregate_verify_with_pop(
    pubkeys: &[PublicKey],
    pops: &[ProofOfPossession],
    message: &[u8],
    signature: &Signature,
) -> bool {
    verify_pops(pubkeys, pops).is_ok() && fast_aggregate_verify(pubkeys, message, signature)
}

// Keys that appear several times get their message points summed, so
// the pairing count is the number of distinct signers plus one.
fn verify_distinct_messages(pubkeys: &[G1Point], messages: &[&[u8]], signature: &G2Point) -> bool {
    if signature.is_identity() || pubkeys.iter().any(G1Point::is_identity) {
        return false;
    }
    let mut seen = HashSet::with_capacity(messages.len());
    if !messages.iter().all(|m| seen.insert(*m)) {
        return false;
    }
    let mut merged: HashMap<[u8; G1_COMPRESSED_SIZE], (G1Point, G2Point)> = HashMap::new();
    for (pk, message) in pubkeys.iter().zip(messages) {
        let hashed = hash_message(message);
        merged
            .entry(pk.to_compressed())
            .and_modify(|(_, h)| *h += hashed)
            .or_insert((*pk, hashed));
    }
    let (mut g1s, mut g2s): (Vec<G1Point>, Vec<G2Point>) = merged.into_values().unzip();
    g1s.push(G1Point::generator().neg());
    g2s.push(*signature);
    multi_pairing(&g1s, &g2s)
}

/// Verify an aggregate of signatures on pairwise distinct messages.
///
/// False for empty input, differing lengths or a repeated message.
pub fn aggregate_verify(pubkeys: &[PublicKey], messages: &[&[u8]], signature: &Signature) -> bool {
    if pubkeys.is_empty() || pubkeys.len() != messages.len() {
        return false;
    }
    let points: Vec<G1Point> = pubkeys.iter().map(|pk| pk.0).collect();
    verify_distinct_messages(&points, messages, &signature.0)
}

/// `aggregate_verify` over compressed inputs, reporting malformed input
/// as an error before any pairing runs.
///
/// A repeated message gives `Ok(false)`.
pub fn aggregate_verify_distinct(
    pubkeys: &[[u8; G1_COMPRESSED_SIZE]],
    messages: &[&[u8]],
    signature: &[u8],
) -> BlsResult<bool> {
    if pubkeys.is_empty() {
        return Err(BlsError::NoPubkeys);
    }
    if messages.is_empty() {
        return Err(BlsError::NoMessages);
    }
    if pubkeys.len() != messages.len() {
        return Err(BlsError::MismatchedLengths {
            left: pubkeys.len(),
            right: messages.len(),
        });
    }
    let points = pubkeys
        .iter()
        .map(|bytes| pubkey_point(bytes))
        .collect::<BlsResult<Vec<_>>>()?;
    let signature = check_g2_subgroup(signature)?;
    Ok(verify_distinct_messages(&points, messages, &signature))
}

/// Drop repeated keys, keeping first occurrences in order together with
/// their original positions.
pub fn deduplicate_pubkeys(pubkeys: &[PublicKey]) -> (Vec<PublicKey>, Vec<usize>) {
    let mut seen = HashSet::with_capacity(pubkeys.len());
    let mut unique = Vec::new();
    let mut indices = Vec::new();
    for (index, pk) in pubkeys.iter().enumerate() {
        if seen.insert(pk.to_bytes()) {
            unique.push(*pk);
            indices.push(index);
        }
    }
    (unique, indices)
}

pub fn has_duplicate_pubkeys(pubkeys: &[PublicKey]) -> bool {
    let mut seen = HashSet::with_capacity(pubkeys.len());
    !pubkeys.iter().all(|pk| seen.insert(pk.to_bytes()))
}
