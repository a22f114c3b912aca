//! ## Randomized batch verification
//!
//! We check `n` signatures on possibly unrelated messages with `n + 1`
//! pairings in one product, instead of `2n`, by raising each equation to
//! an independent random 128 bit exponent `r_i`:
//!
//! `prod_i e(r_i pk_i, H(m_i)) e(-g1, sum_i r_i sig_i) = 1`
//!
//! A batch containing any invalid signature passes with probability at
//! most `2^-128` over the choice of the `r_i`, provided the `r_i` are
//! unknown to whoever built the batch.  Constant exponents lose this,
//! since errors in two signatures can then cancel, so
//! `CoefficientSource::InsecureUnit` exists for tests only.
//!
//! Batching never replaces admission checks on untrusted input: every
//! entry is decoded with the full subgroup check, and one malformed
//! entry fails the whole batch rather than silently dropping out of it.

use std::collections::HashSet;
use std::mem;

use parking_lot::Mutex;
use rand::thread_rng;
use rand_core::{CryptoRng, RngCore};
use tracing::{debug, warn};

use ark_ff::{One, Zero};

use crate::curve::{G1Point, G2Point};
use crate::domain::DST_SIGNATURE;
use crate::error::{BlsError, BlsResult};
use crate::field::Fr;
use crate::hash_to_curve::hash_to_g2;
use crate::pairing::multi_pairing;
use crate::serialize::{G1_COMPRESSED_SIZE, G2_COMPRESSED_SIZE};
use crate::single::verify_hashed;
use crate::validation::{pubkey_point, signature_point};

/// One `(pubkey, message, signature)` triple awaiting verification.
///
/// An empty `tag` means the entry cannot be deduplicated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchEntry {
    pub pubkey: [u8; G1_COMPRESSED_SIZE],
    pub message: Vec<u8>,
    pub signature: [u8; G2_COMPRESSED_SIZE],
    pub tag: Vec<u8>,
}

impl BatchEntry {
    pub fn new(
        pubkey: [u8; G1_COMPRESSED_SIZE],
        message: &[u8],
        signature: [u8; G2_COMPRESSED_SIZE],
    ) -> BatchEntry {
        BatchEntry {
            pubkey,
            message: message.to_vec(),
            signature,
            tag: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: &[u8]) -> BatchEntry {
        self.tag = tag.to_vec();
        self
    }
}

/// Where batch verification takes its exponents from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoefficientSource {
    /// Independent uniform 128 bit exponents, zero replaced by one.
    Random,
    /// Every exponent is one.  Test only: an attacker who knows the
    /// exponents can make invalid signatures cancel out.
    InsecureUnit,
}

impl Default for CoefficientSource {
    fn default() -> Self {
        CoefficientSource::Random
    }
}

fn coefficient<R: RngCore + CryptoRng>(source: CoefficientSource, rng: &mut R) -> Fr {
    match source {
        CoefficientSource::InsecureUnit => Fr::one(),
        CoefficientSource::Random => {
            let mut bytes = [0u8; 16];
            rng.fill_bytes(&mut bytes);
            let r = Fr::from(u128::from_le_bytes(bytes));
            if r.is_zero() {
                Fr::one()
            } else {
                r
            }
        }
    }
}

/// A set of signatures verified together in one pairing product.
#[derive(Clone, Debug)]
pub struct SignatureSet {
    entries: Vec<BatchEntry>,
    dst: Vec<u8>,
    coefficients: CoefficientSource,
}

impl Default for SignatureSet {
    fn default() -> Self {
        SignatureSet::new()
    }
}

impl SignatureSet {
    /// An empty set verifying under the default signature tag.
    pub fn new() -> SignatureSet {
        SignatureSet::with_dst(DST_SIGNATURE)
    }

    /// An empty set verifying under `dst`.
    pub fn with_dst(dst: &[u8]) -> SignatureSet {
        SignatureSet {
            entries: Vec::new(),
            dst: dst.to_vec(),
            coefficients: CoefficientSource::default(),
        }
    }

    pub fn with_coefficients(mut self, coefficients: CoefficientSource) -> SignatureSet {
        self.coefficients = coefficients;
        self
    }

    pub fn add(
        &mut self,
        pubkey: [u8; G1_COMPRESSED_SIZE],
        message: &[u8],
        signature: [u8; G2_COMPRESSED_SIZE],
    ) {
        self.entries.push(BatchEntry::new(pubkey, message, signature));
    }

    pub fn push(&mut self, entry: BatchEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Verify every entry at once with exponents from `thread_rng`.
    pub fn verify(&self) -> bool {
        self.verify_with_rng(&mut thread_rng())
    }

    /// Verify every entry at once.  An empty set does not verify.
    pub fn verify_with_rng<R: RngCore + CryptoRng>(&self, rng: &mut R) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let mut pubkeys = Vec::with_capacity(self.entries.len() + 1);
        let mut messages = Vec::with_capacity(self.entries.len() + 1);
        let mut signatures = Vec::with_capacity(self.entries.len());
        for (index, entry) in self.entries.iter().enumerate() {
            let decoded = pubkey_point(&entry.pubkey).and_then(|pk| {
                let sig = signature_point(&entry.signature)?;
                let hashed = hash_to_g2(&entry.message, &self.dst)?;
                Ok((pk, hashed, sig))
            });
            match decoded {
                Ok((pk, hashed, sig)) => {
                    pubkeys.push(pk);
                    messages.push(hashed);
                    signatures.push(sig);
                }
                Err(error) => {
                    warn!(index, %error, "malformed entry fails the batch");
                    return false;
                }
            }
        }

        if signatures.len() == 1 {
            return verify_hashed(&pubkeys[0], &messages[0], &signatures[0]);
        }

        let mut aggregate = G2Point::identity();
        for (pk, sig) in pubkeys.iter_mut().zip(&signatures) {
            let r = coefficient(self.coefficients, rng);
            *pk = pk.mul(&r);
            aggregate += sig.mul(&r);
        }
        pubkeys.push(G1Point::generator().neg());
        messages.push(aggregate);
        multi_pairing(&pubkeys, &messages)
    }
}

struct PendingBatch {
    entries: Vec<BatchEntry>,
    tags: HashSet<Vec<u8>>,
    closed: bool,
}

/// A queue of submitted entries verified together on demand.
///
/// Open until `close`, after which submissions fail with `BatchClosed`.
/// Every operation holds the one internal lock, including verification.
pub struct BatchAggregator {
    inner: Mutex<PendingBatch>,
    dst: Vec<u8>,
    coefficients: CoefficientSource,
}

impl Default for BatchAggregator {
    fn default() -> Self {
        BatchAggregator::new()
    }
}

impl BatchAggregator {
    pub fn new() -> BatchAggregator {
        BatchAggregator::with_dst(DST_SIGNATURE)
    }

    pub fn with_dst(dst: &[u8]) -> BatchAggregator {
        BatchAggregator {
            inner: Mutex::new(PendingBatch {
                entries: Vec::new(),
                tags: HashSet::new(),
                closed: false,
            }),
            dst: dst.to_vec(),
            coefficients: CoefficientSource::default(),
        }
    }

    pub fn with_coefficients(mut self, coefficients: CoefficientSource) -> BatchAggregator {
        self.coefficients = coefficients;
        self
    }

    /// Queue an entry.  Entries with a tag already queued are refused.
    pub fn submit(&self, entry: BatchEntry) -> BlsResult<()> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(BlsError::BatchClosed);
        }
        if !entry.tag.is_empty() && !inner.tags.insert(entry.tag.clone()) {
            warn!(tag = %hex::encode(&entry.tag), "duplicate batch tag rejected");
            return Err(BlsError::DuplicateTag);
        }
        inner.entries.push(entry);
        Ok(())
    }

    /// Drain the queue and verify everything that was in it.
    ///
    /// The queue is empty afterwards whatever the outcome.  An empty
    /// queue is an error, while a malformed entry gives `(false, None)`.
    pub fn verify_batch(&self) -> (bool, Option<BlsError>) {
        let mut inner = self.inner.lock();
        let entries = mem::take(&mut inner.entries);
        inner.tags.clear();
        if entries.is_empty() {
            return (false, Some(BlsError::EmptyBatch));
        }
        let count = entries.len();
        let set = SignatureSet {
            entries,
            dst: self.dst.clone(),
            coefficients: self.coefficients,
        };
        let valid = set.verify();
        debug!(entries = count, valid, "batch drained");
        (valid, None)
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Refuse all further submissions.  Queued entries can still be verified.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        if !inner.closed {
            inner.closed = true;
            debug!(pending = inner.entries.len(), "batch aggregator closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}
