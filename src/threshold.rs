//! ## Threshold assembly of committee signatures
//!
//! Collects partial signatures indexed by committee position and adds
//! them up once at least `threshold` arrived.  Partials are assumed to
//! already encode whatever secret sharing the committee uses, so no
//! interpolation happens here, and partials beyond the threshold are
//! simply included.

use std::collections::HashSet;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::curve::G2Point;
use crate::error::{BlsError, BlsResult};
use crate::single::Signature;
use crate::validation::signature_point;

struct Partials {
    signatures: Vec<(u32, G2Point)>,
    signers: HashSet<u32>,
}

/// Accumulates partial signatures until a quorum of `threshold`.
pub struct ThresholdAssembler {
    threshold: usize,
    inner: Mutex<Partials>,
}

impl ThresholdAssembler {
    pub fn new(threshold: usize) -> BlsResult<Self> {
        if threshold == 0 {
            return Err(BlsError::ZeroThreshold);
        }
        Ok(ThresholdAssembler {
            threshold,
            inner: Mutex::new(Partials {
                signatures: Vec::new(),
                signers: HashSet::new(),
            }),
        })
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Adds the partial signature of `signer`, validating it first.
    /// Returns `Err` if `signer` already contributed.
    pub fn add_partial(&self, signer: u32, signature: &[u8]) -> BlsResult<()> {
        let point = signature_point(signature)?;
        let mut inner = self.inner.lock();
        if !inner.signers.insert(signer) {
            warn!(signer, "duplicate partial signature rejected");
            return Err(BlsError::DuplicateSigner(signer));
        }
        inner.signatures.push((signer, point));
        if inner.signatures.len() == self.threshold {
            debug!(signer, threshold = self.threshold, "threshold reached");
        }
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.inner.lock().signatures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.count() >= self.threshold
    }

    /// Signer indices in the order their partials arrived.
    pub fn signers(&self) -> Vec<u32> {
        self.inner.lock().signatures.iter().map(|(i, _)| *i).collect()
    }

    /// Sum of every collected partial, once the threshold is met.
    pub fn assemble(&self) -> BlsResult<Signature> {
        let inner = self.inner.lock();
        let collected = inner.signatures.len();
        if collected < self.threshold {
            return Err(BlsError::ThresholdNotMet {
                collected,
                threshold: self.threshold,
            });
        }
        Ok(Signature(inner.signatures.iter().map(|(_, sig)| *sig).sum()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate_pubkeys, aggregate_signatures, fast_aggregate_verify};
    use crate::field::Fr;
    use crate::single::{Keypair, PublicKey, SecretKey};
    use std::sync::Arc;
    use std::thread;

    fn committee(n: u64) -> Vec<Keypair> {
        (1..=n)
            .map(|i| SecretKey::from_scalar(Fr::from(7 * i)).unwrap().into())
            .collect()
    }

    #[test]
    fn threshold_of_two() {
        let kps = committee(5);
        let sigs: Vec<Signature> = kps.iter().map(|kp| kp.sign(b"checkpoint")).collect();
        let assembler = ThresholdAssembler::new(2).unwrap();
        assert_eq!(assembler.threshold(), 2);

        assembler.add_partial(0, &sigs[0].to_bytes()).unwrap();
        assert!(!assembler.is_complete());
        assert_eq!(
            assembler.assemble(),
            Err(BlsError::ThresholdNotMet { collected: 1, threshold: 2 })
        );

        assembler.add_partial(1, &sigs[1].to_bytes()).unwrap();
        assert!(assembler.is_complete());
        assert_eq!(assembler.assemble().unwrap(), aggregate_signatures(&sigs[..2]).unwrap());

        for (i, sig) in sigs.iter().enumerate().skip(2) {
            assembler.add_partial(i as u32, &sig.to_bytes()).unwrap();
        }
        assert_eq!(assembler.count(), 5);
        let full = assembler.assemble().unwrap();
        assert_eq!(full, aggregate_signatures(&sigs).unwrap(), "surplus partials are included");
        let pks: Vec<PublicKey> = kps.iter().map(|kp| kp.public).collect();
        assert!(fast_aggregate_verify(&pks, b"checkpoint", &full));
        assert!(aggregate_pubkeys(&pks).unwrap().verify(b"checkpoint", &full));
    }

    #[test]
    fn duplicates_and_invalid_partials() {
        let kps = committee(2);
        let sig = kps[0].sign(b"m").to_bytes();
        let assembler = ThresholdAssembler::new(1).unwrap();
        assembler.add_partial(3, &sig).unwrap();
        assert_eq!(
            assembler.add_partial(3, &kps[1].sign(b"m").to_bytes()),
            Err(BlsError::DuplicateSigner(3))
        );
        let mut infinity = [0u8; 96];
        infinity[0] = 0xc0;
        assert_eq!(assembler.add_partial(4, &infinity), Err(BlsError::InfiniteSignature));
        assert_eq!(assembler.add_partial(4, &sig[..40]), Err(BlsError::InvalidSignatureLength(40)));
        assert_eq!(assembler.signers(), vec![3]);
        // A rejected partial does not burn the signer slot.
        assembler.add_partial(4, &kps[1].sign(b"m").to_bytes()).unwrap();
        assert_eq!(assembler.signers(), vec![3, 4]);

        assert!(matches!(ThresholdAssembler::new(0), Err(BlsError::ZeroThreshold)));
    }

    #[test]
    fn concurrent_partials() {
        let kps = committee(6);
        let assembler = Arc::new(ThresholdAssembler::new(4).unwrap());
        let handles: Vec<_> = kps
            .iter()
            .enumerate()
            .map(|(i, kp)| {
                let assembler = Arc::clone(&assembler);
                let sig = kp.sign(b"epoch").to_bytes();
                thread::spawn(move || assembler.add_partial(i as u32, &sig))
            })
            .collect();
        for h in handles {
            h.join().unwrap().unwrap();
        }
        assert!(assembler.is_complete());
        let pks: Vec<PublicKey> = kps.iter().map(|kp| kp.public).collect();
        assert!(fast_aggregate_verify(&pks, b"epoch", &assembler.assemble().unwrap()));
    }
}
