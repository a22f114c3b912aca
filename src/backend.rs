//! ## Swappable verification backends
//!
//! Verification over raw bytes can run on our own group law and hash to
//! curve, or entirely on arkworks.  Both share the pairing, so they must
//! agree on every input, which the tests check.  One backend is active
//! per process, the reference one unless `set_backend` chose another,
//! and nothing outside this module needs to know which.

use std::collections::HashSet;
use std::sync::Arc;

use ark_bls12_381::{g2, Bls12_381, G1Affine, G1Projective, G2Affine, G2Projective};
use ark_ec::hashing::{curve_maps::wb::WBMap, map_to_curve_hasher::MapToCurveBasedHasher, HashToCurve};
use ark_ec::pairing::Pairing;
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::field_hashers::DefaultFieldHasher;
use ark_ff::One;
use ark_serialize::CanonicalDeserialize;
use parking_lot::{const_rwlock, RwLock};
use sha2::Sha256;
use tracing::info;

use crate::aggregate::{aggregate_verify, fast_aggregate_verify};
use crate::domain::DST_SIGNATURE;
use crate::serialize::{G1_COMPRESSED_SIZE, G2_COMPRESSED_SIZE};
use crate::single::{PublicKey, Signature};

/// Signature verification over compressed encodings.
///
/// Malformed, identity or out of subgroup input gives `false`, as do
/// empty lists and lists of different lengths.  Messages are hashed
/// under the default signature tag.
pub trait BlsBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn verify(&self, pubkey: &[u8], message: &[u8], signature: &[u8]) -> bool;

    /// Signatures by `pubkeys[i]` on pairwise distinct `messages[i]`.
    fn aggregate_verify(&self, pubkeys: &[&[u8]], messages: &[&[u8]], signature: &[u8]) -> bool;

    /// Signatures by every key on one message.
    fn fast_aggregate_verify(&self, pubkeys: &[&[u8]], message: &[u8], signature: &[u8]) -> bool;
}

/// Our own codec, group law and hash to curve.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferenceBackend;

fn decode_pubkeys(pubkeys: &[&[u8]]) -> Option<Vec<PublicKey>> {
    pubkeys.iter().map(|bytes| PublicKey::from_bytes(bytes).ok()).collect()
}

impl BlsBackend for ReferenceBackend {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn verify(&self, pubkey: &[u8], message: &[u8], signature: &[u8]) -> bool {
        match (PublicKey::from_bytes(pubkey), Signature::from_bytes(signature)) {
            (Ok(pk), Ok(sig)) => pk.verify(message, &sig),
            _ => false,
        }
    }

    fn aggregate_verify(&self, pubkeys: &[&[u8]], messages: &[&[u8]], signature: &[u8]) -> bool {
        let (pks, sig) = match (decode_pubkeys(pubkeys), Signature::from_bytes(signature)) {
            (Some(pks), Ok(sig)) => (pks, sig),
            _ => return false,
        };
        aggregate_verify(&pks, messages, &sig)
    }

    fn fast_aggregate_verify(&self, pubkeys: &[&[u8]], message: &[u8], signature: &[u8]) -> bool {
        let (pks, sig) = match (decode_pubkeys(pubkeys), Signature::from_bytes(signature)) {
            (Some(pks), Ok(sig)) => (pks, sig),
            _ => return false,
        };
        fast_aggregate_verify(&pks, message, &sig)
    }
}

/// Decoding and hashing by `ark-serialize` and `ark-ec`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArkworksBackend;

type G2Hasher = MapToCurveBasedHasher<G2Projective, DefaultFieldHasher<Sha256, 128>, WBMap<g2::Config>>;

impl ArkworksBackend {
    // `deserialize_compressed` checks the subgroup but ignores trailing bytes.
    fn g1(bytes: &[u8]) -> Option<G1Affine> {
        if bytes.len() != G1_COMPRESSED_SIZE {
            return None;
        }
        G1Affine::deserialize_compressed(bytes).ok().filter(|p| !p.infinity)
    }

    fn g2(bytes: &[u8]) -> Option<G2Affine> {
        if bytes.len() != G2_COMPRESSED_SIZE {
            return None;
        }
        G2Affine::deserialize_compressed(bytes).ok().filter(|p| !p.infinity)
    }

    fn hash(message: &[u8]) -> Option<G2Affine> {
        G2Hasher::new(DST_SIGNATURE).ok()?.hash(message).ok()
    }

    fn check(mut g1s: Vec<G1Affine>, mut g2s: Vec<G2Affine>, signature: G2Affine) -> bool {
        g1s.push(-G1Affine::generator());
        g2s.push(signature);
        Bls12_381::multi_pairing(g1s, g2s).0.is_one()
    }
}

impl BlsBackend for ArkworksBackend {
    fn name(&self) -> &'static str {
        "arkworks"
    }

    fn verify(&self, pubkey: &[u8], message: &[u8], signature: &[u8]) -> bool {
        let inputs = Self::g1(pubkey)
            .zip(Self::g2(signature))
            .zip(Self::hash(message));
        match inputs {
            Some(((pk, sig), hashed)) => Self::check(vec![pk], vec![hashed], sig),
            None => false,
        }
    }

    fn aggregate_verify(&self, pubkeys: &[&[u8]], messages: &[&[u8]], signature: &[u8]) -> bool {
        if pubkeys.is_empty() || pubkeys.len() != messages.len() {
            return false;
        }
        let mut seen = HashSet::with_capacity(messages.len());
        if !messages.iter().all(|m| seen.insert(*m)) {
            return false;
        }
        let pks: Option<Vec<G1Affine>> = pubkeys.iter().map(|pk| Self::g1(pk)).collect();
        let hashed: Option<Vec<G2Affine>> = messages.iter().map(|m| Self::hash(m)).collect();
        match (pks, hashed, Self::g2(signature)) {
            (Some(pks), Some(hashed), Some(sig)) => Self::check(pks, hashed, sig),
            _ => false,
        }
    }

    fn fast_aggregate_verify(&self, pubkeys: &[&[u8]], message: &[u8], signature: &[u8]) -> bool {
        if pubkeys.is_empty() {
            return false;
        }
        let pks: Option<Vec<G1Affine>> = pubkeys.iter().map(|pk| Self::g1(pk)).collect();
        let (pks, sig, hashed) = match (pks, Self::g2(signature), Self::hash(message)) {
            (Some(pks), Some(sig), Some(hashed)) => (pks, sig, hashed),
            _ => return false,
        };
        let aggregate: G1Projective = pks.iter().map(|pk| pk.into_group()).sum();
        let aggregate = aggregate.into_affine();
        if aggregate.infinity {
            return false;
        }
        Self::check(vec![aggregate], vec![hashed], sig)
    }
}

static ACTIVE: RwLock<Option<Arc<dyn BlsBackend>>> = const_rwlock(None);

/// The backend used by `verify_with_backend(None, ..)` callers that
/// want the process default.
pub fn active_backend() -> Arc<dyn BlsBackend> {
    match ACTIVE.read().as_ref() {
        Some(backend) => Arc::clone(backend),
        None => Arc::new(ReferenceBackend),
    }
}

/// Install `backend` process wide, or go back to the reference backend
/// with `None`.
pub fn set_backend(backend: Option<Arc<dyn BlsBackend>>) {
    let name = backend.as_ref().map_or(ReferenceBackend.name(), |b| b.name());
    *ACTIVE.write() = backend;
    info!(backend = name, "verification backend switched");
}

pub fn backend_name() -> &'static str {
    active_backend().name()
}

/// Verify with an explicit backend.  No backend means no verification.
pub fn verify_with_backend(
    backend: Option<&dyn BlsBackend>,
    pubkey: &[u8],
    message: &[u8],
    signature: &[u8],
) -> bool {
    match backend {
        Some(backend) => backend.verify(pubkey, message, signature),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_signatures;
    use crate::field::Fr;
    use crate::single::{Keypair, SecretKey};
    use parking_lot::{const_mutex, Mutex};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    // Tests touching the process wide backend must not interleave.
    static SERIAL: Mutex<()> = const_mutex(());

    fn keypairs(n: u64) -> Vec<Keypair> {
        (1..=n)
            .map(|i| SecretKey::from_scalar(Fr::from(31 * i)).unwrap().into())
            .collect()
    }

    fn backends() -> [&'static dyn BlsBackend; 2] {
        [&ReferenceBackend, &ArkworksBackend]
    }

    #[test]
    fn backends_agree_on_single_signatures() {
        let kp = keypairs(1).remove(0);
        let pk = kp.public.to_bytes();
        let sig = kp.sign(b"hello").to_bytes();
        let mut infinity = [0u8; 96];
        infinity[0] = 0xc0;
        for backend in backends() {
            assert!(backend.verify(&pk, b"hello", &sig), "{}", backend.name());
            assert!(!backend.verify(&pk, b"hellO", &sig), "{}", backend.name());
            assert!(!backend.verify(&pk[..47], b"hello", &sig));
            assert!(!backend.verify(&[0u8; 48], b"hello", &sig));
            assert!(!backend.verify(&pk, b"hello", &infinity));
            let mut long = sig.to_vec();
            long.push(0);
            assert!(!backend.verify(&pk, b"hello", &long), "{}", backend.name());
        }
    }

    #[test]
    fn backends_agree_on_aggregates() {
        let kps = keypairs(3);
        let pks: Vec<[u8; 48]> = kps.iter().map(|kp| kp.public.to_bytes()).collect();
        let pk_refs: Vec<&[u8]> = pks.iter().map(|pk| &pk[..]).collect();

        let same = aggregate_signatures(&kps.iter().map(|kp| kp.sign(b"m")).collect::<Vec<_>>())
            .unwrap()
            .to_bytes();
        let msgs: [&[u8]; 3] = [b"a", b"b", b"c"];
        let distinct = aggregate_signatures(
            &kps.iter().zip(msgs.iter()).map(|(kp, m)| kp.sign(m)).collect::<Vec<_>>(),
        )
        .unwrap()
        .to_bytes();

        for backend in backends() {
            assert!(backend.fast_aggregate_verify(&pk_refs, b"m", &same), "{}", backend.name());
            assert!(!backend.fast_aggregate_verify(&pk_refs[..2], b"m", &same));
            assert!(!backend.fast_aggregate_verify(&[], b"m", &same));
            assert!(backend.aggregate_verify(&pk_refs, &msgs, &distinct), "{}", backend.name());
            assert!(!backend.aggregate_verify(&pk_refs, &msgs[..2], &distinct));
            assert!(!backend.aggregate_verify(&pk_refs, &[b"a", b"a", b"c"], &distinct));
            assert!(!backend.aggregate_verify(&[], &[], &distinct));
        }
    }

    struct Counting(AtomicUsize);

    impl BlsBackend for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn verify(&self, _: &[u8], _: &[u8], _: &[u8]) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            true
        }
        fn aggregate_verify(&self, _: &[&[u8]], _: &[&[u8]], _: &[u8]) -> bool {
            false
        }
        fn fast_aggregate_verify(&self, _: &[&[u8]], _: &[u8], _: &[u8]) -> bool {
            false
        }
    }

    #[test]
    fn registry_switches_and_resets() {
        let _serial = SERIAL.lock();
        assert_eq!(backend_name(), "reference");
        set_backend(Some(Arc::new(ArkworksBackend)));
        assert_eq!(backend_name(), "arkworks");
        let counting = Arc::new(Counting(AtomicUsize::new(0)));
        set_backend(Some(counting.clone() as Arc<dyn BlsBackend>));
        assert!(active_backend().verify(b"", b"", b""));
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
        set_backend(None);
        assert_eq!(backend_name(), "reference");
        assert!(!active_backend().verify(b"", b"", b""));
    }

    #[test]
    fn explicit_backend() {
        let kp = keypairs(1).remove(0);
        let pk = kp.public.to_bytes();
        let sig = kp.sign(b"x").to_bytes();
        assert!(verify_with_backend(Some(&ArkworksBackend), &pk, b"x", &sig));
        assert!(verify_with_backend(Some(&ReferenceBackend), &pk, b"x", &sig));
        assert!(!verify_with_backend(None, &pk, b"x", &sig));
    }

    #[test]
    fn readers_see_a_whole_backend_while_switching() {
        let _serial = SERIAL.lock();
        let kp = keypairs(1).remove(0);
        let pk = kp.public.to_bytes();
        let sig = kp.sign(b"race").to_bytes();
        let readers: Vec<_> = (0..4)
            .map(|_| {
                thread::spawn(move || {
                    (0..3).all(|_| {
                        let backend = active_backend();
                        ["reference", "arkworks"].contains(&backend.name())
                            && backend.verify(&pk, b"race", &sig)
                    })
                })
            })
            .collect();
        for _ in 0..3 {
            set_backend(Some(Arc::new(ArkworksBackend)));
            set_backend(None);
        }
        for r in readers {
            assert!(r.join().unwrap());
        }
        assert_eq!(backend_name(), "reference");
    }
}
