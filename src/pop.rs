//! ## Proofs of possession
//!
//! A proof of possession is a self-signed certificate: the signature by
//! a secret key on the compressed encoding of its own public key, made
//! under `DST_POP` rather than any message signing tag.  Verifiers check
//! one for every key before they accept it into an aggregate with other
//! keys, which rules out rogue key attacks where some key is chosen as a
//! function of honest keys.  See Ristenpart and Yilek, The Power of
//! Proofs-of-Possession, https://eprint.iacr.org/2007/264.pdf
//!
//! As the message uniquely determines the key, proofs of possession
//! never share messages, so there is nothing to gain from aggregating
//! them with each other.

use tracing::debug;

use crate::curve::{G2Curve, G2Point};
use crate::domain::DST_POP;
use crate::error::{BlsError, BlsResult};
use crate::hash_to_curve::hash_to_curve_unchecked;
use crate::serialize::G2_COMPRESSED_SIZE;
use crate::single::{verify_hashed, Keypair, PublicKey, SecretKey, Signature};

/// A signature on the signer's own public key under `DST_POP`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProofOfPossession(pub Signature);

fn pop_message_point(publickey: &PublicKey) -> G2Point {
    hash_to_curve_unchecked::<G2Curve>(&publickey.to_bytes(), DST_POP)
}

/// Sign the compressed public key of `secret` under `DST_POP`.
pub fn generate_pop(secret: &SecretKey) -> ProofOfPossession {
    let hashed = pop_message_point(&secret.public_key());
    ProofOfPossession(secret.sign_hashed(&hashed))
}

/// Check `e(pk, H_pop(pk)) = e(g1, pop)`.
///
/// Identity keys and identity proofs are refused outright.
pub fn verify_pop(publickey: &PublicKey, pop: &ProofOfPossession) -> bool {
    if publickey.is_identity() || pop.0.is_identity() {
        return false;
    }
    verify_hashed(&publickey.0, &pop_message_point(publickey), &(pop.0).0)
}

/// Check one proof per key, pairing `pops[i]` with `pubkeys[i]`.
pub fn verify_pops(pubkeys: &[PublicKey], pops: &[ProofOfPossession]) -> BlsResult<()> {
    if pubkeys.is_empty() {
        return Err(BlsError::NoPubkeys);
    }
    if pubkeys.len() != pops.len() {
        return Err(BlsError::MismatchedLengths {
            left: pubkeys.len(),
            right: pops.len(),
        });
    }
    for (index, (pk, pop)) in pubkeys.iter().zip(pops).enumerate() {
        if !verify_pop(pk, pop) {
            debug!(index, "proof of possession failed");
            return Err(BlsError::PopFailed);
        }
    }
    Ok(())
}

impl ProofOfPossession {
    pub fn to_bytes(&self) -> [u8; G2_COMPRESSED_SIZE] {
        self.0.to_bytes()
    }

    /// Decode with the full subgroup check of `Signature::from_bytes`.
    pub fn from_bytes(bytes: &[u8]) -> BlsResult<Self> {
        Signature::from_bytes(bytes).map(ProofOfPossession)
    }

    pub fn verify(&self, publickey: &PublicKey) -> bool {
        verify_pop(publickey, self)
    }
}

impl Keypair {
    pub fn generate_pop(&self) -> ProofOfPossession {
        generate_pop(&self.secret)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ProofOfPossession {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.0, serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ProofOfPossession {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Signature as serde::Deserialize>::deserialize(deserializer).map(ProofOfPossession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::G1Point;
    use crate::domain::DST_SIGNATURE;
    use crate::field::Fr;
    use rand::thread_rng;

    #[test]
    fn pop_verifies_for_its_own_key_only() {
        let mut rng = thread_rng();
        let alice = Keypair::generate(&mut rng);
        let bob = Keypair::generate(&mut rng);
        let pop = alice.generate_pop();
        assert!(pop.verify(&alice.public));
        assert!(!verify_pop(&bob.public, &pop));
        assert_eq!(generate_pop(&alice.secret), pop, "deterministic");

        let decoded = ProofOfPossession::from_bytes(&pop.to_bytes()).unwrap();
        assert!(decoded.verify(&alice.public));
    }

    #[test]
    fn pop_tag_is_separate_from_signing() {
        let sk = SecretKey::from_scalar(Fr::from(42u64)).unwrap();
        let pk = sk.public_key();
        // The same bytes signed as an ordinary message are not a proof.
        let forged = ProofOfPossession(sk.sign(&pk.to_bytes()));
        assert!(!verify_pop(&pk, &forged));
        let as_message = sk.sign_with_dst(&pk.to_bytes(), DST_SIGNATURE).unwrap();
        assert_eq!(as_message, forged.0);
        // And a proof does not verify as a signature on the key bytes.
        assert!(!pk.verify(&pk.to_bytes(), &generate_pop(&sk).0));
    }

    #[test]
    fn proofs_checked_per_key() {
        let mut rng = thread_rng();
        let keypairs: Vec<Keypair> = (0..3).map(|_| Keypair::generate(&mut rng)).collect();
        let publics: Vec<PublicKey> = keypairs.iter().map(|kp| kp.public).collect();
        let mut pops: Vec<ProofOfPossession> = keypairs.iter().map(Keypair::generate_pop).collect();
        assert_eq!(verify_pops(&publics, &pops), Ok(()));
        assert_eq!(verify_pops(&[], &[]), Err(BlsError::NoPubkeys));
        assert_eq!(
            verify_pops(&publics, &pops[..2]),
            Err(BlsError::MismatchedLengths { left: 3, right: 2 })
        );
        pops.swap(0, 2);
        let failed = verify_pops(&publics, &pops).unwrap_err();
        assert_eq!(failed, BlsError::PopFailed);
        assert_eq!(failed.kind(), crate::error::ErrorKind::Verification);
    }

    #[test]
    fn identity_is_refused() {
        let keypair = Keypair::generate(&mut thread_rng());
        let identity_pop = ProofOfPossession(Signature(G2Point::identity()));
        assert!(!verify_pop(&keypair.public, &identity_pop));
        let identity_pk = PublicKey(G1Point::identity());
        assert!(!verify_pop(&identity_pk, &keypair.generate_pop()));
    }
}
