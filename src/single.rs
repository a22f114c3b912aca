//! ## Unaggregated BLS signatures
//!
//! Public keys live in `G1` and signatures in `G2`.  A signature on `m`
//! under the secret scalar `s` is `s H(m)`, with `H` the `G2` hash to
//! curve under some domain separation tag, and it verifies when
//! `e(pk, H(m)) e(-g1, sig) = 1`.
//!
//! `PublicKey` and `Signature` wrap already decoded points, so the
//! subgroup check happens once in `from_bytes` and never again.  The
//! identity decodes fine, since aggregation code must be able to see it,
//! but no verification routine accepts it as a key or a signature.

use core::fmt;
use core::hash::{Hash, Hasher};

use ark_ff::{BigInteger, PrimeField, UniformRand, Zero};
use digest::Digest;
use hkdf::Hkdf;
use rand_core::{CryptoRng, RngCore};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::curve::{G1Point, G2Curve, G2Point};
use crate::domain::DST_SIGNATURE;
use crate::error::{BlsError, BlsResult};
use crate::field::Fr;
use crate::hash_to_curve::{hash_to_curve_unchecked, hash_to_g2};
use crate::pairing::multi_pairing;
use crate::serialize::{G1_COMPRESSED_SIZE, G2_COMPRESSED_SIZE};

/// Size of a big-endian encoded secret scalar.
pub const SECRET_KEY_SIZE: usize = 32;

/// Minimum input keying material accepted by `SecretKey::key_gen`.
pub const MIN_IKM_LENGTH: usize = 32;

const KEYGEN_SALT: &[u8] = b"BLS-SIG-KEYGEN-SALT-";

// ceil((3 * ceil(log2(r))) / 16)
const KEYGEN_OKM_LENGTH: usize = 48;

/// Secret signing key, a nonzero scalar modulo `r`.
///
/// The scalar is wiped when the key is dropped, and `Debug` never
/// prints it.
#[derive(Clone)]
pub struct SecretKey(Fr);

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("public_key", &self.public_key())
            .finish()
    }
}

impl SecretKey {
    /// Generate a secret key from a cryptographically secure rng.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        loop {
            let s = Fr::rand(rng);
            if !s.is_zero() {
                return SecretKey(s);
            }
        }
    }

    /// Derive a secret key from input keying material with the `KeyGen`
    /// procedure of the IETF BLS signature draft, also used by EIP-2333.
    ///
    /// Deterministic in `(ikm, key_info)`.
    pub fn key_gen(ikm: &[u8], key_info: &[u8]) -> BlsResult<Self> {
        if ikm.len() < MIN_IKM_LENGTH {
            return Err(BlsError::InvalidKeyMaterial(ikm.len()));
        }
        let mut padded = Vec::with_capacity(ikm.len() + 1);
        padded.extend_from_slice(ikm);
        padded.push(0);
        let okm_length = (KEYGEN_OKM_LENGTH as u16).to_be_bytes();

        let mut salt = Sha256::digest(KEYGEN_SALT);
        loop {
            let hk = Hkdf::<Sha256>::new(Some(&salt[..]), &padded);
            let mut okm = [0u8; KEYGEN_OKM_LENGTH];
            hk.expand_multi_info(&[key_info, &okm_length[..]], &mut okm)
                .map_err(|_| BlsError::InvalidKeyMaterial(ikm.len()))?;
            let s = Fr::from_be_bytes_mod_order(&okm);
            okm.zeroize();
            if !s.is_zero() {
                padded.zeroize();
                return Ok(SecretKey(s));
            }
            salt = Sha256::digest(&salt[..]);
        }
    }

    /// Wrap a scalar, refusing zero.
    pub fn from_scalar(s: Fr) -> BlsResult<Self> {
        if s.is_zero() {
            return Err(BlsError::InvalidSecretKey);
        }
        Ok(SecretKey(s))
    }

    /// Decode a big-endian scalar, which must lie in `[1, r)`.
    pub fn from_bytes(bytes: &[u8; SECRET_KEY_SIZE]) -> BlsResult<Self> {
        let s = Fr::from_be_bytes_mod_order(bytes);
        // Reduction only changes the bytes of values not below r.
        let mut canonical = s.into_bigint().to_bytes_be();
        let reduced = canonical[..] != bytes[..];
        canonical.zeroize();
        if reduced || s.is_zero() {
            return Err(BlsError::InvalidSecretKey);
        }
        Ok(SecretKey(s))
    }

    pub fn to_bytes(&self) -> [u8; SECRET_KEY_SIZE] {
        let mut be = self.0.into_bigint().to_bytes_be();
        let mut out = [0u8; SECRET_KEY_SIZE];
        out.copy_from_slice(&be);
        be.zeroize();
        out
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(G1Point::generator().mul(&self.0))
    }

    /// Sign under the default signature tag.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.sign_hashed(&hash_to_curve_unchecked::<G2Curve>(message, DST_SIGNATURE))
    }

    /// Sign under an explicit domain separation tag.
    pub fn sign_with_dst(&self, message: &[u8], dst: &[u8]) -> BlsResult<Signature> {
        Ok(self.sign_hashed(&hash_to_g2(message, dst)?))
    }

    pub(crate) fn sign_hashed(&self, hashed: &G2Point) -> Signature {
        Signature(hashed.mul(&self.0))
    }
}

/// Check `e(pk, hashed) e(-g1, sig) = 1`, refusing identity keys and signatures.
pub(crate) fn verify_hashed(publickey: &G1Point, hashed: &G2Point, signature: &G2Point) -> bool {
    if publickey.is_identity() || signature.is_identity() {
        return false;
    }
    multi_pairing(
        &[*publickey, G1Point::generator().neg()],
        &[*hashed, *signature],
    )
}

/// BLS public key, a point of `G1`.
pub struct PublicKey(pub G1Point);

/// BLS signature, a point of `G2`.
pub struct Signature(pub G2Point);

macro_rules! wire_point {
    ($wrapper:ident, $point:ty, $size:expr, $err:ident, $expected:expr) => {

impl $wrapper {
    /// Compressed encoding.
    pub fn to_bytes(&self) -> [u8; $size] {
        self.0.to_compressed()
    }

    /// Decode compressed bytes, checking subgroup membership.
    pub fn from_bytes(bytes: &[u8]) -> BlsResult<Self> {
        <$point>::from_compressed_checked(bytes)
            .map($wrapper)
            .map_err(BlsError::$err)
    }

    pub fn is_identity(&self) -> bool {
        self.0.is_identity()
    }
}

impl Clone for $wrapper {
    fn clone(&self) -> Self { $wrapper(self.0) }
}

impl Copy for $wrapper { }

impl fmt::Debug for $wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.to_bytes();
        write!(f, concat!(stringify!($wrapper), "(0x{}..)"), hex::encode(&bytes[..8]))
    }
}

impl PartialEq<Self> for $wrapper {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for $wrapper {}

impl Hash for $wrapper {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state);
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for $wrapper {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.to_bytes())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for $wrapper {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes: Vec<u8> = serde::Deserialize::deserialize(deserializer)?;
        if bytes.len() != $size {
            return Err(serde::de::Error::custom($expected));
        }
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

    }
}  // macro_rules!

wire_point!(PublicKey, G1Point, G1_COMPRESSED_SIZE, InvalidPubkey, "expected 48 bytes for BLS public key");
wire_point!(Signature, G2Point, G2_COMPRESSED_SIZE, InvalidSignature, "expected 96 bytes for BLS signature");

impl PublicKey {
    /// Verify a signature made under the default signature tag.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let hashed = hash_to_curve_unchecked::<G2Curve>(message, DST_SIGNATURE);
        verify_hashed(&self.0, &hashed, &signature.0)
    }

    /// Verify under an explicit tag.  A tag over 255 bytes never verifies.
    pub fn verify_with_dst(&self, message: &[u8], signature: &Signature, dst: &[u8]) -> bool {
        match hash_to_g2(message, dst) {
            Ok(hashed) => verify_hashed(&self.0, &hashed, &signature.0),
            Err(_) => false,
        }
    }
}

impl Signature {
    pub fn verify(&self, message: &[u8], publickey: &PublicKey) -> bool {
        publickey.verify(message, self)
    }
}

/// A secret key together with its public key.
#[derive(Clone, Debug)]
pub struct Keypair {
    pub secret: SecretKey,
    pub public: PublicKey,
}

impl From<SecretKey> for Keypair {
    fn from(secret: SecretKey) -> Keypair {
        let public = secret.public_key();
        Keypair { secret, public }
    }
}

impl Keypair {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        SecretKey::generate(rng).into()
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.secret.sign(message)
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.public.verify(message, signature)
    }
}
