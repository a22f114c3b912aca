//! ## Compressed point encodings
//!
//! We follow the zcash encoding used by the IETF BLS drafts and
//! Ethereum: a point is its affine `x` coordinate, big-endian, with the
//! three most significant bits of the first byte carrying flags.
//!
//! - bit 7: compression, always set,
//! - bit 6: infinity, set only for the identity whose remaining bits are all zero,
//! - bit 5: sign, set iff `y` is the lexicographically largest of `{y, -y}`.
//!
//! `G1` points take 48 bytes.  `G2` points take 96 bytes with `x = c0 + c1 u`
//! written as `c1 || c0`.

use ark_ff::{Field, Zero};

use crate::curve::{CurveConfig, G1Curve, G1Point, G2Curve, G2Point, JacobianPoint};
use crate::error::ErrorKind;
use crate::field::WireField;

/// Size of a compressed `G1` point, i.e. a public key.
pub const G1_COMPRESSED_SIZE: usize = 48;

/// Size of a compressed `G2` point, i.e. a signature.
pub const G2_COMPRESSED_SIZE: usize = 96;

const COMPRESSION_FLAG: u8 = 0x80;
const INFINITY_FLAG: u8 = 0x40;
const SIGN_FLAG: u8 = 0x20;
const FLAG_MASK: u8 = COMPRESSION_FLAG | INFINITY_FLAG | SIGN_FLAG;

/// An error that may occur when trying to decode a compressed point.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointError {
    /// The encoding has the wrong number of bytes.
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    /// The compression mode of the encoded element was not as expected
    #[error("encoding lacks the compression flag")]
    MissingCompressionFlag,
    /// The infinity flag was set together with other bits
    #[error("encoding of infinity has unexpected information")]
    InvalidInfinityEncoding,
    /// A coordinate was not below the field modulus.
    #[error("coordinate is not below the field modulus")]
    CoordinateOutOfRange,
    /// The coordinate(s) do not lie on the curve.
    #[error("coordinate(s) do not lie on the curve")]
    NotOnCurve,
    /// The element is not part of the r-order subgroup.
    #[error("the element is not part of an r-order subgroup")]
    NotInSubgroup,
}

impl PointError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PointError::NotOnCurve | PointError::NotInSubgroup => ErrorKind::CurveMembership,
            _ => ErrorKind::Format,
        }
    }
}

/// Parse flags and the `x` coordinate without any curve arithmetic.
///
/// Returns `None` for a well formed encoding of the identity, and
/// otherwise `x` with the sign flag.
pub(crate) fn decode_x<C: CurveConfig>(bytes: &[u8]) -> Result<Option<(C::Base, bool)>, PointError> {
    let size = C::Base::ENCODED_SIZE;
    if bytes.len() != size {
        return Err(PointError::InvalidLength { expected: size, actual: bytes.len() });
    }
    let flags = bytes[0] & FLAG_MASK;
    if flags & COMPRESSION_FLAG == 0 {
        return Err(PointError::MissingCompressionFlag);
    }
    if flags & INFINITY_FLAG != 0 {
        if flags & SIGN_FLAG != 0
            || bytes[0] & !FLAG_MASK != 0
            || bytes[1..].iter().any(|b| *b != 0)
        {
            return Err(PointError::InvalidInfinityEncoding);
        }
        return Ok(None);
    }
    let mut buf = [0u8; G2_COMPRESSED_SIZE];
    let buf = &mut buf[..size];
    buf.copy_from_slice(bytes);
    buf[0] &= !FLAG_MASK;
    let x = C::Base::read_be(buf).ok_or(PointError::CoordinateOutOfRange)?;
    Ok(Some((x, flags & SIGN_FLAG != 0)))
}

impl<C: CurveConfig> JacobianPoint<C> {
    /// Write the compressed encoding into `out`, which must be exactly
    /// the encoded size for this curve.
    pub(crate) fn write_compressed(&self, out: &mut [u8]) {
        if self.is_identity() {
            for b in out.iter_mut() {
                *b = 0;
            }
            out[0] = COMPRESSION_FLAG | INFINITY_FLAG;
            return;
        }
        let (x, y) = self.to_affine();
        x.write_be(out);
        out[0] |= COMPRESSION_FLAG;
        if y.lexicographically_largest() {
            out[0] |= SIGN_FLAG;
        }
    }

    /// Decode a compressed point, checking the encoding and that it
    /// lies on the curve, but not subgroup membership.
    pub fn from_compressed(bytes: &[u8]) -> Result<Self, PointError> {
        let (x, greatest) = match decode_x::<C>(bytes)? {
            None => return Ok(Self::identity()),
            Some(x_and_sign) => x_and_sign,
        };
        let y2 = x.square() * x + C::COEFF_B;
        let mut y = y2.sqrt().ok_or(PointError::NotOnCurve)?;
        if y.lexicographically_largest() != greatest {
            y = -y;
        }
        if y.is_zero() && greatest {
            return Err(PointError::NotOnCurve);
        }
        Ok(Self::from_affine(x, y))
    }

    /// Decode a compressed point and require membership in the
    /// subgroup of order `r`.
    pub fn from_compressed_checked(bytes: &[u8]) -> Result<Self, PointError> {
        let p = Self::from_compressed(bytes)?;
        if !p.in_subgroup() {
            return Err(PointError::NotInSubgroup);
        }
        Ok(p)
    }
}

impl G1Point {
    pub fn to_compressed(&self) -> [u8; G1_COMPRESSED_SIZE] {
        let mut out = [0u8; G1_COMPRESSED_SIZE];
        self.write_compressed(&mut out);
        out
    }
}

impl G2Point {
    pub fn to_compressed(&self) -> [u8; G2_COMPRESSED_SIZE] {
        let mut out = [0u8; G2_COMPRESSED_SIZE];
        self.write_compressed(&mut out);
        out
    }
}

/// Serialization code that is used by multiple modules.
///
/// Decoding through `from_bytes` always performs the full validation,
/// including the subgroup check, so a successfully decoded value is safe
/// to aggregate.
pub trait SerializableToBytes: Sized {
    const SERIALIZED_BYTES_SIZE: usize;

    fn to_bytes(&self) -> Vec<u8>;

    fn from_bytes(bytes: &[u8]) -> Result<Self, PointError>;
}

impl SerializableToBytes for JacobianPoint<G1Curve> {
    const SERIALIZED_BYTES_SIZE: usize = G1_COMPRESSED_SIZE;

    fn to_bytes(&self) -> Vec<u8> {
        self.to_compressed().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, PointError> {
        Self::from_compressed_checked(bytes)
    }
}

impl SerializableToBytes for JacobianPoint<G2Curve> {
    const SERIALIZED_BYTES_SIZE: usize = G2_COMPRESSED_SIZE;

    fn to_bytes(&self) -> Vec<u8> {
        self.to_compressed().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, PointError> {
        Self::from_compressed_checked(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Fq, Fr};
    use crate::pairing::{to_ark_g1, to_ark_g2};
    use ark_ff::{One, UniformRand};
    use ark_serialize::CanonicalSerialize;
    use rand::thread_rng;

    const G1_GENERATOR_HEX: &str = "97f1d3a73197d7942695638c4fa9ac0fc3688c4f9774b905a14e3a3f171bac586c55e83ff97a1aeffb3af00adb22c6bb";
    const G2_GENERATOR_HEX: &str = "93e02b6052719f607dacd3a088274f65596bd0d09920b61ab5da61bbdc7f5049334cf11213945d57e5ac7d055d042b7e024aa2b2f08f0a91260805272dc51051c6e47ad4fa403b02b4510b647ae3d1770bac0326a805bbefd48056c8c121bdb8";

    #[test]
    fn generators_match_known_encodings() {
        assert_eq!(hex::encode(G1Point::generator().to_compressed()), G1_GENERATOR_HEX);
        assert_eq!(hex::encode(G2Point::generator().to_compressed()), G2_GENERATOR_HEX);

        let g1 = hex::decode(G1_GENERATOR_HEX).unwrap();
        assert_eq!(G1Point::from_compressed_checked(&g1), Ok(G1Point::generator()));
        let g2 = hex::decode(G2_GENERATOR_HEX).unwrap();
        assert_eq!(G2Point::from_compressed_checked(&g2), Ok(G2Point::generator()));
    }

    #[test]
    fn infinity_encoding() {
        let mut expected = [0u8; 48];
        expected[0] = 0xc0;
        assert_eq!(G1Point::identity().to_compressed(), expected);
        assert!(G1Point::from_compressed(&expected).unwrap().is_identity());

        let mut expected = [0u8; 96];
        expected[0] = 0xc0;
        assert_eq!(G2Point::identity().to_compressed(), expected);
        assert!(G2Point::from_compressed_checked(&expected).unwrap().is_identity());

        let mut trailing = expected;
        trailing[95] = 1;
        assert_eq!(G2Point::from_compressed(&trailing), Err(PointError::InvalidInfinityEncoding));
        let mut signed = expected;
        signed[0] |= SIGN_FLAG;
        assert_eq!(G2Point::from_compressed(&signed), Err(PointError::InvalidInfinityEncoding));
    }

    #[test]
    fn agrees_with_arkworks_encoding() {
        let mut rng = thread_rng();
        for _ in 0..16 {
            let k = Fr::rand(&mut rng);
            let p = G1Point::generator().mul(&k);
            let mut theirs = Vec::new();
            to_ark_g1(&p).serialize_compressed(&mut theirs).unwrap();
            assert_eq!(p.to_compressed().to_vec(), theirs);
            assert_eq!(G1Point::from_compressed_checked(&theirs), Ok(p));

            let q = G2Point::generator().mul(&k);
            let mut theirs = Vec::new();
            to_ark_g2(&q).serialize_compressed(&mut theirs).unwrap();
            assert_eq!(q.to_compressed().to_vec(), theirs);
            assert_eq!(G2Point::from_compressed_checked(&theirs), Ok(q));
        }
    }

    #[test]
    fn sign_flag_selects_the_root() {
        let p = G1Point::generator().mul(&Fr::from(5u64));
        let mut bytes = p.to_compressed();
        bytes[0] ^= SIGN_FLAG;
        assert_eq!(G1Point::from_compressed(&bytes), Ok(p.neg()));
    }

    #[test]
    fn malformed_encodings_are_rejected() {
        assert_eq!(
            G1Point::from_compressed(&[0x80; 47]),
            Err(PointError::InvalidLength { expected: 48, actual: 47 })
        );
        assert_eq!(
            G2Point::from_compressed(&[0u8; 96]),
            Err(PointError::MissingCompressionFlag)
        );
        let mut too_big = [0xffu8; 48];
        too_big[0] = 0x9f;
        assert_eq!(G1Point::from_compressed(&too_big), Err(PointError::CoordinateOutOfRange));

        // x = 0 gives y^2 = 4, so search upward for an x with no root.
        let mut x = Fq::one();
        while (x * x * x + Fq::from(4u64)).sqrt().is_some() {
            x += Fq::one();
        }
        let mut bytes = [0u8; 48];
        x.write_be(&mut bytes);
        bytes[0] |= COMPRESSION_FLAG;
        assert_eq!(G1Point::from_compressed(&bytes), Err(PointError::NotOnCurve));
        assert_eq!(PointError::NotOnCurve.kind(), ErrorKind::CurveMembership);
    }

    #[test]
    fn subgroup_is_enforced_only_when_asked() {
        let mut x = Fq::one();
        let p = loop {
            if let Some(y) = (x * x * x + Fq::from(4u64)).sqrt() {
                break G1Point::from_affine(x, y);
            }
            x += Fq::one();
        };
        let bytes = p.to_compressed();
        assert_eq!(G1Point::from_compressed(&bytes), Ok(p));
        assert_eq!(G1Point::from_compressed_checked(&bytes), Err(PointError::NotInSubgroup));
        assert_eq!(
            <G1Point as SerializableToBytes>::from_bytes(&bytes),
            Err(PointError::NotInSubgroup)
        );
    }
}
