//! ## Validation of untrusted encodings
//!
//! Every layer that admits bytes from the network goes through these
//! helpers.  `validate_pubkey` and `validate_signature` only look at the
//! bytes, so they are cheap enough to run before queueing anything.  The
//! decompress and subgroup helpers do the curve arithmetic.

use crate::curve::{G1Curve, G1Point, G2Curve, G2Point};
use crate::error::{BlsError, BlsResult};
use crate::serialize::{decode_x, PointError, G1_COMPRESSED_SIZE, G2_COMPRESSED_SIZE};

/// Check the length, flags and coordinate range of a compressed public key.
///
/// The identity is refused here, since no caller has a use for it as a key.
pub fn validate_pubkey(bytes: &[u8]) -> BlsResult<()> {
    if bytes.len() != G1_COMPRESSED_SIZE {
        return Err(BlsError::InvalidPubkeyLength(bytes.len()));
    }
    match decode_x::<G1Curve>(bytes) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(BlsError::InfinitePubkey),
        Err(_) => Err(BlsError::InvalidPubkeyFormat),
    }
}

/// Check the length, flags and coordinate range of a compressed signature.
///
/// A well formed identity is accepted, as aggregation of nothing yields it.
pub fn validate_signature(bytes: &[u8]) -> BlsResult<()> {
    if bytes.len() != G2_COMPRESSED_SIZE {
        return Err(BlsError::InvalidSignatureLength(bytes.len()));
    }
    decode_x::<G2Curve>(bytes)
        .map(|_| ())
        .map_err(|_| BlsError::InvalidSignatureFormat)
}

/// Decode a public key, checking it lies on the curve but not its subgroup.
pub fn decompress_g1(bytes: &[u8]) -> Result<G1Point, PointError> {
    G1Point::from_compressed(bytes)
}

/// Decode a signature, checking it lies on the curve but not its subgroup.
pub fn decompress_g2(bytes: &[u8]) -> Result<G2Point, PointError> {
    G2Point::from_compressed(bytes)
}

/// Decode a public key and require it in the subgroup of order `r`.
pub fn check_g1_subgroup(bytes: &[u8]) -> BlsResult<G1Point> {
    G1Point::from_compressed_checked(bytes).map_err(BlsError::InvalidPubkey)
}

/// Decode a signature and require it in the subgroup of order `r`.
pub fn check_g2_subgroup(bytes: &[u8]) -> BlsResult<G2Point> {
    G2Point::from_compressed_checked(bytes).map_err(BlsError::InvalidSignature)
}

/// Format check, subgroup check and refusal of the identity, in that
/// order, for a public key admitted into an aggregate.
pub(crate) fn pubkey_point(bytes: &[u8]) -> BlsResult<G1Point> {
    validate_pubkey(bytes)?;
    check_g1_subgroup(bytes)
}

/// Like `pubkey_point` for signatures.  Identity signatures pass the
/// format check, so they are refused only here.
pub(crate) fn signature_point(bytes: &[u8]) -> BlsResult<G2Point> {
    validate_signature(bytes)?;
    let point = check_g2_subgroup(bytes)?;
    if point.is_identity() {
        return Err(BlsError::InfiniteSignature);
    }
    Ok(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::field::{Fq, Fq2, Fr, WireField};
    use ark_ff::{BigInteger, Field, One, PrimeField};

    fn infinity<const N: usize>() -> [u8; N] {
        let mut bytes = [0u8; N];
        bytes[0] = 0xc0;
        bytes
    }

    fn g1_outside_subgroup() -> G1Point {
        let mut x = Fq::one();
        loop {
            if let Some(y) = (x.square() * x + Fq::from(4u64)).sqrt() {
                return G1Point::from_affine(x, y);
            }
            x += Fq::one();
        }
    }

    #[test]
    fn pubkey_format_checks() {
        let pk = G1Point::generator().mul(&Fr::from(11u64)).to_compressed();
        assert_eq!(validate_pubkey(&pk), Ok(()));
        assert_eq!(validate_pubkey(&pk[..47]), Err(BlsError::InvalidPubkeyLength(47)));
        assert_eq!(validate_pubkey(&[0u8; 48]), Err(BlsError::InvalidPubkeyFormat));
        assert_eq!(validate_pubkey(&infinity::<48>()), Err(BlsError::InfinitePubkey));

        let mut signed_infinity = infinity::<48>();
        signed_infinity[0] |= 0x20;
        assert_eq!(validate_pubkey(&signed_infinity), Err(BlsError::InvalidPubkeyFormat));

        let mut p = [0u8; 48];
        p.copy_from_slice(&Fq::MODULUS.to_bytes_be());
        p[0] |= 0x80;
        assert_eq!(validate_pubkey(&p), Err(BlsError::InvalidPubkeyFormat));
        assert_eq!(BlsError::InvalidPubkeyFormat.kind(), ErrorKind::Format);
    }

    #[test]
    fn signature_format_checks() {
        let sig = G2Point::generator().mul(&Fr::from(3u64)).to_compressed();
        assert_eq!(validate_signature(&sig), Ok(()));
        assert_eq!(validate_signature(&infinity::<96>()), Ok(()), "identity is well formed");
        assert_eq!(validate_signature(&sig[..95]), Err(BlsError::InvalidSignatureLength(95)));
        let mut bad = sig;
        bad[0] &= 0x7f;
        assert_eq!(validate_signature(&bad), Err(BlsError::InvalidSignatureFormat));
        let mut trailing = infinity::<96>();
        trailing[50] = 1;
        assert_eq!(validate_signature(&trailing), Err(BlsError::InvalidSignatureFormat));

        // c0 = p is out of range even though c1 is fine.
        let mut big = [0u8; 96];
        Fq2::new(Fq::one(), Fq::one()).write_be(&mut big);
        big[48..].copy_from_slice(&Fq::MODULUS.to_bytes_be());
        big[0] |= 0x80;
        assert_eq!(validate_signature(&big), Err(BlsError::InvalidSignatureFormat));
    }

    #[test]
    fn format_checks_do_not_need_the_curve() {
        // x with no square root passes the format check but fails to decompress.
        let mut x = Fq::one();
        while (x.square() * x + Fq::from(4u64)).sqrt().is_some() {
            x += Fq::one();
        }
        let mut bytes = [0u8; 48];
        x.write_be(&mut bytes);
        bytes[0] |= 0x80;
        assert_eq!(validate_pubkey(&bytes), Ok(()));
        assert_eq!(decompress_g1(&bytes), Err(PointError::NotOnCurve));
        assert_eq!(
            check_g1_subgroup(&bytes),
            Err(BlsError::InvalidPubkey(PointError::NotOnCurve))
        );
    }

    #[test]
    fn subgroup_checks() {
        let outside = g1_outside_subgroup().to_compressed();
        assert!(decompress_g1(&outside).is_ok());
        let err = check_g1_subgroup(&outside).unwrap_err();
        assert_eq!(err, BlsError::InvalidPubkey(PointError::NotInSubgroup));
        assert_eq!(err.kind(), ErrorKind::CurveMembership);

        let g = G1Point::generator().to_compressed();
        assert_eq!(check_g1_subgroup(&g), Ok(G1Point::generator()));
        let h = G2Point::generator().double().to_compressed();
        assert_eq!(check_g2_subgroup(&h), Ok(G2Point::generator().double()));
        assert_eq!(decompress_g2(&h), Ok(G2Point::generator().double()));
        assert_eq!(
            check_g2_subgroup(&h[..10]),
            Err(BlsError::InvalidSignature(PointError::InvalidLength { expected: 96, actual: 10 }))
        );
    }

    #[test]
    fn admission_refuses_identity_and_torsion() {
        assert_eq!(pubkey_point(&infinity::<48>()), Err(BlsError::InfinitePubkey));
        assert_eq!(signature_point(&infinity::<96>()), Err(BlsError::InfiniteSignature));
        assert_eq!(
            pubkey_point(&g1_outside_subgroup().to_compressed()),
            Err(BlsError::InvalidPubkey(PointError::NotInSubgroup))
        );
        assert_eq!(pubkey_point(&[0u8; 48]), Err(BlsError::InvalidPubkeyFormat));
        let g = G2Point::generator();
        assert_eq!(signature_point(&g.to_compressed()), Ok(g));
    }
}
