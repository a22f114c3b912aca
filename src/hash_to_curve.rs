//! ## Hashing to G1 and G2 as in RFC 9380
//!
//! We implement the `BLS12381G1_XMD:SHA-256_SSWU_RO_` and
//! `BLS12381G2_XMD:SHA-256_SSWU_RO_` suites:
//!
//! 1. `expand_message_xmd` stretches the message with SHA-256 under a
//!    domain separation tag of at most 255 bytes,
//! 2. `hash_to_field` reads two field elements from 64 byte chunks
//!    reduced modulo `p`,
//! 3. each element goes through the simplified SWU map onto a curve
//!    isogenous to ours, because our curves have `a = 0`,
//! 4. the 11-isogeny (`G1`) or 3-isogeny (`G2`) carries both points back,
//! 5. their sum is multiplied by the effective cofactor `h_eff`, which
//!    lands it in the prime order subgroup.
//!
//! The isogenous curves and isogeny coefficients are the ones published
//! by `ark-bls12-381`, so we do not transcribe hundreds of constants.

use ark_bls12_381::{g1, g2};
use ark_ec::hashing::curve_maps::swu::SWUConfig;
use ark_ec::hashing::curve_maps::wb::WBConfig;
use ark_ec::short_weierstrass::SWCurveConfig;
use ark_ff::{Field, One};
use digest::Digest;
use sha2::Sha256;

use crate::curve::{CurveConfig, G1Curve, G1Point, G2Curve, G2Point, JacobianPoint};
use crate::error::{BlsError, BlsResult};
use crate::field::{fq_from_be_bytes_mod_order, Fq, Fq2, WireField};

/// Largest domain separation tag permitted by RFC 9380.
pub const MAX_DST_LENGTH: usize = 255;

/// Bytes drawn per `Fp` component, `ceil((ceil(log2(p)) + 128) / 8)`.
const L: usize = 64;

const SHA256_OUTPUT: usize = 32;
const SHA256_BLOCK: usize = 64;

type G1Iso = <g1::Config as WBConfig>::IsogenousCurve;
type G2Iso = <g2::Config as WBConfig>::IsogenousCurve;

/// Curve data needed to hash onto a group.
pub trait HashToCurveConfig: CurveConfig {
    /// `A'` of the isogenous curve `y^2 = x^3 + A' x + B'`.
    const ISO_A: Self::Base;
    /// `B'` of the isogenous curve.
    const ISO_B: Self::Base;
    /// The non-square `Z` of the SWU map.
    const SSWU_Z: Self::Base;

    /// Isogeny polynomials with coefficients in ascending degree.
    const X_NUM: &'static [Self::Base];
    const X_DEN: &'static [Self::Base];
    const Y_NUM: &'static [Self::Base];
    const Y_DEN: &'static [Self::Base];

    /// Effective cofactor as little endian limbs.
    const H_EFF: &'static [u64];

    /// Number of `Fp` components per field element.
    const EXTENSION_DEGREE: usize;

    /// Build a field element from `EXTENSION_DEGREE * 64` uniform bytes.
    fn field_from_uniform(bytes: &[u8]) -> Self::Base;
}

impl HashToCurveConfig for G1Curve {
    const ISO_A: Fq = <G1Iso as SWCurveConfig>::COEFF_A;
    const ISO_B: Fq = <G1Iso as SWCurveConfig>::COEFF_B;
    const SSWU_Z: Fq = <G1Iso as SWUConfig>::ZETA;

    const X_NUM: &'static [Fq] = <g1::Config as WBConfig>::ISOGENY_MAP.x_map_numerator;
    const X_DEN: &'static [Fq] = <g1::Config as WBConfig>::ISOGENY_MAP.x_map_denominator;
    const Y_NUM: &'static [Fq] = <g1::Config as WBConfig>::ISOGENY_MAP.y_map_numerator;
    const Y_DEN: &'static [Fq] = <g1::Config as WBConfig>::ISOGENY_MAP.y_map_denominator;

    const H_EFF: &'static [u64] = &[0xd201000000010001];

    const EXTENSION_DEGREE: usize = 1;

    fn field_from_uniform(bytes: &[u8]) -> Fq {
        fq_from_be_bytes_mod_order(bytes)
    }
}

impl HashToCurveConfig for G2Curve {
    const ISO_A: Fq2 = <G2Iso as SWCurveConfig>::COEFF_A;
    const ISO_B: Fq2 = <G2Iso as SWCurveConfig>::COEFF_B;
    const SSWU_Z: Fq2 = <G2Iso as SWUConfig>::ZETA;

    const X_NUM: &'static [Fq2] = <g2::Config as WBConfig>::ISOGENY_MAP.x_map_numerator;
    const X_DEN: &'static [Fq2] = <g2::Config as WBConfig>::ISOGENY_MAP.x_map_denominator;
    const Y_NUM: &'static [Fq2] = <g2::Config as WBConfig>::ISOGENY_MAP.y_map_numerator;
    const Y_DEN: &'static [Fq2] = <g2::Config as WBConfig>::ISOGENY_MAP.y_map_denominator;

    const H_EFF: &'static [u64] = &[
        0xe8020005aaa95551,
        0x59894c0adebbf6b4,
        0xe954cbc06689f6a3,
        0x2ec0ec69d7477c1a,
        0x6d82bf015d1212b0,
        0x329c2f178731db95,
        0x9986ff031508ffe1,
        0x88e2a8e9145ad768,
        0x584c6a0ea91b3528,
        0x0bc69f08f2ee75b3,
    ];

    const EXTENSION_DEGREE: usize = 2;

    fn field_from_uniform(bytes: &[u8]) -> Fq2 {
        let c0 = fq_from_be_bytes_mod_order(&bytes[..L]);
        let c1 = fq_from_be_bytes_mod_order(&bytes[L..2 * L]);
        Fq2::new(c0, c1)
    }
}

fn check_dst(dst: &[u8]) -> BlsResult<()> {
    if dst.len() > MAX_DST_LENGTH {
        return Err(BlsError::DstTooLong(dst.len()));
    }
    Ok(())
}

/// `expand_message_xmd` with SHA-256, RFC 9380 section 5.3.1.
pub fn expand_message_xmd(msg: &[u8], dst: &[u8], len_in_bytes: usize) -> BlsResult<Vec<u8>> {
    check_dst(dst)?;
    let ell = (len_in_bytes + SHA256_OUTPUT - 1) / SHA256_OUTPUT;
    if ell > 255 || len_in_bytes > u16::MAX as usize {
        return Err(BlsError::InvalidExpandLength(len_in_bytes));
    }
    Ok(expand_unchecked(msg, dst, len_in_bytes))
}

// Requires `dst.len() <= 255` and `len_in_bytes <= 255 * 32`.
fn expand_unchecked(msg: &[u8], dst: &[u8], len_in_bytes: usize) -> Vec<u8> {
    let ell = (len_in_bytes + SHA256_OUTPUT - 1) / SHA256_OUTPUT;
    let dst_len = [dst.len() as u8];

    let b_0 = Sha256::new()
        .chain_update([0u8; SHA256_BLOCK])
        .chain_update(msg)
        .chain_update((len_in_bytes as u16).to_be_bytes())
        .chain_update([0u8])
        .chain_update(dst)
        .chain_update(dst_len)
        .finalize();

    let mut uniform = Vec::with_capacity(ell * SHA256_OUTPUT);
    let mut b_i = Sha256::new()
        .chain_update(b_0)
        .chain_update([1u8])
        .chain_update(dst)
        .chain_update(dst_len)
        .finalize();
    uniform.extend_from_slice(&b_i);
    for i in 2..=ell {
        let mut mixed = [0u8; SHA256_OUTPUT];
        for (m, (a, b)) in mixed.iter_mut().zip(b_0.iter().zip(b_i.iter())) {
            *m = a ^ b;
        }
        b_i = Sha256::new()
            .chain_update(mixed)
            .chain_update([i as u8])
            .chain_update(dst)
            .chain_update(dst_len)
            .finalize();
        uniform.extend_from_slice(&b_i);
    }
    uniform.truncate(len_in_bytes);
    uniform
}

/// Hash `msg` to `count` elements of the coordinate field of `C`.
pub fn hash_to_field<C: HashToCurveConfig>(msg: &[u8], dst: &[u8], count: usize) -> BlsResult<Vec<C::Base>> {
    let chunk = C::EXTENSION_DEGREE * L;
    let uniform = expand_message_xmd(msg, dst, count * chunk)?;
    Ok(uniform.chunks(chunk).map(C::field_from_uniform).collect())
}

/// Simplified SWU map onto the isogenous curve, RFC 9380 section 6.6.2.
///
/// Returns affine coordinates on `y^2 = x^3 + A' x + B'`.
pub(crate) fn map_to_curve_simple_swu<C: HashToCurveConfig>(u: &C::Base) -> Option<(C::Base, C::Base)> {
    let a = C::ISO_A;
    let b = C::ISO_B;
    let z = C::SSWU_Z;

    let z_u2 = z * u.square();
    let tv1 = z_u2.square() + z_u2;
    let x1 = match tv1.inverse() {
        Some(inv) => -b * a.inverse()? * (C::Base::one() + inv),
        None => b * (z * a).inverse()?,
    };
    let gx = |x: &C::Base| x.square() * x + a * x + b;

    let (x, mut y) = match gx(&x1).sqrt() {
        Some(y1) => (x1, y1),
        None => {
            // gx(x2) = Z^3 u^6 gx(x1), a square whenever gx(x1) is not.
            let x2 = z_u2 * x1;
            (x2, gx(&x2).sqrt()?)
        }
    };
    if u.sgn0() != y.sgn0() {
        y = -y;
    }
    Some((x, y))
}

fn evaluate<F: Field>(coeffs: &[F], x: &F) -> F {
    coeffs.iter().rev().fold(F::zero(), |acc, c| acc * x + c)
}

/// Carry a point of the isogenous curve onto the target curve.
pub(crate) fn iso_map<C: HashToCurveConfig>(x: &C::Base, y: &C::Base) -> JacobianPoint<C> {
    let x_den = evaluate(C::X_DEN, x);
    let y_den = evaluate(C::Y_DEN, x);
    match (x_den.inverse(), y_den.inverse()) {
        (Some(x_den_inv), Some(y_den_inv)) => {
            let x_out = evaluate(C::X_NUM, x) * x_den_inv;
            let y_out = *y * evaluate(C::Y_NUM, x) * y_den_inv;
            JacobianPoint::from_affine(x_out, y_out)
        }
        // Exceptional inputs map to the identity.
        _ => JacobianPoint::identity(),
    }
}

/// Map one field element to the target curve, without clearing the cofactor.
pub(crate) fn map_to_curve<C: HashToCurveConfig>(u: &C::Base) -> JacobianPoint<C> {
    match map_to_curve_simple_swu::<C>(u) {
        Some((x, y)) => iso_map::<C>(&x, &y),
        None => JacobianPoint::identity(),
    }
}

/// Multiply by the effective cofactor, without reduction modulo `r`.
pub fn clear_cofactor<C: HashToCurveConfig>(p: &JacobianPoint<C>) -> JacobianPoint<C> {
    p.mul_limbs(C::H_EFF)
}

/// The random oracle `hash_to_curve` of RFC 9380.
///
/// Deterministic in `(msg, dst)`, and always returns a point of the
/// prime order subgroup.
pub fn hash_to_curve<C: HashToCurveConfig>(msg: &[u8], dst: &[u8]) -> BlsResult<JacobianPoint<C>> {
    check_dst(dst)?;
    Ok(hash_to_curve_unchecked(msg, dst))
}

/// `hash_to_curve` for tags already known to be at most 255 bytes,
/// like the constants of the `domain` module.
pub(crate) fn hash_to_curve_unchecked<C: HashToCurveConfig>(msg: &[u8], dst: &[u8]) -> JacobianPoint<C> {
    debug_assert!(dst.len() <= MAX_DST_LENGTH);
    let uniform = expand_unchecked(msg, dst, 2 * C::EXTENSION_DEGREE * L);
    let (u0, u1) = uniform.split_at(C::EXTENSION_DEGREE * L);
    let q0 = map_to_curve::<C>(&C::field_from_uniform(u0));
    let q1 = map_to_curve::<C>(&C::field_from_uniform(u1));
    clear_cofactor(&(q0 + q1))
}

/// Hash to `G1` with the `BLS12381G1_XMD:SHA-256_SSWU_RO_` suite.
pub fn hash_to_g1(msg: &[u8], dst: &[u8]) -> BlsResult<G1Point> {
    hash_to_curve::<G1Curve>(msg, dst)
}

/// Hash to `G2` with the `BLS12381G2_XMD:SHA-256_SSWU_RO_` suite.
///
/// This is the message hash of every signature in the crate.
pub fn hash_to_g2(msg: &[u8], dst: &[u8]) -> BlsResult<G2Point> {
    hash_to_curve::<G2Curve>(msg, dst)
}
