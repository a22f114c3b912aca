//! ## Boundary to the optimal ate pairing
//!
//! We never evaluate Miller loops or final exponentiations ourselves.
//! Instead `ark-bls12-381` provides the pairing, and this module merely
//! moves our points across, so everything above only sees the boolean
//! `multi_pairing` contract.

use ark_bls12_381::{Bls12_381, G1Affine, G2Affine};
use ark_ec::pairing::Pairing;
use ark_ff::One;

use crate::curve::{G1Point, G2Point};

pub(crate) fn to_ark_g1(p: &G1Point) -> G1Affine {
    if p.is_identity() {
        return G1Affine::identity();
    }
    let (x, y) = p.to_affine();
    G1Affine::new_unchecked(x, y)
}

pub(crate) fn to_ark_g2(p: &G2Point) -> G2Affine {
    if p.is_identity() {
        return G2Affine::identity();
    }
    let (x, y) = p.to_affine();
    G2Affine::new_unchecked(x, y)
}

#[cfg(test)]
pub(crate) fn from_ark_g1(p: &G1Affine) -> G1Point {
    if p.infinity {
        return G1Point::identity();
    }
    G1Point::from_affine(p.x, p.y)
}

#[cfg(test)]
pub(crate) fn from_ark_g2(p: &G2Affine) -> G2Point {
    if p.infinity {
        return G2Point::identity();
    }
    G2Point::from_affine(p.x, p.y)
}

/// Whether `prod_i e(g1s[i], g2s[i])` is the identity of the target group.
///
/// Pairs with an identity component contribute nothing and are skipped.
/// Lists of different lengths never verify.
pub fn multi_pairing(g1s: &[G1Point], g2s: &[G2Point]) -> bool {
    if g1s.len() != g2s.len() {
        return false;
    }
    let (a, b): (Vec<G1Affine>, Vec<G2Affine>) = g1s
        .iter()
        .zip(g2s)
        .filter(|(p, q)| !p.is_identity() && !q.is_identity())
        .map(|(p, q)| (to_ark_g1(p), to_ark_g2(q)))
        .unzip();
    if a.is_empty() {
        return true;
    }
    Bls12_381::multi_pairing(a, b).0.is_one()
}
