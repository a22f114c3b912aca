//! ## Base field encodings for BLS12-381
//!
//! Arithmetic in `Fp` and `Fp2` comes from `ark-ff` through the
//! `ark-bls12-381` field types, which are immutable `Copy` values
//! always reduced below `p`.  Here we only add what the wire format
//! and hash-to-curve need on top: range-checked big-endian decoding,
//! encoding, the lexicographic "larger root" test used by the
//! compressed sign bit, and the `sgn0` function of RFC 9380.

use arrayref::array_ref;

use ark_ff::{BigInteger, BigInteger384, Field, PrimeField, Zero};

pub use ark_bls12_381::{Fq, Fq2, Fr};

/// Size of a big-endian encoded `Fp` element.
pub const FP_BYTES: usize = 48;

/// A field usable for curve coordinates on the wire.
pub trait WireField: Field {
    /// Length of the big-endian encoding.
    const ENCODED_SIZE: usize;

    /// Decode big-endian bytes, rejecting any component `>= p`.
    ///
    /// Returns `None` when `bytes` has the wrong length too.
    fn read_be(bytes: &[u8]) -> Option<Self>;

    /// Encode big-endian into `out`, which must be `ENCODED_SIZE` long.
    fn write_be(&self, out: &mut [u8]);

    /// Whether this is the larger of `{self, -self}` in the
    /// lexicographic order used by compressed point encodings.
    fn lexicographically_largest(&self) -> bool;

    /// The `sgn0` parity function of RFC 9380 section 4.1.
    fn sgn0(&self) -> bool;
}

impl WireField for Fq {
    const ENCODED_SIZE: usize = FP_BYTES;

    fn read_be(bytes: &[u8]) -> Option<Fq> {
        if bytes.len() != FP_BYTES {
            return None;
        }
        let mut limbs = [0u64; 6];
        for (i, limb) in limbs.iter_mut().enumerate() {
            *limb = u64::from_be_bytes(*array_ref![bytes, 40 - 8 * i, 8]);
        }
        Fq::from_bigint(BigInteger384::new(limbs))
    }

    fn write_be(&self, out: &mut [u8]) {
        let limbs = self.into_bigint().0;
        for (i, limb) in limbs.iter().enumerate() {
            out[40 - 8 * i..48 - 8 * i].copy_from_slice(&limb.to_be_bytes());
        }
    }

    fn lexicographically_largest(&self) -> bool {
        self.into_bigint() > (-*self).into_bigint()
    }

    fn sgn0(&self) -> bool {
        self.into_bigint().is_odd()
    }
}

impl WireField for Fq2 {
    const ENCODED_SIZE: usize = 2 * FP_BYTES;

    // Encoded as c1 || c0, matching the zcash convention.
    fn read_be(bytes: &[u8]) -> Option<Fq2> {
        if bytes.len() != 2 * FP_BYTES {
            return None;
        }
        let c1 = Fq::read_be(&bytes[..FP_BYTES])?;
        let c0 = Fq::read_be(&bytes[FP_BYTES..])?;
        Some(Fq2::new(c0, c1))
    }

    fn write_be(&self, out: &mut [u8]) {
        self.c1.write_be(&mut out[..FP_BYTES]);
        self.c0.write_be(&mut out[FP_BYTES..]);
    }

    fn lexicographically_largest(&self) -> bool {
        if self.c1.is_zero() {
            self.c0.lexicographically_largest()
        } else {
            self.c1.lexicographically_largest()
        }
    }

    fn sgn0(&self) -> bool {
        let sign_0 = self.c0.sgn0();
        let zero_0 = self.c0.is_zero();
        let sign_1 = self.c1.sgn0();
        sign_0 || (zero_0 && sign_1)
    }
}

/// Reduce big-endian bytes of any length modulo `p`.
pub(crate) fn fq_from_be_bytes_mod_order(bytes: &[u8]) -> Fq {
    Fq::from_be_bytes_mod_order(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::{One, UniformRand};
    use rand::thread_rng;

    fn modulus_bytes() -> Vec<u8> {
        Fq::MODULUS.to_bytes_be()
    }

    #[test]
    fn modulus_is_rejected_and_predecessor_accepted() {
        let p = modulus_bytes();
        assert_eq!(p.len(), FP_BYTES);
        assert!(Fq::read_be(&p).is_none(), "p must not decode");

        let mut p_minus_one = p.clone();
        p_minus_one[FP_BYTES - 1] -= 1;
        let x = Fq::read_be(&p_minus_one).expect("p - 1 is in range");
        assert_eq!(x, -Fq::one());

        let all_ones = [0xffu8; FP_BYTES];
        assert!(Fq::read_be(&all_ones).is_none());
        assert!(Fq::read_be(&p[1..]).is_none(), "short input must not decode");
    }

    #[test]
    fn encoding_round_trips() {
        let mut rng = thread_rng();
        for _ in 0..32 {
            let x = Fq2::rand(&mut rng);
            let mut buf = [0u8; 96];
            x.write_be(&mut buf);
            assert_eq!(Fq2::read_be(&buf), Some(x));
            assert_eq!(Fq::read_be(&buf[48..]), Some(x.c0), "c0 must be the trailing half");
        }
    }

    #[test]
    fn exactly_one_of_x_and_minus_x_is_largest() {
        let mut rng = thread_rng();
        for _ in 0..32 {
            let x = Fq::rand(&mut rng);
            assert_ne!(x.lexicographically_largest(), (-x).lexicographically_largest());
            let y = Fq2::rand(&mut rng);
            assert_ne!(y.lexicographically_largest(), (-y).lexicographically_largest());
        }
        assert!(!Fq::zero().lexicographically_largest());
        // Only c0 decides once c1 vanishes.
        let small = Fq2::new(Fq::one(), Fq::zero());
        assert!(!small.lexicographically_largest());
        assert!((-small).lexicographically_largest());
    }

    #[test]
    fn sgn0_matches_rfc_definition() {
        assert!(!Fq::zero().sgn0());
        assert!(Fq::one().sgn0());
        assert!(!(-Fq::one()).sgn0(), "p - 1 is even");
        assert!(Fq2::new(Fq::one(), Fq::zero()).sgn0());
        assert!(Fq2::new(Fq::zero(), Fq::one()).sgn0());
        assert!(!Fq2::new(Fq::from(2u64), Fq::one()).sgn0());
        assert!(!Fq2::zero().sgn0());
    }

    #[test]
    fn wide_reduction() {
        let mut wide = vec![0u8; 16];
        wide.extend_from_slice(&modulus_bytes());
        assert!(fq_from_be_bytes_mod_order(&wide).is_zero());
        assert_eq!(fq_from_be_bytes_mod_order(&[7]), Fq::from(7u64));
    }
}
