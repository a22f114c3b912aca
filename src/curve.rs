//! ## Jacobian group law for the BLS12-381 curves
//!
//! Both `E1: y^2 = x^3 + 4` over `Fp` and its twist
//! `E2: y^2 = x^3 + 4(1 + u)` over `Fp2` are short Weierstrass curves
//! with `a = 0`, so one generic point type serves both.  A `CurveConfig`
//! supplies the coordinate field, the constant `b` and the generator.
//!
//! Points are Jacobian triples `(X, Y, Z)` standing for the affine
//! point `(X / Z^2, Y / Z^3)`.  We represent the identity by `Z = 0`,
//! and normalize it to `(1, 1, 0)` whenever an operation produces it.
//! In affine form the identity is the pair `(0, 0)`, which is never a
//! genuine point on either curve since `b` is not zero.
//!
//! All operations are pure functions of `Copy` values.  None of them are
//! constant time, so secret scalars should only be multiplied with
//! points when timing side channels are not a concern, as is already
//! the case for the usual BLS signers in this crate.

use core::fmt::Debug;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Neg, Sub};

use ark_bls12_381::{g1, g2};
use ark_ec::short_weierstrass::SWCurveConfig;
use ark_ff::{Field, One, PrimeField, Zero};

use crate::field::{Fq, Fq2, Fr, WireField};

/// Parameters of a short Weierstrass curve `y^2 = x^3 + b`.
pub trait CurveConfig: Copy + Clone + Debug + PartialEq + Eq + Send + Sync + 'static {
    /// Field of definition for coordinates.
    type Base: WireField;

    /// Human readable group name, used in logs.
    const NAME: &'static str;

    /// The constant term `b`.
    const COEFF_B: Self::Base;

    /// Affine coordinates of the fixed generator.
    const GENERATOR: (Self::Base, Self::Base);
}

/// Marker for the group `G1` over `Fp`, where public keys live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct G1Curve;

impl CurveConfig for G1Curve {
    type Base = Fq;
    const NAME: &'static str = "G1";
    const COEFF_B: Fq = <g1::Config as SWCurveConfig>::COEFF_B;
    const GENERATOR: (Fq, Fq) = (
        <g1::Config as SWCurveConfig>::GENERATOR.x,
        <g1::Config as SWCurveConfig>::GENERATOR.y,
    );
}

/// Marker for the group `G2` over `Fp2`, where signatures live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct G2Curve;

impl CurveConfig for G2Curve {
    type Base = Fq2;
    const NAME: &'static str = "G2";
    const COEFF_B: Fq2 = <g2::Config as SWCurveConfig>::COEFF_B;
    const GENERATOR: (Fq2, Fq2) = (
        <g2::Config as SWCurveConfig>::GENERATOR.x,
        <g2::Config as SWCurveConfig>::GENERATOR.y,
    );
}

/// A point in Jacobian coordinates on the curve described by `C`.
#[derive(Clone, Copy, Debug)]
pub struct JacobianPoint<C: CurveConfig> {
    x: C::Base,
    y: C::Base,
    z: C::Base,
}

/// Points of `G1`.
pub type G1Point = JacobianPoint<G1Curve>;

/// Points of `G2`.
pub type G2Point = JacobianPoint<G2Curve>;

impl<C: CurveConfig> JacobianPoint<C> {
    /// The point at infinity.
    pub fn identity() -> Self {
        JacobianPoint {
            x: C::Base::one(),
            y: C::Base::one(),
            z: C::Base::zero(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.z.is_zero()
    }

    /// The fixed generator of the prime order subgroup.
    pub fn generator() -> Self {
        let (x, y) = C::GENERATOR;
        Self::from_affine(x, y)
    }

    /// Lift affine coordinates, treating `(0, 0)` as the identity.
    ///
    /// No curve membership check happens here, see `is_on_curve`.
    pub fn from_affine(x: C::Base, y: C::Base) -> Self {
        if x.is_zero() && y.is_zero() {
            return Self::identity();
        }
        JacobianPoint { x, y, z: C::Base::one() }
    }

    /// Affine coordinates, with `(0, 0)` for the identity.
    pub fn to_affine(&self) -> (C::Base, C::Base) {
        let zinv = match self.z.inverse() {
            Some(zinv) => zinv,
            None => return (C::Base::zero(), C::Base::zero()),
        };
        let zinv2 = zinv.square();
        (self.x * zinv2, self.y * zinv2 * zinv)
    }

    /// Whether affine `(x, y)` satisfies `y^2 = x^3 + b`.
    ///
    /// The identity sentinel `(0, 0)` is accepted.  Coordinates are
    /// field elements, so they are in range by construction.
    pub fn is_on_curve(x: &C::Base, y: &C::Base) -> bool {
        if x.is_zero() && y.is_zero() {
            return true;
        }
        y.square() == x.square() * x + C::COEFF_B
    }

    /// Whether this point satisfies the projective curve equation
    /// `Y^2 = X^3 + b Z^6`.
    pub fn is_valid(&self) -> bool {
        if self.is_identity() {
            return true;
        }
        let z6 = self.z.square() * self.z;
        let z6 = z6.square();
        self.y.square() == self.x.square() * self.x + C::COEFF_B * z6
    }

    /// Doubling via `dbl-2009-l`, valid for `a = 0`.
    pub fn double(&self) -> Self {
        if self.is_identity() {
            return *self;
        }
        let a = self.x.square();
        let b = self.y.square();
        let c = b.square();
        let d = ((self.x + b).square() - a - c).double();
        let e = a.double() + a;
        let f = e.square();
        let x3 = f - d.double();
        let y3 = e * (d - x3) - c.double().double().double();
        let z3 = (self.y * self.z).double();
        if z3.is_zero() {
            return Self::identity();
        }
        JacobianPoint { x: x3, y: y3, z: z3 }
    }

    /// General addition via `add-2007-bl`.
    ///
    /// Falls back to doubling when both inputs are the same point and
    /// returns the identity when they are inverses.
    pub fn add(&self, other: &Self) -> Self {
        if self.is_identity() {
            return *other;
        }
        if other.is_identity() {
            return *self;
        }
        let z1z1 = self.z.square();
        let z2z2 = other.z.square();
        let u1 = self.x * z2z2;
        let u2 = other.x * z1z1;
        let s1 = self.y * other.z * z2z2;
        let s2 = other.y * self.z * z1z1;
        if u1 == u2 {
            if s1 == s2 {
                return self.double();
            }
            return Self::identity();
        }
        let h = u2 - u1;
        let i = h.double().square();
        let j = h * i;
        let r = (s2 - s1).double();
        let v = u1 * i;
        let x3 = r.square() - j - v.double();
        let y3 = r * (v - x3) - (s1 * j).double();
        let z3 = ((self.z + other.z).square() - z1z1 - z2z2) * h;
        JacobianPoint { x: x3, y: y3, z: z3 }
    }

    pub fn neg(&self) -> Self {
        if self.is_identity() {
            return *self;
        }
        JacobianPoint { x: self.x, y: -self.y, z: self.z }
    }

    /// Multiply by a scalar, already reduced modulo `r` by its type.
    pub fn mul(&self, k: &Fr) -> Self {
        self.mul_limbs(k.into_bigint().as_ref())
    }

    /// Multiply by a big-endian integer of any length, reduced modulo `r` first.
    pub fn mul_be_bytes(&self, k: &[u8]) -> Self {
        self.mul(&Fr::from_be_bytes_mod_order(k))
    }

    /// Binary double-and-add from the most significant bit of a little
    /// endian limb slice, without any reduction of the multiplier.
    ///
    /// Subgroup checks and cofactor clearing multiply by `r` and `h_eff`,
    /// which must not be reduced modulo `r`.
    pub(crate) fn mul_limbs(&self, limbs: &[u64]) -> Self {
        let mut acc = Self::identity();
        if self.is_identity() {
            return acc;
        }
        for limb in limbs.iter().rev() {
            for bit in (0..64).rev() {
                acc = acc.double();
                if (limb >> bit) & 1 == 1 {
                    acc = acc.add(self);
                }
            }
        }
        acc
    }

    /// Membership in the subgroup of prime order `r`, checked as `r P = O`.
    pub fn in_subgroup(&self) -> bool {
        self.is_identity() || self.mul_limbs(Fr::MODULUS.as_ref()).is_identity()
    }
}

impl<C: CurveConfig> PartialEq for JacobianPoint<C> {
    fn eq(&self, other: &Self) -> bool {
        match (self.is_identity(), other.is_identity()) {
            (true, true) => true,
            (false, false) => {
                let z1z1 = self.z.square();
                let z2z2 = other.z.square();
                self.x * z2z2 == other.x * z1z1
                    && self.y * z2z2 * other.z == other.y * z1z1 * self.z
            }
            _ => false,
        }
    }
}

impl<C: CurveConfig> Eq for JacobianPoint<C> {}

impl<C: CurveConfig> Default for JacobianPoint<C> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<'a, C: CurveConfig> Add<&'a JacobianPoint<C>> for JacobianPoint<C> {
    type Output = JacobianPoint<C>;
    fn add(self, other: &'a JacobianPoint<C>) -> JacobianPoint<C> {
        JacobianPoint::add(&self, other)
    }
}

impl<C: CurveConfig> Add for JacobianPoint<C> {
    type Output = JacobianPoint<C>;
    fn add(self, other: JacobianPoint<C>) -> JacobianPoint<C> {
        JacobianPoint::add(&self, &other)
    }
}

impl<'a, C: CurveConfig> AddAssign<&'a JacobianPoint<C>> for JacobianPoint<C> {
    fn add_assign(&mut self, other: &'a JacobianPoint<C>) {
        *self = JacobianPoint::add(self, other);
    }
}

impl<C: CurveConfig> AddAssign for JacobianPoint<C> {
    fn add_assign(&mut self, other: JacobianPoint<C>) {
        *self = JacobianPoint::add(self, &other);
    }
}

impl<C: CurveConfig> Sub for JacobianPoint<C> {
    type Output = JacobianPoint<C>;
    fn sub(self, other: JacobianPoint<C>) -> JacobianPoint<C> {
        JacobianPoint::add(&self, &other.neg())
    }
}

impl<C: CurveConfig> Neg for JacobianPoint<C> {
    type Output = JacobianPoint<C>;
    fn neg(self) -> JacobianPoint<C> {
        JacobianPoint::neg(&self)
    }
}

impl<C: CurveConfig> Sum for JacobianPoint<C> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::identity(), |acc, p| acc + p)
    }
}

impl<'a, C: CurveConfig> Sum<&'a JacobianPoint<C>> for JacobianPoint<C> {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Self::identity(), |acc, p| acc + p)
    }
}
