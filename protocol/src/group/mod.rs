//! # Prime-Order Group Abstraction
//!
//! The key agreement never touches a curve directly. Everything it needs
//! from the underlying group is collected in the [`Group`] trait:
//! a generator, point addition, scalar multiplication, a canonical point
//! encoding, and validating decoding.
//!
//! Two instances ship with the crate:
//!
//! - [`Curve25519`] — the Edwards form of Curve25519, cofactor 8. Scalars
//!   are clamped the X25519 way (bit 254 set, low three bits clear).
//! - [`Ristretto255`] — the prime-order quotient of the same curve,
//!   cofactor 1.
//!
//! ## Scalar arithmetic
//!
//! Tweaks and combined scalars are reduced modulo the order ℓ of the
//! prime subgroup. Every point that a role accepts is checked to lie in
//! that subgroup, so `k·P == (k mod ℓ)·P` for all of them and both roles
//! reach bit-identical results whether or not they reduce.
//!
//! ## Constant time
//!
//! Scalars are secrets. `multiply`, `multiply_base` and `multiscalar`
//! must run in time independent of the scalar bits; both instances use
//! the constant-time entry points of `curve25519-dalek` and never the
//! `vartime` ones.

mod edwards;
mod ristretto;

pub use edwards::Curve25519;
pub use ristretto::Ristretto255;

use std::fmt;

use curve25519_dalek::Scalar as DalekScalar;
use thiserror::Error;
use zeroize::Zeroize;

/// Reasons a byte string is refused as a group element.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GroupError {
    #[error("invalid point encoding: wrong length, non-canonical, or not on the curve")]
    InvalidEncoding,

    #[error("identity element where a non-trivial point is required")]
    IdentityPoint,

    #[error("point of small order")]
    SmallOrder,

    #[error("point has a torsion component outside the prime-order subgroup")]
    NotInPrimeSubgroup,
}

/// A prime-order group usable for the key agreement.
///
/// Implementors supply the arithmetic; the protocol layer supplies the
/// rest. All operations are associated functions, so a group is a
/// zero-sized marker type.
pub trait Group: Sized + Send + Sync + 'static {
    /// Scalar field element, reduced modulo the subgroup order.
    type Scalar: Copy + Zeroize + Send + Sync;
    /// Group element.
    type Point: Copy + fmt::Debug + Zeroize + Send + Sync;

    /// Short identifier used in logs and on the command line.
    const NAME: &'static str;
    /// Bit size `n` of clamped secret scalars: they lie in `[2^(n-1), 2^n)`.
    const SCALAR_BITS: u32;
    /// Cofactor of the curve. Clamped scalars are multiples of it.
    const COFACTOR: u32;
    /// Length in bytes of a secret scalar's integer encoding.
    const SCALAR_LENGTH: usize;
    /// Length in bytes of a canonical point encoding.
    const POINT_LENGTH: usize;

    /// The fixed base point.
    fn generator() -> Self::Point;

    /// The neutral element.
    fn identity() -> Self::Point;

    /// Group law: `p + q`.
    fn add(p: &Self::Point, q: &Self::Point) -> Self::Point;

    /// Constant-time scalar multiplication: `scalar · point`.
    fn multiply(scalar: &Self::Scalar, point: &Self::Point) -> Self::Point;

    /// Constant-time `scalar · generator()`.
    fn multiply_base(scalar: &Self::Scalar) -> Self::Point {
        Self::multiply(scalar, &Self::generator())
    }

    /// Constant-time `Σ scalars[i] · points[i]`.
    ///
    /// Both slices must have the same length.
    fn multiscalar(scalars: &[Self::Scalar], points: &[Self::Point]) -> Self::Point {
        debug_assert_eq!(scalars.len(), points.len());
        scalars
            .iter()
            .zip(points)
            .fold(Self::identity(), |acc, (k, p)| {
                Self::add(&acc, &Self::multiply(k, p))
            })
    }

    /// Scalar addition modulo the subgroup order.
    fn scalar_add(a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar;

    /// Scalar multiplication modulo the subgroup order.
    fn scalar_mul(a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar;

    /// Reduces an unsigned little-endian integer of any length.
    fn scalar_from_le_bytes(bytes: &[u8]) -> Self::Scalar;

    /// Reduces an unsigned big-endian integer of any length.
    fn scalar_from_uint_be(bytes: &[u8]) -> Self::Scalar;

    /// Canonical encoding of a point. Identical on every platform.
    fn encode_point(point: &Self::Point) -> Vec<u8>;

    /// Decodes and validates a point received from a peer.
    ///
    /// Only canonical encodings of non-identity points in the prime-order
    /// subgroup are accepted.
    fn decode_point(bytes: &[u8]) -> Result<Self::Point, GroupError>;

    /// Constant-time equality of canonical representations.
    fn equals(p: &Self::Point, q: &Self::Point) -> bool;

    /// Whether `point` is the neutral element.
    fn is_identity(point: &Self::Point) -> bool {
        Self::equals(point, &Self::identity())
    }
}

// ---------------------------------------------------------------------------
// Shared scalar helpers for the dalek-backed groups
// ---------------------------------------------------------------------------

/// Horner evaluation of a big-endian integer modulo ℓ.
///
/// Works for any input length and touches every byte the same way, so the
/// running time depends only on the length.
fn reduce_be<'a>(bytes: impl IntoIterator<Item = &'a u8>) -> DalekScalar {
    let radix = DalekScalar::from(256u16);
    bytes
        .into_iter()
        .fold(DalekScalar::ZERO, |acc, byte| acc * radix + DalekScalar::from(*byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_be_matches_dalek_reduction() {
        let mut le = [0u8; 32];
        for (i, b) in le.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(37).wrapping_add(11);
        }
        let mut be = le;
        be.reverse();

        assert_eq!(reduce_be(be.iter()), DalekScalar::from_bytes_mod_order(le));
        assert_eq!(reduce_be(le.iter().rev()), DalekScalar::from_bytes_mod_order(le));
    }

    #[test]
    fn reduce_be_of_wide_input() {
        let wide = [0xFFu8; 64];
        assert_eq!(
            reduce_be(wide.iter()),
            DalekScalar::from_bytes_mod_order_wide(&wide)
        );
    }

    #[test]
    fn reduce_be_of_empty_input_is_zero() {
        assert_eq!(reduce_be(std::iter::empty()), DalekScalar::ZERO);
    }
}
