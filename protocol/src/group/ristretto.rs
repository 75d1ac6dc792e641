//! Ristretto255: the prime-order group built on top of Curve25519.
//!
//! No cofactor, so there is no torsion to reject; the only invalid inputs
//! are bad encodings and the identity.

use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::traits::{Identity, IsIdentity, MultiscalarMul};
use curve25519_dalek::Scalar;
use subtle::ConstantTimeEq;

use super::{reduce_be, Group, GroupError};

/// Ristretto255, cofactor 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ristretto255;

impl Group for Ristretto255 {
    type Scalar = Scalar;
    type Point = RistrettoPoint;

    const NAME: &'static str = "ristretto255";
    const SCALAR_BITS: u32 = 253;
    const COFACTOR: u32 = 1;
    const SCALAR_LENGTH: usize = 32;
    const POINT_LENGTH: usize = 32;

    fn generator() -> RistrettoPoint {
        RISTRETTO_BASEPOINT_POINT
    }

    fn identity() -> RistrettoPoint {
        RistrettoPoint::identity()
    }

    fn add(p: &RistrettoPoint, q: &RistrettoPoint) -> RistrettoPoint {
        p + q
    }

    fn multiply(scalar: &Scalar, point: &RistrettoPoint) -> RistrettoPoint {
        point * scalar
    }

    fn multiply_base(scalar: &Scalar) -> RistrettoPoint {
        RistrettoPoint::mul_base(scalar)
    }

    fn multiscalar(scalars: &[Scalar], points: &[RistrettoPoint]) -> RistrettoPoint {
        debug_assert_eq!(scalars.len(), points.len());
        RistrettoPoint::multiscalar_mul(scalars, points)
    }

    fn scalar_add(a: &Scalar, b: &Scalar) -> Scalar {
        a + b
    }

    fn scalar_mul(a: &Scalar, b: &Scalar) -> Scalar {
        a * b
    }

    fn scalar_from_le_bytes(bytes: &[u8]) -> Scalar {
        reduce_be(bytes.iter().rev())
    }

    fn scalar_from_uint_be(bytes: &[u8]) -> Scalar {
        reduce_be(bytes)
    }

    fn encode_point(point: &RistrettoPoint) -> Vec<u8> {
        point.compress().to_bytes().to_vec()
    }

    fn decode_point(bytes: &[u8]) -> Result<RistrettoPoint, GroupError> {
        // Ristretto decompression already rejects non-canonical encodings.
        let point = CompressedRistretto::from_slice(bytes)
            .map_err(|_| GroupError::InvalidEncoding)?
            .decompress()
            .ok_or(GroupError::InvalidEncoding)?;
        if point.is_identity() {
            return Err(GroupError::IdentityPoint);
        }
        Ok(point)
    }

    fn equals(p: &RistrettoPoint, q: &RistrettoPoint) -> bool {
        p.ct_eq(q).into()
    }
}
