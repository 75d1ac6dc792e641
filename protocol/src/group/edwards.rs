//! Curve25519 in twisted Edwards form.
//!
//! The full curve group has order 8ℓ. Honest keys only ever produce points
//! in the ℓ-order subgroup, and [`Curve25519::decode_point`] refuses
//! everything else, which is what keeps small-subgroup tricks out of the
//! combined-key formulas.

use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;
use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::traits::{Identity, IsIdentity, MultiscalarMul};
use curve25519_dalek::Scalar;
use subtle::ConstantTimeEq;

use super::{reduce_be, Group, GroupError};

/// Curve25519 (Edwards25519 coordinates), cofactor 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Curve25519;

impl Group for Curve25519 {
    type Scalar = Scalar;
    type Point = EdwardsPoint;

    const NAME: &'static str = "curve25519";
    const SCALAR_BITS: u32 = 255;
    const COFACTOR: u32 = 8;
    const SCALAR_LENGTH: usize = 32;
    const POINT_LENGTH: usize = 32;

    fn generator() -> EdwardsPoint {
        ED25519_BASEPOINT_POINT
    }

    fn identity() -> EdwardsPoint {
        EdwardsPoint::identity()
    }

    fn add(p: &EdwardsPoint, q: &EdwardsPoint) -> EdwardsPoint {
        p + q
    }

    fn multiply(scalar: &Scalar, point: &EdwardsPoint) -> EdwardsPoint {
        point * scalar
    }

    fn multiply_base(scalar: &Scalar) -> EdwardsPoint {
        EdwardsPoint::mul_base(scalar)
    }

    fn multiscalar(scalars: &[Scalar], points: &[EdwardsPoint]) -> EdwardsPoint {
        debug_assert_eq!(scalars.len(), points.len());
        // Straus, constant time.
        EdwardsPoint::multiscalar_mul(scalars, points)
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

    fn encode_point(point: &EdwardsPoint) -> Vec<u8> {
        point.compress().to_bytes().to_vec()
    }

    fn decode_point(bytes: &[u8]) -> Result<EdwardsPoint, GroupError> {
        let compressed =
            CompressedEdwardsY::from_slice(bytes).map_err(|_| GroupError::InvalidEncoding)?;
        let point = compressed
            .decompress()
            .ok_or(GroupError::InvalidEncoding)?;

        // decompress() tolerates a non-canonical y and a sign bit on x = 0.
        if point.compress() != compressed {
            return Err(GroupError::InvalidEncoding);
        }
        if point.is_identity() {
            return Err(GroupError::IdentityPoint);
        }
        if point.is_small_order() {
            return Err(GroupError::SmallOrder);
        }
        if !point.is_torsion_free() {
            return Err(GroupError::NotInPrimeSubgroup);
        }
        Ok(point)
    }

    fn equals(p: &EdwardsPoint, q: &EdwardsPoint) -> bool {
        p.ct_eq(q).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::constants::EIGHT_TORSION;

    fn scalar(n: u64) -> Scalar {
        Scalar::from(n)
    }

    #[test]
    fn multiplication_commutes_through_the_generator() {
        let a = scalar(0x1234_5678_9abc);
        let b = scalar(0xdead_beef);
        let g = Curve25519::generator();

        let ab = Curve25519::multiply(&a, &Curve25519::multiply(&b, &g));
        let ba = Curve25519::multiply(&b, &Curve25519::multiply(&a, &g));
        let direct = Curve25519::multiply_base(&Curve25519::scalar_mul(&a, &b));

        assert!(Curve25519::equals(&ab, &ba));
        assert!(Curve25519::equals(&ab, &direct));
    }

    #[test]
    fn multiscalar_matches_separate_products() {
        let k = [scalar(7), scalar(1_000_003)];
        let p = [
            Curve25519::multiply_base(&scalar(11)),
            Curve25519::multiply_base(&scalar(13)),
        ];
        let combined = Curve25519::multiscalar(&k, &p);
        let separate = Curve25519::add(
            &Curve25519::multiply(&k[0], &p[0]),
            &Curve25519::multiply(&k[1], &p[1]),
        );
        assert!(Curve25519::equals(&combined, &separate));
    }

    #[test]
    fn encoding_round_trips_for_subgroup_points() {
        let p = Curve25519::multiply_base(&scalar(42));
        let bytes = Curve25519::encode_point(&p);
        assert_eq!(bytes.len(), Curve25519::POINT_LENGTH);
        let decoded = Curve25519::decode_point(&bytes).unwrap();
        assert!(Curve25519::equals(&p, &decoded));
    }

    #[test]
    fn decode_rejects_identity() {
        let bytes = Curve25519::encode_point(&Curve25519::identity());
        assert_eq!(
            Curve25519::decode_point(&bytes).unwrap_err(),
            GroupError::IdentityPoint
        );
    }

    #[test]
    fn decode_rejects_small_order_points() {
        for torsion in EIGHT_TORSION.iter().skip(1) {
            let bytes = Curve25519::encode_point(torsion);
            assert_eq!(
                Curve25519::decode_point(&bytes).unwrap_err(),
                GroupError::SmallOrder
            );
        }
    }

    #[test]
    fn decode_rejects_mixed_torsion() {
        let p = Curve25519::multiply_base(&scalar(99)) + EIGHT_TORSION[1];
        let bytes = Curve25519::encode_point(&p);
        assert_eq!(
            Curve25519::decode_point(&bytes).unwrap_err(),
            GroupError::NotInPrimeSubgroup
        );
    }

    #[test]
    fn decode_rejects_wrong_length() {
        assert_eq!(
            Curve25519::decode_point(&[0x58; 31]).unwrap_err(),
            GroupError::InvalidEncoding
        );
        assert_eq!(
            Curve25519::decode_point(&[]).unwrap_err(),
            GroupError::InvalidEncoding
        );
    }

    #[test]
    fn decode_rejects_non_canonical_y() {
        // y = p + 1 reduces to the identity's y but is not its canonical form.
        let mut bytes = [0xFFu8; 32];
        bytes[0] = 0xEE;
        bytes[31] = 0x7F;
        assert!(Curve25519::decode_point(&bytes).is_err());
    }

    #[test]
    fn scalar_from_le_and_be_agree() {
        let le = [3u8, 2, 1];
        let be = [1u8, 2, 3];
        assert_eq!(
            Curve25519::scalar_from_le_bytes(&le),
            Curve25519::scalar_from_uint_be(&be)
        );
        assert_eq!(Curve25519::scalar_from_uint_be(&be), scalar(0x010203));
    }
}
