//! # Key Management
//!
//! Secret scalar generation, clamping, and the public halves derived from
//! them.
//!
//! A secret scalar is an integer `s` with two properties, both fixed at
//! creation and never re-established later:
//!
//! - `2^(n-1) <= s < 2^n`, where `n` is [`Group::SCALAR_BITS`];
//! - `s` is a multiple of [`Group::COFACTOR`].
//!
//! For Curve25519 this is exactly the X25519 clamp: low three bits cleared,
//! bit 255 cleared, bit 254 set.
//!
//! ## Security considerations
//!
//! - Randomness comes from the OS (`OsRng`) or from a caller-supplied
//!   generator that implements [`CryptoRng`]. There is no fallback: if the
//!   generator fails, key generation fails.
//! - Secret bytes are zeroized on drop and redacted in `Debug` output.
//! - Secret scalars do not implement `Serialize`. Exporting one to a key
//!   store is an explicit call to [`SecretScalar::as_bytes`].

use std::fmt;

use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroize;

use crate::group::{Group, GroupError};

/// Errors that can occur during key operations.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("secure random source unavailable: {0}")]
    RandomnessFailure(String),

    #[error("secret scalar has wrong length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("secret scalar is not clamped")]
    NotClamped,

    #[error("invalid public key: {0}")]
    InvalidPublicKey(#[from] GroupError),

    #[error("invalid hex encoding")]
    InvalidHex,
}

// ---------------------------------------------------------------------------
// Clamping
// ---------------------------------------------------------------------------

/// Clamps a little-endian integer in place.
///
/// Clears the low `log2(cofactor)` bits, clears every bit at or above
/// `bits`, then adds the fixed offset `2^(bits-1)` by setting the top bit.
/// The result is a multiple of `cofactor` in `[2^(bits-1), 2^bits)`.
///
/// `cofactor` must be a power of two no larger than 128 and `bits` must fit
/// in `bytes`.
pub fn clamp(bytes: &mut [u8], bits: u32, cofactor: u32) {
    debug_assert!(cofactor.is_power_of_two() && cofactor <= 128);
    debug_assert!(bits > 0 && bits as usize <= bytes.len() * 8);

    let top = (bits - 1) as usize;
    let (top_byte, top_bit) = (top / 8, top % 8);

    bytes[0] &= !((cofactor - 1) as u8);
    for byte in &mut bytes[top_byte + 1..] {
        *byte = 0;
    }
    bytes[top_byte] &= ((1u16 << (top_bit + 1)) - 1) as u8;
    bytes[top_byte] |= 1 << top_bit;
}

/// Whether `bytes` already satisfies the clamping invariant.
pub fn is_clamped(bytes: &[u8], bits: u32, cofactor: u32) -> bool {
    let mut clamped = bytes.to_vec();
    clamp(&mut clamped, bits, cofactor);
    let same = bool::from(clamped.as_slice().ct_eq(bytes));
    clamped.zeroize();
    same
}

// ---------------------------------------------------------------------------
// Secret Scalars
// ---------------------------------------------------------------------------

/// A clamped secret scalar for group `G`.
///
/// Holds the clamped integer (little-endian, [`Group::SCALAR_LENGTH`]
/// bytes) alongside its reduction modulo the subgroup order. Owned by the
/// role that generated it and never transmitted.
pub struct SecretScalar<G: Group> {
    bytes: Vec<u8>,
    scalar: G::Scalar,
}

impl<G: Group> SecretScalar<G> {
    /// Draws a fresh scalar from the OS random source.
    pub fn generate() -> Result<Self, KeyError> {
        Self::generate_with(&mut OsRng)
    }

    /// Draws a fresh scalar from `rng`.
    ///
    /// Every call consumes new randomness; nothing is cached between calls.
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, KeyError> {
        let mut bytes = vec![0u8; G::SCALAR_LENGTH];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| KeyError::RandomnessFailure(e.to_string()))?;
        clamp(&mut bytes, G::SCALAR_BITS, G::COFACTOR);
        Ok(Self::from_clamped(bytes))
    }

    /// Loads a scalar exported by [`as_bytes`](Self::as_bytes).
    ///
    /// Input that is not already clamped is refused rather than fixed up.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != G::SCALAR_LENGTH {
            return Err(KeyError::InvalidLength {
                expected: G::SCALAR_LENGTH,
                got: bytes.len(),
            });
        }
        if !is_clamped(bytes, G::SCALAR_BITS, G::COFACTOR) {
            return Err(KeyError::NotClamped);
        }
        Ok(Self::from_clamped(bytes.to_vec()))
    }

    fn from_clamped(bytes: Vec<u8>) -> Self {
        let scalar = G::scalar_from_le_bytes(&bytes);
        Self { bytes, scalar }
    }

    /// The clamped integer, little-endian.
    ///
    /// **Handle with care.** This is the secret. It is exposed only so an
    /// external key store can persist static keys.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The scalar reduced modulo the subgroup order.
    pub fn scalar(&self) -> &G::Scalar {
        &self.scalar
    }

    /// `self · generator()`.
    pub fn public_key(&self) -> PublicKey<G> {
        PublicKey::from_point(G::multiply_base(&self.scalar))
    }
}

impl<G: Group> Drop for SecretScalar<G> {
    fn drop(&mut self) {
        self.bytes.zeroize();
        self.scalar.zeroize();
    }
}

impl<G: Group> fmt::Debug for SecretScalar<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretScalar<{}>([REDACTED])", G::NAME)
    }
}

// ---------------------------------------------------------------------------
// Public Keys
// ---------------------------------------------------------------------------

/// A group element that may be shared freely: a static public key or an
/// ephemeral contribution.
pub struct PublicKey<G: Group> {
    point: G::Point,
}

impl<G: Group> PublicKey<G> {
    /// Wraps a point without validation. Use [`from_bytes`](Self::from_bytes)
    /// for anything received from outside.
    pub fn from_point(point: G::Point) -> Self {
        Self { point }
    }

    /// Decodes and validates a canonical point encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        Ok(Self::from_point(G::decode_point(bytes)?))
    }

    /// Decodes a hex-encoded point.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidHex)?;
        Self::from_bytes(&bytes)
    }

    /// The underlying group element.
    pub fn point(&self) -> &G::Point {
        &self.point
    }

    /// Canonical encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        G::encode_point(&self.point)
    }

    /// Hex of the canonical encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl<G: Group> Clone for PublicKey<G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: Group> Copy for PublicKey<G> {}

impl<G: Group> PartialEq for PublicKey<G> {
    fn eq(&self, other: &Self) -> bool {
        G::equals(&self.point, &other.point)
    }
}

impl<G: Group> Eq for PublicKey<G> {}

impl<G: Group> fmt::Debug for PublicKey<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey<{}>({})", G::NAME, self.to_hex())
    }
}

impl<G: Group> fmt::Display for PublicKey<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Keypairs
// ---------------------------------------------------------------------------

/// A secret scalar and its public point.
///
/// Static keypairs live as long as the identity they represent and are
/// shared between sessions behind an `Arc`. Ephemeral keypairs belong to a
/// single session and are dropped with it.
pub struct Keypair<G: Group> {
    secret: SecretScalar<G>,
    public: PublicKey<G>,
}

impl<G: Group> Keypair<G> {
    /// Generates a keypair from the OS random source.
    pub fn generate() -> Result<Self, KeyError> {
        Ok(Self::from_secret(SecretScalar::generate()?))
    }

    /// Generates a keypair from `rng`.
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, KeyError> {
        Ok(Self::from_secret(SecretScalar::generate_with(rng)?))
    }

    /// Derives the public half from an existing secret.
    pub fn from_secret(secret: SecretScalar<G>) -> Self {
        let public = secret.public_key();
        Self { secret, public }
    }

    pub fn secret(&self) -> &SecretScalar<G> {
        &self.secret
    }

    pub fn public_key(&self) -> PublicKey<G> {
        self.public
    }
}

impl<G: Group> fmt::Debug for Keypair<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("secret", &self.secret)
            .field("public", &self.public)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{Curve25519, Ristretto255};
    use curve25519_dalek::edwards::EdwardsPoint;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    /// An RNG that always fails, to prove there is no silent fallback.
    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            unreachable!()
        }
        fn next_u64(&mut self) -> u64 {
            unreachable!()
        }
        fn fill_bytes(&mut self, _dest: &mut [u8]) {
            unreachable!()
        }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand_core::Error> {
            Err(rand_core::Error::new("entropy source offline"))
        }
    }

    impl CryptoRng for BrokenRng {}

    /// Bit `i` of a little-endian integer.
    fn bit(bytes: &[u8], i: u32) -> bool {
        bytes[(i / 8) as usize] >> (i % 8) & 1 == 1
    }

    #[test]
    fn test_clamp_matches_x25519() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        for _ in 0..32 {
            let mut raw = [0u8; 32];
            rng.fill_bytes(&mut raw);

            let mut ours = raw;
            clamp(&mut ours, 255, 8);

            let mut x25519 = raw;
            x25519[0] &= 248;
            x25519[31] &= 127;
            x25519[31] |= 64;

            assert_eq!(ours, x25519);
        }
    }

    #[test]
    fn test_generated_scalars_are_clamped() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        for _ in 0..64 {
            let s = SecretScalar::<Curve25519>::generate_with(&mut rng).unwrap();
            let b = s.as_bytes();
            assert_eq!(b.len(), 32);
            assert_eq!(b[0] % 8, 0, "multiple of the cofactor");
            assert!(bit(b, 254), "top bit set");
            assert!(!bit(b, 255), "nothing above 2^255");
        }
    }

    #[test]
    fn test_ristretto_scalars_are_clamped() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        for _ in 0..64 {
            let s = SecretScalar::<Ristretto255>::generate_with(&mut rng).unwrap();
            let b = s.as_bytes();
            assert!(bit(b, 252));
            for i in 253..256 {
                assert!(!bit(b, i));
            }
        }
    }

    #[test]
    fn test_generation_is_independent() {
        let a = SecretScalar::<Curve25519>::generate().unwrap();
        let b = SecretScalar::<Curve25519>::generate().unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_rng_failure_is_reported() {
        let err = SecretScalar::<Curve25519>::generate_with(&mut BrokenRng).unwrap_err();
        assert!(matches!(err, KeyError::RandomnessFailure(_)));
    }

    #[test]
    fn test_public_key_matches_dalek_clamped_base_mul() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let s = SecretScalar::<Curve25519>::generate_with(&mut rng).unwrap();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(s.as_bytes());

        let expected = EdwardsPoint::mul_base_clamped(bytes);
        assert!(Curve25519::equals(s.public_key().point(), &expected));
    }

    #[test]
    fn test_from_bytes_round_trip() {
        let kp = Keypair::<Curve25519>::generate().unwrap();
        let restored = SecretScalar::<Curve25519>::from_bytes(kp.secret().as_bytes()).unwrap();
        assert_eq!(restored.public_key(), kp.public_key());
    }

    #[test]
    fn test_from_bytes_refuses_unclamped_input() {
        let mut bytes = [0x11u8; 32];
        bytes[31] = 0x7F;
        assert!(matches!(
            SecretScalar::<Curve25519>::from_bytes(&bytes),
            Err(KeyError::NotClamped)
        ));
        assert!(matches!(
            SecretScalar::<Curve25519>::from_bytes(&[0x40; 16]),
            Err(KeyError::InvalidLength { expected: 32, got: 16 })
        ));
    }

    #[test]
    fn test_public_key_hex_round_trip() {
        let kp = Keypair::<Ristretto255>::generate().unwrap();
        let hex_str = kp.public_key().to_hex();
        assert_eq!(hex_str.len(), 64);
        assert_eq!(PublicKey::<Ristretto255>::from_hex(&hex_str).unwrap(), kp.public_key());
        assert!(matches!(
            PublicKey::<Ristretto255>::from_hex("not hex"),
            Err(KeyError::InvalidHex)
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let kp = Keypair::<Curve25519>::generate().unwrap();
        let rendered = format!("{:?}", kp);
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains(&hex::encode(kp.secret().as_bytes())));
    }
}
