//! # Hash Derivations
//!
//! Two derivations, both over the [`codec`](super::codec) encoding of a
//! labelled operand list:
//!
//! - [`hash_raw`] — SHA-256 of the concatenated operands, kept as bytes.
//!   Commitments are raw digests.
//! - [`hash_scalar`] — the same digest read as a big-endian unsigned
//!   integer. Tweaks are hash scalars.
//!
//! The label is always the first operand. Changing a label, or the order
//! of the operands after it, changes every derived value without raising
//! any error, which is why the labels live in [`crate::config`] and
//! nowhere else.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use subtle::ConstantTimeEq;

use crate::config::DIGEST_LENGTH;
use crate::group::Group;
use crate::handshake::HandshakeError;

use super::codec::{encode_operands, Operand};

// ---------------------------------------------------------------------------
// Digest
// ---------------------------------------------------------------------------

/// A 256-bit raw digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LENGTH]);

impl Digest {
    pub fn from_bytes(bytes: [u8; DIGEST_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Returns `None` unless `bytes` is exactly [`DIGEST_LENGTH`] long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; DIGEST_LENGTH]>::try_from(bytes).ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(hex_str: &str) -> Option<Self> {
        hex::decode(hex_str).ok().and_then(|bytes| Self::from_slice(&bytes))
    }

    /// Constant-time comparison. Use this, not `==`, whenever one side came
    /// from the network.
    pub fn ct_eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parsed = if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Digest::from_hex(&s)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            Digest::from_slice(&bytes)
        };
        parsed.ok_or_else(|| {
            serde::de::Error::custom(format!("expected a {DIGEST_LENGTH}-byte digest"))
        })
    }
}

/// SHA-256 over the concatenated operand encodings.
pub fn hash_raw<G: Group>(operands: &[Operand<'_, G>]) -> Digest {
    let encoded = encode_operands(operands);
    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    Digest(hasher.finalize().into())
}

// ---------------------------------------------------------------------------
// Tweak
// ---------------------------------------------------------------------------

/// A digest interpreted as a big-endian unsigned integer.
///
/// The integer is up to 256 bits wide, so it is reduced modulo the group
/// order when converted to a scalar. See the `group` module for why that
/// reduction cannot make the two roles disagree.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Tweak(Digest);

impl Tweak {
    pub fn digest(&self) -> &Digest {
        &self.0
    }

    pub fn to_scalar<G: Group>(&self) -> G::Scalar {
        G::scalar_from_uint_be(self.0.as_bytes())
    }
}

impl fmt::Debug for Tweak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tweak({})", self.0.to_hex())
    }
}

/// [`hash_raw`], reinterpreted as an integer.
pub fn hash_scalar<G: Group>(operands: &[Operand<'_, G>]) -> Tweak {
    Tweak(hash_raw(operands))
}

/// `hash_scalar(label, point)`.
pub fn tweak<G: Group>(label: &str, point: &G::Point) -> Tweak {
    hash_scalar::<G>(&[Operand::Label(label), Operand::Point(point)])
}

// ---------------------------------------------------------------------------
// Commitments
// ---------------------------------------------------------------------------

/// `hash_raw(label, point)`, sent ahead of `point` itself.
pub fn commit<G: Group>(label: &str, point: &G::Point) -> Digest {
    hash_raw::<G>(&[Operand::Label(label), Operand::Point(point)])
}

/// Recomputes the commitment to `point` and compares it with `expected`
/// in constant time.
pub fn verify_commitment<G: Group>(
    expected: &Digest,
    label: &str,
    point: &G::Point,
) -> Result<(), HandshakeError> {
    if commit::<G>(label, point).ct_eq(expected) {
        Ok(())
    } else {
        Err(HandshakeError::CommitmentMismatch)
    }
}
