//! # Hash Input Codec
//!
//! Canonical byte encodings of the three kinds of value that get hashed:
//! labels, integers and group elements.
//!
//! Both roles must produce the same bytes for the same operands or their
//! hashes diverge, and nothing downstream can tell *why*. So the set of
//! encodable things is closed ([`Operand`]) and every encoding is fixed:
//!
//! | Operand   | Encoding                                         |
//! |-----------|--------------------------------------------------|
//! | `Label`   | UTF-8 bytes of the string, no terminator         |
//! | `Integer` | big-endian, left-padded to 32 bytes              |
//! | `Point`   | the group's canonical compressed encoding        |
//!
//! Operands are concatenated in order with no separators or length
//! prefixes. Domain separation comes from the leading label alone.

use crate::config::INTEGER_ENCODING_WIDTH;
use crate::group::Group;

/// A single value fed into a hash.
pub enum Operand<'a, G: Group> {
    Label(&'a str),
    Integer(u128),
    Point(&'a G::Point),
}

impl<'a, G: Group> Operand<'a, G> {
    /// Appends this operand's canonical encoding to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Operand::Label(label) => out.extend_from_slice(label.as_bytes()),
            Operand::Integer(value) => out.extend_from_slice(&encode_integer(*value)),
            Operand::Point(point) => out.extend_from_slice(&G::encode_point(point)),
        }
    }
}

/// Fixed-width big-endian encoding of an integer.
pub fn encode_integer(value: u128) -> [u8; INTEGER_ENCODING_WIDTH] {
    let mut out = [0u8; INTEGER_ENCODING_WIDTH];
    let be = value.to_be_bytes();
    out[INTEGER_ENCODING_WIDTH - be.len()..].copy_from_slice(&be);
    out
}

/// Concatenates the encodings of `operands`, in order.
pub fn encode_operands<G: Group>(operands: &[Operand<'_, G>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(operands.len() * INTEGER_ENCODING_WIDTH);
    for operand in operands {
        operand.encode_into(&mut out);
    }
    out
}
