//! Wire messages.
//!
//! A message on the wire is one version byte followed by a bincode
//! (fixed-width integers) encoding of [`WireMessage`]. Points travel as
//! their canonical encodings and are validated by the receiving role, not
//! here; this layer only checks shape and size.

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::config::{MAX_MESSAGE_LENGTH, MAX_PAYLOAD_LENGTH, WIRE_PROTOCOL_VERSION};
use crate::crypto::Digest;
use crate::group::Group;

use super::HandshakeError;

/// Every message any variant sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireMessage {
    /// Variant A: an opaque value with no security role.
    PreHandshake { value: Vec<u8> },
    /// Variant B, first message; variants C and D, responder's reply.
    Ephemeral { ephemeral: Vec<u8> },
    /// Variant B, responder's reply.
    EphemeralStatic {
        ephemeral: Vec<u8>,
        static_key: Vec<u8>,
    },
    /// Variant B, initiator's final message.
    StaticReveal { static_key: Vec<u8>, payload: Vec<u8> },
    /// Variants C and D, first message: `h1`.
    Commitment { commitment: Vec<u8> },
    /// Variants C and D, initiator's final message: the committed point.
    Reveal { ephemeral: Vec<u8>, payload: Vec<u8> },
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_MESSAGE_LENGTH as u64)
        .reject_trailing_bytes()
}

impl WireMessage {
    /// Name of the message kind, for errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PreHandshake { .. } => "pre_handshake",
            Self::Ephemeral { .. } => "ephemeral",
            Self::EphemeralStatic { .. } => "ephemeral_static",
            Self::StaticReveal { .. } => "static_reveal",
            Self::Commitment { .. } => "commitment",
            Self::Reveal { .. } => "reveal",
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, HandshakeError> {
        self.check_payload()?;
        let mut out = vec![WIRE_PROTOCOL_VERSION];
        options()
            .serialize_into(&mut out, self)
            .map_err(|e| HandshakeError::MalformedMessage(e.to_string()))?;
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, HandshakeError> {
        let (version, body) = bytes
            .split_first()
            .ok_or_else(|| HandshakeError::MalformedMessage("empty message".into()))?;
        if *version != WIRE_PROTOCOL_VERSION {
            return Err(HandshakeError::MalformedMessage(format!(
                "unsupported wire version {version}"
            )));
        }
        let message: WireMessage = options()
            .deserialize(body)
            .map_err(|e| HandshakeError::MalformedMessage(e.to_string()))?;
        message.check_payload()?;
        Ok(message)
    }

    fn check_payload(&self) -> Result<(), HandshakeError> {
        let len = match self {
            Self::PreHandshake { value } => value.len(),
            Self::StaticReveal { payload, .. } | Self::Reveal { payload, .. } => payload.len(),
            _ => 0,
        };
        if len > MAX_PAYLOAD_LENGTH {
            return Err(HandshakeError::MalformedMessage(format!(
                "payload of {len} bytes exceeds {MAX_PAYLOAD_LENGTH}"
            )));
        }
        Ok(())
    }
}

/// The error for a well-formed message of the wrong kind.
pub(crate) fn unexpected(expected: &str, got: &WireMessage) -> HandshakeError {
    HandshakeError::MalformedMessage(format!(
        "expected {expected} message, got {}",
        got.kind()
    ))
}

/// Validates a point field.
pub(crate) fn decode_point<G: Group>(bytes: &[u8]) -> Result<G::Point, HandshakeError> {
    Ok(G::decode_point(bytes)?)
}

/// Validates a commitment field.
pub(crate) fn decode_digest(bytes: &[u8]) -> Result<Digest, HandshakeError> {
    Digest::from_slice(bytes).ok_or_else(|| {
        HandshakeError::MalformedMessage(format!(
            "commitment must be 32 bytes, got {}",
            bytes.len()
        ))
    })
}
