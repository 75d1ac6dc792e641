//! # Protocol Configuration & Constants
//!
//! Every magic number in the key agreement lives here. Both roles must agree
//! on every label and width below, byte for byte, or their hashes diverge
//! silently and the handshake fails with a mismatch that no error message
//! can explain.
//!
//! Changing any of the labels is a protocol break. Bump
//! [`WIRE_PROTOCOL_VERSION`] if you do.

use std::time::Duration;

use serde::Deserialize;

use crate::handshake::HandshakeError;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Human-readable protocol version.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Leading byte of every wire message. Peers reject anything else before
/// attempting to decode the body.
pub const WIRE_PROTOCOL_VERSION: u8 = 1;

// ---------------------------------------------------------------------------
// Domain-Separation Labels
// ---------------------------------------------------------------------------

/// Label prepended when deriving the Initiator's tweak. In the joint-tweak
/// variant it is also the label both roles use for the Responder's
/// ephemeral point.
pub const TWEAK_LABEL_INITIATOR: &str = "t1";

/// Label prepended when deriving the Responder's tweak in the
/// independent-tweak (JKA) variant.
pub const TWEAK_LABEL_RESPONDER: &str = "t2";

/// Label prepended when committing to the Initiator's ephemeral point.
pub const COMMITMENT_LABEL: &str = "h1";

// ---------------------------------------------------------------------------
// Encoding Parameters
// ---------------------------------------------------------------------------

/// Output length of the raw digest (SHA-256).
pub const DIGEST_LENGTH: usize = 32;

/// Integers are serialized big-endian, left-padded to this many bytes.
pub const INTEGER_ENCODING_WIDTH: usize = 32;

/// Length of the random pre-handshake value used by the static-only variant
/// when the caller does not supply one.
pub const PRE_HANDSHAKE_VALUE_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Limits & Timing
// ---------------------------------------------------------------------------

/// Largest wire message a role will attempt to decode.
pub const MAX_MESSAGE_LENGTH: usize = 4 * 1024;

/// Largest application payload (or pre-handshake value) carried in a
/// handshake message.
pub const MAX_PAYLOAD_LENGTH: usize = 1024;

/// How long a role waits for the peer's next message before abandoning
/// the session.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_secs(10);

/// [`DEFAULT_RECEIVE_TIMEOUT`] in milliseconds, for config files.
pub const DEFAULT_RECEIVE_TIMEOUT_MS: u64 = 10_000;

// ---------------------------------------------------------------------------
// Runtime Configuration
// ---------------------------------------------------------------------------

/// Tunable parameters for driving a handshake over a channel.
///
/// The cryptographic parameters are not configurable; only the session
/// plumbing is.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HandshakeConfig {
    /// Milliseconds to wait for each inbound message. Expiry abandons the
    /// session and drops its state.
    pub receive_timeout_ms: u64,

    /// Messages longer than this are rejected as malformed without being
    /// decoded. May only tighten [`MAX_MESSAGE_LENGTH`].
    pub max_message_length: usize,
}

impl HandshakeConfig {
    /// The receive timeout as a [`Duration`].
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    /// Rejects configurations that could never complete a handshake.
    pub fn validate(&self) -> Result<(), HandshakeError> {
        if self.receive_timeout_ms == 0 {
            return Err(HandshakeError::InvalidConfig(
                "receive_timeout_ms must be positive".to_string(),
            ));
        }
        if self.max_message_length == 0 {
            return Err(HandshakeError::InvalidConfig(
                "max_message_length must be positive".to_string(),
            ));
        }
        if self.max_message_length > MAX_MESSAGE_LENGTH {
            return Err(HandshakeError::InvalidConfig(format!(
                "max_message_length {} exceeds the decoder limit of {}",
                self.max_message_length, MAX_MESSAGE_LENGTH
            )));
        }
        Ok(())
    }
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            receive_timeout_ms: DEFAULT_RECEIVE_TIMEOUT_MS,
            max_message_length: MAX_MESSAGE_LENGTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_distinct() {
        assert_ne!(TWEAK_LABEL_INITIATOR, TWEAK_LABEL_RESPONDER);
        assert_ne!(TWEAK_LABEL_INITIATOR, COMMITMENT_LABEL);
        assert_ne!(TWEAK_LABEL_RESPONDER, COMMITMENT_LABEL);
    }

    #[test]
    fn test_timeout_constants_agree() {
        assert_eq!(
            DEFAULT_RECEIVE_TIMEOUT.as_millis() as u64,
            DEFAULT_RECEIVE_TIMEOUT_MS
        );
        assert_eq!(
            HandshakeConfig::default().receive_timeout(),
            DEFAULT_RECEIVE_TIMEOUT
        );
    }

    #[test]
    fn test_payload_fits_in_message() {
        // A reveal carries a point, a payload and framing overhead.
        assert!(MAX_PAYLOAD_LENGTH + 128 < MAX_MESSAGE_LENGTH);
    }

    #[test]
    fn test_config_validation() {
        assert!(HandshakeConfig::default().validate().is_ok());

        let zero_timeout = HandshakeConfig {
            receive_timeout_ms: 0,
            ..HandshakeConfig::default()
        };
        assert!(zero_timeout.validate().is_err());

        let zero_length = HandshakeConfig {
            max_message_length: 0,
            ..HandshakeConfig::default()
        };
        assert!(zero_length.validate().is_err());

        let at_limit = HandshakeConfig {
            max_message_length: MAX_MESSAGE_LENGTH,
            ..HandshakeConfig::default()
        };
        assert!(at_limit.validate().is_ok());

        let above_limit = HandshakeConfig {
            max_message_length: MAX_MESSAGE_LENGTH + 1,
            ..HandshakeConfig::default()
        };
        assert!(matches!(
            above_limit.validate(),
            Err(HandshakeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: HandshakeConfig =
            serde_json::from_str(r#"{ "receive_timeout_ms": 250 }"#).unwrap();
        assert_eq!(config.receive_timeout(), Duration::from_millis(250));
        assert_eq!(config.max_message_length, MAX_MESSAGE_LENGTH);
    }
}
