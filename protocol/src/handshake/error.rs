//! Error types for the handshake engine.
//!
//! Every failure is fatal to the session that raised it. A role that
//! returns any of these moves to [`HandshakeState::Aborted`] and refuses
//! all further calls. Recovery means a brand-new session with fresh
//! ephemeral keys; nothing here is retried internally.

use std::time::Duration;

use thiserror::Error;

use crate::crypto::KeyError;
use crate::group::GroupError;

use super::HandshakeState;

/// Errors that can occur while running a handshake.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The revealed ephemeral point does not hash to the commitment received
    /// earlier.
    #[error("commitment mismatch: revealed ephemeral does not match the commitment")]
    CommitmentMismatch,

    /// A received message could not be decoded into the expected shape.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The secure random source failed during key generation.
    #[error("secure random source unavailable: {0}")]
    RandomnessFailure(String),

    /// An operand is not a valid group element, or a combined value
    /// collapsed to the identity.
    #[error("group operation failed: {0}")]
    GroupOperationFailure(#[from] GroupError),

    /// A method was called out of turn.
    #[error("cannot {action} in state {state}")]
    InvalidState {
        /// State the role was in.
        state: HandshakeState,
        /// What the caller tried to do.
        action: &'static str,
    },

    /// The session already failed. Start a new one.
    #[error("session aborted")]
    Aborted,

    /// The peer did not send its next message in time.
    #[error("timed out after {0:?} waiting for the peer")]
    Timeout(Duration),

    /// The transport went away mid-handshake.
    #[error("channel closed")]
    ChannelClosed,

    /// The handshake configuration cannot work.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl HandshakeError {
    /// Short, secret-free name of the error, for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CommitmentMismatch => "commitment_mismatch",
            Self::MalformedMessage(_) => "malformed_message",
            Self::RandomnessFailure(_) => "randomness_failure",
            Self::GroupOperationFailure(_) => "group_operation_failure",
            Self::InvalidState { .. } => "invalid_state",
            Self::Aborted => "aborted",
            Self::Timeout(_) => "timeout",
            Self::ChannelClosed => "channel_closed",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}

impl From<KeyError> for HandshakeError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::RandomnessFailure(reason) => Self::RandomnessFailure(reason),
            KeyError::InvalidPublicKey(group) => Self::GroupOperationFailure(group),
            other => Self::InvalidConfig(other.to_string()),
        }
    }
}
