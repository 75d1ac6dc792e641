//! Bookkeeping shared by every role: the script, the state, the transcript.
//!
//! A role owns one [`SessionCore`] and only writes its own cryptography.
//! Turn order, state transitions, abort handling and transcript hashing
//! all live here so the variants cannot drift apart.

use sha2::{Digest as _, Sha256};
use tracing::{debug, warn};

use crate::crypto::Digest;

use super::{HandshakeError, HandshakeState, Role, Step, Variant};

/// A role that owns a [`SessionCore`]. Lets the step runners below reach
/// the core while the role's own step function borrows the rest of it.
pub(crate) trait Scripted {
    fn core(&mut self) -> &mut SessionCore;
}

/// The error for a step that needs key material the role does not hold.
pub(crate) fn missing_keys() -> HandshakeError {
    HandshakeError::InvalidState {
        state: HandshakeState::Init,
        action: "use ephemeral keys before generating them",
    }
}

pub(crate) struct SessionCore {
    role: Role,
    variant: Variant,
    state: HandshakeState,
    script: &'static [Step],
    position: usize,
    transcript: Sha256,
}

impl SessionCore {
    pub(crate) fn new(role: Role, variant: Variant, script: &'static [Step]) -> Self {
        Self {
            role,
            variant,
            state: HandshakeState::Init,
            script,
            position: 0,
            transcript: Sha256::new(),
        }
    }

    pub(crate) fn role(&self) -> Role {
        self.role
    }

    pub(crate) fn variant(&self) -> Variant {
        self.variant
    }

    pub(crate) fn state(&self) -> HandshakeState {
        self.state
    }

    pub(crate) fn next_step(&self) -> Step {
        match self.state {
            HandshakeState::Init | HandshakeState::Aborted | HandshakeState::DerivedSecret => {
                Step::Done
            }
            _ => self.script.get(self.position).copied().unwrap_or(Step::Done),
        }
    }

    /// Whether the step about to run is the last in the script.
    pub(crate) fn is_final_step(&self) -> bool {
        self.position + 1 == self.script.len()
    }

    pub(crate) fn enter(&mut self, next: HandshakeState) {
        debug!(
            variant = %self.variant,
            role = %self.role,
            from = %self.state,
            to = %next,
            "handshake state transition"
        );
        self.state = next;
    }

    /// Moves to `Aborted` and hands back the error that caused it.
    pub(crate) fn abort(&mut self, err: HandshakeError) -> HandshakeError {
        if self.state != HandshakeState::Aborted {
            warn!(
                variant = %self.variant,
                role = %self.role,
                state = %self.state,
                error = err.kind(),
                "handshake aborted"
            );
            self.state = HandshakeState::Aborted;
        }
        err
    }

    /// Gate for key generation.
    pub(crate) fn begin_keygen(&mut self) -> Result<(), HandshakeError> {
        self.guard(HandshakeState::Init, "generate keys")
    }

    /// Key material is in place.
    pub(crate) fn keys_ready(&mut self) {
        self.enter(HandshakeState::KeysReady);
    }

    /// Gate for a scripted step. Fails, and aborts, if it is not this
    /// step's turn.
    pub(crate) fn begin(&mut self, step: Step) -> Result<(), HandshakeError> {
        let action = match step {
            Step::Write => "write a message",
            Step::Read => "read a message",
            Step::Done => "finish",
        };
        if self.state == HandshakeState::Aborted {
            return Err(HandshakeError::Aborted);
        }
        if self.next_step() != step {
            return Err(self.abort(HandshakeError::InvalidState {
                state: self.state,
                action,
            }));
        }
        Ok(())
    }

    /// Records a completed step: the message joins the transcript and the
    /// script advances.
    pub(crate) fn complete(&mut self, step: Step, message: &[u8]) {
        self.absorb(message);
        self.position += 1;
        let next = if self.position == self.script.len() {
            HandshakeState::DerivedSecret
        } else if step == Step::Write {
            HandshakeState::SentFirstMessage
        } else {
            HandshakeState::ReceivedPeerMessage
        };
        self.enter(next);
    }

    /// Runs one outbound step of `role`: checks the turn, records the
    /// message on success, aborts on any error.
    pub(crate) fn run_write<R, F>(role: &mut R, step: F) -> Result<Vec<u8>, HandshakeError>
    where
        R: Scripted,
        F: FnOnce(&mut R) -> Result<Vec<u8>, HandshakeError>,
    {
        role.core().begin(Step::Write)?;
        match step(role) {
            Ok(bytes) => {
                role.core().complete(Step::Write, &bytes);
                Ok(bytes)
            }
            Err(err) => Err(role.core().abort(err)),
        }
    }

    /// Inbound counterpart of [`SessionCore::run_write`].
    pub(crate) fn run_read<R, F>(role: &mut R, message: &[u8], step: F) -> Result<(), HandshakeError>
    where
        R: Scripted,
        F: FnOnce(&mut R, &[u8]) -> Result<(), HandshakeError>,
    {
        role.core().begin(Step::Read)?;
        match step(role, message) {
            Ok(()) => {
                role.core().complete(Step::Read, message);
                Ok(())
            }
            Err(err) => Err(role.core().abort(err)),
        }
    }

    /// Gate for `finish`. Returns the transcript hash.
    pub(crate) fn conclude(&mut self) -> Result<Digest, HandshakeError> {
        self.guard(HandshakeState::DerivedSecret, "finish")?;
        Ok(Digest::from_bytes(self.transcript.clone().finalize().into()))
    }

    fn guard(&mut self, expected: HandshakeState, action: &'static str) -> Result<(), HandshakeError> {
        match self.state {
            HandshakeState::Aborted => Err(HandshakeError::Aborted),
            state if state == expected => Ok(()),
            state => Err(self.abort(HandshakeError::InvalidState { state, action })),
        }
    }

    fn absorb(&mut self, message: &[u8]) {
        self.transcript.update((message.len() as u32).to_be_bytes());
        self.transcript.update(message);
    }
}
