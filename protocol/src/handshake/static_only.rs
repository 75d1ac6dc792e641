//! Variant A: static-only agreement.
//!
//! Both sides already know each other's static public key. Each sends an
//! opaque pre-handshake value and computes `D = s_own · S_peer`.
//!
//! There is no ephemeral material, so `D` is the same in every session
//! between the same two identities. Whoever learns either static secret,
//! now or later, can recompute every past and future `D`. This variant is
//! here as the baseline the others improve on.

use std::sync::Arc;

use rand_core::{CryptoRng, RngCore};

use crate::config::PRE_HANDSHAKE_VALUE_LENGTH;
use crate::crypto::{Keypair, PublicKey};
use crate::group::Group;

use super::message::unexpected;
use super::session::{Scripted, SessionCore};
use super::{
    HandshakeError, HandshakeRole, HandshakeState, Outcome, Role, SharedSecret, Step, Variant,
    WireMessage,
};

const INITIATOR_SCRIPT: &[Step] = &[Step::Write, Step::Read];
const RESPONDER_SCRIPT: &[Step] = &[Step::Read, Step::Write];

/// Either role of variant A. The roles differ only in who speaks first.
pub struct StaticOnly<G: Group> {
    core: SessionCore,
    own_static: Arc<Keypair<G>>,
    peer_static: PublicKey<G>,
    own_value: Option<Vec<u8>>,
    peer_value: Vec<u8>,
    secret: Option<SharedSecret<G>>,
}

impl<G: Group> StaticOnly<G> {
    pub fn initiator(own_static: Arc<Keypair<G>>, peer_static: PublicKey<G>) -> Self {
        Self::new(Role::Initiator, INITIATOR_SCRIPT, own_static, peer_static)
    }

    pub fn responder(own_static: Arc<Keypair<G>>, peer_static: PublicKey<G>) -> Self {
        Self::new(Role::Responder, RESPONDER_SCRIPT, own_static, peer_static)
    }

    fn new(
        role: Role,
        script: &'static [Step],
        own_static: Arc<Keypair<G>>,
        peer_static: PublicKey<G>,
    ) -> Self {
        Self {
            core: SessionCore::new(role, Variant::StaticOnly, script),
            own_static,
            peer_static,
            own_value: None,
            peer_value: Vec::new(),
            secret: None,
        }
    }

    /// Sends `value` instead of a random one.
    pub fn with_pre_handshake_value(mut self, value: Vec<u8>) -> Self {
        self.own_value = Some(value);
        self
    }

    fn write_step(&mut self) -> Result<Vec<u8>, HandshakeError> {
        let value = self.own_value.clone().unwrap_or_default();
        let bytes = WireMessage::PreHandshake { value }.encode()?;
        if self.core.is_final_step() {
            self.derive()?;
        }
        Ok(bytes)
    }

    fn read_step(&mut self, message: &[u8]) -> Result<(), HandshakeError> {
        match WireMessage::decode(message)? {
            WireMessage::PreHandshake { value } => self.peer_value = value,
            other => return Err(unexpected("pre_handshake", &other)),
        }
        if self.core.is_final_step() {
            self.derive()?;
        }
        Ok(())
    }

    fn derive(&mut self) -> Result<(), HandshakeError> {
        let point = G::multiply(self.own_static.secret().scalar(), self.peer_static.point());
        self.secret = Some(SharedSecret::new(point)?);
        Ok(())
    }
}

impl<G: Group> Scripted for StaticOnly<G> {
    fn core(&mut self) -> &mut SessionCore {
        &mut self.core
    }
}

impl<G: Group> HandshakeRole for StaticOnly<G> {
    type Group = G;
    type Secret = SharedSecret<G>;

    fn role(&self) -> Role {
        self.core.role()
    }

    fn variant(&self) -> Variant {
        self.core.variant()
    }

    fn state(&self) -> HandshakeState {
        self.core.state()
    }

    fn generate_keys_with<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
    ) -> Result<(), HandshakeError> {
        self.core.begin_keygen()?;
        if self.own_value.is_none() {
            let mut value = vec![0u8; PRE_HANDSHAKE_VALUE_LENGTH];
            if let Err(e) = rng.try_fill_bytes(&mut value) {
                return Err(self.core.abort(HandshakeError::RandomnessFailure(e.to_string())));
            }
            self.own_value = Some(value);
        }
        self.core.keys_ready();
        Ok(())
    }

    fn next_step(&self) -> Step {
        self.core.next_step()
    }

    fn write_message(&mut self) -> Result<Vec<u8>, HandshakeError> {
        SessionCore::run_write(self, Self::write_step)
    }

    fn read_message(&mut self, message: &[u8]) -> Result<(), HandshakeError> {
        SessionCore::run_read(self, message, Self::read_step)
    }

    fn finish(mut self) -> Result<Outcome<G, SharedSecret<G>>, HandshakeError> {
        let transcript_hash = self.core.conclude()?;
        let secret = self.secret.take().ok_or(HandshakeError::Aborted)?;
        Ok(Outcome {
            secret,
            peer_static: self.peer_static,
            peer_data: self.peer_value,
            transcript_hash,
        })
    }
}
