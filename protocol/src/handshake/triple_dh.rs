//! Variant B: three-multiplication agreement, shaped like Noise XX.
//!
//! ```text
//! Initiator                               Responder
//!   E1                  ──────────────►
//!                       ◄──────────────   E2, S2
//!   S1, payload         ──────────────►
//! ```
//!
//! Static keys are learned from the handshake itself, not configured in
//! advance. Each side pairs every static with the peer's ephemeral and the
//! two ephemerals with each other, giving three values (`ee`, `es`, `se`).
//! Turning those into session keys is left to the caller.
//!
//! Ephemeral secrets are dropped as soon as the last value that needs them
//! has been computed.

use std::sync::Arc;

use rand_core::{CryptoRng, RngCore};

use crate::crypto::{Keypair, PublicKey};
use crate::group::Group;

use super::message::{decode_point, unexpected};
use super::session::{missing_keys, Scripted, SessionCore};
use super::{
    HandshakeError, HandshakeRole, HandshakeState, Outcome, Role, SharedSecret, Step,
    TripleSecret, Variant, WireMessage,
};

const INITIATOR_SCRIPT: &[Step] = &[Step::Write, Step::Read, Step::Write];
const RESPONDER_SCRIPT: &[Step] = &[Step::Read, Step::Write, Step::Read];

// ---------------------------------------------------------------------------
// Initiator
// ---------------------------------------------------------------------------

pub struct Initiator<G: Group> {
    core: SessionCore,
    own_static: Arc<Keypair<G>>,
    ephemeral: Option<Keypair<G>>,
    payload: Vec<u8>,
    peer_static: Option<PublicKey<G>>,
    secret: Option<TripleSecret<G>>,
}

impl<G: Group> Initiator<G> {
    pub fn new(own_static: Arc<Keypair<G>>) -> Self {
        Self {
            core: SessionCore::new(Role::Initiator, Variant::TripleDh, INITIATOR_SCRIPT),
            own_static,
            ephemeral: None,
            payload: Vec::new(),
            peer_static: None,
            secret: None,
        }
    }

    /// Application data sent alongside the static-key reveal.
    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    fn write_step(&mut self) -> Result<Vec<u8>, HandshakeError> {
        let message = if self.core.is_final_step() {
            WireMessage::StaticReveal {
                static_key: self.own_static.public_key().to_bytes(),
                payload: self.payload.clone(),
            }
        } else {
            let ephemeral = self.ephemeral.as_ref().ok_or_else(missing_keys)?;
            WireMessage::Ephemeral {
                ephemeral: ephemeral.public_key().to_bytes(),
            }
        };
        message.encode()
    }

    fn read_step(&mut self, message: &[u8]) -> Result<(), HandshakeError> {
        let (e2, s2) = match WireMessage::decode(message)? {
            WireMessage::EphemeralStatic {
                ephemeral,
                static_key,
            } => (
                decode_point::<G>(&ephemeral)?,
                decode_point::<G>(&static_key)?,
            ),
            other => return Err(unexpected("ephemeral_static", &other)),
        };

        let e1 = self.ephemeral.take().ok_or_else(missing_keys)?;
        let s1 = self.own_static.secret().scalar();
        self.secret = Some(TripleSecret {
            ee: SharedSecret::new(G::multiply(e1.secret().scalar(), &e2))?,
            es: SharedSecret::new(G::multiply(e1.secret().scalar(), &s2))?,
            se: SharedSecret::new(G::multiply(s1, &e2))?,
        });
        self.peer_static = Some(PublicKey::from_point(s2));
        Ok(())
    }
}

impl<G: Group> Scripted for Initiator<G> {
    fn core(&mut self) -> &mut SessionCore {
        &mut self.core
    }
}

impl<G: Group> HandshakeRole for Initiator<G> {
    type Group = G;
    type Secret = TripleSecret<G>;

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
        match Keypair::generate_with(rng) {
            Ok(ephemeral) => self.ephemeral = Some(ephemeral),
            Err(e) => return Err(self.core.abort(e.into())),
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

    fn finish(mut self) -> Result<Outcome<G, TripleSecret<G>>, HandshakeError> {
        let transcript_hash = self.core.conclude()?;
        let secret = self.secret.take().ok_or(HandshakeError::Aborted)?;
        let peer_static = self.peer_static.ok_or(HandshakeError::Aborted)?;
        Ok(Outcome {
            secret,
            peer_static,
            peer_data: Vec::new(),
            transcript_hash,
        })
    }
}

// ---------------------------------------------------------------------------
// Responder
// ---------------------------------------------------------------------------

pub struct Responder<G: Group> {
    core: SessionCore,
    own_static: Arc<Keypair<G>>,
    ephemeral: Option<Keypair<G>>,
    peer_ephemeral: Option<G::Point>,
    peer_static: Option<PublicKey<G>>,
    peer_data: Vec<u8>,
    secret: Option<TripleSecret<G>>,
}

impl<G: Group> Responder<G> {
    pub fn new(own_static: Arc<Keypair<G>>) -> Self {
        Self {
            core: SessionCore::new(Role::Responder, Variant::TripleDh, RESPONDER_SCRIPT),
            own_static,
            ephemeral: None,
            peer_ephemeral: None,
            peer_static: None,
            peer_data: Vec::new(),
            secret: None,
        }
    }

    fn write_step(&mut self) -> Result<Vec<u8>, HandshakeError> {
        let ephemeral = self.ephemeral.as_ref().ok_or_else(missing_keys)?;
        WireMessage::EphemeralStatic {
            ephemeral: ephemeral.public_key().to_bytes(),
            static_key: self.own_static.public_key().to_bytes(),
        }
        .encode()
    }

    fn read_step(&mut self, message: &[u8]) -> Result<(), HandshakeError> {
        match WireMessage::decode(message)? {
            WireMessage::Ephemeral { ephemeral } if !self.core.is_final_step() => {
                self.peer_ephemeral = Some(decode_point::<G>(&ephemeral)?);
                Ok(())
            }
            WireMessage::StaticReveal {
                static_key,
                payload,
            } if self.core.is_final_step() => {
                let s1 = decode_point::<G>(&static_key)?;
                self.derive(&s1)?;
                self.peer_static = Some(PublicKey::from_point(s1));
                self.peer_data = payload;
                Ok(())
            }
            other if self.core.is_final_step() => Err(unexpected("static_reveal", &other)),
            other => Err(unexpected("ephemeral", &other)),
        }
    }

    fn derive(&mut self, s1: &G::Point) -> Result<(), HandshakeError> {
        let e1 = self.peer_ephemeral.ok_or_else(missing_keys)?;
        let e2 = self.ephemeral.take().ok_or_else(missing_keys)?;
        let s2 = self.own_static.secret().scalar();
        self.secret = Some(TripleSecret {
            ee: SharedSecret::new(G::multiply(e2.secret().scalar(), &e1))?,
            es: SharedSecret::new(G::multiply(s2, &e1))?,
            se: SharedSecret::new(G::multiply(e2.secret().scalar(), s1))?,
        });
        Ok(())
    }
}

impl<G: Group> Scripted for Responder<G> {
    fn core(&mut self) -> &mut SessionCore {
        &mut self.core
    }
}

impl<G: Group> HandshakeRole for Responder<G> {
    type Group = G;
    type Secret = TripleSecret<G>;

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
        match Keypair::generate_with(rng) {
            Ok(ephemeral) => self.ephemeral = Some(ephemeral),
            Err(e) => return Err(self.core.abort(e.into())),
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

    fn finish(mut self) -> Result<Outcome<G, TripleSecret<G>>, HandshakeError> {
        let transcript_hash = self.core.conclude()?;
        let secret = self.secret.take().ok_or(HandshakeError::Aborted)?;
        let peer_static = self.peer_static.ok_or(HandshakeError::Aborted)?;
        Ok(Outcome {
            secret,
            peer_static,
            peer_data: self.peer_data,
            transcript_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{Curve25519, Ristretto255};
    use crate::handshake::exchange;

    fn pair<G: Group>() -> (Initiator<G>, Responder<G>, Arc<Keypair<G>>, Arc<Keypair<G>>) {
        let s1 = Arc::new(Keypair::<G>::generate().unwrap());
        let s2 = Arc::new(Keypair::<G>::generate().unwrap());
        let mut initiator = Initiator::new(s1.clone()).with_payload(b"app data".to_vec());
        let mut responder = Responder::new(s2.clone());
        initiator.generate_keys().unwrap();
        responder.generate_keys().unwrap();
        (initiator, responder, s1, s2)
    }

    #[test]
    fn test_all_three_values_agree() {
        let (mut initiator, mut responder, s1, s2) = pair::<Curve25519>();
        exchange(&mut initiator, &mut responder).unwrap();
        let i = initiator.finish().unwrap();
        let r = responder.finish().unwrap();

        assert_eq!(i.secret.ee, r.secret.ee);
        assert_eq!(i.secret.es, r.secret.es);
        assert_eq!(i.secret.se, r.secret.se);
        assert_eq!(i.secret, r.secret);
        assert_ne!(i.secret.ee, i.secret.es);

        assert_eq!(i.peer_static, s2.public_key());
        assert_eq!(r.peer_static, s1.public_key());
        assert_eq!(r.peer_data, b"app data");
        assert_eq!(i.transcript_hash, r.transcript_hash);
    }

    #[test]
    fn test_ristretto_agrees() {
        let (mut initiator, mut responder, _, _) = pair::<Ristretto255>();
        exchange(&mut initiator, &mut responder).unwrap();
        assert_eq!(
            initiator.finish().unwrap().secret,
            responder.finish().unwrap().secret
        );
    }

    #[test]
    fn test_identity_ephemeral_aborts() {
        let (_, mut responder, _, _) = pair::<Curve25519>();
        let bogus = WireMessage::Ephemeral {
            ephemeral: Curve25519::encode_point(&Curve25519::identity()),
        }
        .encode()
        .unwrap();
        assert!(matches!(
            responder.read_message(&bogus),
            Err(HandshakeError::GroupOperationFailure(_))
        ));
        assert_eq!(responder.state(), HandshakeState::Aborted);
    }

    #[test]
    fn test_replayed_first_message_as_final_aborts() {
        let (mut initiator, mut responder, _, _) = pair::<Curve25519>();
        let first = initiator.write_message().unwrap();
        responder.read_message(&first).unwrap();
        let reply = responder.write_message().unwrap();
        initiator.read_message(&reply).unwrap();

        assert!(matches!(
            responder.read_message(&first),
            Err(HandshakeError::MalformedMessage(_))
        ));
        assert_eq!(responder.state(), HandshakeState::Aborted);
    }

    #[test]
    fn test_responder_cannot_write_first() {
        let (_, mut responder, _, _) = pair::<Curve25519>();
        assert_eq!(responder.next_step(), Step::Read);
        assert!(matches!(
            responder.write_message(),
            Err(HandshakeError::InvalidState { .. })
        ));
        assert!(matches!(
            responder.write_message(),
            Err(HandshakeError::Aborted)
        ));
    }

    #[test]
    fn test_finish_before_done_fails() {
        let (initiator, _, _, _) = pair::<Curve25519>();
        assert!(matches!(
            initiator.finish(),
            Err(HandshakeError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_es_matches_direct_computation() {
        let (mut initiator, mut responder, _, s2) = pair::<Ristretto255>();
        let first = initiator.write_message().unwrap();
        let e1 = WireMessage::decode(&first).unwrap();
        responder.read_message(&first).unwrap();
        let reply = responder.write_message().unwrap();
        initiator.read_message(&reply).unwrap();
        let last = initiator.write_message().unwrap();
        responder.read_message(&last).unwrap();

        let e1 = match e1 {
            WireMessage::Ephemeral { ephemeral } => Ristretto255::decode_point(&ephemeral).unwrap(),
            other => panic!("unexpected {other:?}"),
        };
        let r = responder.finish().unwrap();
        let es = Ristretto255::multiply(s2.secret().scalar(), &e1);
        assert!(Ristretto255::equals(r.secret.es.point(), &es));
    }
}
