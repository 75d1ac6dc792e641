//! Commit-then-reveal engine shared by variants C and D.
//!
//! ```text
//! Initiator                               Responder
//!   h1 = H("h1" ‖ E1)   ──────────────►   stores h1
//!                       ◄──────────────   E2
//!   D1
//!   E1, payload         ──────────────►   checks h1, then D2
//! ```
//!
//! Both variants compute
//!
//! ```text
//! D = (x·s1 + e1) · (y·s2 + e2) · G
//! ```
//!
//! where `x` and `y` are weights derived from the tweaks of the two
//! ephemeral points. The initiator evaluates it as `a·(y·S2 + E2)` with
//! `a = x·s1 + e1`; the responder as `b·(x·S1 + E1)` with `b = y·s2 + e2`.
//! Either way it is one combined multiscalar multiplication.
//!
//! A [`TweakSchedule`] decides the responder's tweak label and how the
//! two tweaks become `x` and `y`. Everything else, including the
//! commitment discipline, is identical across the variants and lives here.
//!
//! The responder verifies `h1` before it touches `E1` for anything else. A
//! mismatch aborts the session; no secret is derived.

use std::marker::PhantomData;
use std::sync::Arc;

use rand_core::{CryptoRng, RngCore};

use crate::config::{COMMITMENT_LABEL, TWEAK_LABEL_INITIATOR};
use crate::crypto::{commit, tweak, verify_commitment, Digest, Keypair, PublicKey};
use crate::group::Group;

use super::message::{decode_digest, decode_point, unexpected};
use super::session::{missing_keys, Scripted, SessionCore};
use super::{
    HandshakeError, HandshakeRole, HandshakeState, Outcome, Role, SharedSecret, Step, Variant,
    WireMessage,
};

const INITIATOR_SCRIPT: &[Step] = &[Step::Write, Step::Read, Step::Write];
const RESPONDER_SCRIPT: &[Step] = &[Step::Read, Step::Write, Step::Read];

/// How a commit-then-reveal variant turns ephemeral points into weights.
pub trait TweakSchedule: Send + Sync + 'static {
    const VARIANT: Variant;

    /// Label hashed with the responder's ephemeral point. The initiator's
    /// point is always hashed under [`TWEAK_LABEL_INITIATOR`].
    const RESPONDER_LABEL: &'static str;

    /// Weights `(x, y)` on the initiator's and responder's static keys,
    /// given the tweak `ti` of `E1` and the tweak `tr` of `E2`.
    fn static_weights<G: Group>(ti: &G::Scalar, tr: &G::Scalar) -> (G::Scalar, G::Scalar);
}

// ---------------------------------------------------------------------------
// Initiator
// ---------------------------------------------------------------------------

pub struct Initiator<G: Group, T: TweakSchedule> {
    core: SessionCore,
    own_static: Arc<Keypair<G>>,
    peer_static: PublicKey<G>,
    ephemeral: Option<Keypair<G>>,
    ephemeral_public: Option<PublicKey<G>>,
    own_tweak: Option<G::Scalar>,
    commitment: Option<Digest>,
    payload: Vec<u8>,
    secret: Option<SharedSecret<G>>,
    _schedule: PhantomData<fn() -> T>,
}

impl<G: Group, T: TweakSchedule> Initiator<G, T> {
    pub fn new(own_static: Arc<Keypair<G>>, peer_static: PublicKey<G>) -> Self {
        Self {
            core: SessionCore::new(Role::Initiator, T::VARIANT, INITIATOR_SCRIPT),
            own_static,
            peer_static,
            ephemeral: None,
            ephemeral_public: None,
            own_tweak: None,
            commitment: None,
            payload: Vec::new(),
            secret: None,
            _schedule: PhantomData,
        }
    }

    /// Application data sent alongside the reveal of `E1`.
    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    /// `h1`, once keys exist.
    pub fn commitment(&self) -> Option<&Digest> {
        self.commitment.as_ref()
    }

    fn write_step(&mut self) -> Result<Vec<u8>, HandshakeError> {
        let message = if self.core.is_final_step() {
            let ephemeral = self.ephemeral_public.ok_or_else(missing_keys)?;
            WireMessage::Reveal {
                ephemeral: ephemeral.to_bytes(),
                payload: self.payload.clone(),
            }
        } else {
            let commitment = self.commitment.ok_or_else(missing_keys)?;
            WireMessage::Commitment {
                commitment: commitment.as_bytes().to_vec(),
            }
        };
        message.encode()
    }

    fn read_step(&mut self, message: &[u8]) -> Result<(), HandshakeError> {
        let e2 = match WireMessage::decode(message)? {
            WireMessage::Ephemeral { ephemeral } => decode_point::<G>(&ephemeral)?,
            other => return Err(unexpected("ephemeral", &other)),
        };

        let ti = self.own_tweak.ok_or_else(missing_keys)?;
        let tr = tweak::<G>(T::RESPONDER_LABEL, &e2).to_scalar::<G>();
        let (x, y) = T::static_weights::<G>(&ti, &tr);

        let e1 = self.ephemeral.take().ok_or_else(missing_keys)?;
        let a = G::scalar_add(
            &G::scalar_mul(&x, self.own_static.secret().scalar()),
            e1.secret().scalar(),
        );
        let point = G::multiscalar(
            &[G::scalar_mul(&a, &y), a],
            &[*self.peer_static.point(), e2],
        );
        self.secret = Some(SharedSecret::new(point)?);
        Ok(())
    }
}

impl<G: Group, T: TweakSchedule> Scripted for Initiator<G, T> {
    fn core(&mut self) -> &mut SessionCore {
        &mut self.core
    }
}

impl<G: Group, T: TweakSchedule> HandshakeRole for Initiator<G, T> {
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
        let ephemeral = match Keypair::<G>::generate_with(rng) {
            Ok(ephemeral) => ephemeral,
            Err(e) => return Err(self.core.abort(e.into())),
        };
        let e1 = ephemeral.public_key();
        self.own_tweak = Some(tweak::<G>(TWEAK_LABEL_INITIATOR, e1.point()).to_scalar::<G>());
        self.commitment = Some(commit::<G>(COMMITMENT_LABEL, e1.point()));
        self.ephemeral_public = Some(e1);
        self.ephemeral = Some(ephemeral);
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
            peer_data: Vec::new(),
            transcript_hash,
        })
    }
}

// ---------------------------------------------------------------------------
// Responder
// ---------------------------------------------------------------------------

pub struct Responder<G: Group, T: TweakSchedule> {
    core: SessionCore,
    own_static: Arc<Keypair<G>>,
    peer_static: PublicKey<G>,
    ephemeral: Option<Keypair<G>>,
    own_tweak: Option<G::Scalar>,
    commitment: Option<Digest>,
    peer_data: Vec<u8>,
    secret: Option<SharedSecret<G>>,
    _schedule: PhantomData<fn() -> T>,
}

impl<G: Group, T: TweakSchedule> Responder<G, T> {
    pub fn new(own_static: Arc<Keypair<G>>, peer_static: PublicKey<G>) -> Self {
        Self {
            core: SessionCore::new(Role::Responder, T::VARIANT, RESPONDER_SCRIPT),
            own_static,
            peer_static,
            ephemeral: None,
            own_tweak: None,
            commitment: None,
            peer_data: Vec::new(),
            secret: None,
            _schedule: PhantomData,
        }
    }

    fn write_step(&mut self) -> Result<Vec<u8>, HandshakeError> {
        let ephemeral = self.ephemeral.as_ref().ok_or_else(missing_keys)?;
        WireMessage::Ephemeral {
            ephemeral: ephemeral.public_key().to_bytes(),
        }
        .encode()
    }

    fn read_step(&mut self, message: &[u8]) -> Result<(), HandshakeError> {
        match WireMessage::decode(message)? {
            WireMessage::Commitment { commitment } if !self.core.is_final_step() => {
                self.commitment = Some(decode_digest(&commitment)?);
                Ok(())
            }
            WireMessage::Reveal { ephemeral, payload } if self.core.is_final_step() => {
                let e1 = decode_point::<G>(&ephemeral)?;
                self.verify_and_derive(&e1)?;
                self.peer_data = payload;
                Ok(())
            }
            other if self.core.is_final_step() => Err(unexpected("reveal", &other)),
            other => Err(unexpected("commitment", &other)),
        }
    }

    fn verify_and_derive(&mut self, e1: &G::Point) -> Result<(), HandshakeError> {
        self.core.enter(HandshakeState::VerifyingCommitment);
        let h1 = self.commitment.ok_or_else(missing_keys)?;
        verify_commitment::<G>(&h1, COMMITMENT_LABEL, e1)?;

        let tr = self.own_tweak.ok_or_else(missing_keys)?;
        let ti = tweak::<G>(TWEAK_LABEL_INITIATOR, e1).to_scalar::<G>();
        let (x, y) = T::static_weights::<G>(&ti, &tr);

        let e2 = self.ephemeral.take().ok_or_else(missing_keys)?;
        let b = G::scalar_add(
            &G::scalar_mul(&y, self.own_static.secret().scalar()),
            e2.secret().scalar(),
        );
        let point = G::multiscalar(
            &[G::scalar_mul(&b, &x), b],
            &[*self.peer_static.point(), *e1],
        );
        self.secret = Some(SharedSecret::new(point)?);
        Ok(())
    }
}

impl<G: Group, T: TweakSchedule> Scripted for Responder<G, T> {
    fn core(&mut self) -> &mut SessionCore {
        &mut self.core
    }
}

impl<G: Group, T: TweakSchedule> HandshakeRole for Responder<G, T> {
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
        let ephemeral = match Keypair::<G>::generate_with(rng) {
            Ok(ephemeral) => ephemeral,
            Err(e) => return Err(self.core.abort(e.into())),
        };
        let e2 = ephemeral.public_key();
        self.own_tweak = Some(tweak::<G>(T::RESPONDER_LABEL, e2.point()).to_scalar::<G>());
        self.ephemeral = Some(ephemeral);
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
            peer_data: self.peer_data,
            transcript_hash,
        })
    }
}
