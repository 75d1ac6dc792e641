//! # Handshake Engine
//!
//! Four key-agreement variants, each a pair of role state machines that
//! trade opaque messages over an untrusted channel and end with a value
//! both sides computed independently.
//!
//! ```text
//!   Variant A (static_only)      Variant B (triple_dh)
//!   I ── pre ──────────► R       I ── E1 ───────────► R
//!   I ◄────────── pre ── R       I ◄────────── E2,S2 ─ R
//!                                I ── S1, data ─────► R
//!   D = s_own · S_peer           ee, es, se
//!
//!   Variants C (joint_tweak) and D (jka)
//!   I ── h1 ───────────► R       h1 = H("h1" ‖ E1)
//!   I ◄─────────── E2 ── R
//!   I ── E1, data ─────► R       R checks h1 before anything else
//!   D = (x·s1 + e1)·(y·s2 + e2)·G
//! ```
//!
//! In C both weights are the joint tweak `t1 + t2`. In D the initiator's
//! static is weighted by the responder's tweak and vice versa, so each
//! side's tweaks depend only on that side's own ephemeral point and can be
//! computed before the handshake starts.
//!
//! ## Driving a role
//!
//! Every role implements [`HandshakeRole`]. Callers either drive it by
//! hand (`next_step` → `write_message` / `read_message` → `finish`) or
//! hand it to [`run_handshake`] together with a [`Channel`].
//!
//! ## Failure
//!
//! Any error moves the role to [`HandshakeState::Aborted`]. An aborted
//! role refuses every later call and never yields a secret.

pub mod committed;
pub mod jka;
pub mod joint_tweak;
pub mod static_only;
pub mod triple_dh;

mod channel;
mod driver;
mod error;
mod message;
mod session;

pub use channel::{Channel, MemoryChannel};
pub use driver::run_handshake;
pub use error::HandshakeError;
pub use message::WireMessage;

use std::fmt;
use std::str::FromStr;

use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::crypto::{Digest, PublicKey};
use crate::group::{Group, GroupError};

// ---------------------------------------------------------------------------
// Roles, Variants, States
// ---------------------------------------------------------------------------

/// Which side of the exchange a state machine plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Initiator,
    Responder,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Initiator => "initiator",
            Role::Responder => "responder",
        })
    }
}

/// The four key-agreement variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// A: static keys only, no forward secrecy.
    StaticOnly,
    /// B: three Diffie-Hellman values, Noise-XX shaped.
    TripleDh,
    /// C: commit-then-reveal with a joint tweak.
    JointTweak,
    /// D: commit-then-reveal with independent tweaks (JKA).
    Jka,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::StaticOnly,
        Variant::TripleDh,
        Variant::JointTweak,
        Variant::Jka,
    ];

    /// Single-letter name: `a` through `d`.
    pub fn letter(&self) -> char {
        match self {
            Variant::StaticOnly => 'a',
            Variant::TripleDh => 'b',
            Variant::JointTweak => 'c',
            Variant::Jka => 'd',
        }
    }

    /// Whether compromise of a static key later leaves past sessions safe.
    pub fn forward_secret(&self) -> bool {
        !matches!(self, Variant::StaticOnly)
    }

    /// Whether the initiator commits to its ephemeral before seeing the
    /// responder's.
    pub fn uses_commitment(&self) -> bool {
        matches!(self, Variant::JointTweak | Variant::Jka)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Variant::StaticOnly => "static_only",
            Variant::TripleDh => "triple_dh",
            Variant::JointTweak => "joint_tweak",
            Variant::Jka => "jka",
        })
    }
}

impl FromStr for Variant {
    type Err = HandshakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a" | "static_only" | "static-only" => Ok(Variant::StaticOnly),
            "b" | "triple_dh" | "triple-dh" => Ok(Variant::TripleDh),
            "c" | "joint_tweak" | "joint-tweak" => Ok(Variant::JointTweak),
            "d" | "jka" => Ok(Variant::Jka),
            other => Err(HandshakeError::InvalidConfig(format!(
                "unknown variant '{other}' (expected a, b, c or d)"
            ))),
        }
    }
}

/// Lifecycle of a role.
///
/// ```text
/// Init → KeysReady → SentFirstMessage ⇄ ReceivedPeerMessage
///      → [VerifyingCommitment] → DerivedSecret
/// any error ──────────────────────────────────→ Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeState {
    Init,
    KeysReady,
    SentFirstMessage,
    ReceivedPeerMessage,
    VerifyingCommitment,
    DerivedSecret,
    Aborted,
}

impl HandshakeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::DerivedSecret | Self::Aborted)
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "init",
            Self::KeysReady => "keys_ready",
            Self::SentFirstMessage => "sent_first_message",
            Self::ReceivedPeerMessage => "received_peer_message",
            Self::VerifyingCommitment => "verifying_commitment",
            Self::DerivedSecret => "derived_secret",
            Self::Aborted => "aborted",
        })
    }
}

/// What a role expects to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Produce a message with [`HandshakeRole::write_message`].
    Write,
    /// Consume the peer's message with [`HandshakeRole::read_message`].
    Read,
    /// Nothing left; call [`HandshakeRole::finish`].
    Done,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A combined value: the group element both roles agree on.
///
/// Never the identity. Compared in constant time, redacted in `Debug`,
/// wiped on drop.
pub struct SharedSecret<G: Group> {
    point: G::Point,
}

impl<G: Group> SharedSecret<G> {
    pub(crate) fn new(point: G::Point) -> Result<Self, HandshakeError> {
        if G::is_identity(&point) {
            return Err(GroupError::IdentityPoint.into());
        }
        Ok(Self { point })
    }

    pub fn point(&self) -> &G::Point {
        &self.point
    }

    /// Canonical encoding, for the key-derivation step.
    pub fn to_bytes(&self) -> Vec<u8> {
        G::encode_point(&self.point)
    }
}

impl<G: Group> PartialEq for SharedSecret<G> {
    fn eq(&self, other: &Self) -> bool {
        G::equals(&self.point, &other.point)
    }
}

impl<G: Group> Eq for SharedSecret<G> {}

impl<G: Group> fmt::Debug for SharedSecret<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedSecret<{}>([REDACTED])", G::NAME)
    }
}

impl<G: Group> Drop for SharedSecret<G> {
    fn drop(&mut self) {
        self.point.zeroize();
    }
}

/// The three values of the triple-DH variant, Noise naming: the first
/// letter is the initiator's key, the second the responder's.
///
/// - `ee = e1·E2 = e2·E1`
/// - `es = e1·S2 = s2·E1`
/// - `se = s1·E2 = e2·S1`
pub struct TripleSecret<G: Group> {
    pub ee: SharedSecret<G>,
    pub es: SharedSecret<G>,
    pub se: SharedSecret<G>,
}

impl<G: Group> PartialEq for TripleSecret<G> {
    fn eq(&self, other: &Self) -> bool {
        // Non-short-circuiting so the comparison does not leak which one
        // differed.
        (self.ee == other.ee) & (self.es == other.es) & (self.se == other.se)
    }
}

impl<G: Group> Eq for TripleSecret<G> {}

impl<G: Group> fmt::Debug for TripleSecret<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TripleSecret<{}>([REDACTED])", G::NAME)
    }
}

/// Everything a finished role hands to the key-derivation collaborator.
#[derive(Debug)]
pub struct Outcome<G: Group, S> {
    /// The agreed value(s).
    pub secret: S,
    /// The peer's static key: configured for A, C and D, learned for B.
    pub peer_static: PublicKey<G>,
    /// Application data the peer attached, or its pre-handshake value in
    /// variant A. Empty if none.
    pub peer_data: Vec<u8>,
    /// SHA-256 over every message in exchange order, each prefixed with
    /// its 4-byte big-endian length. Identical on both sides.
    pub transcript_hash: Digest,
}

// ---------------------------------------------------------------------------
// The Role Trait
// ---------------------------------------------------------------------------

/// A single role in a single session.
///
/// Roles are used once. After [`finish`](Self::finish) or any error the
/// value is spent.
pub trait HandshakeRole: Send + Sized {
    type Group: Group;
    /// What this variant yields: a [`SharedSecret`] or a [`TripleSecret`].
    type Secret: Send;

    fn role(&self) -> Role;

    fn variant(&self) -> Variant;

    fn state(&self) -> HandshakeState;

    /// Generates this session's key material from the OS random source.
    fn generate_keys(&mut self) -> Result<(), HandshakeError> {
        self.generate_keys_with(&mut OsRng)
    }

    /// Generates this session's key material from `rng`. Only valid in
    /// [`HandshakeState::Init`].
    fn generate_keys_with<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
    ) -> Result<(), HandshakeError>;

    fn next_step(&self) -> Step;

    /// Produces the next outbound message.
    fn write_message(&mut self) -> Result<Vec<u8>, HandshakeError>;

    /// Consumes the peer's next message.
    fn read_message(&mut self, message: &[u8]) -> Result<(), HandshakeError>;

    /// Hands over the result. Only valid in [`HandshakeState::DerivedSecret`].
    fn finish(self) -> Result<Outcome<Self::Group, Self::Secret>, HandshakeError>;
}

/// Runs two hand-driven roles against each other until both are done.
#[cfg(test)]
pub(crate) fn exchange<I, R>(initiator: &mut I, responder: &mut R) -> Result<(), HandshakeError>
where
    I: HandshakeRole,
    R: HandshakeRole,
{
    loop {
        match (initiator.next_step(), responder.next_step()) {
            (Step::Write, Step::Read) => {
                let message = initiator.write_message()?;
                responder.read_message(&message)?;
            }
            (Step::Read, Step::Write) => {
                let message = responder.write_message()?;
                initiator.read_message(&message)?;
            }
            (Step::Done, Step::Done) => return Ok(()),
            (i, r) => panic!("roles out of step: initiator {i:?}, responder {r:?}"),
        }
    }
}
