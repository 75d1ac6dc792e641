//! Variant D: the Julia Key Agreement.
//!
//! Each role hashes its own ephemeral point under its own label,
//! `t1 = H("t1", E1)` and `t2 = H("t2", E2)`, so both tweaks can be
//! computed before the handshake begins. The combined values are
//!
//! ```text
//! D1 = (t2·s1 + e1) · (t1·S2 + E2)
//! D2 = (t2·S1 + E1) · (t1·s2 + e2)
//! ```
//!
//! Multiplication distributes, so each side folds its secrets into one
//! scalar and its peer's points into one combined point: a single
//! effective scalar multiplication per party.
//!
//! The commitment to `E1` stops the responder from picking `E2` after
//! seeing `E1`; see [`committed`](super::committed).

use crate::config::TWEAK_LABEL_RESPONDER;
use crate::group::Group;

use super::committed::{self, TweakSchedule};
use super::Variant;

/// Tweak schedule for variant D: `x = t2`, `y = t1`.
#[derive(Debug, Clone, Copy)]
pub struct Jka;

impl TweakSchedule for Jka {
    const VARIANT: Variant = Variant::Jka;
    const RESPONDER_LABEL: &'static str = TWEAK_LABEL_RESPONDER;

    fn static_weights<G: Group>(ti: &G::Scalar, tr: &G::Scalar) -> (G::Scalar, G::Scalar) {
        (*tr, *ti)
    }
}

pub type Initiator<G> = committed::Initiator<G, Jka>;
pub type Responder<G> = committed::Responder<G, Jka>;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::TWEAK_LABEL_INITIATOR;
    use crate::crypto::{tweak, Keypair};
    use crate::group::{Curve25519, GroupError, Ristretto255};
    use crate::handshake::{
        exchange, HandshakeError, HandshakeRole, HandshakeState, Step, WireMessage,
    };
    use curve25519_dalek::constants::EIGHT_TORSION;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn roles<G: Group>(seed: u64) -> (Initiator<G>, Responder<G>) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let s1 = Arc::new(Keypair::generate_with(&mut rng).unwrap());
        let s2 = Arc::new(Keypair::generate_with(&mut rng).unwrap());
        let mut initiator = Initiator::new(s1.clone(), s2.public_key());
        let mut responder = Responder::new(s2, s1.public_key());
        initiator.generate_keys_with(&mut rng).unwrap();
        responder.generate_keys_with(&mut rng).unwrap();
        (initiator, responder)
    }

    #[test]
    fn test_both_roles_agree() {
        for seed in 0..8 {
            let (mut initiator, mut responder) = roles::<Curve25519>(seed);
            exchange(&mut initiator, &mut responder).unwrap();
            assert_eq!(initiator.state(), HandshakeState::DerivedSecret);
            assert_eq!(responder.state(), HandshakeState::DerivedSecret);

            let i = initiator.finish().unwrap();
            let r = responder.finish().unwrap();
            assert_eq!(i.secret, r.secret);
            assert_eq!(i.transcript_hash, r.transcript_hash);
        }
    }

    #[test]
    fn test_ristretto_agrees() {
        let (mut initiator, mut responder) = roles::<Ristretto255>(100);
        assert_eq!(initiator.variant(), Variant::Jka);
        assert_eq!(responder.variant(), Variant::Jka);
        exchange(&mut initiator, &mut responder).unwrap();
        assert_eq!(
            initiator.finish().unwrap().secret,
            responder.finish().unwrap().secret
        );
    }

    #[test]
    fn test_matches_closed_form() {
        let (mut initiator, mut responder) = roles::<Curve25519>(7);
        exchange(&mut initiator, &mut responder).unwrap();
        let d2 = responder.finish().unwrap().secret;

        // Same draw order as `roles`: s1, s2, e1, e2.
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let keys: Vec<Keypair<Curve25519>> = (0..4)
            .map(|_| Keypair::generate_with(&mut rng).unwrap())
            .collect();
        let (s1, s2, e1, e2) = (&keys[0], &keys[1], &keys[2], &keys[3]);

        let t1 = tweak::<Curve25519>(TWEAK_LABEL_INITIATOR, e1.public_key().point())
            .to_scalar::<Curve25519>();
        let t2 = tweak::<Curve25519>(TWEAK_LABEL_RESPONDER, e2.public_key().point())
            .to_scalar::<Curve25519>();

        // (t2·S1 + E1) · (t1·s2 + e2)
        let left = Curve25519::add(
            &Curve25519::multiply(&t2, s1.public_key().point()),
            e1.public_key().point(),
        );
        let right = Curve25519::scalar_add(
            &Curve25519::scalar_mul(&t1, s2.secret().scalar()),
            e2.secret().scalar(),
        );
        let expected = Curve25519::multiply(&right, &left);

        assert!(Curve25519::equals(d2.point(), &expected));
    }

    #[test]
    fn test_fresh_ephemerals_give_fresh_secrets() {
        let mut rng = ChaCha20Rng::seed_from_u64(55);
        let s1 = Arc::new(Keypair::<Curve25519>::generate_with(&mut rng).unwrap());
        let s2 = Arc::new(Keypair::<Curve25519>::generate_with(&mut rng).unwrap());

        let mut secrets = Vec::new();
        for _ in 0..2 {
            let mut initiator = Initiator::new(s1.clone(), s2.public_key());
            let mut responder = Responder::new(s2.clone(), s1.public_key());
            initiator.generate_keys_with(&mut rng).unwrap();
            responder.generate_keys_with(&mut rng).unwrap();
            exchange(&mut initiator, &mut responder).unwrap();
            secrets.push(initiator.finish().unwrap().secret);
        }
        assert_ne!(secrets[0], secrets[1]);
    }

    #[test]
    fn test_flipped_reveal_byte_aborts() {
        let (mut initiator, mut responder) = roles::<Curve25519>(9);
        let h1 = initiator.write_message().unwrap();
        responder.read_message(&h1).unwrap();
        let m2 = responder.write_message().unwrap();
        initiator.read_message(&m2).unwrap();
        let m3 = initiator.write_message().unwrap();

        let tampered = match WireMessage::decode(&m3).unwrap() {
            WireMessage::Reveal {
                mut ephemeral,
                payload,
            } => {
                ephemeral[0] ^= 0x01;
                WireMessage::Reveal { ephemeral, payload }.encode().unwrap()
            }
            other => panic!("unexpected {other:?}"),
        };

        let err = responder.read_message(&tampered).unwrap_err();
        assert!(matches!(
            err,
            HandshakeError::CommitmentMismatch | HandshakeError::GroupOperationFailure(_)
        ));
        assert_eq!(responder.state(), HandshakeState::Aborted);
        assert_eq!(responder.next_step(), Step::Done);
        assert!(matches!(
            responder.read_message(&m3),
            Err(HandshakeError::Aborted)
        ));
    }

    #[test]
    fn test_short_commitment_is_malformed() {
        let (_, mut responder) = roles::<Curve25519>(10);
        let short = WireMessage::Commitment {
            commitment: vec![0u8; 16],
        }
        .encode()
        .unwrap();
        assert!(matches!(
            responder.read_message(&short),
            Err(HandshakeError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_reveal_before_commitment_is_malformed() {
        let (_, mut responder) = roles::<Curve25519>(11);
        let early = WireMessage::Reveal {
            ephemeral: Curve25519::encode_point(&Curve25519::generator()),
            payload: Vec::new(),
        }
        .encode()
        .unwrap();
        assert!(matches!(
            responder.read_message(&early),
            Err(HandshakeError::MalformedMessage(_))
        ));
        assert_eq!(responder.state(), HandshakeState::Aborted);
    }

    #[test]
    fn test_torsioned_responder_ephemeral_aborts_initiator() {
        let (mut initiator, _) = roles::<Curve25519>(12);
        initiator.write_message().unwrap();

        // A valid point plus a component of order 8.
        let torsioned = Curve25519::add(&Curve25519::generator(), &EIGHT_TORSION[1]);
        let e2 = WireMessage::Ephemeral {
            ephemeral: Curve25519::encode_point(&torsioned),
        }
        .encode()
        .unwrap();
        assert!(matches!(
            initiator.read_message(&e2),
            Err(HandshakeError::GroupOperationFailure(GroupError::NotInPrimeSubgroup))
        ));
        assert_eq!(initiator.state(), HandshakeState::Aborted);
        assert!(matches!(initiator.finish(), Err(HandshakeError::Aborted)));
    }

    #[test]
    fn test_small_order_reveal_aborts_responder() {
        let (mut initiator, mut responder) = roles::<Curve25519>(13);
        let h1 = initiator.write_message().unwrap();
        responder.read_message(&h1).unwrap();
        responder.write_message().unwrap();

        let reveal = WireMessage::Reveal {
            ephemeral: Curve25519::encode_point(&EIGHT_TORSION[1]),
            payload: Vec::new(),
        }
        .encode()
        .unwrap();
        assert!(matches!(
            responder.read_message(&reveal),
            Err(HandshakeError::GroupOperationFailure(GroupError::SmallOrder))
        ));
        assert_eq!(responder.state(), HandshakeState::Aborted);
        assert!(matches!(responder.finish(), Err(HandshakeError::Aborted)));
    }
}
