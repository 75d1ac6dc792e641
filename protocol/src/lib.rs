// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # JKA Protocol — Core Library
//!
//! A family of Diffie-Hellman key agreements over a prime-order group,
//! ending in the Julia Key Agreement (JKA): two parties, three messages,
//! one effective scalar multiplication each, and a commitment that keeps
//! the responder from choosing its ephemeral key after seeing the
//! initiator's.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - **group** — the curve-agnostic [`Group`](group::Group) trait, with
//!   Curve25519 (Edwards form) and Ristretto255 instances.
//! - **crypto** — secret generation with clamping, the hash-input codec,
//!   raw digests, tweaks and commitments.
//! - **handshake** — the four variants as role state machines, the wire
//!   format, the channel abstraction and an async driver.
//! - **config** — labels, widths, limits and the runtime configuration.
//!
//! ## What is not here
//!
//! Turning the agreed group element into symmetric keys, storing static
//! keys, replay protection across sessions and the transport itself all
//! belong to the caller. The library hands over the combined value(s),
//! the peer's static key and a transcript hash, and stops there.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use jka_protocol::config::HandshakeConfig;
//! use jka_protocol::crypto::Keypair;
//! use jka_protocol::group::Curve25519;
//! use jka_protocol::handshake::{jka, run_handshake, MemoryChannel};
//!
//! # tokio_test_runtime(async {
//! let alice = Arc::new(Keypair::<Curve25519>::generate().unwrap());
//! let bob = Arc::new(Keypair::<Curve25519>::generate().unwrap());
//! let (mut a, mut b) = MemoryChannel::pair();
//! let config = HandshakeConfig::default();
//!
//! let (i, r) = tokio::join!(
//!     run_handshake(jka::Initiator::new(alice.clone(), bob.public_key()), &mut a, &config),
//!     run_handshake(jka::Responder::new(bob.clone(), alice.public_key()), &mut b, &config),
//! );
//! assert_eq!(i.unwrap().secret, r.unwrap().secret);
//! # });
//! # fn tokio_test_runtime<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

pub mod config;
pub mod crypto;
pub mod group;
pub mod handshake;
