//! # Cryptographic Building Blocks
//!
//! Everything the handshakes need below the protocol layer, apart from the
//! group itself:
//!
//! - **keys** — secret scalar generation with clamping, public keys and
//!   keypairs.
//! - **codec** — canonical encodings of labels, integers and points for
//!   hashing.
//! - **hash** — the raw digest, the tweak (digest as integer) and
//!   commitments.
//!
//! None of this is novel cryptography. It is a thin, typed layer over
//! `curve25519-dalek` and `sha2` whose only job is to make both roles feed
//! exactly the same bytes into exactly the same functions.

pub mod codec;
pub mod hash;
pub mod keys;

pub use codec::{encode_operands, Operand};
pub use hash::{commit, hash_raw, hash_scalar, tweak, verify_commitment, Digest, Tweak};
pub use keys::{Keypair, KeyError, PublicKey, SecretScalar};
