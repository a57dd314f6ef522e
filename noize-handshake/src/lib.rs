#![deny(unsafe_code)]

//! # noize-handshake
//!
//! A pure, sans-IO implementation of the Noise Protocol Framework: the
//! one-way and fundamental interactive handshake patterns over X25519,
//! ChaChaPoly and SHA-256/SHA-512/BLAKE2s/BLAKE2b.
//!
//! ```rust
//! use noize_handshake::{HandshakeBuilder, KeyPair};
//! use rand_core::OsRng;
//!
//! let protocol: noize_handshake::Protocol = "Noise_XN_25519_ChaChaPoly_SHA256".parse()?;
//! let mut alice = HandshakeBuilder::new(protocol.clone())
//!     .with_local_static(KeyPair::generate(&mut OsRng))
//!     .build_initiator()?;
//! let mut bob = HandshakeBuilder::new(protocol).build_responder()?;
//!
//! let (mut msg, mut payload) = ([0u8; 1024], [0u8; 1024]);
//! let len = alice.write_message(b"Hello", &mut msg)?.len;
//! bob.read_message(&msg[..len], &mut payload)?;
//! let len = bob.write_message(b"Hi", &mut msg)?.len;
//! alice.read_message(&msg[..len], &mut payload)?;
//! let out = alice.write_message(b"Bye", &mut msg)?;
//! let bob_out = bob.read_message(&msg[..out.len], &mut payload)?;
//!
//! assert!(out.transport.is_some() && bob_out.transport.is_some());
//! assert_eq!(alice.handshake_hash(), bob.handshake_hash());
//! # Ok::<(), noize_handshake::Error>(())
//! ```
//!
//! ## Security Properties
//!
//! - X25519 low-order point rejection
//! - All key material zeroized on drop
//! - Constant-time comparison of hash outputs
//! - No panics on network input

pub mod crypto;
pub mod error;
pub mod keys;
pub mod pattern;
pub mod protocol;

mod builder;
mod cipher_state;
mod handshake;
mod symmetric_state;
mod transport;

/// Maximum size of any Noise message, handshake or transport.
pub const MAX_MESSAGE_LEN: usize = 65535;

// Re-export the primary public API
pub use builder::HandshakeBuilder;
pub use cipher_state::CipherState;
pub use crypto::aead::CipherKind;
pub use crypto::dh::DhKind;
pub use crypto::hash::{HashKind, HashOutput};
pub use error::Error;
pub use handshake::{HandshakeAction, HandshakeOutput, HandshakeState, Role};
pub use keys::{KeyPair, PublicKey, SecretKey};
pub use pattern::{HandshakePattern, Token};
pub use protocol::{Protocol, Suite};
pub use symmetric_state::SymmetricState;
pub use transport::Transport;
