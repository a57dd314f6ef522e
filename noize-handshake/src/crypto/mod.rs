//! Cryptographic primitives behind a Noise suite.
//!
//! - [`aead`]: ChaChaPoly1305 AEAD encryption and rekeying
//! - [`hash`]: SHA-256, SHA-512, BLAKE2s and BLAKE2b with HMAC and HKDF
//! - [`dh`]: X25519 Diffie-Hellman with low-order point rejection

pub mod aead;
pub mod dh;
pub mod hash;
