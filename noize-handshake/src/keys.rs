use rand_core::CryptoRngCore;
use x25519_dalek::{PublicKey as DalekPublicKey, StaticSecret as DalekStaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::dh::DH_LEN;
use crate::error::Error;

/// An X25519 secret key, static or ephemeral.
///
/// Zeroized from memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(DalekStaticSecret);

impl SecretKey {
    /// Create from raw 32-byte secret key material.
    pub fn from_bytes(bytes: [u8; DH_LEN]) -> Self {
        Self(DalekStaticSecret::from(bytes))
    }

    /// Export the raw 32-byte secret key material.
    pub fn to_bytes(&self) -> [u8; DH_LEN] {
        self.0.to_bytes()
    }

    pub(crate) fn inner(&self) -> &DalekStaticSecret {
        &self.0
    }
}

impl core::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

/// An X25519 public key (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Zeroize)]
pub struct PublicKey([u8; DH_LEN]);

impl PublicKey {
    /// The length of a public key in bytes.
    pub const LEN: usize = DH_LEN;

    /// Create from raw 32-byte public key.
    pub fn from_bytes(bytes: [u8; DH_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, which must be exactly [`PublicKey::LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        let key: [u8; DH_LEN] = bytes.try_into().map_err(|_| Error::InvalidLength {
            what: "public key",
            expected: DH_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(key))
    }

    /// Access the raw bytes of this public key.
    pub fn as_bytes(&self) -> &[u8; DH_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl core::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PublicKey({:02x?})", &self.0[..4])
    }
}

/// A secret key and its corresponding public key.
///
/// Build with a struct literal when both halves are already known.
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub secret: SecretKey,
    pub public: PublicKey,
}

impl KeyPair {
    /// Generate a new random keypair using the provided RNG.
    pub fn generate(rng: &mut impl CryptoRngCore) -> Self {
        let secret = DalekStaticSecret::random_from_rng(rng);
        let public = DalekPublicKey::from(&secret);
        Self {
            secret: SecretKey(secret),
            public: PublicKey(public.to_bytes()),
        }
    }

    /// Create a keypair from an existing secret, deriving the public key.
    pub fn from_secret(secret: SecretKey) -> Self {
        let public = DalekPublicKey::from(secret.inner());
        Self {
            secret,
            public: PublicKey(public.to_bytes()),
        }
    }

    /// Create a keypair from raw 32-byte secret key material.
    pub fn from_secret_bytes(bytes: [u8; DH_LEN]) -> Self {
        Self::from_secret(SecretKey::from_bytes(bytes))
    }
}
