use rand_core::CryptoRngCore;
use subtle::ConstantTimeEq;
use x25519_dalek::PublicKey as DalekPublicKey;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::Error;
use crate::keys::{KeyPair, PublicKey, SecretKey};

/// DH output and key length in bytes (X25519 = 32).
pub const DH_LEN: usize = 32;

/// Diffie-Hellman functions selectable through the protocol name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DhKind {
    /// X25519 (`25519`).
    #[default]
    X25519,
}

impl DhKind {
    /// Look up a DH function by its protocol-name component.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "25519" => Some(Self::X25519),
            _ => None,
        }
    }

    /// The protocol-name component for this DH function.
    pub fn name(self) -> &'static str {
        match self {
            Self::X25519 => "25519",
        }
    }

    /// `DHLEN`: length of public keys and DH outputs.
    pub fn dh_len(self) -> usize {
        match self {
            Self::X25519 => DH_LEN,
        }
    }

    /// Generate a new random key pair (usable as ephemeral or static).
    pub fn generate_keypair(self, rng: &mut impl CryptoRngCore) -> KeyPair {
        match self {
            Self::X25519 => KeyPair::generate(rng),
        }
    }

    /// Perform DH between a local secret and a remote public key.
    ///
    /// Returns `Error::InvalidPublicKey` if the result is the all-zeros
    /// output, which indicates a low-order remote key (RFC 7748 Section 6.1).
    pub fn dh(self, local: &SecretKey, remote: &PublicKey) -> Result<SharedSecret, Error> {
        match self {
            Self::X25519 => {
                let shared = local
                    .inner()
                    .diffie_hellman(&DalekPublicKey::from(*remote.as_bytes()));
                validate_shared_secret(shared.as_bytes())
            }
        }
    }
}

/// A shared secret resulting from a Diffie-Hellman operation.
///
/// Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; DH_LEN]);

impl core::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}

impl SharedSecret {
    /// Access the raw shared secret.
    pub fn as_bytes(&self) -> &[u8; DH_LEN] {
        &self.0
    }
}

fn validate_shared_secret(bytes: &[u8; DH_LEN]) -> Result<SharedSecret, Error> {
    let is_zero = bytes.ct_eq(&[0u8; DH_LEN]);
    if bool::from(is_zero) {
        Err(Error::InvalidPublicKey)
    } else {
        Ok(SharedSecret(*bytes))
    }
}
