//! Protocol descriptor: parses `Noise_<pattern>_<dh>_<cipher>_<hash>` into
//! a handshake pattern plus the primitives it runs on.

use core::fmt;
use core::str::FromStr;

use tracing::warn;

use crate::crypto::aead::CipherKind;
use crate::crypto::dh::{DhKind, SharedSecret};
use crate::crypto::hash::{HashKind, HashOutput};
use crate::error::Error;
use crate::keys::{PublicKey, SecretKey};
use crate::pattern::HandshakePattern;

/// The primitives a handshake runs on, fixed for its whole lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Suite {
    pub dh: DhKind,
    pub cipher: CipherKind,
    pub hash: HashKind,
}

/// A parsed Noise protocol name.
///
/// Unrecognized DH, cipher and hash components fall back to the defaults
/// (`25519`, `ChaChaPoly`, `SHA256`); the name itself is kept verbatim since
/// it is what gets mixed into the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Protocol {
    name: String,
    pattern: HandshakePattern,
    suite: Suite,
}

impl Protocol {
    /// Parse a protocol name such as `Noise_XN_25519_ChaChaPoly_SHA256`.
    pub fn parse(name: &str) -> Result<Self, Error> {
        let mut fields = name.split('_');
        let (
            Some("Noise"),
            Some(pattern),
            Some(dh),
            Some(cipher),
            Some(hash),
            None,
        ) = (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        )
        else {
            return Err(Error::InvalidProtocolName);
        };

        let pattern = HandshakePattern::from_name(pattern).ok_or(Error::UnsupportedPattern)?;
        let suite = Suite {
            dh: DhKind::from_name(dh).unwrap_or_else(|| {
                warn!(dh, "unsupported DH function, falling back to 25519");
                DhKind::default()
            }),
            cipher: CipherKind::from_name(cipher).unwrap_or_else(|| {
                warn!(cipher, "unsupported cipher, falling back to ChaChaPoly");
                CipherKind::default()
            }),
            hash: HashKind::from_name(hash).unwrap_or_else(|| {
                warn!(hash, "unsupported hash function, falling back to SHA256");
                HashKind::default()
            }),
        };

        Ok(Self {
            name: name.to_owned(),
            pattern,
            suite,
        })
    }

    /// Build a protocol from its components, producing the canonical name.
    pub fn new(pattern: HandshakePattern, suite: Suite) -> Self {
        let name = format!(
            "Noise_{}_{}_{}_{}",
            pattern.name(),
            suite.dh.name(),
            suite.cipher.name(),
            suite.hash.name()
        );
        Self {
            name,
            pattern,
            suite,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> HandshakePattern {
        self.pattern
    }

    pub fn suite(&self) -> Suite {
        self.suite
    }

    /// `HASHLEN` of the selected hash function.
    pub fn hash_len(&self) -> usize {
        self.suite.hash.hash_len()
    }

    /// `BLOCKLEN` of the selected hash function.
    pub fn block_len(&self) -> usize {
        self.suite.hash.block_len()
    }

    /// `DHLEN` of the selected DH function.
    pub fn dh_len(&self) -> usize {
        self.suite.dh.dh_len()
    }

    /// `HASH(data)` with the selected hash function.
    pub fn hash(&self, data: &[u8]) -> HashOutput {
        self.suite.hash.hash(&[data])
    }

    /// `DH(private, public)` with the selected DH function.
    pub fn dh(&self, local: &SecretKey, remote: &PublicKey) -> Result<SharedSecret, Error> {
        self.suite.dh.dh(local, remote)
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
