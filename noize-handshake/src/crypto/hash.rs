use blake2::{Blake2b512, Blake2s256};
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::Error;

/// Largest hash output of any supported hash function (SHA-512, BLAKE2b).
pub const MAX_HASH_LEN: usize = 64;
/// Largest block length of any supported hash function (SHA-512, BLAKE2b).
pub const MAX_BLOCK_LEN: usize = 128;

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// Hash functions selectable through the protocol name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HashKind {
    #[default]
    Sha256,
    Sha512,
    Blake2s,
    Blake2b,
}

impl HashKind {
    /// Look up a hash function by its protocol-name component.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SHA256" => Some(Self::Sha256),
            "SHA512" => Some(Self::Sha512),
            "BLAKE2s" => Some(Self::Blake2s),
            "BLAKE2b" => Some(Self::Blake2b),
            _ => None,
        }
    }

    /// The protocol-name component for this hash function.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
            Self::Blake2s => "BLAKE2s",
            Self::Blake2b => "BLAKE2b",
        }
    }

    /// `HASHLEN`: output length in bytes.
    pub fn hash_len(self) -> usize {
        match self {
            Self::Sha256 | Self::Blake2s => 32,
            Self::Sha512 | Self::Blake2b => 64,
        }
    }

    /// `BLOCKLEN`: internal block length in bytes, used by HMAC.
    pub fn block_len(self) -> usize {
        match self {
            Self::Sha256 | Self::Blake2s => 64,
            Self::Sha512 | Self::Blake2b => 128,
        }
    }

    fn hasher(self) -> Hasher {
        match self {
            Self::Sha256 => Hasher::Sha256(Sha256::new()),
            Self::Sha512 => Hasher::Sha512(Sha512::new()),
            Self::Blake2s => Hasher::Blake2s(Blake2s256::new()),
            Self::Blake2b => Hasher::Blake2b(Blake2b512::new()),
        }
    }

    /// Hash the concatenation of `parts` without allocating.
    pub fn hash(self, parts: &[&[u8]]) -> HashOutput {
        let mut hasher = self.hasher();
        for part in parts {
            hasher.update(part);
        }
        hasher.finalize()
    }

    /// HMAC per [RFC 2104](https://datatracker.ietf.org/doc/html/rfc2104) over
    /// the concatenation of `parts`.
    ///
    /// Built on the plain hash rather than any keyed mode the hash offers, so
    /// BLAKE2 stays compatible with other Noise implementations.
    pub fn hmac(self, key: &[u8], parts: &[&[u8]]) -> HashOutput {
        let block_len = self.block_len();

        // Long keys are hashed down, short keys zero-extended to BLOCKLEN.
        let mut block_key = Zeroizing::new([0u8; MAX_BLOCK_LEN]);
        if key.len() > block_len {
            let digest = self.hash(&[key]);
            block_key[..digest.len()].copy_from_slice(digest.as_bytes());
        } else {
            block_key[..key.len()].copy_from_slice(key);
        }

        let mut ipad_key = Zeroizing::new([0u8; MAX_BLOCK_LEN]);
        let mut opad_key = Zeroizing::new([0u8; MAX_BLOCK_LEN]);
        for i in 0..block_len {
            ipad_key[i] = block_key[i] ^ IPAD;
            opad_key[i] = block_key[i] ^ OPAD;
        }

        let mut inner = self.hasher();
        inner.update(&ipad_key[..block_len]);
        for part in parts {
            inner.update(part);
        }
        let inner_hash = inner.finalize();

        let mut outer = self.hasher();
        outer.update(&opad_key[..block_len]);
        outer.update(inner_hash.as_bytes());
        outer.finalize()
    }

    /// HKDF extract-then-expand with empty `info`, returning `num_outputs` blocks.
    ///
    /// - `temp_key = HMAC(chaining_key, input_key_material)`
    /// - `output1 = HMAC(temp_key, 0x01)`
    /// - `output_i = HMAC(temp_key, output_{i-1} || i)`
    ///
    /// Only 2 or 3 outputs are defined; input lengths are not checked here.
    pub fn hkdf(
        self,
        chaining_key: &[u8],
        input_key_material: &[u8],
        num_outputs: usize,
    ) -> Result<Vec<HashOutput>, Error> {
        if !(2..=3).contains(&num_outputs) {
            return Err(Error::InvalidArgument("hkdf produces 2 or 3 outputs"));
        }

        let temp_key = self.hmac(chaining_key, &[input_key_material]);
        let mut outputs: Vec<HashOutput> = Vec::with_capacity(num_outputs);
        for i in 1..=num_outputs {
            let counter = [i as u8];
            let block = match outputs.last() {
                None => self.hmac(temp_key.as_bytes(), &[&counter]),
                Some(prev) => self.hmac(temp_key.as_bytes(), &[prev.as_bytes(), &counter]),
            };
            outputs.push(block);
        }
        Ok(outputs)
    }
}

enum Hasher {
    Sha256(Sha256),
    Sha512(Sha512),
    Blake2s(Blake2s256),
    Blake2b(Blake2b512),
}

impl Hasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
            Self::Blake2s(h) => h.update(data),
            Self::Blake2b(h) => h.update(data),
        }
    }

    fn finalize(self) -> HashOutput {
        match self {
            Self::Sha256(h) => HashOutput::from_slice(&h.finalize()),
            Self::Sha512(h) => HashOutput::from_slice(&h.finalize()),
            Self::Blake2s(h) => HashOutput::from_slice(&h.finalize()),
            Self::Blake2b(h) => HashOutput::from_slice(&h.finalize()),
        }
    }
}

/// A hash, HMAC or HKDF output of `HASHLEN` bytes.
///
/// Zeroized on drop. Equality is constant-time.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HashOutput {
    bytes: [u8; MAX_HASH_LEN],
    #[zeroize(skip)]
    len: usize,
}

impl HashOutput {
    /// Copy up to [`MAX_HASH_LEN`] bytes.
    pub(crate) fn from_slice(data: &[u8]) -> Self {
        let len = data.len().min(MAX_HASH_LEN);
        let mut bytes = [0u8; MAX_HASH_LEN];
        bytes[..len].copy_from_slice(&data[..len]);
        Self { bytes, len }
    }

    /// `data` zero-padded to `len` bytes. `data` must not be longer than `len`.
    pub(crate) fn zero_padded(data: &[u8], len: usize) -> Self {
        let mut out = Self::from_slice(data);
        out.len = len.min(MAX_HASH_LEN);
        out
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl AsRef<[u8]> for HashOutput {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl PartialEq for HashOutput {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.as_bytes().ct_eq(other.as_bytes()))
    }
}

impl Eq for HashOutput {}

impl core::fmt::Debug for HashOutput {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Also holds chaining keys and HKDF temp keys.
        write!(f, "HashOutput([REDACTED; {}])", self.len)
    }
}
