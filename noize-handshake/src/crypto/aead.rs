use chacha20poly1305::aead::{AeadInPlace, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce, Tag};
use zeroize::Zeroizing;

use crate::error::Error;

pub const AEAD_KEY_LEN: usize = 32;
pub const AEAD_TAG_LEN: usize = 16;
pub const AEAD_NONCE_LEN: usize = 12;

/// Cipher functions selectable through the protocol name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CipherKind {
    /// ChaCha20-Poly1305 (`ChaChaPoly`).
    #[default]
    ChaChaPoly,
}

impl CipherKind {
    /// Look up a cipher by its protocol-name component.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ChaChaPoly" => Some(Self::ChaChaPoly),
            _ => None,
        }
    }

    /// The protocol-name component for this cipher.
    pub fn name(self) -> &'static str {
        match self {
            Self::ChaChaPoly => "ChaChaPoly",
        }
    }

    /// The 96-bit AEAD nonce for counter `n`.
    ///
    /// ChaChaPoly: 32 bits of zeros, then `n` little-endian.
    fn nonce(self, n: u64) -> Nonce {
        match self {
            Self::ChaChaPoly => {
                let mut nonce = [0u8; AEAD_NONCE_LEN];
                nonce[4..].copy_from_slice(&n.to_le_bytes());
                Nonce::from(nonce)
            }
        }
    }

    /// `ENCRYPT(k, n, ad, plaintext)`, writing `ciphertext || tag` to `out`.
    ///
    /// Returns the number of bytes written.
    pub fn encrypt(
        self,
        key: &[u8; AEAD_KEY_LEN],
        n: u64,
        ad: &[u8],
        plaintext: &[u8],
        out: &mut [u8],
    ) -> Result<usize, Error> {
        let len = plaintext.len();
        if out.len() < len + AEAD_TAG_LEN {
            return Err(Error::BufferTooSmall);
        }
        let (body, rest) = out.split_at_mut(len);
        body.copy_from_slice(plaintext);

        let tag = match self {
            Self::ChaChaPoly => ChaCha20Poly1305::new(key.into())
                .encrypt_in_place_detached(&self.nonce(n), ad, body)
                .map_err(|_| Error::MessageTooLarge)?,
        };
        rest[..AEAD_TAG_LEN].copy_from_slice(&tag);
        Ok(len + AEAD_TAG_LEN)
    }

    /// `DECRYPT(k, n, ad, ciphertext)`, writing the plaintext to `out`.
    ///
    /// The tag is checked before anything is decrypted into `out`.
    pub fn decrypt(
        self,
        key: &[u8; AEAD_KEY_LEN],
        n: u64,
        ad: &[u8],
        ciphertext: &[u8],
        out: &mut [u8],
    ) -> Result<usize, Error> {
        let Some(len) = ciphertext.len().checked_sub(AEAD_TAG_LEN) else {
            return Err(Error::MalformedMessage);
        };
        if out.len() < len {
            return Err(Error::BufferTooSmall);
        }
        let (body, tag) = ciphertext.split_at(len);
        out[..len].copy_from_slice(body);

        match self {
            Self::ChaChaPoly => ChaCha20Poly1305::new(key.into())
                .decrypt_in_place_detached(
                    &self.nonce(n),
                    ad,
                    &mut out[..len],
                    Tag::from_slice(tag),
                )
                .map_err(|_| Error::AuthenticationFailure)?,
        }
        Ok(len)
    }

    /// `REKEY(k)`: encrypt 32 zero bytes at nonce 2^64-1 and keep the first
    /// 32 bytes of the ciphertext.
    pub fn rekey(self, key: &[u8; AEAD_KEY_LEN]) -> Result<[u8; AEAD_KEY_LEN], Error> {
        let mut sealed = Zeroizing::new([0u8; AEAD_KEY_LEN + AEAD_TAG_LEN]);
        self.encrypt(key, u64::MAX, &[], &[0u8; AEAD_KEY_LEN], &mut sealed[..])?;
        let mut new_key = [0u8; AEAD_KEY_LEN];
        new_key.copy_from_slice(&sealed[..AEAD_KEY_LEN]);
        Ok(new_key)
    }
}
