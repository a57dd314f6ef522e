use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::aead::{AEAD_KEY_LEN, AEAD_TAG_LEN, CipherKind};
use crate::error::Error;

/// Noise CipherState: an optional AEAD key and a nonce counter.
///
/// Without a key, encryption and decryption pass data through unchanged.
/// Each successful seal/open advances the nonce by one; a failed open
/// leaves it where it was.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct CipherState {
    #[zeroize(skip)]
    cipher: CipherKind,
    key: Option<[u8; AEAD_KEY_LEN]>,
    #[zeroize(skip)]
    nonce: u64,
}

impl CipherState {
    /// An unkeyed (pass-through) CipherState.
    pub fn empty(cipher: CipherKind) -> Self {
        Self {
            cipher,
            key: None,
            nonce: 0,
        }
    }

    /// A keyed CipherState with the nonce at zero.
    pub fn new(cipher: CipherKind, key: [u8; AEAD_KEY_LEN]) -> Self {
        Self {
            cipher,
            key: Some(key),
            nonce: 0,
        }
    }

    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    /// The nonce the next encryption or decryption will use.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Overwrite the nonce counter, for out-of-order transport messages.
    pub fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
    }

    /// The nonce after the current one is consumed.
    ///
    /// 2^64-1 is reserved for rekeying and the limit is checked after the
    /// increment, so 2^64-2 is never used either.
    fn next_nonce(&self) -> Result<u64, Error> {
        match self.nonce.checked_add(1) {
            Some(next) if next < u64::MAX => Ok(next),
            _ => Err(Error::NonceOverflow),
        }
    }

    /// Encrypt plaintext with associated data into `out`.
    ///
    /// Writes `ciphertext || tag` when keyed, or a copy of the plaintext
    /// otherwise. Returns the number of bytes written.
    pub fn encrypt_with_ad(
        &mut self,
        ad: &[u8],
        plaintext: &[u8],
        out: &mut [u8],
    ) -> Result<usize, Error> {
        let Some(key) = &self.key else {
            return pass_through(plaintext, out);
        };
        let next = self.next_nonce()?;
        let len = self.cipher.encrypt(key, self.nonce, ad, plaintext, out)?;
        self.nonce = next;
        Ok(len)
    }

    /// Decrypt `ciphertext || tag` with associated data into `out`.
    ///
    /// On `AuthenticationFailure` the nonce is not advanced, so the caller may
    /// drop the message and carry on at the same nonce. Returns the number of
    /// plaintext bytes written.
    pub fn decrypt_with_ad(
        &mut self,
        ad: &[u8],
        ciphertext: &[u8],
        out: &mut [u8],
    ) -> Result<usize, Error> {
        let Some(key) = &self.key else {
            return pass_through(ciphertext, out);
        };
        let next = self.next_nonce()?;
        let len = self.cipher.decrypt(key, self.nonce, ad, ciphertext, out)?;
        self.nonce = next;
        Ok(len)
    }

    /// Replace the key with `REKEY(k)`. Does not reset the nonce counter.
    pub fn rekey(&mut self) -> Result<(), Error> {
        if let Some(key) = &mut self.key {
            *key = self.cipher.rekey(key)?;
        }
        Ok(())
    }

    /// Bytes added by encryption: the tag when keyed, nothing otherwise.
    pub fn overhead(&self) -> usize {
        if self.has_key() { AEAD_TAG_LEN } else { 0 }
    }
}

fn pass_through(data: &[u8], out: &mut [u8]) -> Result<usize, Error> {
    let out = out.get_mut(..data.len()).ok_or(Error::BufferTooSmall)?;
    out.copy_from_slice(data);
    Ok(data.len())
}

impl core::fmt::Debug for CipherState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CipherState")
            .field("cipher", &self.cipher)
            .field("has_key", &self.has_key())
            .field("nonce", &self.nonce)
            .finish()
    }
}
