use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher_state::CipherState;
use crate::crypto::aead::{AEAD_KEY_LEN, CipherKind};
use crate::crypto::hash::HashOutput;
use crate::error::Error;
use crate::protocol::Suite;

/// Noise SymmetricState: the chaining key, the handshake hash and the
/// CipherState keyed from them.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricState {
    #[zeroize(skip)]
    suite: Suite,
    cipher: CipherState,
    /// Chaining key (ck), mixed with DH outputs via HKDF.
    ck: HashOutput,
    /// Handshake hash (h), accumulates all handshake data.
    h: HashOutput,
}

impl SymmetricState {
    /// Initialize from the protocol name.
    ///
    /// A name of at most `HASHLEN` bytes is zero-padded, a longer one is hashed.
    pub fn initialize(protocol_name: &str, suite: Suite) -> Self {
        let name_bytes = protocol_name.as_bytes();
        let hash_len = suite.hash.hash_len();
        let h = if name_bytes.len() <= hash_len {
            HashOutput::zero_padded(name_bytes, hash_len)
        } else {
            suite.hash.hash(&[name_bytes])
        };

        Self {
            suite,
            cipher: CipherState::empty(suite.cipher),
            ck: h.clone(),
            h,
        }
    }

    /// HKDF over the suite's hash, with Noise's input restrictions:
    /// `chaining_key` must be `HASHLEN` bytes and `input_key_material` either
    /// empty or `DHLEN` bytes.
    pub fn hkdf(
        &self,
        chaining_key: &[u8],
        input_key_material: &[u8],
        num_outputs: usize,
    ) -> Result<Vec<HashOutput>, Error> {
        let hash_len = self.suite.hash.hash_len();
        if chaining_key.len() != hash_len {
            return Err(Error::InvalidLength {
                what: "chaining key",
                expected: hash_len,
                actual: chaining_key.len(),
            });
        }
        let dh_len = self.suite.dh.dh_len();
        if !input_key_material.is_empty() && input_key_material.len() != dh_len {
            return Err(Error::InvalidLength {
                what: "input key material",
                expected: dh_len,
                actual: input_key_material.len(),
            });
        }
        self.suite
            .hash
            .hkdf(chaining_key, input_key_material, num_outputs)
    }

    fn hkdf_from_ck<const N: usize>(
        &self,
        input_key_material: &[u8],
    ) -> Result<[HashOutput; N], Error> {
        self.hkdf(self.ck.as_bytes(), input_key_material, N)?
            .try_into()
            .map_err(|_| Error::InvalidArgument("hkdf returned an unexpected number of outputs"))
    }

    /// `(ck, temp_k) = HKDF(ck, input_key_material, 2)`, then rekey the cipher
    /// with `temp_k`.
    pub fn mix_key(&mut self, input_key_material: &[u8]) -> Result<(), Error> {
        let [ck, temp_k] = self.hkdf_from_ck::<2>(input_key_material)?;
        self.ck = ck;
        self.cipher = cipher_from(self.suite.cipher, &temp_k);
        Ok(())
    }

    /// `h = HASH(h || data)`
    pub fn mix_hash(&mut self, data: &[u8]) {
        self.h = self.suite.hash.hash(&[self.h.as_bytes(), data]);
    }

    /// `(ck, temp_h, temp_k) = HKDF(ck, input_key_material, 3)`, then
    /// `mix_hash(temp_h)` and rekey the cipher with `temp_k`.
    pub fn mix_key_and_hash(&mut self, input_key_material: &[u8]) -> Result<(), Error> {
        let [ck, temp_h, temp_k] = self.hkdf_from_ck::<3>(input_key_material)?;
        self.ck = ck;
        self.mix_hash(temp_h.as_bytes());
        self.cipher = cipher_from(self.suite.cipher, &temp_k);
        Ok(())
    }

    /// Encrypt plaintext with `h` as associated data, then mix the ciphertext
    /// into the hash. Returns the number of bytes written to `out`.
    pub fn encrypt_and_hash(&mut self, plaintext: &[u8], out: &mut [u8]) -> Result<usize, Error> {
        let len = self.cipher.encrypt_with_ad(self.h.as_bytes(), plaintext, out)?;
        self.mix_hash(&out[..len]);
        Ok(len)
    }

    /// Decrypt ciphertext with `h` as associated data, then mix the
    /// ciphertext (not the plaintext) into the hash.
    ///
    /// The hash is left untouched if decryption fails.
    pub fn decrypt_and_hash(&mut self, ciphertext: &[u8], out: &mut [u8]) -> Result<usize, Error> {
        let len = self
            .cipher
            .decrypt_with_ad(self.h.as_bytes(), ciphertext, out)?;
        self.mix_hash(ciphertext);
        Ok(len)
    }

    /// `(temp_k1, temp_k2) = HKDF(ck, "", 2)`, one fresh CipherState each.
    pub fn split(&self) -> Result<(CipherState, CipherState), Error> {
        let [temp_k1, temp_k2] = self.hkdf_from_ck::<2>(&[])?;
        let cipher = self.suite.cipher;
        Ok((cipher_from(cipher, &temp_k1), cipher_from(cipher, &temp_k2)))
    }

    /// The current handshake hash.
    pub fn handshake_hash(&self) -> &HashOutput {
        &self.h
    }

    /// The current chaining key.
    pub fn chaining_key(&self) -> &HashOutput {
        &self.ck
    }

    pub fn suite(&self) -> Suite {
        self.suite
    }

    /// Whether the embedded cipher has a key yet.
    pub fn has_key(&self) -> bool {
        self.cipher.has_key()
    }

    /// The current encryption overhead.
    pub fn overhead(&self) -> usize {
        self.cipher.overhead()
    }
}

/// Key a fresh CipherState from an HKDF output, truncated to 32 bytes for
/// 64-byte hash functions.
fn cipher_from(cipher: CipherKind, temp_k: &HashOutput) -> CipherState {
    let mut key = [0u8; AEAD_KEY_LEN];
    key.copy_from_slice(&temp_k.as_bytes()[..AEAD_KEY_LEN]);
    let state = CipherState::new(cipher, key);
    key.zeroize();
    state
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use sha2::{Digest, Sha256};

    use super::*;
    use crate::crypto::aead::AEAD_TAG_LEN;
    use crate::crypto::hash::HashKind;

    const XN: &str = "Noise_XN_25519_ChaChaPoly_SHA256";

    fn sha256(data: &[u8]) -> Vec<u8> {
        Sha256::digest(data).to_vec()
    }

    fn rustcrypto_hkdf(ck: &[u8], ikm: &[u8]) -> [u8; 64] {
        let mut okm = [0u8; 64];
        hkdf::Hkdf::<Sha256>::new(Some(ck), ikm)
            .expand(&[], &mut okm)
            .unwrap();
        okm
    }

    #[test]
    fn name_of_exactly_hashlen_is_used_verbatim() {
        assert_eq!(XN.len(), 32);
        let ss = SymmetricState::initialize(XN, Suite::default());
        assert_eq!(ss.handshake_hash().as_bytes(), XN.as_bytes());
        assert_eq!(ss.chaining_key(), ss.handshake_hash());
        assert!(!ss.has_key());
    }

    #[test]
    fn longer_name_is_hashed() {
        let name = "Noise_XXfallback_25519_ChaChaPoly_SHA256";
        let ss = SymmetricState::initialize(name, Suite::default());
        assert_eq!(ss.handshake_hash().as_bytes(), sha256(name.as_bytes()));
    }

    #[test]
    fn shorter_name_is_zero_padded() {
        let name = "Noise_x_x_x_SHA256";
        let ss = SymmetricState::initialize(name, Suite::default());
        let mut expected = name.as_bytes().to_vec();
        expected.resize(32, 0);
        assert_eq!(ss.handshake_hash().as_bytes(), expected);
    }

    #[test]
    fn padding_follows_hash_length() {
        let suite = Suite {
            hash: HashKind::Sha512,
            ..Suite::default()
        };
        let ss = SymmetricState::initialize("Noise_XN_25519_ChaChaPoly_SHA512", suite);
        assert_eq!(ss.handshake_hash().len(), 64);
        assert_eq!(ss.chaining_key().len(), 64);
    }

    #[test]
    fn mix_hash_appends_and_rehashes() {
        let mut ss = SymmetricState::initialize(XN, Suite::default());
        ss.mix_hash(&[0x01u8; 32]);

        let mut input = XN.as_bytes().to_vec();
        input.extend_from_slice(&[0x01u8; 32]);
        assert_eq!(ss.handshake_hash().as_bytes(), sha256(&input));
    }

    #[test]
    fn mix_key_matches_rfc5869_hkdf() {
        let mut ss = SymmetricState::initialize(XN, Suite::default());
        let ck_before = ss.chaining_key().as_bytes().to_vec();
        let ikm = [0x77u8; 32];
        ss.mix_key(&ikm).unwrap();

        let okm = rustcrypto_hkdf(&ck_before, &ikm);
        assert_eq!(ss.chaining_key().as_bytes(), &okm[..32]);
        assert!(ss.has_key());
        assert_eq!(ss.overhead(), AEAD_TAG_LEN);
    }

    #[test]
    fn hkdf_outputs_match_rustcrypto() {
        let ss = SymmetricState::initialize(XN, Suite::default());
        let ck = [0x01u8; 32];
        let ikm = [0x77u8; 32];

        let two = ss.hkdf(&ck, &ikm, 2).unwrap();
        let three = ss.hkdf(&ck, &ikm, 3).unwrap();
        let okm = rustcrypto_hkdf(&ck, &ikm);
        assert_eq!(two[0].as_bytes(), &okm[..32]);
        assert_eq!(two[1].as_bytes(), &okm[32..]);
        assert_eq!(two[..], three[..2]);
    }

    #[test]
    fn hkdf_input_validation() {
        let ss = SymmetricState::initialize(XN, Suite::default());
        assert_eq!(
            ss.hkdf(&[0u8; 31], &[], 2).unwrap_err(),
            Error::InvalidLength {
                what: "chaining key",
                expected: 32,
                actual: 31,
            }
        );
        assert_eq!(
            ss.hkdf(&[0u8; 32], &[0u8; 16], 2).unwrap_err(),
            Error::InvalidLength {
                what: "input key material",
                expected: 32,
                actual: 16,
            }
        );
        assert!(matches!(
            ss.hkdf(&[0u8; 32], &[], 4),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(ss.hkdf(&[0u8; 32], &[], 2).unwrap().len(), 2);
    }

    #[test]
    fn mix_key_rejects_odd_input_length() {
        let mut ss = SymmetricState::initialize(XN, Suite::default());
        let h_before = ss.handshake_hash().clone();
        assert!(ss.mix_key(&[0u8; 5]).is_err());
        assert!(!ss.has_key());
        assert_eq!(ss.handshake_hash(), &h_before);
    }

    #[test]
    fn mix_key_and_hash_changes_hash_and_key() {
        let mut ss = SymmetricState::initialize(XN, Suite::default());
        let h_before = ss.handshake_hash().clone();
        let ck_before = ss.chaining_key().as_bytes().to_vec();
        let psk = [0x33u8; 32];
        ss.mix_key_and_hash(&psk).unwrap();

        let outputs = HashKind::Sha256.hkdf(&ck_before, &psk, 3).unwrap();
        assert_eq!(ss.chaining_key(), &outputs[0]);
        let mut expected_h = h_before.as_bytes().to_vec();
        expected_h.extend_from_slice(outputs[1].as_bytes());
        assert_eq!(ss.handshake_hash().as_bytes(), sha256(&expected_h));
        assert!(ss.has_key());
    }

    #[test]
    fn encrypt_and_hash_without_key_is_plaintext() {
        let mut alice = SymmetricState::initialize(XN, Suite::default());
        let mut bob = SymmetricState::initialize(XN, Suite::default());
        let mut ct = [0u8; 64];
        let len = alice.encrypt_and_hash(b"Hello worlds", &mut ct).unwrap();
        assert_eq!(&ct[..len], b"Hello worlds");

        let mut pt = [0u8; 64];
        let len = bob.decrypt_and_hash(&ct[..len], &mut pt).unwrap();
        assert_eq!(&pt[..len], b"Hello worlds");
        assert_eq!(alice.handshake_hash(), bob.handshake_hash());
    }

    #[test]
    fn keyed_round_trip_binds_transcript() {
        let mut alice = SymmetricState::initialize(XN, Suite::default());
        let mut bob = SymmetricState::initialize(XN, Suite::default());
        for ss in [&mut alice, &mut bob] {
            ss.mix_hash(b"prologue");
            ss.mix_key(&[0x55u8; 32]).unwrap();
        }

        let mut ct = [0u8; 64];
        let len = alice.encrypt_and_hash(b"secret", &mut ct).unwrap();
        assert_eq!(len, 6 + AEAD_TAG_LEN);

        let mut pt = [0u8; 64];
        let pt_len = bob.decrypt_and_hash(&ct[..len], &mut pt).unwrap();
        assert_eq!(&pt[..pt_len], b"secret");
        assert_eq!(alice.handshake_hash(), bob.handshake_hash());
    }

    #[test]
    fn failed_decrypt_leaves_hash_untouched() {
        let mut alice = SymmetricState::initialize(XN, Suite::default());
        let mut bob = SymmetricState::initialize(XN, Suite::default());
        alice.mix_key(&[0x55u8; 32]).unwrap();
        bob.mix_key(&[0x55u8; 32]).unwrap();

        let mut ct = [0u8; 64];
        let len = alice.encrypt_and_hash(b"secret", &mut ct).unwrap();
        ct[len - 1] ^= 0x80;

        let h_before = bob.handshake_hash().clone();
        let mut pt = [0u8; 64];
        assert_eq!(
            bob.decrypt_and_hash(&ct[..len], &mut pt),
            Err(Error::AuthenticationFailure)
        );
        assert_eq!(bob.handshake_hash(), &h_before);

        ct[len - 1] ^= 0x80;
        bob.decrypt_and_hash(&ct[..len], &mut pt).unwrap();
        assert_eq!(alice.handshake_hash(), bob.handshake_hash());
    }

    #[test]
    fn split_gives_matching_independent_ciphers() {
        let mut alice = SymmetricState::initialize(XN, Suite::default());
        alice.mix_key(&[0x11u8; 32]).unwrap();
        let (mut a1, mut a2) = alice.split().unwrap();
        let (mut b1, mut b2) = alice.split().unwrap();

        let mut ct = [0u8; 64];
        let mut pt = [0u8; 64];
        let len = a1.encrypt_with_ad(&[], b"one", &mut ct).unwrap();
        let n = b1.decrypt_with_ad(&[], &ct[..len], &mut pt).unwrap();
        assert_eq!(&pt[..n], b"one");

        let len = a2.encrypt_with_ad(&[], b"two", &mut ct).unwrap();
        assert_eq!(
            b1.decrypt_with_ad(&[], &ct[..len], &mut pt),
            Err(Error::AuthenticationFailure)
        );
        let n = b2.decrypt_with_ad(&[], &ct[..len], &mut pt).unwrap();
        assert_eq!(&pt[..n], b"two");
    }

    #[test]
    fn sha512_keys_are_truncated() {
        let suite = Suite {
            hash: HashKind::Sha512,
            ..Suite::default()
        };
        let mut ss = SymmetricState::initialize("Noise_XN_25519_ChaChaPoly_SHA512", suite);
        ss.mix_key(&[0x11u8; 32]).unwrap();
        assert_eq!(ss.chaining_key().len(), 64);
        let (c1, c2) = ss.split().unwrap();
        assert!(c1.has_key() && c2.has_key());
    }

    #[test]
    fn transcript_is_deterministic() {
        let build = || {
            let mut ss = SymmetricState::initialize(XN, Suite::default());
            ss.mix_hash(b"prologue");
            ss.mix_key(&hex!(
                "0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f20"
            ))
            .unwrap();
            ss.mix_hash(b"payload");
            ss
        };
        let (a, b) = (build(), build());
        assert_eq!(a.handshake_hash(), b.handshake_hash());
        assert_eq!(a.chaining_key(), b.chaining_key());
    }
}
