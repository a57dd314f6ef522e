use core::fmt;

use rand_core::{CryptoRngCore, OsRng};
use tracing::{debug, trace};
use zeroize::Zeroize;

use crate::MAX_MESSAGE_LEN;
use crate::crypto::aead::AEAD_TAG_LEN;
use crate::crypto::dh::DH_LEN;
use crate::crypto::hash::HashOutput;
use crate::error::Error;
use crate::keys::{KeyPair, PublicKey};
use crate::pattern::Token;
use crate::protocol::Protocol;
use crate::symmetric_state::SymmetricState;
use crate::transport::Transport;

/// Which side of the handshake this state plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Initiator,
    Responder,
}

/// The current action the caller must take to advance the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeAction {
    /// Call `write_message()` to produce the next handshake message.
    WriteMessage,
    /// Call `read_message()` with the peer's handshake message.
    ReadMessage,
    /// The handshake is complete.
    Complete,
}

/// Result of processing one handshake message.
#[derive(Debug)]
pub struct HandshakeOutput {
    /// Bytes written to the caller's output buffer: the message on write,
    /// the decrypted payload on read.
    pub len: usize,
    /// Set once the final message has been processed.
    pub transport: Option<Transport>,
}

/// A Noise handshake state machine, driven by the token script of its
/// [`HandshakePattern`](crate::HandshakePattern).
///
/// Built through [`HandshakeBuilder`](crate::HandshakeBuilder). Each call to
/// `write_message`/`read_message` processes exactly one message; the last one
/// yields a [`Transport`].
///
/// ```text
/// XN:
///   -> e
///   <- e, ee
///   -> s, se
/// ```
pub struct HandshakeState {
    protocol: Protocol,
    role: Role,
    symmetric: SymmetricState,
    s: Option<KeyPair>,
    e: Option<KeyPair>,
    rs: Option<PublicKey>,
    re: Option<PublicKey>,
    /// Index of the next message pattern to process.
    next_message: usize,
}

impl Drop for HandshakeState {
    fn drop(&mut self) {
        if let Some(ref mut v) = self.rs {
            v.zeroize();
        }
        if let Some(ref mut v) = self.re {
            v.zeroize();
        }
    }
}

impl HandshakeState {
    /// Mix the prologue and pre-message keys into a fresh transcript.
    pub(crate) fn new(
        protocol: Protocol,
        role: Role,
        prologue: &[u8],
        s: Option<KeyPair>,
        e: Option<KeyPair>,
        rs: Option<PublicKey>,
        re: Option<PublicKey>,
    ) -> Result<Self, Error> {
        let mut symmetric = SymmetricState::initialize(protocol.name(), protocol.suite());
        symmetric.mix_hash(prologue);

        let mut state = Self {
            protocol,
            role,
            symmetric,
            s,
            e,
            rs,
            re,
            next_message: 0,
        };

        let pattern = state.protocol.pattern();
        for &token in pattern.initiator_pre_message() {
            let key = state.pre_message_key(token, role == Role::Initiator)?;
            state.symmetric.mix_hash(key.as_bytes());
        }
        for &token in pattern.responder_pre_message() {
            let key = state.pre_message_key(token, role == Role::Responder)?;
            state.symmetric.mix_hash(key.as_bytes());
        }

        Ok(state)
    }

    /// The public key a pre-message token refers to: ours when `local`,
    /// otherwise the one we were given for the peer.
    ///
    /// The built-in patterns only pre-send `s`; the `e` arms serve any
    /// pattern table that pre-sends an ephemeral.
    fn pre_message_key(&self, token: Token, local: bool) -> Result<PublicKey, Error> {
        let key = match (token, local) {
            (Token::S, true) => self.s.as_ref().map(|kp| kp.public),
            (Token::E, true) => self.e.as_ref().map(|kp| kp.public),
            (Token::S, false) => self.rs,
            (Token::E, false) => self.re,
            _ => return Err(Error::InvalidArgument("pre-messages carry only e and s")),
        };
        key.ok_or(Error::MissingKeyMaterial(token))
    }

    /// What action the caller should take next.
    pub fn next_action(&self) -> HandshakeAction {
        if self.is_finished() {
            HandshakeAction::Complete
        } else if self.is_my_turn() {
            HandshakeAction::WriteMessage
        } else {
            HandshakeAction::ReadMessage
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_initiator(&self) -> bool {
        self.role == Role::Initiator
    }

    /// Whether every message pattern has been processed.
    pub fn is_finished(&self) -> bool {
        self.remaining_messages() == 0
    }

    /// Number of message patterns left to process.
    pub fn remaining_messages(&self) -> usize {
        self.protocol
            .pattern()
            .message_patterns()
            .len()
            .saturating_sub(self.next_message)
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// The current handshake hash. After completion this is the channel
    /// binding value, equal on both sides.
    pub fn handshake_hash(&self) -> &HashOutput {
        self.symmetric.handshake_hash()
    }

    /// The peer's static public key, once known.
    pub fn remote_static(&self) -> Option<&PublicKey> {
        self.rs.as_ref()
    }

    /// The peer's ephemeral public key, once received.
    pub fn remote_ephemeral(&self) -> Option<&PublicKey> {
        self.re.as_ref()
    }

    /// Bytes the next message carries beyond its payload.
    ///
    /// Returns 0 once the handshake is finished.
    pub fn next_message_overhead(&self) -> usize {
        let Some(tokens) = self.pending_tokens() else {
            return 0;
        };
        let dh_len = self.protocol.dh_len();
        let mut keyed = self.symmetric.has_key();
        let mut overhead = 0;
        for token in tokens {
            match token {
                Token::E => overhead += dh_len,
                Token::S => overhead += dh_len + if keyed { AEAD_TAG_LEN } else { 0 },
                Token::EE | Token::ES | Token::SE | Token::SS => keyed = true,
            }
        }
        if keyed {
            overhead += AEAD_TAG_LEN;
        }
        overhead
    }

    /// Write the next handshake message using the OS RNG for ephemeral keys.
    pub fn write_message(
        &mut self,
        payload: &[u8],
        out: &mut [u8],
    ) -> Result<HandshakeOutput, Error> {
        self.write_message_with_rng(payload, out, &mut OsRng)
    }

    /// Write the next handshake message with a specific RNG (useful for testing).
    ///
    /// A preset local ephemeral key is used instead of generating one.
    pub fn write_message_with_rng(
        &mut self,
        payload: &[u8],
        out: &mut [u8],
        rng: &mut impl CryptoRngCore,
    ) -> Result<HandshakeOutput, Error> {
        let tokens = self.pending_tokens().ok_or(Error::NoPendingMessage)?;
        if !self.is_my_turn() {
            return Err(Error::OutOfTurn);
        }
        let total = self
            .next_message_overhead()
            .checked_add(payload.len())
            .ok_or(Error::MessageTooLarge)?;
        if total > MAX_MESSAGE_LEN {
            return Err(Error::MessageTooLarge);
        }
        if out.len() < total {
            return Err(Error::BufferTooSmall);
        }

        let dh_len = self.protocol.dh_len();
        let mut offset = 0;
        for &token in tokens {
            trace!(%token, message = self.next_message, "write token");
            match token {
                Token::E => {
                    let dh = self.protocol.suite().dh;
                    let public = self.e.get_or_insert_with(|| dh.generate_keypair(rng)).public;
                    out[offset..offset + dh_len].copy_from_slice(public.as_bytes());
                    self.symmetric.mix_hash(public.as_bytes());
                    offset += dh_len;
                }
                Token::S => {
                    let public = self
                        .s
                        .as_ref()
                        .ok_or(Error::MissingKeyMaterial(Token::S))?
                        .public;
                    offset += self
                        .symmetric
                        .encrypt_and_hash(public.as_bytes(), &mut out[offset..])?;
                }
                dh => self.mix_dh(dh)?,
            }
        }
        offset += self
            .symmetric
            .encrypt_and_hash(payload, &mut out[offset..])?;

        let transport = self.advance()?;
        Ok(HandshakeOutput {
            len: offset,
            transport,
        })
    }

    /// Read a handshake message from the peer, writing its payload to `out`.
    ///
    /// On error the message index does not advance, but keys and hash
    /// updates from tokens processed before the failure are kept; the
    /// handshake should be abandoned.
    pub fn read_message(
        &mut self,
        message: &[u8],
        out: &mut [u8],
    ) -> Result<HandshakeOutput, Error> {
        let tokens = self.pending_tokens().ok_or(Error::NoPendingMessage)?;
        if self.is_my_turn() {
            return Err(Error::OutOfTurn);
        }
        if message.len() > MAX_MESSAGE_LEN {
            return Err(Error::MessageTooLarge);
        }
        let payload_len = message
            .len()
            .checked_sub(self.next_message_overhead())
            .ok_or(Error::MalformedMessage)?;
        if out.len() < payload_len {
            return Err(Error::BufferTooSmall);
        }

        let dh_len = self.protocol.dh_len();
        let mut rest = message;
        for &token in tokens {
            trace!(%token, message = self.next_message, "read token");
            match token {
                Token::E => {
                    let re = PublicKey::from_slice(take(&mut rest, dh_len)?)?;
                    self.symmetric.mix_hash(re.as_bytes());
                    self.re = Some(re);
                }
                Token::S => {
                    let len = dh_len + self.symmetric.overhead();
                    let ciphertext = take(&mut rest, len)?;
                    let mut rs = [0u8; DH_LEN];
                    self.symmetric.decrypt_and_hash(ciphertext, &mut rs)?;
                    self.rs = Some(PublicKey::from_bytes(rs));
                }
                dh => self.mix_dh(dh)?,
            }
        }
        let len = self.symmetric.decrypt_and_hash(rest, out)?;

        let transport = self.advance()?;
        Ok(HandshakeOutput { len, transport })
    }

    fn pending_tokens(&self) -> Option<&'static [Token]> {
        self.protocol
            .pattern()
            .message_patterns()
            .get(self.next_message)
            .copied()
    }

    /// The initiator writes even-indexed messages, the responder odd ones.
    fn is_my_turn(&self) -> bool {
        (self.next_message % 2 == 0) == self.is_initiator()
    }

    /// DH for `ee`, `es`, `se` and `ss`, mixed into the chaining key.
    fn mix_dh(&mut self, token: Token) -> Result<(), Error> {
        let (local, remote) = match (token, self.role) {
            (Token::EE, _) => (&self.e, &self.re),
            (Token::SS, _) => (&self.s, &self.rs),
            (Token::ES, Role::Initiator) | (Token::SE, Role::Responder) => (&self.e, &self.rs),
            (Token::ES, Role::Responder) | (Token::SE, Role::Initiator) => (&self.s, &self.re),
            (Token::E | Token::S, _) => return Err(Error::InvalidArgument("not a DH token")),
        };
        let (Some(local), Some(remote)) = (local, remote) else {
            return Err(Error::MissingKeyMaterial(token));
        };
        let shared = self.protocol.dh(&local.secret, remote)?;
        self.symmetric.mix_key(shared.as_bytes())
    }

    /// Move to the next message, splitting into a transport after the last.
    fn advance(&mut self) -> Result<Option<Transport>, Error> {
        if self.remaining_messages() > 1 {
            self.next_message += 1;
            return Ok(None);
        }

        let (c1, c2) = self.symmetric.split()?;
        self.next_message += 1;
        debug!(protocol = %self.protocol, role = ?self.role, "handshake complete");
        Ok(Some(Transport::new(
            self.role,
            c1,
            c2,
            self.symmetric.handshake_hash().clone(),
        )))
    }
}

impl fmt::Debug for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandshakeState")
            .field("protocol", &self.protocol.name())
            .field("role", &self.role)
            .field("next_message", &self.next_message)
            .finish_non_exhaustive()
    }
}

/// Split `len` bytes off the front of `buf`.
fn take<'a>(buf: &mut &'a [u8], len: usize) -> Result<&'a [u8], Error> {
    if buf.len() < len {
        return Err(Error::MalformedMessage);
    }
    let (head, tail) = buf.split_at(len);
    *buf = tail;
    Ok(head)
}
