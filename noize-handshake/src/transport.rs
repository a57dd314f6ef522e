use core::fmt;

use crate::MAX_MESSAGE_LEN;
use crate::cipher_state::CipherState;
use crate::crypto::hash::HashOutput;
use crate::error::Error;
use crate::handshake::Role;

/// Post-handshake transport encryption state.
///
/// Holds the two CipherStates from `Split()`: `c1` encrypts
/// initiator-to-responder traffic, `c2` responder-to-initiator. Which one
/// sends depends on this side's role.
pub struct Transport {
    role: Role,
    initiator_to_responder: CipherState,
    responder_to_initiator: CipherState,
    handshake_hash: HashOutput,
}

impl Transport {
    pub(crate) fn new(
        role: Role,
        c1: CipherState,
        c2: CipherState,
        handshake_hash: HashOutput,
    ) -> Self {
        Self {
            role,
            initiator_to_responder: c1,
            responder_to_initiator: c2,
            handshake_hash,
        }
    }

    /// The final handshake hash, a channel binding value.
    ///
    /// Both sides will have the same value after a successful handshake.
    pub fn handshake_hash(&self) -> &HashOutput {
        &self.handshake_hash
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn initiator_to_responder(&self) -> &CipherState {
        &self.initiator_to_responder
    }

    pub fn responder_to_initiator(&self) -> &CipherState {
        &self.responder_to_initiator
    }

    fn send(&mut self) -> &mut CipherState {
        match self.role {
            Role::Initiator => &mut self.initiator_to_responder,
            Role::Responder => &mut self.responder_to_initiator,
        }
    }

    fn recv(&mut self) -> &mut CipherState {
        match self.role {
            Role::Initiator => &mut self.responder_to_initiator,
            Role::Responder => &mut self.initiator_to_responder,
        }
    }

    /// Encrypt a payload for sending to the peer.
    ///
    /// Returns the number of bytes written to `out` (payload + AEAD tag).
    pub fn write_message(&mut self, payload: &[u8], out: &mut [u8]) -> Result<usize, Error> {
        let overhead = self.send().overhead();
        if payload.len() + overhead > MAX_MESSAGE_LEN {
            return Err(Error::MessageTooLarge);
        }
        self.send().encrypt_with_ad(&[], payload, out)
    }

    /// Decrypt a message received from the peer.
    ///
    /// Returns the number of plaintext bytes written to `out`.
    pub fn read_message(&mut self, message: &[u8], out: &mut [u8]) -> Result<usize, Error> {
        if message.len() > MAX_MESSAGE_LEN {
            return Err(Error::MessageTooLarge);
        }
        self.recv().decrypt_with_ad(&[], message, out)
    }

    /// Nonce of the next outgoing message.
    pub fn sending_nonce(&self) -> u64 {
        match self.role {
            Role::Initiator => self.initiator_to_responder.nonce(),
            Role::Responder => self.responder_to_initiator.nonce(),
        }
    }

    /// Nonce the next incoming message is expected to use.
    pub fn receiving_nonce(&self) -> u64 {
        match self.role {
            Role::Initiator => self.responder_to_initiator.nonce(),
            Role::Responder => self.initiator_to_responder.nonce(),
        }
    }

    /// Set the receiving nonce, for transports that may reorder or drop
    /// messages and carry the nonce out of band.
    pub fn set_receiving_nonce(&mut self, nonce: u64) {
        self.recv().set_nonce(nonce);
    }

    /// Replace the sending key with `REKEY(k)`.
    pub fn rekey_send(&mut self) -> Result<(), Error> {
        self.send().rekey()
    }

    /// Replace the receiving key with `REKEY(k)`.
    pub fn rekey_recv(&mut self) -> Result<(), Error> {
        self.recv().rekey()
    }

    /// Split into independent `(send, recv)` ciphers, e.g. to move each
    /// direction to its own task.
    pub fn into_ciphers(self) -> (CipherState, CipherState) {
        let Self {
            role,
            initiator_to_responder,
            responder_to_initiator,
            ..
        } = self;
        match role {
            Role::Initiator => (initiator_to_responder, responder_to_initiator),
            Role::Responder => (responder_to_initiator, initiator_to_responder),
        }
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("role", &self.role)
            .field("sending_nonce", &self.sending_nonce())
            .field("receiving_nonce", &self.receiving_nonce())
            .finish_non_exhaustive()
    }
}
