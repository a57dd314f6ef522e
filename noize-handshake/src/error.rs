use thiserror::Error;

use crate::pattern::Token;

/// Errors that can occur during the Noise handshake or transport phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// A token or pre-message required a key pair or public key that is absent.
    #[error("missing key material for {0} token")]
    MissingKeyMaterial(Token),

    /// AEAD tag verification failed. Nonce and transcript are left untouched.
    #[error("authentication failure")]
    AuthenticationFailure,

    /// The nonce counter reached its limit; the cipher must be discarded.
    #[error("nonce counter exhausted")]
    NonceOverflow,

    /// An input had the wrong length.
    #[error("invalid {what} length: expected {expected}, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An argument was outside the accepted range.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// `write_message`/`read_message` was called after the handshake completed.
    #[error("no pending handshake message")]
    NoPendingMessage,

    /// The operation belongs to the peer's turn.
    #[error("operation out of turn")]
    OutOfTurn,

    /// The provided output buffer is too small.
    #[error("output buffer too small")]
    BufferTooSmall,

    /// The message is truncated or otherwise malformed.
    #[error("malformed message")]
    MalformedMessage,

    /// The message would exceed the Noise maximum of 65535 bytes.
    #[error("message exceeds {} bytes", crate::MAX_MESSAGE_LEN)]
    MessageTooLarge,

    /// A DH produced the all-zero output (low-order public key).
    #[error("invalid public key")]
    InvalidPublicKey,

    /// The protocol name is not of the form `Noise_<pattern>_<dh>_<cipher>_<hash>`.
    #[error("invalid protocol name")]
    InvalidProtocolName,

    /// The handshake pattern in the protocol name is not known.
    #[error("unsupported handshake pattern")]
    UnsupportedPattern,
}
