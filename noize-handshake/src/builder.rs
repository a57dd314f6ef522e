use crate::error::Error;
use crate::handshake::{HandshakeState, Role};
use crate::keys::{KeyPair, PublicKey};
use crate::protocol::Protocol;

/// Builder for [`HandshakeState`].
///
/// # Example
///
/// ```rust
/// use noize_handshake::{HandshakeBuilder, KeyPair};
/// use rand_core::OsRng;
///
/// let server = KeyPair::generate(&mut OsRng);
/// let server_public = server.public;
///
/// let initiator = HandshakeBuilder::new("Noise_NK_25519_ChaChaPoly_SHA256".parse()?)
///     .with_remote_static(server_public)
///     .build_initiator()?;
///
/// let responder = HandshakeBuilder::new("Noise_NK_25519_ChaChaPoly_SHA256".parse()?)
///     .with_local_static(server)
///     .build_responder()?;
/// # let _ = (initiator, responder);
/// # Ok::<(), noize_handshake::Error>(())
/// ```
#[derive(Debug)]
pub struct HandshakeBuilder {
    protocol: Protocol,
    prologue: Option<Vec<u8>>,
    local_static: Option<KeyPair>,
    local_ephemeral: Option<KeyPair>,
    remote_static: Option<PublicKey>,
    remote_ephemeral: Option<PublicKey>,
}

impl HandshakeBuilder {
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            prologue: None,
            local_static: None,
            local_ephemeral: None,
            remote_static: None,
            remote_ephemeral: None,
        }
    }

    /// Set the prologue. Both sides must use the same one for the handshake
    /// to succeed.
    pub fn with_prologue(mut self, prologue: Vec<u8>) -> Self {
        self.prologue = Some(prologue);
        self
    }

    /// Set our static key pair.
    pub fn with_local_static(mut self, keypair: KeyPair) -> Self {
        self.local_static = Some(keypair);
        self
    }

    /// Use a fixed ephemeral key pair instead of generating one. Only for
    /// test vectors; reusing an ephemeral breaks forward secrecy.
    pub fn with_local_ephemeral(mut self, keypair: KeyPair) -> Self {
        self.local_ephemeral = Some(keypair);
        self
    }

    /// Set the peer's static public key, when known in advance.
    pub fn with_remote_static(mut self, public: PublicKey) -> Self {
        self.remote_static = Some(public);
        self
    }

    /// Set the peer's ephemeral public key for an `e` pre-message.
    ///
    /// None of the built-in patterns has one, so this only matters to the
    /// pre-message check; a later `e` read replaces the key.
    pub fn with_remote_ephemeral(mut self, public: PublicKey) -> Self {
        self.remote_ephemeral = Some(public);
        self
    }

    pub fn build_initiator(self) -> Result<HandshakeState, Error> {
        self.build(Role::Initiator)
    }

    pub fn build_responder(self) -> Result<HandshakeState, Error> {
        self.build(Role::Responder)
    }

    /// Build the handshake, mixing the prologue and any pre-message keys.
    ///
    /// Fails with `MissingKeyMaterial` if the pattern's pre-messages need a
    /// key that was not provided.
    pub fn build(self, role: Role) -> Result<HandshakeState, Error> {
        let prologue = self.prologue.unwrap_or_default();
        HandshakeState::new(
            self.protocol,
            role,
            &prologue,
            self.local_static,
            self.local_ephemeral,
            self.remote_static,
            self.remote_ephemeral,
        )
    }
}
