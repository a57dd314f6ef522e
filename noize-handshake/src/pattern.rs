//! Handshake patterns: the token scripts that drive a Noise handshake.

use core::fmt;

/// One instruction in a handshake message pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// Ephemeral public key.
    E,
    /// Static public key, encrypted once a key is established.
    S,
    /// DH(e, re)
    EE,
    /// Initiator: DH(e, rs). Responder: DH(s, re).
    ES,
    /// Initiator: DH(s, re). Responder: DH(e, rs).
    SE,
    /// DH(s, rs)
    SS,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::E => "e",
            Self::S => "s",
            Self::EE => "ee",
            Self::ES => "es",
            Self::SE => "se",
            Self::SS => "ss",
        })
    }
}

use Token::{E, EE, ES, S, SE, SS};

/// The one-way and fundamental interactive handshake patterns.
///
/// ```text
/// XN:
///   -> e
///   <- e, ee
///   -> s, se
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakePattern {
    N,
    K,
    X,
    NN,
    NK,
    NX,
    KN,
    KK,
    KX,
    XN,
    XK,
    XX,
    IN,
    IK,
    IX,
}

impl HandshakePattern {
    pub const ALL: [Self; 15] = [
        Self::N,
        Self::K,
        Self::X,
        Self::NN,
        Self::NK,
        Self::NX,
        Self::KN,
        Self::KK,
        Self::KX,
        Self::XN,
        Self::XK,
        Self::XX,
        Self::IN,
        Self::IK,
        Self::IX,
    ];

    /// Look up a pattern by its protocol-name component.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::N => "N",
            Self::K => "K",
            Self::X => "X",
            Self::NN => "NN",
            Self::NK => "NK",
            Self::NX => "NX",
            Self::KN => "KN",
            Self::KK => "KK",
            Self::KX => "KX",
            Self::XN => "XN",
            Self::XK => "XK",
            Self::XX => "XX",
            Self::IN => "IN",
            Self::IK => "IK",
            Self::IX => "IX",
        }
    }

    /// What the responder knows about the initiator before the first message.
    pub fn initiator_pre_message(self) -> &'static [Token] {
        match self {
            Self::K | Self::KN | Self::KK | Self::KX => &[S],
            _ => &[],
        }
    }

    /// What the initiator knows about the responder before the first message.
    pub fn responder_pre_message(self) -> &'static [Token] {
        match self {
            Self::N | Self::K | Self::X | Self::NK | Self::KK | Self::XK | Self::IK => &[S],
            _ => &[],
        }
    }

    /// The message patterns, alternating initiator/responder starting with the
    /// initiator.
    pub fn message_patterns(self) -> &'static [&'static [Token]] {
        match self {
            Self::N => &[&[E, ES]],
            Self::K => &[&[E, ES, SS]],
            Self::X => &[&[E, ES, S, SS]],
            Self::NN => &[&[E], &[E, EE]],
            Self::NK => &[&[E, ES], &[E, EE]],
            Self::NX => &[&[E], &[E, EE, S, ES]],
            Self::KN => &[&[E], &[E, EE, SE]],
            Self::KK => &[&[E, ES, SS], &[E, EE, SE]],
            Self::KX => &[&[E], &[E, EE, SE, S, ES]],
            Self::XN => &[&[E], &[E, EE], &[S, SE]],
            Self::XK => &[&[E, ES], &[E, EE], &[S, SE]],
            Self::XX => &[&[E], &[E, EE, S, ES], &[S, SE]],
            Self::IN => &[&[E, S], &[E, EE, SE]],
            Self::IK => &[&[E, ES, S, SS], &[E, EE, SE]],
            Self::IX => &[&[E, S], &[E, EE, SE, S, ES]],
        }
    }

    /// One-way patterns carry a single initiator message.
    pub fn is_one_way(self) -> bool {
        matches!(self, Self::N | Self::K | Self::X)
    }
}

impl fmt::Display for HandshakePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
