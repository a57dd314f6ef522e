//! Interoperability tests against the `snow` crate.
//!
//! Drives mixed handshakes (one side noize, the other snow) for a spread of
//! patterns and hash functions, then checks both transport directions.

use noize_handshake::{
    HandshakeAction, HandshakeBuilder, HandshakePattern, HandshakeState, KeyPair, Protocol,
    PublicKey, Token, Transport,
};
use rand::RngCore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Generate random 32-byte private key material.
fn random_private_key() -> [u8; 32] {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Which static keys each side needs for a pattern.
struct KeyNeeds {
    initiator_static: bool,
    responder_static: bool,
    initiator_knows_rs: bool,
    responder_knows_rs: bool,
}

fn key_needs(pattern: HandshakePattern) -> KeyNeeds {
    let sends_s = |parity: usize| {
        pattern
            .message_patterns()
            .iter()
            .enumerate()
            .any(|(i, tokens)| i % 2 == parity && tokens.contains(&Token::S))
    };
    let responder_pre = pattern.responder_pre_message().contains(&Token::S);
    let initiator_pre = pattern.initiator_pre_message().contains(&Token::S);
    KeyNeeds {
        initiator_static: initiator_pre || sends_s(0),
        responder_static: responder_pre || sends_s(1),
        initiator_knows_rs: responder_pre,
        responder_knows_rs: initiator_pre,
    }
}

/// Static keys for both sides, as raw private bytes.
struct Keys {
    initiator: [u8; 32],
    responder: [u8; 32],
}

impl Keys {
    fn random() -> Self {
        Self {
            initiator: random_private_key(),
            responder: random_private_key(),
        }
    }

    fn initiator_public(&self) -> PublicKey {
        KeyPair::from_secret_bytes(self.initiator).public
    }

    fn responder_public(&self) -> PublicKey {
        KeyPair::from_secret_bytes(self.responder).public
    }
}

fn build_noize(name: &str, keys: &Keys, initiator: bool) -> HandshakeState {
    let protocol: Protocol = name.parse().unwrap();
    let needs = key_needs(protocol.pattern());
    let mut builder = HandshakeBuilder::new(protocol).with_prologue(b"interop".to_vec());
    if initiator {
        if needs.initiator_static {
            builder = builder.with_local_static(KeyPair::from_secret_bytes(keys.initiator));
        }
        if needs.initiator_knows_rs {
            builder = builder.with_remote_static(keys.responder_public());
        }
        builder.build_initiator().unwrap()
    } else {
        if needs.responder_static {
            builder = builder.with_local_static(KeyPair::from_secret_bytes(keys.responder));
        }
        if needs.responder_knows_rs {
            builder = builder.with_remote_static(keys.initiator_public());
        }
        builder.build_responder().unwrap()
    }
}

fn build_snow(name: &str, keys: &Keys, initiator: bool) -> snow::HandshakeState {
    let needs = key_needs(name.parse::<Protocol>().unwrap().pattern());
    let responder_public = keys.responder_public();
    let initiator_public = keys.initiator_public();
    let mut builder = snow::Builder::new(name.parse().unwrap())
        .prologue(b"interop")
        .unwrap();
    if initiator {
        if needs.initiator_static {
            builder = builder.local_private_key(&keys.initiator).unwrap();
        }
        if needs.initiator_knows_rs {
            builder = builder
                .remote_public_key(responder_public.as_bytes())
                .unwrap();
        }
        builder.build_initiator().unwrap()
    } else {
        if needs.responder_static {
            builder = builder.local_private_key(&keys.responder).unwrap();
        }
        if needs.responder_knows_rs {
            builder = builder
                .remote_public_key(initiator_public.as_bytes())
                .unwrap();
        }
        builder.build_responder().unwrap()
    }
}

/// Run a handshake where noize plays `noize_initiator`'s role and snow the
/// other, returning the noize transport and snow transport.
fn mixed_handshake(name: &str, noize_initiator: bool) -> (Transport, snow::TransportState) {
    let keys = Keys::random();
    let mut noize = build_noize(name, &keys, noize_initiator);
    let mut snow = build_snow(name, &keys, !noize_initiator);

    let mut buf = vec![0u8; 65535];
    let mut payload_buf = vec![0u8; 65535];
    let mut transport = None;
    let num_messages = noize.remaining_messages();

    for i in 0..num_messages {
        let payload = format!("handshake payload #{i}");
        if noize.next_action() == HandshakeAction::WriteMessage {
            let out = noize.write_message(payload.as_bytes(), &mut buf).unwrap();
            let plen = snow
                .read_message(&buf[..out.len], &mut payload_buf)
                .unwrap();
            assert_eq!(&payload_buf[..plen], payload.as_bytes(), "{name}");
            transport = out.transport.or(transport);
        } else {
            assert_eq!(noize.next_action(), HandshakeAction::ReadMessage);
            let len = snow.write_message(payload.as_bytes(), &mut buf).unwrap();
            let out = noize.read_message(&buf[..len], &mut payload_buf).unwrap();
            assert_eq!(&payload_buf[..out.len], payload.as_bytes(), "{name}");
            transport = out.transport.or(transport);
        }
    }

    assert_eq!(noize.next_action(), HandshakeAction::Complete);
    assert!(snow.is_handshake_finished());
    assert_eq!(
        noize.handshake_hash().as_bytes(),
        snow.get_handshake_hash(),
        "{name}"
    );

    (transport.unwrap(), snow.into_transport_mode().unwrap())
}

/// Exchange transport messages in both directions (only initiator to
/// responder for one-way patterns).
fn check_transport(
    name: &str,
    noize: &mut Transport,
    snow: &mut snow::TransportState,
    noize_initiator: bool,
) {
    let one_way = name.parse::<Protocol>().unwrap().pattern().is_one_way();
    let mut buf = vec![0u8; 65535];
    let mut payload_buf = vec![0u8; 65535];

    for i in 0..5 {
        if noize_initiator || !one_way {
            let msg = format!("noize message #{i}");
            let len = noize.write_message(msg.as_bytes(), &mut buf).unwrap();
            let plen = snow.read_message(&buf[..len], &mut payload_buf).unwrap();
            assert_eq!(&payload_buf[..plen], msg.as_bytes(), "{name}");
        }

        if !noize_initiator || !one_way {
            let msg = format!("snow message #{i}");
            let len = snow.write_message(msg.as_bytes(), &mut buf).unwrap();
            let plen = noize.read_message(&buf[..len], &mut payload_buf).unwrap();
            assert_eq!(&payload_buf[..plen], msg.as_bytes(), "{name}");
        }
    }
}

fn interop(name: &str) {
    for noize_initiator in [true, false] {
        let (mut noize, mut snow) = mixed_handshake(name, noize_initiator);
        check_transport(name, &mut noize, &mut snow, noize_initiator);
    }
}

// ===========================================================================
// Patterns
// ===========================================================================

#[test]
fn xn_sha256() {
    interop("Noise_XN_25519_ChaChaPoly_SHA256");
}

#[test]
fn xx_blake2s() {
    interop("Noise_XX_25519_ChaChaPoly_BLAKE2s");
}

#[test]
fn ik_blake2b() {
    interop("Noise_IK_25519_ChaChaPoly_BLAKE2b");
}

#[test]
fn nk_sha512() {
    interop("Noise_NK_25519_ChaChaPoly_SHA512");
}

#[test]
fn kk_sha256() {
    interop("Noise_KK_25519_ChaChaPoly_SHA256");
}

#[test]
fn one_way_patterns() {
    for name in [
        "Noise_N_25519_ChaChaPoly_BLAKE2s",
        "Noise_K_25519_ChaChaPoly_SHA256",
        "Noise_X_25519_ChaChaPoly_SHA512",
    ] {
        interop(name);
    }
}

#[test]
fn every_pattern_sha256() {
    for pattern in HandshakePattern::ALL {
        interop(&format!("Noise_{pattern}_25519_ChaChaPoly_SHA256"));
    }
}

// ===========================================================================
// Rekey
// ===========================================================================

#[test]
fn rekey_matches_snow() {
    let name = "Noise_NN_25519_ChaChaPoly_SHA256";
    let (mut noize, mut snow) = mixed_handshake(name, true);
    let mut buf = vec![0u8; 1024];
    let mut payload_buf = vec![0u8; 1024];

    noize.rekey_send().unwrap();
    snow.rekey_incoming();
    let len = noize.write_message(b"after rekey", &mut buf).unwrap();
    let plen = snow.read_message(&buf[..len], &mut payload_buf).unwrap();
    assert_eq!(&payload_buf[..plen], b"after rekey");

    snow.rekey_outgoing();
    noize.rekey_recv().unwrap();
    let len = snow.write_message(b"reply", &mut buf).unwrap();
    let plen = noize.read_message(&buf[..len], &mut payload_buf).unwrap();
    assert_eq!(&payload_buf[..plen], b"reply");
}
