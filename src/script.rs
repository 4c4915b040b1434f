//! Coinbase script construction
//!
//! The input script carries the genesis message behind a fixed prefix, the
//! output script pays the block reward to a bare public key.

use crate::utils::decode_hex_field;
use crate::{Error, Result};
use tracing::warn;

/// Fixed coinbase script prefix: push of bits 0x1d00ffff followed by a push of 4
pub const COINBASE_SCRIPT_PREFIX: [u8; 7] = [0x04, 0xff, 0xff, 0x00, 0x1d, 0x01, 0x04];

/// Push opcode for data of 76..=255 bytes
pub const OP_PUSHDATA1: u8 = 0x4c;

/// Signature check opcode closing a pay-to-pubkey output
pub const OP_CHECKSIG: u8 = 0xac;

/// Scripts are serialized behind a single-byte length
pub const MAX_SCRIPT_LEN: usize = 0xff;

/// Compressed and uncompressed secp256k1 key lengths
pub const COMPRESSED_KEY_LEN: usize = 33;
pub const UNCOMPRESSED_KEY_LEN: usize = 65;

/// Build the coinbase input script embedding `message`
///
/// Layout: prefix, an `OP_PUSHDATA1` marker when the message is 76..=255
/// bytes, the single length byte, then the message bytes.
pub fn input_script(message: &[u8]) -> Result<Vec<u8>> {
    if message.is_empty() {
        return Err(Error::missing_input("message"));
    }
    if message.len() > MAX_SCRIPT_LEN {
        return Err(Error::ScriptTooLong {
            length: message.len(),
            max: MAX_SCRIPT_LEN,
        });
    }

    let mut script = Vec::with_capacity(COINBASE_SCRIPT_PREFIX.len() + 2 + message.len());
    script.extend_from_slice(&COINBASE_SCRIPT_PREFIX);
    if message.len() >= OP_PUSHDATA1 as usize {
        script.push(OP_PUSHDATA1);
    }
    script.push(message.len() as u8);
    script.extend_from_slice(message);

    if script.len() > MAX_SCRIPT_LEN {
        return Err(Error::ScriptTooLong {
            length: script.len(),
            max: MAX_SCRIPT_LEN,
        });
    }
    Ok(script)
}

/// Decode a hex public key
pub fn decode_public_key(hex: &str) -> Result<Vec<u8>> {
    decode_hex_field("pubkey", hex)
}

/// Build the pay-to-pubkey output script: length, key, `OP_CHECKSIG`
///
/// Keys that are neither 33 nor 65 bytes, an empty key included, are
/// accepted with a warning.
pub fn output_script(public_key: &[u8]) -> Result<Vec<u8>> {
    if public_key.len() != COMPRESSED_KEY_LEN && public_key.len() != UNCOMPRESSED_KEY_LEN {
        warn!(
            length = public_key.len(),
            "Public key is neither {} nor {} bytes, using it as given",
            COMPRESSED_KEY_LEN,
            UNCOMPRESSED_KEY_LEN
        );
    }

    let total = public_key.len() + 2;
    if total > MAX_SCRIPT_LEN {
        return Err(Error::ScriptTooLong {
            length: total,
            max: MAX_SCRIPT_LEN,
        });
    }

    let mut script = Vec::with_capacity(total);
    script.push(public_key.len() as u8);
    script.extend_from_slice(public_key);
    script.push(OP_CHECKSIG);
    Ok(script)
}
