//! Hex public-key parsing and formatting.
//!
//! Identities travel through the pipeline as hex strings, optionally
//! carrying the network's one-byte `05` identity prefix ahead of the 32-byte
//! X25519 key. Parsing accepts both forms; formatting always emits the
//! prefixed form.

use swarmlink_crypto::PUBLIC_KEY_SIZE;

/// Identity prefix byte in prefixed public keys.
const IDENTITY_PREFIX: u8 = 0x05;

/// Parse a hex public key, with or without the identity prefix.
pub fn parse_public_key(hex_key: &str) -> Result<[u8; PUBLIC_KEY_SIZE], String> {
    let bytes = hex::decode(hex_key).map_err(|e| format!("not hex: {e}"))?;

    let raw: &[u8] = match bytes.len() {
        33 if bytes[0] == IDENTITY_PREFIX => &bytes[1..],
        33 => return Err(format!("unknown identity prefix {:#04x}", bytes[0])),
        32 => &bytes,
        n => return Err(format!("expected 32 or 33 bytes, got {n}")),
    };

    let mut key = [0u8; PUBLIC_KEY_SIZE];
    key.copy_from_slice(raw);
    Ok(key)
}

/// Format a public key as a prefixed hex string.
pub fn format_public_key(key: &[u8; PUBLIC_KEY_SIZE]) -> String {
    let mut prefixed = Vec::with_capacity(1 + PUBLIC_KEY_SIZE);
    prefixed.push(IDENTITY_PREFIX);
    prefixed.extend_from_slice(key);
    hex::encode(prefixed)
}
