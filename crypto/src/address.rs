//! Member address derivation from public keys.
//!
//! Address format: `acre_` + base32(public_key, 52 chars) + base32(checksum, 8 chars)
//!
//! Checksum: first 5 bytes of Blake2b-256(public_key).
//! The public key is recoverable from the address, which is what lets the
//! engine verify signed votes, delegations, and permits given only a
//! member address.

use acre_types::{MemberAddress, PublicKey};

/// Base32 alphabet (32 chars, avoids visually ambiguous 0/O, 2/Z, l/I, v).
const BASE32_ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

/// Reverse lookup table: ASCII byte -> 5-bit value (0xFF = invalid).
const BASE32_DECODE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let alpha = BASE32_ALPHABET;
    let mut i = 0;
    while i < 32 {
        table[alpha[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Prefix for all Acre addresses.
const PREFIX: &str = "acre_";
/// Base32 characters for the public key (256 bits -> ceil(256/5) = 52).
const PUBKEY_CHARS: usize = 52;
/// Length of the encoded part after the prefix: 52 pubkey + 8 checksum.
const ENCODED_LEN: usize = 60;

fn encode_base32(bytes: &[u8]) -> String {
    let total_bits = bytes.len() * 8;
    let num_chars = total_bits.div_ceil(5);
    let mut result = String::with_capacity(num_chars);

    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | byte as u64;
        bits_in_buffer += 8;
        while bits_in_buffer >= 5 {
            bits_in_buffer -= 5;
            let idx = ((buffer >> bits_in_buffer) & 0x1F) as usize;
            result.push(BASE32_ALPHABET[idx] as char);
        }
    }
    if bits_in_buffer > 0 {
        let idx = ((buffer << (5 - bits_in_buffer)) & 0x1F) as usize;
        result.push(BASE32_ALPHABET[idx] as char);
    }

    result
}

fn decode_base32_fixed<const N: usize>(s: &str) -> Option<[u8; N]> {
    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;
    let mut result = [0u8; N];
    let mut pos = 0;

    for c in s.bytes() {
        if c >= 128 {
            return None;
        }
        let val = BASE32_DECODE[c as usize];
        if val == 0xFF {
            return None;
        }
        buffer = (buffer << 5) | val as u64;
        bits_in_buffer += 5;
        if bits_in_buffer >= 8 {
            bits_in_buffer -= 8;
            if pos < N {
                result[pos] = (buffer >> bits_in_buffer) as u8;
                pos += 1;
            }
        }
    }

    if pos < N {
        return None;
    }
    Some(result)
}

/// Derive an `acre_`-prefixed member address from a public key.
pub fn derive_address(public_key: &PublicKey) -> MemberAddress {
    let pubkey_encoded = encode_base32(public_key.as_bytes());
    let hash = crate::blake2b_256(public_key.as_bytes());
    let checksum_encoded = encode_base32(&hash[..5]);
    MemberAddress::new(format!("{PREFIX}{pubkey_encoded}{checksum_encoded}"))
}

/// Extract the public key from a valid Acre address.
///
/// Returns `None` if the address is malformed or the checksum is wrong.
pub fn decode_address(address: &MemberAddress) -> Option<PublicKey> {
    let raw = address.as_str();
    let encoded = raw.strip_prefix(PREFIX)?;
    if encoded.len() != ENCODED_LEN {
        return None;
    }

    let pubkey_bytes: [u8; 32] = decode_base32_fixed(&encoded[..PUBKEY_CHARS])?;
    let checksum_bytes: [u8; 5] = decode_base32_fixed(&encoded[PUBKEY_CHARS..])?;

    let expected_checksum = &crate::blake2b_256(&pubkey_bytes)[..5];
    if checksum_bytes != *expected_checksum {
        return None;
    }

    Some(PublicKey(pubkey_bytes))
}

/// Whether an address is well-formed with a correct checksum.
pub fn validate_address(address: &MemberAddress) -> bool {
    decode_address(address).is_some()
}
