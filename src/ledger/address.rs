//! # Ledger Addresses
//!
//! Both ledgers use the same address format: 58 characters of RFC 4648
//! base32 (no padding) encoding a 32-byte public key followed by a 4-byte
//! checksum. Syntax validation (length + charset) is what gates wizard
//! advancement; the full checksum only matters when deriving an address
//! from a signing key.

use sha2::{Digest, Sha512_256};
use thiserror::Error;

/// Base32 alphabet (RFC 4648, upper case, no padding).
const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Expected address length in characters.
pub const ADDRESS_LEN: usize = 58;

/// Address validation failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    /// Wrong number of characters.
    #[error("invalid address length: {0} (expected {ADDRESS_LEN})")]
    InvalidLength(usize),

    /// Character outside the base32 alphabet.
    #[error("invalid character in address: {0:?}")]
    InvalidCharacter(char),
}

/// Validate address syntax: exactly 58 base32 characters.
///
/// This is the check the wizards gate on before any network call is
/// issued for a recipient.
pub fn validate_address(address: &str) -> Result<(), AddressError> {
    if address.len() != ADDRESS_LEN {
        return Err(AddressError::InvalidLength(address.len()));
    }

    for c in address.chars() {
        if !BASE32_ALPHABET.contains(&(c as u8)) {
            return Err(AddressError::InvalidCharacter(c));
        }
    }

    Ok(())
}

/// Derive the textual address for an ed25519 public key.
///
/// Encodes `pubkey || last 4 bytes of SHA-512/256(pubkey)` as unpadded
/// base32, which always yields 58 characters for 36 input bytes.
pub fn encode_address(public_key: &[u8; 32]) -> String {
    let digest = Sha512_256::digest(public_key);
    let checksum = &digest[digest.len() - 4..];

    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(public_key);
    data.extend_from_slice(checksum);

    base32_encode(&data)
}

/// Unpadded RFC 4648 base32 encoding.
fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(5) * 8);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for &byte in data {
        buffer = (buffer << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            let index = ((buffer >> bits) & 0x1f) as usize;
            out.push(BASE32_ALPHABET[index] as char);
        }
    }

    if bits > 0 {
        let index = ((buffer << (5 - bits)) & 0x1f) as usize;
        out.push(BASE32_ALPHABET[index] as char);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_address_is_valid_syntax() {
        let address = encode_address(&[7u8; 32]);
        assert_eq!(address.len(), ADDRESS_LEN);
        assert_eq!(validate_address(&address), Ok(()));
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            validate_address("SHORT"),
            Err(AddressError::InvalidLength(5))
        );
        let long = "A".repeat(59);
        assert_eq!(validate_address(&long), Err(AddressError::InvalidLength(59)));
    }

    #[test]
    fn rejects_invalid_charset() {
        // '0' and '1' are not in the base32 alphabet; lower case neither.
        let bad = format!("0{}", "A".repeat(57));
        assert_eq!(
            validate_address(&bad),
            Err(AddressError::InvalidCharacter('0'))
        );
        let lower = format!("a{}", "A".repeat(57));
        assert_eq!(
            validate_address(&lower),
            Err(AddressError::InvalidCharacter('a'))
        );
    }

    #[test]
    fn different_keys_give_different_addresses() {
        assert_ne!(encode_address(&[1u8; 32]), encode_address(&[2u8; 32]));
    }
}
