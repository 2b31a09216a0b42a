//! Chain addresses are compared as bytes and rendered in one canonical form,
//! lowercase `0x` hex, everywhere they become text (request keys, logs, CSV).

use alloy::{hex, primitives::Address};

use crate::Error;

/// Parses an address regardless of the casing it was written in.
///
/// EIP-55 checksums are not enforced, the legacy tables mix casings freely.
pub fn parse_address(s: &str) -> crate::Result<Address> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.len() != 40 {
        return Err(Error::InvalidAddress(s.to_string()));
    }

    let mut bytes = [0u8; 20];
    hex::decode_to_slice(digits, &mut bytes).map_err(|_| Error::InvalidAddress(s.to_string()))?;
    Ok(Address::from(bytes))
}

pub fn canonical(address: &Address) -> String {
    hex::encode_prefixed(address)
}
