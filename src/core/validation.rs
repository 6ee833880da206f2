use ethers::types::{Address, U256};
use regex::Regex;
use sha3::{Digest, Keccak256};
use std::str::FromStr;

use crate::core::errors::{ClientError, ClientResult};

/// Validates an Ethereum address string.
pub fn validate_ethereum_address(address: &str) -> ClientResult<()> {
    if !address.starts_with("0x") || address.len() != 42 {
        return Err(ClientError::InvalidAddress(format!("{address}: expected 0x + 40 hex chars")));
    }
    let hex_regex =
        Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("Hardcoded regex should always compile");
    if !hex_regex.is_match(address) {
        return Err(ClientError::InvalidAddress(format!("{address}: invalid characters")));
    }
    // EIP-55: if mixed-case, enforce checksum. All-lower or all-upper acceptable for compatibility.
    let body = &address[2..];
    let is_all_lower = body.chars().all(|c| !c.is_ascii_uppercase());
    let is_all_upper = body.chars().all(|c| !c.is_ascii_lowercase());
    if is_all_lower || is_all_upper {
        return Ok(());
    }
    if !is_eip55_checksum_valid(address) {
        return Err(ClientError::InvalidAddress(format!("{address}: bad EIP-55 checksum")));
    }
    Ok(())
}

fn is_eip55_checksum_valid(addr: &str) -> bool {
    let body = &addr[2..];
    let lower = body.to_lowercase();
    let mut keccak = Keccak256::new();
    keccak.update(lower.as_bytes());
    let hash = keccak.finalize();
    for (i, ch) in body.chars().enumerate() {
        let nibble = (hash[i / 2] >> (4 * (1 - (i % 2)))) & 0x0f;
        match ch {
            'a'..='f' if nibble >= 8 => return false,
            'A'..='F' if nibble < 8 => return false,
            _ => {}
        }
    }
    true
}

/// Validate then parse a user-supplied address.
pub fn parse_address(address: &str) -> ClientResult<Address> {
    let address = address.trim();
    validate_ethereum_address(address)?;
    Address::from_str(address).map_err(|e| ClientError::InvalidAddress(format!("{address}: {e}")))
}

/// Parse a `0x`-prefixed hex chain id into its numeric value.
pub fn parse_chain_id(chain_id: &str) -> ClientResult<u64> {
    let trimmed = chain_id.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| ClientError::Config(format!("chain id {trimmed} must be 0x-prefixed hex")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| ClientError::Config(format!("chain id {trimmed}: {e}")))
}

/// Parse a decimal election or candidate id.
pub fn parse_uint(value: &str) -> ClientResult<U256> {
    let value = value.trim();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ClientError::Decode(format!("{value:?} is not a non-negative integer")));
    }
    U256::from_dec_str(value).map_err(|e| ClientError::Decode(format!("{value}: {e}")))
}

/// URLs must be absolute http(s) URLs with a host.
pub fn validate_http_url(url: &str) -> ClientResult<()> {
    let parsed = reqwest::Url::parse(url.trim())
        .map_err(|e| ClientError::Config(format!("invalid URL '{url}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host().is_some() => Ok(()),
        scheme => Err(ClientError::Config(format!("unsupported URL scheme '{scheme}' in {url}"))),
    }
}
