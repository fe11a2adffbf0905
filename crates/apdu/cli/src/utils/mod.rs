//! Argument parsing helpers

pub mod reader;

use std::error::Error;

use iso7816_core::aid;

/// Parse a hex string, ignoring spaces and colons
pub fn parse_hex(input: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    hex::decode(cleaned)
}

/// Parse a single hex byte such as `A4` or `0xA4`
pub fn parse_byte(input: &str) -> Result<u8, String> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    u8::from_str_radix(digits, 16).map_err(|e| format!("invalid hex byte '{input}': {e}"))
}

/// Resolve an AID given by well-known name or as hex
pub fn resolve_aid(input: &str) -> Result<Vec<u8>, Box<dyn Error>> {
    if let Some(id) = aid::lookup(input) {
        return Ok(id.to_vec());
    }
    let id = parse_hex(input)
        .map_err(|_| format!("'{input}' is neither a known AID name nor hex"))?;
    if !(5..=16).contains(&id.len()) {
        return Err(format!("AID must be 5 to 16 bytes, got {}", id.len()).into());
    }
    Ok(id)
}

/// Render transmission protocols as `T=0, T=1`
pub fn protocol_list(protocols: &[u8]) -> String {
    if protocols.is_empty() {
        return "T=0 (implicit)".to_string();
    }
    protocols
        .iter()
        .map(|p| format!("T={p}"))
        .collect::<Vec<_>>()
        .join(", ")
}
