//! Hardware address parsing and formatting
//!
//! Accepts:
//! - AA:BB:CC:DD:EE:FF (colon-separated)
//! - AA-BB-CC-DD-EE-FF (dash-separated)
//! - AABBCCDDEEFF (no separator)
//!
//! Hex digits may be upper or lower case.

use crate::error::{Error, Result};

/// Number of bytes in a MAC address
pub const MAC_LEN: usize = 6;

/// Parse a MAC address string into bytes
///
/// Separated forms must use six two-digit groups and a single separator
/// kind throughout.
pub fn parse_mac_address(mac_str: &str) -> Result<[u8; MAC_LEN]> {
    let trimmed = mac_str.trim();
    let invalid = || {
        Error::Validation(format!(
            "Invalid MAC address '{}'. Expected six hex byte pairs (e.g., 'AA:BB:CC:DD:EE:FF')",
            trimmed
        ))
    };

    let groups: Vec<&str> = if trimmed.len() == MAC_LEN * 2 {
        (0..MAC_LEN)
            .map(|i| trimmed.get(i * 2..i * 2 + 2).ok_or_else(invalid))
            .collect::<Result<_>>()?
    } else {
        let separator = match trimmed.chars().nth(2) {
            Some(c @ (':' | '-')) => c,
            _ => return Err(invalid()),
        };
        trimmed.split(separator).collect()
    };

    if groups.len() != MAC_LEN
        || groups
            .iter()
            .any(|g| g.len() != 2 || !g.chars().all(|c| c.is_ascii_hexdigit()))
    {
        return Err(invalid());
    }

    let mut mac = [0u8; MAC_LEN];
    for (byte, hex) in mac.iter_mut().zip(&groups) {
        *byte = u8::from_str_radix(hex, 16).map_err(|_| invalid())?;
    }

    Ok(mac)
}

/// Format MAC address bytes as upper-case colon-separated text
#[must_use]
pub fn format_mac(mac: &[u8; MAC_LEN]) -> String {
    format!(
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    )
}

/// Validate a MAC address and return it in `AA:BB:CC:DD:EE:FF` form
pub fn normalize_mac(mac_str: &str) -> Result<String> {
    parse_mac_address(mac_str).map(|mac| format_mac(&mac))
}
