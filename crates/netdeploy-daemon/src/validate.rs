//! MAC address format checks applied before input reaches the registry

use regex::Regex;
use std::sync::LazyLock;

use crate::api::ApiError;

/// Six two-digit hex groups separated by ':' or '-'
static MAC_ADDRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}$").expect("MAC address pattern compiles")
});

pub fn is_valid_mac(mac_address: &str) -> bool {
    MAC_ADDRESS_PATTERN.is_match(mac_address)
}

/// Reject anything that is not a MAC address
pub fn validate_mac(mac_address: &str) -> Result<(), ApiError> {
    if is_valid_mac(mac_address) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "Invalid MAC address: '{}'",
            mac_address
        )))
    }
}
