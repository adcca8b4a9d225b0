//! Remote address validation.

use thiserror::Error;

/// Address rejected by [`validate_address`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a dotted-quad IPv4 address: {0:?}")]
pub struct InvalidAddress(pub String);

/// Accept a dotted-quad IPv4 address.
///
/// Exactly four octets, each one to three ASCII digits with a value of at most
/// 255. Leading zeros are allowed (`010.0.0.1`), signs and whitespace are not.
pub fn validate_address(address: &str) -> Result<&str, InvalidAddress> {
    let mut octets = 0;
    for octet in address.split('.') {
        octets += 1;
        if octets > 4 || !is_octet(octet) {
            return Err(InvalidAddress(address.to_string()));
        }
    }

    if octets == 4 { Ok(address) } else { Err(InvalidAddress(address.to_string())) }
}

fn is_octet(s: &str) -> bool {
    (1..=3).contains(&s.len())
        && s.bytes().all(|b| b.is_ascii_digit())
        && s.parse::<u16>().is_ok_and(|n| n <= 255)
}
