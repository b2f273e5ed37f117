use crate::canonical::{Endpoint, CANONICAL_LEN};
use crate::error::InviteError;
use crate::formats::InviteFormat;

const RADIX: u64 = 62;
const PAYLOAD_BITS: usize = CANONICAL_LEN * 8;

fn digit_value(c: char) -> Option<u64> {
    let value = if c >= '0' && c <= '9' {
        c as u64 - '0' as u64
    } else if c >= 'a' && c <= 'z' {
        c as u64 - 'a' as u64 + 10
    } else if c >= 'A' && c <= 'Z' {
        c as u64 - 'A' as u64 + 36
    } else {
        return None;
    };
    Some(value)
}

fn digit_char(digit: u8) -> char {
    let base = if digit < 10 {
        b'0'
    } else if digit < 36 {
        b'a' - 10
    } else {
        b'A' - 36
    };
    char::from(base + digit)
}

/// The canonical bytes read as one big-endian integer, written in base 62
/// with the digits `0-9a-zA-Z`.
#[derive(Copy, Clone, Debug, Default)]
pub struct Base62Converter;

impl Base62Converter {
    pub fn is_format(&self, text: &str) -> bool {
        !text.is_empty() && text.chars().all(|c| digit_value(c).is_some())
    }

    pub fn encode(&self, endpoint: Endpoint) -> String {
        let mut padded = [0u8; 8];
        padded[8 - CANONICAL_LEN..].copy_from_slice(&endpoint.to_bytes());
        let mut left = u64::from_be_bytes(padded);
        if left == 0 {
            return "0".to_owned();
        }
        let mut retvl = Vec::new();
        while left > 0 {
            retvl.push(digit_char((left % RADIX) as u8));
            left /= RADIX;
        }
        retvl.iter().rev().collect()
    }

    pub fn decode(&self, text: &str) -> Result<Endpoint, InviteError> {
        if text.is_empty() {
            return Err(InviteError::invalid_text(InviteFormat::Base62, "empty string"));
        }
        let too_wide =
            || InviteError::invalid_text(InviteFormat::Base62, format!("value is wider than {} bits", PAYLOAD_BITS));
        let mut value = 0u64;
        for c in text.chars() {
            let digit = digit_value(c).ok_or_else(|| {
                InviteError::invalid_text(InviteFormat::Base62, format!("invalid character '{}'", c))
            })?;
            value = value
                .checked_mul(RADIX)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(too_wide)?;
        }
        if value >> PAYLOAD_BITS != 0 {
            return Err(too_wide());
        }
        let bytes = value.to_be_bytes();
        Endpoint::from_bytes(&bytes[8 - CANONICAL_LEN..])
    }
}
