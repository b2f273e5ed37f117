use crate::canonical::{Endpoint, CANONICAL_LEN};
use crate::error::InviteError;
use crate::formats::InviteFormat;

pub const HEX_LEN: usize = CANONICAL_LEN * 2;

/// Upper-case hex of the canonical bytes.
#[derive(Copy, Clone, Debug, Default)]
pub struct Base16Converter;

impl Base16Converter {
    pub fn is_format(&self, text: &str) -> bool {
        text.len() == HEX_LEN && text.bytes().all(|b| b.is_ascii_hexdigit())
    }

    pub fn encode(&self, endpoint: Endpoint) -> String {
        hex::encode_upper(endpoint.to_bytes())
    }

    pub fn decode(&self, text: &str) -> Result<Endpoint, InviteError> {
        let bytes = hex::decode(text)
            .map_err(|e| InviteError::invalid_text(InviteFormat::Base16, e.to_string()))?;
        Endpoint::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_known_value() {
        let endpoint = Endpoint::new(Ipv4Addr::new(192, 168, 1, 32), 0xEA60);
        assert_eq!(Base16Converter.encode(endpoint), "C0A80120EA60");
        assert_eq!(Base16Converter.decode("c0a80120ea60").unwrap(), endpoint);
    }

    #[test]
    fn test_recognize() {
        assert!(Base16Converter.is_format("0123456789aB"));
        assert!(!Base16Converter.is_format("0123456789a"));
        assert!(!Base16Converter.is_format("0123456789aBc"));
        assert!(!Base16Converter.is_format("0123456789aG"));
    }

    #[test]
    fn test_bad_input() {
        assert!(matches!(
            Base16Converter.decode("C0A8012"),
            Err(InviteError::InvalidText { .. })
        ));
        assert_eq!(
            Base16Converter.decode("C0A801"),
            Err(InviteError::Length {
                expected: 6,
                actual: 3
            })
        );
    }
}
