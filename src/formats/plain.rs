use crate::canonical::Endpoint;
use crate::error::InviteError;
use crate::formats::InviteFormat;
use std::net::Ipv4Addr;

const MAX_OCTET_DIGITS: usize = 3;
const MAX_PORT_DIGITS: usize = 5;

fn digits(part: &str, max: usize) -> Option<&str> {
    if part.is_empty() || part.len() > max || !part.bytes().all(|b| b.is_ascii_digit()) {
        None
    } else {
        Some(part)
    }
}

/// Matches `d{1,3}.d{1,3}.d{1,3}.d{1,3}:d{1,5}` and checks both halves parse.
fn parse(text: &str) -> Option<Endpoint> {
    let mut halves = text.split(':');
    let host = halves.next()?;
    let port = halves.next()?;
    if halves.next().is_some() {
        return None;
    }
    let mut octets = [0u8; 4];
    let mut parts = host.split('.');
    for octet in octets.iter_mut() {
        *octet = digits(parts.next()?, MAX_OCTET_DIGITS)?.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    let port = digits(port, MAX_PORT_DIGITS)?.parse().ok()?;
    Some(Endpoint::new(Ipv4Addr::from(octets), port))
}

/// The `ip:port` form.
#[derive(Copy, Clone, Debug, Default)]
pub struct PlainConverter;

impl PlainConverter {
    pub fn is_format(&self, text: &str) -> bool {
        parse(text).is_some()
    }

    pub fn encode(&self, endpoint: Endpoint) -> String {
        format!("{}:{}", endpoint.ip(), endpoint.port())
    }

    pub fn decode(&self, text: &str) -> Result<Endpoint, InviteError> {
        parse(text).ok_or_else(|| {
            InviteError::invalid_text(InviteFormat::Default, format!("'{}' is not ip:port", text))
        })
    }
}
