use crate::error::InviteError;
use std::convert::TryFrom;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// Length of the packed `address ++ port` form every invite format is built on.
pub const CANONICAL_LEN: usize = 6;

pub fn to_bytes(ip: Ipv4Addr, port: u16) -> [u8; CANONICAL_LEN] {
    let ip_bytes = ip.octets();
    let port_bytes = port.to_be_bytes();
    [
        ip_bytes[0],
        ip_bytes[1],
        ip_bytes[2],
        ip_bytes[3],
        port_bytes[0],
        port_bytes[1],
    ]
}

pub fn from_bytes(bytes: &[u8]) -> Result<(Ipv4Addr, u16), InviteError> {
    if bytes.len() != CANONICAL_LEN {
        return Err(InviteError::Length {
            expected: CANONICAL_LEN,
            actual: bytes.len(),
        });
    }
    let ip = Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]);
    let port = u16::from_be_bytes([bytes[4], bytes[5]]);
    Ok((ip, port))
}

/// An IPv4 address and port that can be shared as an invite.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Endpoint {
    addr: SocketAddrV4,
}

impl Endpoint {
    pub fn new(ip: Ipv4Addr, port: u16) -> Self {
        let addr = SocketAddrV4::new(ip, port);
        Self { addr }
    }
    pub fn ip(self) -> Ipv4Addr {
        *self.addr.ip()
    }
    pub fn port(self) -> u16 {
        self.addr.port()
    }
    pub fn as_addr(self) -> SocketAddrV4 {
        self.addr
    }
    pub fn to_bytes(self) -> [u8; CANONICAL_LEN] {
        to_bytes(self.ip(), self.port())
    }
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InviteError> {
        from_bytes(bytes).map(|(ip, port)| Self::new(ip, port))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.addr, f)
    }
}

impl From<SocketAddrV4> for Endpoint {
    fn from(addr: SocketAddrV4) -> Endpoint {
        Endpoint { addr }
    }
}

impl From<Endpoint> for SocketAddr {
    fn from(endpoint: Endpoint) -> SocketAddr {
        SocketAddr::V4(endpoint.addr)
    }
}

impl TryFrom<SocketAddr> for Endpoint {
    type Error = InviteError;
    fn try_from(addr: SocketAddr) -> Result<Self, Self::Error> {
        match addr {
            SocketAddr::V4(inner) => Ok(Endpoint::from(inner)),
            SocketAddr::V6(inner) => match inner.ip().to_ipv4() {
                Some(ip) if inner.ip().segments()[..6] == [0, 0, 0, 0, 0, 0xFFFF] => {
                    Ok(Endpoint::new(ip, inner.port()))
                }
                _ => Err(InviteError::Ipv6Unsupported(*inner.ip())),
            },
        }
    }
}
