//! Public address discovery with a single STUN binding request.

use crate::canonical::Endpoint;
use crate::error::InviteError;
use crate::utils::{AllowOnlyOne, AllowOnlyOneError};
use bytecodec::{Decode, Encode, EncodeExt, Eos};
use futures::future;
use futures::stream::{self, FuturesUnordered, Stream, StreamExt};
use std::convert::TryFrom;
use std::fmt::{self, Display, Formatter};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use stun_codec::rfc5389::{self, Attribute};
use stun_codec::{BrokenMessage, Message, MessageClass, MessageDecoder, MessageEncoder, TransactionId};
use tokio::net::{lookup_host, UdpSocket};

const STUN_HOSTS: &[&str] = &[
    "stun.l.google.com:19302",
    "stun1.l.google.com:19302",
    "stun2.l.google.com:19302",
    "stun3.l.google.com:19302",
    "stun4.l.google.com:19302",
];

const REQUEST_LEN: usize = 20;
const REPLY_BUFFER: usize = 512;
const PER_SERVER_TIMEOUT: Duration = Duration::from_millis(1500);

#[derive(Debug)]
pub enum StunError {
    Io(tokio::io::Error),
    Codec(bytecodec::Error),
    /// The reply parsed as STUN but its contents were invalid.
    Malformed(String),
    WrongTransaction,
    MultipleAddresses,
    NoAddress,
    NoServers,
    Timeout(Duration),
    NotIpv4(InviteError),
}

impl Display for StunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StunError::Io(inner) => Display::fmt(inner, f),
            StunError::Codec(inner) => Display::fmt(inner, f),
            StunError::Malformed(reason) => write!(f, "Malformed STUN reply: {}", reason),
            StunError::WrongTransaction => write!(f, "STUN reply did not match the request."),
            StunError::MultipleAddresses => write!(f, "STUN reply held more than one address."),
            StunError::NoAddress => write!(f, "STUN reply held no address."),
            StunError::NoServers => write!(f, "No STUN server could be reached."),
            StunError::Timeout(dur) => write!(f, "No STUN answer within {} ms.", dur.as_millis()),
            StunError::NotIpv4(inner) => Display::fmt(inner, f),
        }
    }
}

impl std::error::Error for StunError {}

impl From<tokio::io::Error> for StunError {
    fn from(inner: tokio::io::Error) -> Self {
        StunError::Io(inner)
    }
}

impl From<bytecodec::Error> for StunError {
    fn from(inner: bytecodec::Error) -> Self {
        StunError::Codec(inner)
    }
}

impl From<BrokenMessage> for StunError {
    fn from(inner: BrokenMessage) -> Self {
        StunError::Malformed(format!("{:?} {:?}: {}", inner.class(), inner.method(), inner.error()))
    }
}

fn stun_servers() -> impl Stream<Item = SocketAddr> {
    let lookups: FuturesUnordered<_> = STUN_HOSTS.iter().map(lookup_host).collect();
    lookups
        .map(|res| stream::iter(res.ok().into_iter().flatten()))
        .flatten()
        .filter(|addr| future::ready(addr.is_ipv4()))
}

fn binding_request() -> Result<(TransactionId, [u8; REQUEST_LEN]), bytecodec::Error> {
    let id = TransactionId::new(rand::random());
    let msg = Message::<Attribute>::new(MessageClass::Request, rfc5389::methods::BINDING, id);
    let mut encoder = MessageEncoder::with_item(msg)?;
    let mut retvl = [0; REQUEST_LEN];
    let written = encoder.encode(&mut retvl, Eos::new(true))?;
    debug_assert_eq!(written, retvl.len());
    Ok((id, retvl))
}

fn mapped_addr(attr: &Attribute) -> Option<SocketAddr> {
    match attr {
        Attribute::MappedAddress(mapped) => Some(mapped.address()),
        Attribute::XorMappedAddress(mapped) => Some(mapped.address()),
        Attribute::XorMappedAddress2(mapped) => Some(mapped.address()),
        _ => None,
    }
}

fn parse_reply(buf: &[u8], expected: TransactionId) -> Result<SocketAddr, StunError> {
    let mut decoder = MessageDecoder::<Attribute>::new();
    decoder.decode(buf, Eos::new(true))?;
    let reply: Message<Attribute> = decoder.finish_decoding()??;
    if reply.transaction_id() != expected {
        return Err(StunError::WrongTransaction);
    }
    let addrs: AllowOnlyOne<SocketAddr> = reply.attributes().filter_map(mapped_addr).collect();
    match addrs.into_res() {
        Ok(addr) => Ok(addr),
        Err(AllowOnlyOneError::GotSecond(_)) => Err(StunError::MultipleAddresses),
        Err(AllowOnlyOneError::NoneFound) => Err(StunError::NoAddress),
    }
}

async fn ask_server(socket: &mut UdpSocket, server: SocketAddr) -> Result<SocketAddr, StunError> {
    let (id, request) = binding_request()?;
    socket.send_to(&request, &server).await?;
    let mut buf = [0; REPLY_BUFFER];
    let (got, from) = socket.recv_from(&mut buf).await?;
    if from != server {
        log::debug!("Got a STUN reply from {} after asking {}.", from, server);
    }
    parse_reply(&buf[..got], id)
}

/// Asks each STUN server in turn for the address `socket` is seen as.
pub async fn mapped_address(socket: &mut UdpSocket) -> Result<SocketAddr, StunError> {
    let servers = stun_servers();
    futures::pin_mut!(servers);
    let mut last_err = StunError::NoServers;
    while let Some(server) = servers.next().await {
        let res = tokio::time::timeout(PER_SERVER_TIMEOUT, ask_server(socket, server))
            .await
            .unwrap_or(Err(StunError::Timeout(PER_SERVER_TIMEOUT)));
        match res {
            Ok(public) => {
                log::info!("STUN server {} sees us as {}.", server, public);
                return Ok(public);
            }
            Err(e) => {
                log::info!("STUN server {} failed: {}", server, e);
                last_err = e;
            }
        }
    }
    Err(last_err)
}

/// Discovers this machine's public IPv4 address.
pub async fn public_ipv4(timeout: Duration) -> Result<Ipv4Addr, StunError> {
    let mut socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
    let public = tokio::time::timeout(timeout, mapped_address(&mut socket))
        .await
        .unwrap_or(Err(StunError::Timeout(timeout)))?;
    Endpoint::try_from(public)
        .map(Endpoint::ip)
        .map_err(StunError::NotIpv4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_layout() {
        let (id, buf) = binding_request().unwrap();
        let mut decoder = MessageDecoder::<Attribute>::new();
        decoder.decode(&buf, Eos::new(true)).unwrap();
        let msg: Message<Attribute> = decoder.finish_decoding().unwrap().unwrap();
        assert_eq!(msg.class(), MessageClass::Request);
        assert_eq!(msg.method(), rfc5389::methods::BINDING);
        assert_eq!(msg.transaction_id(), id);
        assert_eq!(msg.attributes().count(), 0);
    }

    #[test]
    fn test_fresh_transaction_ids() {
        let (first, _) = binding_request().unwrap();
        let (second, _) = binding_request().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_reply_checks() {
        // A bare request carries no address attributes.
        let (id, buf) = binding_request().unwrap();
        assert!(matches!(parse_reply(&buf, id), Err(StunError::NoAddress)));
        let other = TransactionId::new([0x11; 12]);
        assert!(matches!(
            parse_reply(&buf, other),
            Err(StunError::WrongTransaction)
        ));
        assert!(parse_reply(&buf[..7], id).is_err());
    }
}
