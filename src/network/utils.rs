use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;

const PROBE_TARGET: (Ipv4Addr, u16) = (Ipv4Addr::new(8, 8, 8, 8), 4000);

/// The local address the OS would use to reach `target`. Nothing is sent.
async fn outward_ip_towards(target: SocketAddr) -> Result<Ipv4Addr, io::Error> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
    socket.connect(target).await?;
    let got_addr = socket.local_addr()?;
    match got_addr.ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() => Ok(ip),
        other => Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no usable IPv4 route, got {}", other),
        )),
    }
}

/// This machine's IPv4 address on the local network.
pub async fn local_network_ip() -> Result<Ipv4Addr, io::Error> {
    outward_ip_towards(SocketAddr::from(PROBE_TARGET)).await
}
