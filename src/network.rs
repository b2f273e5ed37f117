//! Network glue around invites: finding the address to share, and a small
//! host/client pair for trying an invite out.

pub mod session;
#[cfg(feature = "stunmapping")]
pub mod stun;
pub mod utils;

pub use session::{connect_and_greet, HostSession, SessionError};
pub use utils::local_network_ip;

#[cfg(feature = "stunmapping")]
pub use stun::public_ipv4;
