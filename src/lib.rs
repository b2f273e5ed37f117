//! Shareable invite codes for an IPv4 address and port.
//!
//! An [`Endpoint`] can be written as plain `ip:port`, as hex, as base 62, as
//! five dictionary words, or as a QR code image. [`decode`] works out which
//! of those it was handed.

#[cfg(test)]
#[macro_use]
extern crate quickcheck;

pub mod bits;
pub mod canonical;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod formats;
pub mod logging;
pub mod mnemonic;
pub mod network;
pub mod registry;
pub mod utils;

pub use canonical::Endpoint;
pub use error::InviteError;
pub use formats::InviteFormat;
pub use registry::{Detected, InviteRegistry};

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

lazy_static::lazy_static! {
    static ref STANDARD_REGISTRY: InviteRegistry = InviteRegistry::standard();
}

/// The process-wide registry used by [`encode`] and [`decode`].
pub fn standard_registry() -> &'static InviteRegistry {
    &STANDARD_REGISTRY
}

pub fn encode(
    endpoint: Endpoint,
    format: InviteFormat,
    dictionary_id: usize,
) -> Result<String, InviteError> {
    STANDARD_REGISTRY.encode(endpoint, format, dictionary_id)
}

pub fn decode(text: &str) -> Result<Detected, InviteError> {
    STANDARD_REGISTRY.detect(text)
}
