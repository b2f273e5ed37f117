use crate::bits::BitsError;
use crate::formats::InviteFormat;
use std::fmt;
use std::net::Ipv6Addr;

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum InviteError {
    /// Canonical bytes were not exactly the expected length.
    Length { expected: usize, actual: usize },
    /// A word invite did not split into the expected number of words.
    MalformedInvite { expected: usize, found: usize },
    WordNotFound(String),
    UnknownDictionary { id: usize, loaded: usize },
    AmbiguousOrUnknown(String),
    NoDictionary,
    UnsupportedFormat(InviteFormat),
    ImageDecode(String),
    InvalidText { format: InviteFormat, reason: String },
    InvalidDictionary { reason: String },
    Ipv6Unsupported(Ipv6Addr),
    Bits(BitsError),
}

impl fmt::Display for InviteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InviteError::Length { expected, actual } => write!(
                f,
                "Invalid invite payload: expected {} bytes but got {}.",
                expected, actual
            ),
            InviteError::MalformedInvite { expected, found } => write!(
                f,
                "Malformed word invite: expected {} '-'-separated words but found {}.",
                expected, found
            ),
            InviteError::WordNotFound(word) => {
                write!(f, "The word '{}' was not found in the dictionary.", word)
            }
            InviteError::UnknownDictionary { id, loaded } => write!(
                f,
                "Dictionary id {} is out of range ({} dictionaries loaded).",
                id, loaded
            ),
            InviteError::AmbiguousOrUnknown(code) => write!(
                f,
                "Could not decode '{}' with any of the loaded dictionaries.",
                code
            ),
            InviteError::NoDictionary => write!(f, "No valid word list could be loaded."),
            InviteError::UnsupportedFormat(format) => {
                write!(f, "No converter is registered for format {}.", format)
            }
            InviteError::ImageDecode(reason) => {
                write!(f, "Could not read a QR code from the image: {}", reason)
            }
            InviteError::InvalidText { format, reason } => {
                write!(f, "Invalid {} invite: {}", format, reason)
            }
            InviteError::InvalidDictionary { reason } => {
                write!(f, "Invalid word list: {}", reason)
            }
            InviteError::Ipv6Unsupported(addr) => {
                write!(f, "IPv6 addresses are not supported by invites: {}", addr)
            }
            InviteError::Bits(inner) => fmt::Display::fmt(inner, f),
        }
    }
}

impl std::error::Error for InviteError {}

impl From<BitsError> for InviteError {
    fn from(inner: BitsError) -> Self {
        Self::Bits(inner)
    }
}

impl InviteError {
    pub(crate) fn invalid_text(format: InviteFormat, reason: impl Into<String>) -> Self {
        InviteError::InvalidText {
            format,
            reason: reason.into(),
        }
    }
}
