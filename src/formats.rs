//! Textual forms of an [`Endpoint`].

pub mod base16;
pub mod base62;
pub mod plain;
pub mod qrimage;
pub mod words;

pub use base16::Base16Converter;
pub use base62::Base62Converter;
pub use plain::PlainConverter;
pub use qrimage::{EccLevel, QrCodec, QrImageConverter};
pub use words::WordsConverter;

use crate::canonical::Endpoint;
use crate::error::InviteError;
use std::fmt;
use std::str::FromStr;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "jsonconfig", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "jsonconfig", serde(rename_all = "lowercase"))]
pub enum InviteFormat {
    Default,
    Base16,
    Base62,
    Words,
    #[cfg_attr(feature = "jsonconfig", serde(rename = "qr"))]
    QrImage,
    Unknown,
}

impl InviteFormat {
    /// Every format a converter can produce.
    pub const ENCODABLE: [InviteFormat; 5] = [
        InviteFormat::Default,
        InviteFormat::Base16,
        InviteFormat::Base62,
        InviteFormat::Words,
        InviteFormat::QrImage,
    ];
}

impl fmt::Display for InviteFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InviteFormat::Default => "Default",
            InviteFormat::Base16 => "Base16",
            InviteFormat::Base62 => "Base62",
            InviteFormat::Words => "Words",
            InviteFormat::QrImage => "QrImage",
            InviteFormat::Unknown => "Unknown",
        };
        f.pad(name)
    }
}

impl FromStr for InviteFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(InviteFormat::Default),
            "base16" | "hex" => Ok(InviteFormat::Base16),
            "base62" => Ok(InviteFormat::Base62),
            "words" => Ok(InviteFormat::Words),
            "qr" | "qrimage" => Ok(InviteFormat::QrImage),
            other => Err(format!("Unknown invite format: {}", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Converter {
    Plain(PlainConverter),
    Base16(Base16Converter),
    Base62(Base62Converter),
    Words(WordsConverter),
    QrImage(QrImageConverter),
}

impl Converter {
    pub fn format(&self) -> InviteFormat {
        match self {
            Converter::Plain(_) => InviteFormat::Default,
            Converter::Base16(_) => InviteFormat::Base16,
            Converter::Base62(_) => InviteFormat::Base62,
            Converter::Words(_) => InviteFormat::Words,
            Converter::QrImage(_) => InviteFormat::QrImage,
        }
    }

    /// Cheap recognition check; a `true` here does not promise `decode` succeeds.
    pub fn is_format(&self, text: &str) -> bool {
        match self {
            Converter::Plain(inner) => inner.is_format(text),
            Converter::Base16(inner) => inner.is_format(text),
            Converter::Base62(inner) => inner.is_format(text),
            Converter::Words(inner) => inner.is_format(text),
            Converter::QrImage(inner) => inner.is_format(text),
        }
    }

    pub fn encode(&self, endpoint: Endpoint, dictionary_id: usize) -> Result<String, InviteError> {
        match self {
            Converter::Plain(inner) => Ok(inner.encode(endpoint)),
            Converter::Base16(inner) => Ok(inner.encode(endpoint)),
            Converter::Base62(inner) => Ok(inner.encode(endpoint)),
            Converter::Words(inner) => inner.encode(endpoint, dictionary_id),
            Converter::QrImage(inner) => inner.encode(endpoint),
        }
    }

    pub fn decode(&self, text: &str) -> Result<Endpoint, InviteError> {
        match self {
            Converter::Plain(inner) => inner.decode(text),
            Converter::Base16(inner) => inner.decode(text),
            Converter::Base62(inner) => inner.decode(text),
            Converter::Words(inner) => inner.decode(text),
            Converter::QrImage(inner) => inner.decode(text),
        }
    }
}
