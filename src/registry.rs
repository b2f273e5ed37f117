//! Ordered set of converters and the format auto-detector.

use crate::canonical::Endpoint;
use crate::dictionary::{self, DictionarySet};
use crate::error::InviteError;
use crate::formats::{
    Base16Converter, Base62Converter, Converter, InviteFormat, PlainConverter, QrCodec,
    QrImageConverter, WordsConverter,
};
use std::sync::Arc;

/// Detection order. Earlier entries have stricter recognisers.
pub const PRIORITY: [InviteFormat; 5] = [
    InviteFormat::QrImage,
    InviteFormat::Default,
    InviteFormat::Words,
    InviteFormat::Base16,
    InviteFormat::Base62,
];

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Detected {
    Found(InviteFormat, Endpoint),
    Unknown,
}

impl Detected {
    pub fn format(&self) -> InviteFormat {
        match self {
            Detected::Found(format, _) => *format,
            Detected::Unknown => InviteFormat::Unknown,
        }
    }

    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            Detected::Found(_, endpoint) => Some(*endpoint),
            Detected::Unknown => None,
        }
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    dicts: Option<Arc<DictionarySet>>,
    qr_codec: Option<Arc<dyn QrCodec>>,
}

impl RegistryBuilder {
    pub fn with_dictionaries(mut self, dicts: Arc<DictionarySet>) -> Self {
        self.dicts = Some(dicts);
        self
    }

    pub fn with_qr_codec(mut self, codec: Arc<dyn QrCodec>) -> Self {
        self.qr_codec = Some(codec);
        self
    }

    pub fn build(self) -> InviteRegistry {
        let RegistryBuilder { dicts, qr_codec } = self;
        let mut qr = qr_codec.map(|codec| Converter::QrImage(QrImageConverter::new(codec)));
        let mut words = dicts.map(|dicts| Converter::Words(WordsConverter::new(dicts)));
        let converters = PRIORITY
            .iter()
            .filter_map(|format| match format {
                InviteFormat::QrImage => qr.take(),
                InviteFormat::Default => Some(Converter::Plain(PlainConverter)),
                InviteFormat::Words => words.take(),
                InviteFormat::Base16 => Some(Converter::Base16(Base16Converter)),
                InviteFormat::Base62 => Some(Converter::Base62(Base62Converter)),
                InviteFormat::Unknown => None,
            })
            .collect();
        InviteRegistry { converters }
    }
}

#[derive(Clone, Debug)]
pub struct InviteRegistry {
    converters: Vec<Converter>,
}

impl InviteRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Every text format, using the bundled dictionaries. Words is left out,
    /// with a warning, if those cannot be loaded.
    pub fn standard() -> Self {
        let builder = Self::builder();
        let builder = match dictionary::bundled() {
            Ok(dicts) => builder.with_dictionaries(dicts),
            Err(e) => {
                log::warn!("Word invites are unavailable: {}", e);
                builder
            }
        };
        builder.build()
    }

    pub fn converters(&self) -> &[Converter] {
        &self.converters
    }

    pub fn formats(&self) -> Vec<InviteFormat> {
        self.converters.iter().map(Converter::format).collect()
    }

    pub fn converter(&self, format: InviteFormat) -> Option<&Converter> {
        self.converters.iter().find(|conv| conv.format() == format)
    }

    pub fn words(&self) -> Option<&WordsConverter> {
        self.converters.iter().find_map(|conv| match conv {
            Converter::Words(inner) => Some(inner),
            _ => None,
        })
    }

    pub fn encode(
        &self,
        endpoint: Endpoint,
        format: InviteFormat,
        dictionary_id: usize,
    ) -> Result<String, InviteError> {
        self.converter(format)
            .ok_or(InviteError::UnsupportedFormat(format))?
            .encode(endpoint, dictionary_id)
    }

    /// Works out which format `text` is in and decodes it.
    ///
    /// A converter whose recogniser accepts the text but whose decoder then
    /// fails is skipped. The only error comes from a recognised image whose
    /// contents cannot be read as an invite.
    pub fn detect(&self, text: &str) -> Result<Detected, InviteError> {
        let text = text.trim();
        let container = self.converters.iter().find_map(|conv| match conv {
            Converter::QrImage(inner) if inner.is_format(text) => Some(inner),
            _ => None,
        });
        if let Some(qr) = container {
            let inner = qr.read_text(text)?;
            return match self.detect_text(inner.trim()) {
                Detected::Unknown => Err(InviteError::invalid_text(
                    InviteFormat::QrImage,
                    format!("image holds '{}', which is not an invite", inner),
                )),
                found => Ok(found),
            };
        }
        Ok(self.detect_text(text))
    }

    fn detect_text(&self, text: &str) -> Detected {
        for conv in &self.converters {
            if let Converter::QrImage(_) = conv {
                continue;
            }
            if !conv.is_format(text) {
                continue;
            }
            match conv.decode(text) {
                Ok(endpoint) => return Detected::Found(conv.format(), endpoint),
                Err(e) => log::debug!("'{}' looked like {} but did not decode: {}", text, conv.format(), e),
            }
        }
        Detected::Unknown
    }
}
