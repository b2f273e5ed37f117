//! Invites carried inside a QR code image, shipped around as base64 text.
//!
//! The raster work is done by whatever implements [`QrCodec`]; this module
//! only knows how to wrap the plain `ip:port` text and recognise the result.

use crate::canonical::Endpoint;
use crate::error::InviteError;
use crate::formats::{InviteFormat, PlainConverter};
use std::fmt;
use std::sync::Arc;

/// Shortest base64 string that is considered a possible image.
pub const MIN_CONTAINER_LEN: usize = 100;
pub const PNG_SIGNATURE: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];

const MIN_IMAGE_BYTES: usize = 8;
const MAX_PADDING: usize = 3;

/// QR error correction level.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum EccLevel {
    L,
    M,
    Q,
    H,
}

pub trait QrCodec: Send + Sync {
    /// Renders `text` as an image.
    fn render(&self, text: &str, level: EccLevel) -> Result<Vec<u8>, InviteError>;
    /// Reads the text of the first QR code found in `image`.
    fn scan(&self, image: &[u8]) -> Option<String>;
    /// Leading bytes every image produced by `render` starts with.
    fn signature(&self) -> &[u8] {
        &PNG_SIGNATURE
    }
}

fn is_base64_text(text: &str) -> bool {
    let body = text.trim_end_matches('=');
    text.len() % 4 == 0
        && text.len() - body.len() <= MAX_PADDING
        && body
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}

#[derive(Clone)]
pub struct QrImageConverter {
    codec: Arc<dyn QrCodec>,
}

impl fmt::Debug for QrImageConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QrImageConverter")
            .field("signature", &self.codec.signature())
            .finish()
    }
}

impl QrImageConverter {
    pub fn new(codec: Arc<dyn QrCodec>) -> Self {
        Self { codec }
    }

    fn unwrap_image(&self, text: &str) -> Option<Vec<u8>> {
        if text.len() < MIN_CONTAINER_LEN || !is_base64_text(text) {
            return None;
        }
        let bytes = base64::decode(text).ok()?;
        if bytes.len() <= MIN_IMAGE_BYTES || !bytes.starts_with(self.codec.signature()) {
            return None;
        }
        Some(bytes)
    }

    pub fn is_format(&self, text: &str) -> bool {
        self.unwrap_image(text).is_some()
    }

    /// Returns the text stored in the image, without interpreting it.
    pub fn read_text(&self, text: &str) -> Result<String, InviteError> {
        let image = self.unwrap_image(text).ok_or_else(|| {
            InviteError::invalid_text(InviteFormat::QrImage, "not a base64-encoded image")
        })?;
        self.codec
            .scan(&image)
            .ok_or_else(|| InviteError::ImageDecode("no QR code found".to_owned()))
    }

    pub fn encode(&self, endpoint: Endpoint) -> Result<String, InviteError> {
        let text = PlainConverter.encode(endpoint);
        let image = self.codec.render(&text, EccLevel::Q)?;
        Ok(base64::encode(&image))
    }

    pub fn decode(&self, text: &str) -> Result<Endpoint, InviteError> {
        let inner = self.read_text(text)?;
        PlainConverter.decode(inner.trim())
    }
}
