use std::time::Duration;

use scan_reticle_core::{Barcode, BarcodeFormat, FrameError, InputImage};
use serde::{Deserialize, Serialize};

/// Errors reported by a [`Decoder`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("decoder failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Barcode recognition service.
///
/// Implementations wrap the host's recognition library. A call may return
/// several barcodes; only the first accepted one drives the overlay.
pub trait Decoder {
    fn process(&mut self, image: &InputImage<'_>) -> Result<Vec<Barcode>, DecodeError>;
}

impl<D: Decoder + ?Sized> Decoder for Box<D> {
    fn process(&mut self, image: &InputImage<'_>) -> Result<Vec<Barcode>, DecodeError> {
        (**self).process(image)
    }
}

/// Which symbologies are acted on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderOptions {
    pub formats: Vec<BarcodeFormat>,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            formats: vec![BarcodeFormat::QrCode],
        }
    }
}

impl DecoderOptions {
    /// Empty `formats` accepts everything.
    pub fn accepts(&self, format: BarcodeFormat) -> bool {
        self.formats.is_empty() || self.formats.contains(&format)
    }

    pub fn first_accepted<'a>(&self, barcodes: &'a [Barcode]) -> Option<&'a Barcode> {
        barcodes.iter().find(|b| self.accepts(b.format))
    }
}

/// Completion of one decode request.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodeEvent {
    /// Timestamp of the analyzed frame.
    pub timestamp: Duration,
    pub outcome: Result<Vec<Barcode>, DecodeError>,
}

impl DecodeEvent {
    pub fn decoded(timestamp: Duration, barcodes: Vec<Barcode>) -> Self {
        Self {
            timestamp,
            outcome: Ok(barcodes),
        }
    }

    pub fn failed(timestamp: Duration, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            outcome: Err(DecodeError::Failed(message.into())),
        }
    }
}
