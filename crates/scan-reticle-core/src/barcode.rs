use serde::{Deserialize, Serialize};

use crate::Rect;

/// Symbologies a decoder may report.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    QrCode,
    Aztec,
    DataMatrix,
    Pdf417,
    Code128,
    Code39,
    Code93,
    Codabar,
    Ean13,
    Ean8,
    Itf,
    UpcA,
    UpcE,
}

/// One recognized barcode.
///
/// `bounding_box` is expressed in upright frame coordinates, i.e. after the
/// frame rotation has been applied by the decoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Barcode {
    /// Decoded payload, verbatim.
    pub raw_value: String,
    pub bounding_box: Rect,
    #[serde(default = "default_format")]
    pub format: BarcodeFormat,
}

fn default_format() -> BarcodeFormat {
    BarcodeFormat::QrCode
}

impl Barcode {
    pub fn new(raw_value: impl Into<String>, bounding_box: Rect) -> Self {
        Self {
            raw_value: raw_value.into(),
            bounding_box,
            format: BarcodeFormat::QrCode,
        }
    }

    pub fn with_format(mut self, format: BarcodeFormat) -> Self {
        self.format = format;
        self
    }
}

/// Decoder output for one analyzed frame: zero or one barcode.
pub type DetectionResult = Option<Barcode>;
