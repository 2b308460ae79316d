use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Size;

/// Errors raised at the frame boundary.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("invalid frame buffer length (expected {expected} bytes, got {got})")]
    InvalidBuffer { expected: usize, got: usize },

    #[error("invalid frame dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },

    #[error("unsupported rotation of {0} degrees (expected 0, 90, 180 or 270)")]
    InvalidRotation(u32),
}

/// Clockwise rotation needed to bring a sensor frame upright.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(degrees: u32) -> Result<Self, FrameError> {
        match degrees {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(FrameError::InvalidRotation(other)),
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// True when the rotation swaps width and height.
    pub fn is_transposing(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }

    /// Size of a `width x height` sensor frame once rotated upright.
    pub fn upright(self, size: Size) -> Size {
        if self.is_transposing() {
            size.transposed()
        } else {
            size
        }
    }
}

impl TryFrom<u32> for Rotation {
    type Error = FrameError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_degrees(value)
    }
}

impl From<Rotation> for u32 {
    fn from(value: Rotation) -> Self {
        value.degrees()
    }
}

/// Borrowed luma plane, row-major, `len = width * height`.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

impl<'a> FrameView<'a> {
    /// Validate dimensions against the buffer length.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::InvalidDimensions { width, height });
        }
        let Some(expected) = width.checked_mul(height) else {
            return Err(FrameError::InvalidDimensions { width, height });
        };
        if data.len() != expected {
            return Err(FrameError::InvalidBuffer {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as f32, self.height as f32)
    }
}

/// What a decoder receives: pixels plus the rotation it must apply.
#[derive(Clone, Copy, Debug)]
pub struct InputImage<'a> {
    pub view: FrameView<'a>,
    pub rotation: Rotation,
}

impl InputImage<'_> {
    /// Size of the image in the coordinate system barcodes are reported in.
    pub fn upright_size(&self) -> Size {
        self.rotation.upright(self.view.size())
    }
}

/// Callback run exactly once when a [`Frame`] is released.
pub type ReleaseHook = Box<dyn FnOnce() + Send>;

/// Owned camera frame handed out by a frame source.
///
/// The release hook returns the buffer to the camera pipeline. It runs when
/// the frame is dropped, so every exit path of an analyzer releases it.
pub struct Frame {
    width: usize,
    height: usize,
    data: Vec<u8>,
    rotation: Rotation,
    timestamp: Duration,
    on_release: Option<ReleaseHook>,
}

impl Frame {
    pub fn new(
        width: usize,
        height: usize,
        data: Vec<u8>,
        rotation: Rotation,
        timestamp: Duration,
    ) -> Result<Self, FrameError> {
        FrameView::new(width, height, &data)?;
        Ok(Self {
            width,
            height,
            data,
            rotation,
            timestamp,
            on_release: None,
        })
    }

    /// Attach the hook that hands the buffer back to its producer.
    pub fn with_release_hook(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }

    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    pub fn input_image(&self) -> InputImage<'_> {
        InputImage {
            view: self.view(),
            rotation: self.rotation,
        }
    }

    /// Release explicitly; equivalent to dropping the frame.
    pub fn close(self) {}
}

impl Drop for Frame {
    fn drop(&mut self) {
        if let Some(hook) = self.on_release.take() {
            hook();
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rotation", &self.rotation)
            .field("timestamp", &self.timestamp)
            .field("has_release_hook", &self.on_release.is_some())
            .finish()
    }
}
