use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::graphic::Rgba;

/// Geometry and timing of the overlay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayParams {
    /// Reticle box width as a fraction of the overlay width.
    pub reticle_width_frac: f32,
    /// Reticle box height as a fraction of the overlay height.
    pub reticle_height_frac: f32,
    /// Barcode width needed for a confident detection, as a fraction of the
    /// reticle box width.
    pub required_width_frac: f32,
    pub loading: LoadingParams,
    pub style: OverlayStyle,
}

impl Default for OverlayParams {
    fn default() -> Self {
        Self {
            reticle_width_frac: 0.8,
            reticle_height_frac: 0.35,
            required_width_frac: 0.5,
            loading: LoadingParams::default(),
            style: OverlayStyle::default(),
        }
    }
}

/// Post-lock loading ramp.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingParams {
    pub duration_ms: u64,
    /// Terminal value of the ramp; reaching it clears the overlay.
    pub threshold: f32,
}

impl Default for LoadingParams {
    fn default() -> Self {
        Self {
            duration_ms: 2000,
            threshold: 1.0,
        }
    }
}

impl LoadingParams {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Colors and stroke metrics, in overlay pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub scrim: Rgba,
    pub box_stroke: Rgba,
    pub box_stroke_width: f32,
    pub corner_radius: f32,
    pub ripple: Rgba,
    pub ripple_stroke_width: f32,
    /// How far the ripple grows past the reticle box at full expansion.
    pub ripple_offset: f32,
    pub target_stroke: Rgba,
    pub target_stroke_width: f32,
    pub progress_stroke: Rgba,
    pub progress_stroke_width: f32,
    /// Length of the loading segment as a fraction of the box perimeter.
    pub loading_segment_frac: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            scrim: Rgba::new(0, 0, 0, 0x99),
            box_stroke: Rgba::WHITE,
            box_stroke_width: 9.0,
            corner_radius: 24.0,
            ripple: Rgba::new(0xFF, 0xFF, 0xFF, 0x59),
            ripple_stroke_width: 30.0,
            ripple_offset: 48.0,
            target_stroke: Rgba::new(0xFF, 0xFF, 0xFF, 0xB3),
            target_stroke_width: 4.0,
            progress_stroke: Rgba::new(0x3D, 0x5A, 0xFE, 0xFF),
            progress_stroke_width: 9.0,
            loading_segment_frac: 0.25,
        }
    }
}
