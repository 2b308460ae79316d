use std::time::Duration;

use scan_reticle_core::{Rect, Rotation, Size};
use serde::{Deserialize, Serialize};

use crate::graphic::{Graphic, Shape};
use crate::OverlayStyle;

/// The drawable surface the state machine drives.
pub trait OverlaySurface {
    /// Current surface size in overlay pixels.
    fn size(&self) -> Size;

    /// Remove every graphic.
    fn clear(&mut self);

    fn add(&mut self, graphic: Graphic);

    /// Request a redraw.
    fn invalidate(&mut self);

    /// Map a rect from upright frame coordinates into overlay coordinates.
    fn map_frame_rect(&self, rect: Rect) -> Rect {
        rect
    }
}

/// Camera frame geometry, used to scale decoder boxes onto the overlay.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraInfo {
    /// Frame size as delivered by the sensor, before rotation.
    pub frame_size: Size,
    #[serde(default)]
    pub rotation: Rotation,
}

impl CameraInfo {
    pub fn upright_size(&self) -> Size {
        self.rotation.upright(self.frame_size)
    }
}

/// Ordered graphic list plus redraw bookkeeping.
#[derive(Clone, Debug)]
pub struct GraphicOverlay {
    size: Size,
    style: OverlayStyle,
    camera: Option<CameraInfo>,
    graphics: Vec<Graphic>,
    invalidations: u64,
}

impl GraphicOverlay {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            style: OverlayStyle::default(),
            camera: None,
            graphics: Vec::new(),
            invalidations: 0,
        }
    }

    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    pub fn set_camera_info(&mut self, camera: Option<CameraInfo>) {
        self.camera = camera;
    }

    pub fn camera_info(&self) -> Option<CameraInfo> {
        self.camera
    }

    pub fn graphics(&self) -> &[Graphic] {
        &self.graphics
    }

    pub fn is_empty(&self) -> bool {
        self.graphics.is_empty()
    }

    /// Number of redraw requests so far.
    pub fn invalidations(&self) -> u64 {
        self.invalidations
    }

    /// Horizontal and vertical frame-to-overlay scale factors.
    pub fn scale_factors(&self) -> (f32, f32) {
        let Some(camera) = self.camera else {
            return (1.0, 1.0);
        };
        let upright = camera.upright_size();
        if upright.is_empty() {
            return (1.0, 1.0);
        }
        (
            self.size.width / upright.width,
            self.size.height / upright.height,
        )
    }

    /// Flattened display list of every graphic at `now`.
    pub fn display_list(&self, now: Duration) -> Vec<Shape> {
        self.graphics
            .iter()
            .flat_map(|g| g.display_list(now, self.size, &self.style))
            .collect()
    }
}

impl OverlaySurface for GraphicOverlay {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self) {
        self.graphics.clear();
    }

    fn add(&mut self, graphic: Graphic) {
        self.graphics.push(graphic);
    }

    fn invalidate(&mut self) {
        self.invalidations += 1;
    }

    fn map_frame_rect(&self, rect: Rect) -> Rect {
        let (sx, sy) = self.scale_factors();
        rect.scaled(sx, sy)
    }
}
