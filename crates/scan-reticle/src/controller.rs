use std::time::Duration;

use log::{error, info, warn};
use scan_reticle_core::Size;
use scan_reticle_overlay::{
    CameraInfo, GraphicOverlay, OverlayMode, OverlayParams, OverlaySurface, ScanSession,
    TickOutcome,
};
use serde::Serialize;

use crate::camera::{CameraConfig, CameraProvider, PermissionGate, PermissionStatus, UserNotice};
use crate::decoder::{DecodeEvent, DecoderOptions};

/// Label text for a decoded barcode.
pub fn barcode_value_label(raw_value: &str) -> String {
    format!("Barcode value: {raw_value}")
}

/// Lifecycle of the camera as seen by the controller.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraState {
    NotStarted,
    AwaitingPermission,
    Running,
    /// Permission denied; the scanner stays inert.
    PermissionDenied,
    /// Binding the use cases failed; logged, not surfaced.
    BindFailed,
}

/// Owns the scan session and everything the host displays around it.
pub struct ScanController {
    params: OverlayParams,
    decoder_options: DecoderOptions,
    camera_config: CameraConfig,
    session: ScanSession<GraphicOverlay>,
    camera_state: CameraState,
    label: Option<String>,
    notices: Vec<UserNotice>,
    permission_notice_shown: bool,
}

impl ScanController {
    pub fn new(params: OverlayParams, overlay_size: Size) -> Self {
        let session = new_session(&params, overlay_size, None);
        Self {
            params,
            decoder_options: DecoderOptions::default(),
            camera_config: CameraConfig::default(),
            session,
            camera_state: CameraState::NotStarted,
            label: None,
            notices: Vec::new(),
            permission_notice_shown: false,
        }
    }

    pub fn with_decoder_options(mut self, options: DecoderOptions) -> Self {
        self.decoder_options = options;
        self
    }

    pub fn with_camera_config(mut self, config: CameraConfig) -> Self {
        self.camera_config = config;
        self
    }

    pub fn set_camera_info(&mut self, camera: Option<CameraInfo>) {
        self.session.surface_mut().set_camera_info(camera);
    }

    pub fn session(&self) -> &ScanSession<GraphicOverlay> {
        &self.session
    }

    pub fn overlay(&self) -> &GraphicOverlay {
        self.session.surface()
    }

    pub fn camera_state(&self) -> CameraState {
        self.camera_state
    }

    /// Text for the value label, once a barcode has been accepted.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn notices(&self) -> &[UserNotice] {
        &self.notices
    }

    /// Drain pending user notices.
    pub fn take_notices(&mut self) -> Vec<UserNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Check the permission and bind the camera when allowed.
    pub fn start(
        &mut self,
        permissions: &mut dyn PermissionGate,
        camera: &mut dyn CameraProvider,
    ) -> CameraState {
        if permissions.has_camera_permission() {
            return self.bind(camera);
        }
        match permissions.request_camera_permission() {
            PermissionStatus::Granted => self.bind(camera),
            PermissionStatus::Denied => self.deny(),
            PermissionStatus::Pending => {
                self.camera_state = CameraState::AwaitingPermission;
                self.camera_state
            }
        }
    }

    /// Answer to a pending permission request.
    pub fn on_permission_result(
        &mut self,
        granted: bool,
        camera: &mut dyn CameraProvider,
    ) -> CameraState {
        if granted {
            self.bind(camera)
        } else {
            self.deny()
        }
    }

    fn bind(&mut self, camera: &mut dyn CameraProvider) -> CameraState {
        self.camera_state = match camera.bind(&self.camera_config) {
            Ok(()) => {
                info!("camera bound ({:?})", self.camera_config);
                CameraState::Running
            }
            Err(err) => {
                error!("camera binding failed: {err}");
                CameraState::BindFailed
            }
        };
        self.camera_state
    }

    fn deny(&mut self) -> CameraState {
        if !self.permission_notice_shown {
            self.permission_notice_shown = true;
            self.notices.push(UserNotice::CameraPermissionRequired);
        }
        warn!("camera permission denied, scanner inert");
        self.camera_state = CameraState::PermissionDenied;
        self.camera_state
    }

    /// Apply a decode completion. Returns the new mode when the session
    /// processed the event, `None` when it was ignored.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self, event), fields(ts = ?event.timestamp))
    )]
    pub fn handle_event(&mut self, event: DecodeEvent, now: Duration) -> Option<OverlayMode> {
        let barcodes = match event.outcome {
            Ok(barcodes) => barcodes,
            Err(err) => {
                warn!("barcode decoding failed: {err}");
                return None;
            }
        };
        if self.session.is_locked() {
            return None;
        }

        let barcode = self.decoder_options.first_accepted(&barcodes);
        if let Some(barcode) = barcode {
            self.label = Some(barcode_value_label(&barcode.raw_value));
        }
        Some(self.session.on_detection_result(barcode, now))
    }

    pub fn tick(&mut self, now: Duration) -> TickOutcome {
        self.session.tick(now)
    }

    /// Start a fresh session: unlocked, overlay empty, label kept.
    pub fn reset_session(&mut self) {
        let size = self.session.surface().size();
        let camera = self.session.surface().camera_info();
        self.session = new_session(&self.params, size, camera);
    }
}

fn new_session(
    params: &OverlayParams,
    size: Size,
    camera: Option<CameraInfo>,
) -> ScanSession<GraphicOverlay> {
    let mut overlay = GraphicOverlay::new(size).with_style(params.style.clone());
    overlay.set_camera_info(camera);
    ScanSession::new(params.clone(), overlay)
}
