//! Camera collaborators: permission and use-case binding.
//!
//! Both are host services. The controller only needs to know whether it may
//! start, and whether binding the preview + analysis use cases succeeded.

use serde::{Deserialize, Serialize};

/// Result of asking for the camera permission.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// A system prompt is showing; the answer arrives later through
    /// [`crate::ScanController::on_permission_result`].
    Pending,
}

pub trait PermissionGate {
    fn has_camera_permission(&self) -> bool;

    fn request_camera_permission(&mut self) -> PermissionStatus;
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectRatio {
    Ratio4x3,
    #[default]
    Ratio16x9,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LensFacing {
    #[default]
    Back,
    Front,
}

/// Preview and analysis use-case settings.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub aspect_ratio: AspectRatio,
    pub lens: LensFacing,
}

/// Why the camera could not be bound.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("camera in illegal state: {0}")]
    IllegalState(String),

    #[error("invalid camera argument: {0}")]
    IllegalArgument(String),
}

pub trait CameraProvider {
    /// Bind preview and analysis use cases with `config`.
    fn bind(&mut self, config: &CameraConfig) -> Result<(), BindError>;
}

/// Messages meant for the user.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserNotice {
    CameraPermissionRequired,
}

impl UserNotice {
    pub fn message(self) -> &'static str {
        match self {
            UserNotice::CameraPermissionRequired => "Camera permission required",
        }
    }
}
