//! Reticle overlay engine for barcode scanning.
//!
//! Design:
//! - [`reticle`] defines the on-screen guide box and the size-sufficiency
//!   heuristic that turns a barcode width into a `[0, 1]` progress value.
//! - [`animation`] holds the deterministic, clock-driven animations: the
//!   searching pulse and the post-lock loading ramp.
//! - [`Graphic`]s turn mode + time into a flat display list of [`Shape`]s.
//! - [`ScanSession`] is the state machine. It owns the lock and drives an
//!   [`OverlaySurface`] (usually a [`GraphicOverlay`]).
//!
//! Time is always passed in explicitly as a `Duration` since an arbitrary
//! epoch, so every transition is reproducible in tests.

pub mod animation;
pub mod easing;
mod graphic;
mod overlay;
mod params;
pub mod reticle;
mod session;

pub use animation::{LoadingAnimation, LoadingState, PulseFrame, ReticlePulse};
pub use graphic::{perimeter_point, perimeter_polyline, Graphic, Rgba, Shape, Stroke};
pub use overlay::{CameraInfo, GraphicOverlay, OverlaySurface};
pub use params::{LoadingParams, OverlayParams, OverlayStyle};
pub use reticle::{progress, reticle_box, size_progress};
pub use session::{OverlayMode, ScanSession, TickOutcome};
