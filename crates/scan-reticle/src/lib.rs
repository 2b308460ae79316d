//! High-level facade crate for the `scan-reticle-*` workspace.
//!
//! This crate provides:
//! - re-exports of the core types and the overlay state machine,
//! - the seams to the host application: [`Decoder`], [`FrameSource`],
//!   [`camera::PermissionGate`] and [`camera::CameraProvider`],
//! - a single-slot threaded [`Analyzer`] and the [`ScanController`] that
//!   turns decode events into overlay transitions and label text,
//! - JSON replay of scripted decoder output ([`replay`]),
//! - (feature `raster`) a `tiny-skia` renderer for the overlay display list.
//!
//! ## Quickstart
//!
//! ```no_run
//! use std::time::Duration;
//! use scan_reticle::{ScanController, DecodeEvent};
//! use scan_reticle::core::{Barcode, Rect, Size};
//! use scan_reticle::overlay::{OverlayMode, OverlayParams};
//!
//! let mut controller = ScanController::new(OverlayParams::default(), Size::new(1000.0, 2000.0));
//! let barcode = Barcode::new("hello", Rect::new(250.0, 950.0, 750.0, 1050.0));
//! let event = DecodeEvent::decoded(Duration::ZERO, vec![barcode]);
//! assert_eq!(controller.handle_event(event, Duration::ZERO), Some(OverlayMode::Loading));
//! assert_eq!(controller.label(), Some("Barcode value: hello"));
//! ```
//!
//! ## API map
//! - `scan_reticle::core`: geometry, barcode and frame types.
//! - `scan_reticle::overlay`: reticle heuristic, animations, graphics, `ScanSession`.
//! - `scan_reticle::replay`: scripted decoder and report generation.
//! - `scan_reticle::render` (feature `raster`): display list to pixels.

pub use scan_reticle_core as core;
pub use scan_reticle_overlay as overlay;

mod analyzer;
pub mod camera;
mod controller;
mod decoder;
pub mod replay;

#[cfg(feature = "raster")]
pub mod render;

pub use analyzer::{Analyzer, AnalyzerError, FrameSource, Offer};
pub use controller::{barcode_value_label, CameraState, ScanController};
pub use decoder::{DecodeError, DecodeEvent, Decoder, DecoderOptions};
