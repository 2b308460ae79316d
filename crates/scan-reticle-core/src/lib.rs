//! Core types for the scan-reticle overlay engine.
//!
//! This crate is intentionally small. It knows nothing about animations,
//! rendering or any concrete barcode decoder: it only defines the geometry,
//! barcode and frame types the other crates exchange.

mod barcode;
mod frame;
mod geometry;
mod logger;

pub use barcode::{Barcode, BarcodeFormat, DetectionResult};
pub use frame::{Frame, FrameError, FrameView, InputImage, ReleaseHook, Rotation};
pub use geometry::{Rect, Size};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{filter_directives, init, init_from_env, init_with_level, parse_log_env, LoggerConfig, LOG_ENV};
