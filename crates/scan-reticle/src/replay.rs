//! Replay of scripted decoder output through the full controller.
//!
//! A replay config lists, frame by frame, what the decoder "saw". Running it
//! yields a report of every mode change and animation tick, which is handy
//! for tuning overlay parameters without a camera.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use scan_reticle_core::{Barcode, FrameView, InputImage, Rotation, Size};
use scan_reticle_overlay::{CameraInfo, GraphicOverlay, OverlayMode, OverlayParams, TickOutcome};
use serde::{Deserialize, Serialize};

use crate::camera::UserNotice;
use crate::controller::ScanController;
use crate::decoder::{DecodeError, DecodeEvent, Decoder, DecoderOptions};

#[derive(thiserror::Error, Debug)]
pub enum ReplayError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid overlay size {width}x{height}")]
    InvalidOverlaySize { width: f32, height: f32 },
}

fn default_frame_interval_ms() -> u64 {
    33
}

fn default_settle_ms() -> u64 {
    3000
}

/// What the decoder reports for one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptedFrame {
    pub barcodes: Vec<Barcode>,
    /// When set, the decode fails with this message.
    pub error: Option<String>,
}

/// Configuration for a replay run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReplayConfig {
    pub overlay_size: Size,
    #[serde(default)]
    pub camera: Option<CameraInfo>,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    /// Upper bound on ticking after the last frame.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default)]
    pub overlay: OverlayParams,
    #[serde(default)]
    pub decoder: DecoderOptions,
    pub frames: Vec<ScriptedFrame>,
    #[serde(default)]
    pub preview_path: Option<String>,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub frames_dir: Option<String>,
}

impl ReplayConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ReplayError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> Option<PathBuf> {
        self.output_path.as_ref().map(PathBuf::from)
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

/// Decoder that plays back a fixed script, then reports nothing.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDecoder {
    frames: VecDeque<ScriptedFrame>,
}

impl ScriptedDecoder {
    pub fn new(frames: impl IntoIterator<Item = ScriptedFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl Decoder for ScriptedDecoder {
    fn process(&mut self, _image: &InputImage<'_>) -> Result<Vec<Barcode>, DecodeError> {
        match self.frames.pop_front() {
            Some(ScriptedFrame {
                error: Some(message),
                ..
            }) => Err(DecodeError::Failed(message)),
            Some(frame) => Ok(frame.barcodes),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Frame,
    Tick,
}

/// State after one replay step.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReplayStep {
    pub t_ms: u64,
    pub kind: StepKind,
    pub mode: OverlayMode,
    pub locked: bool,
    pub tick: TickOutcome,
    pub graphics: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReplayReport {
    pub frames: usize,
    pub steps: Vec<ReplayStep>,
    pub final_mode: OverlayMode,
    pub locked: bool,
    pub label: Option<String>,
    /// When the loading animation cleared the overlay, if it did.
    pub cleared_at_ms: Option<u64>,
    pub notices: Vec<UserNotice>,
}

/// Run a replay and return the report.
pub fn run_replay(config: &ReplayConfig) -> Result<ReplayReport, ReplayError> {
    run_replay_with(config, |_, _| {})
}

/// Run a replay, calling `observe` with every step and the overlay state
/// right after it.
pub fn run_replay_with<F>(config: &ReplayConfig, mut observe: F) -> Result<ReplayReport, ReplayError>
where
    F: FnMut(&ReplayStep, &GraphicOverlay),
{
    let size = config.overlay_size;
    if size.is_empty() {
        return Err(ReplayError::InvalidOverlaySize {
            width: size.width,
            height: size.height,
        });
    }

    let mut controller = ScanController::new(config.overlay.clone(), size)
        .with_decoder_options(config.decoder.clone());
    controller.set_camera_info(config.camera);
    let mut decoder = ScriptedDecoder::new(config.frames.iter().cloned());

    // The scripted decoder ignores pixels; one blank plane serves every frame.
    let pixels = [0u8; 4];
    let view = FrameView {
        width: 2,
        height: 2,
        data: &pixels,
    };
    let image = InputImage {
        view,
        rotation: config.camera.map(|c| c.rotation).unwrap_or(Rotation::Deg0),
    };

    let interval = config.frame_interval();
    let mut steps = Vec::new();
    let mut cleared_at_ms = None;
    let mut now = Duration::ZERO;

    for _ in 0..config.frames.len() {
        let outcome = decoder.process(&image);
        let decode_error = outcome.as_ref().err().map(|e| e.to_string());
        controller.handle_event(DecodeEvent { timestamp: now, outcome }, now);
        let tick = controller.tick(now);
        if tick == TickOutcome::Cleared && cleared_at_ms.is_none() {
            cleared_at_ms = Some(now.as_millis() as u64);
        }
        let step = snapshot(&controller, now, StepKind::Frame, tick, decode_error);
        observe(&step, controller.overlay());
        steps.push(step);
        now += interval;
    }

    let settle_until = now + Duration::from_millis(config.settle_ms);
    while cleared_at_ms.is_none() && now <= settle_until && !interval.is_zero() {
        let tick = controller.tick(now);
        if tick == TickOutcome::Idle {
            break;
        }
        if tick == TickOutcome::Cleared {
            cleared_at_ms = Some(now.as_millis() as u64);
        }
        let step = snapshot(&controller, now, StepKind::Tick, tick, None);
        observe(&step, controller.overlay());
        steps.push(step);
        if !controller.session().is_locked() {
            // Only the loading ramp ends on its own; a searching pulse never does.
            break;
        }
        now += interval;
    }
    debug!("replay finished after {} steps", steps.len());

    Ok(ReplayReport {
        frames: config.frames.len(),
        final_mode: controller.session().mode(),
        locked: controller.session().is_locked(),
        label: controller.label().map(str::to_owned),
        cleared_at_ms,
        notices: controller.notices().to_vec(),
        steps,
    })
}

fn snapshot(
    controller: &ScanController,
    now: Duration,
    kind: StepKind,
    tick: TickOutcome,
    decode_error: Option<String>,
) -> ReplayStep {
    ReplayStep {
        t_ms: now.as_millis() as u64,
        kind,
        mode: controller.session().mode(),
        locked: controller.session().is_locked(),
        tick,
        graphics: controller.overlay().graphics().len(),
        decode_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scan_reticle_core::Rect;

    fn config(frames: Vec<ScriptedFrame>) -> ReplayConfig {
        ReplayConfig {
            overlay_size: Size::new(1000.0, 2000.0),
            camera: None,
            frame_interval_ms: 100,
            settle_ms: 3000,
            overlay: OverlayParams::default(),
            decoder: DecoderOptions::default(),
            frames,
            preview_path: None,
            output_path: None,
            frames_dir: None,
        }
    }

    fn barcode(width: f32) -> ScriptedFrame {
        ScriptedFrame {
            barcodes: vec![Barcode::new(
                "payload",
                Rect::new(500.0 - width / 2.0, 950.0, 500.0 + width / 2.0, 1050.0),
            )],
            error: None,
        }
    }

    #[test]
    fn scripted_decoder_plays_back_in_order() {
        let mut dec = ScriptedDecoder::new([
            ScriptedFrame::default(),
            ScriptedFrame {
                barcodes: vec![],
                error: Some("model unavailable".into()),
            },
        ]);
        let pixels = [0u8; 1];
        let image = InputImage {
            view: FrameView {
                width: 1,
                height: 1,
                data: &pixels,
            },
            rotation: Rotation::Deg0,
        };
        assert_eq!(dec.process(&image), Ok(vec![]));
        assert_eq!(
            dec.process(&image),
            Err(DecodeError::Failed("model unavailable".into()))
        );
        assert_eq!(dec.remaining(), 0);
        assert_eq!(dec.process(&image), Ok(vec![]));
    }

    #[test]
    fn replay_locks_and_clears_after_loading() {
        let cfg = config(vec![
            ScriptedFrame::default(),
            ScriptedFrame::default(),
            barcode(500.0),
        ]);
        let report = run_replay(&cfg).expect("replay");
        let modes: Vec<_> = report.steps.iter().take(3).map(|s| s.mode).collect();
        assert_eq!(
            modes,
            vec![
                OverlayMode::Searching,
                OverlayMode::Searching,
                OverlayMode::Loading
            ]
        );
        assert!(report.locked);
        assert_eq!(report.label.as_deref(), Some("Barcode value: payload"));
        // Locked at 200 ms; the ramp lasts 2000 ms.
        assert_eq!(report.cleared_at_ms, Some(2200));
        assert_eq!(report.steps.last().map(|s| s.graphics), Some(0));
    }

    #[test]
    fn decode_errors_are_reported_and_ignored() {
        let cfg = config(vec![
            ScriptedFrame::default(),
            ScriptedFrame {
                barcodes: vec![],
                error: Some("boom".into()),
            },
        ]);
        let report = run_replay(&cfg).expect("replay");
        assert_eq!(report.steps[1].decode_error.as_deref(), Some("decoder failed: boom"));
        assert_eq!(report.steps[1].mode, OverlayMode::Searching);
        assert!(!report.locked);
        assert_eq!(report.cleared_at_ms, None);
    }

    #[test]
    fn bundled_replay_config_walks_every_mode() {
        let cfg: ReplayConfig =
            serde_json::from_str(include_str!("../../../testdata/replay_basic.json"))
                .expect("parse testdata");
        assert_eq!(cfg.camera.map(|c| c.rotation), Some(Rotation::Deg90));
        let report = run_replay(&cfg).expect("replay");

        let frames: Vec<_> = report
            .steps
            .iter()
            .filter(|s| s.kind == StepKind::Frame)
            .collect();
        assert_eq!(frames.len(), 7);
        assert!(frames[..4].iter().all(|s| s.mode == OverlayMode::Searching));
        assert_eq!(frames[2].decode_error.as_deref(), Some("decoder failed: decoder not ready"));
        assert!(matches!(frames[4].mode, OverlayMode::Confirming { .. }));
        assert!(matches!(frames[5].mode, OverlayMode::Confirming { .. }));
        assert_eq!(frames[6].mode, OverlayMode::Loading);

        assert_eq!(
            report.label.as_deref(),
            Some("Barcode value: https://example.com/b")
        );
        // Locked at 198 ms, cleared on the first tick past the 2000 ms ramp.
        let cleared = report.cleared_at_ms.expect("cleared");
        assert!((2198..=2231).contains(&cleared));
    }

    #[test]
    fn empty_overlay_is_rejected() {
        let mut cfg = config(vec![]);
        cfg.overlay_size = Size::new(0.0, 10.0);
        assert!(matches!(
            run_replay(&cfg),
            Err(ReplayError::InvalidOverlaySize { .. })
        ));
    }
}
