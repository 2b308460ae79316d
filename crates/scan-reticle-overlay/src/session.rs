use std::time::Duration;

use log::{debug, info};
use scan_reticle_core::{Barcode, Rect};
use serde::Serialize;

use crate::animation::{LoadingAnimation, LoadingState, ReticlePulse};
use crate::graphic::Graphic;
use crate::overlay::OverlaySurface;
use crate::reticle::{is_centered, reticle_box, size_progress};
use crate::OverlayParams;

/// Which visual mode the overlay is in.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OverlayMode {
    /// No detection result seen yet; nothing drawn.
    Idle,
    /// No usable barcode: pulsing reticle.
    Searching,
    /// Centered barcode, too small so far. `target` is in overlay pixels.
    Confirming { target: Rect, progress: f32 },
    /// Confident detection; the session is locked.
    Loading,
}

/// Result of advancing the animations by one tick.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOutcome {
    /// Nothing is animating.
    Idle,
    /// A redraw was requested.
    Redraw,
    /// The loading ramp finished and the overlay was cleared.
    Cleared,
}

/// One scanning session: overlay mode plus the one-way lock.
///
/// A session locks on its first confident detection and then ignores every
/// further result. Build a new session to scan again.
pub struct ScanSession<S: OverlaySurface> {
    params: OverlayParams,
    surface: S,
    mode: OverlayMode,
    locked: bool,
    pulse: ReticlePulse,
    loading: Option<LoadingAnimation>,
    finished: bool,
}

impl<S: OverlaySurface> ScanSession<S> {
    pub fn new(params: OverlayParams, surface: S) -> Self {
        Self {
            params,
            surface,
            mode: OverlayMode::Idle,
            locked: false,
            pulse: ReticlePulse::default(),
            loading: None,
            finished: false,
        }
    }

    pub fn params(&self) -> &OverlayParams {
        &self.params
    }

    pub fn mode(&self) -> OverlayMode {
        self.mode
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// True once the loading ramp has completed and cleared the overlay.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Reticle box for the current surface size.
    pub fn reticle(&self) -> Rect {
        reticle_box(self.surface.size(), &self.params)
    }

    /// Feed the decoder result for the latest frame.
    ///
    /// `result` is in upright frame coordinates; it is mapped through the
    /// surface before the centering and size tests.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip(self, result), fields(has_result = result.is_some()))
    )]
    pub fn on_detection_result(&mut self, result: Option<&Barcode>, now: Duration) -> OverlayMode {
        if self.locked {
            debug!("session locked, ignoring detection result");
            return self.mode;
        }

        let reticle = self.reticle();
        let target = result
            .map(|b| self.surface.map_frame_rect(b.bounding_box))
            .filter(|t| is_centered(&reticle, t));

        let Some(target) = target else {
            if !self.pulse.is_running() {
                self.pulse.start(now);
            }
            let graphic = Graphic::Reticle {
                reticle,
                pulse: self.pulse,
            };
            return self.transition(OverlayMode::Searching, graphic);
        };

        self.pulse.cancel();
        let progress = size_progress(&self.params, self.surface.size(), target.width().abs());
        if progress < 1.0 {
            let graphic = Graphic::Confirming {
                reticle,
                target,
                progress,
            };
            return self.transition(OverlayMode::Confirming { target, progress }, graphic);
        }

        self.locked = true;
        let animation = LoadingAnimation::start(now, self.params.loading);
        self.loading = Some(animation);
        info!("barcode confirmed at {:?}, session locked", now);
        self.transition(OverlayMode::Loading, Graphic::Loading { reticle, animation })
    }

    /// Advance the running animation.
    pub fn tick(&mut self, now: Duration) -> TickOutcome {
        match self.mode {
            OverlayMode::Searching if self.pulse.is_running() => {
                self.surface.invalidate();
                TickOutcome::Redraw
            }
            OverlayMode::Loading if !self.finished => {
                let Some(animation) = self.loading else {
                    return TickOutcome::Idle;
                };
                match animation.state(now) {
                    LoadingState::Running(_) => {
                        self.surface.invalidate();
                        TickOutcome::Redraw
                    }
                    LoadingState::Completed => {
                        self.surface.clear();
                        self.surface.invalidate();
                        self.finished = true;
                        debug!("loading animation complete, overlay cleared");
                        TickOutcome::Cleared
                    }
                }
            }
            _ => TickOutcome::Idle,
        }
    }

    fn transition(&mut self, mode: OverlayMode, graphic: Graphic) -> OverlayMode {
        if std::mem::discriminant(&mode) != std::mem::discriminant(&self.mode) {
            debug!("overlay mode {:?} -> {:?}", self.mode, mode);
        }
        self.surface.clear();
        self.surface.add(graphic);
        self.surface.invalidate();
        self.mode = mode;
        mode
    }
}
