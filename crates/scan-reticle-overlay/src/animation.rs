//! Clock-driven overlay animations.
//!
//! Both animations are plain `Copy` values holding their start time; the
//! caller samples them with the current time. Nothing here spawns timers.

use std::time::Duration;

use crate::easing::{accelerate_decelerate, FAST_OUT_SLOW_IN};
use crate::LoadingParams;

const RIPPLE_FADE_IN_MS: f32 = 333.0;
const RIPPLE_FADE_OUT_DELAY_MS: f32 = 667.0;
const RIPPLE_FADE_OUT_MS: f32 = 500.0;
const RIPPLE_EXPAND_DELAY_MS: f32 = 333.0;
const RIPPLE_EXPAND_MS: f32 = 833.0;
const RIPPLE_STROKE_SHRINK_DELAY_MS: f32 = 333.0;
const RIPPLE_STROKE_SHRINK_MS: f32 = 833.0;
const RESTART_DORMANCY_DELAY_MS: u64 = 1167;
const RESTART_DORMANCY_MS: u64 = 1333;

/// Full pulse period, including the dormant tail before the restart.
pub const PULSE_CYCLE: Duration =
    Duration::from_millis(RESTART_DORMANCY_DELAY_MS + RESTART_DORMANCY_MS);

/// Ripple parameters at one instant of the pulse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PulseFrame {
    /// Multiplier for the ripple color alpha, `[0, 1]`.
    pub alpha_scale: f32,
    /// How far the ripple has grown past the reticle box, `[0, 1]`.
    pub expansion: f32,
    /// Multiplier for the ripple stroke width, `[0.5, 1]`.
    pub stroke_width_scale: f32,
}

impl PulseFrame {
    /// Ripple state while the pulse is not running.
    pub const REST: Self = Self {
        alpha_scale: 0.0,
        expansion: 0.0,
        stroke_width_scale: 1.0,
    };
}

/// Repeating ripple around the reticle box while searching.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReticlePulse {
    started_at: Option<Duration>,
}

impl ReticlePulse {
    pub fn start(&mut self, now: Duration) {
        self.started_at = Some(now);
    }

    pub fn cancel(&mut self) {
        self.started_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Ripple state at `now`; [`PulseFrame::REST`] when not running.
    pub fn sample(&self, now: Duration) -> PulseFrame {
        let Some(start) = self.started_at else {
            return PulseFrame::REST;
        };
        let elapsed = now.saturating_sub(start);
        let cycle_ms = PULSE_CYCLE.as_millis();
        let t = (elapsed.as_millis() % cycle_ms) as f32;
        pulse_at(t)
    }
}

fn window(t: f32, delay: f32, duration: f32) -> f32 {
    ((t - delay) / duration).clamp(0.0, 1.0)
}

fn pulse_at(t: f32) -> PulseFrame {
    let alpha_scale = if t < RIPPLE_FADE_OUT_DELAY_MS {
        window(t, 0.0, RIPPLE_FADE_IN_MS)
    } else {
        1.0 - window(t, RIPPLE_FADE_OUT_DELAY_MS, RIPPLE_FADE_OUT_MS)
    };
    let expansion = FAST_OUT_SLOW_IN.ease(window(t, RIPPLE_EXPAND_DELAY_MS, RIPPLE_EXPAND_MS));
    let shrink = FAST_OUT_SLOW_IN.ease(window(
        t,
        RIPPLE_STROKE_SHRINK_DELAY_MS,
        RIPPLE_STROKE_SHRINK_MS,
    ));
    PulseFrame {
        alpha_scale,
        expansion,
        stroke_width_scale: 1.0 - 0.5 * shrink,
    }
}

/// Where a loading ramp is at a given instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LoadingState {
    /// Still ramping; carries the current value in `[0, threshold)`.
    Running(f32),
    /// The full duration has elapsed.
    Completed,
}

/// One-shot ramp from 0 to `threshold` over `duration`, started on lock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoadingAnimation {
    started_at: Duration,
    duration: Duration,
    threshold: f32,
}

impl LoadingAnimation {
    pub fn start(now: Duration, params: LoadingParams) -> Self {
        Self {
            started_at: now,
            duration: params.duration(),
            threshold: params.threshold,
        }
    }

    pub fn started_at(&self) -> Duration {
        self.started_at
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Linear time fraction in `[0, 1]`.
    pub fn fraction(&self, now: Duration) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0) as f32
    }

    /// Animated value in `[0, threshold]`.
    pub fn value(&self, now: Duration) -> f32 {
        match self.state(now) {
            LoadingState::Running(v) => v,
            LoadingState::Completed => self.threshold,
        }
    }

    pub fn state(&self, now: Duration) -> LoadingState {
        if now.saturating_sub(self.started_at) >= self.duration {
            return LoadingState::Completed;
        }
        // Completion is decided by time alone; near the end the eased value
        // rounds up to the threshold in f32, so keep it strictly below.
        let v = self.threshold * accelerate_decelerate(self.fraction(now));
        LoadingState::Running(v.min(self.threshold.next_down()).max(0.0))
    }
}
