//! Interpolation curves for overlay animations.

/// CSS-style cubic bezier easing through (0,0), (x1,y1), (x2,y2), (1,1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Material "fast out, slow in" curve.
pub const FAST_OUT_SLOW_IN: CubicBezier = CubicBezier {
    x1: 0.4,
    y1: 0.0,
    x2: 0.2,
    y2: 1.0,
};

const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 24;
const EPSILON: f32 = 1e-6;

impl CubicBezier {
    fn sample(a1: f32, a2: f32, s: f32) -> f32 {
        // B(s) = 3(1-s)^2 s a1 + 3(1-s) s^2 a2 + s^3
        let inv = 1.0 - s;
        3.0 * inv * inv * s * a1 + 3.0 * inv * s * s * a2 + s * s * s
    }

    fn slope(a1: f32, a2: f32, s: f32) -> f32 {
        let inv = 1.0 - s;
        3.0 * inv * inv * a1 + 6.0 * inv * s * (a2 - a1) + 3.0 * s * s * (1.0 - a2)
    }

    fn solve_s(&self, x: f32) -> f32 {
        let mut s = x;
        for _ in 0..NEWTON_ITERATIONS {
            let err = Self::sample(self.x1, self.x2, s) - x;
            if err.abs() < EPSILON {
                return s;
            }
            let d = Self::slope(self.x1, self.x2, s);
            if d.abs() < EPSILON {
                break;
            }
            s = (s - err / d).clamp(0.0, 1.0);
        }

        let (mut lo, mut hi) = (0.0f32, 1.0f32);
        s = x;
        for _ in 0..BISECTION_ITERATIONS {
            let v = Self::sample(self.x1, self.x2, s);
            if (v - x).abs() < EPSILON {
                break;
            }
            if v < x {
                lo = s;
            } else {
                hi = s;
            }
            s = 0.5 * (lo + hi);
        }
        s
    }

    /// Eased value for input fraction `t`, clamped to `[0, 1]`.
    pub fn ease(&self, t: f32) -> f32 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        Self::sample(self.y1, self.y2, self.solve_s(t))
    }
}

/// Android's default value-animator curve: slow start, slow end.
pub fn accelerate_decelerate(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    ((t + 1.0) * std::f32::consts::PI).cos() * 0.5 + 0.5
}
