use std::time::Duration;

use nalgebra::Point2;
use scan_reticle_core::{Rect, Size};
use serde::{Deserialize, Serialize};

use crate::animation::{LoadingAnimation, ReticlePulse};
use crate::OverlayStyle;

/// Straight (non-premultiplied) 8-bit color.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with alpha multiplied by `scale` (clamped to `[0, 1]`).
    pub fn with_alpha_scale(self, scale: f32) -> Self {
        let a = (self.a as f32 * scale.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub width: f32,
    pub color: Rgba,
}

/// One drawing primitive of a display list, in overlay pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    /// Fill `bounds` with `color` except for the rounded `cutout`.
    Scrim {
        bounds: Rect,
        cutout: Rect,
        corner_radius: f32,
        color: Rgba,
    },
    RoundedRect {
        rect: Rect,
        corner_radius: f32,
        stroke: Stroke,
    },
    /// Part of the rect outline between two perimeter fractions; see
    /// [`perimeter_polyline`]. `end` may exceed 1 to wrap past the start.
    PerimeterSegment {
        rect: Rect,
        start: f32,
        end: f32,
        stroke: Stroke,
    },
}

/// What the overlay currently shows. At most one is present at a time.
#[derive(Clone, Debug, PartialEq)]
pub enum Graphic {
    /// Searching: scrim, reticle box and the pulsing ripple.
    Reticle { reticle: Rect, pulse: ReticlePulse },
    /// A centered barcode that is still too small.
    Confirming {
        reticle: Rect,
        target: Rect,
        progress: f32,
    },
    /// Locked; a segment runs around the box until the ramp completes.
    Loading {
        reticle: Rect,
        animation: LoadingAnimation,
    },
}

impl Graphic {
    pub fn reticle(&self) -> Rect {
        match self {
            Graphic::Reticle { reticle, .. }
            | Graphic::Confirming { reticle, .. }
            | Graphic::Loading { reticle, .. } => *reticle,
        }
    }

    /// Shapes to draw at `now`, back to front.
    pub fn display_list(&self, now: Duration, overlay: Size, style: &OverlayStyle) -> Vec<Shape> {
        let reticle = self.reticle();
        let bounds = Rect::new(0.0, 0.0, overlay.width, overlay.height);
        let mut shapes = vec![
            Shape::Scrim {
                bounds,
                cutout: reticle,
                corner_radius: style.corner_radius,
                color: style.scrim,
            },
            Shape::RoundedRect {
                rect: reticle,
                corner_radius: style.corner_radius,
                stroke: Stroke {
                    width: style.box_stroke_width,
                    color: style.box_stroke,
                },
            },
        ];

        match self {
            Graphic::Reticle { pulse, .. } => {
                let frame = pulse.sample(now);
                if frame.alpha_scale > 0.0 {
                    shapes.push(Shape::RoundedRect {
                        rect: reticle.inflated(style.ripple_offset * frame.expansion),
                        corner_radius: style.corner_radius,
                        stroke: Stroke {
                            width: style.ripple_stroke_width * frame.stroke_width_scale,
                            color: style.ripple.with_alpha_scale(frame.alpha_scale),
                        },
                    });
                }
            }
            Graphic::Confirming {
                target, progress, ..
            } => {
                shapes.push(Shape::RoundedRect {
                    rect: *target,
                    corner_radius: 0.0,
                    stroke: Stroke {
                        width: style.target_stroke_width,
                        color: style.target_stroke,
                    },
                });
                if *progress > 0.0 {
                    shapes.push(Shape::PerimeterSegment {
                        rect: reticle,
                        start: 0.0,
                        end: progress.clamp(0.0, 1.0),
                        stroke: Stroke {
                            width: style.progress_stroke_width,
                            color: style.progress_stroke,
                        },
                    });
                }
            }
            Graphic::Loading { animation, .. } => {
                let threshold = animation.threshold();
                let head = if threshold > 0.0 {
                    animation.value(now) / threshold
                } else {
                    1.0
                };
                shapes.push(Shape::PerimeterSegment {
                    rect: reticle,
                    start: head,
                    end: head + style.loading_segment_frac,
                    stroke: Stroke {
                        width: style.progress_stroke_width,
                        color: style.progress_stroke,
                    },
                });
            }
        }
        shapes
    }
}

/// Corner positions along the outline, as perimeter fractions.
fn corner_fractions(rect: &Rect) -> [f32; 4] {
    let w = rect.width().abs();
    let h = rect.height().abs();
    let p = rect.perimeter();
    if p <= 0.0 {
        return [0.0; 4];
    }
    let c1 = 0.5 * w / p;
    let c2 = c1 + h / p;
    let c3 = c2 + w / p;
    let c4 = c3 + h / p;
    [c1, c2, c3, c4]
}

/// Point on the outline of `rect` at perimeter fraction `f`.
///
/// Fraction 0 is the middle of the top edge; the outline runs clockwise on
/// screen (right along the top edge first). `f` wraps modulo 1.
pub fn perimeter_point(rect: &Rect, f: f32) -> Point2<f32> {
    let p = rect.perimeter();
    if p <= 0.0 {
        return rect.center();
    }
    let w = rect.width().abs();
    let h = rect.height().abs();
    let mut d = f.rem_euclid(1.0) * p;
    let top_middle = rect.left + 0.5 * w;

    let half = 0.5 * w;
    if d <= half {
        return Point2::new(top_middle + d, rect.top);
    }
    d -= half;
    if d <= h {
        return Point2::new(rect.right, rect.top + d);
    }
    d -= h;
    if d <= w {
        return Point2::new(rect.right - d, rect.bottom);
    }
    d -= w;
    if d <= h {
        return Point2::new(rect.left, rect.bottom - d);
    }
    d -= h;
    Point2::new(rect.left + d.min(half), rect.top)
}

/// Polyline following the outline from `start` to `end` (fractions), with a
/// vertex at every corner passed. Spans of a full perimeter or more return
/// the closed outline.
pub fn perimeter_polyline(rect: &Rect, start: f32, end: f32) -> Vec<Point2<f32>> {
    let span = (end - start).clamp(0.0, 1.0);
    let stop = start + span;
    let corners = corner_fractions(rect);

    let base = start.floor();
    let mut breaks: Vec<f32> = (0..3)
        .flat_map(|n| corners.iter().map(move |c| base + n as f32 + c))
        .filter(|&c| c > start && c < stop)
        .collect();
    breaks.sort_by(f32::total_cmp);

    let mut points = Vec::with_capacity(breaks.len() + 2);
    points.push(perimeter_point(rect, start));
    points.extend(breaks.into_iter().map(|c| perimeter_point(rect, c)));
    if span >= 1.0 {
        points.push(perimeter_point(rect, start));
    } else {
        points.push(perimeter_point(rect, stop));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoadingParams;
    use approx::assert_abs_diff_eq;

    fn square() -> Rect {
        Rect::new(0.0, 0.0, 100.0, 100.0)
    }

    #[test]
    fn perimeter_starts_top_middle_and_runs_clockwise() {
        let r = square();
        assert_eq!(perimeter_point(&r, 0.0), Point2::new(50.0, 0.0));
        assert_eq!(perimeter_point(&r, 0.125), Point2::new(100.0, 0.0));
        assert_eq!(perimeter_point(&r, 0.25), Point2::new(100.0, 50.0));
        assert_eq!(perimeter_point(&r, 0.5), Point2::new(50.0, 100.0));
        assert_eq!(perimeter_point(&r, 0.75), Point2::new(0.0, 50.0));
        let wrapped = perimeter_point(&r, 1.25);
        assert_abs_diff_eq!(wrapped.x, 100.0, epsilon = 1e-3);
        assert_abs_diff_eq!(wrapped.y, 50.0, epsilon = 1e-3);
    }

    #[test]
    fn polyline_inserts_passed_corners() {
        let pts = perimeter_polyline(&square(), 0.0, 0.5);
        assert_eq!(
            pts,
            vec![
                Point2::new(50.0, 0.0),
                Point2::new(100.0, 0.0),
                Point2::new(100.0, 100.0),
                Point2::new(50.0, 100.0),
            ]
        );
    }

    #[test]
    fn polyline_wraps_past_start() {
        let pts = perimeter_polyline(&square(), 0.9, 1.2);
        // Only the top-right corner of the next lap (1.125) is in range.
        assert_eq!(pts.len(), 3);
        assert_abs_diff_eq!(pts[1].x, 100.0, epsilon = 1e-3);
        assert_abs_diff_eq!(pts[1].y, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn full_span_closes_the_outline() {
        let pts = perimeter_polyline(&square(), 0.0, 3.0);
        assert_eq!(pts.len(), 6);
        assert_eq!(pts.first(), pts.last());
    }

    #[test]
    fn searching_list_hides_ripple_at_cycle_start() {
        let mut pulse = ReticlePulse::default();
        pulse.start(Duration::ZERO);
        let g = Graphic::Reticle {
            reticle: square(),
            pulse,
        };
        let style = OverlayStyle::default();
        let size = Size::new(200.0, 200.0);
        assert_eq!(g.display_list(Duration::ZERO, size, &style).len(), 2);
        let mid = g.display_list(Duration::from_millis(500), size, &style);
        assert_eq!(mid.len(), 3);
        assert!(matches!(mid[2], Shape::RoundedRect { rect, .. } if rect.width() > 100.0));
    }

    #[test]
    fn confirming_list_draws_target_and_progress() {
        let g = Graphic::Confirming {
            reticle: square(),
            target: Rect::new(40.0, 40.0, 60.0, 60.0),
            progress: 0.4,
        };
        let list = g.display_list(
            Duration::ZERO,
            Size::new(200.0, 200.0),
            &OverlayStyle::default(),
        );
        assert_eq!(list.len(), 4);
        assert!(matches!(list[3], Shape::PerimeterSegment { end, .. } if end == 0.4));
    }

    #[test]
    fn loading_segment_follows_the_ramp() {
        let g = Graphic::Loading {
            reticle: square(),
            animation: LoadingAnimation::start(Duration::ZERO, LoadingParams::default()),
        };
        let list = g.display_list(
            Duration::from_millis(1000),
            Size::new(200.0, 200.0),
            &OverlayStyle::default(),
        );
        match list.last() {
            Some(Shape::PerimeterSegment { start, end, .. }) => {
                assert_abs_diff_eq!(*start, 0.5, epsilon = 1e-4);
                assert_abs_diff_eq!(*end, 0.75, epsilon = 1e-4);
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn alpha_scale_is_clamped() {
        let c = Rgba::new(1, 2, 3, 200);
        assert_eq!(c.with_alpha_scale(0.5).a, 100);
        assert_eq!(c.with_alpha_scale(7.0).a, 200);
        assert_eq!(c.with_alpha_scale(-1.0).a, 0);
    }
}
