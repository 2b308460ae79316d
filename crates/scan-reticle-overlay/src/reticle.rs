//! Reticle box geometry and the size-sufficiency heuristic.

use scan_reticle_core::{Rect, Size};

use crate::OverlayParams;

/// Reticle box centered in an overlay of `size`.
pub fn reticle_box(size: Size, params: &OverlayParams) -> Rect {
    let center = nalgebra::Point2::new(size.width * 0.5, size.height * 0.5);
    Rect::from_center(
        center,
        size.width * params.reticle_width_frac,
        size.height * params.reticle_height_frac,
    )
}

/// How close a barcode of on-screen width `box_width` is to filling enough
/// of the reticle, in `[0, 1]`.
///
/// Non-finite or negative widths yield 0; a degenerate overlay (no required
/// width) yields 1 for any positive width.
pub fn size_progress(params: &OverlayParams, overlay: Size, box_width: f32) -> f32 {
    if !box_width.is_finite() || box_width <= 0.0 {
        return 0.0;
    }
    let required = reticle_box(overlay, params).width() * params.required_width_frac;
    if required.is_nan() || required <= 0.0 {
        return 1.0;
    }
    (box_width / required).min(1.0)
}

/// [`size_progress`] with the default 80 % x 35 % reticle and 50 % width
/// requirement.
pub fn progress(overlay_width: f32, overlay_height: f32, box_width: f32) -> f32 {
    size_progress(
        &OverlayParams::default(),
        Size::new(overlay_width, overlay_height),
        box_width,
    )
}

/// True when the target's center lies inside the reticle box.
pub fn is_centered(reticle: &Rect, target: &Rect) -> bool {
    reticle.contains(target.center())
}
