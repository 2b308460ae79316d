//! Rasterizes an overlay display list with `tiny-skia`.

use std::path::Path;
use std::time::Duration;

use scan_reticle_core::Rect;
use scan_reticle_overlay::{perimeter_polyline, GraphicOverlay, OverlaySurface, Rgba, Shape, Stroke};

/// Cubic approximation constant for a quarter circle.
const KAPPA: f32 = 0.552_284_8;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("invalid canvas size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Draws [`Shape`]s onto RGBA pixmaps.
#[derive(Clone, Copy, Debug)]
pub struct RasterRenderer {
    pub anti_alias: bool,
}

impl Default for RasterRenderer {
    fn default() -> Self {
        Self { anti_alias: true }
    }
}

impl RasterRenderer {
    /// Render the overlay at `now` onto a transparent canvas of the overlay
    /// size.
    pub fn render(
        &self,
        overlay: &GraphicOverlay,
        now: Duration,
    ) -> Result<tiny_skia::Pixmap, RenderError> {
        let size = overlay.size();
        let (w, h) = (size.width.round() as u32, size.height.round() as u32);
        let mut pixmap =
            tiny_skia::Pixmap::new(w, h).ok_or(RenderError::InvalidSize { width: w, height: h })?;
        pixmap.fill(tiny_skia::Color::TRANSPARENT);
        self.draw_shapes(&mut pixmap, &overlay.display_list(now));
        Ok(pixmap)
    }

    /// Render the overlay composited over a preview frame. The preview is
    /// drawn at its own size; the overlay is expected to match it.
    pub fn render_over(
        &self,
        overlay: &GraphicOverlay,
        now: Duration,
        preview: &image::RgbaImage,
    ) -> Result<tiny_skia::Pixmap, RenderError> {
        let mut pixmap = pixmap_from_rgba(preview)?;
        self.draw_shapes(&mut pixmap, &overlay.display_list(now));
        Ok(pixmap)
    }

    pub fn draw_shapes(&self, pixmap: &mut tiny_skia::Pixmap, shapes: &[Shape]) {
        for shape in shapes {
            self.draw_shape(pixmap, shape);
        }
    }

    fn paint(&self, color: Rgba) -> tiny_skia::Paint<'static> {
        let mut paint = tiny_skia::Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = self.anti_alias;
        paint
    }

    fn draw_shape(&self, pixmap: &mut tiny_skia::Pixmap, shape: &Shape) {
        let ts = tiny_skia::Transform::identity();
        match shape {
            Shape::Scrim {
                bounds,
                cutout,
                corner_radius,
                color,
            } => {
                let mut pb = tiny_skia::PathBuilder::new();
                push_rounded_rect(&mut pb, bounds, 0.0);
                push_rounded_rect(&mut pb, cutout, *corner_radius);
                if let Some(path) = pb.finish() {
                    pixmap.fill_path(
                        &path,
                        &self.paint(*color),
                        tiny_skia::FillRule::EvenOdd,
                        ts,
                        None,
                    );
                }
            }
            Shape::RoundedRect {
                rect,
                corner_radius,
                stroke,
            } => {
                let mut pb = tiny_skia::PathBuilder::new();
                push_rounded_rect(&mut pb, rect, *corner_radius);
                if let Some(path) = pb.finish() {
                    self.stroke(pixmap, &path, stroke, tiny_skia::LineCap::Butt);
                }
            }
            Shape::PerimeterSegment {
                rect,
                start,
                end,
                stroke,
            } => {
                let points = perimeter_polyline(rect, *start, *end);
                let Some((first, rest)) = points.split_first() else {
                    return;
                };
                let mut pb = tiny_skia::PathBuilder::new();
                pb.move_to(first.x, first.y);
                for p in rest {
                    pb.line_to(p.x, p.y);
                }
                if let Some(path) = pb.finish() {
                    self.stroke(pixmap, &path, stroke, tiny_skia::LineCap::Round);
                }
            }
        }
    }

    fn stroke(
        &self,
        pixmap: &mut tiny_skia::Pixmap,
        path: &tiny_skia::Path,
        stroke: &Stroke,
        line_cap: tiny_skia::LineCap,
    ) {
        if stroke.width <= 0.0 || stroke.color.a == 0 {
            return;
        }
        let style = tiny_skia::Stroke {
            width: stroke.width,
            line_cap,
            line_join: tiny_skia::LineJoin::Round,
            ..tiny_skia::Stroke::default()
        };
        pixmap.stroke_path(
            path,
            &self.paint(stroke.color),
            &style,
            tiny_skia::Transform::identity(),
            None,
        );
    }
}

fn push_rounded_rect(pb: &mut tiny_skia::PathBuilder, rect: &Rect, radius: f32) {
    let (l, t, r, b) = (rect.left, rect.top, rect.right, rect.bottom);
    let rad = radius
        .max(0.0)
        .min(rect.width().abs() * 0.5)
        .min(rect.height().abs() * 0.5);
    if rad <= 0.0 {
        pb.move_to(l, t);
        pb.line_to(r, t);
        pb.line_to(r, b);
        pb.line_to(l, b);
        pb.close();
        return;
    }
    let k = rad * KAPPA;
    pb.move_to(l + rad, t);
    pb.line_to(r - rad, t);
    pb.cubic_to(r - rad + k, t, r, t + rad - k, r, t + rad);
    pb.line_to(r, b - rad);
    pb.cubic_to(r, b - rad + k, r - rad + k, b, r - rad, b);
    pb.line_to(l + rad, b);
    pb.cubic_to(l + rad - k, b, l, b - rad + k, l, b - rad);
    pb.line_to(l, t + rad);
    pb.cubic_to(l, t + rad - k, l + rad - k, t, l + rad, t);
    pb.close();
}

/// Copy a straight-alpha image into a premultiplied pixmap.
pub fn pixmap_from_rgba(img: &image::RgbaImage) -> Result<tiny_skia::Pixmap, RenderError> {
    let (w, h) = img.dimensions();
    let mut pixmap =
        tiny_skia::Pixmap::new(w, h).ok_or(RenderError::InvalidSize { width: w, height: h })?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Copy a pixmap back into a straight-alpha image.
pub fn rgba_from_pixmap(pixmap: &tiny_skia::Pixmap) -> image::RgbaImage {
    let mut img = image::RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}

/// Load a preview frame from disk.
pub fn load_preview(path: impl AsRef<Path>) -> Result<image::RgbaImage, RenderError> {
    Ok(image::ImageReader::open(path)
        .map_err(image::ImageError::IoError)?
        .decode()?
        .to_rgba8())
}

/// Save a pixmap as PNG.
pub fn save_png(pixmap: &tiny_skia::Pixmap, path: impl AsRef<Path>) -> Result<(), RenderError> {
    rgba_from_pixmap(pixmap).save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scan_reticle_core::{Barcode, Size};
    use scan_reticle_overlay::{OverlayParams, ScanSession};

    fn alpha_at(pixmap: &tiny_skia::Pixmap, x: u32, y: u32) -> u8 {
        pixmap
            .pixel(x, y)
            .map(|p| p.alpha())
            .unwrap_or_default()
    }

    #[test]
    fn empty_overlay_renders_transparent() {
        let overlay = GraphicOverlay::new(Size::new(64.0, 64.0));
        let pixmap = RasterRenderer::default()
            .render(&overlay, Duration::ZERO)
            .expect("render");
        assert!(pixmap.pixels().iter().all(|p| p.alpha() == 0));
    }

    #[test]
    fn searching_overlay_dims_outside_the_reticle() {
        let mut session = ScanSession::new(
            OverlayParams::default(),
            GraphicOverlay::new(Size::new(200.0, 400.0)),
        );
        session.on_detection_result(None, Duration::ZERO);
        let pixmap = RasterRenderer::default()
            .render(session.surface(), Duration::ZERO)
            .expect("render");
        // Reticle is (20, 130) - (180, 270).
        assert!((0x98..=0x9A).contains(&alpha_at(&pixmap, 5, 5)));
        assert_eq!(alpha_at(&pixmap, 100, 200), 0);
        assert!(alpha_at(&pixmap, 100, 130) > 0x99);
    }

    #[test]
    fn loading_overlay_composites_over_preview() {
        let mut session = ScanSession::new(
            OverlayParams::default(),
            GraphicOverlay::new(Size::new(100.0, 100.0)),
        );
        let barcode = Barcode::new("x", scan_reticle_core::Rect::new(25.0, 45.0, 75.0, 55.0));
        session.on_detection_result(Some(&barcode), Duration::ZERO);
        let preview = image::RgbaImage::from_pixel(100, 100, image::Rgba([10, 200, 30, 255]));
        let pixmap = RasterRenderer::default()
            .render_over(session.surface(), Duration::from_millis(500), &preview)
            .expect("render");
        let inside = rgba_from_pixmap(&pixmap).get_pixel(50, 50).0;
        assert_eq!(inside, [10, 200, 30, 255]);
    }

    #[test]
    fn zero_sized_overlay_is_an_error() {
        let overlay = GraphicOverlay::new(Size::new(0.0, 10.0));
        assert!(matches!(
            RasterRenderer::default().render(&overlay, Duration::ZERO),
            Err(RenderError::InvalidSize { .. })
        ));
    }
}
