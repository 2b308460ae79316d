//! Drive the threaded analyzer with synthetic frames and a toy decoder.
//!
//! The decoder "finds" a barcode that grows a little with every frame, so the
//! overlay walks through searching, confirming and loading.

use std::time::{Duration, Instant};

use log::{info, LevelFilter};
use scan_reticle::core::{init_with_level, Barcode, Frame, InputImage, Rect, Rotation, Size};
use scan_reticle::overlay::{OverlayParams, TickOutcome};
use scan_reticle::{Analyzer, DecodeError, Decoder, Offer, ScanController};

const FRAME_W: usize = 640;
const FRAME_H: usize = 360;

struct GrowingDecoder {
    calls: u32,
}

impl Decoder for GrowingDecoder {
    fn process(&mut self, image: &InputImage<'_>) -> Result<Vec<Barcode>, DecodeError> {
        self.calls += 1;
        std::thread::sleep(Duration::from_millis(20));
        if self.calls < 4 {
            return Ok(Vec::new());
        }
        let upright = image.upright_size();
        let w = 12.0 * self.calls as f32;
        let cx = upright.width * 0.5;
        let cy = upright.height * 0.5;
        Ok(vec![Barcode::new(
            "https://example.com/demo",
            Rect::new(cx - w / 2.0, cy - w / 2.0, cx + w / 2.0, cy + w / 2.0),
        )])
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_with_level(LevelFilter::Info)?;

    let overlay_size = Size::new(720.0, 1280.0);
    let mut controller = ScanController::new(OverlayParams::default(), overlay_size);
    controller.set_camera_info(Some(scan_reticle::overlay::CameraInfo {
        frame_size: Size::new(FRAME_W as f32, FRAME_H as f32),
        rotation: Rotation::Deg90,
    }));

    let mut analyzer = Analyzer::spawn(GrowingDecoder { calls: 0 })?;
    let started = Instant::now();
    let mut last_mode = controller.session().mode();

    loop {
        let now = started.elapsed();
        let frame = Frame::new(
            FRAME_W,
            FRAME_H,
            vec![0; FRAME_W * FRAME_H],
            Rotation::Deg90,
            now,
        )?;
        if analyzer.offer(frame) == Offer::Closed {
            break;
        }

        while let Some(event) = analyzer.try_recv_event() {
            controller.handle_event(event, started.elapsed());
        }
        let mode = controller.session().mode();
        if std::mem::discriminant(&mode) != std::mem::discriminant(&last_mode) {
            info!("mode: {:?}", mode);
            last_mode = mode;
        }
        if controller.tick(started.elapsed()) == TickOutcome::Cleared {
            break;
        }
        if started.elapsed() > Duration::from_secs(10) {
            break;
        }
        std::thread::sleep(Duration::from_millis(16));
    }

    info!(
        "done: label={:?}, dropped frames={}, locked={}",
        controller.label(),
        analyzer.dropped(),
        controller.session().is_locked()
    );
    analyzer.shutdown();
    Ok(())
}
