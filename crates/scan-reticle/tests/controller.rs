use std::time::Duration;

use scan_reticle::camera::{
    BindError, CameraConfig, CameraProvider, PermissionGate, PermissionStatus, UserNotice,
};
use scan_reticle::core::{Barcode, BarcodeFormat, Rect, Size};
use scan_reticle::overlay::{OverlayMode, OverlayParams, TickOutcome};
use scan_reticle::{CameraState, DecodeEvent, DecoderOptions, ScanController};

struct Permissions {
    granted: bool,
    answer: PermissionStatus,
    requests: usize,
}

impl PermissionGate for Permissions {
    fn has_camera_permission(&self) -> bool {
        self.granted
    }

    fn request_camera_permission(&mut self) -> PermissionStatus {
        self.requests += 1;
        self.answer
    }
}

#[derive(Default)]
struct Camera {
    fail_with: Option<BindError>,
    binds: Vec<CameraConfig>,
}

impl CameraProvider for Camera {
    fn bind(&mut self, config: &CameraConfig) -> Result<(), BindError> {
        self.binds.push(*config);
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn controller() -> ScanController {
    let _ = env_logger::builder().is_test(true).try_init();
    ScanController::new(OverlayParams::default(), Size::new(1000.0, 2000.0))
}

fn centered(raw: &str, width: f32) -> Barcode {
    Barcode::new(
        raw,
        Rect::new(500.0 - width / 2.0, 960.0, 500.0 + width / 2.0, 1040.0),
    )
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[test]
fn granted_permission_binds_camera() {
    let mut c = controller();
    let mut perms = Permissions {
        granted: true,
        answer: PermissionStatus::Denied,
        requests: 0,
    };
    let mut camera = Camera::default();
    assert_eq!(c.start(&mut perms, &mut camera), CameraState::Running);
    assert_eq!(perms.requests, 0);
    assert_eq!(camera.binds, vec![CameraConfig::default()]);
    assert!(c.notices().is_empty());
}

#[test]
fn denied_permission_shows_notice_once_and_stays_inert() {
    let mut c = controller();
    let mut perms = Permissions {
        granted: false,
        answer: PermissionStatus::Denied,
        requests: 0,
    };
    let mut camera = Camera::default();
    assert_eq!(c.start(&mut perms, &mut camera), CameraState::PermissionDenied);
    assert_eq!(c.start(&mut perms, &mut camera), CameraState::PermissionDenied);
    assert_eq!(c.notices(), &[UserNotice::CameraPermissionRequired]);
    assert_eq!(
        c.take_notices()[0].message(),
        "Camera permission required"
    );
    assert!(camera.binds.is_empty());
}

#[test]
fn pending_permission_binds_when_answered() {
    let mut c = controller();
    let mut perms = Permissions {
        granted: false,
        answer: PermissionStatus::Pending,
        requests: 0,
    };
    let mut camera = Camera::default();
    assert_eq!(
        c.start(&mut perms, &mut camera),
        CameraState::AwaitingPermission
    );
    assert_eq!(c.on_permission_result(true, &mut camera), CameraState::Running);
    assert_eq!(camera.binds.len(), 1);
}

#[test]
fn bind_failure_is_logged_not_surfaced() {
    let mut c = controller();
    let mut perms = Permissions {
        granted: true,
        answer: PermissionStatus::Granted,
        requests: 0,
    };
    let mut camera = Camera {
        fail_with: Some(BindError::IllegalState("camera closed".into())),
        ..Camera::default()
    };
    assert_eq!(c.start(&mut perms, &mut camera), CameraState::BindFailed);
    assert!(c.notices().is_empty());
}

#[test]
fn decode_failure_leaves_overlay_untouched() {
    let mut c = controller();
    c.handle_event(DecodeEvent::decoded(ms(0), vec![]), ms(0));
    let before = c.overlay().invalidations();
    assert_eq!(
        c.handle_event(DecodeEvent::failed(ms(33), "scanner closed"), ms(33)),
        None
    );
    assert_eq!(c.overlay().invalidations(), before);
    assert_eq!(c.session().mode(), OverlayMode::Searching);
    // The next frame proceeds normally.
    let mode = c.handle_event(
        DecodeEvent::decoded(ms(66), vec![centered("abc", 100.0)]),
        ms(66),
    );
    assert!(matches!(mode, Some(OverlayMode::Confirming { .. })));
}

#[test]
fn confident_barcode_sets_label_and_locks() {
    let mut c = controller();
    for (i, event) in [
        DecodeEvent::decoded(ms(0), vec![]),
        DecodeEvent::decoded(ms(33), vec![]),
        DecodeEvent::decoded(ms(66), vec![centered("ISBN 978-3-16", 600.0)]),
    ]
    .into_iter()
    .enumerate()
    {
        let now = ms(i as u64 * 33);
        c.handle_event(event, now);
    }
    assert!(c.session().is_locked());
    assert_eq!(c.label(), Some("Barcode value: ISBN 978-3-16"));

    // Late results are ignored, including a different payload.
    assert_eq!(
        c.handle_event(
            DecodeEvent::decoded(ms(99), vec![centered("other", 600.0)]),
            ms(99)
        ),
        None
    );
    assert_eq!(c.label(), Some("Barcode value: ISBN 978-3-16"));
    assert_eq!(c.session().mode(), OverlayMode::Loading);
}

#[test]
fn loading_runs_for_two_seconds_then_clears() {
    let mut c = controller();
    c.handle_event(
        DecodeEvent::decoded(ms(0), vec![centered("x", 500.0)]),
        ms(0),
    );
    let mut t = 0;
    while t < 2000 {
        assert_eq!(c.tick(ms(t)), TickOutcome::Redraw, "at {t} ms");
        t += 16;
    }
    assert_eq!(c.tick(ms(2000)), TickOutcome::Cleared);
    assert!(c.overlay().is_empty());
}

#[test]
fn off_center_decode_still_shows_its_value() {
    let mut c = controller();
    let corner = Barcode::new("x", Rect::new(0.0, 0.0, 500.0, 100.0));
    assert_eq!(
        c.handle_event(DecodeEvent::decoded(ms(0), vec![corner]), ms(0)),
        Some(OverlayMode::Searching)
    );
    assert_eq!(c.label(), Some("Barcode value: x"));
    assert!(!c.session().is_locked());

    c.handle_event(DecodeEvent::decoded(ms(33), vec![centered("y", 500.0)]), ms(33));
    assert_eq!(c.label(), Some("Barcode value: y"));
    c.handle_event(
        DecodeEvent::decoded(ms(66), vec![Barcode::new("z", Rect::new(0.0, 0.0, 10.0, 10.0))]),
        ms(66),
    );
    assert_eq!(c.label(), Some("Barcode value: y"));
}

#[test]
fn unaccepted_formats_count_as_nothing_detected() {
    let mut c = controller();
    let ean = centered("4006381333931", 600.0).with_format(BarcodeFormat::Ean13);
    assert_eq!(
        c.handle_event(DecodeEvent::decoded(ms(0), vec![ean.clone()]), ms(0)),
        Some(OverlayMode::Searching)
    );
    assert_eq!(c.label(), None);

    let mut any = ScanController::new(OverlayParams::default(), Size::new(1000.0, 2000.0))
        .with_decoder_options(DecoderOptions { formats: vec![] });
    assert_eq!(
        any.handle_event(DecodeEvent::decoded(ms(0), vec![ean]), ms(0)),
        Some(OverlayMode::Loading)
    );
}

#[test]
fn reset_session_unlocks() {
    let mut c = controller();
    c.handle_event(
        DecodeEvent::decoded(ms(0), vec![centered("x", 500.0)]),
        ms(0),
    );
    assert!(c.session().is_locked());
    c.reset_session();
    assert!(!c.session().is_locked());
    assert_eq!(c.session().mode(), OverlayMode::Idle);
    assert!(c.overlay().is_empty());
    assert_eq!(
        c.handle_event(DecodeEvent::decoded(ms(10), vec![]), ms(10)),
        Some(OverlayMode::Searching)
    );
}
