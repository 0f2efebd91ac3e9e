//! Integration test: drive the overlay engine through a headless viewer and
//! a manual paint loop, checking reconciliation, zoom coalescing, control
//! activation and teardown end to end.

use std::cell::RefCell;
use std::rc::Rc;

use bbox_overlay_core::headless::ViewerCall;
use bbox_overlay_core::{
    AcknowledgeFn, AffordanceKind, AnnotationStore, HeadlessViewer, ManualFrameScheduler,
    OverlayConfig, OverlayDriver, ViewerEventKind, parse_annotations,
};
use bbox_overlay_protocol::{
    Annotation, AnnotationId, ControlKind, ControlSide, ImageMetadata, PixelRect, TransformOrigin,
};

type Driver = OverlayDriver<HeadlessViewer, ManualFrameScheduler>;
type Decisions = Rc<RefCell<Vec<(String, bool)>>>;

const SAMPLE: &[u8] = br#"{
    "message": "ok",
    "data": {
        "bounding_boxes": [
            { "id": "box1", "coordinates": [500, 700, 600, 800] },
            { "id": "box2", "coordinates": [1500, 1700, 1600, 1800] },
            { "id": "box3", "coordinates": [1300, 1900, 1800, 2000] }
        ]
    },
    "errors": []
}"#;

fn driver_with(config: &OverlayConfig) -> (Driver, Decisions) {
    let decisions: Decisions = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&decisions);
    let on_acknowledge: AcknowledgeFn = Rc::new(move |id: &AnnotationId, accepted: bool| {
        sink.borrow_mut().push((id.to_string(), accepted));
    });
    let mut driver = OverlayDriver::new(
        HeadlessViewer::new(),
        ManualFrameScheduler::new(),
        config,
        on_acknowledge,
    )
    .expect("default-derived config should be valid");
    let attached = driver.attach();
    assert!(attached.is_ok());
    driver.set_image(ImageMetadata::new("12345", 5000.0, 5000.0));
    (driver, decisions)
}

fn driver() -> (Driver, Decisions) {
    driver_with(&OverlayConfig::default())
}

fn sample() -> Vec<Annotation> {
    parse_annotations(SAMPLE).expect("failed to parse sample boxes")
}

fn active(driver: &Driver) -> Vec<String> {
    driver
        .registry()
        .active_ids()
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn sample_boxes_land_at_normalized_rects() {
    let (mut driver, _) = driver();
    let report = driver.update(sample());
    assert_eq!(report.map(|r| r.created.len()), Some(3));
    assert_eq!(active(&driver), vec!["box1", "box2", "box3"]);

    let rect = driver
        .viewer()
        .overlay("overlay-box1")
        .map(|o| o.rect)
        .expect("box1 should be placed");
    assert!((rect.x - 0.10).abs() < 1e-12);
    assert!((rect.y - 0.14).abs() < 1e-12);
    assert!((rect.width - 0.02).abs() < 1e-12);
    assert!((rect.height - 0.02).abs() < 1e-12);
}

#[test]
fn repeated_snapshot_issues_no_viewer_churn() {
    let (mut driver, _) = driver();
    driver.update(sample());
    let adds = driver.viewer().add_count();
    let removes = driver.viewer().remove_count();

    let report = driver.update(sample());
    assert!(report.is_some_and(|r| r.is_noop()));
    assert_eq!(driver.viewer().add_count(), adds);
    assert_eq!(driver.viewer().remove_count(), removes);
}

#[test]
fn zoom_burst_coalesces_into_one_rescale() {
    let (mut driver, _) = driver();
    driver.update(sample());
    let passes = driver.scale_passes();
    let transforms = driver.viewer().transform_count();

    for zoom in [1.1, 1.5, 2.2, 3.0, 2.0] {
        assert!(driver.on_zoom(zoom));
    }
    assert_eq!(driver.scheduler().pending().len(), 1);
    assert_eq!(driver.paint(), 1);
    assert_eq!(driver.scale_passes(), passes + 1);
    // Two groups per overlay, three overlays.
    assert_eq!(driver.viewer().transform_count(), transforms + 6);

    for overlay in driver.viewer().overlays().values() {
        let left = overlay.left.expect("left group should be scaled");
        let right = overlay.right.expect("right group should be scaled");
        assert!((left.scale - 1.3).abs() < 1e-12);
        assert_eq!(left.to_string(), "translate(-108%, -50%) scale(1.3)");
        assert_eq!(left.origin, TransformOrigin::Right);
        assert_eq!(right.translate_x_pct, 108.0);
        assert_eq!(right.origin, TransformOrigin::Left);
    }

    // Nothing left for the next paint.
    assert_eq!(driver.paint(), 0);
}

#[test]
fn new_overlays_pick_up_zoom_without_zoom_event() {
    let (mut driver, _) = driver();
    driver.viewer_mut().set_zoom(6.0);
    driver.update(sample());
    let left = driver
        .viewer()
        .overlay("overlay-box2")
        .and_then(|o| o.left);
    assert_eq!(left.map(|t| t.scale), Some(2.0));
}

#[test]
fn removed_then_reintroduced_box_is_recreated() {
    let (mut driver, _) = driver();
    driver.update(sample());
    let without_box1: Vec<Annotation> = sample().into_iter().filter(|a| a.id != "box1").collect();
    driver.update(without_box1);
    assert_eq!(active(&driver), vec!["box2", "box3"]);
    driver.update(sample());
    assert_eq!(active(&driver), vec!["box1", "box2", "box3"]);

    let box1_lifecycle: Vec<&ViewerCall> = driver
        .viewer()
        .calls()
        .iter()
        .filter(|c| match c {
            ViewerCall::Add { element } | ViewerCall::Remove { element } => {
                element == "overlay-box1"
            }
            ViewerCall::Transform { .. } => false,
        })
        .collect();
    assert_eq!(box1_lifecycle.len(), 3);
    assert!(matches!(box1_lifecycle[1], ViewerCall::Remove { .. }));
    assert!(matches!(box1_lifecycle[2], ViewerCall::Add { .. }));
}

#[test]
fn click_flows_through_store_and_removes_overlay() {
    let (mut driver, decisions) = driver();
    let mut store = AnnotationStore::new();
    let fresh = store.replace(sample());
    assert_eq!(fresh.len(), 3);
    driver.update(store.snapshot().to_vec());

    assert!(driver.activate("box2", ControlKind::Accept));
    let pending: Vec<(String, bool)> = decisions.borrow_mut().drain(..).collect();
    assert_eq!(pending, vec![("box2".to_string(), true)]);

    for (id, accepted) in pending {
        assert!(store.acknowledge(&id, accepted).is_some());
    }
    let report = driver.update(store.snapshot().to_vec());
    assert_eq!(
        report.map(|r| r.removed),
        Some(vec![AnnotationId::from("box2")])
    );
    assert!(driver.viewer().overlay("overlay-box2").is_none());
    assert!(!driver.activate("box2", ControlKind::Reject));
}

#[test]
fn image_switch_clears_every_overlay() {
    let (mut driver, _) = driver();
    driver.update(sample());
    assert_eq!(driver.set_image(ImageMetadata::new("67890", 4000.0, 3000.0)), 3);
    assert_eq!(driver.viewer().overlay_count(), 0);

    let report = driver.update(vec![Annotation::new(
        "box9",
        PixelRect::new(400.0, 300.0, 800.0, 600.0),
    )]);
    assert_eq!(report.map(|r| r.created.len()), Some(1));
    let rect = driver.viewer().overlay("overlay-box9").map(|o| o.rect);
    assert_eq!(rect.map(|r| (r.x, r.y)), Some((0.1, 0.1)));
}

#[test]
fn image_switch_drops_rescale_pending_for_old_image() {
    let (mut driver, _) = driver();
    driver.update(sample());
    driver.viewer_mut().set_zoom(4.0);
    assert!(driver.on_zoom(4.0));
    assert_eq!(driver.scheduler().pending().len(), 1);

    driver.set_image(ImageMetadata::new("67890", 5000.0, 5000.0));
    assert!(!driver.synchronizer().is_pending());
    assert!(driver.scheduler().pending().is_empty());

    driver.viewer_mut().set_zoom(1.0);
    driver.update(vec![Annotation::new(
        "box9",
        PixelRect::new(500.0, 500.0, 1000.0, 1000.0),
    )]);
    let before = driver.viewer().overlay("overlay-box9").and_then(|o| o.left);
    assert_eq!(before.map(|t| t.scale), Some(1.0));

    // The old image's zoom must not reach the new overlays.
    assert_eq!(driver.paint(), 0);
    let after = driver.viewer().overlay("overlay-box9").and_then(|o| o.left);
    assert_eq!(after.map(|t| t.scale), Some(1.0));
}

#[test]
fn scope_exit_cancels_pending_rescale_and_detaches() {
    let (mut driver, _) = driver();
    driver.update(sample());
    driver.on_zoom(4.0);
    assert_eq!(driver.scheduler().pending().len(), 1);

    driver.shutdown();
    assert!(driver.scheduler().pending().is_empty());
    assert_eq!(driver.viewer().remove_count(), 3);
    assert!(!driver.viewer().is_subscribed(ViewerEventKind::Zoom));
    assert!(driver.registry().is_empty());
    assert_eq!(driver.paint(), 0);
}

#[test]
fn native_buttons_carry_tooltips() {
    let config = OverlayConfig {
        affordance: AffordanceKind::NativeButtons,
        ..OverlayConfig::default()
    };
    let (mut driver, decisions) = driver_with(&config);
    driver.update(sample());
    let handle = driver
        .registry()
        .get("box3")
        .expect("box3 should be active");
    let accept = handle.element().control(ControlKind::Accept);
    assert_eq!(accept.element_id.as_deref(), Some("accept-box3"));
    assert_eq!(accept.tooltip, Some("Accept"));
    assert_eq!(accept.kind.side(), ControlSide::Left);

    assert!(driver.activate("box3", ControlKind::Reject));
    assert_eq!(*decisions.borrow(), vec![("box3".to_string(), false)]);
}

#[test]
fn one_rejected_box_does_not_block_the_rest() {
    let (mut driver, _) = driver();
    driver.viewer_mut().reject_element("overlay-box2");
    let report = driver
        .update(sample())
        .expect("guard should pass on a ready viewer");
    assert_eq!(report.created.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(active(&driver), vec!["box1", "box3"]);
}
