use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{Context, Result};
use bbox_overlay_core::headless::PlacedOverlay;
use bbox_overlay_core::{
    AcknowledgeFn, Acknowledgement, AnnotationStore, HeadlessViewer, ManualFrameScheduler,
    OverlayConfig, OverlayDriver, ReconcileReport, parse_annotations,
};
use bbox_overlay_protocol::{AnnotationId, ControlKind, ImageMetadata};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A scripted viewer session.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: OverlayConfig,
    pub image: ImageMetadata,
    /// Viewer zoom when the session starts.
    #[serde(default = "home_zoom")]
    pub zoom: f64,
    pub steps: Vec<Step>,
}

fn home_zoom() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// A response from the annotation source.
    Annotations(serde_json::Value),
    /// Zoom notifications delivered within one frame.
    Zoom(Vec<f64>),
    Paint,
    Click { id: String, control: ControlKind },
    Image(ImageMetadata),
    Ready(bool),
}

/// Viewer state at the end of the session.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub image: String,
    pub active: Vec<AnnotationId>,
    pub overlays: BTreeMap<String, PlacedOverlay>,
    pub acknowledgements: Vec<Acknowledgement>,
    pub frames_requested: usize,
    pub frames_cancelled: usize,
    pub scale_passes: usize,
}

pub fn run(scenario: Scenario) -> Result<Outcome> {
    // Control callbacks only queue decisions; they are applied between steps.
    let decisions: Rc<RefCell<Vec<Acknowledgement>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&decisions);
    let on_acknowledge: AcknowledgeFn = Rc::new(move |id: &AnnotationId, accepted: bool| {
        sink.borrow_mut().push(Acknowledgement {
            id: id.clone(),
            accepted,
        });
    });

    let mut viewer = HeadlessViewer::new();
    viewer.set_zoom(scenario.zoom);
    let mut driver = OverlayDriver::new(
        viewer,
        ManualFrameScheduler::new(),
        &scenario.config,
        on_acknowledge,
    )
    .context("invalid overlay config")?;
    driver.attach()?;
    driver.set_image(scenario.image);

    let mut store = AnnotationStore::new();
    let mut acknowledgements = Vec::new();

    for (index, step) in scenario.steps.into_iter().enumerate() {
        match step {
            Step::Annotations(payload) => {
                let bytes = serde_json::to_vec(&payload)?;
                let snapshot = parse_annotations(&bytes)
                    .with_context(|| format!("step {index}: bad annotation payload"))?;
                let fresh = store.replace(snapshot);
                info!(step = index, total = store.len(), fresh = fresh.len(), "annotations received");
                log_report(index, driver.update(store.snapshot().to_vec()));
            }
            Step::Zoom(levels) => {
                for zoom in levels {
                    driver.viewer_mut().set_zoom(zoom);
                    driver.on_zoom(zoom);
                }
            }
            Step::Paint => {
                let applied = driver.paint();
                debug!(step = index, applied, "paint");
            }
            Step::Click { id, control } => {
                if !driver.activate(&id, control) {
                    warn!(step = index, id = %id, "click on an inactive overlay");
                }
                let queued: Vec<Acknowledgement> = decisions.borrow_mut().drain(..).collect();
                for decision in queued {
                    if let Some(ack) = store.acknowledge(&decision.id, decision.accepted) {
                        info!(id = %ack.id, accepted = ack.accepted, "acknowledging annotation");
                        acknowledgements.push(ack);
                    }
                }
                log_report(index, driver.update(store.snapshot().to_vec()));
            }
            Step::Image(image) => {
                if image.id != driver.image().id {
                    store.clear();
                }
                driver.set_image(image);
                log_report(index, driver.update(store.snapshot().to_vec()));
            }
            Step::Ready(ready) => {
                driver.viewer_mut().set_ready(ready);
                if ready {
                    log_report(index, driver.sync());
                }
            }
        }
    }

    let outcome = Outcome {
        image: driver.image().id.clone(),
        active: driver.registry().active_ids(),
        overlays: driver.viewer().overlays().clone(),
        acknowledgements,
        frames_requested: driver.scheduler().requested_count(),
        frames_cancelled: driver.scheduler().cancelled_count(),
        scale_passes: driver.scale_passes(),
    };
    driver.shutdown();
    Ok(outcome)
}

fn log_report(step: usize, report: Option<ReconcileReport>) {
    match report {
        Some(report) => {
            for (id, error) in &report.failed {
                warn!(step, %id, %error, "annotation skipped");
            }
            info!(
                step,
                created = report.created.len(),
                removed = report.removed.len(),
                "overlays reconciled"
            );
        }
        None => debug!(step, "viewer not ready, reconcile deferred"),
    }
}
