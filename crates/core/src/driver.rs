use bbox_overlay_protocol::{Annotation, ControlKind, ImageDimensions, ImageMetadata};
use tracing::{debug, info};

use crate::affordance::{AcknowledgeFn, provider_for};
use crate::config::{ConfigError, OverlayConfig};
use crate::frame::{FrameScheduler, FrameToken, ManualFrameScheduler};
use crate::registry::{OverlayRegistry, ReconcileReport};
use crate::scale::ScaleSynchronizer;
use crate::viewer::{SubscriptionId, ViewerAdapter, ViewerError, ViewerEventKind, effective_zoom};

/// Ties the registry and the scale synchronizer to one viewer.
///
/// The driver is the only writer of the registry. Dropping it cancels any
/// pending recompute, unsubscribes from the viewer and removes every
/// overlay.
pub struct OverlayDriver<V: ViewerAdapter, S: FrameScheduler> {
    viewer: V,
    scheduler: S,
    registry: OverlayRegistry,
    synchronizer: ScaleSynchronizer,
    image: ImageMetadata,
    snapshot: Vec<Annotation>,
    subscription: Option<SubscriptionId>,
    scale_passes: usize,
    closed: bool,
}

impl<V: ViewerAdapter, S: FrameScheduler> OverlayDriver<V, S> {
    pub fn new(
        viewer: V,
        scheduler: S,
        config: &OverlayConfig,
        on_acknowledge: AcknowledgeFn,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let provider = provider_for(config.affordance, config.disabled_controls);
        Ok(Self {
            viewer,
            scheduler,
            registry: OverlayRegistry::new(provider, on_acknowledge, config.placement),
            synchronizer: ScaleSynchronizer::new(config.scale, config.anchor_offset_pct),
            image: ImageMetadata::default(),
            snapshot: Vec::new(),
            subscription: None,
            scale_passes: 0,
            closed: false,
        })
    }

    /// Start listening for zoom notifications.
    pub fn attach(&mut self) -> Result<(), ViewerError> {
        if self.subscription.is_none() && !self.closed {
            self.subscription = Some(self.viewer.subscribe(ViewerEventKind::Zoom)?);
        }
        Ok(())
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Switch to another image. Any change of identity or size removes every
    /// overlay, since their rects were derived from the old image, and drops
    /// any rescale still pending for the old image. Returns the number of
    /// overlays removed.
    pub fn set_image(&mut self, image: ImageMetadata) -> usize {
        if image == self.image {
            return 0;
        }
        self.synchronizer.cancel_pending(&mut self.scheduler);
        let detached = self.registry.teardown(&mut self.viewer);
        info!(from = %self.image.id, to = %image.id, detached, "image changed");
        self.image = image;
        detached
    }

    pub fn set_annotations(&mut self, snapshot: Vec<Annotation>) {
        self.snapshot = snapshot;
    }

    /// Reconcile against the current snapshot, then rescale every control
    /// for the viewer's current zoom.
    ///
    /// Returns `None` without touching anything while the viewer is not
    /// open, or the image has no identity or no known size yet.
    pub fn sync(&mut self) -> Option<ReconcileReport> {
        let dimensions = self.ready_dimensions()?;
        let report = self
            .registry
            .reconcile(&mut self.viewer, &self.snapshot, dimensions);
        debug!(
            created = report.created.len(),
            removed = report.removed.len(),
            failed = report.failed.len(),
            "reconciled overlays"
        );
        let zoom = effective_zoom(self.viewer.zoom_level());
        self.apply_scale(zoom);
        Some(report)
    }

    /// [`set_annotations`](Self::set_annotations) followed by
    /// [`sync`](Self::sync).
    pub fn update(&mut self, snapshot: Vec<Annotation>) -> Option<ReconcileReport> {
        self.set_annotations(snapshot);
        self.sync()
    }

    /// Viewer zoom notification. Coalesced into one rescale at the next
    /// paint. Ignored until [`attach`](Self::attach) is called.
    pub fn on_zoom(&mut self, zoom: f64) -> bool {
        if self.closed || self.subscription.is_none() {
            return false;
        }
        self.synchronizer.on_zoom_event(&mut self.scheduler, zoom);
        true
    }

    /// Paint callback for `token`. Returns whether a rescale ran.
    pub fn on_frame(&mut self, token: FrameToken) -> bool {
        let Some(zoom) = self.synchronizer.on_frame(token) else {
            return false;
        };
        if !self.viewer.is_ready() {
            debug!("viewer closed before paint, skipping rescale");
            return false;
        }
        self.apply_scale(effective_zoom(zoom));
        true
    }

    /// Route a user activation of overlay `id`'s control.
    pub fn activate(&self, id: &str, kind: ControlKind) -> bool {
        self.registry.activate(id, kind)
    }

    /// Leave the owning scope. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.synchronizer.cancel_pending(&mut self.scheduler);
        if let Some(subscription) = self.subscription.take() {
            self.viewer.unsubscribe(subscription);
        }
        let detached = self.registry.teardown(&mut self.viewer);
        info!(detached, "overlay driver shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of times control scale was applied, from `sync` or a paint.
    pub fn scale_passes(&self) -> usize {
        self.scale_passes
    }

    pub fn registry(&self) -> &OverlayRegistry {
        &self.registry
    }

    pub fn synchronizer(&self) -> &ScaleSynchronizer {
        &self.synchronizer
    }

    pub fn image(&self) -> &ImageMetadata {
        &self.image
    }

    pub fn snapshot(&self) -> &[Annotation] {
        &self.snapshot
    }

    pub fn viewer(&self) -> &V {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut V {
        &mut self.viewer
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    fn apply_scale(&mut self, zoom: f64) {
        self.synchronizer
            .apply(&self.registry, &mut self.viewer, zoom);
        self.scale_passes += 1;
    }

    fn ready_dimensions(&self) -> Option<ImageDimensions> {
        if self.closed {
            return None;
        }
        if !self.viewer.is_ready() {
            debug!("viewer not open, deferring reconcile");
            return None;
        }
        if self.image.id.is_empty() {
            debug!("no image identity, deferring reconcile");
            return None;
        }
        let dimensions = self.image.known_dimensions();
        if dimensions.is_none() {
            debug!(image = %self.image.id, "image size unknown, deferring reconcile");
        }
        dimensions
    }
}

impl<V: ViewerAdapter> OverlayDriver<V, ManualFrameScheduler> {
    /// Fire every frame that is due. Returns the number of rescales run.
    pub fn paint(&mut self) -> usize {
        let due = self.scheduler.take_due();
        let mut applied = 0;
        for token in due {
            if self.on_frame(token) {
                applied += 1;
            }
        }
        applied
    }
}

impl<V: ViewerAdapter, S: FrameScheduler> Drop for OverlayDriver<V, S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
