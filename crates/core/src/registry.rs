use std::collections::{BTreeMap, HashSet};

use bbox_overlay_protocol::{
    Annotation, AnnotationId, ControlKind, ImageDimensions, Placement, ViewportRect,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::affordance::{AcknowledgeFn, ControlAffordanceProvider};
use crate::mapper;
use crate::overlay::{OverlayElement, OverlayHandle};
use crate::viewer::{ViewerAdapter, ViewerError};

/// Why an annotation got no overlay in a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OverlayError {
    #[error("malformed viewport rect {0:?}")]
    Malformed(ViewportRect),
    #[error(transparent)]
    Viewer(#[from] ViewerError),
}

/// What one [`OverlayRegistry::reconcile`] pass changed.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub created: Vec<AnnotationId>,
    pub removed: Vec<AnnotationId>,
    /// Annotations skipped this pass. They are retried only if they show up
    /// in a later snapshot.
    pub failed: Vec<(AnnotationId, OverlayError)>,
}

impl ReconcileReport {
    /// No overlay was created or removed.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.removed.is_empty()
    }
}

/// Keyed owner of every live overlay: exactly one handle per active
/// annotation id.
pub struct OverlayRegistry {
    active: BTreeMap<AnnotationId, OverlayHandle>,
    provider: Box<dyn ControlAffordanceProvider>,
    on_acknowledge: AcknowledgeFn,
    placement: Placement,
}

impl OverlayRegistry {
    pub fn new(
        provider: Box<dyn ControlAffordanceProvider>,
        on_acknowledge: AcknowledgeFn,
        placement: Placement,
    ) -> Self {
        Self {
            active: BTreeMap::new(),
            provider,
            on_acknowledge,
            placement,
        }
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.active.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&OverlayHandle> {
        self.active.get(id)
    }

    /// Active ids in ascending order.
    pub fn active_ids(&self) -> Vec<AnnotationId> {
        self.active.keys().cloned().collect()
    }

    pub fn handles(&self) -> impl Iterator<Item = &OverlayHandle> {
        self.active.values()
    }

    /// Make the active set match `desired`.
    ///
    /// Overlays whose id left the snapshot are removed first, then overlays
    /// are created for ids not active yet. Ids that stay are not touched,
    /// even if their rectangle changed. A failure on one annotation is
    /// recorded and the pass moves on.
    pub fn reconcile<V: ViewerAdapter + ?Sized>(
        &mut self,
        viewer: &mut V,
        desired: &[Annotation],
        dimensions: ImageDimensions,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let wanted: HashSet<&str> = desired.iter().map(|a| a.id.as_str()).collect();
        let stale: Vec<AnnotationId> = self
            .active
            .keys()
            .filter(|id| !wanted.contains(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            if self.detach(viewer, &id) {
                report.removed.push(id);
            }
        }

        for annotation in desired {
            if self.active.contains_key(&annotation.id) {
                continue;
            }
            match self.create(viewer, annotation, dimensions) {
                Ok(handle) => {
                    debug!(id = %annotation.id, rect = ?handle.rect(), "overlay created");
                    self.active.insert(annotation.id.clone(), handle);
                    report.created.push(annotation.id.clone());
                }
                Err(e) => {
                    warn!(id = %annotation.id, error = %e, "failed to create overlay");
                    report.failed.push((annotation.id.clone(), e));
                }
            }
        }

        report
    }

    /// Remove every overlay. Returns the number of detach calls issued.
    pub fn teardown<V: ViewerAdapter + ?Sized>(&mut self, viewer: &mut V) -> usize {
        let ids = self.active_ids();
        let mut detached = 0;
        for id in &ids {
            if self.detach(viewer, id) {
                detached += 1;
            }
        }
        if detached > 0 {
            debug!(detached, "overlay registry torn down");
        }
        detached
    }

    /// Forward a user activation to the control of overlay `id`.
    pub fn activate(&self, id: &str, kind: ControlKind) -> bool {
        self.active
            .get(id)
            .is_some_and(|handle| handle.element().control(kind).activate())
    }

    fn create<V: ViewerAdapter + ?Sized>(
        &self,
        viewer: &mut V,
        annotation: &Annotation,
        dimensions: ImageDimensions,
    ) -> Result<OverlayHandle, OverlayError> {
        let rect = mapper::map_annotation(annotation, dimensions);
        if !rect.is_well_formed() {
            return Err(OverlayError::Malformed(rect));
        }
        let provider = self.provider.as_ref();
        let mut element = OverlayElement::build(&annotation.id, provider, &self.on_acknowledge);
        if let Err(e) = viewer.add_overlay(&element, rect, self.placement) {
            element.release(provider);
            return Err(e.into());
        }
        Ok(OverlayHandle::new(annotation.id.clone(), rect, element))
    }

    /// Detach from the viewer and release, then drop the entry. Viewer
    /// errors here mean the element is already gone and are not escalated.
    fn detach<V: ViewerAdapter + ?Sized>(&mut self, viewer: &mut V, id: &str) -> bool {
        let Some(handle) = self.active.get_mut(id) else {
            return false;
        };
        if let Err(e) = viewer.remove_overlay(handle.element_id()) {
            debug!(id, error = %e, "overlay already detached");
        }
        handle.release(self.provider.as_ref());
        self.active.remove(id);
        debug!(id, "overlay removed");
        true
    }
}

impl std::fmt::Debug for OverlayRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayRegistry")
            .field("active", &self.active)
            .field("affordance", &self.provider.kind())
            .field("placement", &self.placement)
            .finish()
    }
}
