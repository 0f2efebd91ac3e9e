use bbox_overlay_protocol::{AnnotationId, ControlKind, ThemeToken, ViewportRect};

use crate::affordance::{AcknowledgeFn, Control, ControlAffordanceProvider};

/// The element bundle handed to the viewer: an outlined region plus the
/// accept control (left group) and reject control (right group).
#[derive(Debug)]
pub struct OverlayElement {
    pub element_id: String,
    pub border: ThemeToken,
    pub accept: Control,
    pub reject: Control,
}

impl OverlayElement {
    pub fn build(
        id: &AnnotationId,
        provider: &dyn ControlAffordanceProvider,
        on_acknowledge: &AcknowledgeFn,
    ) -> Self {
        Self {
            element_id: id.element_id(),
            border: ThemeToken::BoxBorder,
            accept: provider.build(id, ControlKind::Accept, on_acknowledge),
            reject: provider.build(id, ControlKind::Reject, on_acknowledge),
        }
    }

    pub fn control(&self, kind: ControlKind) -> &Control {
        match kind {
            ControlKind::Accept => &self.accept,
            ControlKind::Reject => &self.reject,
        }
    }

    pub(crate) fn release(&mut self, provider: &dyn ControlAffordanceProvider) {
        provider.release(&mut self.accept);
        provider.release(&mut self.reject);
    }
}

/// A live overlay owned by the registry.
///
/// `rect` is captured when the overlay is created and never recomputed while
/// the annotation stays active.
#[derive(Debug)]
pub struct OverlayHandle {
    id: AnnotationId,
    rect: ViewportRect,
    element: OverlayElement,
}

impl OverlayHandle {
    pub(crate) fn new(id: AnnotationId, rect: ViewportRect, element: OverlayElement) -> Self {
        Self { id, rect, element }
    }

    pub fn id(&self) -> &AnnotationId {
        &self.id
    }

    pub fn rect(&self) -> ViewportRect {
        self.rect
    }

    pub fn element(&self) -> &OverlayElement {
        &self.element
    }

    pub fn element_id(&self) -> &str {
        &self.element.element_id
    }

    pub(crate) fn release(&mut self, provider: &dyn ControlAffordanceProvider) {
        self.element.release(provider);
    }
}
