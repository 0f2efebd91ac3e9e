use std::collections::{BTreeMap, HashSet};

use bbox_overlay_protocol::{ControlSide, ControlTransform, Placement, ViewportRect};
use serde::Serialize;

use crate::overlay::OverlayElement;
use crate::viewer::{SubscriptionId, ViewerAdapter, ViewerError, ViewerEventKind};

/// One call received by a [`HeadlessViewer`].
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCall {
    Add { element: String },
    Remove { element: String },
    Transform { element: String, side: ControlSide, scale: f64 },
}

/// What a [`HeadlessViewer`] currently shows for one overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedOverlay {
    pub rect: ViewportRect,
    pub placement: Placement,
    pub accept_label: &'static str,
    pub reject_label: &'static str,
    pub left: Option<ControlTransform>,
    pub right: Option<ControlTransform>,
}

/// In-memory viewer that records every call.
///
/// Refuses malformed rects the way a real widget does, and can be told to
/// refuse specific elements.
#[derive(Debug)]
pub struct HeadlessViewer {
    ready: bool,
    zoom: f64,
    overlays: BTreeMap<String, PlacedOverlay>,
    rejected: HashSet<String>,
    subscriptions: Vec<(SubscriptionId, ViewerEventKind)>,
    next_subscription: u64,
    calls: Vec<ViewerCall>,
}

impl Default for HeadlessViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessViewer {
    /// An open viewer at home zoom.
    pub fn new() -> Self {
        Self {
            ready: true,
            zoom: 1.0,
            overlays: BTreeMap::new(),
            rejected: HashSet::new(),
            subscriptions: Vec::new(),
            next_subscription: 0,
            calls: Vec::new(),
        }
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    /// Refuse future `add_overlay` calls for `element_id`.
    pub fn reject_element(&mut self, element_id: impl Into<String>) {
        self.rejected.insert(element_id.into());
    }

    pub fn accept_all(&mut self) {
        self.rejected.clear();
    }

    /// Drop all overlays without going through `remove_overlay`, as when the
    /// widget is reset behind the engine's back.
    pub fn clear_overlays(&mut self) {
        self.overlays.clear();
    }

    pub fn overlays(&self) -> &BTreeMap<String, PlacedOverlay> {
        &self.overlays
    }

    pub fn overlay(&self, element_id: &str) -> Option<&PlacedOverlay> {
        self.overlays.get(element_id)
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    pub fn calls(&self) -> &[ViewerCall] {
        &self.calls
    }

    pub fn add_count(&self) -> usize {
        self.count(|c| matches!(c, ViewerCall::Add { .. }))
    }

    pub fn remove_count(&self) -> usize {
        self.count(|c| matches!(c, ViewerCall::Remove { .. }))
    }

    pub fn transform_count(&self) -> usize {
        self.count(|c| matches!(c, ViewerCall::Transform { .. }))
    }

    pub fn subscriptions(&self) -> &[(SubscriptionId, ViewerEventKind)] {
        &self.subscriptions
    }

    pub fn is_subscribed(&self, event: ViewerEventKind) -> bool {
        self.subscriptions.iter().any(|&(_, e)| e == event)
    }

    fn count(&self, pred: impl Fn(&ViewerCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(*c)).count()
    }
}

impl ViewerAdapter for HeadlessViewer {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn zoom_level(&self) -> f64 {
        self.zoom
    }

    fn add_overlay(
        &mut self,
        element: &OverlayElement,
        rect: ViewportRect,
        placement: Placement,
    ) -> Result<(), ViewerError> {
        let id = &element.element_id;
        self.calls.push(ViewerCall::Add {
            element: id.clone(),
        });
        if !self.ready {
            return Err(ViewerError::NotReady);
        }
        if self.rejected.contains(id) {
            return Err(ViewerError::Rejected {
                element: id.clone(),
                reason: "refused by host".to_string(),
            });
        }
        if !rect.is_well_formed() {
            return Err(ViewerError::Rejected {
                element: id.clone(),
                reason: format!("invalid location {rect:?}"),
            });
        }
        self.overlays.insert(
            id.clone(),
            PlacedOverlay {
                rect,
                placement,
                accept_label: element.accept.label,
                reject_label: element.reject.label,
                left: None,
                right: None,
            },
        );
        Ok(())
    }

    fn remove_overlay(&mut self, element_id: &str) -> Result<(), ViewerError> {
        self.calls.push(ViewerCall::Remove {
            element: element_id.to_string(),
        });
        self.overlays
            .remove(element_id)
            .map(|_| ())
            .ok_or_else(|| ViewerError::UnknownElement(element_id.to_string()))
    }

    fn set_control_transform(
        &mut self,
        element_id: &str,
        side: ControlSide,
        transform: ControlTransform,
    ) -> Result<(), ViewerError> {
        self.calls.push(ViewerCall::Transform {
            element: element_id.to_string(),
            side,
            scale: transform.scale,
        });
        let overlay = self
            .overlays
            .get_mut(element_id)
            .ok_or_else(|| ViewerError::UnknownElement(element_id.to_string()))?;
        match side {
            ControlSide::Left => overlay.left = Some(transform),
            ControlSide::Right => overlay.right = Some(transform),
        }
        Ok(())
    }

    fn subscribe(&mut self, event: ViewerEventKind) -> Result<SubscriptionId, ViewerError> {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.push((id, event));
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscriptions.retain(|&(sub, _)| sub != id);
    }
}
