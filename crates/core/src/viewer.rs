use bbox_overlay_protocol::{ControlSide, ControlTransform, Placement, ViewportRect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::overlay::OverlayElement;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewerError {
    #[error("viewer rejected overlay {element}: {reason}")]
    Rejected { element: String, reason: String },
    #[error("unknown overlay element {0}")]
    UnknownElement(String),
    #[error("viewer is not open")]
    NotReady,
}

/// Viewer notifications the engine listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerEventKind {
    Zoom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

/// The pannable, zoomable image widget the overlays live on.
///
/// Implemented by the host. Subscriptions only tell the host which
/// notifications to forward: the host then feeds them into
/// [`OverlayDriver::on_zoom`](crate::OverlayDriver::on_zoom) from its own
/// event loop.
pub trait ViewerAdapter {
    /// Whether an image is open and overlays can be placed.
    fn is_ready(&self) -> bool;

    /// Current zoom, as reported by the widget.
    fn zoom_level(&self) -> f64;

    fn add_overlay(
        &mut self,
        element: &OverlayElement,
        rect: ViewportRect,
        placement: Placement,
    ) -> Result<(), ViewerError>;

    fn remove_overlay(&mut self, element_id: &str) -> Result<(), ViewerError>;

    /// Restyle one control group of a placed overlay.
    fn set_control_transform(
        &mut self,
        element_id: &str,
        side: ControlSide,
        transform: ControlTransform,
    ) -> Result<(), ViewerError>;

    fn subscribe(&mut self, event: ViewerEventKind) -> Result<SubscriptionId, ViewerError>;

    fn unsubscribe(&mut self, id: SubscriptionId);
}

/// Zoom as the engine uses it. Widgets report `0` or `NaN` before the first
/// layout, which reads as the home zoom.
pub fn effective_zoom(raw: f64) -> f64 {
    if raw.is_finite() && raw != 0.0 { raw } else { 1.0 }
}
