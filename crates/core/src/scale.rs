use bbox_overlay_protocol::{ControlSide, ControlTransform};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::frame::{FrameScheduler, FrameToken};
use crate::registry::OverlayRegistry;
use crate::viewer::ViewerAdapter;

/// Linear zoom-to-scale curve, clamped to `[min_scale, max_scale]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Scale gained per unit of zoom.
    pub sensitivity: f64,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.3,
            min_scale: 0.5,
            max_scale: 2.0,
        }
    }
}

impl ScaleConfig {
    pub fn factor(&self, zoom: f64) -> f64 {
        (1.0 + (zoom - 1.0) * self.sensitivity)
            .min(self.max_scale)
            .max(self.min_scale)
    }
}

/// Control scale for `zoom` with the default curve: `1` at home zoom, `2`
/// from zoom `4.33` on.
pub fn scale_factor(zoom: f64) -> f64 {
    ScaleConfig::default().factor(zoom)
}

/// Keeps overlay controls at a legible size while the viewer zooms.
///
/// Zoom notifications are coalesced: at most one recompute is outstanding,
/// and a newer notification replaces it.
#[derive(Debug)]
pub struct ScaleSynchronizer {
    config: ScaleConfig,
    anchor_offset_pct: f64,
    pending: Option<FrameToken>,
    latest_zoom: f64,
}

impl ScaleSynchronizer {
    pub fn new(config: ScaleConfig, anchor_offset_pct: f64) -> Self {
        Self {
            config,
            anchor_offset_pct,
            pending: None,
            latest_zoom: 1.0,
        }
    }

    pub fn config(&self) -> &ScaleConfig {
        &self.config
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Zoom carried by the most recent notification.
    pub fn latest_zoom(&self) -> f64 {
        self.latest_zoom
    }

    /// Schedule a recompute for the next paint, replacing any outstanding one.
    pub fn on_zoom_event<S: FrameScheduler + ?Sized>(
        &mut self,
        scheduler: &mut S,
        zoom: f64,
    ) -> FrameToken {
        if let Some(stale) = self.pending.take() {
            scheduler.cancel_frame(stale);
        }
        self.latest_zoom = zoom;
        let token = scheduler.request_frame();
        self.pending = Some(token);
        token
    }

    /// Zoom to apply if `token` is the outstanding recompute. Any other
    /// token is stale and ignored.
    pub fn on_frame(&mut self, token: FrameToken) -> Option<f64> {
        if self.pending != Some(token) {
            debug!(?token, "ignoring stale frame");
            return None;
        }
        self.pending = None;
        Some(self.latest_zoom)
    }

    pub fn cancel_pending<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) -> bool {
        match self.pending.take() {
            Some(token) => {
                scheduler.cancel_frame(token);
                true
            }
            None => false,
        }
    }

    /// Left and right group transforms for `zoom`.
    pub fn transforms(&self, zoom: f64) -> (ControlTransform, ControlTransform) {
        let scale = self.config.factor(zoom);
        (
            ControlTransform::anchored(ControlSide::Left, self.anchor_offset_pct, scale),
            ControlTransform::anchored(ControlSide::Right, self.anchor_offset_pct, scale),
        )
    }

    /// Restyle the control groups of every active overlay for `zoom`.
    ///
    /// Only reads the registry. A viewer error on one overlay is logged and
    /// the rest are still updated. Returns the number of overlays updated.
    pub fn apply<V: ViewerAdapter + ?Sized>(
        &self,
        registry: &OverlayRegistry,
        viewer: &mut V,
        zoom: f64,
    ) -> usize {
        let (left, right) = self.transforms(zoom);
        let mut updated = 0;
        for handle in registry.handles() {
            let element_id = handle.element_id();
            let result = viewer
                .set_control_transform(element_id, ControlSide::Left, left)
                .and_then(|()| viewer.set_control_transform(element_id, ControlSide::Right, right));
            match result {
                Ok(()) => updated += 1,
                Err(e) => warn!(id = %handle.id(), error = %e, "failed to rescale overlay controls"),
            }
        }
        debug!(zoom, scale = left.scale, updated, "applied control scale");
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ManualFrameScheduler;

    #[test]
    fn home_zoom_is_unit_scale() {
        assert_eq!(scale_factor(1.0), 1.0);
    }

    #[test]
    fn clamps_at_both_ends() {
        assert_eq!(scale_factor(4.34), 2.0);
        assert_eq!(scale_factor(4.5), 2.0);
        assert_eq!(scale_factor(10.0), 2.0);
        assert_eq!(scale_factor(-0.67), 0.5);
        assert_eq!(scale_factor(-5.0), 0.5);
    }

    #[test]
    fn linear_between_bounds() {
        assert!((scale_factor(2.0) - 1.3).abs() < 1e-12);
        assert!((scale_factor(0.5) - 0.85).abs() < 1e-12);
    }

    #[test]
    fn monotonic() {
        let mut previous = f64::NEG_INFINITY;
        for step in -200..=1200 {
            let s = scale_factor(step as f64 / 100.0);
            assert!(s >= previous, "scale dropped at zoom {}", step as f64 / 100.0);
            previous = s;
        }
    }

    #[test]
    fn burst_leaves_one_pending_frame() {
        let mut scheduler = ManualFrameScheduler::new();
        let mut sync = ScaleSynchronizer::new(ScaleConfig::default(), 108.0);
        for zoom in [1.2, 1.8, 2.6, 3.0] {
            sync.on_zoom_event(&mut scheduler, zoom);
        }
        let due = scheduler.take_due();
        assert_eq!(due.len(), 1);
        assert_eq!(scheduler.cancelled_count(), 3);
        assert_eq!(sync.on_frame(due[0]), Some(3.0));
        assert!(!sync.is_pending());
    }

    #[test]
    fn stale_token_is_ignored() {
        let mut scheduler = ManualFrameScheduler::new();
        let mut sync = ScaleSynchronizer::new(ScaleConfig::default(), 108.0);
        let first = sync.on_zoom_event(&mut scheduler, 2.0);
        let second = sync.on_zoom_event(&mut scheduler, 3.0);
        assert_eq!(sync.on_frame(first), None);
        assert_eq!(sync.on_frame(second), Some(3.0));
        assert_eq!(sync.on_frame(second), None);
    }

    #[test]
    fn cancel_pending_clears_slot() {
        let mut scheduler = ManualFrameScheduler::new();
        let mut sync = ScaleSynchronizer::new(ScaleConfig::default(), 108.0);
        sync.on_zoom_event(&mut scheduler, 2.0);
        assert!(sync.cancel_pending(&mut scheduler));
        assert!(scheduler.pending().is_empty());
        assert!(!sync.cancel_pending(&mut scheduler));
    }

    #[test]
    fn transforms_keep_anchor_offsets() {
        let sync = ScaleSynchronizer::new(ScaleConfig::default(), 108.0);
        let (left, right) = sync.transforms(2.0);
        assert_eq!(left.translate_x_pct, -108.0);
        assert_eq!(right.translate_x_pct, 108.0);
        assert_eq!(left.translate_y_pct, -50.0);
        assert!((left.scale - 1.3).abs() < 1e-12);
        assert_eq!(left.scale, right.scale);
    }
}
