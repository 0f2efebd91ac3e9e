use bbox_overlay_protocol::Placement;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::affordance::AffordanceKind;
use crate::scale::ScaleConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Engine settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub affordance: AffordanceKind,
    /// Render native buttons in their disabled state.
    pub disabled_controls: bool,
    pub placement: Placement,
    /// How far each control group is pushed outside the rectangle, in
    /// percent of the group's own width.
    pub anchor_offset_pct: f64,
    pub scale: ScaleConfig,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            affordance: AffordanceKind::default(),
            disabled_controls: false,
            placement: Placement::TopLeft,
            anchor_offset_pct: 108.0,
            scale: ScaleConfig::default(),
        }
    }
}

impl OverlayConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ScaleConfig {
            sensitivity,
            min_scale,
            max_scale,
        } = self.scale;
        if !sensitivity.is_finite() || sensitivity < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "scale.sensitivity must be a non-negative number, got {sensitivity}"
            )));
        }
        if !(min_scale.is_finite() && max_scale.is_finite() && min_scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "scale bounds must be positive numbers, got {min_scale}..{max_scale}"
            )));
        }
        if min_scale > max_scale {
            return Err(ConfigError::Invalid(format!(
                "scale.min_scale {min_scale} exceeds scale.max_scale {max_scale}"
            )));
        }
        if !self.anchor_offset_pct.is_finite() {
            return Err(ConfigError::Invalid(
                "anchor_offset_pct must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
