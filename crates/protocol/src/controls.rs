use serde::{Deserialize, Serialize};

/// The two affordances every overlay carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Accept,
    Reject,
}

impl ControlKind {
    pub fn is_accept(self) -> bool {
        self == ControlKind::Accept
    }

    /// Group the control lives in: accept on the left, reject on the right.
    pub fn side(self) -> ControlSide {
        match self {
            ControlKind::Accept => ControlSide::Left,
            ControlKind::Reject => ControlSide::Right,
        }
    }
}

/// Control group position relative to the annotated rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlSide {
    Left,
    Right,
}

/// Pivot of the scale part of a [`ControlTransform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformOrigin {
    Left,
    Right,
}

/// Placement of one control group: a translation in percent of the group's
/// own size, then a uniform scale around `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlTransform {
    pub translate_x_pct: f64,
    pub translate_y_pct: f64,
    pub scale: f64,
    pub origin: TransformOrigin,
}

impl ControlTransform {
    /// Transform for a group on `side`, pushed `anchor_pct` percent outside
    /// the rectangle edge and vertically centered.
    ///
    /// The pivot sits on the edge facing the rectangle, so scaling never
    /// detaches the group from the boundary.
    pub fn anchored(side: ControlSide, anchor_pct: f64, scale: f64) -> Self {
        let (translate_x_pct, origin) = match side {
            ControlSide::Left => (-anchor_pct, TransformOrigin::Right),
            ControlSide::Right => (anchor_pct, TransformOrigin::Left),
        };
        Self {
            translate_x_pct,
            translate_y_pct: -50.0,
            scale,
            origin,
        }
    }
}

/// CSS `transform` syntax, for hosts backed by a DOM.
impl std::fmt::Display for ControlTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "translate({}%, {}%) scale({})",
            self.translate_x_pct, self.translate_y_pct, self.scale
        )
    }
}
