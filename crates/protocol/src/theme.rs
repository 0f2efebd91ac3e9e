use serde::{Deserialize, Serialize};

/// Semantic style tokens attached to overlay parts. Hosts map them onto
/// their own visual styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    /// Outline drawn around the annotated region.
    BoxBorder,

    AcceptControl,
    RejectControl,
    DisabledControl,
}
