pub mod annotation_id;
pub mod controls;
pub mod theme;
pub mod types;

pub use annotation_id::AnnotationId;
pub use controls::{ControlKind, ControlSide, ControlTransform, TransformOrigin};
pub use theme::ThemeToken;
pub use types::{
    Annotation, ImageDimensions, ImageMetadata, PixelRect, Placement, ViewportRect,
};
