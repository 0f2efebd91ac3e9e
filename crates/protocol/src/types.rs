use serde::{Deserialize, Serialize};

use crate::annotation_id::AnnotationId;

/// Axis-aligned rectangle in image pixel space, stored as its two corners.
///
/// Serializes as the `[x0, y0, x1, y1]` array the annotation source emits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct PixelRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl PixelRect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

impl From<[f64; 4]> for PixelRect {
    fn from([x0, y0, x1, y1]: [f64; 4]) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

impl From<PixelRect> for [f64; 4] {
    fn from(r: PixelRect) -> Self {
        [r.x0, r.y0, r.x1, r.y1]
    }
}

/// An externally supplied region of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    #[serde(rename = "coordinates")]
    pub rect: PixelRect,
}

impl Annotation {
    pub fn new(id: impl Into<AnnotationId>, rect: PixelRect) -> Self {
        Self {
            id: id.into(),
            rect,
        }
    }
}

/// Rectangle in the viewer's normalized coordinate space, where the image
/// spans `0..1` on the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewportRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Finite everywhere with a non-negative extent.
    pub fn is_well_formed(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

/// Pixel size of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: f64,
    pub height: f64,
}

impl ImageDimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_known(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Identity and size of the image currently shown by the viewer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub id: String,
    pub dimensions: Option<ImageDimensions>,
}

impl ImageMetadata {
    pub fn new(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            dimensions: Some(ImageDimensions::new(width, height)),
        }
    }

    /// Dimensions, but only once both sides are positive.
    pub fn known_dimensions(&self) -> Option<ImageDimensions> {
        self.dimensions.filter(ImageDimensions::is_known)
    }
}

/// Which point of the overlay element is pinned to the rect origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    #[default]
    TopLeft,
    Top,
    TopRight,
    Left,
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_reads_coordinate_array() {
        let json = r#"{"id":"box1","coordinates":[500,700,600,800]}"#;
        let parsed: Result<Annotation, _> = serde_json::from_str(json);
        assert!(parsed.is_ok());
        if let Ok(annotation) = parsed {
            assert_eq!(annotation.id, "box1");
            assert_eq!(annotation.rect, PixelRect::new(500.0, 700.0, 600.0, 800.0));
        }
    }

    #[test]
    fn negative_extent_is_malformed() {
        assert!(ViewportRect::new(0.1, 0.1, 0.2, 0.2).is_well_formed());
        assert!(!ViewportRect::new(0.1, 0.1, -0.2, 0.2).is_well_formed());
        assert!(!ViewportRect::new(f64::NAN, 0.1, 0.2, 0.2).is_well_formed());
    }

    #[test]
    fn unknown_dimensions() {
        let mut meta = ImageMetadata::new("img", 0.0, 100.0);
        assert!(meta.known_dimensions().is_none());
        meta.dimensions = None;
        assert!(meta.known_dimensions().is_none());
        let meta = ImageMetadata::new("img", 640.0, 480.0);
        assert_eq!(meta.known_dimensions(), Some(ImageDimensions::new(640.0, 480.0)));
    }

    #[test]
    fn placement_uses_snake_case() {
        let json = serde_json::to_string(&Placement::TopLeft).unwrap_or_default();
        assert_eq!(json, "\"top_left\"");
    }
}
