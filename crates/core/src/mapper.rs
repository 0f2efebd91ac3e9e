use bbox_overlay_protocol::{Annotation, ImageDimensions, PixelRect, ViewportRect};

/// Convert a pixel-space rectangle into the viewer's normalized space.
///
/// Both axes are divided by their own image side. Corners are not reordered
/// or clamped: `x1 < x0` comes out as a negative width and is left for the
/// caller to reject. Callers must pass positive dimensions.
pub fn map(rect: &PixelRect, image_width: f64, image_height: f64) -> ViewportRect {
    ViewportRect {
        x: rect.x0 / image_width,
        y: rect.y0 / image_height,
        width: (rect.x1 - rect.x0) / image_width,
        height: (rect.y1 - rect.y0) / image_height,
    }
}

pub fn map_annotation(annotation: &Annotation, dimensions: ImageDimensions) -> ViewportRect {
    map(&annotation.rect, dimensions.width, dimensions.height)
}
