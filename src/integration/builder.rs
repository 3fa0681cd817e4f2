//! Builder for creating Detection objects from various input formats.

use crate::tracker::{Detection, Point, Rect};

/// Builder for creating [`Detection`] objects from various input formats.
///
/// The centroid can be set directly or derived from the center of a
/// supplied bounding box.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    position: Option<Point>,
    class: Option<String>,
    bbox: Option<Rect>,
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the centroid directly.
    pub fn position(mut self, x: f32, y: f32) -> Self {
        self.position = Some(Point::new(x, y));
        self
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.bbox = Some(Rect::from_tlbr(x1, y1, x2, y2));
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.bbox = Some(Rect::from_xywh(cx, cy, w, h));
        self
    }

    /// Set bounding box in TLWH format (top-left x, top-left y, width, height).
    pub fn tlwh(mut self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.bbox = Some(Rect::new(x, y, w, h));
        self
    }

    /// Set the predicted class label.
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Build the final [`Detection`].
    ///
    /// When no explicit position was set, the centroid falls back to the
    /// bounding box center.
    pub fn build(self) -> Detection {
        let position = self
            .position
            .or_else(|| self.bbox.map(|b| b.center()))
            .unwrap_or_default();
        Detection {
            position,
            class: self.class,
            bbox: self.bbox,
        }
    }
}
