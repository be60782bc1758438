//! Normalized bounding boxes.

use serde::{Deserialize, Serialize};

use crate::constants::MIN_BOX_FRACTION;

/// An axis-aligned box in normalized image coordinates (`[0,1]` on both axes).
///
/// Stored as two corners so it maps directly onto the `[x1, y1, x2, y2]`
/// array the sample store expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    /// Left edge
    pub x1: f32,
    /// Top edge
    pub y1: f32,
    /// Right edge
    pub x2: f32,
    /// Bottom edge
    pub y2: f32,
}

impl NormalizedBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a box from two corners given in any order.
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x1: x0.min(x1),
            y1: y0.min(y1),
            x2: x0.max(x1),
            y2: y0.max(y1),
        }
    }

    /// Create a box from a `[x1, y1, x2, y2]` array.
    pub fn from_array(values: [f32; 4]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Check that every coordinate is finite and inside the unit square.
    pub fn is_within_unit_square(&self) -> bool {
        self.to_array()
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
    }

    /// Check the unit-square bounds and that the corners are strictly ordered.
    pub fn is_well_formed(&self) -> bool {
        self.is_within_unit_square() && self.x1 < self.x2 && self.y1 < self.y2
    }

    /// Reorder the corners so that `x1 <= x2` and `y1 <= y2`.
    pub fn normalized(&self) -> Self {
        Self::from_corners(self.x1, self.y1, self.x2, self.y2)
    }

    /// Check whether both sides reach `min_fraction` of the normalized axis.
    pub fn meets_min_size(&self, min_fraction: f32) -> bool {
        self.width() >= min_fraction && self.height() >= min_fraction
    }

    /// Shorthand for [`meets_min_size`](Self::meets_min_size) with the default threshold.
    pub fn is_large_enough(&self) -> bool {
        self.meets_min_size(MIN_BOX_FRACTION)
    }

    /// Check if a normalized point is inside the box (edges inclusive).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }

    /// Convert to pixel coordinates `(x, y, width, height)` for an image of the given size.
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> (f32, f32, f32, f32) {
        let w = image_width as f32;
        let h = image_height as f32;
        (self.x1 * w, self.y1 * h, self.width() * w, self.height() * h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn test_from_corners_any_order() {
        let a = NormalizedBox::from_corners(0.1, 0.2, 0.5, 0.6);
        let b = NormalizedBox::from_corners(0.5, 0.6, 0.1, 0.2);
        let c = NormalizedBox::from_corners(0.5, 0.2, 0.1, 0.6);
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.to_array(), [0.1, 0.2, 0.5, 0.6]);
    }

    #[test]
    fn test_dimensions() {
        let bbox = NormalizedBox::new(0.1, 0.1, 0.3, 0.5);
        assert!((bbox.width() - 0.2).abs() < EPSILON);
        assert!((bbox.height() - 0.4).abs() < EPSILON);
        assert!((bbox.area() - 0.08).abs() < EPSILON);
    }

    #[test]
    fn test_min_size_threshold() {
        assert!(NormalizedBox::new(0.0, 0.0, 0.01, 0.01).is_large_enough());
        assert!(!NormalizedBox::new(0.0, 0.0, 0.001, 0.001).is_large_enough());
        // One thin side is enough to reject
        assert!(!NormalizedBox::new(0.0, 0.0, 0.5, 0.004).is_large_enough());
    }

    #[test]
    fn test_well_formed() {
        assert!(NormalizedBox::new(0.1, 0.1, 0.3, 0.3).is_well_formed());
        assert!(!NormalizedBox::new(0.3, 0.1, 0.1, 0.3).is_well_formed());
        assert!(!NormalizedBox::new(0.1, 0.1, 1.2, 0.3).is_well_formed());
        assert!(!NormalizedBox::new(f32::NAN, 0.1, 0.3, 0.3).is_well_formed());
    }

    #[test]
    fn test_contains_edges() {
        let bbox = NormalizedBox::new(0.2, 0.2, 0.4, 0.4);
        assert!(bbox.contains(0.3, 0.3));
        assert!(bbox.contains(0.2, 0.4));
        assert!(!bbox.contains(0.1, 0.3));
    }

    #[test]
    fn test_to_pixels() {
        let bbox = NormalizedBox::new(0.25, 0.5, 0.75, 1.0);
        let (x, y, w, h) = bbox.to_pixels(400, 200);
        assert_eq!((x, y, w, h), (100.0, 100.0, 200.0, 100.0));
    }
}
