//! Canvas viewport mathematics.
//!
//! The image is drawn centered in the viewport at `scale` screen pixels per
//! image pixel, shifted by a user-controlled pan offset. Everything here is
//! pure geometry so it can be tested without a rendering surface.

use crate::constants::{MAX_ZOOM, MIN_ZOOM};

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Represents pan/zoom transform state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Screen pixels per image pixel
    pub scale: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

impl ViewTransform {
    /// Create a new transform with the given scale and pan.
    pub fn new(scale: f32, pan_x: f32, pan_y: f32) -> Self {
        Self {
            scale,
            pan_x,
            pan_y,
        }
    }

    /// Create an identity transform (scale=1, no pan).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Scale that fits the whole image inside the viewport, without pan.
    pub fn fit(image: Size, viewport: Size) -> Self {
        if image.width <= 0.0 || image.height <= 0.0 {
            return Self::identity();
        }
        let scale = (viewport.width / image.width).min(viewport.height / image.height);
        Self::new(scale.clamp(MIN_ZOOM, MAX_ZOOM), 0.0, 0.0)
    }

    /// Screen position of the image's top-left corner.
    pub fn origin(&self, image: Size, viewport: Size) -> (f32, f32) {
        let origin_x = (viewport.width - image.width * self.scale) / 2.0 + self.pan_x;
        let origin_y = (viewport.height - image.height * self.scale) / 2.0 + self.pan_y;
        (origin_x, origin_y)
    }

    /// Map a screen position to normalized image coordinates, clamped to `[0,1]`.
    pub fn screen_to_normalized(
        &self,
        screen_x: f32,
        screen_y: f32,
        image: Size,
        viewport: Size,
    ) -> (f32, f32) {
        let (origin_x, origin_y) = self.origin(image, viewport);
        let scaled_w = image.width * self.scale;
        let scaled_h = image.height * self.scale;
        if scaled_w <= 0.0 || scaled_h <= 0.0 {
            return (0.0, 0.0);
        }
        let x = ((screen_x - origin_x) / scaled_w).clamp(0.0, 1.0);
        let y = ((screen_y - origin_y) / scaled_h).clamp(0.0, 1.0);
        (x, y)
    }

    /// Map normalized image coordinates back to a screen position.
    pub fn normalized_to_screen(&self, x: f32, y: f32, image: Size, viewport: Size) -> (f32, f32) {
        let (origin_x, origin_y) = self.origin(image, viewport);
        (
            origin_x + x * image.width * self.scale,
            origin_y + y * image.height * self.scale,
        )
    }

    /// Calculate zoom-to-cursor transformation.
    ///
    /// Keeps the image point under the cursor fixed while changing scale.
    /// Pan is measured from the centered position, so cursor coordinates are
    /// taken relative to the viewport center.
    pub fn zoom_to_cursor(
        &self,
        new_scale: f32,
        cursor_x: f32,
        cursor_y: f32,
        viewport: Size,
    ) -> ViewTransform {
        let cursor_rel_x = cursor_x - viewport.width / 2.0;
        let cursor_rel_y = cursor_y - viewport.height / 2.0;

        // Image-space offset from the image center, before zoom
        let img_x = (cursor_rel_x - self.pan_x) / self.scale;
        let img_y = (cursor_rel_y - self.pan_y) / self.scale;

        ViewTransform {
            scale: new_scale,
            pan_x: cursor_rel_x - img_x * new_scale,
            pan_y: cursor_rel_y - img_y * new_scale,
        }
    }

    /// Apply a pan delta to the transform.
    pub fn pan_by(&self, dx: f32, dy: f32) -> ViewTransform {
        ViewTransform {
            scale: self.scale,
            pan_x: self.pan_x + dx,
            pan_y: self.pan_y + dy,
        }
    }

    /// Zoom in by a factor (e.g., 1.2 for 20% zoom in).
    pub fn zoom_in(&self, factor: f32, max_scale: f32) -> ViewTransform {
        ViewTransform {
            scale: (self.scale * factor).min(max_scale),
            ..*self
        }
    }

    /// Zoom out by a factor (e.g., 1.2 for 20% zoom out).
    pub fn zoom_out(&self, factor: f32, min_scale: f32) -> ViewTransform {
        ViewTransform {
            scale: (self.scale / factor).max(min_scale),
            ..*self
        }
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    const IMAGE: Size = Size {
        width: 200.0,
        height: 100.0,
    };
    const VIEWPORT: Size = Size {
        width: 400.0,
        height: 300.0,
    };

    #[test]
    fn test_origin_centers_image() {
        let t = ViewTransform::identity();
        assert_eq!(t.origin(IMAGE, VIEWPORT), (100.0, 100.0));

        let panned = t.pan_by(10.0, -20.0);
        assert_eq!(panned.origin(IMAGE, VIEWPORT), (110.0, 80.0));
    }

    #[test]
    fn test_screen_to_normalized() {
        let t = ViewTransform::identity();
        let (x, y) = t.screen_to_normalized(150.0, 125.0, IMAGE, VIEWPORT);
        assert!(approx_eq(x, 0.25));
        assert!(approx_eq(y, 0.25));
    }

    #[test]
    fn test_screen_to_normalized_with_scale() {
        let t = ViewTransform::new(2.0, 0.0, 0.0);
        // Scaled image is 400x200, origin at (0, 50)
        let (x, y) = t.screen_to_normalized(100.0, 100.0, IMAGE, VIEWPORT);
        assert!(approx_eq(x, 0.25));
        assert!(approx_eq(y, 0.25));
    }

    #[test]
    fn test_screen_to_normalized_clamps() {
        let t = ViewTransform::identity();
        assert_eq!(t.screen_to_normalized(0.0, 0.0, IMAGE, VIEWPORT), (0.0, 0.0));
        assert_eq!(
            t.screen_to_normalized(399.0, 299.0, IMAGE, VIEWPORT),
            (1.0, 1.0)
        );
    }

    #[test]
    fn test_normalized_screen_inverse() {
        let t = ViewTransform::new(1.5, 12.0, -7.0);
        let (sx, sy) = t.normalized_to_screen(0.3, 0.6, IMAGE, VIEWPORT);
        let (x, y) = t.screen_to_normalized(sx, sy, IMAGE, VIEWPORT);
        assert!(approx_eq(x, 0.3));
        assert!(approx_eq(y, 0.6));
    }

    #[test]
    fn test_fit() {
        let t = ViewTransform::fit(IMAGE, VIEWPORT);
        // Width is the limiting axis: 400 / 200
        assert!(approx_eq(t.scale, 2.0));
        assert_eq!((t.pan_x, t.pan_y), (0.0, 0.0));
    }

    #[test]
    fn test_fit_degenerate_image() {
        let t = ViewTransform::fit(Size::new(0.0, 100.0), VIEWPORT);
        assert_eq!(t, ViewTransform::identity());
    }

    #[test]
    fn test_zoom_to_cursor_at_center() {
        let t = ViewTransform::identity();
        let new_t = t.zoom_to_cursor(2.0, 200.0, 150.0, VIEWPORT);

        assert_eq!(new_t.scale, 2.0);
        assert!(approx_eq(new_t.pan_x, 0.0));
        assert!(approx_eq(new_t.pan_y, 0.0));
    }

    #[test]
    fn test_zoom_to_cursor_preserves_cursor_point() {
        let t = ViewTransform::new(1.0, 30.0, -10.0);
        let (cursor_x, cursor_y) = (260.0, 140.0);

        let before = t.screen_to_normalized(cursor_x, cursor_y, IMAGE, VIEWPORT);
        let new_t = t.zoom_to_cursor(2.5, cursor_x, cursor_y, VIEWPORT);
        let after = new_t.screen_to_normalized(cursor_x, cursor_y, IMAGE, VIEWPORT);

        assert!(approx_eq(before.0, after.0));
        assert!(approx_eq(before.1, after.1));
    }

    #[test]
    fn test_zoom_limits() {
        let t = ViewTransform::new(4.0, 0.0, 0.0);
        assert_eq!(t.zoom_in(1.5, 5.0).scale, 5.0);

        let t = ViewTransform::new(0.3, 5.0, 5.0);
        let out = t.zoom_out(1.5, 0.2);
        assert!(approx_eq(out.scale, 0.2));
        assert_eq!((out.pan_x, out.pan_y), (5.0, 5.0));
    }
}
