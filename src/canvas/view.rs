//! Pointer handling for the annotation canvas.

use super::drag::BoxDrag;
use super::transform::{Size, ViewTransform};
use crate::config::{ConfigError, ZoomConfig};
use crate::model::NormalizedBox;

/// What the primary pointer button currently does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerMode {
    /// Drag out a new box.
    #[default]
    Draw,
    /// Drag to move the view.
    Pan,
}

/// Canvas state for one displayed image: view transform plus the drag in progress.
///
/// Positions passed in are screen coordinates relative to the canvas.
#[derive(Debug, Clone)]
pub struct CanvasView {
    image: Size,
    viewport: Size,
    transform: ViewTransform,
    zoom: ZoomConfig,
    drag: BoxDrag,
    pointer_mode: PointerMode,
    last_pan_pos: Option<(f32, f32)>,
}

impl CanvasView {
    /// Create a view that fits the image into the viewport.
    ///
    /// Fails if the zoom limits are not a valid range.
    pub fn new(image: Size, viewport: Size, zoom: ZoomConfig) -> Result<Self, ConfigError> {
        zoom.validate()?;
        Ok(Self {
            image,
            viewport,
            transform: Self::fitted(image, viewport, &zoom),
            zoom,
            drag: BoxDrag::default(),
            pointer_mode: PointerMode::default(),
            last_pan_pos: None,
        })
    }

    fn fitted(image: Size, viewport: Size, zoom: &ZoomConfig) -> ViewTransform {
        let mut transform = ViewTransform::fit(image, viewport);
        transform.scale = transform.scale.clamp(zoom.min_zoom, zoom.max_zoom);
        transform
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn pointer_mode(&self) -> PointerMode {
        self.pointer_mode
    }

    pub fn set_pointer_mode(&mut self, mode: PointerMode) {
        self.drag.cancel();
        self.last_pan_pos = None;
        self.pointer_mode = mode;
    }

    /// Update the viewport size, e.g. after a window resize.
    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Fit the image again and drop any pan.
    pub fn reset_view(&mut self) {
        self.transform = Self::fitted(self.image, self.viewport, &self.zoom);
    }

    pub fn to_normalized(&self, x: f32, y: f32) -> (f32, f32) {
        self.transform
            .screen_to_normalized(x, y, self.image, self.viewport)
    }

    pub fn to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        self.transform
            .normalized_to_screen(x, y, self.image, self.viewport)
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        match self.pointer_mode {
            PointerMode::Draw => {
                let (nx, ny) = self.to_normalized(x, y);
                self.drag.start(nx, ny);
            }
            PointerMode::Pan => self.last_pan_pos = Some((x, y)),
        }
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        match self.pointer_mode {
            PointerMode::Draw => {
                let (nx, ny) = self.to_normalized(x, y);
                self.drag.update(nx, ny);
            }
            PointerMode::Pan => {
                if let Some((last_x, last_y)) = self.last_pan_pos {
                    self.transform = self.transform.pan_by(x - last_x, y - last_y);
                    self.last_pan_pos = Some((x, y));
                }
            }
        }
    }

    /// Release the pointer. In draw mode this yields the dragged box.
    pub fn pointer_up(&mut self, x: f32, y: f32) -> Option<NormalizedBox> {
        self.pointer_move(x, y);
        self.last_pan_pos = None;
        self.drag.finish()
    }

    /// Box being dragged, for preview rendering.
    pub fn preview(&self) -> Option<NormalizedBox> {
        self.drag.preview()
    }

    /// Zoom one step around the cursor. Positive `direction` zooms in.
    pub fn wheel(&mut self, direction: f32, cursor_x: f32, cursor_y: f32) {
        let step = self.zoom.zoom_step;
        let target = if direction > 0.0 {
            self.transform.zoom_in(step, self.zoom.max_zoom).scale
        } else if direction < 0.0 {
            self.transform.zoom_out(step, self.zoom.min_zoom).scale
        } else {
            return;
        };
        self.transform = self
            .transform
            .zoom_to_cursor(target, cursor_x, cursor_y, self.viewport);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn view() -> CanvasView {
        // 200x100 image in a 400x200 viewport fits at scale 2 with origin (0, 0)
        CanvasView::new(
            Size::new(200.0, 100.0),
            Size::new(400.0, 200.0),
            ZoomConfig::default(),
        )
        .expect("default zoom is valid")
    }

    #[test]
    fn test_draw_box_any_direction() {
        let mut view = view();
        view.pointer_down(300.0, 150.0);
        view.pointer_move(200.0, 100.0);
        assert!(view.preview().is_some());

        let bbox = view.pointer_up(100.0, 50.0).expect("box");
        assert!((bbox.x1 - 0.25).abs() < EPSILON);
        assert!((bbox.y1 - 0.25).abs() < EPSILON);
        assert!((bbox.x2 - 0.75).abs() < EPSILON);
        assert!((bbox.y2 - 0.75).abs() < EPSILON);
        assert!(view.preview().is_none());
    }

    #[test]
    fn test_draw_clamps_to_image() {
        let mut view = view();
        view.set_pointer_mode(PointerMode::Pan);
        view.pointer_down(0.0, 0.0);
        view.pointer_up(50.0, 20.0);
        view.set_pointer_mode(PointerMode::Draw);

        view.pointer_down(-100.0, -100.0);
        let bbox = view.pointer_up(1000.0, 1000.0).expect("box");
        assert_eq!(bbox.to_array(), [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_pan_moves_origin() {
        let mut view = view();
        view.set_pointer_mode(PointerMode::Pan);
        view.pointer_down(10.0, 10.0);
        assert!(view.pointer_up(40.0, -10.0).is_none());

        let t = view.transform();
        assert_eq!((t.pan_x, t.pan_y), (30.0, -20.0));

        view.reset_view();
        assert_eq!(view.transform().pan_x, 0.0);
    }

    #[test]
    fn test_wheel_keeps_point_under_cursor() {
        let mut view = view();
        let before = view.to_normalized(120.0, 80.0);
        view.wheel(1.0, 120.0, 80.0);
        let after = view.to_normalized(120.0, 80.0);

        assert!(view.transform().scale > 2.0);
        assert!((before.0 - after.0).abs() < EPSILON);
        assert!((before.1 - after.1).abs() < EPSILON);
    }

    #[test]
    fn test_wheel_respects_limits() {
        let mut view = view();
        for _ in 0..100 {
            view.wheel(-1.0, 200.0, 100.0);
        }
        assert!((view.transform().scale - ZoomConfig::default().min_zoom).abs() < EPSILON);
    }

    #[test]
    fn test_inverted_zoom_range_is_rejected() {
        let zoom = ZoomConfig {
            min_zoom: 5.0,
            max_zoom: 1.0,
            ..ZoomConfig::default()
        };
        let result = CanvasView::new(Size::new(200.0, 100.0), Size::new(400.0, 200.0), zoom);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "zoom", .. })
        ));

        let nan = ZoomConfig {
            min_zoom: f32::NAN,
            ..ZoomConfig::default()
        };
        assert!(CanvasView::new(Size::new(200.0, 100.0), Size::new(400.0, 200.0), nan).is_err());
    }
}
