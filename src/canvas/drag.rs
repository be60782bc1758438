//! Box drawing state for the annotation canvas.

use crate::model::NormalizedBox;

/// State of the box currently being dragged out, in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BoxDrag {
    /// Not currently drawing anything.
    #[default]
    Idle,
    /// Drawing a box - stores the starting and current corners.
    Dragging {
        start_x: f32,
        start_y: f32,
        current_x: f32,
        current_y: f32,
    },
}

impl BoxDrag {
    /// Check if a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        matches!(self, BoxDrag::Dragging { .. })
    }

    /// Start a drag at the given normalized point.
    pub fn start(&mut self, x: f32, y: f32) {
        *self = BoxDrag::Dragging {
            start_x: x,
            start_y: y,
            current_x: x,
            current_y: y,
        };
    }

    /// Move the free corner. Ignored when idle.
    pub fn update(&mut self, x: f32, y: f32) {
        if let BoxDrag::Dragging {
            current_x,
            current_y,
            ..
        } = self
        {
            *current_x = x;
            *current_y = y;
        }
    }

    /// Box spanned by the drag so far, for preview rendering.
    pub fn preview(&self) -> Option<NormalizedBox> {
        match *self {
            BoxDrag::Idle => None,
            BoxDrag::Dragging {
                start_x,
                start_y,
                current_x,
                current_y,
            } => Some(NormalizedBox::from_corners(
                start_x, start_y, current_x, current_y,
            )),
        }
    }

    /// End the drag and return the spanned box. Size validation is left to
    /// the session, which reports undersized boxes as errors.
    pub fn finish(&mut self) -> Option<NormalizedBox> {
        let bbox = self.preview();
        *self = BoxDrag::Idle;
        bbox
    }

    /// Cancel the current drag.
    pub fn cancel(&mut self) {
        *self = BoxDrag::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_normalizes_corners() {
        let mut drag = BoxDrag::default();
        drag.start(0.6, 0.7);
        drag.update(0.2, 0.1);
        assert!(drag.is_dragging());

        let bbox = drag.finish().expect("drag should yield a box");
        assert_eq!(bbox.to_array(), [0.2, 0.1, 0.6, 0.7]);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_update_while_idle_is_ignored() {
        let mut drag = BoxDrag::default();
        drag.update(0.5, 0.5);
        assert_eq!(drag, BoxDrag::Idle);
        assert!(drag.finish().is_none());
    }

    #[test]
    fn test_cancel() {
        let mut drag = BoxDrag::default();
        drag.start(0.1, 0.1);
        drag.cancel();
        assert!(drag.preview().is_none());
    }
}
