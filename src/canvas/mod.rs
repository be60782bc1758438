//! Annotation canvas geometry: viewport mapping, box dragging, pointer handling.

mod drag;
mod transform;
mod view;

pub use drag::BoxDrag;
pub use transform::{Size, ViewTransform};
pub use view::{CanvasView, PointerMode};
