//! Global constants for the labeling session

/// Smallest accepted box side, as a fraction of the normalized image axis.
pub const MIN_BOX_FRACTION: f32 = 0.005;

/// Lower zoom bound for the annotation canvas.
pub const MIN_ZOOM: f32 = 0.1;

/// Upper zoom bound for the annotation canvas.
pub const MAX_ZOOM: f32 = 10.0;

/// Multiplicative factor applied per zoom step (wheel notch or button).
pub const ZOOM_STEP: f32 = 1.2;

/// Default byte budget for the labeling history cache.
pub const DEFAULT_HISTORY_CAPACITY_BYTES: usize = 256 * 1024;

/// Key under which the labeling history is stored.
pub const HISTORY_KEY: &str = "weldlabel-history";

/// Annotation format tag sent with every committed sample.
pub const SAMPLE_FORMAT_BBOX: &str = "bbox";
