//! Annotation and acquisition-mode types.

use serde::{Deserialize, Serialize};

use super::NormalizedBox;

/// Where the image being labeled came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelingMode {
    /// The user uploaded a local file.
    #[default]
    Manual,
    /// The image was picked from the ranked active-learning queue.
    ActiveLearning,
}

impl LabelingMode {
    /// Get the display name for this mode.
    pub fn name(&self) -> &'static str {
        match self {
            LabelingMode::Manual => "Manual Upload",
            LabelingMode::ActiveLearning => "Active Learning",
        }
    }

    /// Value sent as the `source` of committed samples.
    pub fn source_tag(&self) -> &'static str {
        match self {
            LabelingMode::Manual => "manual",
            LabelingMode::ActiveLearning => "active_learning",
        }
    }

    /// Get all modes.
    pub fn all() -> &'static [LabelingMode] {
        &[LabelingMode::Manual, LabelingMode::ActiveLearning]
    }
}

/// A labeled box on the current image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Box geometry, normalized to the image.
    pub bbox: NormalizedBox,
    /// Defect type id this box is labeled with.
    pub class_id: u32,
    /// Defect type name at the time of labeling.
    pub class_name: String,
}

impl Annotation {
    pub fn new(bbox: NormalizedBox, class_id: u32, class_name: impl Into<String>) -> Self {
        Self {
            bbox,
            class_id,
            class_name: class_name.into(),
        }
    }
}
