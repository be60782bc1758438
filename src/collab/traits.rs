//! Contracts for the backend services the labeling session talks to.
//!
//! All methods take `&self`: a backend is usually an HTTP client handle, and
//! the in-memory implementations use interior mutability. This also lets one
//! object serve as several collaborators at once.

use serde::Serialize;

use crate::constants::SAMPLE_FORMAT_BBOX;
use crate::error::{RegistryError, StoreError};
use crate::model::{Annotation, DefectType, LabelingMode};
use crate::source::ImageRef;

/// One training sample as sent to the sample store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleCommit {
    /// Defect type id
    pub class_id: u32,
    /// Image the box was drawn on
    pub image_ref: ImageRef,
    /// Image identifier, when the provider supplied one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    /// `[x1, y1, x2, y2]`, normalized
    pub bbox: [f32; 4],
    /// Defect type name
    pub class_name: String,
    /// Annotation format tag, always `"bbox"`
    pub format: &'static str,
    /// How the image was acquired
    pub source: LabelingMode,
}

impl SampleCommit {
    /// Build the commit for one annotation of the current image.
    pub fn from_annotation(
        annotation: &Annotation,
        image_ref: &ImageRef,
        image_id: Option<&str>,
        source: LabelingMode,
    ) -> Self {
        Self {
            class_id: annotation.class_id,
            image_ref: image_ref.clone(),
            image_id: image_id.map(str::to_string),
            bbox: annotation.bbox.to_array(),
            class_name: annotation.class_name.clone(),
            format: SAMPLE_FORMAT_BBOX,
            source,
        }
    }
}

/// Persists committed annotations for later model training.
pub trait SampleStore {
    /// Store one sample.
    fn add_sample(&self, sample: &SampleCommit) -> Result<(), StoreError>;
}

/// Source of the nameable defect classes.
pub trait DefectTypeRegistry {
    /// List defect types, optionally only the active ones.
    fn list(&self, active_only: bool) -> Result<Vec<DefectType>, RegistryError>;

    /// Refresh cached types so sample counts reflect recent writes.
    fn reload(&self) -> Result<(), RegistryError>;
}

/// The external active-learning suggestion queue.
pub trait ActiveLearningQueue {
    /// Tell the queue the user passed on a suggestion.
    fn mark_skipped(&self, suggestion_id: u64) -> Result<(), StoreError>;
}
