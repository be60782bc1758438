//! Data models for the labeling session.

mod annotation;
mod bbox;
mod defect_type;

pub use annotation::{Annotation, LabelingMode};
pub use bbox::NormalizedBox;
pub use defect_type::DefectType;
