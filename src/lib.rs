//! weldlabel - labeling sessions for radiographic weld-defect datasets
//!
//! Manages one annotation pass over one image: acquiring it by manual upload
//! or from the active-learning suggestion feed, drawing normalized bounding
//! boxes with a chosen defect type, and committing them to a sample store.
//! Backends are reached through the traits in [`collab`].

pub mod canvas;
pub mod collab;
pub mod config;
pub mod constants;
pub mod error;
pub mod history;
pub mod model;
pub mod selector;
pub mod session;
pub mod source;

pub use collab::{ActiveLearningQueue, DefectTypeRegistry, MemoryBackend, SampleCommit, SampleStore};
pub use config::LabelingConfig;
pub use error::{RegistryError, SessionError, StoreError};
pub use model::{Annotation, DefectType, LabelingMode, NormalizedBox};
pub use selector::ClassSelector;
pub use session::{LabelingSession, SaveBatch, SaveReport, SessionSnapshot, SessionState};
pub use source::{AcquiredImage, ImageRef, ManualUpload, Suggestion, SuggestionFeed};
