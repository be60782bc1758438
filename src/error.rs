//! Error types for the labeling session and its collaborators.

use thiserror::Error;

/// Error returned by the sample store or the active-learning queue.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The backend rejected the request
    #[error("Rejected by backend: {0}")]
    Rejected(String),

    /// The backend could not be reached
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The referenced item does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Error returned by the defect type registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// Listing or reloading failed
    #[error("Registry unavailable: {0}")]
    Unavailable(String),
}

/// Errors produced by labeling session operations.
///
/// Every error leaves the session in a consistent state; a failed save keeps
/// the image and annotations so the user can retry or skip.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// An annotation was drawn before a defect type was chosen
    #[error("No defect type selected")]
    NoClassSelected,

    /// The class id is not among the active defect types
    #[error("Unknown or inactive defect type: {id}")]
    UnknownClass {
        /// The requested class id
        id: u32,
    },

    /// The drawn box is thinner than the minimum size on some axis
    #[error("Box too small: {width:.4} x {height:.4} (minimum {min})")]
    BoxTooSmall {
        /// Normalized width
        width: f32,
        /// Normalized height
        height: f32,
        /// Minimum normalized side length
        min: f32,
    },

    /// The box has non-finite, out-of-range, or unordered coordinates
    #[error("Invalid box coordinates: {0:?}")]
    InvalidBox([f32; 4]),

    /// Save was requested with nothing to commit
    #[error("No annotations to save")]
    EmptyAnnotationSet,

    /// The operation is not allowed in the current state
    #[error("Cannot {operation}: {reason}")]
    InvalidTransition {
        /// The attempted operation
        operation: &'static str,
        /// Why it was refused
        reason: String,
    },

    /// A sample commit failed; earlier commits are not rolled back
    #[error("Commit of annotation {index} failed: {source}")]
    CommitFailed {
        /// Index of the first failing annotation
        index: usize,
        /// The store error
        source: StoreError,
    },

    /// The registry could not be reloaded after a successful save
    #[error("Defect type registry reload failed: {0}")]
    RegistryReloadFailed(#[source] RegistryError),
}

impl SessionError {
    pub fn invalid_transition(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidTransition {
            operation,
            reason: reason.into(),
        }
    }

    /// Check if this is an [`InvalidTransition`](Self::InvalidTransition).
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }
}
