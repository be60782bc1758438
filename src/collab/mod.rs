//! Collaborator contracts and an in-memory backend.

mod memory;
mod traits;

pub use memory::MemoryBackend;
pub use traits::{ActiveLearningQueue, DefectTypeRegistry, SampleCommit, SampleStore};
