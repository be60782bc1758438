//! In-memory backend implementing every collaborator contract.
//!
//! Sample counts behave like a caching registry: writes are recorded
//! immediately but only show up in [`DefectTypeRegistry::list`] after
//! [`DefectTypeRegistry::reload`]. Failures can be injected per operation.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::traits::{ActiveLearningQueue, DefectTypeRegistry, SampleCommit, SampleStore};
use crate::error::{RegistryError, StoreError};
use crate::model::DefectType;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    types: RefCell<Vec<DefectType>>,
    samples: RefCell<Vec<SampleCommit>>,
    /// Samples written since the last reload, per class
    unsynced: RefCell<HashMap<u32, u32>>,
    commit_attempts: Cell<usize>,
    fail_commit_at: Cell<Option<usize>>,
    reloads: Cell<usize>,
    fail_reload: Cell<bool>,
    skipped: RefCell<Vec<u64>>,
    fail_skip: Cell<bool>,
}

impl MemoryBackend {
    pub fn new(types: Vec<DefectType>) -> Self {
        Self {
            types: RefCell::new(types),
            ..Default::default()
        }
    }

    /// Fail the commit attempt with the given zero-based index (counted over
    /// the backend's lifetime).
    pub fn fail_commit_at(&self, attempt: Option<usize>) {
        self.fail_commit_at.set(attempt);
    }

    pub fn fail_reload(&self, fail: bool) {
        self.fail_reload.set(fail);
    }

    pub fn fail_skip(&self, fail: bool) {
        self.fail_skip.set(fail);
    }

    /// Samples stored so far, in commit order.
    pub fn samples(&self) -> Vec<SampleCommit> {
        self.samples.borrow().clone()
    }

    /// Number of `add_sample` calls, including failed ones.
    pub fn commit_attempts(&self) -> usize {
        self.commit_attempts.get()
    }

    pub fn reload_count(&self) -> usize {
        self.reloads.get()
    }

    /// Suggestion ids passed to `mark_skipped`, including failed calls.
    pub fn skipped(&self) -> Vec<u64> {
        self.skipped.borrow().clone()
    }
}

impl SampleStore for MemoryBackend {
    fn add_sample(&self, sample: &SampleCommit) -> Result<(), StoreError> {
        let attempt = self.commit_attempts.get();
        self.commit_attempts.set(attempt + 1);

        if self.fail_commit_at.get() == Some(attempt) {
            return Err(StoreError::Unavailable(format!(
                "injected failure on commit {attempt}"
            )));
        }
        if !self.types.borrow().iter().any(|t| t.id == sample.class_id) {
            return Err(StoreError::NotFound(format!(
                "defect type {}",
                sample.class_id
            )));
        }

        *self
            .unsynced
            .borrow_mut()
            .entry(sample.class_id)
            .or_default() += 1;
        self.samples.borrow_mut().push(sample.clone());
        Ok(())
    }
}

impl DefectTypeRegistry for MemoryBackend {
    fn list(&self, active_only: bool) -> Result<Vec<DefectType>, RegistryError> {
        Ok(self
            .types
            .borrow()
            .iter()
            .filter(|t| !active_only || t.is_active)
            .cloned()
            .collect())
    }

    fn reload(&self) -> Result<(), RegistryError> {
        self.reloads.set(self.reloads.get() + 1);
        if self.fail_reload.get() {
            return Err(RegistryError::Unavailable("injected reload failure".into()));
        }

        let mut unsynced = self.unsynced.borrow_mut();
        for defect_type in self.types.borrow_mut().iter_mut() {
            if let Some(added) = unsynced.remove(&defect_type.id) {
                defect_type.current_sample_count += added;
            }
        }
        Ok(())
    }
}

impl ActiveLearningQueue for MemoryBackend {
    fn mark_skipped(&self, suggestion_id: u64) -> Result<(), StoreError> {
        self.skipped.borrow_mut().push(suggestion_id);
        if self.fail_skip.get() {
            return Err(StoreError::Unavailable("injected skip failure".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Annotation, LabelingMode, NormalizedBox};
    use crate::source::ImageRef;

    fn backend() -> MemoryBackend {
        MemoryBackend::new(vec![
            DefectType::new(1, "Porosity", "POR", "#ff0000").with_samples(3, 5),
            DefectType::new(2, "Crack", "CRK", "#00ff00").inactive(),
        ])
    }

    fn commit(class_id: u32) -> SampleCommit {
        let annotation = Annotation::new(NormalizedBox::new(0.1, 0.1, 0.2, 0.2), class_id, "x");
        SampleCommit::from_annotation(
            &annotation,
            &ImageRef::new("img"),
            None,
            LabelingMode::Manual,
        )
    }

    #[test]
    fn test_list_active_only() {
        let backend = backend();
        assert_eq!(backend.list(false).expect("list").len(), 2);
        let active = backend.list(true).expect("list");
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, 1);
    }

    #[test]
    fn test_counts_visible_after_reload() {
        let backend = backend();
        backend.add_sample(&commit(1)).expect("commit");
        backend.add_sample(&commit(1)).expect("commit");
        assert_eq!(backend.list(true).expect("list")[0].current_sample_count, 3);

        backend.reload().expect("reload");
        let porosity = &backend.list(true).expect("list")[0];
        assert_eq!(porosity.current_sample_count, 5);
        assert!(porosity.is_ready_to_train());
    }

    #[test]
    fn test_unknown_class_rejected() {
        let backend = backend();
        let err = backend.add_sample(&commit(99)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(backend.samples().is_empty());
    }

    #[test]
    fn test_injected_commit_failure() {
        let backend = backend();
        backend.fail_commit_at(Some(1));
        assert!(backend.add_sample(&commit(1)).is_ok());
        assert!(backend.add_sample(&commit(1)).is_err());
        assert!(backend.add_sample(&commit(1)).is_ok());
        assert_eq!(backend.commit_attempts(), 3);
        assert_eq!(backend.samples().len(), 2);
    }
}
