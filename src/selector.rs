//! Class selector over the active defect types.

use crate::collab::DefectTypeRegistry;
use crate::error::{RegistryError, SessionError};
use crate::model::DefectType;

/// The defect types offered for labeling and the one currently chosen.
///
/// Independent of the session state machine: the selection survives saves,
/// skips, and image changes.
#[derive(Debug, Clone, Default)]
pub struct ClassSelector {
    types: Vec<DefectType>,
    selected: Option<u32>,
}

impl ClassSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a selector over an already fetched list. Inactive entries are dropped.
    pub fn with_types(types: Vec<DefectType>) -> Self {
        let mut selector = Self::new();
        selector.set_types(types);
        selector
    }

    /// Reload the active types from the registry.
    pub fn refresh(&mut self, registry: &dyn DefectTypeRegistry) -> Result<(), RegistryError> {
        let types = registry.list(true)?;
        self.set_types(types);
        Ok(())
    }

    fn set_types(&mut self, types: Vec<DefectType>) {
        self.types = types.into_iter().filter(|t| t.is_active).collect();
        if let Some(id) = self.selected {
            if !self.types.iter().any(|t| t.id == id) {
                log::debug!("Selected defect type {} is no longer available", id);
                self.selected = None;
            }
        }
    }

    /// Choose the class for new annotations.
    pub fn select(&mut self, class_id: u32) -> Result<&DefectType, SessionError> {
        let defect_type = self
            .types
            .iter()
            .find(|t| t.id == class_id)
            .ok_or(SessionError::UnknownClass { id: class_id })?;
        self.selected = Some(class_id);
        Ok(defect_type)
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// The currently chosen defect type, if any.
    pub fn selected(&self) -> Option<&DefectType> {
        let id = self.selected?;
        self.types.iter().find(|t| t.id == id)
    }

    pub fn types(&self) -> &[DefectType] {
        &self.types
    }

    /// Number of active types with enough samples to train.
    pub fn ready_count(&self) -> usize {
        self.types.iter().filter(|t| t.is_ready_to_train()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::MemoryBackend;

    fn types() -> Vec<DefectType> {
        vec![
            DefectType::new(1, "Porosity", "POR", "#ff0000").with_samples(10, 5),
            DefectType::new(2, "Crack", "CRK", "#00ff00").with_samples(1, 5),
            DefectType::new(3, "Slag", "SLG", "#0000ff").inactive(),
        ]
    }

    #[test]
    fn test_select_existing() {
        let mut selector = ClassSelector::with_types(types());
        let chosen = selector.select(2).expect("select");
        assert_eq!(chosen.name, "Crack");
        assert_eq!(selector.selected().map(|t| t.id), Some(2));
    }

    #[test]
    fn test_select_unknown_or_inactive() {
        let mut selector = ClassSelector::with_types(types());
        assert_eq!(
            selector.select(42).unwrap_err(),
            SessionError::UnknownClass { id: 42 }
        );
        assert_eq!(
            selector.select(3).unwrap_err(),
            SessionError::UnknownClass { id: 3 }
        );
        assert!(selector.selected().is_none());
    }

    #[test]
    fn test_ready_count() {
        let selector = ClassSelector::with_types(types());
        assert_eq!(selector.types().len(), 2);
        assert_eq!(selector.ready_count(), 1);
    }

    #[test]
    fn test_refresh_keeps_valid_selection() {
        let backend = MemoryBackend::new(types());
        let mut selector = ClassSelector::new();
        selector.refresh(&backend).expect("refresh");
        selector.select(1).expect("select");

        selector.refresh(&backend).expect("refresh");
        assert_eq!(selector.selected().map(|t| t.id), Some(1));
    }

    #[test]
    fn test_refresh_drops_vanished_selection() {
        let mut selector = ClassSelector::with_types(types());
        selector.select(2).expect("select");

        let backend = MemoryBackend::new(vec![DefectType::new(1, "Porosity", "POR", "#ff0000")]);
        selector.refresh(&backend).expect("refresh");
        assert!(selector.selected().is_none());
    }
}
