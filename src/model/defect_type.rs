//! Defect type data model, as served by the defect type registry.

use serde::{Deserialize, Serialize};

/// A user-defined class of weld defect with a target training-sample count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectType {
    /// Unique identifier
    pub id: u32,
    /// Display name
    pub name: String,
    /// Short code, e.g. "POR" for porosity
    pub code: String,
    /// Hex display color, e.g. "#ff0000"
    pub color: String,
    /// Samples collected so far
    #[serde(default)]
    pub current_sample_count: u32,
    /// Samples needed before the class can be trained
    #[serde(default)]
    pub min_samples_required: u32,
    /// Inactive types are hidden from the class selector
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl DefectType {
    pub fn new(id: u32, name: &str, code: &str, color: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            code: code.to_string(),
            color: color.to_string(),
            current_sample_count: 0,
            min_samples_required: 0,
            is_active: true,
        }
    }

    pub fn with_samples(mut self, current: u32, required: u32) -> Self {
        self.current_sample_count = current;
        self.min_samples_required = required;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Whether enough samples exist to train this class.
    pub fn is_ready_to_train(&self) -> bool {
        self.current_sample_count >= self.min_samples_required
    }

    /// Samples still missing before the class is ready.
    pub fn remaining_samples(&self) -> u32 {
        self.min_samples_required
            .saturating_sub(self.current_sample_count)
    }

    /// Collection progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.min_samples_required == 0 {
            return 1.0;
        }
        (self.current_sample_count as f32 / self.min_samples_required as f32).min(1.0)
    }
}
