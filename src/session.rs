//! Labeling session: one annotation pass over one image.
//!
//! ```text
//!            acquire_image               begin_save
//!   Empty ─────────────────▶ ImageLoaded ──────────▶ Saving
//!     ▲                        │    ▲                  │
//!     │          skip          │    │  commit failed   │
//!     ├────────────────────────┘    └──────────────────┤
//!     │                   commits succeeded            │
//!     └────────────────────────────────────────────────┘
//! ```
//!
//! Every transition is triggered by an explicit call. Saving is split into
//! [`LabelingSession::begin_save`] and [`LabelingSession::finish_save`] so a
//! host can run the commits asynchronously; [`LabelingSession::save`] does
//! the whole round trip synchronously. While a save is pending, every other
//! state-changing call is refused with [`SessionError::InvalidTransition`].

use std::fmt;

use crate::collab::{ActiveLearningQueue, DefectTypeRegistry, SampleCommit, SampleStore};
use crate::config::{ConfigError, LabelingConfig};
use crate::constants::MIN_BOX_FRACTION;
use crate::error::SessionError;
use crate::model::{Annotation, DefectType, LabelingMode, NormalizedBox};
use crate::selector::ClassSelector;
use crate::source::{AcquiredImage, ImageRef};

/// Coarse state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for an image.
    Empty,
    /// An image is loaded and can be annotated.
    ImageLoaded,
    /// Commits are in flight.
    Saving,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Empty => "empty",
            SessionState::ImageLoaded => "image loaded",
            SessionState::Saving => "saving",
        }
    }
}

/// Immutable view of the session, handed to observers after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub mode: LabelingMode,
    pub image_ref: Option<ImageRef>,
    pub image_id: Option<String>,
    pub suggestion_id: Option<u64>,
    pub annotations: Vec<Annotation>,
}

impl SessionSnapshot {
    /// The snapshot of a freshly created or reset session.
    pub fn empty(mode: LabelingMode) -> Self {
        Self {
            state: SessionState::Empty,
            mode,
            image_ref: None,
            image_id: None,
            suggestion_id: None,
            annotations: Vec::new(),
        }
    }
}

/// Handle returned by [`LabelingSession::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&SessionSnapshot)>;

/// Commits prepared by [`LabelingSession::begin_save`].
#[derive(Debug, Clone, PartialEq)]
pub struct SaveBatch {
    pub commits: Vec<SampleCommit>,
}

impl SaveBatch {
    /// Send the commits one by one, stopping at the first failure.
    ///
    /// Commits before the failing one stay in the store; nothing is rolled back.
    /// Returns the number of commits written.
    pub fn execute(&self, store: &dyn SampleStore) -> Result<usize, SessionError> {
        for (index, commit) in self.commits.iter().enumerate() {
            store.add_sample(commit).map_err(|source| {
                log::warn!(
                    "Commit {}/{} failed for '{}': {}",
                    index + 1,
                    self.commits.len(),
                    commit.class_name,
                    source
                );
                SessionError::CommitFailed { index, source }
            })?;
        }
        Ok(self.commits.len())
    }
}

/// Result of a completed save.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReport {
    /// Number of samples written
    pub committed: usize,
    pub image_id: String,
    pub mode: LabelingMode,
    pub suggestion_id: Option<u64>,
    /// Set when the registry reload after the save failed
    pub registry_error: Option<SessionError>,
}

#[derive(Debug, Clone)]
struct LoadedImage {
    image_ref: ImageRef,
    image_id: String,
    /// Kept across mode switches; only exposed in active-learning mode.
    suggestion_id: Option<u64>,
    dimensions: Option<(u32, u32)>,
}

/// What a pending save committed, fixed at `begin_save`.
#[derive(Debug, Clone, Copy)]
struct PendingSave {
    mode: LabelingMode,
    suggestion_id: Option<u64>,
}

/// State of one annotation pass, owned by the UI surface that drives it.
pub struct LabelingSession {
    mode: LabelingMode,
    state: SessionState,
    image: Option<LoadedImage>,
    annotations: Vec<Annotation>,
    selector: ClassSelector,
    min_box_fraction: f32,
    pending_save: Option<PendingSave>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl fmt::Debug for LabelingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelingSession")
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("image", &self.image)
            .field("annotations", &self.annotations)
            .field("selector", &self.selector)
            .field("pending_save", &self.pending_save)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl LabelingSession {
    pub fn new(mode: LabelingMode) -> Self {
        Self {
            mode,
            state: SessionState::Empty,
            image: None,
            annotations: Vec::new(),
            selector: ClassSelector::new(),
            min_box_fraction: MIN_BOX_FRACTION,
            pending_save: None,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Create a session using the limits from `config`, which must be valid.
    pub fn with_config(mode: LabelingMode, config: &LabelingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut session = Self::new(mode);
        session.min_box_fraction = config.min_box_fraction;
        Ok(session)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn mode(&self) -> LabelingMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session is waiting for an image.
    pub fn is_awaiting_image(&self) -> bool {
        self.image.is_none()
    }

    pub fn image_ref(&self) -> Option<&ImageRef> {
        self.image.as_ref().map(|i| &i.image_ref)
    }

    pub fn image_id(&self) -> Option<&str> {
        self.image.as_ref().map(|i| i.image_id.as_str())
    }

    /// Suggestion id of the loaded image. Always `None` in manual mode.
    pub fn suggestion_id(&self) -> Option<u64> {
        match self.mode {
            LabelingMode::ActiveLearning => self.image.as_ref().and_then(|i| i.suggestion_id),
            LabelingMode::Manual => None,
        }
    }

    pub fn image_dimensions(&self) -> Option<(u32, u32)> {
        self.image.as_ref().and_then(|i| i.dimensions)
    }

    /// Annotations in insertion order; the position is the display index.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn selector(&self) -> &ClassSelector {
        &self.selector
    }

    pub fn selected_class(&self) -> Option<&DefectType> {
        self.selector.selected()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            mode: self.mode,
            image_ref: self.image_ref().cloned(),
            image_id: self.image_id().map(str::to_string),
            suggestion_id: self.suggestion_id(),
            annotations: self.annotations.clone(),
        }
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Register a callback invoked with a snapshot after every state change.
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&SessionSnapshot) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove a callback. Returns false if the id was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for (_, observer) in self.observers.iter_mut() {
            observer(&snapshot);
        }
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Switch the acquisition mode. Allowed in any state.
    ///
    /// A loaded image and its annotations are kept. In
    /// [`LabelingMode::Manual`] the suggestion id of a queued image is hidden
    /// from accessors, commits and [`skip`](Self::skip); switching back to
    /// active learning exposes it again. A pending save is unaffected: its
    /// report carries the mode and suggestion id it was started with.
    pub fn select_mode(&mut self, mode: LabelingMode) {
        if self.mode == mode {
            return;
        }
        log::debug!("Mode: {} -> {}", self.mode.name(), mode.name());
        self.mode = mode;
        self.notify();
    }

    /// Load an image into an empty session.
    ///
    /// Active-learning images must carry a suggestion id; manual uploads must not.
    pub fn acquire_image(&mut self, image: AcquiredImage) -> Result<(), SessionError> {
        const OP: &str = "acquire image";
        if self.state != SessionState::Empty {
            return Err(SessionError::invalid_transition(
                OP,
                format!("session is {}", self.state.name()),
            ));
        }
        match (self.mode, image.suggestion_id) {
            (LabelingMode::ActiveLearning, None) => {
                return Err(SessionError::invalid_transition(
                    OP,
                    "active-learning images need a suggestion id",
                ));
            }
            (LabelingMode::Manual, Some(id)) => {
                return Err(SessionError::invalid_transition(
                    OP,
                    format!("manual uploads cannot carry suggestion id {id}"),
                ));
            }
            _ => {}
        }

        log::debug!(
            "Acquired image '{}' ({})",
            image.image_id,
            self.mode.source_tag()
        );
        self.image = Some(LoadedImage {
            image_ref: image.image_ref,
            image_id: image.image_id,
            suggestion_id: image.suggestion_id,
            dimensions: image.dimensions,
        });
        self.annotations.clear();
        self.state = SessionState::ImageLoaded;
        self.notify();
        Ok(())
    }

    /// Replace the selectable classes with an already fetched list.
    pub fn set_defect_types(&mut self, types: Vec<DefectType>) {
        self.selector = {
            let previous = self.selector.selected().map(|t| t.id);
            let mut selector = ClassSelector::with_types(types);
            if let Some(id) = previous {
                // Keep the selection when the class survived
                selector.select(id).ok();
            }
            selector
        };
    }

    /// Choose the class for new annotations. Must be an active defect type.
    pub fn select_class(&mut self, class_id: u32) -> Result<(), SessionError> {
        let defect_type = self.selector.select(class_id)?;
        log::debug!("Selected class '{}' ({})", defect_type.name, class_id);
        Ok(())
    }

    /// Append an annotation with the selected class. Returns its index.
    ///
    /// Corners may be given in any order; coordinates must lie in `[0,1]`.
    pub fn add_annotation(&mut self, bbox: NormalizedBox) -> Result<usize, SessionError> {
        self.require_loaded("add annotation")?;
        let defect_type = self
            .selector
            .selected()
            .ok_or(SessionError::NoClassSelected)?;

        if !bbox.is_within_unit_square() {
            return Err(SessionError::InvalidBox(bbox.to_array()));
        }
        let bbox = bbox.normalized();
        if bbox.width() <= 0.0
            || bbox.height() <= 0.0
            || !bbox.meets_min_size(self.min_box_fraction)
        {
            return Err(SessionError::BoxTooSmall {
                width: bbox.width(),
                height: bbox.height(),
                min: self.min_box_fraction,
            });
        }

        let annotation = Annotation::new(bbox, defect_type.id, defect_type.name.clone());
        log::debug!(
            "Added '{}' box {:?}",
            annotation.class_name,
            annotation.bbox.to_array()
        );
        self.annotations.push(annotation);
        self.notify();
        Ok(self.annotations.len() - 1)
    }

    /// Remove the annotation at `index`. Out-of-range indices are a no-op.
    pub fn remove_annotation(&mut self, index: usize) -> Result<Option<Annotation>, SessionError> {
        self.require_loaded("remove annotation")?;
        if index >= self.annotations.len() {
            log::debug!(
                "Ignoring removal of annotation {} (have {})",
                index,
                self.annotations.len()
            );
            return Ok(None);
        }
        let removed = self.annotations.remove(index);
        self.notify();
        Ok(Some(removed))
    }

    /// Enter `Saving` and return the commits to send, one per annotation.
    ///
    /// Fails with [`SessionError::EmptyAnnotationSet`] whenever there is
    /// nothing to commit, including when no image is loaded.
    pub fn begin_save(&mut self) -> Result<SaveBatch, SessionError> {
        if self.state == SessionState::Saving {
            return Err(SessionError::invalid_transition(
                "save",
                "a save is in progress",
            ));
        }
        let image = match self.image.as_ref() {
            Some(image) if !self.annotations.is_empty() => image,
            _ => return Err(SessionError::EmptyAnnotationSet),
        };

        let commits = self
            .annotations
            .iter()
            .map(|a| {
                SampleCommit::from_annotation(
                    a,
                    &image.image_ref,
                    Some(image.image_id.as_str()),
                    self.mode,
                )
            })
            .collect();

        self.pending_save = Some(PendingSave {
            mode: self.mode,
            suggestion_id: self.suggestion_id(),
        });
        self.state = SessionState::Saving;
        self.notify();
        Ok(SaveBatch { commits })
    }

    /// Leave `Saving` with the outcome of [`SaveBatch::execute`].
    ///
    /// On success the session resets to `Empty`. On failure it returns to
    /// `ImageLoaded` with the annotations intact and the error is passed back.
    pub fn finish_save(
        &mut self,
        outcome: Result<usize, SessionError>,
    ) -> Result<SaveReport, SessionError> {
        if self.state != SessionState::Saving {
            return Err(SessionError::invalid_transition(
                "finish save",
                format!("session is {}", self.state.name()),
            ));
        }

        let pending = self.pending_save.take().unwrap_or(PendingSave {
            mode: self.mode,
            suggestion_id: self.suggestion_id(),
        });
        match outcome {
            Ok(committed) => {
                let report = SaveReport {
                    committed,
                    image_id: self.image_id().unwrap_or_default().to_string(),
                    mode: pending.mode,
                    suggestion_id: pending.suggestion_id,
                    registry_error: None,
                };
                log::info!(
                    "Saved {} annotation(s) for '{}'",
                    report.committed,
                    report.image_id
                );
                self.reset();
                Ok(report)
            }
            Err(err) => {
                log::warn!("Save failed, keeping annotations: {}", err);
                self.state = SessionState::ImageLoaded;
                self.notify();
                Err(err)
            }
        }
    }

    /// Commit every annotation, reset, and reload the registry.
    ///
    /// A registry reload failure does not fail the save; it is logged and
    /// reported in [`SaveReport::registry_error`].
    pub fn save(
        &mut self,
        store: &dyn SampleStore,
        registry: &dyn DefectTypeRegistry,
    ) -> Result<SaveReport, SessionError> {
        let batch = self.begin_save()?;
        let outcome = batch.execute(store);
        let mut report = self.finish_save(outcome)?;
        if let Err(err) = self.reload_classes(registry) {
            log::warn!("{}", err);
            report.registry_error = Some(err);
        }
        Ok(report)
    }

    /// Ask the registry to reload and refresh the class selector from it.
    pub fn reload_classes(&mut self, registry: &dyn DefectTypeRegistry) -> Result<(), SessionError> {
        registry
            .reload()
            .and_then(|()| self.selector.refresh(registry))
            .map_err(SessionError::RegistryReloadFailed)
    }

    /// Discard the current image and its annotations.
    ///
    /// For active-learning images the queue is told about the skip; a failing
    /// notification is logged and does not prevent the reset. Returns the
    /// number of discarded annotations.
    pub fn skip(&mut self, queue: &dyn ActiveLearningQueue) -> Result<usize, SessionError> {
        self.require_loaded("skip")?;

        if self.mode == LabelingMode::ActiveLearning {
            if let Some(suggestion_id) = self.suggestion_id() {
                if let Err(err) = queue.mark_skipped(suggestion_id) {
                    log::warn!("Failed to mark suggestion {} skipped: {}", suggestion_id, err);
                }
            }
        }

        let discarded = self.annotations.len();
        log::info!(
            "Skipped '{}', discarded {} annotation(s)",
            self.image_id().unwrap_or_default(),
            discarded
        );
        self.reset();
        Ok(discarded)
    }

    fn reset(&mut self) {
        self.image = None;
        self.pending_save = None;
        self.annotations.clear();
        self.state = SessionState::Empty;
        self.notify();
    }

    fn require_loaded(&self, operation: &'static str) -> Result<(), SessionError> {
        match self.state {
            SessionState::ImageLoaded => Ok(()),
            SessionState::Empty => Err(SessionError::invalid_transition(
                operation,
                "no image loaded",
            )),
            SessionState::Saving => Err(SessionError::invalid_transition(
                operation,
                "a save is in progress",
            )),
        }
    }
}
