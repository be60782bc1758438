//! Image acquisition: manual upload and the active-learning suggestion feed.
//!
//! Both providers yield an [`AcquiredImage`] that the session accepts as-is.
//! The session never looks inside an [`ImageRef`].

use std::cell::RefCell;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collab::ActiveLearningQueue;
use crate::error::StoreError;

/// Supported image file extensions for manual upload.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "webp"];

/// Check if a filename (string) has a supported image extension.
/// Works with both full paths and just filenames.
pub fn is_image_filename(name: &str) -> bool {
    let lower = name.to_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{}", ext)))
}

/// Opaque reference to an image: a `data:` URL for uploads, or whatever
/// locator the suggestion feed hands out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this reference carries inline image data.
    pub fn is_data_url(&self) -> bool {
        self.0.starts_with("data:")
    }
}

/// An image ready to be loaded into a labeling session.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquiredImage {
    pub image_ref: ImageRef,
    pub image_id: String,
    /// Present only for images taken from the suggestion feed.
    pub suggestion_id: Option<u64>,
    /// Pixel dimensions, when the provider knows them.
    pub dimensions: Option<(u32, u32)>,
}

/// Errors that can occur while acquiring an image.
#[derive(Error, Debug)]
pub enum SourceError {
    /// I/O error reading the file
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file name does not carry a supported image extension
    #[error("Unsupported image file: {0}")]
    UnsupportedFile(String),

    /// The bytes do not match any known image format
    #[error("Unrecognized image format: {0}")]
    UnknownFormat(String),

    /// The image header could not be decoded
    #[error("Invalid image data: {0}")]
    Decode(#[from] image::ImageError),

    /// No suggestion is pending in the feed
    #[error("No pending suggestions")]
    QueueEmpty,
}

// ============================================================================
// Manual Upload
// ============================================================================

/// Turns a local file into an inline `data:` URL image.
pub struct ManualUpload;

impl ManualUpload {
    /// Read and encode an image file. The file name becomes the image id.
    pub fn from_path(path: &Path) -> Result<AcquiredImage, SourceError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        if !is_image_filename(&name) {
            return Err(SourceError::UnsupportedFile(path.display().to_string()));
        }
        let bytes = std::fs::read(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&name, &bytes)
    }

    /// Encode in-memory image bytes, e.g. from a browser file picker.
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<AcquiredImage, SourceError> {
        if !is_image_filename(name) {
            return Err(SourceError::UnsupportedFile(name.to_string()));
        }

        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| SourceError::Decode(image::ImageError::IoError(e)))?;
        let format = reader
            .format()
            .ok_or_else(|| SourceError::UnknownFormat(name.to_string()))?;
        let dimensions = reader.into_dimensions()?;

        let data_url = format!(
            "data:{};base64,{}",
            format.to_mime_type(),
            STANDARD.encode(bytes)
        );
        log::debug!(
            "Encoded upload '{}' ({}x{}, {} bytes)",
            name,
            dimensions.0,
            dimensions.1,
            bytes.len()
        );

        Ok(AcquiredImage {
            image_ref: ImageRef::new(data_url),
            image_id: name.to_string(),
            suggestion_id: None,
            dimensions: Some(dimensions),
        })
    }
}

// ============================================================================
// Suggestion Feed
// ============================================================================

/// An image proposed for labeling by the external ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: u64,
    pub image_ref: ImageRef,
    pub image_id: String,
    /// Ranking score, higher is more informative
    pub score: f32,
}

/// Ranked list of pending suggestions.
///
/// Also serves as an in-process [`ActiveLearningQueue`]: marking a suggestion
/// skipped removes it from the pending list.
#[derive(Debug, Default)]
pub struct SuggestionFeed {
    pending: RefCell<Vec<Suggestion>>,
    skipped: RefCell<Vec<u64>>,
}

impl SuggestionFeed {
    pub fn new(suggestions: Vec<Suggestion>) -> Self {
        let feed = Self::default();
        feed.replace(suggestions);
        feed
    }

    /// Replace the pending list with a freshly ranked one.
    pub fn replace(&self, mut suggestions: Vec<Suggestion>) {
        suggestions.sort_by(|a, b| b.score.total_cmp(&a.score));
        *self.pending.borrow_mut() = suggestions;
    }

    /// Number of suggestions still pending.
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Best-ranked pending suggestion, without removing it.
    pub fn peek(&self) -> Option<Suggestion> {
        self.pending.borrow().first().cloned()
    }

    /// Take the best-ranked pending suggestion as an acquirable image.
    pub fn take_next(&self) -> Result<AcquiredImage, SourceError> {
        let mut pending = self.pending.borrow_mut();
        if pending.is_empty() {
            return Err(SourceError::QueueEmpty);
        }
        let suggestion = pending.remove(0);
        Ok(AcquiredImage {
            image_ref: suggestion.image_ref,
            image_id: suggestion.image_id,
            suggestion_id: Some(suggestion.id),
            dimensions: None,
        })
    }

    /// Ids marked skipped so far, in order.
    pub fn skipped(&self) -> Vec<u64> {
        self.skipped.borrow().clone()
    }
}

impl ActiveLearningQueue for SuggestionFeed {
    fn mark_skipped(&self, suggestion_id: u64) -> Result<(), StoreError> {
        self.pending.borrow_mut().retain(|s| s.id != suggestion_id);
        self.skipped.borrow_mut().push(suggestion_id);
        Ok(())
    }
}
