//! Shared types used throughout the library.

mod slot;
mod transform;

pub use slot::FaceSlot;
pub use transform::{Flip, Rotation, TransformRule, TransformTable};

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Resolved slot assignment for one conversion run.
pub type FaceMapping = BTreeMap<FaceSlot, PathBuf>;

/// One input image before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceSource {
    /// Path of the image (or the entry name when read from an archive).
    pub file_path: PathBuf,
    /// Slot proposed by the caller or the pattern matcher.
    pub detected_slot: Option<FaceSlot>,
}

impl FaceSource {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            detected_slot: None,
        }
    }

    pub fn with_slot(mut self, slot: FaceSlot) -> Self {
        self.detected_slot = Some(slot);
        self
    }

    /// Lowercased file name used for pattern matching.
    pub fn file_name_lower(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    /// Check if the slot has been resolved.
    pub fn is_resolved(&self) -> bool {
        self.detected_slot.is_some()
    }
}
