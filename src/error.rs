//! Error types for the skybox stitcher.

use crate::types::FaceSlot;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using StitchError.
pub type Result<T> = std::result::Result<T, StitchError>;

/// Hint attached to faces using a texture compression VTFCmd cannot read.
pub const REEXPORT_HINT: &str =
    "re-export the face to PNG or TGA with VTFEdit and select that file instead";

/// Machine-distinguishable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AmbiguousFace,
    IncompleteFaceSet,
    FaceDecode,
    UnsupportedDependency,
    CompositionSizeMismatch,
    WriteFailure,
    Io,
    Config,
    Archive,
    Busy,
    Cancelled,
    Timeout,
    InvalidInput,
    Internal,
}

/// Main error type for skybox conversion.
#[derive(Error, Debug)]
pub enum StitchError {
    /// Two or more candidate files matched the same slot.
    #[error("Multiple files detected for the '{slot}' face: {}", files.join(", "))]
    AmbiguousFace { slot: FaceSlot, files: Vec<String> },

    /// Fewer than six slots could be resolved.
    #[error(
        "Matched {matched}/6 faces. Missing: {}. Unmatched files: {}",
        join_slots(missing),
        join_or_none(unmatched)
    )]
    IncompleteFaceSet {
        matched: usize,
        missing: Vec<FaceSlot>,
        unmatched: Vec<String>,
    },

    /// A face image could not be decoded.
    #[error("Failed to decode face '{}': {reason}", path.display())]
    FaceDecode {
        path: PathBuf,
        reason: String,
        hint: Option<String>,
    },

    /// An optional external decoder is not installed.
    #[error("{dependency} is not available: {detail}")]
    UnsupportedDependency { dependency: String, detail: String },

    /// A normalized face does not match the run's edge length.
    #[error("Face '{slot}' is {width}x{height}, expected {expected}x{expected}")]
    CompositionSizeMismatch {
        slot: FaceSlot,
        width: u32,
        height: u32,
        expected: u32,
    },

    /// The atlas or a sidecar file could not be written.
    #[error("Failed to write '{}': {reason}", path.display())]
    WriteFailure { path: PathBuf, reason: String },

    /// The destination already exists and overwriting was not permitted.
    #[error("'{}' already exists; overwrite was not requested", .0.display())]
    DestinationExists(PathBuf),

    /// External process exceeded its time limit.
    #[error("{program} timed out after {}s", timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    /// Another conversion is already running on this worker.
    #[error("A conversion is already in progress")]
    Busy,

    /// The run was cancelled by the caller.
    #[error("Conversion cancelled")]
    Cancelled,

    /// Caller supplied input that cannot be processed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A conversion thread panicked.
    #[error("Conversion aborted unexpectedly: {0}")]
    Internal(String),

    /// Settings could not be loaded.
    #[error("Settings error: {0}")]
    Config(String),

    /// Failed to parse JSON data.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read a ZIP archive.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Failed to read or process an image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StitchError {
    /// The failure category for programmatic handling.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StitchError::AmbiguousFace { .. } => ErrorKind::AmbiguousFace,
            StitchError::IncompleteFaceSet { .. } => ErrorKind::IncompleteFaceSet,
            StitchError::FaceDecode { .. } | StitchError::Image(_) => ErrorKind::FaceDecode,
            StitchError::UnsupportedDependency { .. } => ErrorKind::UnsupportedDependency,
            StitchError::CompositionSizeMismatch { .. } => ErrorKind::CompositionSizeMismatch,
            StitchError::WriteFailure { .. } | StitchError::DestinationExists(_) => {
                ErrorKind::WriteFailure
            }
            StitchError::Timeout { .. } => ErrorKind::Timeout,
            StitchError::Busy => ErrorKind::Busy,
            StitchError::Cancelled => ErrorKind::Cancelled,
            StitchError::InvalidInput(_) => ErrorKind::InvalidInput,
            StitchError::Internal(_) => ErrorKind::Internal,
            StitchError::Config(_) | StitchError::Json(_) => ErrorKind::Config,
            StitchError::Zip(_) => ErrorKind::Archive,
            StitchError::Io(_) => ErrorKind::Io,
        }
    }

    /// Remediation text for failures the user can act on.
    pub fn hint(&self) -> Option<String> {
        match self {
            StitchError::FaceDecode { hint, .. } => hint.clone(),
            StitchError::AmbiguousFace { .. } => {
                Some("Ensure each face has only one image.".to_string())
            }
            StitchError::IncompleteFaceSet { .. } => Some(
                "Name files with face indicators, e.g. skybox_up.png, left.tga, mysky_ft.jpg"
                    .to_string(),
            ),
            StitchError::UnsupportedDependency { dependency, .. } => Some(format!(
                "Install {} or point the settings at its location",
                dependency
            )),
            StitchError::DestinationExists(_) => {
                Some("Pass --overwrite to replace the existing atlas".to_string())
            }
            _ => None,
        }
    }

    pub(crate) fn write_failure(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        StitchError::WriteFailure {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

fn join_slots(slots: &[FaceSlot]) -> String {
    slots
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "None".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_message_lists_missing_and_unmatched() {
        let err = StitchError::IncompleteFaceSet {
            matched: 5,
            missing: vec![FaceSlot::Up],
            unmatched: vec!["sky_topside.png".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Missing: up"));
        assert!(msg.contains("sky_topside.png"));
        assert_eq!(err.kind(), ErrorKind::IncompleteFaceSet);
    }

    #[test]
    fn test_decode_hint_is_surfaced() {
        let err = StitchError::FaceDecode {
            path: PathBuf::from("sky_up.vtf"),
            reason: "unknown image format 3".to_string(),
            hint: Some(REEXPORT_HINT.to_string()),
        };
        assert_eq!(err.kind(), ErrorKind::FaceDecode);
        assert_eq!(err.hint().as_deref(), Some(REEXPORT_HINT));
    }

    #[test]
    fn test_destination_exists_is_write_failure() {
        let err = StitchError::DestinationExists(PathBuf::from("out.png"));
        assert_eq!(err.kind(), ErrorKind::WriteFailure);
        assert!(err.hint().is_some());
    }
}
