//! Face image sources.
//!
//! Candidates come from explicit file paths, a directory, or a ZIP archive.
//! Archive entries are held in memory so every face decodes the same way
//! regardless of where it came from.

pub mod loader;
pub mod texture;

pub use loader::{collect_candidates, load_from_bytes, load_from_directory};
pub use texture::{decode_face, FaceFormat};

use crate::error::{Result, StitchError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File extensions accepted as face images.
pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "tga", "bmp", "exr", "vtf"];

/// Check if a path has a supported face image extension.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.as_str()))
        .unwrap_or(false)
}

/// A set of candidate face images.
#[derive(Debug, Clone)]
pub enum CandidateSet {
    /// Images on disk.
    Files(Vec<PathBuf>),
    /// Images read from a ZIP archive, keyed by entry name.
    Archive {
        archive: PathBuf,
        entries: BTreeMap<PathBuf, Vec<u8>>,
    },
}

impl CandidateSet {
    /// Candidate paths (entry names for archives), sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        match self {
            CandidateSet::Files(files) => {
                let mut files = files.clone();
                files.sort();
                files
            }
            CandidateSet::Archive { entries, .. } => entries.keys().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CandidateSet::Files(files) => files.len(),
            CandidateSet::Archive { entries, .. } => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the bytes of one candidate.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>> {
        match self {
            CandidateSet::Files(_) => Ok(std::fs::read(path)?),
            CandidateSet::Archive { archive, entries } => {
                entries.get(path).cloned().ok_or_else(|| {
                    StitchError::InvalidInput(format!(
                        "'{}' is not an entry of {}",
                        path.display(),
                        archive.display()
                    ))
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Path::new("sky_up.png")));
        assert!(is_supported(Path::new("sky_up.VTF")));
        assert!(is_supported(Path::new("dir/sky_up.jpeg")));
        assert!(is_supported(Path::new("sky_up.exr")));
        assert!(!is_supported(Path::new("sky_up.exr.txt")));
        assert!(!is_supported(Path::new("README")));
    }

    #[test]
    fn test_archive_read_missing_entry() {
        let set = CandidateSet::Archive {
            archive: PathBuf::from("faces.zip"),
            entries: BTreeMap::new(),
        };
        assert!(set.is_empty());
        assert!(set.read(Path::new("sky_up.png")).is_err());
    }
}
