//! Candidate collection from directories and ZIP files.

use super::{is_supported, CandidateSet};
use crate::error::{Result, StitchError};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Collect candidate faces from a path.
///
/// Supports both directories and ZIP files.
pub fn collect_candidates<P: AsRef<Path>>(path: P) -> Result<CandidateSet> {
    let path = path.as_ref();

    if path.is_dir() {
        load_from_directory(path)
    } else if is_zip(path) {
        let data = std::fs::read(path)?;
        load_from_bytes(path, &data)
    } else {
        Err(StitchError::InvalidInput(format!(
            "'{}' is neither a directory nor a .zip archive",
            path.display()
        )))
    }
}

/// Load the face images of a ZIP archive into memory.
pub fn load_from_bytes(archive_path: &Path, data: &[u8]) -> Result<CandidateSet> {
    let cursor = std::io::Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor)?;
    let mut entries = BTreeMap::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;

        if file.is_dir() {
            continue;
        }

        let entry_name = PathBuf::from(file.name());
        if !is_supported(&entry_name) {
            log::debug!("Skipping archive entry {}", entry_name.display());
            continue;
        }

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        entries.insert(entry_name, bytes);
    }

    log::info!(
        "Found {} face candidates in {}",
        entries.len(),
        archive_path.display()
    );

    Ok(CandidateSet::Archive {
        archive: archive_path.to_path_buf(),
        entries,
    })
}

/// List the face images directly inside a directory.
pub fn load_from_directory(path: &Path) -> Result<CandidateSet> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let entry_path = entry.path();

        if entry.file_type()?.is_file() && is_supported(&entry_path) {
            files.push(entry_path);
        }
    }

    files.sort();
    log::info!("Found {} face candidates in {}", files.len(), path.display());

    Ok(CandidateSet::Files(files))
}

fn is_zip(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}
