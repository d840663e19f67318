//! Face identification from filenames.
//!
//! Resolves six candidate images to their slots, either from a caller-supplied
//! assignment or by matching lowercased filenames against [`FACE_PATTERNS`].
//! No files are opened here.

mod patterns;

pub use patterns::{patterns_for, FACE_PATTERNS, FACE_SUFFIXES};

use crate::error::{Result, StitchError};
use crate::types::{FaceMapping, FaceSlot, FaceSource};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Match a single filename against the pattern table.
///
/// Slots are tried in [`FaceSlot::PROCESSING_ORDER`]; the first hit wins.
pub fn match_slot(file_name: &str) -> Option<FaceSlot> {
    let lower = file_name.to_lowercase();
    FaceSlot::PROCESSING_ORDER
        .into_iter()
        .find(|slot| patterns_for(*slot).iter().any(|p| lower.contains(p)))
}

/// Tag each candidate with the slot its filename matches.
pub fn detect(candidates: &[PathBuf]) -> Vec<FaceSource> {
    candidates
        .iter()
        .map(|path| {
            let source = FaceSource::new(path.clone());
            match match_slot(&source.file_name_lower()) {
                Some(slot) => source.with_slot(slot),
                None => source,
            }
        })
        .collect()
}

/// Resolve candidate paths to the six face slots.
///
/// An `explicit` assignment that covers every slot exactly once is returned
/// unchanged. Anything else falls back to filename matching, which fails with
/// [`StitchError::AmbiguousFace`] when two files claim one slot and with
/// [`StitchError::IncompleteFaceSet`] when a slot stays empty.
pub fn identify(
    candidates: &[PathBuf],
    explicit: Option<&HashMap<PathBuf, FaceSlot>>,
) -> Result<FaceMapping> {
    if let Some(mapping) = explicit {
        if let Some(resolved) = invert_bijective(mapping) {
            log::debug!("Using caller-supplied face assignment");
            return Ok(resolved);
        }
        log::debug!("Caller-supplied assignment is incomplete, matching filenames instead");
    }

    let mut claims: BTreeMap<FaceSlot, Vec<PathBuf>> = BTreeMap::new();
    let mut unmatched = Vec::new();

    for source in detect(candidates) {
        match source.detected_slot {
            Some(slot) => claims.entry(slot).or_default().push(source.file_path),
            None => unmatched.push(display_name(&source.file_path)),
        }
    }

    for slot in FaceSlot::PROCESSING_ORDER {
        if let Some(paths) = claims.get(&slot) {
            if paths.len() > 1 {
                let mut files: Vec<String> = paths.iter().map(|p| display_name(p)).collect();
                files.sort();
                return Err(StitchError::AmbiguousFace { slot, files });
            }
        }
    }

    unmatched.sort();
    let missing: Vec<FaceSlot> = FaceSlot::PROCESSING_ORDER
        .into_iter()
        .filter(|slot| !claims.contains_key(slot))
        .collect();
    if !missing.is_empty() {
        return Err(StitchError::IncompleteFaceSet {
            matched: claims.len(),
            missing,
            unmatched,
        });
    }

    if !unmatched.is_empty() {
        log::debug!("Ignoring files without a face indicator: {}", unmatched.join(", "));
    }

    Ok(claims
        .into_iter()
        .filter_map(|(slot, mut paths)| paths.pop().map(|p| (slot, p)))
        .collect())
}

/// Derive a skybox name prefix from a face filename.
///
/// `sky_up.png` becomes `sky`, `cloudsbk.tga` becomes `clouds`. Returns `None`
/// when nothing is left after stripping.
pub fn derive_prefix(file_name: &str) -> Option<String> {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut prefix = stem.as_str();
    let lower = stem.to_lowercase();
    for suffix in FACE_SUFFIXES {
        if lower.ends_with(suffix) {
            prefix = stem.get(..stem.len() - suffix.len()).unwrap_or(&stem);
            break;
        }
    }

    let prefix = prefix.trim_end_matches(['_', '-', ' ']);
    if prefix.is_empty() {
        None
    } else {
        Some(prefix.to_string())
    }
}

fn invert_bijective(mapping: &HashMap<PathBuf, FaceSlot>) -> Option<FaceMapping> {
    if mapping.len() != FaceSlot::ALL.len() {
        return None;
    }
    let slots: HashSet<FaceSlot> = mapping.values().copied().collect();
    if slots.len() != FaceSlot::ALL.len() {
        return None;
    }
    Some(
        mapping
            .iter()
            .map(|(path, slot)| (*slot, path.clone()))
            .collect(),
    )
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
