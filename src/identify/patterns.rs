//! Filename pattern table for face detection.

use crate::types::FaceSlot;

/// Substrings that identify each face in a lowercased filename.
///
/// Includes the common two-letter abbreviations and the positive/negative
/// axis names some cubemap exporters use (`pz` for up, `nx` for left, ...).
pub const FACE_PATTERNS: [(FaceSlot, &[&str]); 6] = [
    (
        FaceSlot::Up,
        &["_up.", "up.", "_up_", "up_", "_pz.", "pz.", "_pz_", "pz_"],
    ),
    (
        FaceSlot::Down,
        &[
            "_down.", "down.", "_down_", "down_", "_dn.", "dn.", "_dn_", "dn_", "_nz.", "nz.",
            "_nz_", "nz_",
        ],
    ),
    (
        FaceSlot::Left,
        &[
            "_left.", "left.", "_left_", "left_", "_lf.", "lf.", "_lf_", "lf_", "_nx.", "nx.",
            "_nx_", "nx_",
        ],
    ),
    (
        FaceSlot::Right,
        &[
            "_right.", "right.", "_right_", "right_", "_rt.", "rt.", "_rt_", "rt_", "_px.",
            "px.", "_px_", "px_",
        ],
    ),
    (
        FaceSlot::Front,
        &[
            "_front.", "front.", "_front_", "front_", "_ft.", "ft.", "_ft_", "ft_", "_ny.", "ny.",
            "_ny_", "ny_",
        ],
    ),
    (
        FaceSlot::Back,
        &[
            "_back.", "back.", "_back_", "back_", "_bk.", "bk.", "_bk_", "bk_", "_py.", "py.",
            "_py_", "py_",
        ],
    ),
];

/// Trailing face names stripped when deriving a skybox prefix.
pub const FACE_SUFFIXES: [&str; 12] = [
    "up", "dn", "lf", "rt", "ft", "bk", "top", "down", "left", "right", "front", "back",
];

/// Patterns for one slot.
pub fn patterns_for(slot: FaceSlot) -> &'static [&'static str] {
    FACE_PATTERNS
        .iter()
        .find(|(s, _)| *s == slot)
        .map(|(_, patterns)| *patterns)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_slot_has_patterns() {
        for slot in FaceSlot::ALL {
            assert!(!patterns_for(slot).is_empty(), "{slot} has no patterns");
        }
    }

    #[test]
    fn test_patterns_are_lowercase() {
        for (_, patterns) in FACE_PATTERNS {
            for p in patterns {
                assert_eq!(*p, p.to_lowercase());
            }
        }
    }
}
