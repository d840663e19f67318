//! Face slot identities for cubemap handling.

use serde::{Deserialize, Serialize};

/// The six faces of a skybox cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceSlot {
    Up,
    Down,
    Left,
    Right,
    Front,
    Back,
}

impl FaceSlot {
    /// All six slots in enumeration order.
    pub const ALL: [FaceSlot; 6] = [
        FaceSlot::Up,
        FaceSlot::Down,
        FaceSlot::Left,
        FaceSlot::Right,
        FaceSlot::Front,
        FaceSlot::Back,
    ];

    /// Order in which slots are matched against filenames and processed.
    ///
    /// Matching order matters: `sky_left.png` contains `ft.`, so `Left` must be
    /// tried before `Front`.
    pub const PROCESSING_ORDER: [FaceSlot; 6] = [
        FaceSlot::Up,
        FaceSlot::Left,
        FaceSlot::Front,
        FaceSlot::Right,
        FaceSlot::Back,
        FaceSlot::Down,
    ];

    /// Lowercase slot name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FaceSlot::Up => "up",
            FaceSlot::Down => "down",
            FaceSlot::Left => "left",
            FaceSlot::Right => "right",
            FaceSlot::Front => "front",
            FaceSlot::Back => "back",
        }
    }

    /// Get the opposite face.
    pub fn opposite(&self) -> FaceSlot {
        match self {
            FaceSlot::Up => FaceSlot::Down,
            FaceSlot::Down => FaceSlot::Up,
            FaceSlot::Left => FaceSlot::Right,
            FaceSlot::Right => FaceSlot::Left,
            FaceSlot::Front => FaceSlot::Back,
            FaceSlot::Back => FaceSlot::Front,
        }
    }

    /// Parse from a slot name or its two-letter abbreviation (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "up" | "top" => Some(FaceSlot::Up),
            "down" | "dn" => Some(FaceSlot::Down),
            "left" | "lf" => Some(FaceSlot::Left),
            "right" | "rt" => Some(FaceSlot::Right),
            "front" | "ft" => Some(FaceSlot::Front),
            "back" | "bk" => Some(FaceSlot::Back),
            _ => None,
        }
    }
}

impl std::fmt::Display for FaceSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_order_covers_all_slots() {
        let mut sorted = FaceSlot::PROCESSING_ORDER.to_vec();
        sorted.sort();
        let mut all = FaceSlot::ALL.to_vec();
        all.sort();
        assert_eq!(sorted, all);
    }

    #[test]
    fn test_from_str_accepts_aliases() {
        assert_eq!(FaceSlot::from_str("UP"), Some(FaceSlot::Up));
        assert_eq!(FaceSlot::from_str("dn"), Some(FaceSlot::Down));
        assert_eq!(FaceSlot::from_str("bk"), Some(FaceSlot::Back));
        assert_eq!(FaceSlot::from_str("sideways"), None);
    }

    #[test]
    fn test_opposite_is_involution() {
        for slot in FaceSlot::ALL {
            assert_eq!(slot.opposite().opposite(), slot);
            assert_ne!(slot.opposite(), slot);
        }
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&FaceSlot::Front).unwrap();
        assert_eq!(json, "\"front\"");
        let slot: FaceSlot = serde_json::from_str("\"back\"").unwrap();
        assert_eq!(slot, FaceSlot::Back);
    }
}
