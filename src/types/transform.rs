//! Per-slot orientation rules between source and target face conventions.

use super::FaceSlot;
use serde::{Deserialize, Serialize};

/// Counter-clockwise rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    #[serde(rename = "0")]
    None,
    #[serde(rename = "90")]
    Ccw90,
    #[serde(rename = "180")]
    Ccw180,
    #[serde(rename = "270")]
    Ccw270,
}

impl Rotation {
    /// Build from degrees (0, 90, 180, 270; negative and >360 values wrap).
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        match ((degrees / 90) % 4 + 4) % 4 {
            0 => Some(Rotation::None),
            1 => Some(Rotation::Ccw90),
            2 => Some(Rotation::Ccw180),
            _ => Some(Rotation::Ccw270),
        }
    }

    /// Rotation angle in degrees.
    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Ccw90 => 90,
            Rotation::Ccw180 => 180,
            Rotation::Ccw270 => 270,
        }
    }
}

/// Mirror applied after rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flip {
    #[default]
    None,
    Horizontal,
    Vertical,
}

/// How one target slot is produced from a source face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRule {
    /// Source face whose pixels fill the target slot.
    pub source_slot: FaceSlot,
    #[serde(default)]
    pub rotation: Rotation,
    #[serde(default)]
    pub flip: Flip,
}

impl TransformRule {
    pub const fn new(source_slot: FaceSlot, rotation: Rotation, flip: Flip) -> Self {
        Self {
            source_slot,
            rotation,
            flip,
        }
    }

    /// Use the source face as-is.
    pub const fn copy(source_slot: FaceSlot) -> Self {
        Self::new(source_slot, Rotation::None, Flip::None)
    }

    /// Check if this rule leaves pixels untouched.
    pub fn is_identity(&self) -> bool {
        self.rotation == Rotation::None && self.flip == Flip::None
    }
}

/// Rules for all six target slots.
///
/// Indexed by target slot. Sources are not required to be distinct: a table
/// may feed one source face into several targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformTable {
    rules: [TransformRule; 6],
}

impl TransformTable {
    /// Source-engine faces to the CS2 cross layout.
    ///
    /// The horizontal faces are remapped (left from back, front from right,
    /// right from front, back from left). This matches the converter that
    /// shipped with the mapping tools and is kept as-is pending confirmation.
    pub const SOURCE_TO_CS2: TransformTable = TransformTable {
        rules: [
            TransformRule::copy(FaceSlot::Up),
            TransformRule::copy(FaceSlot::Down),
            TransformRule::copy(FaceSlot::Back),
            TransformRule::copy(FaceSlot::Front),
            TransformRule::copy(FaceSlot::Right),
            TransformRule::copy(FaceSlot::Left),
        ],
    };

    /// Each target taken from the same-named source with no transform.
    pub fn identity() -> Self {
        Self {
            rules: FaceSlot::ALL.map(TransformRule::copy),
        }
    }

    /// Get the rule for a target slot.
    pub fn rule(&self, target: FaceSlot) -> TransformRule {
        self.rules[index(target)]
    }

    /// Replace the rule for a target slot.
    pub fn with_rule(mut self, target: FaceSlot, rule: TransformRule) -> Self {
        self.rules[index(target)] = rule;
        self
    }

    /// Source face feeding a target slot.
    pub fn source_for(&self, target: FaceSlot) -> FaceSlot {
        self.rule(target).source_slot
    }
}

impl Default for TransformTable {
    fn default() -> Self {
        Self::SOURCE_TO_CS2
    }
}

fn index(slot: FaceSlot) -> usize {
    match slot {
        FaceSlot::Up => 0,
        FaceSlot::Down => 1,
        FaceSlot::Left => 2,
        FaceSlot::Right => 3,
        FaceSlot::Front => 4,
        FaceSlot::Back => 5,
    }
}
