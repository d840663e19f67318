//! 4x3 cross layout compositing.

use crate::error::{Result, StitchError};
use crate::transform::NormalizedFace;
use crate::types::FaceSlot;
use image::{imageops, ImageEncoder, RgbaImage};
use std::collections::BTreeMap;
use std::path::Path;

/// Atlas width in face cells.
pub const CROSS_COLUMNS: u32 = 4;
/// Atlas height in face cells.
pub const CROSS_ROWS: u32 = 3;

/// Grid cell of a slot in the cross, as (column, row).
pub fn cell_of(slot: FaceSlot) -> (u32, u32) {
    match slot {
        FaceSlot::Up => (1, 0),
        FaceSlot::Left => (0, 1),
        FaceSlot::Front => (1, 1),
        FaceSlot::Right => (2, 1),
        FaceSlot::Back => (3, 1),
        FaceSlot::Down => (1, 2),
    }
}

/// Cells of the grid left transparent.
pub const EMPTY_CELLS: [(u32, u32); 6] = [(0, 0), (2, 0), (3, 0), (0, 2), (2, 2), (3, 2)];

/// A placed face within the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossCell {
    pub column: u32,
    pub row: u32,
    /// Top-left pixel offset.
    pub x: u32,
    pub y: u32,
}

/// A composed cross atlas.
#[derive(Debug, Clone)]
pub struct CrossAtlas {
    /// Face edge length in pixels.
    pub base_size: u32,
    /// RGBA pixel buffer, `4 * base_size` by `3 * base_size`.
    pub image: RgbaImage,
    /// Where each face was placed.
    pub cells: BTreeMap<FaceSlot, CrossCell>,
}

impl CrossAtlas {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Get the cell for a face.
    pub fn get_cell(&self, slot: FaceSlot) -> Option<&CrossCell> {
        self.cells.get(&slot)
    }

    /// Export the atlas as PNG bytes.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let cursor = std::io::Cursor::new(&mut bytes);
        let encoder = image::codecs::png::PngEncoder::new(cursor);

        encoder
            .write_image(
                self.image.as_raw(),
                self.image.width(),
                self.image.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| StitchError::InvalidInput(format!("Failed to encode PNG: {}", e)))?;

        Ok(bytes)
    }

    /// Encode and write the atlas to `path`.
    pub fn write_png(&self, path: &Path) -> Result<()> {
        let bytes = self.to_png()?;
        std::fs::write(path, &bytes).map_err(|e| StitchError::write_failure(path, e))
    }
}

/// Places normalized faces on the cross grid.
#[derive(Debug, Default)]
pub struct CrossCompositor {
    faces: BTreeMap<FaceSlot, NormalizedFace>,
}

impl CrossCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a face; a second face for the same slot replaces the first.
    pub fn add_face(&mut self, face: NormalizedFace) {
        self.faces.insert(face.slot, face);
    }

    /// Compose the atlas.
    ///
    /// Requires all six slots, each exactly `base_size` square, where
    /// `base_size` is the edge of the first face in processing order.
    pub fn build(self) -> Result<CrossAtlas> {
        compose(&self.faces)
    }
}

/// Compose six faces into the cross layout.
pub fn compose(faces: &BTreeMap<FaceSlot, NormalizedFace>) -> Result<CrossAtlas> {
    let missing: Vec<FaceSlot> = FaceSlot::PROCESSING_ORDER
        .into_iter()
        .filter(|slot| !faces.contains_key(slot))
        .collect();
    if !missing.is_empty() {
        return Err(StitchError::IncompleteFaceSet {
            matched: faces.len(),
            missing,
            unmatched: Vec::new(),
        });
    }

    let base_size = FaceSlot::PROCESSING_ORDER
        .iter()
        .find_map(|slot| faces.get(slot))
        .map(|face| face.base_size)
        .unwrap_or(0);
    if base_size == 0 {
        return Err(StitchError::InvalidInput("face edge must be positive".to_string()));
    }

    for slot in FaceSlot::PROCESSING_ORDER {
        if let Some(face) = faces.get(&slot) {
            if face.slot != slot || face.base_size != base_size || !face.matches_size(base_size) {
                return Err(StitchError::CompositionSizeMismatch {
                    slot,
                    width: face.image.width(),
                    height: face.image.height(),
                    expected: base_size,
                });
            }
        }
    }

    let mut canvas = RgbaImage::new(base_size * CROSS_COLUMNS, base_size * CROSS_ROWS);
    let mut cells = BTreeMap::new();

    for slot in FaceSlot::PROCESSING_ORDER {
        let Some(face) = faces.get(&slot) else {
            continue;
        };
        let (column, row) = cell_of(slot);
        let x = column * base_size;
        let y = row * base_size;
        // replace copies pixels verbatim, alpha included
        imageops::replace(&mut canvas, &face.image, x as i64, y as i64);
        cells.insert(slot, CrossCell { column, row, x, y });
    }

    Ok(CrossAtlas {
        base_size,
        image: canvas,
        cells,
    })
}
