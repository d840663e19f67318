//! Face normalization.
//!
//! Turns decoded source faces into same-size square RGBA buffers oriented for
//! the target cross layout.

use crate::error::{Result, StitchError};
use crate::external::{CancelToken, TextureDecoder};
use crate::source::{decode_face, CandidateSet, FaceFormat};
use crate::types::{FaceMapping, FaceSlot, Flip, Rotation, TransformRule, TransformTable};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// A decoded, resized and oriented face.
#[derive(Debug, Clone)]
pub struct NormalizedFace {
    /// Target slot this face fills.
    pub slot: FaceSlot,
    /// Edge length shared by every face of the run.
    pub base_size: u32,
    /// Square RGBA pixels.
    pub image: RgbaImage,
}

impl NormalizedFace {
    /// Check the buffer against the run's edge length.
    pub fn matches_size(&self, edge: u32) -> bool {
        self.image.width() == edge && self.image.height() == edge
    }
}

/// Six normalized faces plus their shared edge.
#[derive(Debug, Clone)]
pub struct FaceSet {
    pub base_size: u32,
    pub faces: BTreeMap<FaceSlot, NormalizedFace>,
}

/// Applies the transform table to source faces.
#[derive(Clone)]
pub struct FaceTransformer {
    table: TransformTable,
    decoder: Option<Arc<dyn TextureDecoder>>,
    cancel: CancelToken,
}

impl FaceTransformer {
    pub fn new(table: TransformTable) -> Self {
        Self {
            table,
            decoder: None,
            cancel: CancelToken::new(),
        }
    }

    /// Decoder used for VTF faces.
    pub fn with_decoder(mut self, decoder: Arc<dyn TextureDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn table(&self) -> &TransformTable {
        &self.table
    }

    /// Produce the face for target `slot` from the file at `source_path`.
    ///
    /// `source_path` must be the file of the slot's configured source face
    /// ([`TransformTable::source_for`]). The first face of a run is called
    /// with `target_edge = None` and establishes the edge.
    pub fn transform(
        &self,
        slot: FaceSlot,
        source_path: &Path,
        target_edge: Option<u32>,
    ) -> Result<NormalizedFace> {
        FaceFormat::of(source_path).ensure_decodable(self.decoder.as_deref())?;
        let data = std::fs::read(source_path).map_err(|e| StitchError::FaceDecode {
            path: source_path.to_path_buf(),
            reason: e.to_string(),
            hint: None,
        })?;
        self.transform_bytes(slot, source_path, &data, target_edge)
    }

    /// Same as [`transform`](Self::transform) for bytes already in memory.
    pub fn transform_bytes(
        &self,
        slot: FaceSlot,
        source: &Path,
        data: &[u8],
        target_edge: Option<u32>,
    ) -> Result<NormalizedFace> {
        self.cancel.check()?;
        let decoded = decode_face(source, data, self.decoder.as_deref(), &self.cancel)?;
        self.transform_image(slot, decoded, target_edge)
            .map_err(|e| match e {
                StitchError::InvalidInput(reason) => StitchError::FaceDecode {
                    path: source.to_path_buf(),
                    reason,
                    hint: None,
                },
                other => other,
            })
    }

    /// Crop, resize and orient an already decoded image.
    pub fn transform_image(
        &self,
        slot: FaceSlot,
        image: RgbaImage,
        target_edge: Option<u32>,
    ) -> Result<NormalizedFace> {
        let square = crop_to_square(image)?;
        let edge = target_edge.unwrap_or(square.width());
        let sized = resize_to(square, edge);
        let oriented = apply_rule(&sized, &self.table.rule(slot));

        Ok(NormalizedFace {
            slot,
            base_size: edge,
            image: oriented,
        })
    }

    /// Normalize all six target slots from a resolved mapping.
    ///
    /// Slots are processed in [`FaceSlot::PROCESSING_ORDER`], so the source of
    /// the `up` target sets the edge for the run.
    pub fn transform_all(
        &self,
        mapping: &FaceMapping,
        candidates: &CandidateSet,
    ) -> Result<FaceSet> {
        // Fail before touching any file if a needed decoder is missing.
        for slot in FaceSlot::PROCESSING_ORDER {
            let path = source_path(mapping, &self.table, slot)?;
            FaceFormat::of(path).ensure_decodable(self.decoder.as_deref())?;
        }

        let mut faces = BTreeMap::new();
        let mut base_size = None;

        for slot in FaceSlot::PROCESSING_ORDER {
            let source = self.table.source_for(slot);
            let path = source_path(mapping, &self.table, slot)?;
            let data = candidates.read(path).map_err(|e| StitchError::FaceDecode {
                path: path.to_path_buf(),
                reason: e.to_string(),
                hint: None,
            })?;

            let face = self.transform_bytes(slot, path, &data, base_size)?;
            base_size.get_or_insert(face.base_size);
            log::info!(
                "  {}: source='{}' ({}), rotation={}°",
                slot,
                source,
                path.display(),
                self.table.rule(slot).rotation.degrees()
            );
            faces.insert(slot, face);
        }

        let base_size = base_size.ok_or_else(|| StitchError::IncompleteFaceSet {
            matched: 0,
            missing: FaceSlot::PROCESSING_ORDER.to_vec(),
            unmatched: Vec::new(),
        })?;

        Ok(FaceSet { base_size, faces })
    }
}

impl Default for FaceTransformer {
    fn default() -> Self {
        Self::new(TransformTable::default())
    }
}

/// Centre-crop to a square of the short edge.
pub fn crop_to_square(image: RgbaImage) -> Result<RgbaImage> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(StitchError::InvalidInput(format!(
            "face has no pixels ({}x{})",
            width, height
        )));
    }
    if width == height {
        return Ok(image);
    }

    let edge = width.min(height);
    let x = (width - edge) / 2;
    let y = (height - edge) / 2;
    log::warn!(
        "Face is {}x{}, cropping centre {}x{} square",
        width,
        height,
        edge,
        edge
    );
    Ok(imageops::crop_imm(&image, x, y, edge, edge).to_image())
}

/// Resize a square image to `edge` with Lanczos resampling.
pub fn resize_to(image: RgbaImage, edge: u32) -> RgbaImage {
    if image.width() == edge && image.height() == edge {
        image
    } else {
        imageops::resize(&image, edge, edge, FilterType::Lanczos3)
    }
}

/// Rotate counter-clockwise, then flip. Square inputs keep their size.
pub fn apply_rule(image: &RgbaImage, rule: &TransformRule) -> RgbaImage {
    let rotated = match rule.rotation {
        Rotation::None => image.clone(),
        Rotation::Ccw90 => imageops::rotate270(image),
        Rotation::Ccw180 => imageops::rotate180(image),
        Rotation::Ccw270 => imageops::rotate90(image),
    };
    match rule.flip {
        Flip::None => rotated,
        Flip::Horizontal => imageops::flip_horizontal(&rotated),
        Flip::Vertical => imageops::flip_vertical(&rotated),
    }
}

fn source_path<'m>(
    mapping: &'m FaceMapping,
    table: &TransformTable,
    target: FaceSlot,
) -> Result<&'m Path> {
    let source = table.source_for(target);
    mapping
        .get(&source)
        .map(|p| p.as_path())
        .ok_or_else(|| StitchError::IncompleteFaceSet {
            matched: mapping.len(),
            missing: FaceSlot::PROCESSING_ORDER
                .into_iter()
                .filter(|s| !mapping.contains_key(s))
                .collect(),
            unmatched: Vec::new(),
        })
}
