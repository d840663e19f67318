//! End-to-end skybox conversion.
//!
//! identify -> transform -> compose -> write atlas -> write sidecars.
//! Any failure before the atlas is persisted leaves the destination untouched,
//! and sidecars are only written once the atlas is in place.

mod output;

pub use output::{
    addon_material_dir, find_cs2_root, list_addons, OutputTarget, OverwritePolicy, CS2_ROOT_NAME,
};

use crate::atlas::{compose, CrossAtlas};
use crate::config::Settings;
use crate::error::{Result, StitchError};
use crate::external::{CancelToken, TextureDecoder, VtfCmdDecoder};
use crate::identify::{derive_prefix, identify};
use crate::material::{self, DEFAULT_MATERIAL_FOLDER};
use crate::source::{collect_candidates, CandidateSet};
use crate::transform::FaceTransformer;
use crate::types::{FaceMapping, FaceSlot, TransformTable};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the six faces come from.
#[derive(Debug, Clone)]
pub enum FaceInput {
    /// Individual files, slots detected from their names.
    Files(Vec<PathBuf>),
    /// A directory or ZIP archive, slots detected from entry names.
    Folder(PathBuf),
    /// Files with a caller-chosen slot each.
    Assigned(HashMap<PathBuf, FaceSlot>),
}

/// Parameters of one conversion run.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub faces: FaceInput,
    pub output: OutputTarget,
    pub overwrite: OverwritePolicy,
    pub create_skybox_vmat: bool,
    pub create_moondome_vmat: bool,
    /// Engine-relative folder used in material references.
    pub material_folder: String,
}

impl ConversionRequest {
    pub fn new(faces: FaceInput, output: OutputTarget) -> Self {
        Self {
            faces,
            output,
            overwrite: OverwritePolicy::Refuse,
            create_skybox_vmat: false,
            create_moondome_vmat: false,
            material_folder: DEFAULT_MATERIAL_FOLDER.to_string(),
        }
    }

    pub fn with_overwrite(mut self, overwrite: OverwritePolicy) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_materials(mut self, skybox: bool, moondome: bool) -> Self {
        self.create_skybox_vmat = skybox;
        self.create_moondome_vmat = moondome;
        self
    }

    pub fn with_material_folder(mut self, folder: impl Into<String>) -> Self {
        self.material_folder = folder.into();
        self
    }

    /// Apply the material defaults from settings.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.create_skybox_vmat = settings.create_skybox_vmat;
        self.create_moondome_vmat = settings.create_moondome_vmat;
        self.material_folder = settings.material_folder.clone();
        self
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub atlas_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub base_size: u32,
    pub mapping: FaceMapping,
    pub sidecars: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Runs the full conversion.
#[derive(Clone)]
pub struct SkyboxConverter {
    table: TransformTable,
    decoder: Option<Arc<dyn TextureDecoder>>,
}

impl SkyboxConverter {
    pub fn new(table: TransformTable) -> Self {
        Self {
            table,
            decoder: None,
        }
    }

    /// Default table with a VTFCmd decoder configured from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let decoder =
            VtfCmdDecoder::from_config(settings.vtfcmd_path.as_deref(), settings.decode_timeout());
        Self::new(TransformTable::default()).with_decoder(Arc::new(decoder))
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn TextureDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn table(&self) -> &TransformTable {
        &self.table
    }

    /// Resolve the slot mapping without decoding anything.
    pub fn identify(&self, faces: &FaceInput) -> Result<(CandidateSet, FaceMapping)> {
        let (candidates, explicit) = gather(faces)?;
        let mapping = identify(&candidates.paths(), explicit.as_ref())?;
        Ok((candidates, mapping))
    }

    /// Build the atlas in memory.
    pub fn stitch(
        &self,
        candidates: &CandidateSet,
        mapping: &FaceMapping,
        cancel: &CancelToken,
    ) -> Result<CrossAtlas> {
        let mut transformer = FaceTransformer::new(self.table).with_cancel(cancel.clone());
        if let Some(decoder) = &self.decoder {
            transformer = transformer.with_decoder(Arc::clone(decoder));
        }

        log::info!("Stitching images with proper transformations...");
        let face_set = transformer.transform_all(mapping, candidates)?;
        compose(&face_set.faces)
    }

    /// Run the whole pipeline.
    pub fn convert(
        &self,
        request: &ConversionRequest,
        cancel: &CancelToken,
    ) -> Result<ConversionReport> {
        let (candidates, mapping) = self.identify(&request.faces)?;
        for (slot, path) in &mapping {
            log::info!("  {} <- {}", slot, path.display());
        }

        let stem = mapping
            .get(&FaceSlot::Up)
            .and_then(|p| p.file_name())
            .and_then(|n| derive_prefix(&n.to_string_lossy()))
            .unwrap_or_else(|| "skybox".to_string());
        let atlas_path = request.output.resolve(&stem)?;
        let atlas_name = atlas_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| StitchError::InvalidInput("output path has no file name".to_string()))?;

        let reference = material::material_reference(&request.material_folder, &atlas_name);
        let descriptors = material::descriptors(
            &reference,
            request.create_skybox_vmat,
            request.create_moondome_vmat,
        );
        let out_dir = atlas_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        if request.overwrite == OverwritePolicy::Refuse {
            let sidecar_paths = descriptors.iter().map(|d| out_dir.join(&d.file_name));
            for path in std::iter::once(atlas_path.clone()).chain(sidecar_paths) {
                if path.exists() {
                    return Err(StitchError::DestinationExists(path));
                }
            }
        }

        let atlas = self.stitch(&candidates, &mapping, cancel)?;
        let mut warnings = Vec::new();
        if !atlas.base_size.is_power_of_two() {
            let msg = format!(
                "Face edge {} is not a power of two; the engine may resample the skybox",
                atlas.base_size
            );
            log::warn!("{}", msg);
            warnings.push(msg);
        }

        cancel.check()?;
        write_atomic(&atlas_path, &atlas.to_png()?, request.overwrite)?;
        log::info!(
            "Skybox saved to {} ({}x{})",
            atlas_path.display(),
            atlas.width(),
            atlas.height()
        );

        let mut sidecars = Vec::new();
        for descriptor in descriptors {
            let path = out_dir.join(&descriptor.file_name);
            write_atomic(&path, descriptor.content.as_bytes(), request.overwrite)?;
            log::info!("Created {} material: {}", descriptor.shader_name(), path.display());
            sidecars.push(path);
        }

        Ok(ConversionReport {
            atlas_path,
            width: atlas.width(),
            height: atlas.height(),
            base_size: atlas.base_size,
            mapping,
            sidecars,
            warnings,
        })
    }
}

impl Default for SkyboxConverter {
    fn default() -> Self {
        Self::new(TransformTable::default())
    }
}

fn gather(faces: &FaceInput) -> Result<(CandidateSet, Option<HashMap<PathBuf, FaceSlot>>)> {
    match faces {
        FaceInput::Files(files) => Ok((CandidateSet::Files(files.clone()), None)),
        FaceInput::Folder(path) => Ok((collect_candidates(path)?, None)),
        FaceInput::Assigned(assigned) => Ok((
            CandidateSet::Files(assigned.keys().cloned().collect()),
            Some(assigned.clone()),
        )),
    }
}

/// Write through a temp file in the destination directory, then rename.
///
/// Under [`OverwritePolicy::Refuse`] the rename fails if the destination
/// appeared while the run was in progress.
fn write_atomic(path: &Path, bytes: &[u8], overwrite: OverwritePolicy) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| StitchError::write_failure(&dir, e))?;

    let mut tmp =
        tempfile::NamedTempFile::new_in(&dir).map_err(|e| StitchError::write_failure(path, e))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| StitchError::write_failure(path, e))?;

    let persisted = match overwrite {
        OverwritePolicy::Replace => tmp.persist(path).map(|_| ()),
        OverwritePolicy::Refuse => tmp.persist_noclobber(path).map(|_| ()),
    };
    persisted.map_err(|e| match e.error.kind() {
        std::io::ErrorKind::AlreadyExists => StitchError::DestinationExists(path.to_path_buf()),
        _ => StitchError::write_failure(path, e.error),
    })
}
