//! # Skybox Stitcher
//!
//! Converts six Source-engine skybox faces into the single cross-layout
//! atlas used by Counter-Strike 2 skybox materials.
//!
//! ## Overview
//!
//! The pipeline has four stages:
//!
//! 1. [`identify`](identify::identify) resolves input files to face slots from
//!    their names (`sky_up.png`, `sky_bk.vtf`, ...).
//! 2. [`FaceTransformer`] decodes, squares, resizes and orients each face.
//! 3. [`compose`](atlas::compose) places the faces on a 4x3 grid.
//! 4. [`material::emit`] renders `.vmat` descriptors that reference the atlas.
//!
//! ## Quick Start
//!
//! ```ignore
//! use skybox_stitcher::{
//!     CancelToken, ConversionRequest, FaceInput, OutputTarget, SkyboxConverter,
//! };
//!
//! let converter = SkyboxConverter::default();
//! let request = ConversionRequest::new(
//!     FaceInput::Folder("faces/".into()),
//!     OutputTarget::File("out/skybox_cross.png".into()),
//! )
//! .with_materials(true, false);
//!
//! let report = converter.convert(&request, &CancelToken::new())?;
//! println!("{}x{}", report.width, report.height);
//! ```
//!
//! VTF faces need an external decoder; see [`VtfCmdDecoder`] or implement
//! [`TextureDecoder`].

pub mod error;
pub mod types;
pub mod identify;
pub mod source;
pub mod external;
pub mod transform;
pub mod atlas;
pub mod material;
pub mod config;
pub mod pipeline;
pub mod worker;

// Re-export main types for convenience
pub use error::{ErrorKind, Result, StitchError};
pub use types::{FaceMapping, FaceSlot, FaceSource, Flip, Rotation, TransformRule, TransformTable};
pub use identify::{derive_prefix, identify};
pub use source::CandidateSet;
pub use external::{CancelToken, TextureDecoder, VtfCmdDecoder};
pub use transform::{FaceTransformer, NormalizedFace};
pub use atlas::{compose, CrossAtlas, CrossCompositor};
pub use material::{MaterialDescriptor, MaterialKind};
pub use config::{Settings, SettingsSnapshot};
pub use pipeline::{
    ConversionReport, ConversionRequest, FaceInput, OutputTarget, OverwritePolicy, SkyboxConverter,
};
pub use worker::{ConversionWorker, WorkerEvent};

/// Stitch a directory or ZIP of faces into `output` with the default table.
pub fn stitch_folder<P: AsRef<std::path::Path>>(folder: P, output: P) -> Result<ConversionReport> {
    let request = ConversionRequest::new(
        FaceInput::Folder(folder.as_ref().to_path_buf()),
        OutputTarget::File(output.as_ref().to_path_buf()),
    );
    SkyboxConverter::default().convert(&request, &CancelToken::new())
}
