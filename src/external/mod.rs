//! External converters.
//!
//! Proprietary texture containers are decoded by shelling out to a converter
//! binary. The core pipeline only sees the [`TextureDecoder`] trait, so tests
//! and callers without the binary can plug in their own implementation.

pub mod process;
pub mod vtfcmd;

pub use process::{run_with_timeout, CancelToken, ProcessOutput};
pub use vtfcmd::{convert_vtf_directory, BatchReport, VtfCmdDecoder};

use crate::error::Result;
use image::RgbaImage;
use std::path::Path;

/// Capability to turn proprietary texture bytes into RGBA pixels.
pub trait TextureDecoder: Send + Sync {
    /// Human-readable name of the backing tool.
    fn name(&self) -> &str;

    /// Fail with `UnsupportedDependency` if the decoder cannot run at all.
    fn check_available(&self) -> Result<()>;

    /// Decode one texture. `source` is used for naming and diagnostics only.
    fn decode(&self, source: &Path, data: &[u8], cancel: &CancelToken) -> Result<RgbaImage>;
}
