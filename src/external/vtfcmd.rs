//! VTF decoding through VTFCmd.

use super::process::{run_with_timeout, CancelToken};
use super::TextureDecoder;
use crate::error::{Result, StitchError, REEXPORT_HINT};
use image::RgbaImage;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default limit for a single VTFCmd invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const DEPENDENCY_NAME: &str = "VTFCmd";

/// Decoder that shells out to `VTFCmd.exe`.
#[derive(Debug, Clone)]
pub struct VtfCmdDecoder {
    vtfcmd: Option<PathBuf>,
    timeout: Duration,
}

impl VtfCmdDecoder {
    /// Create a decoder for an explicit VTFCmd binary.
    pub fn new(vtfcmd: impl Into<PathBuf>) -> Self {
        Self {
            vtfcmd: Some(vtfcmd.into()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use the configured path, falling back to the shared tools directory.
    pub fn from_config(configured: Option<&Path>, timeout: Duration) -> Self {
        Self {
            vtfcmd: configured.map(Path::to_path_buf).or_else(Self::locate),
            timeout,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.vtfcmd.as_deref()
    }

    /// Look for VTFCmd in the shared tools directory under the system temp dir.
    pub fn locate() -> Option<PathBuf> {
        let candidate = shared_tools_dir().join("VTFCmd.exe");
        candidate.is_file().then_some(candidate)
    }
}

impl TextureDecoder for VtfCmdDecoder {
    fn name(&self) -> &str {
        DEPENDENCY_NAME
    }

    fn check_available(&self) -> Result<()> {
        let Some(vtfcmd) = self.vtfcmd.as_deref() else {
            return Err(unsupported("no VTFCmd location configured"));
        };
        if !vtfcmd.is_file() {
            return Err(unsupported(format!("{} not found", vtfcmd.display())));
        }
        let vtflib = vtfcmd.with_file_name("VTFLib.dll");
        if !vtflib.is_file() {
            return Err(unsupported(format!("VTFLib.dll not found at {}", vtflib.display())));
        }
        Ok(())
    }

    fn decode(&self, source: &Path, data: &[u8], cancel: &CancelToken) -> Result<RgbaImage> {
        self.check_available()?;
        let vtfcmd = self
            .vtfcmd
            .as_deref()
            .ok_or_else(|| unsupported("no VTFCmd location configured"))?;

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "face".to_string());

        let scratch = tempfile::Builder::new().prefix("skybox_vtf_").tempdir()?;
        let input = scratch.path().join(format!("{}.vtf", stem));
        let output_dir = scratch.path().join("out");
        std::fs::write(&input, data)?;
        std::fs::create_dir_all(&output_dir)?;

        // VTFCmd must run from its own directory so VTFLib.dll resolves.
        let args = [
            OsStr::new("-file"),
            input.as_os_str(),
            OsStr::new("-output"),
            output_dir.as_os_str(),
            OsStr::new("-exportformat"),
            OsStr::new("png"),
        ];
        let output = run_with_timeout(vtfcmd, &args, vtfcmd.parent(), self.timeout, cancel)?;

        let diagnostics = output.diagnostics().to_string();
        if !output.success() || is_unsupported_format(&diagnostics) {
            return Err(classify_failure(source, output.code, &diagnostics));
        }

        let png = output_dir.join(format!("{}.png", stem));
        if !png.is_file() {
            return Err(StitchError::FaceDecode {
                path: source.to_path_buf(),
                reason: format!("VTFCmd produced no PNG. {}", diagnostics),
                hint: Some(REEXPORT_HINT.to_string()),
            });
        }

        let image = image::open(&png).map_err(|e| StitchError::FaceDecode {
            path: source.to_path_buf(),
            reason: format!("VTFCmd output is unreadable: {}", e),
            hint: None,
        })?;
        Ok(image.to_rgba8())
    }
}

/// Outcome of a batch conversion.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Convert every `.vtf` directly inside `dir` to a sibling `.png`.
///
/// Failures are collected per file; only problems reading the directory or a
/// missing decoder abort the batch.
pub fn convert_vtf_directory(
    dir: &Path,
    decoder: &dyn TextureDecoder,
    cancel: &CancelToken,
) -> Result<BatchReport> {
    decoder.check_available()?;

    let mut vtf_files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_vtf = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("vtf"))
            .unwrap_or(false);
        if is_vtf && path.is_file() {
            vtf_files.push(path);
        }
    }
    vtf_files.sort();
    log::info!("Found {} VTF file(s) in {}", vtf_files.len(), dir.display());

    let mut report = BatchReport::default();
    for vtf in vtf_files {
        cancel.check()?;
        let png = vtf.with_extension("png");
        let result = std::fs::read(&vtf)
            .map_err(StitchError::from)
            .and_then(|data| decoder.decode(&vtf, &data, cancel))
            .and_then(|image| {
                image
                    .save_with_format(&png, image::ImageFormat::Png)
                    .map_err(|e| StitchError::write_failure(&png, e))
            });

        match result {
            Ok(()) => {
                log::info!("Converted {} -> {}", vtf.display(), png.display());
                report.converted.push(png);
            }
            Err(StitchError::Cancelled) => return Err(StitchError::Cancelled),
            Err(e) => {
                log::warn!("Failed to convert {}: {}", vtf.display(), e);
                report.failed.push((vtf, e.to_string()));
            }
        }
    }

    Ok(report)
}

/// Shared tools location used by the mapping tool suite.
pub fn shared_tools_dir() -> PathBuf {
    std::env::temp_dir().join(".CS2KZ-mapping-tools").join("vtf")
}

fn unsupported(detail: impl Into<String>) -> StitchError {
    StitchError::UnsupportedDependency {
        dependency: DEPENDENCY_NAME.to_string(),
        detail: detail.into(),
    }
}

fn is_unsupported_format(diagnostics: &str) -> bool {
    diagnostics.to_lowercase().contains("unknown image format")
}

fn classify_failure(source: &Path, code: Option<i32>, diagnostics: &str) -> StitchError {
    if is_unsupported_format(diagnostics) {
        StitchError::FaceDecode {
            path: source.to_path_buf(),
            reason: format!("unsupported VTF compression: {}", diagnostics),
            hint: Some(REEXPORT_HINT.to_string()),
        }
    } else {
        let code = code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string());
        StitchError::FaceDecode {
            path: source.to_path_buf(),
            reason: format!("VTFCmd exited with code {}: {}", code, diagnostics),
            hint: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct SolidDecoder;

    impl TextureDecoder for SolidDecoder {
        fn name(&self) -> &str {
            "solid"
        }

        fn check_available(&self) -> Result<()> {
            Ok(())
        }

        fn decode(&self, source: &Path, data: &[u8], _cancel: &CancelToken) -> Result<RgbaImage> {
            if data == b"bad" {
                return Err(classify_failure(source, Some(1), "Unknown image format 3"));
            }
            Ok(RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255])))
        }
    }

    #[test]
    fn test_unconfigured_decoder_is_unsupported() {
        let decoder = VtfCmdDecoder {
            vtfcmd: None,
            timeout: DEFAULT_TIMEOUT,
        };
        let err = decoder.check_available().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedDependency);
    }

    #[test]
    fn test_missing_binary_is_unsupported() {
        let decoder = VtfCmdDecoder::new("/nonexistent/VTFCmd.exe");
        let err = decoder
            .decode(Path::new("sky_up.vtf"), b"", &CancelToken::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedDependency);
    }

    #[test]
    fn test_unknown_format_gets_reexport_hint() {
        let err = classify_failure(
            Path::new("sky_up.vtf"),
            Some(1),
            "Error: Unknown image format 3",
        );
        assert_eq!(err.kind(), ErrorKind::FaceDecode);
        assert_eq!(err.hint().as_deref(), Some(REEXPORT_HINT));

        let generic = classify_failure(Path::new("sky_up.vtf"), Some(2), "file truncated");
        assert_eq!(generic.kind(), ErrorKind::FaceDecode);
        assert!(generic.hint().is_none());
    }

    #[test]
    fn test_batch_converts_and_collects_failures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.vtf"), b"ok").unwrap();
        std::fs::write(dir.path().join("bad.VTF"), b"bad").unwrap();
        std::fs::write(dir.path().join("ignored.png"), b"x").unwrap();

        let report = convert_vtf_directory(dir.path(), &SolidDecoder, &CancelToken::new()).unwrap();
        assert_eq!(report.converted, vec![dir.path().join("good.png")]);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].0.ends_with("bad.VTF"));

        let png = image::open(dir.path().join("good.png")).unwrap().to_rgba8();
        assert_eq!(png.get_pixel(0, 0).0, [1, 2, 3, 255]);
    }
}
