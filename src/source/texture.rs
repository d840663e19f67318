//! Face image decoding.

use crate::error::{Result, StitchError};
use crate::external::{CancelToken, TextureDecoder};
use image::RgbaImage;
use std::path::Path;

/// How a face file is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceFormat {
    /// Common bitmap decoded in-process.
    Bitmap,
    /// Valve texture container, decoded by an external tool.
    Vtf,
}

impl FaceFormat {
    /// Determine the format from a file extension.
    pub fn of(path: &Path) -> FaceFormat {
        let is_vtf = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("vtf"))
            .unwrap_or(false);
        if is_vtf {
            FaceFormat::Vtf
        } else {
            FaceFormat::Bitmap
        }
    }

    /// Make sure this format can be decoded before any bytes are read.
    pub fn ensure_decodable(&self, decoder: Option<&dyn TextureDecoder>) -> Result<()> {
        match (self, decoder) {
            (FaceFormat::Bitmap, _) => Ok(()),
            (FaceFormat::Vtf, Some(decoder)) => decoder.check_available(),
            (FaceFormat::Vtf, None) => Err(StitchError::UnsupportedDependency {
                dependency: "VTF decoder".to_string(),
                detail: "VTF faces were selected but no decoder is configured".to_string(),
            }),
        }
    }
}

/// Decode face bytes to RGBA.
///
/// Opaque sources gain a full alpha channel.
pub fn decode_face(
    source: &Path,
    data: &[u8],
    decoder: Option<&dyn TextureDecoder>,
    cancel: &CancelToken,
) -> Result<RgbaImage> {
    let format = FaceFormat::of(source);
    format.ensure_decodable(decoder)?;

    match (format, decoder) {
        (FaceFormat::Vtf, Some(decoder)) => {
            log::info!("Converting VTF file: {}", source.display());
            decoder.decode(source, data, cancel)
        }
        _ => {
            // TGA has no magic bytes, so trust the extension when there is one.
            let decoded = match image::ImageFormat::from_path(source) {
                Ok(format) => image::load_from_memory_with_format(data, format),
                Err(_) => image::load_from_memory(data),
            };
            let img = decoded.map_err(|e| StitchError::FaceDecode {
                path: source.to_path_buf(),
                reason: e.to_string(),
                hint: None,
            })?;
            Ok(img.to_rgba8())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    #[test]
    fn test_format_detection() {
        assert_eq!(FaceFormat::of(Path::new("sky_up.vtf")), FaceFormat::Vtf);
        assert_eq!(FaceFormat::of(Path::new("SKY_UP.VTF")), FaceFormat::Vtf);
        assert_eq!(FaceFormat::of(Path::new("sky_up.png")), FaceFormat::Bitmap);
    }

    #[test]
    fn test_opaque_source_gets_alpha() {
        let rgb = RgbImage::from_pixel(3, 3, Rgb([10, 20, 30]));
        let mut bytes = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let rgba = decode_face(Path::new("sky_up.png"), &bytes, None, &CancelToken::new()).unwrap();
        assert_eq!(rgba.dimensions(), (3, 3));
        assert_eq!(rgba.get_pixel(1, 1).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_tga_is_decoded_by_extension() {
        let rgb = RgbImage::from_pixel(2, 2, Rgb([200, 100, 50]));
        let mut bytes = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Tga)
            .unwrap();

        let rgba = decode_face(Path::new("sky_ft.tga"), &bytes, None, &CancelToken::new()).unwrap();
        assert_eq!(rgba.get_pixel(0, 0).0, [200, 100, 50, 255]);
    }

    #[test]
    fn test_exr_face_is_quantized_to_rgba8() {
        let hdr = image::Rgba32FImage::from_pixel(2, 2, image::Rgba([1.0, 0.0, 0.0, 1.0]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba32F(hdr)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::OpenExr)
            .unwrap();

        let rgba = decode_face(Path::new("sky_bk.exr"), &bytes, None, &CancelToken::new()).unwrap();
        assert_eq!(rgba.dimensions(), (2, 2));
        assert_eq!(rgba.get_pixel(1, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_corrupt_bitmap_is_decode_error() {
        let err = decode_face(
            Path::new("sky_up.png"),
            b"not an image",
            None,
            &CancelToken::new(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FaceDecode);
    }

    #[test]
    fn test_vtf_without_decoder_is_unsupported() {
        let err = decode_face(Path::new("sky_up.vtf"), b"", None, &CancelToken::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedDependency);
    }
}
