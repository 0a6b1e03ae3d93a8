use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat, Rgb, RgbImage};

use crate::errors::{RmbgError, Result};
use crate::imageops_ai::{AlphaMaskApplicable, Flatten};

const MATTE: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// White matte, no alpha channel.
    Jpeg,
    /// Alpha preserved.
    Png,
}

impl OutputFormat {
    pub const fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }
}

/// Final path and encoding for a requested output path.
///
/// `.jpg` / `.jpeg` (any case) is honoured as-is. Everything else, `.webp` included,
/// is written as PNG with its extension replaced by `.png`.
pub fn resolve_output(requested: &Path) -> (PathBuf, OutputFormat) {
    let name = requested
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if name.ends_with(".jpg") || name.ends_with(".jpeg") {
        (requested.to_path_buf(), OutputFormat::Jpeg)
    } else {
        (requested.with_extension("png"), OutputFormat::Png)
    }
}

/// Applies `mask` to `image` and writes the result, creating parent directories.
///
/// Returns the path actually written, which differs from `requested` whenever the
/// extension is forced to `.png`.
pub fn write_output(image: &RgbImage, mask: &GrayImage, requested: &Path) -> Result<PathBuf> {
    let (output_path, format) = resolve_output(requested);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| RmbgError::file_system(parent, "output directory creation", e))?;
    }

    let rgba = image.apply_alpha_mask(mask)?;
    let saved = match format {
        OutputFormat::Jpeg => rgba
            .flatten_onto(MATTE)
            .save_with_format(&output_path, format.image_format()),
        OutputFormat::Png => {
            tracing::debug!("Saving to: {}", output_path.display());
            rgba.save_with_format(&output_path, format.image_format())
        }
    };
    saved.map_err(|e| RmbgError::image(output_path.display().to_string(), "image save", e))?;

    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, Luma};
    use tempfile::TempDir;

    #[test]
    fn test_resolve_output_rules() {
        let cases = [
            ("out/a.jpg", "out/a.jpg", OutputFormat::Jpeg),
            ("out/a.JPEG", "out/a.JPEG", OutputFormat::Jpeg),
            ("out/a.png", "out/a.png", OutputFormat::Png),
            ("out/a.webp", "out/a.png", OutputFormat::Png),
            ("out/a.bmp", "out/a.png", OutputFormat::Png),
            ("out/a", "out/a.png", OutputFormat::Png),
            ("out.webp/a.tiff", "out.webp/a.png", OutputFormat::Png),
        ];

        for (requested, expected, format) in cases {
            let resolved = resolve_output(Path::new(requested));
            assert_eq!(resolved, (PathBuf::from(expected), format), "{requested}");
        }
    }

    fn sample() -> (RgbImage, GrayImage) {
        let image = RgbImage::from_pixel(32, 16, Rgb([200, 10, 10]));
        let mask = GrayImage::from_fn(32, 16, |x, _| Luma([if x < 16 { 0 } else { 255 }]));
        (image, mask)
    }

    #[test]
    fn test_png_keeps_alpha() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let (image, mask) = sample();

        let written = write_output(&image, &mask, &temp_dir.path().join("nested/x.webp"))?;
        assert_eq!(written, temp_dir.path().join("nested/x.png"));
        assert!(!temp_dir.path().join("nested/x.webp").exists());

        let decoded = image::open(&written)?;
        assert_eq!(decoded.color(), ColorType::Rgba8);
        let rgba = decoded.to_rgba8();
        assert_eq!(rgba.dimensions(), (32, 16));
        assert_eq!(rgba.get_pixel(0, 0)[3], 0);
        assert_eq!(rgba.get_pixel(31, 15), &image::Rgba([200, 10, 10, 255]));
        Ok(())
    }

    #[test]
    fn test_jpeg_is_white_matted() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let (image, mask) = sample();
        let requested = temp_dir.path().join("x.jpg");

        let written = write_output(&image, &mask, &requested)?;
        assert_eq!(written, requested);

        let decoded = image::open(&written)?;
        assert_eq!(decoded.color(), ColorType::Rgb8);
        let rgb = decoded.to_rgb8();
        assert_eq!(rgb.dimensions(), (32, 16));
        let background = rgb.get_pixel(3, 3).0;
        assert!(background.iter().all(|&c| c > 245), "{background:?}");
        let foreground = rgb.get_pixel(27, 12).0;
        assert!(foreground[0] > 150 && foreground[1] < 60, "{foreground:?}");
        Ok(())
    }
}
