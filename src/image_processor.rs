use std::path::{Path, PathBuf};

use image::ImageReader;

use crate::errors::{RmbgError, Result};
use crate::traits::SegmentationModel;
use crate::writer::write_output;

/// Runs one image through decode, segmentation and write.
pub struct BackgroundRemover<M: SegmentationModel> {
    model: M,
}

impl<M: SegmentationModel> BackgroundRemover<M> {
    pub const fn new(model: M) -> Self {
        Self { model }
    }

    /// Removes the background of `input` and writes it to `output`.
    ///
    /// Returns the path actually written (see [`crate::writer::resolve_output`]).
    /// Nothing is written when any step fails.
    pub fn remove_background(&self, input: &Path, output: &Path) -> Result<PathBuf> {
        // Format comes from the file content; the extension is only a fallback.
        let image = ImageReader::open(input)
            .map_err(|e| RmbgError::file_system(input, "image open", e))?
            .with_guessed_format()
            .map_err(|e| RmbgError::file_system(input, "image format detection", e))?
            .decode()
            .map_err(|e| RmbgError::image(input.display().to_string(), "image load", e))?
            .into_rgb8();

        let mask = self.model.segment(&image)?;
        write_output(&image, &mask, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockSegmentationModel;
    use image::{GenericImageView, Rgb, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_output_matches_source_dimensions() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let input = temp_dir.path().join("wide.jpg");
        RgbImage::from_pixel(123, 45, Rgb([90, 120, 30])).save(&input)?;

        let remover = BackgroundRemover::new(MockSegmentationModel::new(32));
        let written = remover.remove_background(&input, &temp_dir.path().join("out/wide.png"))?;

        assert_eq!(image::open(written)?.dimensions(), (123, 45));
        Ok(())
    }

    #[test]
    fn test_same_input_gives_identical_output() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let input = temp_dir.path().join("a.png");
        RgbImage::from_fn(40, 20, |x, y| Rgb([x as u8 * 6, y as u8 * 12, 77])).save(&input)?;

        let remover = BackgroundRemover::new(MockSegmentationModel::new(16));
        let first = remover.remove_background(&input, &temp_dir.path().join("first.png"))?;
        let second = remover.remove_background(&input, &temp_dir.path().join("second.png"))?;

        assert_eq!(fs::read(first)?, fs::read(second)?);
        Ok(())
    }

    #[test]
    fn test_undecodable_input_writes_nothing() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let input = temp_dir.path().join("broken.jpg");
        fs::write(&input, b"not an image")?;
        let output = temp_dir.path().join("broken.png");

        let remover = BackgroundRemover::new(MockSegmentationModel::new(16));
        let result = remover.remove_background(&input, &output);

        assert!(matches!(result, Err(RmbgError::ImageProcessing { .. })));
        assert!(!output.exists());
        Ok(())
    }
}
