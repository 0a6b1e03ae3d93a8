use crate::errors::{RmbgError, Result};
use crate::traits::SegmentationModel;
use ndarray::prelude::*;

const FOREGROUND_LOGIT: f32 = 8.0;

/// Stand-in segmentation model for tests: marks the central half of the frame as
/// foreground, or fails every prediction.
#[derive(Debug, Clone)]
pub struct MockSegmentationModel {
    pub image_size: u32,
    pub fail: bool,
}

impl MockSegmentationModel {
    pub const fn new(image_size: u32) -> Self {
        Self {
            image_size,
            fail: false,
        }
    }

    pub const fn failing(image_size: u32) -> Self {
        Self {
            image_size,
            fail: true,
        }
    }
}

impl SegmentationModel for MockSegmentationModel {
    fn image_size(&self) -> u32 {
        self.image_size
    }

    fn predict(&self, tensor: ArrayView4<f32>) -> Result<Array4<f32>> {
        if self.fail {
            return Err(RmbgError::Model {
                operation: "mock inference".to_string(),
                source: "configured to fail".into(),
            });
        }

        let (batch, _, height, width) = tensor.dim();
        Ok(Array4::from_shape_fn((batch, 1, height, width), |(_, _, y, x)| {
            let inside = (height / 4..height - height / 4).contains(&y)
                && (width / 4..width - width / 4).contains(&x);
            if inside {
                FOREGROUND_LOGIT
            } else {
                -FOREGROUND_LOGIT
            }
        }))
    }
}

/// Mock matching the real model's working resolution.
pub const fn create_mock_model() -> MockSegmentationModel {
    MockSegmentationModel::new(crate::model::IMAGE_SIZE)
}
