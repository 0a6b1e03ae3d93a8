use crate::errors::Result;
use image::{GrayImage, RgbImage};
use ndarray::prelude::*;

use crate::model::{decode_mask, preprocess};

/// Abstraction over the segmentation model so the pipeline can run against a mock.
pub trait SegmentationModel {
    /// Square input resolution the model works at.
    fn image_size(&self) -> u32;

    /// Raw forward pass: `1x3xSxS` normalized input to the `1x1xSxS` logit map.
    fn predict(&self, tensor: ArrayView4<f32>) -> Result<Array4<f32>>;

    /// Alpha mask for `image`, at the image's own dimensions.
    fn segment(&self, image: &RgbImage) -> Result<GrayImage> {
        let tensor = preprocess(image, self.image_size());
        let prediction = self.predict(tensor.view())?;
        decode_mask(prediction.view(), image.width(), image.height())
    }
}

impl<M: SegmentationModel + ?Sized> SegmentationModel for &M {
    fn image_size(&self) -> u32 {
        (**self).image_size()
    }

    fn predict(&self, tensor: ArrayView4<f32>) -> Result<Array4<f32>> {
        (**self).predict(tensor)
    }

    fn segment(&self, image: &RgbImage) -> Result<GrayImage> {
        (**self).segment(image)
    }
}
