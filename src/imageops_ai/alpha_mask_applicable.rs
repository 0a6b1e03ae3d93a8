use image::{ImageBuffer, Luma, Pixel, Primitive, Rgb, Rgba};
use num_traits::AsPrimitive;

use crate::errors::{RmbgError, Result};
use crate::imageops_ai::get_max_value;

/// Attaches a single-channel mask to an RGB buffer as its alpha channel.
pub trait AlphaMaskApplicable<SI>
where
    SI: Primitive + AsPrimitive<f32> + 'static,
{
    fn apply_alpha_mask<SM>(
        &self,
        mask: &ImageBuffer<Luma<SM>, Vec<SM>>,
    ) -> Result<ImageBuffer<Rgba<SI>, Vec<SI>>>
    where
        Rgba<SI>: Pixel<Subpixel = SI>,
        SM: Primitive + AsPrimitive<f32> + 'static;
}

impl<SI> AlphaMaskApplicable<SI> for ImageBuffer<Rgb<SI>, Vec<SI>>
where
    Rgb<SI>: Pixel<Subpixel = SI>,
    SI: Primitive + AsPrimitive<f32> + 'static,
    f32: AsPrimitive<SI>,
{
    fn apply_alpha_mask<SM>(
        &self,
        mask: &ImageBuffer<Luma<SM>, Vec<SM>>,
    ) -> Result<ImageBuffer<Rgba<SI>, Vec<SI>>>
    where
        Rgba<SI>: Pixel<Subpixel = SI>,
        SM: Primitive + AsPrimitive<f32> + 'static,
    {
        if self.dimensions() != mask.dimensions() {
            return Err(RmbgError::Validation {
                field: "alpha mask".to_string(),
                reason: format!(
                    "is {}x{} but the image is {}x{}",
                    mask.width(),
                    mask.height(),
                    self.width(),
                    self.height()
                ),
            });
        }

        let si_max = get_max_value::<SI>().as_();
        let sm_max = get_max_value::<SM>().as_();

        let pixels = self
            .pixels()
            .zip(mask.pixels())
            .flat_map(|(&Rgb([red, green, blue]), &Luma([alpha]))| {
                let alpha = (alpha.as_() / sm_max * si_max).as_();
                [red, green, blue, alpha]
            })
            .collect::<Vec<SI>>();

        ImageBuffer::from_raw(self.width(), self.height(), pixels).ok_or_else(|| {
            RmbgError::Validation {
                field: "masked image".to_string(),
                reason: "pixel buffer does not match its dimensions".to_string(),
            }
        })
    }
}
