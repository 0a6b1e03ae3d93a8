use image::{ImageBuffer, Pixel, Primitive, Rgb, Rgba};
use num_traits::AsPrimitive;

use crate::imageops_ai::{get_max_value, is_floating_point};

/// Composites an RGBA buffer over an opaque background colour, using alpha as the
/// paste mask. The result has no alpha channel.
pub trait Flatten<S>
where
    Rgb<S>: Pixel<Subpixel = S>,
    S: Primitive + 'static,
{
    fn flatten_onto(&self, background: Rgb<S>) -> ImageBuffer<Rgb<S>, Vec<S>>;
}

impl<S> Flatten<S> for ImageBuffer<Rgba<S>, Vec<S>>
where
    Rgba<S>: Pixel<Subpixel = S>,
    Rgb<S>: Pixel<Subpixel = S>,
    S: Primitive + AsPrimitive<f32> + 'static,
    f32: AsPrimitive<S>,
{
    fn flatten_onto(&self, background: Rgb<S>) -> ImageBuffer<Rgb<S>, Vec<S>> {
        let max = get_max_value::<S>().as_();
        let integral = !is_floating_point::<S>();
        let Rgb([bg_red, bg_green, bg_blue]) = background;

        ImageBuffer::from_fn(self.width(), self.height(), |x, y| {
            let Rgba([red, green, blue, alpha]) = *self.get_pixel(x, y);
            let alpha = alpha.as_() / max;
            let blend = |fg: S, bg: S| {
                let value = fg.as_().mul_add(alpha, bg.as_() * (1.0 - alpha));
                let value = if integral { value.round() } else { value };
                value.as_()
            };
            Rgb([
                blend(red, bg_red),
                blend(green, bg_green),
                blend(blue, bg_blue),
            ])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb32FImage, RgbaImage};

    fn flatten_generic<S>(image: &ImageBuffer<Rgba<S>, Vec<S>>, background: Rgb<S>) -> Vec<S>
    where
        ImageBuffer<Rgba<S>, Vec<S>>: Flatten<S>,
        Rgba<S>: Pixel<Subpixel = S>,
        Rgb<S>: Pixel<Subpixel = S>,
        S: Primitive + 'static,
    {
        image.flatten_onto(background).into_raw()
    }

    #[test]
    fn test_flatten_extremes() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([10, 20, 30, 255]));
        image.put_pixel(1, 0, Rgba([10, 20, 30, 0]));

        let flat = image.flatten_onto(Rgb([255, 255, 255]));
        assert_eq!(flat.get_pixel(0, 0), &Rgb([10, 20, 30]));
        assert_eq!(flat.get_pixel(1, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_flatten_half_alpha_rounds() {
        let image = RgbaImage::from_pixel(1, 1, Rgba([0, 100, 255, 128]));
        let flat = image.flatten_onto(Rgb([255, 255, 255]));
        // 0*128/255 + 255*127/255 = 127, 100*128/255 + 127 = 177.2, 255
        assert_eq!(flat.get_pixel(0, 0), &Rgb([127, 177, 255]));
    }

    #[test]
    fn test_flatten_float_buffer() {
        let image: ImageBuffer<Rgba<f32>, Vec<f32>> =
            ImageBuffer::from_pixel(1, 1, Rgba([0.2, 0.4, 0.6, 0.5]));
        let flat: Rgb32FImage = image.flatten_onto(Rgb([1.0, 1.0, 1.0]));
        let Rgb([r, g, b]) = *flat.get_pixel(0, 0);
        assert!((r - 0.6).abs() < 1e-6);
        assert!((g - 0.7).abs() < 1e-6);
        assert!((b - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_flatten_through_trait_bound_u16() {
        let image: ImageBuffer<Rgba<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(1, 1, Rgba([1000, 2000, 3000, 0]));
        assert_eq!(flatten_generic(&image, Rgb([u16::MAX; 3])), vec![u16::MAX; 3]);
    }
}
