use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::RgbImage;

use super::crop::CropRectangle;
use crate::error::BadgeError;

/// Resample the `crop` region of `img` so it exactly fills a
/// `target_width` x `target_height` canvas.
///
/// The crop is sub-pixel: fractional origins and sizes are passed straight to
/// the resampler instead of being rounded to whole pixels first.
pub fn resample_crop(
    img: &RgbImage,
    crop: &CropRectangle,
    target_width: u32,
    target_height: u32,
) -> Result<RgbImage, BadgeError> {
    let (src_width, src_height) = img.dimensions();

    if src_width == 0 || src_height == 0 {
        return Err(BadgeError::Composite("source image is empty".into()));
    }
    if target_width == 0 || target_height == 0 {
        return Err(BadgeError::Composite("target canvas is empty".into()));
    }

    // Guard against float drift past the right/bottom edge
    let left = crop.x.clamp(0.0, src_width as f64);
    let top = crop.y.clamp(0.0, src_height as f64);
    let width = crop.width.min(src_width as f64 - left);
    let height = crop.height.min(src_height as f64 - top);

    if width <= 0.0 || height <= 0.0 {
        return Err(BadgeError::Composite(format!(
            "crop ({:.1},{:.1},{:.1}x{:.1}) is empty on {}x{} image",
            crop.x, crop.y, crop.width, crop.height, src_width, src_height
        )));
    }

    let src_image = Image::from_vec_u8(src_width, src_height, img.as_raw().clone(), PixelType::U8x3)
        .map_err(|e| BadgeError::Composite(e.to_string()))?;

    let mut dst_image = Image::new(target_width, target_height, PixelType::U8x3);

    let options = ResizeOptions::new()
        .resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3))
        .crop(left, top, width, height);

    let mut resizer = Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| BadgeError::Composite(e.to_string()))?;

    RgbImage::from_raw(target_width, target_height, dst_image.buffer().to_vec()).ok_or_else(|| {
        BadgeError::Composite("resampled buffer does not match canvas size".into())
    })
}
