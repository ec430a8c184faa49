use anyhow::Result;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::RgbaImage;
use std::num::NonZeroU32;

/// Dimensions of an image scaled by `scale`, truncated toward zero
pub fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    (
        (width as f64 * scale) as u32,
        (height as f64 * scale) as u32,
    )
}

/// Resize an RGBA image to exact dimensions with Lanczos3 filtering
///
/// Color channels are premultiplied by alpha during filtering so fully
/// transparent pixels do not bleed into the visible edge of the stamp.
pub fn resize_rgba(img: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage> {
    let (src_width, src_height) = img.dimensions();

    if src_width == width && src_height == height {
        return Ok(img.clone());
    }

    let src_width_nz = NonZeroU32::new(src_width).ok_or_else(|| anyhow::anyhow!("Source width is zero"))?;
    let src_height_nz = NonZeroU32::new(src_height).ok_or_else(|| anyhow::anyhow!("Source height is zero"))?;
    let dst_width_nz = NonZeroU32::new(width).ok_or_else(|| anyhow::anyhow!("Target width is zero"))?;
    let dst_height_nz = NonZeroU32::new(height).ok_or_else(|| anyhow::anyhow!("Target height is zero"))?;

    let src_image = Image::from_vec_u8(
        src_width_nz.into(),
        src_height_nz.into(),
        img.as_raw().clone(),
        PixelType::U8x4,
    )?;

    let mut dst_image = Image::new(dst_width_nz.into(), dst_height_nz.into(), PixelType::U8x4);

    let options = ResizeOptions::new()
        .resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3))
        .use_alpha(true);

    let mut resizer = Resizer::new();
    resizer.resize(&src_image, &mut dst_image, Some(&options))?;

    RgbaImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| anyhow::anyhow!("Resized buffer does not match {}x{}", width, height))
}
