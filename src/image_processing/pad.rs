use anyhow::Result;
use image::{imageops, RgbImage};

/// Black border added on the right and bottom edges of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    pub right: u32,
    pub bottom: u32,
}

impl Padding {
    pub fn is_empty(&self) -> bool {
        self.right == 0 && self.bottom == 0
    }
}

/// Smallest dimensions that are exact multiples of `tile` and not smaller than the input
pub fn padded_dimensions(width: u32, height: u32, tile: u32) -> Result<(u32, u32)> {
    if tile == 0 {
        return Err(anyhow::anyhow!("Tile size must be greater than 0"));
    }

    Ok((width.div_ceil(tile) * tile, height.div_ceil(tile) * tile))
}

/// Pad an image with black on the right and bottom so both sides are multiples of `tile`
///
/// The original pixels keep their coordinates; when the image is already aligned
/// the result is an unchanged copy and the padding is empty.
pub fn pad_to_multiple(img: &RgbImage, tile: u32) -> Result<(RgbImage, Padding)> {
    let (width, height) = img.dimensions();
    let (new_width, new_height) = padded_dimensions(width, height, tile)?;

    let padding = Padding {
        right: new_width - width,
        bottom: new_height - height,
    };

    if padding.is_empty() {
        return Ok((img.clone(), padding));
    }

    // New buffers are zero-filled, which is black for RGB
    let mut padded = RgbImage::new(new_width, new_height);
    imageops::replace(&mut padded, img, 0, 0);

    Ok((padded, padding))
}
