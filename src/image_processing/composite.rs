use anyhow::Result;
use image::{Rgb, RgbImage, RgbaImage};
use rand::Rng;

use super::resize::{resize_rgba, scaled_dimensions};

/// Pixel rectangle occupied by a pasted stamp inside a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasteRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PasteRegion {
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }
}

/// Inclusive range of the random paste scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self { min: 0.9, max: 1.1 }
    }
}

/// Alpha-blend one channel: round((src * a + dst * (255 - a)) / 255)
fn blend_channel(src: u8, dst: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    let value = src as u32 * a + dst as u32 * (255 - a);
    ((value + 127) / 255) as u8
}

/// Composite an RGBA stamp onto an opaque tile at (x, y), honoring the stamp's alpha
pub fn composite_rgba_onto(tile: &mut RgbImage, stamp: &RgbaImage, x: u32, y: u32) -> Result<()> {
    let region = PasteRegion {
        x,
        y,
        width: stamp.width(),
        height: stamp.height(),
    };
    if !region.fits_within(tile.width(), tile.height()) {
        return Err(anyhow::anyhow!(
            "Stamp {}x{} at ({},{}) exceeds {}x{} tile",
            region.width,
            region.height,
            x,
            y,
            tile.width(),
            tile.height()
        ));
    }

    for (sx, sy, src) in stamp.enumerate_pixels() {
        let alpha = src[3];
        if alpha == 0 {
            continue;
        }

        let dst = tile.get_pixel_mut(x + sx, y + sy);
        *dst = Rgb([
            blend_channel(src[0], dst[0], alpha),
            blend_channel(src[1], dst[1], alpha),
            blend_channel(src[2], dst[2], alpha),
        ]);
    }

    Ok(())
}

/// Paste `face` onto `tile` at a random scale and position fully inside the tile
///
/// Draws, in order: the scale from `scale`, then the x offset, then the y offset.
/// Placement is bounded by `tile_size` on both axes.
pub fn paste_face_on_tile<R: Rng + ?Sized>(
    rng: &mut R,
    tile: &mut RgbImage,
    face: &RgbaImage,
    scale: ScaleRange,
    tile_size: u32,
) -> Result<PasteRegion> {
    let (face_width, face_height) = face.dimensions();
    let factor = rng.random_range(scale.min..=scale.max);
    let (new_width, new_height) = scaled_dimensions(face_width, face_height, factor);

    if new_width == 0 || new_height == 0 {
        return Err(anyhow::anyhow!(
            "Face {}x{} scaled by {:.3} collapses to {}x{}",
            face_width,
            face_height,
            factor,
            new_width,
            new_height
        ));
    }
    if new_width > tile_size || new_height > tile_size {
        return Err(anyhow::anyhow!(
            "Face {}x{} scaled by {:.3} to {}x{} does not fit in a {}x{} tile",
            face_width,
            face_height,
            factor,
            new_width,
            new_height,
            tile_size,
            tile_size
        ));
    }

    let resized = resize_rgba(face, new_width, new_height)?;

    let x = rng.random_range(0..=tile_size - new_width);
    let y = rng.random_range(0..=tile_size - new_height);

    composite_rgba_onto(tile, &resized, x, y)?;

    Ok(PasteRegion {
        x,
        y,
        width: new_width,
        height: new_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_blend_channel() {
        assert_eq!(blend_channel(200, 10, 255), 200);
        assert_eq!(blend_channel(200, 10, 0), 10);
        assert_eq!(blend_channel(255, 0, 128), 128);
    }

    #[test]
    fn test_composite_respects_alpha() {
        let mut tile = RgbImage::from_pixel(8, 8, Rgb([0, 0, 255]));
        let mut stamp = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        stamp.put_pixel(1, 1, Rgba([255, 0, 0, 0]));

        composite_rgba_onto(&mut tile, &stamp, 3, 4).unwrap();

        assert_eq!(tile.get_pixel(3, 4), &Rgb([255, 0, 0]));
        assert_eq!(tile.get_pixel(4, 4), &Rgb([255, 0, 0]));
        // Transparent stamp pixel leaves the tile untouched
        assert_eq!(tile.get_pixel(4, 5), &Rgb([0, 0, 255]));
        assert_eq!(tile.get_pixel(0, 0), &Rgb([0, 0, 255]));
    }

    #[test]
    fn test_composite_out_of_bounds_fails() {
        let mut tile = RgbImage::new(8, 8);
        let stamp = RgbaImage::new(4, 4);
        assert!(composite_rgba_onto(&mut tile, &stamp, 5, 0).is_err());
        assert!(composite_rgba_onto(&mut tile, &stamp, 4, 4).is_ok());
    }

    #[test]
    fn test_paste_stays_inside_tile() {
        let face = RgbaImage::from_pixel(40, 30, Rgba([255, 255, 0, 255]));
        let mut rng = StdRng::seed_from_u64(0);

        for _ in 0..200 {
            let mut tile = RgbImage::new(128, 128);
            let region =
                paste_face_on_tile(&mut rng, &mut tile, &face, ScaleRange::default(), 128).unwrap();

            assert!(region.fits_within(128, 128));
            assert!((36..=44).contains(&region.width));
            assert!((27..=33).contains(&region.height));
        }
    }

    #[test]
    fn test_paste_is_deterministic_for_seed() {
        let face = RgbaImage::from_pixel(20, 20, Rgba([0, 255, 0, 200]));

        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut tile = RgbImage::new(64, 64);
            let region =
                paste_face_on_tile(&mut rng, &mut tile, &face, ScaleRange::default(), 64).unwrap();
            (region, tile)
        };

        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_face_larger_than_tile_fails() {
        let face = RgbaImage::new(120, 120);
        let mut tile = RgbImage::new(128, 128);
        let mut rng = StdRng::seed_from_u64(1);
        let scale = ScaleRange { min: 1.1, max: 1.1 };
        assert!(paste_face_on_tile(&mut rng, &mut tile, &face, scale, 128).is_err());
    }
}
