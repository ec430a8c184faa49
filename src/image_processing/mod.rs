pub mod composite;
pub mod grid;
pub mod pad;
pub mod resize;

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::cli::TileFormat;

/// JPEG quality used for every lossy tile or composite
pub const JPEG_QUALITY: u8 = 95;

/// Load any supported image and flatten it to opaque RGB (alpha is dropped)
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open image: {}", path.display()))?;
    Ok(img.to_rgb8())
}

/// Load any supported image as RGBA
pub fn load_rgba(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open image: {}", path.display()))?;
    Ok(img.to_rgba8())
}

/// Save an RGB image in the requested format, overwriting any existing file
pub fn save_image(img: &RgbImage, path: &Path, format: TileFormat) -> Result<()> {
    if format.is_jpeg() {
        let file = File::create(path)
            .with_context(|| format!("Failed to create file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
        img.write_with_encoder(encoder)
            .with_context(|| format!("Failed to save JPEG: {}", path.display()))
    } else {
        img.save_with_format(path, ImageFormat::Png)
            .with_context(|| format!("Failed to save PNG: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_save_and_reload_png_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.png");
        let img = RgbImage::from_fn(8, 8, |x, y| Rgb([x as u8 * 30, y as u8 * 30, 7]));

        save_image(&img, &path, TileFormat::Png).unwrap();
        let reloaded = load_rgb(&path).unwrap();
        assert_eq!(reloaded, img);
    }

    #[test]
    fn test_save_jpeg_keeps_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.jpg");
        let img = RgbImage::from_pixel(16, 16, Rgb([120, 60, 30]));

        save_image(&img, &path, TileFormat::Jpg).unwrap();
        let reloaded = load_rgb(&path).unwrap();
        assert_eq!(reloaded.dimensions(), (16, 16));

        // Both JPEG spellings go through the JPEG encoder
        let jpeg_path = dir.path().join("tile.jpeg");
        save_image(&img, &jpeg_path, TileFormat::Jpeg).unwrap();
        let bytes = std::fs::read(&jpeg_path).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = load_rgb(Path::new("does/not/exist.png"));
        assert!(result.is_err());
    }
}
