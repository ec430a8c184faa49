//! Grid Cropper: pad a page, slice it into tiles and record their geometry.

use anyhow::{Context, Result};
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{CropArgs, TileFormat};
use crate::image_processing::grid::{crop_image, tile_file_name, GridLayout};
use crate::image_processing::pad::{pad_to_multiple, Padding};
use crate::image_processing::{load_rgb, save_image};
use crate::json_output::JsonMessage;
use crate::manifest::{ManifestWriter, TileManifestRow, TILE_MANIFEST_HEADER};
use crate::utils::{abandon_on_error, file_stem_string, progress_bar_for, verbose_println};

pub const MANIFEST_FILE_NAME: &str = "manifest.csv";

#[derive(Debug, Clone)]
pub struct CropConfig {
    pub out_dir: PathBuf,
    pub tile: u32,
    pub format: TileFormat,
    pub verbose: bool,
    pub dry_run: bool,
    pub json_progress: bool,
}

impl From<&CropArgs> for CropConfig {
    fn from(args: &CropArgs) -> Self {
        Self {
            out_dir: args.out.clone(),
            tile: args.tile,
            format: args.format,
            verbose: args.verbose,
            dry_run: args.dry_run,
            json_progress: args.json_progress,
        }
    }
}

#[derive(Debug)]
pub struct CropResult {
    pub layout: GridLayout,
    pub padding: Padding,
    pub page_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub tiles: Vec<TileManifestRow>,
}

pub struct GridCropper {
    config: CropConfig,
}

impl GridCropper {
    pub fn new(config: CropConfig) -> Self {
        Self { config }
    }

    /// Load a page image and crop it into `<out_dir>/<stem>/`
    pub fn crop_page(&self, image_path: &Path) -> Result<CropResult> {
        let stem = file_stem_string(image_path)?;
        let img = load_rgb(image_path)?;

        verbose_println(
            self.config.verbose && !self.config.json_progress,
            &format!(
                "Loaded {} ({}x{})",
                image_path.display(),
                img.width(),
                img.height()
            ),
        );

        self.crop_image(&img, &stem)
    }

    /// Crop an already decoded page; tiles are written row by row, column by column
    pub fn crop_image(&self, img: &RgbImage, stem: &str) -> Result<CropResult> {
        let verbose = self.config.verbose && !self.config.json_progress;
        let (padded, padding) = pad_to_multiple(img, self.config.tile)?;
        let layout = GridLayout::for_padded(padded.width(), padded.height(), self.config.tile)?;

        verbose_println(
            verbose,
            &format!(
                "Padded to {}x{} (right +{}, bottom +{}): {} cols x {} rows",
                layout.page_width(),
                layout.page_height(),
                padding.right,
                padding.bottom,
                layout.cols,
                layout.rows
            ),
        );

        let page_dir = self.config.out_dir.join(stem);
        let manifest_path = page_dir.join(MANIFEST_FILE_NAME);

        let mut manifest = if self.config.dry_run {
            None
        } else {
            fs::create_dir_all(&page_dir).with_context(|| {
                format!("Failed to create output directory: {}", page_dir.display())
            })?;
            Some(ManifestWriter::create(&manifest_path, &TILE_MANIFEST_HEADER)?)
        };

        let total = layout.tile_count();
        let progress = progress_bar_for(total as u64, self.config.json_progress);
        let mut tiles = Vec::with_capacity(total);

        for (index, cell) in layout.cells().enumerate() {
            let tile_name = tile_file_name(stem, &cell, self.config.format.extension());
            let tile_path = page_dir.join(&tile_name);

            if !self.config.dry_run {
                let written = crop_image(&padded, cell.x, cell.y, layout.tile, layout.tile)
                    .and_then(|tile_img| save_image(&tile_img, &tile_path, self.config.format));
                abandon_on_error(&progress, written)?;
            }

            let row = TileManifestRow {
                tile_path: tile_path.display().to_string(),
                col: cell.col,
                row: cell.row,
                x: cell.x,
                y: cell.y,
                w: layout.tile,
                h: layout.tile,
                page_width: layout.page_width(),
                page_height: layout.page_height(),
            };
            if let Some(writer) = manifest.as_mut() {
                abandon_on_error(&progress, writer.append(&row))?;
            }
            tiles.push(row);

            progress.inc(1);
            if self.config.json_progress {
                JsonMessage::progress(index + 1, total, tile_name);
            }
        }

        if let Some(writer) = manifest {
            writer.finish()?;
        }
        progress.finish_and_clear();

        Ok(CropResult {
            layout,
            padding,
            page_dir,
            manifest_path,
            tiles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::read_manifest;
    use image::Rgb;

    fn config(out_dir: &Path) -> CropConfig {
        CropConfig {
            out_dir: out_dir.to_path_buf(),
            tile: 128,
            format: TileFormat::Png,
            verbose: false,
            dry_run: false,
            json_progress: true,
        }
    }

    #[test]
    fn test_crop_example_page() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbImage::from_pixel(300, 260, Rgb([90, 90, 90]));

        let result = GridCropper::new(config(dir.path())).crop_image(&img, "3").unwrap();

        assert_eq!((result.layout.cols, result.layout.rows), (3, 3));
        assert_eq!(result.tiles.len(), 9);
        assert_eq!(result.page_dir, dir.path().join("3"));

        let last = result.tiles.last().unwrap();
        assert_eq!((last.col, last.row, last.x, last.y), (2, 2, 256, 256));
        assert_eq!((last.w, last.h), (128, 128));
        assert_eq!((last.page_width, last.page_height), (384, 384));
        assert!(last.tile_path.ends_with("3_r002_c002.png"));

        let rows: Vec<TileManifestRow> = read_manifest(&result.manifest_path).unwrap();
        assert_eq!(rows, result.tiles);
        for row in &rows {
            let tile = load_rgb(Path::new(&row.tile_path)).unwrap();
            assert_eq!(tile.dimensions(), (128, 128));
        }
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbImage::new(130, 10);
        let cropper = GridCropper::new(CropConfig {
            dry_run: true,
            ..config(dir.path())
        });

        let result = cropper.crop_image(&img, "7").unwrap();
        assert_eq!(result.tiles.len(), 2);
        assert!(!result.page_dir.exists());
    }

    #[test]
    fn test_jpeg_tiles_use_requested_extension() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbImage::new(64, 64);
        let cropper = GridCropper::new(CropConfig {
            tile: 32,
            format: TileFormat::Jpeg,
            ..config(dir.path())
        });

        let result = cropper.crop_image(&img, "p").unwrap();
        let names: Vec<_> = result
            .tiles
            .iter()
            .map(|t| Path::new(&t.tile_path).file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["p_r000_c000.jpeg", "p_r000_c001.jpeg", "p_r001_c000.jpeg", "p_r001_c001.jpeg"]
        );
        assert!(result.page_dir.join("p_r001_c001.jpeg").is_file());
    }

    #[test]
    fn test_missing_page_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cropper = GridCropper::new(config(dir.path()));
        assert!(cropper.crop_page(&dir.path().join("missing.png")).is_err());
    }
}
