use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash)]
pub enum TileFormat {
    /// Lossless PNG (default)
    #[value(name = "png")]
    Png,
    /// JPEG at quality 95, written with a .jpg extension
    #[value(name = "jpg")]
    Jpg,
    /// JPEG at quality 95, written with a .jpeg extension
    #[value(name = "jpeg")]
    Jpeg,
}

impl TileFormat {
    /// File extension used for files written in this format
    pub fn extension(&self) -> &'static str {
        match self {
            TileFormat::Png => "png",
            TileFormat::Jpg => "jpg",
            TileFormat::Jpeg => "jpeg",
        }
    }

    pub fn is_jpeg(&self) -> bool {
        matches!(self, TileFormat::Jpg | TileFormat::Jpeg)
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "crop-grid",
    about = "Crop an image into a grid of fixed-size tiles with edge padding",
    long_about = "
Grid Cropper

Pads a page image on the right and bottom with black until both sides are a
multiple of the tile size, slices it into a row-major grid of square tiles and
writes every tile plus a manifest.csv describing the tile geometry into
<OUT>/<page stem>/.

Example Usage:
  # 128x128 PNG tiles under data/crops_128/3/
  crop-grid pages/3.png

  # 256x256 JPEG tiles into a custom directory
  crop-grid pages/3.png --out data/crops_256 --tile 256 --format jpg

  # Show what would be written without touching the disk
  crop-grid pages/3.png --dry-run --verbose"
)]
pub struct CropArgs {
    /// Path to a single page image (PNG/JPG)
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Output root directory for tiles
    #[arg(long = "out", default_value = "data/crops_128", value_name = "DIR")]
    pub out: PathBuf,

    /// Tile edge length in pixels
    #[arg(long = "tile", default_value = "128", value_name = "N")]
    pub tile: u32,

    /// Output image format for tiles
    #[arg(long = "format", default_value = "png")]
    pub format: TileFormat,

    /// JSON configuration file; explicit command-line flags take precedence
    #[arg(long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Enable verbose output with detailed progress information
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Compute the grid and report it without writing any files
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Emit progress and results as JSON lines on stdout
    #[arg(long = "json-progress")]
    pub json_progress: bool,
}

#[derive(Parser, Debug)]
#[command(
    name = "paste-faces",
    about = "Paste a face stamp onto a random subset of tiles and write detection labels",
    long_about = "
Face Paster

For every spread id, reads the tiles produced by crop-grid from
<CROPS_DIR>/<spread>/ and the stamp <FACES_DIR>/<spread>_waldo.png, pastes the
stamp at a random position and scale onto round(label_frac * tiles) randomly
chosen tiles, and writes every tile to <OUT_IMAGES>. Labeled tiles get a
one-line label file in <OUT_LABELS> (class cx cy w h, normalized). A summary
manifest.csv is written next to <OUT_IMAGES>.

A fixed --seed reproduces the same tile selection and placement.

Example Usage:
  # Spreads 1, 2 and 3 with the defaults
  paste-faces --spread_ids 1,2,3

  # Half of the tiles labeled, different seed, per-spread table at the end
  paste-faces --spread_ids 1,2 --label_frac 0.5 --seed 7 --report"
)]
pub struct PasteArgs {
    /// Directory containing one tile subdirectory per spread
    #[arg(long = "crops_dir", default_value = "data/crops_128", value_name = "DIR")]
    pub crops_dir: PathBuf,

    /// Directory containing <spread>_waldo.png face stamps
    #[arg(long = "faces_dir", default_value = "data/faces", value_name = "DIR")]
    pub faces_dir: PathBuf,

    /// Output directory for composite images
    #[arg(
        long = "out_images",
        default_value = "data/dataset/images/train",
        value_name = "DIR"
    )]
    pub out_images: PathBuf,

    /// Output directory for label files
    #[arg(
        long = "out_labels",
        default_value = "data/dataset/labels/train",
        value_name = "DIR"
    )]
    pub out_labels: PathBuf,

    /// Comma-separated spread folder names under the crops directory
    #[arg(long = "spread_ids", default_value = "1", value_name = "IDS")]
    pub spread_ids_str: String,

    /// Fraction of tiles to receive a pasted face (0.0-1.0)
    #[arg(long = "label_frac", default_value = "0.98", value_name = "FRAC")]
    pub label_frac: f64,

    /// Seed for tile selection, paste scale and paste position
    #[arg(long = "seed", default_value = "0", value_name = "SEED")]
    pub seed: u64,

    /// Tile edge length in pixels; every input tile must match it
    #[arg(long = "tile_size", default_value = "128", value_name = "N")]
    pub tile_size: u32,

    /// Lower bound of the random paste scale
    #[arg(long = "scale_min", default_value = "0.9", value_name = "SCALE")]
    pub scale_min: f64,

    /// Upper bound of the random paste scale
    #[arg(long = "scale_max", default_value = "1.1", value_name = "SCALE")]
    pub scale_max: f64,

    /// Class id written on every label line
    #[arg(long = "class_id", default_value = "0", value_name = "ID")]
    pub class_id: u32,

    /// Comma-separated tile extensions to pick up from each spread directory
    #[arg(long = "tile_ext", default_value = "png", value_name = "EXTS")]
    pub tile_ext_str: String,

    /// Output image format for composites
    #[arg(long = "format", default_value = "png")]
    pub format: TileFormat,

    /// Display a per-spread table of tile counts at the end
    #[arg(long = "report")]
    pub report: bool,

    /// JSON configuration file; explicit command-line flags take precedence
    #[arg(long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Enable verbose output with detailed progress information
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Run selection and placement without writing any files
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Emit progress and results as JSON lines on stdout
    #[arg(long = "json-progress")]
    pub json_progress: bool,
}

/// Split a comma-separated list, trimming entries and dropping empty ones
fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl PasteArgs {
    /// Parse the spread ids string, preserving the given order
    pub fn parse_spread_ids(&self) -> Vec<String> {
        split_list(&self.spread_ids_str)
    }

    /// Parse the tile extensions string into lowercase extensions without dots
    pub fn parse_tile_extensions(&self) -> Vec<String> {
        split_list(&self.tile_ext_str)
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_args_defaults() {
        let args = CropArgs::try_parse_from(["crop-grid", "page.png"]).unwrap();
        assert_eq!(args.image, PathBuf::from("page.png"));
        assert_eq!(args.out, PathBuf::from("data/crops_128"));
        assert_eq!(args.tile, 128);
        assert_eq!(args.format, TileFormat::Png);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_crop_args_rejects_unknown_format() {
        let result = CropArgs::try_parse_from(["crop-grid", "page.png", "--format", "bmp"]);
        assert!(result.is_err());

        let args =
            CropArgs::try_parse_from(["crop-grid", "page.png", "--format", "jpeg"]).unwrap();
        assert_eq!(args.format.extension(), "jpeg");
        assert!(args.format.is_jpeg());
    }

    #[test]
    fn test_paste_args_defaults() {
        let args = PasteArgs::try_parse_from(["paste-faces"]).unwrap();
        assert_eq!(args.crops_dir, PathBuf::from("data/crops_128"));
        assert_eq!(args.faces_dir, PathBuf::from("data/faces"));
        assert_eq!(args.out_images, PathBuf::from("data/dataset/images/train"));
        assert_eq!(args.out_labels, PathBuf::from("data/dataset/labels/train"));
        assert_eq!(args.parse_spread_ids(), vec!["1"]);
        assert_eq!(args.label_frac, 0.98);
        assert_eq!(args.seed, 0);
        assert_eq!(args.tile_size, 128);
        assert_eq!(args.class_id, 0);
    }

    #[test]
    fn test_parse_spread_ids() {
        let args = PasteArgs {
            spread_ids_str: " 1, 2,,3 ,".to_string(),
            ..Default::default()
        };
        assert_eq!(args.parse_spread_ids(), vec!["1", "2", "3"]);

        let args = PasteArgs {
            spread_ids_str: " , ".to_string(),
            ..Default::default()
        };
        assert!(args.parse_spread_ids().is_empty());
    }

    #[test]
    fn test_parse_tile_extensions() {
        let args = PasteArgs {
            tile_ext_str: "PNG, .jpg ,".to_string(),
            ..Default::default()
        };
        assert_eq!(args.parse_tile_extensions(), vec!["png", "jpg"]);
    }
}

// Default implementations for tests
#[cfg(test)]
impl Default for CropArgs {
    fn default() -> Self {
        Self {
            image: PathBuf::from("page.png"),
            out: PathBuf::from("data/crops_128"),
            tile: 128,
            format: TileFormat::Png,
            config_file: None,
            verbose: false,
            dry_run: false,
            json_progress: false,
        }
    }
}

#[cfg(test)]
impl Default for PasteArgs {
    fn default() -> Self {
        Self {
            crops_dir: PathBuf::from("data/crops_128"),
            faces_dir: PathBuf::from("data/faces"),
            out_images: PathBuf::from("data/dataset/images/train"),
            out_labels: PathBuf::from("data/dataset/labels/train"),
            spread_ids_str: "1".to_string(),
            label_frac: 0.98,
            seed: 0,
            tile_size: 128,
            scale_min: 0.9,
            scale_max: 1.1,
            class_id: 0,
            tile_ext_str: "png".to_string(),
            format: TileFormat::Png,
            report: false,
            config_file: None,
            verbose: false,
            dry_run: false,
            json_progress: false,
        }
    }
}
