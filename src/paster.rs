//! Face Paster: stamp a face onto a seeded random subset of tiles and emit labels.
//!
//! One `StdRng` seeded from the configured seed drives every random choice.
//! Draw order is fixed: for each spread, the tile subset first, then for each
//! selected tile in file-name order the scale, the x offset and the y offset.
//! The same seed over the same inputs therefore reproduces selection and
//! placement exactly.

use anyhow::{Context, Result};
use image::RgbaImage;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{PasteArgs, TileFormat};
use crate::image_processing::composite::{paste_face_on_tile, ScaleRange};
use crate::image_processing::{load_rgb, load_rgba, save_image};
use crate::json_output::JsonMessage;
use crate::label::{write_label_file, LabelLine, NormalizedBox};
use crate::manifest::{write_manifest, DatasetManifestRow, DATASET_MANIFEST_HEADER};
use crate::utils::{
    abandon_on_error, file_stem_string, list_files_sorted, progress_bar_for, verbose_println,
    warn_println,
};

pub const FACE_SUFFIX: &str = "_waldo.png";
pub const MANIFEST_FILE_NAME: &str = "manifest.csv";

#[derive(Debug, Clone)]
pub struct PasteConfig {
    pub crops_dir: PathBuf,
    pub faces_dir: PathBuf,
    pub out_images: PathBuf,
    pub out_labels: PathBuf,
    pub spread_ids: Vec<String>,
    pub label_frac: f64,
    pub seed: u64,
    pub tile_size: u32,
    pub scale: ScaleRange,
    pub class_id: u32,
    pub tile_extensions: Vec<String>,
    pub output_format: TileFormat,
    pub verbose: bool,
    pub dry_run: bool,
    pub json_progress: bool,
}

impl From<&PasteArgs> for PasteConfig {
    fn from(args: &PasteArgs) -> Self {
        Self {
            crops_dir: args.crops_dir.clone(),
            faces_dir: args.faces_dir.clone(),
            out_images: args.out_images.clone(),
            out_labels: args.out_labels.clone(),
            spread_ids: args.parse_spread_ids(),
            label_frac: args.label_frac,
            seed: args.seed,
            tile_size: args.tile_size,
            scale: ScaleRange {
                min: args.scale_min,
                max: args.scale_max,
            },
            class_id: args.class_id,
            tile_extensions: args.parse_tile_extensions(),
            output_format: args.format,
            verbose: args.verbose,
            dry_run: args.dry_run,
            json_progress: args.json_progress,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingSpreadDir(PathBuf),
    MissingFace(PathBuf),
}

impl SkipReason {
    pub fn path(&self) -> &Path {
        match self {
            SkipReason::MissingSpreadDir(path) | SkipReason::MissingFace(path) => path,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SkipReason::MissingSpreadDir(_) => "missing spread dir",
            SkipReason::MissingFace(_) => "missing face PNG",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSpread {
    pub spread: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadSummary {
    pub spread: String,
    pub tiles: usize,
    pub labeled: usize,
}

impl SpreadSummary {
    pub fn background(&self) -> usize {
        self.tiles - self.labeled
    }
}

#[derive(Debug)]
pub struct PasteSummary {
    pub spreads: Vec<SpreadSummary>,
    pub skipped: Vec<SkippedSpread>,
    pub rows: Vec<DatasetManifestRow>,
    pub manifest_path: PathBuf,
}

impl PasteSummary {
    pub fn total_tiles(&self) -> usize {
        self.spreads.iter().map(|s| s.tiles).sum()
    }

    pub fn total_labeled(&self) -> usize {
        self.spreads.iter().map(|s| s.labeled).sum()
    }

    pub fn total_background(&self) -> usize {
        self.total_tiles() - self.total_labeled()
    }
}

/// Number of tiles to label: `label_frac * tile_count`, rounded half to even
pub fn label_count(label_frac: f64, tile_count: usize) -> usize {
    let count = (label_frac * tile_count as f64).round_ties_even();
    (count.max(0.0) as usize).min(tile_count)
}

/// `<faces_dir>/<spread>_waldo.png`
pub fn face_path(faces_dir: &Path, spread: &str) -> PathBuf {
    faces_dir.join(format!("{}{}", spread, FACE_SUFFIX))
}

/// `<spread>__<tile_stem>`, shared by the output image and its label file
pub fn output_stem(spread: &str, tile_stem: &str) -> String {
    format!("{}__{}", spread, tile_stem)
}

/// Dataset manifest lives next to the images directory
pub fn dataset_manifest_path(out_images: &Path) -> PathBuf {
    out_images
        .parent()
        .map(|parent| parent.join(MANIFEST_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(MANIFEST_FILE_NAME))
}

pub struct FacePaster {
    config: PasteConfig,
    rng: StdRng,
}

impl FacePaster {
    pub fn new(config: PasteConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { config, rng }
    }

    fn console_verbose(&self) -> bool {
        self.config.verbose && !self.config.json_progress
    }

    fn report_skip(&self, spread: &str, reason: &SkipReason) {
        if self.config.json_progress {
            JsonMessage::skipped(spread, reason.description(), reason.path());
        } else {
            match reason {
                SkipReason::MissingSpreadDir(path) => {
                    warn_println(&format!("Missing spread dir: {}", path.display()))
                }
                SkipReason::MissingFace(path) => warn_println(&format!(
                    "Missing face PNG for spread {}: {}",
                    spread,
                    path.display()
                )),
            }
        }
    }

    /// Process every configured spread in order and write the dataset manifest
    pub fn run(&mut self) -> Result<PasteSummary> {
        if !self.config.dry_run {
            for dir in [&self.config.out_images, &self.config.out_labels] {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            }
        }

        let mut spreads = Vec::new();
        let mut skipped = Vec::new();
        let mut rows = Vec::new();

        for spread in self.config.spread_ids.clone() {
            let spread_dir = self.config.crops_dir.join(&spread);
            let face = face_path(&self.config.faces_dir, &spread);

            let reason = if !spread_dir.is_dir() {
                Some(SkipReason::MissingSpreadDir(spread_dir.clone()))
            } else if !face.exists() {
                Some(SkipReason::MissingFace(face.clone()))
            } else {
                None
            };

            if let Some(reason) = reason {
                self.report_skip(&spread, &reason);
                skipped.push(SkippedSpread { spread, reason });
                continue;
            }

            let summary = self.process_spread(&spread, &spread_dir, &face, &mut rows)?;
            spreads.push(summary);
        }

        let manifest_path = dataset_manifest_path(&self.config.out_images);
        if !self.config.dry_run {
            write_manifest(&manifest_path, &DATASET_MANIFEST_HEADER, &rows)?;
        }

        Ok(PasteSummary {
            spreads,
            skipped,
            rows,
            manifest_path,
        })
    }

    fn process_spread(
        &mut self,
        spread: &str,
        spread_dir: &Path,
        face_path: &Path,
        rows: &mut Vec<DatasetManifestRow>,
    ) -> Result<SpreadSummary> {
        let face = load_rgba(face_path)?;
        let tiles = list_files_sorted(spread_dir, &self.config.tile_extensions)?;
        let n_tiles = tiles.len();
        let n_label = label_count(self.config.label_frac, n_tiles);

        let selected: HashSet<usize> = index::sample(&mut self.rng, n_tiles, n_label)
            .into_iter()
            .collect();

        verbose_println(
            self.console_verbose(),
            &format!(
                "Spread {}: {} tiles, labeling {} (face {}x{})",
                spread,
                n_tiles,
                n_label,
                face.width(),
                face.height()
            ),
        );

        let progress = progress_bar_for(n_tiles as u64, self.config.json_progress);
        progress.set_message(format!("spread {}", spread));

        for (i, tile_path) in tiles.iter().enumerate() {
            let result = self.process_tile(spread, tile_path, &face, selected.contains(&i));
            let row = abandon_on_error(&progress, result)?;

            progress.inc(1);
            if self.config.json_progress {
                JsonMessage::progress(i + 1, n_tiles, format!("{} {}", spread, row.src_tile));
            }
            rows.push(row);
        }
        progress.finish_and_clear();

        Ok(SpreadSummary {
            spread: spread.to_string(),
            tiles: n_tiles,
            labeled: n_label,
        })
    }

    /// Write one output tile (pasted or background) and return its manifest row
    fn process_tile(
        &mut self,
        spread: &str,
        tile_path: &Path,
        face: &RgbaImage,
        labeled: bool,
    ) -> Result<DatasetManifestRow> {
        let mut tile = load_rgb(tile_path)?;
        if tile.width() != self.config.tile_size || tile.height() != self.config.tile_size {
            return Err(anyhow::anyhow!(
                "Tile {} is {}x{}, expected {}x{}",
                tile_path.display(),
                tile.width(),
                tile.height(),
                self.config.tile_size,
                self.config.tile_size
            ));
        }

        let tile_stem = file_stem_string(tile_path)?;
        let src_tile = tile_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| tile_stem.clone());
        let stem = output_stem(spread, &tile_stem);
        let out_name = format!("{}.{}", stem, self.config.output_format.extension());
        let out_image = self.config.out_images.join(&out_name);
        let out_label = self.config.out_labels.join(format!("{}.txt", stem));

        if !labeled {
            if !self.config.dry_run {
                save_image(&tile, &out_image, self.config.output_format)?;
                // A background tile must not keep a label from an earlier run
                if out_label.exists() {
                    fs::remove_file(&out_label).with_context(|| {
                        format!("Failed to remove stale label: {}", out_label.display())
                    })?;
                }
            }

            return Ok(DatasetManifestRow::background(spread, &src_tile, &out_name));
        }

        let region = paste_face_on_tile(
            &mut self.rng,
            &mut tile,
            face,
            self.config.scale,
            self.config.tile_size,
        )
        .with_context(|| format!("Failed to paste face onto {}", tile_path.display()))?;
        let bbox = NormalizedBox::from_region(&region, self.config.tile_size);

        if !self.config.dry_run {
            save_image(&tile, &out_image, self.config.output_format)?;
            let line = LabelLine {
                class_id: self.config.class_id,
                bbox,
            };
            write_label_file(&out_label, &[line])?;
        }

        Ok(DatasetManifestRow::labeled(
            spread, &src_tile, &out_name, &region, &bbox,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_count() {
        assert_eq!(label_count(0.98, 100), 98);
        assert_eq!(label_count(0.0, 100), 0);
        assert_eq!(label_count(1.0, 9), 9);
        assert_eq!(label_count(0.5, 0), 0);
        // Halves round to even
        assert_eq!(label_count(0.5, 5), 2);
        assert_eq!(label_count(0.5, 7), 4);
    }

    #[test]
    fn test_naming_conventions() {
        assert_eq!(
            face_path(Path::new("data/faces"), "3"),
            PathBuf::from("data/faces/3_waldo.png")
        );
        assert_eq!(output_stem("3", "3_r003_c011"), "3__3_r003_c011");
        assert_eq!(
            dataset_manifest_path(Path::new("data/dataset/images/train")),
            PathBuf::from("data/dataset/images/manifest.csv")
        );
        assert_eq!(
            dataset_manifest_path(Path::new("images")),
            PathBuf::from("manifest.csv")
        );
    }

    #[test]
    fn test_sample_without_replacement_is_deterministic() {
        let draw = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut picked = index::sample(&mut rng, 100, 98).into_vec();
            picked.sort_unstable();
            picked
        };

        let first = draw(0);
        assert_eq!(first, draw(0));
        assert_eq!(first.len(), 98);
        first.windows(2).for_each(|w| assert!(w[0] < w[1]));
    }

    #[test]
    fn test_summary_totals() {
        let summary = PasteSummary {
            spreads: vec![
                SpreadSummary {
                    spread: "1".to_string(),
                    tiles: 100,
                    labeled: 98,
                },
                SpreadSummary {
                    spread: "2".to_string(),
                    tiles: 9,
                    labeled: 9,
                },
            ],
            skipped: Vec::new(),
            rows: Vec::new(),
            manifest_path: PathBuf::from("manifest.csv"),
        };
        assert_eq!(summary.total_tiles(), 109);
        assert_eq!(summary.total_labeled(), 107);
        assert_eq!(summary.total_background(), 2);
    }
}
