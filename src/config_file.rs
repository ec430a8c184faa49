use crate::cli::{CropArgs, PasteArgs, TileFormat};
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Shared configuration file for both tools
///
/// ```json
/// {
///   "name": "waldo-train",
///   "crop": { "out": "data/crops_128", "tile": 128, "format": "png" },
///   "paste": { "spreadIds": "1,2,3", "labelFrac": 0.98, "seed": 0 }
/// }
/// ```
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub name: Option<String>,
    pub crop: Option<CropConfigJson>,
    pub paste: Option<PasteConfigJson>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CropConfigJson {
    pub out: Option<String>,
    pub tile: Option<u32>,
    pub format: Option<String>,
    pub verbose: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasteConfigJson {
    pub crops_dir: Option<String>,
    pub faces_dir: Option<String>,
    pub out_images: Option<String>,
    pub out_labels: Option<String>,
    pub spread_ids: Option<String>,
    pub label_frac: Option<f64>,
    pub seed: Option<u64>,
    pub tile_size: Option<u32>,
    pub scale_min: Option<f64>,
    pub scale_max: Option<f64>,
    pub class_id: Option<u32>,
    pub tile_ext: Option<String>,
    pub format: Option<String>,
    pub report: Option<bool>,
    pub verbose: Option<bool>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// True when `flag` was given explicitly, either as `--flag value` or `--flag=value`
fn given_on_cli(cli_args: &[String], flags: &[&str]) -> bool {
    cli_args.iter().any(|arg| {
        flags.iter().any(|flag| {
            arg == flag
                || arg
                    .strip_prefix(flag)
                    .is_some_and(|rest| rest.starts_with('='))
        })
    })
}

fn parse_format(value: &str) -> Result<TileFormat> {
    TileFormat::from_str(value, true)
        .map_err(|_| anyhow::anyhow!("Invalid format '{}' in config file. Valid formats: png, jpg, jpeg", value))
}

impl CropArgs {
    /// Load configuration from a JSON file and merge with command-line arguments
    /// Command-line arguments take precedence over config file values
    pub fn load_and_merge_config(&mut self) -> Result<()> {
        if let Some(config_path) = self.config_file.clone() {
            let config = ConfigFile::load(&config_path)?;
            if let Some(crop) = config.crop {
                let cli_args = std::env::args().collect::<Vec<_>>();
                self.merge_from_config(crop, &cli_args)?;
            }

            if self.verbose && !self.json_progress {
                eprintln!("Loaded configuration from: {}", config_path.display());
            }
        }
        Ok(())
    }

    pub fn merge_from_config(&mut self, config: CropConfigJson, cli_args: &[String]) -> Result<()> {
        if !given_on_cli(cli_args, &["--out"]) {
            if let Some(out) = config.out {
                self.out = PathBuf::from(out);
            }
        }

        if !given_on_cli(cli_args, &["--tile"]) {
            if let Some(tile) = config.tile {
                self.tile = tile;
            }
        }

        if !given_on_cli(cli_args, &["--format"]) {
            if let Some(format) = config.format {
                self.format = parse_format(&format)?;
            }
        }

        if !self.verbose {
            self.verbose = config.verbose.unwrap_or(false);
        }

        Ok(())
    }
}

impl PasteArgs {
    /// Load configuration from a JSON file and merge with command-line arguments
    /// Command-line arguments take precedence over config file values
    pub fn load_and_merge_config(&mut self) -> Result<()> {
        if let Some(config_path) = self.config_file.clone() {
            let config = ConfigFile::load(&config_path)?;
            if let Some(paste) = config.paste {
                let cli_args = std::env::args().collect::<Vec<_>>();
                self.merge_from_config(paste, &cli_args)?;
            }

            if self.verbose && !self.json_progress {
                eprintln!("Loaded configuration from: {}", config_path.display());
            }
        }
        Ok(())
    }

    pub fn merge_from_config(&mut self, config: PasteConfigJson, cli_args: &[String]) -> Result<()> {
        // Paths
        if !given_on_cli(cli_args, &["--crops_dir"]) {
            if let Some(dir) = config.crops_dir {
                self.crops_dir = PathBuf::from(dir);
            }
        }

        if !given_on_cli(cli_args, &["--faces_dir"]) {
            if let Some(dir) = config.faces_dir {
                self.faces_dir = PathBuf::from(dir);
            }
        }

        if !given_on_cli(cli_args, &["--out_images"]) {
            if let Some(dir) = config.out_images {
                self.out_images = PathBuf::from(dir);
            }
        }

        if !given_on_cli(cli_args, &["--out_labels"]) {
            if let Some(dir) = config.out_labels {
                self.out_labels = PathBuf::from(dir);
            }
        }

        // Selection and placement
        if !given_on_cli(cli_args, &["--spread_ids"]) {
            if let Some(ids) = config.spread_ids {
                self.spread_ids_str = ids;
            }
        }

        if !given_on_cli(cli_args, &["--label_frac"]) {
            if let Some(frac) = config.label_frac {
                self.label_frac = frac;
            }
        }

        if !given_on_cli(cli_args, &["--seed"]) {
            if let Some(seed) = config.seed {
                self.seed = seed;
            }
        }

        if !given_on_cli(cli_args, &["--tile_size"]) {
            if let Some(size) = config.tile_size {
                self.tile_size = size;
            }
        }

        if !given_on_cli(cli_args, &["--scale_min"]) {
            if let Some(scale) = config.scale_min {
                self.scale_min = scale;
            }
        }

        if !given_on_cli(cli_args, &["--scale_max"]) {
            if let Some(scale) = config.scale_max {
                self.scale_max = scale;
            }
        }

        if !given_on_cli(cli_args, &["--class_id"]) {
            if let Some(class_id) = config.class_id {
                self.class_id = class_id;
            }
        }

        if !given_on_cli(cli_args, &["--tile_ext"]) {
            if let Some(ext) = config.tile_ext {
                self.tile_ext_str = ext;
            }
        }

        if !given_on_cli(cli_args, &["--format"]) {
            if let Some(format) = config.format {
                self.format = parse_format(&format)?;
            }
        }

        // Boolean flags - only apply if currently false (default)
        if !self.report {
            self.report = config.report.unwrap_or(false);
        }

        if !self.verbose {
            self.verbose = config.verbose.unwrap_or(false);
        }

        Ok(())
    }
}
