use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

use crate::cli::{CropArgs, PasteArgs};

/// Create a styled progress bar
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let progress_style = ProgressStyle::with_template(
        "{spinner:.blue} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg} ({eta})",
    )
    .map(|s| s.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(progress_style);
    pb
}

/// Progress bar for a loop over `total` items, hidden when output is JSON
pub fn progress_bar_for(total: u64, json_progress: bool) -> ProgressBar {
    if json_progress {
        ProgressBar::hidden()
    } else {
        create_progress_bar(total)
    }
}

/// Leave the bar drawn at its current position when `result` is an error
pub fn abandon_on_error<T>(progress: &ProgressBar, result: Result<T>) -> Result<T> {
    if result.is_err() {
        progress.abandon();
    }
    result
}

/// Format duration in a human-readable way
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", mins, secs)
    } else if total_secs > 0 {
        format!("{}.{:03}s", total_secs, millis)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Validate grid cropper arguments
pub fn validate_crop_inputs(args: &CropArgs) -> Result<()> {
    if args.tile == 0 {
        return Err(anyhow::anyhow!("Tile size must be greater than 0"));
    }

    if args.image.file_stem().is_none() {
        return Err(anyhow::anyhow!(
            "Cannot extract a file stem from image path: {}",
            args.image.display()
        ));
    }

    Ok(())
}

/// Validate face paster arguments
pub fn validate_paste_inputs(args: &PasteArgs) -> Result<()> {
    if args.tile_size == 0 {
        return Err(anyhow::anyhow!("Tile size must be greater than 0"));
    }

    if !(0.0..=1.0).contains(&args.label_frac) {
        return Err(anyhow::anyhow!(
            "Label fraction must be between 0.0 and 1.0, got: {}",
            args.label_frac
        ));
    }

    if !(args.scale_min > 0.0 && args.scale_min <= args.scale_max) || !args.scale_max.is_finite() {
        return Err(anyhow::anyhow!(
            "Invalid scale range {}..{}: expected 0 < scale_min <= scale_max",
            args.scale_min,
            args.scale_max
        ));
    }

    if args.parse_spread_ids().is_empty() {
        return Err(anyhow::anyhow!("No valid spread ids specified"));
    }

    if args.parse_tile_extensions().is_empty() {
        return Err(anyhow::anyhow!("No valid tile extensions specified"));
    }

    Ok(())
}

/// Get file extension in lowercase
pub fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a file has one of the specified extensions
pub fn has_valid_extension(path: &Path, extensions: &[String]) -> bool {
    if let Some(ext) = get_file_extension(path) {
        extensions.contains(&ext)
    } else {
        false
    }
}

/// File stem as an owned string
pub fn file_stem_string(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow::anyhow!("Cannot extract file stem from: {}", path.display()))
}

/// List files directly inside `dir` with one of `extensions`, sorted by file name
pub fn list_files_sorted(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry
            .with_context(|| format!("Failed to read directory entry in {}", dir.display()))?;
        let path = entry.path();

        if path.is_file() && has_valid_extension(path, extensions) {
            files.push(path.to_path_buf());
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Print verbose information if verbose mode is enabled
pub fn verbose_println(verbose: bool, message: &str) {
    if verbose {
        println!("{} {}", style("[VERBOSE]").dim(), message);
    }
}

/// Print warning message
pub fn warn_println(message: &str) {
    println!("{} {}", style("[WARNING]").yellow().bold(), message);
}
