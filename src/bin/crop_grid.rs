use anyhow::Result;
use clap::Parser;
use console::style;
use std::time::Instant;

use tile_dataset::cli::CropArgs;
use tile_dataset::cropper::{CropConfig, GridCropper};
use tile_dataset::json_output::JsonMessage;
use tile_dataset::utils::{format_duration, validate_crop_inputs, verbose_println};

fn main() -> Result<()> {
    let start_time = Instant::now();
    let mut args = CropArgs::parse();
    args.load_and_merge_config()?;
    validate_crop_inputs(&args)?;

    let config = CropConfig::from(&args);

    if !config.json_progress {
        println!("{}", style("Grid Cropper").bold().blue());
        println!();
    }

    if config.verbose && !config.json_progress {
        println!("{}", style("Configuration:").bold());
        println!("  Image: {}", args.image.display());
        println!("  Output root: {}", config.out_dir.display());
        println!("  Tile size: {}", config.tile);
        println!("  Format: {}", config.format.extension());
        if config.dry_run {
            println!("  {}", style("DRY RUN - no files will be written").yellow());
        }
        println!();
    }

    let cropper = GridCropper::new(config.clone());
    let result = cropper.crop_page(&args.image)?;
    let elapsed = start_time.elapsed();

    if config.json_progress {
        JsonMessage::page_cropped(
            &args.image,
            &result.page_dir,
            result.layout.cols,
            result.layout.rows,
            result.tiles.len(),
            elapsed.as_secs_f64(),
        );
        return Ok(());
    }

    verbose_println(
        config.verbose && !config.dry_run,
        &format!("Manifest: {}", result.manifest_path.display()),
    );

    let image_name = args
        .image
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.image.display().to_string());

    println!(
        "{} {}: {} tiles ({} cols x {} rows) → {} {}",
        style("[OK]").green().bold(),
        image_name,
        result.tiles.len(),
        result.layout.cols,
        result.layout.rows,
        result.page_dir.display(),
        style(format!("in {}", format_duration(elapsed))).dim()
    );

    Ok(())
}
