use anyhow::Result;
use clap::Parser;
use console::style;
use prettytable::{format, Cell, Row, Table};
use std::time::Instant;

use tile_dataset::cli::PasteArgs;
use tile_dataset::json_output::JsonMessage;
use tile_dataset::paster::{FacePaster, PasteConfig, PasteSummary};
use tile_dataset::utils::{format_duration, validate_paste_inputs, verbose_println};

/// Per-spread counts, skipped spreads listed last
fn print_report(summary: &PasteSummary) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);

    table.add_row(Row::new(vec![
        Cell::new("Spread"),
        Cell::new("Tiles"),
        Cell::new("Labeled"),
        Cell::new("Background"),
        Cell::new("Status"),
    ]));

    for spread in &summary.spreads {
        table.add_row(Row::new(vec![
            Cell::new(&spread.spread),
            Cell::new(&spread.tiles.to_string()),
            Cell::new(&spread.labeled.to_string()),
            Cell::new(&spread.background().to_string()),
            Cell::new("✓"),
        ]));
    }

    for skipped in &summary.skipped {
        table.add_row(Row::new(vec![
            Cell::new(&skipped.spread),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new(&format!("✗ {}", skipped.reason.description())),
        ]));
    }

    println!();
    table.printstd();
    println!();
}

fn main() -> Result<()> {
    let start_time = Instant::now();
    let mut args = PasteArgs::parse();
    args.load_and_merge_config()?;
    validate_paste_inputs(&args)?;

    let config = PasteConfig::from(&args);
    let console_output = !config.json_progress;

    if console_output {
        println!("{}", style("Face Paster").bold().blue());
        println!();
    }

    if config.verbose && console_output {
        println!("{}", style("Configuration:").bold());
        println!("  Crops dir: {}", config.crops_dir.display());
        println!("  Faces dir: {}", config.faces_dir.display());
        println!("  Output images: {}", config.out_images.display());
        println!("  Output labels: {}", config.out_labels.display());
        println!("  Spreads: {:?}", config.spread_ids);
        println!("  Label fraction: {}", config.label_frac);
        println!("  Seed: {}", config.seed);
        println!("  Tile size: {}", config.tile_size);
        println!("  Scale: {}..={}", config.scale.min, config.scale.max);
        println!("  Tile extensions: {:?}", config.tile_extensions);
        if config.dry_run {
            println!("  {}", style("DRY RUN - no files will be written").yellow());
        }
        println!();
    }

    let mut paster = FacePaster::new(config.clone());
    let summary = paster.run()?;
    let elapsed = start_time.elapsed();

    if !console_output {
        JsonMessage::summary(
            summary.total_tiles(),
            summary.total_labeled(),
            summary.skipped.len(),
            elapsed.as_secs_f64(),
        );
        return Ok(());
    }

    verbose_println(
        config.verbose && !config.dry_run,
        &format!("Manifest: {}", summary.manifest_path.display()),
    );

    if args.report {
        print_report(&summary);
    }

    println!(
        "{} Tiles: {} | Labeled (with Waldo): {} | Background: {} {}",
        style("[DONE]").green().bold(),
        summary.total_tiles(),
        summary.total_labeled(),
        summary.total_background(),
        style(format!("in {}", format_duration(elapsed))).dim()
    );

    if !summary.skipped.is_empty() {
        println!(
            "{}",
            style(format!("ℹ {} spread(s) skipped", summary.skipped.len()))
                .bold()
                .blue()
        );
    }

    Ok(())
}
