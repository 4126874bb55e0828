use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::Level;

use badge_processor::cli::{BatchArgs, Cli, Command, CommonArgs, SingleArgs};
use badge_processor::image_processing::report::BatchReport;
use badge_processor::utils::{create_progress_bar, format_duration, verbose_println};
use badge_processor::{detector_from_model, BadgeEngine, BadgeError, BatchItem, JsonMessage};

fn main() -> Result<()> {
    let mut cli = Cli::parse();

    init_tracing(cli.command.common().verbose);
    cli.command.common_mut().load_and_merge_config()?;

    match cli.command {
        Command::Single(args) => run_single(args),
        Command::Batch(args) => run_batch(args),
    }
}

/// Log to stderr so stdout stays clean for output and JSON progress
fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_banner() {
    println!("{}", style("Badge Processor").bold().blue());
    println!("{}", style("Face-centered name badges from portrait photos").dim());
    println!();
}

fn build_engine(common: &CommonArgs) -> Result<BadgeEngine> {
    let config = common.badge_config().map_err(anyhow::Error::msg)?;
    let detector = detector_from_model(common.face_model.as_deref())?;

    // stdout carries JSON lines under --json-progress
    tracing::debug!(
        size = %format!("{}x{}", config.target_width, config.target_height),
        crop_mode = ?config.crop_mode,
        label_style = ?config.label_style,
        zoom_factor = config.zoom_factor,
        padding_ratio = config.padding_ratio,
        font = %config.font,
        face_detector = detector.name(),
        jobs = config.effective_jobs(),
        extensions = ?config.extensions,
        "configuration"
    );

    BadgeEngine::new(config, detector).context("Failed to initialize badge engine")
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

fn run_single(args: SingleArgs) -> Result<()> {
    let start_time = Instant::now();

    if !args.image.is_file() {
        return Err(BadgeError::InvalidInput(format!(
            "image file not found: {}",
            args.image.display()
        ))
        .into());
    }
    if args.name.trim().is_empty() {
        return Err(BadgeError::InvalidInput("a non-empty --name is required".into()).into());
    }

    print_banner();
    let engine = build_engine(&args.common)?;

    let image_bytes = fs::read(&args.image)
        .with_context(|| format!("Failed to read image {}", args.image.display()))?;

    verbose_println(
        args.common.verbose,
        &format!("Processing {} for \"{}\"", args.image.display(), args.name),
    );

    let png = engine
        .process(&image_bytes, &args.name)
        .with_context(|| format!("Failed to create badge from {}", args.image.display()))?;

    write_output(&args.output, &png)?;

    println!(
        "{} {} ({})",
        style("✓ Badge written to").bold().green(),
        style(args.output.display()).bold(),
        format_duration(start_time.elapsed())
    );
    Ok(())
}

fn run_batch(args: BatchArgs) -> Result<()> {
    let start_time = Instant::now();
    let json = args.json_progress;

    if !args.archive.is_file() {
        return Err(BadgeError::InvalidInput(format!(
            "archive not found: {}",
            args.archive.display()
        ))
        .into());
    }

    if !json {
        print_banner();
    }
    let engine = build_engine(&args.common)?;

    let archive_bytes = fs::read(&args.archive)
        .with_context(|| format!("Failed to read archive {}", args.archive.display()))?;

    let progress_bar = create_progress_bar(0);
    if json {
        progress_bar.finish_and_clear();
    }

    let on_item = |item: &BatchItem, completed: usize, total: usize| {
        if json {
            JsonMessage::for_item(item).emit();
            JsonMessage::progress(completed, total, item.source_filename.clone());
        } else {
            progress_bar.set_length(total as u64);
            progress_bar.set_position(completed as u64);
            progress_bar.set_message(item.derived_name.clone());
        }
    };

    let outcome = match engine.process_archive_with_progress(&archive_bytes, on_item) {
        Ok(outcome) => outcome,
        Err(e) => {
            progress_bar.abandon();
            return Err(e).with_context(|| {
                format!("Failed to process archive {}", args.archive.display())
            });
        }
    };
    progress_bar.finish_and_clear();

    write_output(&args.output, &outcome.archive)?;

    let stats = &outcome.stats;
    if json {
        JsonMessage::summary(stats).emit();
        return Ok(());
    }

    println!("{}", style("Processing complete!").bold().green());
    println!(
        "  Badges created: {}",
        style(stats.successful).bold().green()
    );
    if stats.failed > 0 {
        println!("  Failed: {}", style(stats.failed).bold().red());
    }
    if stats.collisions > 0 {
        println!(
            "  Name collisions: {} (later files replaced earlier ones)",
            style(stats.collisions).bold().yellow()
        );
    }

    if args.report {
        BatchReport::new(&outcome.items, stats).print();
    } else if stats.failed > 0 {
        println!();
        println!("{}", style("Errors encountered:").bold().red());
        for (index, item) in outcome.items.iter().filter(|i| !i.is_success()).enumerate() {
            println!(
                "  {}: {} - {}",
                style(format!("#{}", index + 1)).dim(),
                style(&item.source_filename).bold().red(),
                item.failure_reason().unwrap_or_default()
            );
        }
    }

    println!();
    println!("{}", style("Performance:").bold().blue());
    println!(
        "  Total processing time: {}",
        style(format_duration(start_time.elapsed())).bold()
    );
    println!(
        "  Average time per image: {}",
        style(format_duration(stats.duration / stats.total.max(1) as u32)).dim()
    );
    println!();
    println!(
        "{} {}",
        style("Output archive:").bold().green(),
        args.output.display()
    );

    Ok(())
}
