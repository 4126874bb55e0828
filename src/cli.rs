use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::image_processing::annotate::LabelStyle;
use crate::image_processing::crop::CropMode;
use crate::image_processing::BadgeConfig;

#[derive(Parser, Debug)]
#[command(
    name = "badge-processor",
    version,
    about = "Turn portrait photos and names into fixed-size name badges",
    long_about = "
Badge Processor

Crops each portrait around the detected face (or the image center when no face
is found), scales it onto a fixed-size canvas and draws the person's name on a
semi-transparent plate. Single photos are processed directly; ZIP archives are
processed in parallel with names taken from the filenames.

Crop modes:
• basic - padded square around the face (square sizes only)
• zoom  - tighter face crop matching any target aspect ratio

Example Usage:
  # One badge, default 512x512 corner label
  badge-processor single -i jane.jpg -n \"Jane Doe\" -o jane_badge.png

  # Zoomed portrait badges for a whole team, with a report table
  badge-processor batch -a team.zip -o badges.zip --crop-mode zoom --size 400x600 --report

  # Face detection with a SeetaFace model (needs --features face-detection)
  badge-processor batch -a team.zip -o badges.zip --face-model seeta_fd_frontal_v1.0.bin

  # Settings from a JSON file, size overridden on the command line
  badge-processor batch -a team.zip -o badges.zip --config badge.json --size 256x256"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create one badge from a photo and a full name
    Single(SingleArgs),
    /// Create badges for every image in a ZIP archive
    Batch(BatchArgs),
}

impl Command {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Command::Single(args) => &args.common,
            Command::Batch(args) => &args.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut CommonArgs {
        match self {
            Command::Single(args) => &mut args.common,
            Command::Batch(args) => &mut args.common,
        }
    }
}

#[derive(Args, Debug)]
pub struct SingleArgs {
    /// Portrait photo (PNG, JPEG or WebP)
    #[arg(short = 'i', long = "image", value_name = "FILE")]
    pub image: PathBuf,

    /// Full name of the person; shortened to "First L." on the badge
    #[arg(short = 'n', long = "name", value_name = "NAME")]
    pub name: String,

    /// Where to write the PNG badge
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: PathBuf,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// ZIP archive of photos named after the people in them (e.g. Jane_Doe.jpg)
    #[arg(short = 'a', long = "archive", value_name = "FILE")]
    pub archive: PathBuf,

    /// Where to write the ZIP archive of badges
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: PathBuf,

    /// Display a table with the outcome of every image at the end
    #[arg(long = "report")]
    pub report: bool,

    /// Emit progress as JSON lines on stdout instead of a progress bar
    #[arg(long = "json-progress")]
    pub json_progress: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Rendering options shared by both commands. Unset options fall back to
/// the `--config` file and then to the built-in defaults.
#[derive(Args, Debug, Default, Clone)]
pub struct CommonArgs {
    /// Badge size (format: WIDTHxHEIGHT, e.g., 512x512)
    #[arg(short = 's', long = "size", value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Crop policy
    #[arg(short = 'm', long = "crop-mode", value_name = "MODE")]
    pub crop_mode: Option<CropMode>,

    /// Label placement; defaults to corner for basic and banner for zoom
    #[arg(short = 'l', long = "label-style", value_name = "STYLE")]
    pub label_style: Option<LabelStyle>,

    /// How tightly zoom mode frames the face (smaller zooms in more, default 1.8)
    #[arg(long = "zoom-factor", value_name = "FACTOR")]
    pub zoom_factor: Option<f64>,

    /// Padding around the face in basic mode, relative to face size (default 0.4)
    #[arg(long = "padding-ratio", value_name = "RATIO")]
    pub padding_ratio: Option<f64>,

    /// Font specification for the name label. Supports three formats:
    /// - Font name: "DejaVu Sans" (searches system fonts)
    /// - Font filename: "DejaVuSans-Bold.ttf" (searches in font directories)
    /// - Full path: "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf" (loads directly)
    ///
    /// Names and filenames that match no system font fall back to the bundled
    /// DejaVu Sans Bold. A full path that cannot be read is an error.
    #[arg(long = "font", value_name = "FONT")]
    pub font: Option<String>,

    /// SeetaFace frontal face model used for face detection
    #[arg(long = "face-model", value_name = "FILE")]
    pub face_model: Option<PathBuf>,

    /// Comma-separated list of image extensions to process in archives
    #[arg(long = "extensions", value_name = "LIST")]
    pub extensions: Option<String>,

    /// Number of parallel processing jobs (0 = auto-detect CPU cores)
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub jobs: Option<usize>,

    /// JSON file with default settings; command-line flags take precedence
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Enable verbose output with detailed progress information
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl CommonArgs {
    /// Resolve the options into an engine configuration.
    pub fn badge_config(&self) -> Result<BadgeConfig, String> {
        let crop_mode = self.crop_mode.unwrap_or_default();
        let mut config = match crop_mode {
            CropMode::Basic => BadgeConfig::default(),
            CropMode::Zoom => BadgeConfig::zoom(),
        };

        if let Some(size) = &self.size {
            let (width, height) = parse_size(size)?;
            config.target_width = width;
            config.target_height = height;
        }
        if let Some(style) = self.label_style {
            config.label_style = style;
        }
        if let Some(zoom) = self.zoom_factor {
            config.zoom_factor = zoom;
        }
        if let Some(padding) = self.padding_ratio {
            config.padding_ratio = padding;
        }
        if let Some(font) = &self.font {
            config.font = font.clone();
        }
        if let Some(extensions) = &self.extensions {
            config.extensions = parse_extensions(extensions);
        }
        if let Some(jobs) = self.jobs {
            config.parallel_jobs = jobs;
        }

        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }
}

/// Parse the size string into width and height
pub fn parse_size(size: &str) -> Result<(u32, u32), String> {
    let parts: Vec<&str> = size.trim().split(['x', 'X']).collect();
    if parts.len() != 2 {
        return Err(format!(
            "Invalid size format '{}'. Use WIDTHxHEIGHT (e.g., 512x512)",
            size
        ));
    }

    let width = parts[0]
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("Invalid width: '{}'", parts[0]))?;
    let height = parts[1]
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("Invalid height: '{}'", parts[1]))?;

    if width == 0 || height == 0 {
        return Err(format!("Width and height must be positive, got {}x{}", width, height));
    }

    Ok((width, height))
}

/// Split a comma-separated extension list, normalized to lowercase without dots
pub fn parse_extensions(list: &str) -> Vec<String> {
    list.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}
