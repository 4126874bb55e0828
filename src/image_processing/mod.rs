pub mod annotate;
pub mod archive;
pub mod batch;
pub mod crop;
pub mod name;
pub mod orientation;
pub mod report;
pub mod resize;
#[cfg(feature = "face-detection")]
pub mod rustface_backend;
pub mod subject_detection;

use ab_glyph::FontArc;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::BadgeError;
use crate::utils::DEFAULT_EXTENSIONS;
use annotate::{composite, load_font, LabelStyle, DEFAULT_FONT};
use batch::{BatchItem, BatchOutcome};
use crop::{compute_crop_rectangle, CropMode, CropParams, DEFAULT_PADDING_RATIO, DEFAULT_ZOOM_FACTOR};
use name::format_name;
use orientation::{apply_orientation, read_exif_orientation};
use subject_detection::{detect_face, FaceDetector};

/// Largest accepted target dimension, in pixels.
pub const MAX_TARGET_DIMENSION: u32 = 4000;

/// Badge rendering settings, fixed for the lifetime of a [`BadgeEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgeConfig {
    pub target_width: u32,
    pub target_height: u32,
    pub crop_mode: CropMode,
    pub label_style: LabelStyle,
    pub zoom_factor: f64,
    pub padding_ratio: f64,
    /// Font name, filename or absolute path.
    pub font: String,
    /// Lowercase extensions accepted inside batch archives.
    pub extensions: Vec<String>,
    /// Worker threads for batch processing; 0 uses every CPU.
    pub parallel_jobs: usize,
}

impl Default for BadgeConfig {
    /// 512x512 padded square with a corner label.
    fn default() -> Self {
        Self {
            target_width: 512,
            target_height: 512,
            crop_mode: CropMode::Basic,
            label_style: LabelStyle::Corner,
            zoom_factor: DEFAULT_ZOOM_FACTOR,
            padding_ratio: DEFAULT_PADDING_RATIO,
            font: DEFAULT_FONT.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            parallel_jobs: 0,
        }
    }
}

impl BadgeConfig {
    /// 512x512 face-zoomed crop with a bottom banner.
    pub fn zoom() -> Self {
        Self {
            crop_mode: CropMode::Zoom,
            label_style: LabelStyle::Banner,
            ..Self::default()
        }
    }

    pub fn crop_params(&self) -> CropParams {
        CropParams {
            padding_ratio: self.padding_ratio,
            zoom_factor: self.zoom_factor,
        }
    }

    /// Number of worker threads the engine will use.
    pub fn effective_jobs(&self) -> usize {
        if self.parallel_jobs == 0 {
            num_cpus::get()
        } else {
            self.parallel_jobs
        }
    }

    pub fn validate(&self) -> Result<(), BadgeError> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(BadgeError::InvalidConfig(format!(
                "target size must be positive, got {}x{}",
                self.target_width, self.target_height
            )));
        }
        if self.target_width > MAX_TARGET_DIMENSION || self.target_height > MAX_TARGET_DIMENSION {
            return Err(BadgeError::InvalidConfig(format!(
                "target size {}x{} exceeds the {} px limit",
                self.target_width, self.target_height, MAX_TARGET_DIMENSION
            )));
        }
        if !(self.zoom_factor.is_finite() && self.zoom_factor > 0.0) {
            return Err(BadgeError::InvalidConfig(format!(
                "zoom factor must be positive, got {}",
                self.zoom_factor
            )));
        }
        if !(self.padding_ratio.is_finite() && self.padding_ratio >= 0.0) {
            return Err(BadgeError::InvalidConfig(format!(
                "padding ratio must not be negative, got {}",
                self.padding_ratio
            )));
        }
        if self.extensions.is_empty() {
            return Err(BadgeError::InvalidConfig("no image extensions configured".into()));
        }
        if self.crop_mode == CropMode::Basic && self.target_width != self.target_height {
            return Err(BadgeError::InvalidConfig(format!(
                "basic crop mode needs a square target, got {}x{}; use zoom mode instead",
                self.target_width, self.target_height
            )));
        }
        Ok(())
    }
}

/// Loaded, immutable processing context: configuration, face detector, font
/// and worker pool. Build once and share by reference.
pub struct BadgeEngine {
    config: BadgeConfig,
    detector: Arc<dyn FaceDetector>,
    font: FontArc,
    pool: rayon::ThreadPool,
}

impl BadgeEngine {
    pub fn new(config: BadgeConfig, detector: Arc<dyn FaceDetector>) -> Result<Self, BadgeError> {
        config.validate()?;
        let font = load_font(&config.font)?;

        // Dedicated pool so several engines can coexist in one process
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.effective_jobs())
            .thread_name(|index| format!("badge-worker-{}", index))
            .build()
            .map_err(|e| BadgeError::InvalidConfig(format!("failed to build thread pool: {}", e)))?;

        tracing::debug!(
            detector = detector.name(),
            jobs = pool.current_num_threads(),
            "badge engine ready"
        );

        Ok(Self {
            config,
            detector,
            font,
            pool,
        })
    }

    pub fn config(&self) -> &BadgeConfig {
        &self.config
    }

    pub fn detector_name(&self) -> &'static str {
        self.detector.name()
    }

    pub(crate) fn pool(&self) -> &rayon::ThreadPool {
        &self.pool
    }

    /// Turn one photo and a full name into PNG badge bytes.
    ///
    /// An empty name fails with [`BadgeError::InvalidName`]; every later
    /// failure is wrapped in [`BadgeError::Processing`].
    pub fn process(&self, image_bytes: &[u8], full_name: &str) -> Result<Vec<u8>, BadgeError> {
        format_name(full_name)?;
        self.render(image_bytes, full_name)
            .map_err(BadgeError::processing)
    }

    fn render(&self, image_bytes: &[u8], full_name: &str) -> Result<Vec<u8>, BadgeError> {
        let config = &self.config;

        let img = decode_image(image_bytes)?;
        let (width, height) = img.dimensions();
        tracing::debug!(width, height, "decoded image");

        let face = detect_face(self.detector.as_ref(), &img)?;

        let crop = compute_crop_rectangle(
            width,
            height,
            face.as_ref(),
            config.target_width,
            config.target_height,
            config.crop_mode,
            &config.crop_params(),
        );
        tracing::debug!(
            x = crop.x,
            y = crop.y,
            width = crop.width,
            height = crop.height,
            "computed crop"
        );

        let canvas = composite(
            &img,
            &crop,
            full_name,
            config.target_width,
            config.target_height,
            config.label_style,
            &self.font,
        )?;

        let png = encode_png(&canvas)?;
        tracing::debug!(bytes = png.len(), "encoded badge");
        Ok(png)
    }

    /// Process every supported image of a ZIP archive into a ZIP of badges.
    pub fn process_archive(&self, archive_bytes: &[u8]) -> Result<BatchOutcome, BadgeError> {
        batch::process_archive(self, archive_bytes, |_, _, _| {})
    }

    /// Like [`process_archive`](Self::process_archive), reporting each finished item.
    pub fn process_archive_with_progress<P>(
        &self,
        archive_bytes: &[u8],
        progress: P,
    ) -> Result<BatchOutcome, BadgeError>
    where
        P: Fn(&BatchItem, usize, usize) + Send + Sync,
    {
        batch::process_archive(self, archive_bytes, progress)
    }
}

/// Decode PNG/JPEG/WebP bytes into display-oriented RGB pixels.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, BadgeError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| BadgeError::Decode(e.to_string()))?;

    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(BadgeError::Decode("image has zero width or height".into()));
    }

    let orientation = read_exif_orientation(bytes);
    Ok(apply_orientation(decoded.to_rgb8(), orientation))
}

/// Encode a canvas as PNG bytes.
pub fn encode_png(canvas: &RgbImage) -> Result<Vec<u8>, BadgeError> {
    let (width, height) = canvas.dimensions();
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(canvas.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e| BadgeError::Encode(e.to_string()))?;
    Ok(buffer)
}
