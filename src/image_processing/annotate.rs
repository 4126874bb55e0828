use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use serde::{Deserialize, Serialize};

use super::crop::CropRectangle;
use super::name::format_name;
use super::resize::resample_crop;
use crate::error::BadgeError;

/// Font used when none is configured.
pub const DEFAULT_FONT: &str = "DejaVuSans-Bold.ttf";

/// Bundled DejaVu Sans Bold, used when no system font can be found.
const EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans-Bold.ttf");

/// Where and how the name plate is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    /// Bottom-left plate, lighter background.
    #[default]
    #[value(name = "corner")]
    Corner,
    /// Bottom-center plate, slightly larger text and darker background.
    #[value(name = "banner")]
    Banner,
}

impl LabelStyle {
    /// Font size relative to canvas width.
    pub fn font_ratio(self) -> f32 {
        match self {
            LabelStyle::Corner => 0.08,
            LabelStyle::Banner => 0.09,
        }
    }

    /// Plate padding relative to font size.
    pub fn padding_ratio(self) -> f32 {
        match self {
            LabelStyle::Corner => 0.2,
            LabelStyle::Banner => 0.3,
        }
    }

    /// Distance from the canvas edges relative to the canvas dimension.
    pub fn margin_ratio(self) -> f32 {
        match self {
            LabelStyle::Corner => 0.05,
            LabelStyle::Banner => 0.04,
        }
    }

    pub fn plate_alpha(self) -> f32 {
        match self {
            LabelStyle::Corner => 0.5,
            LabelStyle::Banner => 0.7,
        }
    }
}

/// Measured ink extents of a line of text, relative to its baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub width: f32,
    /// Distance from the baseline up to the highest ink.
    pub ascent: f32,
    /// Distance from the baseline down to the lowest ink.
    pub descent: f32,
}

impl TextMetrics {
    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }
}

/// Axis-aligned plate rectangle in canvas pixels. May extend past the canvas
/// for very long names; painting clips it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BadgeLabel {
    pub text: String,
    pub font_size_px: f32,
    /// Left edge of the text and its baseline.
    pub position: (f32, f32),
    pub background_box: LabelBox,
}

impl BadgeLabel {
    /// Place a measured label on a `canvas_width` x `canvas_height` canvas.
    pub fn layout(
        text: String,
        metrics: &TextMetrics,
        font_size_px: f32,
        canvas_width: u32,
        canvas_height: u32,
        style: LabelStyle,
    ) -> Self {
        let (canvas_w, canvas_h) = (canvas_width as f32, canvas_height as f32);
        let padding = font_size_px * style.padding_ratio();

        let plate_width = metrics.width + padding * 2.0;
        let plate_height = metrics.height() + padding * 2.0;

        let plate_x = match style {
            LabelStyle::Corner => canvas_w * style.margin_ratio(),
            LabelStyle::Banner => (canvas_w - plate_width) / 2.0,
        };
        let plate_y = canvas_h - canvas_h * style.margin_ratio() - plate_height;

        // Ink is centered in the plate when the baseline sits `ascent` below its top padding
        let position = (plate_x + padding, plate_y + padding + metrics.ascent);

        Self {
            text,
            font_size_px,
            position,
            background_box: LabelBox {
                x: plate_x,
                y: plate_y,
                width: plate_width,
                height: plate_height,
            },
        }
    }
}

/// Composite a badge: resample the crop onto a fixed-size canvas and draw
/// the formatted name on it.
pub fn composite(
    img: &RgbImage,
    crop: &CropRectangle,
    full_name: &str,
    target_width: u32,
    target_height: u32,
    style: LabelStyle,
    font: &FontArc,
) -> Result<RgbImage, BadgeError> {
    let display_name = format_name(full_name)?;
    let mut canvas = resample_crop(img, crop, target_width, target_height)?;
    let label = add_name_label(&mut canvas, display_name, font, style);

    tracing::debug!(
        text = %label.text,
        font_size = label.font_size_px,
        "drew name label"
    );

    Ok(canvas)
}

/// Draw `display_name` on the canvas with a semi-transparent dark plate behind it.
pub fn add_name_label(
    canvas: &mut RgbImage,
    display_name: String,
    font: &FontArc,
    style: LabelStyle,
) -> BadgeLabel {
    let (canvas_width, canvas_height) = canvas.dimensions();
    let font_size = canvas_width as f32 * style.font_ratio();
    let scale = PxScale::from(font_size);

    let mut metrics = measure_text(font, scale, &display_name);
    // Use the advance width imageproc will actually draw with
    let (drawn_width, _) = text_size(scale, font, &display_name);
    metrics.width = metrics.width.max(drawn_width as f32);

    let label = BadgeLabel::layout(
        display_name,
        &metrics,
        font_size,
        canvas_width,
        canvas_height,
        style,
    );

    draw_background_rect(canvas, &label.background_box, Rgb([0, 0, 0]), style.plate_alpha());

    // imageproc places the baseline at `y + ascent`
    let ascent = font.as_scaled(scale).ascent();
    let (text_x, baseline) = label.position;
    draw_text_mut(
        canvas,
        Rgb([255u8, 255u8, 255u8]),
        text_x.round() as i32,
        (baseline - ascent).round() as i32,
        scale,
        font,
        &label.text,
    );

    label
}

/// Measure the advance width and the actual ink ascent/descent of `text`.
pub fn measure_text<F: Font>(font: &F, scale: PxScale, text: &str) -> TextMetrics {
    let scaled = font.as_scaled(scale);
    let mut caret = 0.0f32;
    let mut last: Option<GlyphId> = None;
    let (mut ink_top, mut ink_bottom) = (f32::MAX, f32::MIN);

    for c in text.chars() {
        let glyph_id = scaled.glyph_id(c);
        if let Some(previous) = last {
            caret += scaled.kern(previous, glyph_id);
        }
        let glyph = glyph_id.with_scale_and_position(scale, point(caret, 0.0));
        caret += scaled.h_advance(glyph_id);
        last = Some(glyph_id);

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            ink_top = ink_top.min(bounds.min.y);
            ink_bottom = ink_bottom.max(bounds.max.y);
        }
    }

    if ink_top > ink_bottom {
        // No visible glyphs, fall back to the font's line metrics
        return TextMetrics {
            width: caret,
            ascent: scaled.ascent(),
            descent: -scaled.descent(),
        };
    }

    TextMetrics {
        width: caret,
        ascent: (-ink_top).max(0.0),
        descent: ink_bottom.max(0.0),
    }
}

/// Alpha-blend a solid color over the part of `rect` that lies on the canvas.
fn draw_background_rect(img: &mut RgbImage, rect: &LabelBox, color: Rgb<u8>, alpha: f32) {
    let (img_width, img_height) = img.dimensions();
    let alpha = alpha.clamp(0.0, 1.0);
    let inv_alpha = 1.0 - alpha;

    let x0 = rect.x.round().max(0.0) as u32;
    let y0 = rect.y.round().max(0.0) as u32;
    let x1 = ((rect.x + rect.width).round().max(0.0) as u32).min(img_width);
    let y1 = ((rect.y + rect.height).round().max(0.0) as u32).min(img_height);

    for py in y0..y1 {
        for px in x0..x1 {
            let current = img.get_pixel(px, py);
            let blended = Rgb([
                (color[0] as f32 * alpha + current[0] as f32 * inv_alpha).round() as u8,
                (color[1] as f32 * alpha + current[1] as f32 * inv_alpha).round() as u8,
                (color[2] as f32 * alpha + current[2] as f32 * inv_alpha).round() as u8,
            ]);
            img.put_pixel(px, py, blended);
        }
    }
}

/// Load font based on font specification with smart detection
///
/// Supports three formats:
/// 1. Font name: "DejaVu Sans" -> searches system font directories
/// 2. Font filename: "DejaVuSans-Bold.ttf" -> searches in common font directories
/// 3. Full path: "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf" -> loads directly
///
/// Falls back to any common sans-serif system font when the requested one
/// cannot be found.
pub fn load_font(font_spec: &str) -> Result<FontArc, BadgeError> {
    if is_absolute_path(font_spec) {
        return load_font_from_path(font_spec);
    }

    if is_font_filename(font_spec) {
        if let Ok(font) = load_font_by_filename(font_spec) {
            return Ok(font);
        }
    }

    for path in get_system_font_paths(font_spec) {
        if let Ok(font) = load_font_from_path(&expand_path(&path)) {
            return Ok(font);
        }
    }

    let default_fonts = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
        "/System/Library/Fonts/Helvetica.ttc",
        "/mnt/c/Windows/Fonts/arialbd.ttf",
    ];

    for font_path in &default_fonts {
        if let Ok(font) = load_font_from_path(font_path) {
            tracing::warn!(requested = font_spec, used = font_path, "font not found, using fallback");
            return Ok(font);
        }
    }

    tracing::warn!(requested = font_spec, "no system font found, using bundled DejaVu Sans Bold");
    embedded_font()
}

fn embedded_font() -> Result<FontArc, BadgeError> {
    FontArc::try_from_slice(EMBEDDED_FONT)
        .map_err(|e| BadgeError::Font(format!("failed to parse bundled font: {}", e)))
}

/// Check if the input is an absolute path
fn is_absolute_path(path: &str) -> bool {
    path.starts_with('/')
        || path.starts_with('\\')
        || (path.len() > 2 && path.chars().nth(1) == Some(':'))
}

/// Check if the input looks like a font filename
fn is_font_filename(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    lower.ends_with(".ttf") || lower.ends_with(".otf") || lower.ends_with(".ttc")
}

fn load_font_from_path(font_path: &str) -> Result<FontArc, BadgeError> {
    let font_data = std::fs::read(font_path)
        .map_err(|e| BadgeError::Font(format!("failed to read font file {}: {}", font_path, e)))?;

    FontArc::try_from_vec(font_data)
        .map_err(|e| BadgeError::Font(format!("failed to parse font file {}: {}", font_path, e)))
}

fn load_font_by_filename(filename: &str) -> Result<FontArc, BadgeError> {
    for dir in get_system_font_directories() {
        let font_path = format!("{}/{}", expand_path(dir), filename);
        if std::path::Path::new(&font_path).exists() {
            if let Ok(font) = load_font_from_path(&font_path) {
                return Ok(font);
            }
        }
    }

    Err(BadgeError::Font(format!(
        "font file '{}' not found in system directories",
        filename
    )))
}

/// Expand paths with ~ to home directory
fn expand_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return format!("{}/{}", home, rest);
        }
    }
    path.to_string()
}

fn get_system_font_directories() -> Vec<&'static str> {
    vec![
        // Linux
        "/usr/share/fonts/truetype/dejavu",
        "/usr/share/fonts/truetype/liberation",
        "/usr/share/fonts/truetype",
        "/usr/share/fonts/TTF",
        "/usr/share/fonts/opentype",
        "/usr/share/fonts",
        "/usr/local/share/fonts",
        "~/.fonts",
        "~/.local/share/fonts",
        // macOS
        "/System/Library/Fonts",
        "/System/Library/Fonts/Supplemental",
        "/Library/Fonts",
        "~/Library/Fonts",
        // Windows (via WSL)
        "/mnt/c/Windows/Fonts",
    ]
}

/// Candidate files for a font given by family name.
fn get_system_font_paths(font_name: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let compact = font_name.replace(' ', "");

    for dir in get_system_font_directories() {
        paths.push(format!("{}/{}.ttf", dir, font_name));
        paths.push(format!("{}/{}.ttf", dir, compact));
        paths.push(format!("{}/{}.otf", dir, compact));
    }

    match font_name.to_lowercase().as_str() {
        "dejavu sans" | "dejavusans" | "sans-serif" | "sans" => {
            paths.push("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string());
            paths.push("/usr/share/fonts/TTF/DejaVuSans.ttf".to_string());
        }
        "dejavu sans bold" | "dejavusans-bold" => {
            paths.push("/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf".to_string());
            paths.push("/usr/share/fonts/TTF/DejaVuSans-Bold.ttf".to_string());
        }
        "arial" | "arial-bold" => {
            paths.push("/System/Library/Fonts/Supplemental/Arial.ttf".to_string());
            paths.push("/mnt/c/Windows/Fonts/arial.ttf".to_string());
        }
        "helvetica" | "helvetica-bold" => {
            paths.push("/System/Library/Fonts/Helvetica.ttc".to_string());
        }
        _ => {}
    }

    paths
}
