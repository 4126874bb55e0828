use serde::{Deserialize, Serialize};

use super::subject_detection::BoundingBox;

/// Padding added on every side of the face in basic mode, relative to the
/// larger face dimension.
pub const DEFAULT_PADDING_RATIO: f64 = 0.4;

/// How tightly zoom mode frames the face. Smaller values zoom in more.
pub const DEFAULT_ZOOM_FACTOR: f64 = 1.8;

/// Crop policy used when building a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CropMode {
    /// Padded square around the face; assumes a square target.
    #[default]
    #[value(name = "basic")]
    Basic,
    /// Face-centered crop matching any target aspect ratio.
    #[value(name = "zoom")]
    Zoom,
}

/// Tuning knobs for the crop policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropParams {
    pub padding_ratio: f64,
    pub zoom_factor: f64,
}

impl Default for CropParams {
    fn default() -> Self {
        Self {
            padding_ratio: DEFAULT_PADDING_RATIO,
            zoom_factor: DEFAULT_ZOOM_FACTOR,
        }
    }
}

/// Region of the source image that ends up on the badge.
///
/// Always lies inside `[0, image_width] x [0, image_height]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRectangle {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// Compute the crop rectangle for an image, centered on the detected face
/// when there is one and on the image center otherwise.
pub fn compute_crop_rectangle(
    image_width: u32,
    image_height: u32,
    detection: Option<&BoundingBox>,
    target_width: u32,
    target_height: u32,
    mode: CropMode,
    params: &CropParams,
) -> CropRectangle {
    let (img_w, img_h) = (image_width as f64, image_height as f64);

    match (mode, detection) {
        (CropMode::Basic, Some(face)) => {
            let size = face.width.max(face.height);
            let padding = size * params.padding_ratio;
            let padded_size = size + padding * 2.0;
            let (cx, cy) = face.center();
            fit_within_image(cx, cy, padded_size, padded_size, img_w, img_h)
        }
        (CropMode::Basic, None) => {
            let size = img_w.min(img_h);
            CropRectangle {
                x: (img_w - size) / 2.0,
                y: (img_h - size) / 2.0,
                width: size,
                height: size,
            }
        }
        (CropMode::Zoom, Some(face)) => {
            let (tw, th) = (target_width as f64, target_height as f64);
            let min_face_dimension = face.width.min(face.height);

            let crop_width = min_face_dimension * params.zoom_factor;
            let crop_height = min_face_dimension * params.zoom_factor * (th / tw);

            // Grow to the exact target aspect ratio without shrinking either side
            let aspect_fit_scale = (crop_width / tw).max(crop_height / th);
            let (cx, cy) = face.center();
            fit_within_image(
                cx,
                cy,
                tw * aspect_fit_scale,
                th * aspect_fit_scale,
                img_w,
                img_h,
            )
        }
        (CropMode::Zoom, None) => center_crop(img_w, img_h, target_width, target_height),
    }
}

/// Largest centered rectangle with the target aspect ratio that fits the image.
pub fn center_crop(img_w: f64, img_h: f64, target_width: u32, target_height: u32) -> CropRectangle {
    let target_aspect = target_width as f64 / target_height as f64;
    let source_aspect = img_w / img_h;

    let (crop_width, crop_height) = if source_aspect > target_aspect {
        // Source is wider - crop width
        (img_h * target_aspect, img_h)
    } else {
        // Source is taller - crop height
        (img_w, img_w / target_aspect)
    };

    CropRectangle {
        x: (img_w - crop_width) / 2.0,
        y: (img_h - crop_height) / 2.0,
        width: crop_width,
        height: crop_height,
    }
}

/// Place a `width` x `height` rectangle centered on `(cx, cy)` inside the image.
///
/// Rectangles larger than the image are first scaled down, keeping their
/// aspect ratio, to the largest size that fits. The rectangle is then
/// translated (never resized) until every edge is inside the image.
fn fit_within_image(
    cx: f64,
    cy: f64,
    width: f64,
    height: f64,
    img_w: f64,
    img_h: f64,
) -> CropRectangle {
    let shrink = (img_w / width).min(img_h / height).min(1.0);
    let width = (width * shrink).min(img_w);
    let height = (height * shrink).min(img_h);

    let x = (cx - width / 2.0).min(img_w - width).max(0.0);
    let y = (cy - height / 2.0).min(img_h - height).max(0.0);

    CropRectangle {
        x,
        y,
        width,
        height,
    }
}
