use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::RgbImage;

use super::subject_detection::{BoundingBox, FaceDetection, FaceDetector};
use crate::error::BadgeError;

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The model is read from disk once; each call builds a cheap detector from a
/// clone of it because `rustface` detectors need `&mut self`.
pub struct RustfaceDetector {
    model: rustface::Model,
    min_face_size: u32,
    score_thresh: f64,
}

impl RustfaceDetector {
    /// Load a SeetaFace frontal model (`seeta_fd_frontal_v1.0.bin`).
    pub fn from_model_path(path: &Path) -> Result<Self, BadgeError> {
        let file = File::open(path).map_err(|e| {
            BadgeError::InvalidConfig(format!(
                "cannot open face model {}: {}",
                path.display(),
                e
            ))
        })?;
        let model = rustface::read_model(BufReader::new(file)).map_err(|e| {
            BadgeError::InvalidConfig(format!(
                "cannot parse face model {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!(model = %path.display(), "loaded SeetaFace model");

        Ok(Self {
            model,
            min_face_size: 20,
            score_thresh: 2.0,
        })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, image: &RgbImage) -> Result<Vec<FaceDetection>, BadgeError> {
        let gray = image::imageops::grayscale(image);
        let (width, height) = gray.dimensions();

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.min_face_size);
        detector.set_score_thresh(self.score_thresh);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceDetection {
                    bounds: BoundingBox {
                        x: bbox.x() as f64,
                        y: bbox.y() as f64,
                        width: bbox.width() as f64,
                        height: bbox.height() as f64,
                    },
                    score: face.score(),
                }
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "rustface"
    }
}
