use image::RgbImage;
use std::path::Path;
use std::sync::Arc;

use crate::error::BadgeError;

/// Axis-aligned face rectangle in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.x.is_finite() && self.y.is_finite()
    }
}

/// One candidate reported by a detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceDetection {
    pub bounds: BoundingBox,
    /// Detector-specific confidence; higher is better.
    pub score: f64,
}

/// Pluggable face detection backend.
///
/// Implementations are shared read-only by every concurrent pipeline run, so
/// any loaded model must be usable through `&self`.
pub trait FaceDetector: Send + Sync {
    /// Detect face candidates in an RGB image.
    fn detect(&self, image: &RgbImage) -> Result<Vec<FaceDetection>, BadgeError>;

    /// Short backend name used in logs.
    fn name(&self) -> &'static str;
}

/// Detector that never finds a face, so every crop falls back to the image center.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFaceDetector;

impl FaceDetector for NoFaceDetector {
    fn detect(&self, _image: &RgbImage) -> Result<Vec<FaceDetection>, BadgeError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Pick the face to crop around: the highest score, the earliest on ties.
/// Degenerate boxes are ignored.
pub fn best_detection(candidates: &[FaceDetection]) -> Option<BoundingBox> {
    candidates
        .iter()
        .filter(|candidate| candidate.bounds.is_valid())
        .fold(None::<&FaceDetection>, |best, candidate| match best {
            Some(current) if current.score >= candidate.score => Some(current),
            _ => Some(candidate),
        })
        .map(|candidate| candidate.bounds)
}

/// Run the detector and reduce its output to at most one face.
pub fn detect_face(
    detector: &dyn FaceDetector,
    image: &RgbImage,
) -> Result<Option<BoundingBox>, BadgeError> {
    let candidates = detector.detect(image)?;
    let best = best_detection(&candidates);

    tracing::debug!(
        detector = detector.name(),
        candidates = candidates.len(),
        found = best.is_some(),
        "face detection finished"
    );

    Ok(best)
}

/// Build the detector for an optional SeetaFace model file.
///
/// Without a model every image uses the center-crop fallback.
#[cfg(feature = "face-detection")]
pub fn detector_from_model(model: Option<&Path>) -> Result<Arc<dyn FaceDetector>, BadgeError> {
    match model {
        Some(path) => Ok(Arc::new(
            super::rustface_backend::RustfaceDetector::from_model_path(path)?,
        )),
        None => Ok(Arc::new(NoFaceDetector)),
    }
}

/// Build the detector for an optional SeetaFace model file.
///
/// This build has no detection backend, so asking for a model is an error.
#[cfg(not(feature = "face-detection"))]
pub fn detector_from_model(model: Option<&Path>) -> Result<Arc<dyn FaceDetector>, BadgeError> {
    match model {
        Some(path) => Err(BadgeError::InvalidConfig(format!(
            "face model {} given but face detection is not available; rebuild with --features face-detection",
            path.display()
        ))),
        None => Ok(Arc::new(NoFaceDetector)),
    }
}
