#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

use badge_processor::image_processing::archive::build_archive;
use badge_processor::{
    BadgeConfig, BadgeEngine, BadgeError, BoundingBox, FaceDetection, FaceDetector, NoFaceDetector,
};
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};

/// Detector that reports the same box for every image.
pub struct FixedFaceDetector(pub BoundingBox);

impl FaceDetector for FixedFaceDetector {
    fn detect(&self, _image: &RgbImage) -> Result<Vec<FaceDetection>, BadgeError> {
        Ok(vec![FaceDetection {
            bounds: self.0,
            score: 1.0,
        }])
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Detector whose backend always breaks.
pub struct FailingDetector;

impl FaceDetector for FailingDetector {
    fn detect(&self, _image: &RgbImage) -> Result<Vec<FaceDetection>, BadgeError> {
        Err(BadgeError::Detection("model crashed".into()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    })
}

pub fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format)
        .expect("encode test image");
    bytes
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient_image(width, height), ImageFormat::Jpeg)
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(&gradient_image(width, height), ImageFormat::Png)
}

pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode(&RgbImage::from_pixel(width, height, Rgb(color)), ImageFormat::Png)
}

pub fn zip_of(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let files: BTreeMap<String, Vec<u8>> = entries
        .iter()
        .map(|(name, data)| (name.to_string(), data.clone()))
        .collect();
    build_archive(&files).expect("build test archive")
}

pub fn test_config() -> BadgeConfig {
    BadgeConfig {
        parallel_jobs: 2,
        ..BadgeConfig::default()
    }
}

pub fn engine_with(config: BadgeConfig, detector: Arc<dyn FaceDetector>) -> BadgeEngine {
    BadgeEngine::new(config, detector).expect("build badge engine")
}

pub fn engine() -> BadgeEngine {
    engine_with(test_config(), Arc::new(NoFaceDetector))
}
