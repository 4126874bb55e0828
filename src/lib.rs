// Library exports for reuse by the CLI and other front ends
pub mod cli;
pub mod config_file;
pub mod error;
pub mod image_processing;
pub mod json_output;
pub mod utils;

// Re-export commonly used types
pub use error::BadgeError;
pub use image_processing::annotate::LabelStyle;
pub use image_processing::batch::{BatchItem, BatchOutcome, BatchStats};
pub use image_processing::crop::{compute_crop_rectangle, CropMode, CropParams, CropRectangle};
pub use image_processing::name::format_name;
pub use image_processing::subject_detection::{
    detector_from_model, BoundingBox, FaceDetection, FaceDetector, NoFaceDetector,
};
pub use image_processing::{decode_image, encode_png, BadgeConfig, BadgeEngine};
pub use json_output::JsonMessage;
