use std::sync::Arc;

use badge_processor::{
    compute_crop_rectangle, decode_image, BadgeConfig, BadgeError, BoundingBox, CropMode,
    CropParams, CropRectangle, LabelStyle,
};
use image::{ImageFormat, Rgb, RgbImage};

mod common;

use common::{encode, engine, engine_with, jpeg, png, test_config, FailingDetector, FixedFaceDetector};

fn face_box() -> BoundingBox {
    BoundingBox {
        x: 400.0,
        y: 300.0,
        width: 200.0,
        height: 200.0,
    }
}

/// Red where the padded face crop lands, blue everywhere else.
fn face_marked_photo() -> Vec<u8> {
    let img = RgbImage::from_fn(1000, 1000, |x, y| {
        if (300..700).contains(&x) && (200..600).contains(&y) {
            Rgb([220, 20, 20])
        } else {
            Rgb([20, 20, 220])
        }
    });
    encode(&img, ImageFormat::Png)
}

#[test]
fn badge_has_target_dimensions() {
    let badge = engine().process(&jpeg(800, 600), "Jane Doe").unwrap();
    let decoded = decode_image(&badge).unwrap();
    assert_eq!(decoded.dimensions(), (512, 512));
}

#[test]
fn zoom_badge_uses_non_square_target() {
    let config = BadgeConfig {
        target_width: 400,
        target_height: 600,
        parallel_jobs: 1,
        ..BadgeConfig::zoom()
    };
    let engine = engine_with(config, Arc::new(FixedFaceDetector(face_box())));

    let badge = engine.process(&png(1000, 1000), "Mary Jane Watson").unwrap();
    assert_eq!(decode_image(&badge).unwrap().dimensions(), (400, 600));
}

#[test]
fn face_box_drives_basic_crop() {
    let crop = compute_crop_rectangle(
        1000,
        1000,
        Some(&face_box()),
        512,
        512,
        CropMode::Basic,
        &CropParams::default(),
    );
    assert_eq!(
        crop,
        CropRectangle {
            x: 320.0,
            y: 220.0,
            width: 360.0,
            height: 360.0
        }
    );

    let engine = engine_with(test_config(), Arc::new(FixedFaceDetector(face_box())));
    let badge = decode_image(&engine.process(&face_marked_photo(), "Jane Doe").unwrap()).unwrap();

    // Top corners lie above the label and inside the face crop
    for (x, y) in [(10, 10), (500, 10), (256, 100)] {
        let pixel = badge.get_pixel(x, y);
        assert!(pixel[0] > 180 && pixel[2] < 60, "({x},{y}) = {:?}", pixel);
    }
}

#[test]
fn no_face_falls_back_to_center_crop() {
    let badge = decode_image(&engine().process(&face_marked_photo(), "Jane Doe").unwrap()).unwrap();

    // Whole 1000x1000 image is visible, so the corner is background
    let pixel = badge.get_pixel(5, 5);
    assert!(pixel[2] > 180 && pixel[0] < 60, "{:?}", pixel);
}

#[test]
fn label_darkens_bottom_of_badge() {
    let white = encode(&RgbImage::from_pixel(600, 600, Rgb([255, 255, 255])), ImageFormat::Png);

    for style in [LabelStyle::Corner, LabelStyle::Banner] {
        let config = BadgeConfig {
            label_style: style,
            ..test_config()
        };
        let badge = decode_image(
            &engine_with(config, Arc::new(badge_processor::NoFaceDetector))
                .process(&white, "Jane Doe")
                .unwrap(),
        )
        .unwrap();

        let darkened = badge.pixels().filter(|p| p[0] < 200).count();
        assert!(darkened > 0, "{:?} drew no plate", style);
        assert!(badge.get_pixel(256, 5).0.iter().all(|&c| c >= 254));
    }
}

#[test]
fn empty_name_is_rejected_before_decoding() {
    let err = engine().process(b"not even an image", "   ").unwrap_err();
    assert!(matches!(err, BadgeError::InvalidName), "{err:?}");
}

#[test]
fn corrupt_image_is_processing_error_with_decode_cause() {
    let err = engine().process(b"\x89PNG garbage", "Jane Doe").unwrap_err();
    assert!(matches!(err, BadgeError::Processing { .. }), "{err:?}");
    assert!(matches!(err.cause(), BadgeError::Decode(_)));
}

#[test]
fn detector_failure_is_processing_error() {
    let engine = engine_with(test_config(), Arc::new(FailingDetector));
    let err = engine.process(&png(64, 64), "Jane Doe").unwrap_err();
    assert!(matches!(err.cause(), BadgeError::Detection(_)), "{err:?}");
}

#[test]
fn tiny_images_still_fill_the_canvas() {
    let badge = engine().process(&png(3, 7), "Madonna").unwrap();
    assert_eq!(decode_image(&badge).unwrap().dimensions(), (512, 512));
}

#[test]
fn invalid_config_is_rejected_by_engine() {
    let config = BadgeConfig {
        target_width: 300,
        target_height: 200,
        ..BadgeConfig::default()
    };
    let result = badge_processor::BadgeEngine::new(config, Arc::new(badge_processor::NoFaceDetector));
    assert!(matches!(result, Err(BadgeError::InvalidConfig(_))));
}

#[test]
fn unknown_font_name_uses_bundled_font() {
    let config = BadgeConfig {
        font: "Nonexistent Display Face".to_string(),
        ..test_config()
    };
    let badge = engine_with(config, Arc::new(badge_processor::NoFaceDetector))
        .process(&png(200, 200), "Jane Doe")
        .unwrap();
    assert_eq!(decode_image(&badge).unwrap().dimensions(), (512, 512));
}
