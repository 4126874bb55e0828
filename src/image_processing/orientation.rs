use exif::{In, Reader, Tag, Value};
use image::{imageops, RgbImage};
use std::io::Cursor;

/// EXIF orientation values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExifOrientation {
    /// No orientation specified or undefined
    Undefined = 0,
    /// Normal orientation (0 degrees)
    TopLeft = 1,
    /// Horizontally flipped
    TopRight = 2,
    /// Rotated 180 degrees
    BottomRight = 3,
    /// Vertically flipped
    BottomLeft = 4,
    /// Transposed (mirrored across the main diagonal)
    LeftTop = 5,
    /// Needs a 90 degree clockwise rotation (phone portrait)
    RightTop = 6,
    /// Transversed (mirrored across the anti-diagonal)
    RightBottom = 7,
    /// Needs a 90 degree counter-clockwise rotation
    LeftBottom = 8,
}

impl From<u32> for ExifOrientation {
    fn from(value: u32) -> Self {
        match value {
            1 => ExifOrientation::TopLeft,
            2 => ExifOrientation::TopRight,
            3 => ExifOrientation::BottomRight,
            4 => ExifOrientation::BottomLeft,
            5 => ExifOrientation::LeftTop,
            6 => ExifOrientation::RightTop,
            7 => ExifOrientation::RightBottom,
            8 => ExifOrientation::LeftBottom,
            _ => ExifOrientation::Undefined,
        }
    }
}

impl ExifOrientation {
    /// Whether applying the orientation swaps width and height.
    pub fn swaps_dimensions(&self) -> bool {
        matches!(
            self,
            ExifOrientation::LeftTop
                | ExifOrientation::RightTop
                | ExifOrientation::RightBottom
                | ExifOrientation::LeftBottom
        )
    }
}

/// Read the EXIF orientation tag from encoded image bytes.
///
/// Images without EXIF data (PNG, WebP, stripped JPEGs) report `Undefined`.
pub fn read_exif_orientation(bytes: &[u8]) -> ExifOrientation {
    let mut cursor = Cursor::new(bytes);
    let exif = match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif,
        Err(_) => return ExifOrientation::Undefined,
    };

    if let Some(field) = exif.get_field(Tag::Orientation, In::PRIMARY) {
        if let Value::Short(values) = &field.value {
            if let Some(&orientation_value) = values.first() {
                return ExifOrientation::from(orientation_value as u32);
            }
        }
    }

    ExifOrientation::Undefined
}

/// Turn pixels stored in camera order into display order.
pub fn apply_orientation(img: RgbImage, orientation: ExifOrientation) -> RgbImage {
    match orientation {
        ExifOrientation::Undefined | ExifOrientation::TopLeft => img,
        ExifOrientation::TopRight => imageops::flip_horizontal(&img),
        ExifOrientation::BottomRight => imageops::rotate180(&img),
        ExifOrientation::BottomLeft => imageops::flip_vertical(&img),
        ExifOrientation::LeftTop => imageops::flip_horizontal(&imageops::rotate90(&img)),
        ExifOrientation::RightTop => imageops::rotate90(&img),
        ExifOrientation::RightBottom => imageops::flip_horizontal(&imageops::rotate270(&img)),
        ExifOrientation::LeftBottom => imageops::rotate270(&img),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn marked_image() -> RgbImage {
        // 3x2 with a red marker in the top-left corner
        let mut img = RgbImage::from_pixel(3, 2, Rgb([0, 0, 0]));
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img
    }

    #[test]
    fn test_exif_orientation_from_u32() {
        assert_eq!(ExifOrientation::from(1), ExifOrientation::TopLeft);
        assert_eq!(ExifOrientation::from(6), ExifOrientation::RightTop);
        assert_eq!(ExifOrientation::from(8), ExifOrientation::LeftBottom);
        assert_eq!(ExifOrientation::from(99), ExifOrientation::Undefined);
    }

    #[test]
    fn test_swaps_dimensions() {
        assert!(!ExifOrientation::TopLeft.swaps_dimensions());
        assert!(!ExifOrientation::BottomRight.swaps_dimensions());
        assert!(ExifOrientation::RightTop.swaps_dimensions());
        assert!(ExifOrientation::LeftBottom.swaps_dimensions());
    }

    #[test]
    fn test_missing_exif_is_undefined() {
        assert_eq!(read_exif_orientation(b"not an image"), ExifOrientation::Undefined);
        assert_eq!(read_exif_orientation(&[]), ExifOrientation::Undefined);
    }

    #[test]
    fn test_rotate_clockwise_moves_marker_to_top_right() {
        let rotated = apply_orientation(marked_image(), ExifOrientation::RightTop);
        assert_eq!(rotated.dimensions(), (2, 3));
        assert_eq!(rotated.get_pixel(1, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_rotate_counter_clockwise_moves_marker_to_bottom_left() {
        let rotated = apply_orientation(marked_image(), ExifOrientation::LeftBottom);
        assert_eq!(rotated.dimensions(), (2, 3));
        assert_eq!(rotated.get_pixel(0, 2), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_transpose_keeps_marker_at_origin() {
        let transposed = apply_orientation(marked_image(), ExifOrientation::LeftTop);
        assert_eq!(transposed.dimensions(), (2, 3));
        assert_eq!(transposed.get_pixel(0, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_normal_orientation_is_untouched() {
        let img = marked_image();
        assert_eq!(apply_orientation(img.clone(), ExifOrientation::TopLeft), img);
    }
}
