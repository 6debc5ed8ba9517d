// ============================================================================
// TRANSFORM OPERATIONS — quarter-turn rotation and mirroring
// ============================================================================
//
// Transforms compose incrementally: each call rasterizes against the current
// bitmap, not against the session original with a replayed net transform.
// Interleaved rotations and flips therefore read exactly in call order.

use image::imageops;

use crate::bitmap::Bitmap;
use crate::error::{TransformError, ValidationError};

/// Mirror axis for [`flip_bitmap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

impl FlipAxis {
    /// Parse a user-supplied axis string (`h`/`horizontal`, `v`/`vertical`).
    pub fn parse(s: &str) -> Result<FlipAxis, ValidationError> {
        match s.to_ascii_lowercase().as_str() {
            "h" | "horizontal" => Ok(FlipAxis::Horizontal),
            "v" | "vertical" => Ok(FlipAxis::Vertical),
            _ => Err(ValidationError::UnknownFlipAxis(s.to_string())),
        }
    }

    /// Label suffix used in history actions: `flip_h` / `flip_v`.
    pub fn suffix(&self) -> &'static str {
        match self {
            FlipAxis::Horizontal => "h",
            FlipAxis::Vertical => "v",
        }
    }
}

/// Normalize arbitrary degrees into {0, 90, 180, 270}.
///
/// Only quarter turns are supported; anything else is a validation error
/// surfaced before touching the raster.
pub fn normalize_degrees(degrees: i32) -> Result<i32, ValidationError> {
    let norm = degrees.rem_euclid(360);
    if norm % 90 != 0 {
        return Err(ValidationError::UnsupportedRotation(degrees));
    }
    Ok(norm)
}

/// Rotate clockwise by a multiple of 90 degrees, producing a new bitmap.
pub fn rotate_bitmap(bitmap: &Bitmap, degrees: i32) -> Result<Bitmap, TransformError> {
    if bitmap.is_empty() {
        return Err(TransformError::UnreadableSource);
    }
    let src = bitmap.pixels();
    let rotated = match degrees.rem_euclid(360) {
        0 => src.clone(),
        90 => imageops::rotate90(src),
        180 => imageops::rotate180(src),
        270 => imageops::rotate270(src),
        other => {
            return Err(TransformError::RasterFailed(format!(
                "cannot rasterize {} degree rotation",
                other
            )));
        }
    };
    Ok(Bitmap::new(rotated))
}

/// Mirror along the given axis, producing a new bitmap.
pub fn flip_bitmap(bitmap: &Bitmap, axis: FlipAxis) -> Result<Bitmap, TransformError> {
    if bitmap.is_empty() {
        return Err(TransformError::UnreadableSource);
    }
    let src = bitmap.pixels();
    let flipped = match axis {
        FlipAxis::Horizontal => imageops::flip_horizontal(src),
        FlipAxis::Vertical => imageops::flip_vertical(src),
    };
    Ok(Bitmap::new(flipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn marker_bitmap() -> Bitmap {
        // 3x2 image with a single red pixel at (0, 0).
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([0, 0, 0, 255]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        Bitmap::new(img)
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(90).unwrap(), 90);
        assert_eq!(normalize_degrees(-90).unwrap(), 270);
        assert_eq!(normalize_degrees(450).unwrap(), 90);
        assert_eq!(normalize_degrees(0).unwrap(), 0);
        assert!(normalize_degrees(45).is_err());
    }

    #[test]
    fn test_rotate_90_swaps_dimensions() {
        let bmp = marker_bitmap();
        let rotated = rotate_bitmap(&bmp, 90).unwrap();
        assert_eq!((rotated.width(), rotated.height()), (2, 3));
        // (0,0) moves to the top-right corner under a clockwise quarter turn.
        assert_eq!(rotated.pixels().get_pixel(1, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_flip_round_trip_restores_pixels() {
        let bmp = marker_bitmap();
        let once = flip_bitmap(&bmp, FlipAxis::Horizontal).unwrap();
        let twice = flip_bitmap(&once, FlipAxis::Horizontal).unwrap();
        assert_eq!(bmp.pixels().as_raw(), twice.pixels().as_raw());
        // Identity of the bitmap still changed: each rasterization is new.
        assert_ne!(bmp, twice);
    }

    #[test]
    fn test_empty_source_is_an_error() {
        let empty = Bitmap::new(RgbaImage::new(0, 4));
        assert_eq!(
            rotate_bitmap(&empty, 90),
            Err(TransformError::UnreadableSource)
        );
        assert_eq!(
            flip_bitmap(&empty, FlipAxis::Vertical),
            Err(TransformError::UnreadableSource)
        );
    }
}
