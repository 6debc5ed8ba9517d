// ============================================================================
// NAMED FILTERS — one-shot looks applied to the whole bitmap
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;

use crate::bitmap::Bitmap;
use crate::error::{TransformError, ValidationError};

/// The closed set of filter looks exposed to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    Grayscale,
    Sepia,
    Invert,
    Vintage,
    Cool,
    Warm,
}

impl FilterKind {
    /// Parse a user-facing filter name. Unknown names are a validation error
    /// so the caller can surface them without touching the raster.
    pub fn parse(name: &str) -> Result<FilterKind, ValidationError> {
        match name.to_ascii_lowercase().as_str() {
            "grayscale" | "greyscale" => Ok(FilterKind::Grayscale),
            "sepia" => Ok(FilterKind::Sepia),
            "invert" => Ok(FilterKind::Invert),
            "vintage" => Ok(FilterKind::Vintage),
            "cool" => Ok(FilterKind::Cool),
            "warm" => Ok(FilterKind::Warm),
            _ => Err(ValidationError::UnknownFilter(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::Grayscale => "grayscale",
            FilterKind::Sepia => "sepia",
            FilterKind::Invert => "invert",
            FilterKind::Vintage => "vintage",
            FilterKind::Cool => "cool",
            FilterKind::Warm => "warm",
        }
    }

    pub fn all() -> &'static [FilterKind] {
        &[
            FilterKind::Grayscale,
            FilterKind::Sepia,
            FilterKind::Invert,
            FilterKind::Vintage,
            FilterKind::Cool,
            FilterKind::Warm,
        ]
    }
}

/// Apply the filter, producing a new bitmap.
pub fn apply_filter(bitmap: &Bitmap, kind: FilterKind) -> Result<Bitmap, TransformError> {
    let transform: fn(f32, f32, f32, f32) -> (f32, f32, f32, f32) = match kind {
        FilterKind::Grayscale => |r, g, b, a| {
            let l = 0.299 * r + 0.587 * g + 0.114 * b;
            (l, l, l, a)
        },
        FilterKind::Sepia => |r, g, b, a| {
            (
                0.393 * r + 0.769 * g + 0.189 * b,
                0.349 * r + 0.686 * g + 0.168 * b,
                0.272 * r + 0.534 * g + 0.131 * b,
                a,
            )
        },
        FilterKind::Invert => |r, g, b, a| (255.0 - r, 255.0 - g, 255.0 - b, a),
        FilterKind::Vintage => |r, g, b, a| {
            // Faded blacks with a sepia lean.
            let nr = 0.35 * r + 0.55 * g + 0.15 * b + 18.0;
            let ng = 0.28 * r + 0.60 * g + 0.12 * b + 10.0;
            let nb = 0.20 * r + 0.40 * g + 0.25 * b + 6.0;
            (nr, ng, nb, a)
        },
        FilterKind::Cool => |r, g, b, a| (r - 12.0, g + 2.0, b + 14.0, a),
        FilterKind::Warm => |r, g, b, a| (r + 14.0, g + 3.0, b - 12.0, a),
    };
    pixel_transform(bitmap, transform)
}

/// Run a per-pixel color transform over the bitmap, row-parallel.
///
/// The closure sees and returns channel values in 0.0–255.0; results are
/// rounded and clamped back into bytes.
pub fn pixel_transform<F>(bitmap: &Bitmap, transform: F) -> Result<Bitmap, TransformError>
where
    F: Fn(f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
{
    if bitmap.is_empty() {
        return Err(TransformError::UnreadableSource);
    }
    let w = bitmap.width() as usize;
    let h = bitmap.height() as usize;
    let src_raw = bitmap.pixels().as_raw();
    let stride = w * 4;
    let mut dst_raw = vec![0u8; stride * h];

    dst_raw
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let row_in = &src_raw[y * stride..(y + 1) * stride];
            for x in 0..w {
                let pi = x * 4;
                let (nr, ng, nb, na) = transform(
                    row_in[pi] as f32,
                    row_in[pi + 1] as f32,
                    row_in[pi + 2] as f32,
                    row_in[pi + 3] as f32,
                );
                row_out[pi] = nr.round().clamp(0.0, 255.0) as u8;
                row_out[pi + 1] = ng.round().clamp(0.0, 255.0) as u8;
                row_out[pi + 2] = nb.round().clamp(0.0, 255.0) as u8;
                row_out[pi + 3] = na.round().clamp(0.0, 255.0) as u8;
            }
        });

    let out = RgbaImage::from_raw(bitmap.width(), bitmap.height(), dst_raw)
        .ok_or_else(|| TransformError::RasterFailed("filter buffer size mismatch".into()))?;
    Ok(Bitmap::new(out))
}
