// ============================================================================
// CROP ENGINE — interactive rectangle, aspect presets, rasterization
// ============================================================================
//
// The rectangle lives in source-bitmap coordinates and is manipulated through
// 8 resize handles plus a move handle. When an aspect preset is active the
// dependent dimension is recomputed on every change of the independent one,
// and immediately when the preset itself changes.

use image::imageops;

use crate::bitmap::Bitmap;
use crate::error::ValidationError;

/// Smallest selectable crop edge, in source pixels.
pub const MIN_CROP_SIZE: f32 = 8.0;

/// Axis-aligned crop rectangle in source-bitmap coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// The 8 resize handles plus the whole-rect move handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CropHandle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    Move,
}

/// Aspect presets for social-post formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AspectRatio {
    #[default]
    Free,
    Square,
    Portrait45,
    Portrait34,
    Story916,
    Landscape169,
}

impl AspectRatio {
    /// Width / height, or `None` for an unconstrained rect.
    pub fn ratio(&self) -> Option<f32> {
        match self {
            AspectRatio::Free => None,
            AspectRatio::Square => Some(1.0),
            AspectRatio::Portrait45 => Some(4.0 / 5.0),
            AspectRatio::Portrait34 => Some(3.0 / 4.0),
            AspectRatio::Story916 => Some(9.0 / 16.0),
            AspectRatio::Landscape169 => Some(16.0 / 9.0),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AspectRatio::Free => "Free",
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait45 => "4:5",
            AspectRatio::Portrait34 => "3:4",
            AspectRatio::Story916 => "9:16",
            AspectRatio::Landscape169 => "16:9",
        }
    }

    pub fn all() -> &'static [AspectRatio] {
        &[
            AspectRatio::Free,
            AspectRatio::Square,
            AspectRatio::Portrait45,
            AspectRatio::Portrait34,
            AspectRatio::Story916,
            AspectRatio::Landscape169,
        ]
    }
}

/// Which dimension the user is steering; the other one follows the ratio.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Steered {
    Horizontal,
    Vertical,
}

/// Interactive crop-tool state.
#[derive(Clone, Debug)]
pub struct CropState {
    pub rect: CropRect,
    pub aspect: AspectRatio,
    pub visible: bool,
    bounds: (f32, f32),
}

impl Default for CropState {
    fn default() -> Self {
        Self {
            rect: CropRect::new(0.0, 0.0, 0.0, 0.0),
            aspect: AspectRatio::Free,
            visible: false,
            bounds: (0.0, 0.0),
        }
    }
}

impl CropState {
    /// Show the crop tool over a bitmap of the given size, starting from a
    /// full-frame rectangle (constrained to the active preset).
    pub fn begin(&mut self, bitmap_w: u32, bitmap_h: u32) {
        self.bounds = (bitmap_w as f32, bitmap_h as f32);
        self.rect = CropRect::new(0.0, 0.0, self.bounds.0, self.bounds.1);
        self.visible = true;
        self.constrain(Steered::Horizontal);
    }

    pub fn cancel(&mut self) {
        self.visible = false;
    }

    /// Replace the rectangle wholesale (e.g. from a marquee drag).
    pub fn set_rect(&mut self, rect: CropRect) {
        self.rect = rect;
        self.constrain(Steered::Horizontal);
    }

    /// Switch aspect preset; the rectangle is re-constrained immediately.
    pub fn set_aspect(&mut self, aspect: AspectRatio) {
        self.aspect = aspect;
        self.constrain(Steered::Horizontal);
    }

    /// Apply one handle drag by (dx, dy) source pixels.
    pub fn drag_handle(&mut self, handle: CropHandle, dx: f32, dy: f32) {
        let r = self.rect;
        if handle == CropHandle::Move {
            self.rect.x = (r.x + dx).clamp(0.0, (self.bounds.0 - r.width).max(0.0));
            self.rect.y = (r.y + dy).clamp(0.0, (self.bounds.1 - r.height).max(0.0));
            return;
        }
        let (mut left, mut top, mut right, mut bottom) =
            (r.x, r.y, r.right(), r.bottom());

        let steered = match handle {
            CropHandle::Move => unreachable!(),
            CropHandle::Left => {
                left = (left + dx).min(right - MIN_CROP_SIZE);
                Steered::Horizontal
            }
            CropHandle::Right => {
                right = (right + dx).max(left + MIN_CROP_SIZE);
                Steered::Horizontal
            }
            CropHandle::Top => {
                top = (top + dy).min(bottom - MIN_CROP_SIZE);
                Steered::Vertical
            }
            CropHandle::Bottom => {
                bottom = (bottom + dy).max(top + MIN_CROP_SIZE);
                Steered::Vertical
            }
            CropHandle::TopLeft => {
                left = (left + dx).min(right - MIN_CROP_SIZE);
                top = (top + dy).min(bottom - MIN_CROP_SIZE);
                Steered::Horizontal
            }
            CropHandle::TopRight => {
                right = (right + dx).max(left + MIN_CROP_SIZE);
                top = (top + dy).min(bottom - MIN_CROP_SIZE);
                Steered::Horizontal
            }
            CropHandle::BottomLeft => {
                left = (left + dx).min(right - MIN_CROP_SIZE);
                bottom = (bottom + dy).max(top + MIN_CROP_SIZE);
                Steered::Horizontal
            }
            CropHandle::BottomRight => {
                right = (right + dx).max(left + MIN_CROP_SIZE);
                bottom = (bottom + dy).max(top + MIN_CROP_SIZE);
                Steered::Horizontal
            }
        };

        self.rect = CropRect::new(left, top, right - left, bottom - top);
        // Resizing from a top handle keeps the bottom edge pinned.
        let pin_bottom = matches!(
            handle,
            CropHandle::Top | CropHandle::TopLeft | CropHandle::TopRight
        );
        let anchor_bottom = if pin_bottom { Some(bottom) } else { None };
        self.constrain(steered);
        if let Some(b) = anchor_bottom {
            self.rect.y = (b - self.rect.height).clamp(0.0, (self.bounds.1 - self.rect.height).max(0.0));
        }
    }

    /// Enforce minimum size, the aspect preset, and the bitmap bounds.
    fn constrain(&mut self, steered: Steered) {
        let (bw, bh) = self.bounds;
        let rect = &mut self.rect;

        rect.width = rect.width.max(MIN_CROP_SIZE).min(bw.max(MIN_CROP_SIZE));
        rect.height = rect.height.max(MIN_CROP_SIZE).min(bh.max(MIN_CROP_SIZE));

        if let Some(ratio) = self.aspect.ratio() {
            match steered {
                Steered::Horizontal => rect.height = rect.width / ratio,
                Steered::Vertical => rect.width = rect.height * ratio,
            }
            // Shrink (ratio-preserving) until the rect fits the bitmap.
            if rect.width > bw {
                rect.width = bw;
                rect.height = rect.width / ratio;
            }
            if rect.height > bh {
                rect.height = bh;
                rect.width = rect.height * ratio;
            }
        } else {
            rect.width = rect.width.min(bw);
            rect.height = rect.height.min(bh);
        }

        rect.x = rect.x.clamp(0.0, (bw - rect.width).max(0.0));
        rect.y = rect.y.clamp(0.0, (bh - rect.height).max(0.0));
    }
}

/// Rasterize exactly the rectangle's sub-region into a new bitmap.
///
/// The rect is rounded to whole pixels and validated against the source
/// bitmap before any raster work; a rect outside the bitmap or with no area
/// leaves the caller's state untouched and reports why.
pub fn rasterize_crop(bitmap: &Bitmap, rect: &CropRect) -> Result<Bitmap, ValidationError> {
    let x = rect.x.round() as i64;
    let y = rect.y.round() as i64;
    let w = rect.width.round() as i64;
    let h = rect.height.round() as i64;

    if w <= 0 || h <= 0 {
        return Err(ValidationError::EmptyCropRect);
    }
    let (bw, bh) = (bitmap.width(), bitmap.height());
    if x < 0 || y < 0 || x + w > bw as i64 || y + h > bh as i64 {
        return Err(ValidationError::CropOutOfBounds {
            rect: (x, y, w, h),
            bitmap: (bw, bh),
        });
    }

    let cropped =
        imageops::crop_imm(bitmap.pixels(), x as u32, y as u32, w as u32, h as u32).to_image();
    Ok(Bitmap::new(cropped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn state(w: u32, h: u32) -> CropState {
        let mut s = CropState::default();
        s.begin(w, h);
        s
    }

    #[test]
    fn test_begin_covers_full_frame() {
        let s = state(640, 480);
        assert!(s.visible);
        assert_eq!(s.rect, CropRect::new(0.0, 0.0, 640.0, 480.0));
    }

    #[test]
    fn test_aspect_preset_recomputes_immediately() {
        let mut s = state(1000, 1000);
        s.set_aspect(AspectRatio::Story916);
        let ratio = s.rect.width / s.rect.height;
        assert!((ratio - 9.0 / 16.0).abs() < 1e-4);
        // Still inside the bitmap.
        assert!(s.rect.bottom() <= 1000.0 + 1e-3);
        assert!(s.rect.right() <= 1000.0 + 1e-3);
    }

    #[test]
    fn test_ratio_holds_through_handle_drags() {
        let mut s = state(800, 800);
        s.set_aspect(AspectRatio::Square);
        s.drag_handle(CropHandle::Right, -200.0, 0.0);
        assert!((s.rect.width / s.rect.height - 1.0).abs() < 1e-4);
        s.drag_handle(CropHandle::Bottom, 0.0, -100.0);
        assert!((s.rect.width / s.rect.height - 1.0).abs() < 1e-4);
        s.drag_handle(CropHandle::TopLeft, 50.0, 30.0);
        assert!((s.rect.width / s.rect.height - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_move_clamps_to_bounds() {
        let mut s = state(100, 100);
        s.set_rect(CropRect::new(10.0, 10.0, 40.0, 40.0));
        s.drag_handle(CropHandle::Move, 1000.0, -1000.0);
        assert_eq!(s.rect.x, 60.0);
        assert_eq!(s.rect.y, 0.0);
        assert_eq!(s.rect.width, 40.0);
    }

    #[test]
    fn test_minimum_size_enforced() {
        let mut s = state(100, 100);
        s.set_rect(CropRect::new(0.0, 0.0, 50.0, 50.0));
        s.drag_handle(CropHandle::Right, -49.0, 0.0);
        assert!(s.rect.width >= MIN_CROP_SIZE);
    }

    #[test]
    fn test_rasterize_dimensions_match_rect() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        img.put_pixel(3, 4, Rgba([255, 255, 255, 255]));
        let bmp = Bitmap::new(img);

        let out = rasterize_crop(&bmp, &CropRect::new(2.0, 3.0, 4.0, 5.0)).unwrap();
        assert_eq!((out.width(), out.height()), (4, 5));
        // The marker pixel lands at (1, 1) inside the crop.
        assert_eq!(out.pixels().get_pixel(1, 1), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_rasterize_rejects_out_of_bounds() {
        let bmp = Bitmap::new(RgbaImage::new(10, 10));
        let err = rasterize_crop(&bmp, &CropRect::new(5.0, 5.0, 10.0, 10.0)).unwrap_err();
        assert!(matches!(err, ValidationError::CropOutOfBounds { .. }));
        let err = rasterize_crop(&bmp, &CropRect::new(0.0, 0.0, 0.0, 5.0)).unwrap_err();
        assert_eq!(err, ValidationError::EmptyCropRect);
    }
}
