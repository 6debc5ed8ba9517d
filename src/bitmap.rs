// ============================================================================
// BITMAP — opaque immutable raster value
// ============================================================================
//
// Every mutation in the editor produces a NEW bitmap; pixel buffers are never
// written in place once wrapped. The Arc makes history snapshots cheap: twenty
// entries pointing at the same raster cost one buffer.

use std::sync::Arc;

use image::RgbaImage;
use uuid::Uuid;

/// An immutable RGBA raster with a content identity.
///
/// Two `Bitmap`s compare equal when they were produced by the same operation
/// (clones share the id). A fresh id is minted for every newly rasterized
/// buffer, so identity comparison is enough to tell "same snapshot" apart
/// from "same-looking pixels".
#[derive(Clone)]
pub struct Bitmap {
    pixels: Arc<RgbaImage>,
    id: Uuid,
}

impl Bitmap {
    /// Wrap a freshly produced raster. Assigns a new content id.
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
            id: Uuid::new_v4(),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// True when either dimension is zero — such a bitmap cannot be
    /// rasterized against and is treated as unreadable by the engines.
    pub fn is_empty(&self) -> bool {
        self.pixels.width() == 0 || self.pixels.height() == 0
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Borrow the underlying pixel buffer (read-only).
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Copy the pixels out into an owned buffer for mutation.
    /// The result must be re-wrapped with [`Bitmap::new`] to re-enter the engine.
    pub fn to_rgba_image(&self) -> RgbaImage {
        (*self.pixels).clone()
    }
}

impl PartialEq for Bitmap {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Bitmap {}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bitmap({}x{}, id={})",
            self.pixels.width(),
            self.pixels.height(),
            self.id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_clone_shares_identity() {
        let bmp = Bitmap::new(RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255])));
        let copy = bmp.clone();
        assert_eq!(bmp, copy);
        assert_eq!(bmp.id(), copy.id());
    }

    #[test]
    fn test_fresh_wrap_gets_new_identity() {
        let a = Bitmap::new(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])));
        let b = Bitmap::new(a.to_rgba_image());
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_detection() {
        let empty = Bitmap::new(RgbaImage::new(0, 8));
        assert!(empty.is_empty());
        let ok = Bitmap::new(RgbaImage::new(8, 8));
        assert!(!ok.is_empty());
    }
}
