// ============================================================================
// FILE I/O — image load/save for the shell, plus the .pfd draft format
// ============================================================================
//
// The engine itself never decodes or encodes files; this module is the
// boundary where the surrounding shell turns paths into bitmaps and back.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, RgbaImage};

use crate::bitmap::Bitmap;
use crate::error::DraftError;
use crate::project::{DRAFT_MAGIC_V1, PostDraftV1};

/// Output formats the shell can encode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    Jpeg,
    Webp,
}

impl SaveFormat {
    /// Infer from a file extension, defaulting to PNG.
    pub fn from_extension(ext: Option<&str>) -> SaveFormat {
        match ext.map(|e| e.to_ascii_lowercase()).as_deref() {
            Some("jpg") | Some("jpeg") => SaveFormat::Jpeg,
            Some("webp") => SaveFormat::Webp,
            _ => SaveFormat::Png,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Webp => "webp",
        }
    }
}

/// Decode any raster format the `image` crate understands into a bitmap.
pub fn load_bitmap(path: &Path) -> Result<Bitmap, String> {
    let decoded = image::open(path)
        .map_err(|e| format!("failed to load {}: {}", path.display(), e))?;
    let rgba: RgbaImage = decoded.into_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(format!("{}: image has no pixels", path.display()));
    }
    Ok(Bitmap::new(rgba))
}

/// Encode and write the bitmap in the given format.
pub fn save_bitmap(
    bitmap: &Bitmap,
    path: &Path,
    format: SaveFormat,
    quality: u8,
) -> Result<(), String> {
    let image = bitmap.pixels();
    let err = |e: image::ImageError| format!("failed to save {}: {}", path.display(), e);

    let file = File::create(path).map_err(|e| format!("cannot create {}: {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);

    match format {
        SaveFormat::Png => {
            let encoder = PngEncoder::new(&mut writer);
            #[allow(deprecated)]
            encoder
                .encode(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ColorType::Rgba8,
                )
                .map_err(err)?;
        }
        SaveFormat::Jpeg => {
            // JPEG has no alpha channel; flatten first.
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100));
            encoder
                .encode(rgb.as_raw(), rgb.width(), rgb.height(), image::ColorType::Rgb8)
                .map_err(err)?;
        }
        SaveFormat::Webp => {
            drop(writer);
            DynamicImage::ImageRgba8(image.clone())
                .save(path)
                .map_err(err)?;
        }
    }
    Ok(())
}

/// Serialize a draft to disk.
pub fn save_draft(draft: &PostDraftV1, path: &Path) -> Result<(), DraftError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    bincode::serialize_into(writer, draft).map_err(|e| DraftError::Encode(e.to_string()))
}

/// Load and validate a draft from disk.
///
/// bincode encodes the leading magic string as an 8-byte length prefix plus
/// the 4 UTF-8 bytes, so the magic lives at bytes 8..12.
pub fn load_draft(path: &Path) -> Result<PostDraftV1, DraftError> {
    let raw = std::fs::read(path)?;
    if raw.len() < 12 {
        return Err(DraftError::BadMagic("<truncated>".to_string()));
    }
    let magic = std::str::from_utf8(&raw[8..12]).unwrap_or("????");
    if magic != DRAFT_MAGIC_V1 {
        return Err(DraftError::BadMagic(magic.to_string()));
    }

    let reader = BufReader::new(raw.as_slice());
    let draft: PostDraftV1 = bincode::deserialize_from(reader)?;
    if draft.pixels.len() != draft.width as usize * draft.height as usize * 4 {
        return Err(DraftError::Decode(format!(
            "pixel payload is {} bytes, expected {}",
            draft.pixels.len(),
            draft.width as usize * draft.height as usize * 4
        )));
    }
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::LocalEnhancementService;
    use crate::project::build_draft;
    use crate::session::EditSession;
    use image::Rgba;
    use std::sync::Arc;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("postfe-test-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_format_inference() {
        assert_eq!(SaveFormat::from_extension(Some("JPG")), SaveFormat::Jpeg);
        assert_eq!(SaveFormat::from_extension(Some("webp")), SaveFormat::Webp);
        assert_eq!(SaveFormat::from_extension(Some("tiff")), SaveFormat::Png);
        assert_eq!(SaveFormat::from_extension(None), SaveFormat::Png);
    }

    #[test]
    fn test_png_round_trip() {
        let bmp = Bitmap::new(RgbaImage::from_fn(9, 7, |x, y| {
            Rgba([x as u8 * 20, y as u8 * 30, 99, 255])
        }));
        let path = temp_path("roundtrip.png");
        save_bitmap(&bmp, &path, SaveFormat::Png, 90).unwrap();
        let loaded = load_bitmap(&path).unwrap();
        assert_eq!(loaded.pixels().as_raw(), bmp.pixels().as_raw());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_draft_file_round_trip() {
        let img = RgbaImage::from_pixel(6, 5, Rgba([1, 2, 3, 255]));
        let session = EditSession::new(Bitmap::new(img), Arc::new(LocalEnhancementService));
        let draft = build_draft(&session);

        let path = temp_path("draft.pfd");
        save_draft(&draft, &path).unwrap();
        let loaded = load_draft(&path).unwrap();
        assert_eq!(loaded.width, 6);
        assert_eq!(loaded.height, 5);
        assert_eq!(loaded.pixels, draft.pixels);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_draft_rejects_foreign_files() {
        let path = temp_path("garbage.pfd");
        std::fs::write(&path, b"definitely not a draft file").unwrap();
        assert!(matches!(
            load_draft(&path),
            Err(DraftError::BadMagic(_))
        ));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let err = load_bitmap(Path::new("/nonexistent/nope.png")).unwrap_err();
        assert!(err.contains("failed to load"));
    }
}
