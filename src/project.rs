// ============================================================================
// POST DRAFT — serializable capture of an in-progress session
// ============================================================================
//
// Drafts persist the working bitmap plus every edit that has NOT been
// rasterized yet (overlays, drawing paths, display transform) so a post can
// be reopened later. History is intentionally not persisted: a loaded draft
// seeds a fresh one-entry history.

use serde::{Deserialize, Serialize};

use crate::bitmap::Bitmap;
use crate::ops::overlay::{
    StickerGlyph, StickerOverlay, TextAlignment, TextOverlay, TextShadow,
};
use crate::session::{EditSession, TransformState};
use crate::tools::DrawTool;

/// Magic prefix of the v1 draft format.
pub const DRAFT_MAGIC_V1: &str = "PFD1";

/// The on-disk draft, bincode-encoded.
#[derive(Serialize, Deserialize)]
pub struct PostDraftV1 {
    pub magic: String,
    pub width: u32,
    pub height: u32,
    /// Raw RGBA bytes of the working bitmap, row-major.
    pub pixels: Vec<u8>,
    pub rotation_deg: i32,
    pub flip_h: bool,
    pub flip_v: bool,
    pub paths: Vec<DraftPath>,
    pub stickers: Vec<DraftSticker>,
    pub texts: Vec<DraftText>,
}

/// Stroke data without the session-local id (ids are reassigned on load).
#[derive(Serialize, Deserialize)]
pub struct DraftPath {
    pub points: Vec<(f32, f32)>,
    pub color: [u8; 4],
    pub width: f32,
    pub opacity: f32,
    pub tool: u8,
}

#[derive(Serialize, Deserialize)]
pub struct DraftSticker {
    pub glyph: u8,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation_deg: f32,
    pub opacity: f32,
    pub flip_h: bool,
    pub flip_v: bool,
}

#[derive(Serialize, Deserialize)]
pub struct DraftText {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub font_family: String,
    pub weight: u16,
    pub italic: bool,
    pub color: [u8; 4],
    pub background: Option<[u8; 4]>,
    pub opacity: f32,
    pub rotation_deg: f32,
    pub alignment: u8,
    pub shadow: Option<(f32, f32, [u8; 4])>,
}

/// Capture the session's resumable state into a draft.
pub fn build_draft(session: &EditSession) -> PostDraftV1 {
    let snap = session.snapshot();
    let current = snap.current;

    PostDraftV1 {
        magic: DRAFT_MAGIC_V1.to_string(),
        width: current.width(),
        height: current.height(),
        pixels: current.pixels().as_raw().clone(),
        rotation_deg: snap.transform.rotation_deg,
        flip_h: snap.transform.flip_h,
        flip_v: snap.transform.flip_v,
        paths: snap
            .drawing_paths
            .iter()
            .map(|p| DraftPath {
                points: p.points.clone(),
                color: p.color,
                width: p.width,
                opacity: p.opacity,
                tool: p.tool.to_u8(),
            })
            .collect(),
        stickers: snap
            .stickers
            .iter()
            .map(|s| DraftSticker {
                glyph: s.glyph.to_u8(),
                x: s.x,
                y: s.y,
                width: s.width,
                height: s.height,
                rotation_deg: s.rotation_deg,
                opacity: s.opacity,
                flip_h: s.flip_h,
                flip_v: s.flip_v,
            })
            .collect(),
        texts: snap
            .texts
            .iter()
            .map(|t| DraftText {
                text: t.text.clone(),
                x: t.x,
                y: t.y,
                font_size: t.font_size,
                font_family: t.font_family.clone(),
                weight: t.weight,
                italic: t.italic,
                color: t.color,
                background: t.background,
                opacity: t.opacity,
                rotation_deg: t.rotation_deg,
                alignment: t.alignment.to_u8(),
                shadow: t.shadow.map(|sh| (sh.dx, sh.dy, sh.color)),
            })
            .collect(),
    }
}

/// Rebuild a session from a draft. Overlay and path ids are freshly assigned;
/// the draft bitmap seeds a one-entry history.
pub fn restore_session(
    draft: &PostDraftV1,
    service: std::sync::Arc<dyn crate::ai::EnhancementService>,
) -> Option<EditSession> {
    let img = image::RgbaImage::from_raw(draft.width, draft.height, draft.pixels.clone())?;
    let mut session = EditSession::new(Bitmap::new(img), service);

    session.restore_transform(TransformState {
        rotation_deg: draft.rotation_deg,
        flip_h: draft.flip_h,
        flip_v: draft.flip_v,
        zoom: 1.0,
    });

    for p in &draft.paths {
        session.add_drawing_path(
            p.points.clone(),
            p.color,
            p.width,
            p.opacity,
            DrawTool::from_u8(p.tool),
        );
    }
    for s in &draft.stickers {
        let mut sticker = StickerOverlay::new(StickerGlyph::from_u8(s.glyph), s.x, s.y);
        sticker.width = s.width;
        sticker.height = s.height;
        sticker.rotation_deg = s.rotation_deg;
        sticker.opacity = s.opacity;
        sticker.flip_h = s.flip_h;
        sticker.flip_v = s.flip_v;
        session.add_sticker_overlay(sticker);
    }
    for t in &draft.texts {
        let mut text = TextOverlay::new(t.text.clone(), t.x, t.y);
        text.font_size = t.font_size;
        text.font_family = t.font_family.clone();
        text.weight = t.weight;
        text.italic = t.italic;
        text.color = t.color;
        text.background = t.background;
        text.opacity = t.opacity;
        text.rotation_deg = t.rotation_deg;
        text.alignment = TextAlignment::from_u8(t.alignment);
        text.shadow = t.shadow.map(|(dx, dy, color)| TextShadow { dx, dy, color });
        session.add_text_overlay(text);
    }
    // Fresh drafts open with nothing selected.
    session.select_sticker_overlay(None);
    session.select_text_overlay(None);

    Some(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::LocalEnhancementService;
    use image::{Rgba, RgbaImage};
    use std::sync::Arc;

    #[test]
    fn test_draft_round_trip_preserves_state() {
        let img = RgbaImage::from_fn(16, 12, |x, y| Rgba([x as u8, y as u8, 7, 255]));
        let mut session =
            EditSession::new(Bitmap::new(img.clone()), Arc::new(LocalEnhancementService));
        session.rotate(180).unwrap();
        session.add_drawing_path(
            vec![(1.0, 1.0), (5.0, 5.0)],
            [9, 9, 9, 255],
            3.0,
            0.8,
            DrawTool::Brush,
        );
        let mut text = TextOverlay::new("draft", 3.0, 4.0);
        text.shadow = Some(TextShadow {
            dx: 1.0,
            dy: 2.0,
            color: [0, 0, 0, 128],
        });
        session.add_text_overlay(text);
        session.add_sticker_overlay(StickerOverlay::new(StickerGlyph::Star, 6.0, 6.0));

        let draft = build_draft(&session);
        let bytes = bincode::serialize(&draft).unwrap();
        let decoded: PostDraftV1 = bincode::deserialize(&bytes).unwrap();

        let restored = restore_session(&decoded, Arc::new(LocalEnhancementService)).unwrap();
        let snap = restored.snapshot();
        assert_eq!(
            snap.current.pixels().as_raw(),
            session.current_bitmap().pixels().as_raw()
        );
        assert_eq!(snap.history.len(), 1);
        assert_eq!(snap.transform.rotation_deg, 180);
        assert_eq!(snap.drawing_paths.len(), 1);
        assert_eq!(snap.drawing_paths[0].tool, DrawTool::Brush);
        assert_eq!(snap.texts.len(), 1);
        assert_eq!(snap.texts[0].text, "draft");
        assert!(snap.texts[0].shadow.is_some());
        assert_eq!(snap.stickers.len(), 1);
        assert_eq!(snap.stickers[0].glyph, StickerGlyph::Star);
        assert_eq!(snap.selected_sticker, None);
        assert_eq!(snap.selected_text, None);
    }
}
