// ============================================================================
// OVERLAY COMPOSITOR — text and sticker annotations, flattened in z-order
// ============================================================================
//
// Two ordered collections, each keyed by unique id. Merging draws stickers
// first in insertion order, then text overlays in insertion order, so the
// most recently added annotation of each kind sits on top of its peers and
// text always sits above stickers.

use std::collections::HashMap;

use ab_glyph::{Font, FontArc, GlyphId, ScaleFont, point};
use image::RgbaImage;
use uuid::Uuid;

use crate::bitmap::Bitmap;
use crate::error::TransformError;
use crate::log_warn;
use crate::ops::draw::blend_over;

// ----------------------------------------------------------------------------
// Text overlays
// ----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlignment {
    pub fn to_u8(self) -> u8 {
        match self {
            TextAlignment::Left => 0,
            TextAlignment::Center => 1,
            TextAlignment::Right => 2,
        }
    }

    pub fn from_u8(v: u8) -> TextAlignment {
        match v {
            1 => TextAlignment::Center,
            2 => TextAlignment::Right,
            _ => TextAlignment::Left,
        }
    }
}

/// Offset drop shadow drawn under the glyph fill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextShadow {
    pub dx: f32,
    pub dy: f32,
    pub color: [u8; 4],
}

/// A positioned, styled caption. `(x, y)` anchors the baseline start of the
/// first line in bitmap coordinates.
#[derive(Clone, Debug)]
pub struct TextOverlay {
    pub id: Uuid,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub font_family: String,
    /// CSS-style weight value (400 = regular, 700 = bold).
    pub weight: u16,
    pub italic: bool,
    pub color: [u8; 4],
    /// Optional panel drawn behind the measured text extents.
    pub background: Option<[u8; 4]>,
    pub opacity: f32,
    pub rotation_deg: f32,
    pub alignment: TextAlignment,
    pub shadow: Option<TextShadow>,
}

impl TextOverlay {
    pub fn new(text: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            x,
            y,
            font_size: 32.0,
            font_family: "DejaVu Sans".to_string(),
            weight: 400,
            italic: false,
            color: [255, 255, 255, 255],
            background: None,
            opacity: 1.0,
            rotation_deg: 0.0,
            alignment: TextAlignment::Left,
            shadow: None,
        }
    }
}

/// Partial update for a text overlay. `None` fields are left untouched; the
/// nested options allow clearing the background / shadow.
#[derive(Clone, Debug, Default)]
pub struct TextPatch {
    pub text: Option<String>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub font_size: Option<f32>,
    pub font_family: Option<String>,
    pub weight: Option<u16>,
    pub italic: Option<bool>,
    pub color: Option<[u8; 4]>,
    pub background: Option<Option<[u8; 4]>>,
    pub opacity: Option<f32>,
    pub rotation_deg: Option<f32>,
    pub alignment: Option<TextAlignment>,
    pub shadow: Option<Option<TextShadow>>,
}

impl TextPatch {
    fn apply(self, overlay: &mut TextOverlay) {
        if let Some(v) = self.text {
            overlay.text = v;
        }
        if let Some(v) = self.x {
            overlay.x = v;
        }
        if let Some(v) = self.y {
            overlay.y = v;
        }
        if let Some(v) = self.font_size {
            overlay.font_size = v.max(1.0);
        }
        if let Some(v) = self.font_family {
            overlay.font_family = v;
        }
        if let Some(v) = self.weight {
            overlay.weight = v;
        }
        if let Some(v) = self.italic {
            overlay.italic = v;
        }
        if let Some(v) = self.color {
            overlay.color = v;
        }
        if let Some(v) = self.background {
            overlay.background = v;
        }
        if let Some(v) = self.opacity {
            overlay.opacity = v.clamp(0.0, 1.0);
        }
        if let Some(v) = self.rotation_deg {
            overlay.rotation_deg = v;
        }
        if let Some(v) = self.alignment {
            overlay.alignment = v;
        }
        if let Some(v) = self.shadow {
            overlay.shadow = v;
        }
    }
}

// ----------------------------------------------------------------------------
// Sticker overlays
// ----------------------------------------------------------------------------

/// Built-in sticker artwork, evaluated as signed distance fields at raster
/// time so stickers stay crisp at any size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StickerGlyph {
    Heart,
    Star,
    Sparkle,
    Check,
    Cross,
    Dot,
}

impl StickerGlyph {
    pub fn color(&self) -> [u8; 4] {
        match self {
            StickerGlyph::Heart => [229, 56, 84, 255],
            StickerGlyph::Star => [255, 196, 37, 255],
            StickerGlyph::Sparkle => [255, 228, 120, 255],
            StickerGlyph::Check => [64, 192, 87, 255],
            StickerGlyph::Cross => [233, 69, 69, 255],
            StickerGlyph::Dot => [64, 140, 255, 255],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StickerGlyph::Heart => "Heart",
            StickerGlyph::Star => "Star",
            StickerGlyph::Sparkle => "Sparkle",
            StickerGlyph::Check => "Check",
            StickerGlyph::Cross => "Cross",
            StickerGlyph::Dot => "Dot",
        }
    }

    pub fn all() -> &'static [StickerGlyph] {
        &[
            StickerGlyph::Heart,
            StickerGlyph::Star,
            StickerGlyph::Sparkle,
            StickerGlyph::Check,
            StickerGlyph::Cross,
            StickerGlyph::Dot,
        ]
    }

    pub fn to_u8(self) -> u8 {
        match self {
            StickerGlyph::Heart => 0,
            StickerGlyph::Star => 1,
            StickerGlyph::Sparkle => 2,
            StickerGlyph::Check => 3,
            StickerGlyph::Cross => 4,
            StickerGlyph::Dot => 5,
        }
    }

    pub fn from_u8(v: u8) -> StickerGlyph {
        match v {
            1 => StickerGlyph::Star,
            2 => StickerGlyph::Sparkle,
            3 => StickerGlyph::Check,
            4 => StickerGlyph::Cross,
            5 => StickerGlyph::Dot,
            _ => StickerGlyph::Heart,
        }
    }

    /// Signed distance at shape-local coordinates, negative inside.
    fn sdf(&self, px: f32, py: f32, hx: f32, hy: f32) -> f32 {
        match self {
            StickerGlyph::Heart => sdf_heart(px, py, hx, hy),
            StickerGlyph::Star => sdf_star(px, py, hx.min(hy), hx.min(hy) * 0.4, 5),
            StickerGlyph::Sparkle => sdf_star(px, py, hx.min(hy), hx.min(hy) * 0.25, 4),
            StickerGlyph::Check => sdf_check(px, py, hx, hy),
            StickerGlyph::Cross => sdf_cross(px, py, hx, hy),
            StickerGlyph::Dot => sdf_ellipse(px, py, hx, hy),
        }
    }
}

/// A positioned sticker. `(x, y)` anchors the sticker's center.
#[derive(Clone, Debug)]
pub struct StickerOverlay {
    pub id: Uuid,
    pub glyph: StickerGlyph,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation_deg: f32,
    pub opacity: f32,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl StickerOverlay {
    pub fn new(glyph: StickerGlyph, x: f32, y: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            glyph,
            x,
            y,
            width: 96.0,
            height: 96.0,
            rotation_deg: 0.0,
            opacity: 1.0,
            flip_h: false,
            flip_v: false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct StickerPatch {
    pub glyph: Option<StickerGlyph>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub rotation_deg: Option<f32>,
    pub opacity: Option<f32>,
    pub flip_h: Option<bool>,
    pub flip_v: Option<bool>,
}

impl StickerPatch {
    fn apply(self, overlay: &mut StickerOverlay) {
        if let Some(v) = self.glyph {
            overlay.glyph = v;
        }
        if let Some(v) = self.x {
            overlay.x = v;
        }
        if let Some(v) = self.y {
            overlay.y = v;
        }
        if let Some(v) = self.width {
            overlay.width = v.max(1.0);
        }
        if let Some(v) = self.height {
            overlay.height = v.max(1.0);
        }
        if let Some(v) = self.rotation_deg {
            overlay.rotation_deg = v;
        }
        if let Some(v) = self.opacity {
            overlay.opacity = v.clamp(0.0, 1.0);
        }
        if let Some(v) = self.flip_h {
            overlay.flip_h = v;
        }
        if let Some(v) = self.flip_v {
            overlay.flip_v = v;
        }
    }
}

// ----------------------------------------------------------------------------
// Collections + selection
// ----------------------------------------------------------------------------

/// Both overlay collections plus the per-kind selection.
///
/// A selection only ever names an overlay currently present in its own
/// collection; deleting the selected overlay clears the selection.
#[derive(Default)]
pub struct OverlayState {
    stickers: Vec<StickerOverlay>,
    texts: Vec<TextOverlay>,
    selected_sticker: Option<Uuid>,
    selected_text: Option<Uuid>,
}

impl OverlayState {
    /// Insert with a freshly assigned id; the new overlay becomes the selection.
    pub fn add_sticker(&mut self, mut sticker: StickerOverlay) -> Uuid {
        sticker.id = Uuid::new_v4();
        let id = sticker.id;
        self.stickers.push(sticker);
        self.selected_sticker = Some(id);
        id
    }

    pub fn update_sticker(&mut self, id: Uuid, patch: StickerPatch) -> bool {
        match self.stickers.iter_mut().find(|s| s.id == id) {
            Some(sticker) => {
                patch.apply(sticker);
                true
            }
            None => false,
        }
    }

    pub fn delete_sticker(&mut self, id: Uuid) -> bool {
        let before = self.stickers.len();
        self.stickers.retain(|s| s.id != id);
        let removed = self.stickers.len() != before;
        if removed && self.selected_sticker == Some(id) {
            self.selected_sticker = None;
        }
        removed
    }

    /// Select by id (must exist) or clear with `None`.
    pub fn select_sticker(&mut self, id: Option<Uuid>) -> bool {
        match id {
            Some(id) if !self.stickers.iter().any(|s| s.id == id) => false,
            other => {
                self.selected_sticker = other;
                true
            }
        }
    }

    pub fn add_text(&mut self, mut text: TextOverlay) -> Uuid {
        text.id = Uuid::new_v4();
        let id = text.id;
        self.texts.push(text);
        self.selected_text = Some(id);
        id
    }

    pub fn update_text(&mut self, id: Uuid, patch: TextPatch) -> bool {
        match self.texts.iter_mut().find(|t| t.id == id) {
            Some(text) => {
                patch.apply(text);
                true
            }
            None => false,
        }
    }

    pub fn delete_text(&mut self, id: Uuid) -> bool {
        let before = self.texts.len();
        self.texts.retain(|t| t.id != id);
        let removed = self.texts.len() != before;
        if removed && self.selected_text == Some(id) {
            self.selected_text = None;
        }
        removed
    }

    pub fn select_text(&mut self, id: Option<Uuid>) -> bool {
        match id {
            Some(id) if !self.texts.iter().any(|t| t.id == id) => false,
            other => {
                self.selected_text = other;
                true
            }
        }
    }

    pub fn stickers(&self) -> &[StickerOverlay] {
        &self.stickers
    }

    pub fn texts(&self) -> &[TextOverlay] {
        &self.texts
    }

    pub fn selected_sticker(&self) -> Option<Uuid> {
        self.selected_sticker
    }

    pub fn selected_text(&self) -> Option<Uuid> {
        self.selected_text
    }

    pub fn is_empty(&self) -> bool {
        self.stickers.is_empty() && self.texts.is_empty()
    }

    /// Empty both collections and drop both selections (post-flatten state).
    pub fn clear_all(&mut self) {
        self.stickers.clear();
        self.texts.clear();
        self.selected_sticker = None;
        self.selected_text = None;
    }
}

// ----------------------------------------------------------------------------
// Font resolution
// ----------------------------------------------------------------------------

const FALLBACK_FAMILIES: &[&str] = &[
    "DejaVu Sans",
    "Liberation Sans",
    "Arial",
    "Helvetica",
    "Noto Sans",
];

/// Caches font-kit lookups per (family, weight, italic) — including misses,
/// so an unresolvable family is only probed once per session.
#[derive(Default)]
pub struct FontCache {
    cache: HashMap<(String, u16, bool), Option<FontArc>>,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, family: &str, weight: u16, italic: bool) -> Option<FontArc> {
        let key = (family.to_string(), weight, italic);
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }
        let loaded = load_system_font(family, weight, italic).or_else(|| {
            FALLBACK_FAMILIES
                .iter()
                .filter(|f| !f.eq_ignore_ascii_case(family))
                .find_map(|f| load_system_font(f, weight, italic))
        });
        if loaded.is_none() {
            log_warn!("no usable font for family '{}' (weight {})", family, weight);
        }
        self.cache.insert(key, loaded.clone());
        loaded
    }
}

/// Load a font by family, CSS weight and style from the system.
fn load_system_font(family: &str, weight: u16, italic: bool) -> Option<FontArc> {
    use font_kit::family_name::FamilyName;
    use font_kit::properties::{Properties, Style, Weight};
    use font_kit::source::SystemSource;

    let mut props = Properties::new();
    props.weight = Weight(weight as f32);
    if italic {
        props.style = Style::Italic;
    }

    let handle = SystemSource::new()
        .select_best_match(&[FamilyName::Title(family.to_string())], &props)
        .ok()?;
    let font_data = handle.load().ok()?;
    let bytes: Vec<u8> = (*font_data.copy_font_data()?).clone();
    FontArc::try_from_vec(bytes).ok()
}

// ----------------------------------------------------------------------------
// Merge (flatten rasterization)
// ----------------------------------------------------------------------------

/// Produce a new bitmap with every overlay drawn in, without mutating either
/// collection: stickers first in insertion order, then text overlays in
/// insertion order.
pub fn merge_overlays(
    bitmap: &Bitmap,
    overlays: &OverlayState,
    fonts: &mut FontCache,
) -> Result<Bitmap, TransformError> {
    if bitmap.is_empty() {
        return Err(TransformError::UnreadableSource);
    }
    let mut img = bitmap.to_rgba_image();

    for sticker in overlays.stickers() {
        draw_sticker(&mut img, sticker);
    }
    for text in overlays.texts() {
        draw_text(&mut img, text, fonts);
    }

    Ok(Bitmap::new(img))
}

/// Evaluate the sticker's SDF over the rotated bounding box and blend with
/// anti-aliased edges.
fn draw_sticker(img: &mut RgbaImage, sticker: &StickerOverlay) {
    if sticker.opacity <= 0.0 {
        return;
    }
    let hx = sticker.width * 0.5;
    let hy = sticker.height * 0.5;
    let rot = sticker.rotation_deg.to_radians();
    let (sin_r, cos_r) = rot.sin_cos();

    // Axis-aligned bounds of the rotated sticker rect, padded for AA.
    let ext_x = hx * cos_r.abs() + hy * sin_r.abs() + 2.0;
    let ext_y = hx * sin_r.abs() + hy * cos_r.abs() + 2.0;
    let x0 = ((sticker.x - ext_x).floor() as i64).max(0);
    let y0 = ((sticker.y - ext_y).floor() as i64).max(0);
    let x1 = ((sticker.x + ext_x).ceil() as i64).min(img.width() as i64);
    let y1 = ((sticker.y + ext_y).ceil() as i64).min(img.height() as i64);

    let color = sticker.glyph.color();
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - sticker.x;
            let dy = y as f32 + 0.5 - sticker.y;
            // Inverse rotation into sticker-local space, then mirroring.
            let mut lx = dx * cos_r + dy * sin_r;
            let mut ly = -dx * sin_r + dy * cos_r;
            if sticker.flip_h {
                lx = -lx;
            }
            if sticker.flip_v {
                ly = -ly;
            }
            let d = sticker.glyph.sdf(lx, ly, hx, hy);
            let cov = smoothstep(0.5, -0.5, d);
            if cov > 0.001 {
                let a = (color[3] as f32 / 255.0) * cov * sticker.opacity;
                blend_over(img.get_pixel_mut(x as u32, y as u32), color[0], color[1], color[2], a);
            }
        }
    }
}

/// Rasterized glyph coverage for one text overlay, positioned relative to the
/// overlay anchor (baseline start of the first line).
struct TextRaster {
    coverage: Vec<f32>,
    w: u32,
    h: u32,
    off_x: f32,
    off_y: f32,
}

impl TextRaster {
    fn sample(&self, lx: f32, ly: f32) -> f32 {
        let x = (lx - self.off_x).floor();
        let y = (ly - self.off_y).floor();
        if x < 0.0 || y < 0.0 || x >= self.w as f32 || y >= self.h as f32 {
            return 0.0;
        }
        self.coverage[y as usize * self.w as usize + x as usize]
    }
}

fn draw_text(img: &mut RgbaImage, overlay: &TextOverlay, fonts: &mut FontCache) {
    if overlay.opacity <= 0.0 || overlay.text.is_empty() {
        return;
    }
    let Some(font) = fonts.resolve(&overlay.font_family, overlay.weight, overlay.italic) else {
        // Leave the raster untouched rather than fail the whole flatten.
        log_warn!("skipping text overlay {}: no font available", overlay.id);
        return;
    };
    let bold = overlay.weight >= 600;
    let Some(raster) = rasterize_text_coverage(
        &font,
        &overlay.text,
        overlay.font_size,
        overlay.alignment,
        bold,
        overlay.italic,
    ) else {
        return;
    };

    let rot = overlay.rotation_deg.to_radians();

    // Background panel sized to the measured extents plus padding.
    if let Some(bg) = overlay.background {
        let pad = (overlay.font_size * 0.25).max(4.0);
        let bounds = (
            raster.off_x - pad,
            raster.off_y - pad,
            raster.w as f32 + 2.0 * pad,
            raster.h as f32 + 2.0 * pad,
        );
        composite_rotated(img, overlay.x, overlay.y, rot, overlay.opacity, bounds, |_, _| {
            Some(bg)
        });
    }

    // Shadow pass under the fill.
    if let Some(shadow) = overlay.shadow {
        let bounds = (
            raster.off_x + shadow.dx,
            raster.off_y + shadow.dy,
            raster.w as f32,
            raster.h as f32,
        );
        let sc = shadow.color;
        composite_rotated(img, overlay.x, overlay.y, rot, overlay.opacity, bounds, |lx, ly| {
            let cov = raster.sample(lx - shadow.dx, ly - shadow.dy);
            if cov > 0.001 {
                let mut c = sc;
                c[3] = (c[3] as f32 * cov) as u8;
                Some(c)
            } else {
                None
            }
        });
    }

    // Glyph fill.
    let fill = overlay.color;
    let bounds = (raster.off_x, raster.off_y, raster.w as f32, raster.h as f32);
    composite_rotated(img, overlay.x, overlay.y, rot, overlay.opacity, bounds, |lx, ly| {
        let cov = raster.sample(lx, ly);
        if cov > 0.001 {
            let mut c = fill;
            c[3] = (c[3] as f32 * cov) as u8;
            Some(c)
        } else {
            None
        }
    });
}

/// Blend a local-space sampler into the image, rotated around the anchor.
///
/// `bounds` is `(x, y, w, h)` in overlay-local coordinates (anchor at origin);
/// the sampler returns a straight-alpha color for a local point, or `None`
/// for fully transparent.
fn composite_rotated<F>(
    img: &mut RgbaImage,
    anchor_x: f32,
    anchor_y: f32,
    rotation: f32,
    opacity: f32,
    bounds: (f32, f32, f32, f32),
    sample: F,
) where
    F: Fn(f32, f32) -> Option<[u8; 4]>,
{
    let (bx, by, bw, bh) = bounds;
    if bw <= 0.0 || bh <= 0.0 {
        return;
    }
    let (sin_r, cos_r) = rotation.sin_cos();

    // Destination bbox: rotate the local corners out around the anchor.
    let corners = [
        (bx, by),
        (bx + bw, by),
        (bx + bw, by + bh),
        (bx, by + bh),
    ];
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for (cx, cy) in corners {
        let rx = cx * cos_r - cy * sin_r + anchor_x;
        let ry = cx * sin_r + cy * cos_r + anchor_y;
        min_x = min_x.min(rx);
        min_y = min_y.min(ry);
        max_x = max_x.max(rx);
        max_y = max_y.max(ry);
    }

    let x0 = ((min_x - 1.0).floor() as i64).max(0);
    let y0 = ((min_y - 1.0).floor() as i64).max(0);
    let x1 = ((max_x + 1.0).ceil() as i64).min(img.width() as i64);
    let y1 = ((max_y + 1.0).ceil() as i64).min(img.height() as i64);

    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - anchor_x;
            let dy = y as f32 + 0.5 - anchor_y;
            let lx = dx * cos_r + dy * sin_r;
            let ly = -dx * sin_r + dy * cos_r;
            if lx < bx || ly < by || lx > bx + bw || ly > by + bh {
                continue;
            }
            if let Some(c) = sample(lx, ly) {
                let a = (c[3] as f32 / 255.0) * opacity;
                blend_over(img.get_pixel_mut(x as u32, y as u32), c[0], c[1], c[2], a);
            }
        }
    }
}

/// Lay out and rasterize multi-line text into a coverage buffer positioned
/// relative to the baseline start of the first line. Returns `None` when the
/// text produces no visible glyphs.
fn rasterize_text_coverage(
    font: &FontArc,
    text: &str,
    font_size: f32,
    alignment: TextAlignment,
    bold: bool,
    italic: bool,
) -> Option<TextRaster> {
    let scaled = font.as_scaled(font_size);
    let line_height = scaled.height();

    // Lay out every line left-aligned at x=0, then shift by alignment.
    let mut glyphs: Vec<(GlyphId, f32, f32)> = Vec::new();
    for (line_idx, line) in text.split('\n').enumerate() {
        let y_off = line_idx as f32 * line_height;
        let mut cursor = 0.0f32;
        let mut prev: Option<GlyphId> = None;
        let mut line_glyphs = Vec::new();
        for ch in line.chars() {
            let gid = font.glyph_id(ch);
            if let Some(p) = prev {
                cursor += scaled.kern(p, gid);
            }
            line_glyphs.push((gid, cursor, y_off));
            cursor += scaled.h_advance(gid);
            prev = Some(gid);
        }
        let shift = match alignment {
            TextAlignment::Left => 0.0,
            TextAlignment::Center => -cursor * 0.5,
            TextAlignment::Right => -cursor,
        };
        for g in &mut line_glyphs {
            g.1 += shift;
        }
        glyphs.extend(line_glyphs);
    }
    if glyphs.is_empty() {
        return None;
    }

    // Bounding box over all glyphs, relative to the anchor.
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for &(gid, gx, gy) in &glyphs {
        let glyph = gid.with_scale_and_position(font_size, point(gx, gy));
        let bounds = font.glyph_bounds(&glyph);
        min_x = min_x.min(bounds.min.x);
        min_y = min_y.min(bounds.min.y);
        max_x = max_x.max(bounds.max.x);
        max_y = max_y.max(bounds.max.y);
    }
    if min_x >= max_x || min_y >= max_y {
        return None;
    }

    let pad = 2.0;
    min_x -= pad;
    min_y -= pad;
    max_x += pad;
    max_y += pad;

    let w = (max_x - min_x).ceil() as u32;
    let h = (max_y - min_y).ceil() as u32;
    if w == 0 || h == 0 {
        return None;
    }
    let mut coverage = vec![0.0f32; w as usize * h as usize];

    for &(gid, gx, gy) in &glyphs {
        let glyph = gid.with_scale_and_position(font_size, point(gx, gy));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let gb = outlined.px_bounds();
            outlined.draw(|px, py, cov| {
                let mut fx = gb.min.x + px as f32;
                let fy = gb.min.y + py as f32;
                if italic {
                    // Shear proportional to the height above the baseline.
                    fx += (gy - fy) * 0.2;
                }
                let ix = (fx - min_x).round() as i64;
                let iy = (fy - min_y).round() as i64;
                if ix >= 0 && iy >= 0 && (ix as u32) < w && (iy as u32) < h {
                    let idx = iy as usize * w as usize + ix as usize;
                    coverage[idx] = coverage[idx].max(cov);
                    // Cheap synthetic bold: double-stamp one pixel right.
                    if bold && (ix as u32) + 1 < w {
                        coverage[idx + 1] = coverage[idx + 1].max(cov);
                    }
                }
            });
        }
    }

    Some(TextRaster {
        coverage,
        w,
        h,
        off_x: min_x,
        off_y: min_y,
    })
}

// ----------------------------------------------------------------------------
// Sticker SDFs — signed distance, negative inside
// ----------------------------------------------------------------------------

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn sdf_box(px: f32, py: f32, hx: f32, hy: f32) -> f32 {
    let dx = px.abs() - hx;
    let dy = py.abs() - hy;
    let outside = (dx.max(0.0) * dx.max(0.0) + dy.max(0.0) * dy.max(0.0)).sqrt();
    outside + dx.max(dy).min(0.0)
}

fn sdf_ellipse(px: f32, py: f32, rx: f32, ry: f32) -> f32 {
    let nx = px / rx;
    let ny = py / ry;
    let len = (nx * nx + ny * ny).sqrt();
    if len < 1e-8 {
        return -rx.min(ry);
    }
    let scale = (rx * rx * ny * ny + ry * ry * nx * nx).sqrt() / (rx * ry * len);
    (len - 1.0) / scale
}

fn sdf_cross(px: f32, py: f32, hx: f32, hy: f32) -> f32 {
    let arm = 0.33;
    sdf_box(px, py, hx, hy * arm).min(sdf_box(px, py, hx * arm, hy))
}

fn sdf_line_segment(px: f32, py: f32, ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = bx - ax;
    let dy = by - ay;
    let t = (((px - ax) * dx + (py - ay) * dy) / (dx * dx + dy * dy)).clamp(0.0, 1.0);
    let cx = ax + t * dx;
    let cy = ay + t * dy;
    ((px - cx) * (px - cx) + (py - cy) * (py - cy)).sqrt()
}

fn sdf_check(px: f32, py: f32, hx: f32, hy: f32) -> f32 {
    let thickness = hx.min(hy) * 0.2;
    let d1 = sdf_line_segment(px, py, -hx * 0.7, 0.0, -hx * 0.1, hy * 0.6) - thickness;
    let d2 = sdf_line_segment(px, py, -hx * 0.1, hy * 0.6, hx * 0.8, -hy * 0.7) - thickness;
    d1.min(d2)
}

/// Star with `n` points, outer radius `ro`, inner radius `ri`.
fn sdf_star(px: f32, py: f32, ro: f32, ri: f32, n: u32) -> f32 {
    let angle = std::f32::consts::PI / n as f32;
    let theta = py.atan2(px) + std::f32::consts::FRAC_PI_2;
    let theta = ((theta % (2.0 * angle)) + 2.0 * angle) % (2.0 * angle);

    let len = (px * px + py * py).sqrt();
    let (ax, ay) = (ro, 0.0);
    let (bx, by) = (ri * angle.cos(), ri * angle.sin());
    let qx = len * (theta - angle).cos();
    let qy = len * (theta - angle).sin();

    let ex = bx - ax;
    let ey = by - ay;
    let fx = qx - ax;
    let fy = qy - ay;
    let t = ((fx * ex + fy * ey) / (ex * ex + ey * ey)).clamp(0.0, 1.0);
    let cx = ax + ex * t - qx;
    let cy = ay + ey * t - qy;
    let dist = (cx * cx + cy * cy).sqrt();
    if ex * fy - ey * fx < 0.0 { -dist } else { dist }
}

/// Heart from the implicit curve `(x²+y²-1)³ - x²y³ = 0`, uniformly scaled.
fn sdf_heart(px: f32, py: f32, hx: f32, hy: f32) -> f32 {
    const EXTENT_Y: f32 = 1.20;
    const CENTRE_Y: f32 = 0.20;
    let scale = hx.min(hy / EXTENT_Y);

    let nx = px.abs() / scale;
    let ny = -py / scale + CENTRE_Y;

    let a = nx * nx + ny * ny - 1.0;
    let f = a * a * a - nx * nx * ny * ny * ny;

    if f < 0.0 {
        let a2 = a * a;
        let df_dx = 6.0 * nx * a2 - 2.0 * nx * ny * ny * ny;
        let df_dy = 6.0 * ny * a2 - 3.0 * nx * nx * ny * ny;
        let grad = (df_dx * df_dx + df_dy * df_dy).sqrt();
        if grad > 1e-10 { (f / grad) * scale } else { -0.01 * scale }
    } else {
        // Outside: closest point on the parametric boundary.
        let mut min_d2 = f32::MAX;
        let steps = 80;
        for i in 0..=steps {
            let t = std::f32::consts::PI * i as f32 / steps as f32;
            let bx = t.sin().powi(3);
            let by = (13.0 * t.cos()
                - 5.0 * (2.0 * t).cos()
                - 2.0 * (3.0 * t).cos()
                - (4.0 * t).cos())
                / 16.0;
            let ddx = nx - bx;
            let ddy = ny - by;
            min_d2 = min_d2.min(ddx * ddx + ddy * ddy);
        }
        min_d2.sqrt() * scale
    }
}
