// ============================================================================
// LOCAL ENHANCEMENT SERVICE — CPU stand-in for the remote models
// ============================================================================
//
// Used by the headless CLI and the test suite. Each call is built from the
// same primitives the synchronous engines use (levels, saturation, blur) and
// honors the cooperative cancellation contract between stages.

use image::{Rgba, RgbaImage, imageops};

use crate::bitmap::Bitmap;
use crate::error::AiServiceError;
use crate::ops::adjustments::{hsl_to_rgb, rgb_to_hsl};

use super::{
    BackgroundMode, BackgroundOptions, BitmapOutcome, DetectedObject, EnhanceOptions,
    EnhanceOutcome, EnhancementService, GenerativeOptions, ServiceContext,
};

pub struct LocalEnhancementService;

impl EnhancementService for LocalEnhancementService {
    fn enhance(
        &self,
        bitmap: &Bitmap,
        options: &EnhanceOptions,
        ctx: &ServiceContext,
    ) -> Result<EnhanceOutcome, AiServiceError> {
        let started = std::time::Instant::now();
        let strength = options.strength.clamp(0.0, 1.0);
        let mut img = bitmap.to_rgba_image();
        let mut applied = Vec::new();
        ctx.report(5);

        // Stretch levels over the 1%–99% luma percentiles.
        ctx.check()?;
        if let Some((lo, hi)) = luma_percentiles(&img, 0.01, 0.99)
            && hi - lo > 8
        {
            let scale = 255.0 / (hi - lo) as f32;
            let lo = lo as f32;
            for px in img.pixels_mut() {
                for c in 0..3 {
                    let stretched = (px.0[c] as f32 - lo) * scale;
                    let mixed = px.0[c] as f32 + (stretched - px.0[c] as f32) * strength;
                    px.0[c] = mixed.round().clamp(0.0, 255.0) as u8;
                }
            }
            applied.push("auto_levels".to_string());
        }
        ctx.report(45);

        // Gentle saturation lift.
        ctx.check()?;
        let sat_factor = 1.0 + 0.12 * strength;
        for px in img.pixels_mut() {
            let (h, s, l) = rgb_to_hsl(
                px.0[0] as f32 / 255.0,
                px.0[1] as f32 / 255.0,
                px.0[2] as f32 / 255.0,
            );
            let (r, g, b) = hsl_to_rgb(h, (s * sat_factor).clamp(0.0, 1.0), l);
            px.0[0] = (r * 255.0).round().clamp(0.0, 255.0) as u8;
            px.0[1] = (g * 255.0).round().clamp(0.0, 255.0) as u8;
            px.0[2] = (b * 255.0).round().clamp(0.0, 255.0) as u8;
        }
        applied.push("saturation".to_string());
        ctx.report(80);

        // A touch of warmth.
        ctx.check()?;
        let shift = 4.0 * strength;
        for px in img.pixels_mut() {
            px.0[0] = (px.0[0] as f32 + shift).round().clamp(0.0, 255.0) as u8;
            px.0[2] = (px.0[2] as f32 - shift).round().clamp(0.0, 255.0) as u8;
        }
        applied.push("warmth".to_string());
        ctx.report(100);

        ctx.check()?;
        Ok(EnhanceOutcome {
            bitmap: Bitmap::new(img),
            applied_effects: applied,
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn process_background(
        &self,
        bitmap: &Bitmap,
        options: &BackgroundOptions,
        ctx: &ServiceContext,
    ) -> Result<BitmapOutcome, AiServiceError> {
        let started = std::time::Instant::now();
        let amount = options.amount.clamp(0.0, 1.0);
        let src = bitmap.to_rgba_image();
        let (w, h) = src.dimensions();
        if w == 0 || h == 0 {
            return Err(AiServiceError::Failed("empty bitmap".to_string()));
        }
        ctx.report(10);

        // Heuristic subject region: a centered ellipse; the effect ramps in
        // over a band outside it.
        ctx.check()?;
        let effected: RgbaImage = match options.mode {
            BackgroundMode::Blur => {
                let sigma = 2.0 + 6.0 * amount;
                imageops::blur(&src, sigma)
            }
            BackgroundMode::Desaturate => {
                let mut out = src.clone();
                for px in out.pixels_mut() {
                    let l = 0.299 * px.0[0] as f32
                        + 0.587 * px.0[1] as f32
                        + 0.114 * px.0[2] as f32;
                    let l = l.round().clamp(0.0, 255.0) as u8;
                    *px = Rgba([l, l, l, px.0[3]]);
                }
                out
            }
            BackgroundMode::Darken => {
                let scale = 1.0 - 0.6 * amount;
                let mut out = src.clone();
                for px in out.pixels_mut() {
                    for c in 0..3 {
                        px.0[c] = (px.0[c] as f32 * scale).round() as u8;
                    }
                }
                out
            }
        };
        ctx.report(60);

        ctx.check()?;
        let cx = w as f32 * 0.5;
        let cy = h as f32 * 0.5;
        let rx = w as f32 * 0.42;
        let ry = h as f32 * 0.42;
        let mut out = src.clone();
        for (x, y, px) in out.enumerate_pixels_mut() {
            let nx = (x as f32 + 0.5 - cx) / rx;
            let ny = (y as f32 + 0.5 - cy) / ry;
            let dist = (nx * nx + ny * ny).sqrt();
            // 0 inside the subject ellipse, 1 well outside it.
            let weight = ((dist - 0.8) / 0.5).clamp(0.0, 1.0) * amount;
            if weight > 0.0 {
                let eff = effected.get_pixel(x, y);
                for c in 0..3 {
                    let mixed = px.0[c] as f32 + (eff.0[c] as f32 - px.0[c] as f32) * weight;
                    px.0[c] = mixed.round() as u8;
                }
            }
        }
        ctx.report(100);

        ctx.check()?;
        Ok(BitmapOutcome {
            bitmap: Bitmap::new(out),
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn generative_edit(
        &self,
        bitmap: &Bitmap,
        options: &GenerativeOptions,
        ctx: &ServiceContext,
    ) -> Result<BitmapOutcome, AiServiceError> {
        let started = std::time::Instant::now();
        let strength = options.strength.clamp(0.0, 1.0);
        let src = bitmap.to_rgba_image();
        ctx.report(10);

        ctx.check()?;
        let restyled: RgbaImage = match options.style.to_ascii_lowercase().as_str() {
            "mono" => map_pixels(&src, |r, g, b| {
                let l = 0.299 * r + 0.587 * g + 0.114 * b;
                let l = (l - 128.0) * 1.15 + 128.0;
                (l, l, l)
            }),
            "vivid" => map_pixels(&src, |r, g, b| {
                let (h, s, l) = rgb_to_hsl(r / 255.0, g / 255.0, b / 255.0);
                let (nr, ng, nb) = hsl_to_rgb(h, (s * 1.35).clamp(0.0, 1.0), l);
                (
                    (nr * 255.0 - 128.0) * 1.1 + 128.0,
                    (ng * 255.0 - 128.0) * 1.1 + 128.0,
                    (nb * 255.0 - 128.0) * 1.1 + 128.0,
                )
            }),
            "dream" => {
                let soft = imageops::blur(&src, 3.0);
                let mut out = soft;
                for px in out.pixels_mut() {
                    for c in 0..3 {
                        px.0[c] = ((px.0[c] as f32) * 0.92 + 28.0).clamp(0.0, 255.0) as u8;
                    }
                }
                out
            }
            other => {
                return Err(AiServiceError::Failed(format!(
                    "unknown generative style '{}'",
                    other
                )));
            }
        };
        ctx.report(70);

        // Blend restyled pixels back over the source by strength. The prompt
        // is advisory for this local stand-in; remote models consume it.
        ctx.check()?;
        let mut out = src;
        for (px, re) in out.pixels_mut().zip(restyled.pixels()) {
            for c in 0..3 {
                let mixed = px.0[c] as f32 + (re.0[c] as f32 - px.0[c] as f32) * strength;
                px.0[c] = mixed.round().clamp(0.0, 255.0) as u8;
            }
        }
        ctx.report(100);

        ctx.check()?;
        Ok(BitmapOutcome {
            bitmap: Bitmap::new(out),
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn detect_objects(
        &self,
        bitmap: &Bitmap,
        ctx: &ServiceContext,
    ) -> Result<Vec<DetectedObject>, AiServiceError> {
        let src = bitmap.pixels();
        let (w, h) = src.dimensions();
        if w < 2 || h < 2 {
            return Ok(Vec::new());
        }
        ctx.report(20);

        // Edge-energy grid: cells with strong gradients are "interesting".
        const GRID: u32 = 8;
        let cell_w = (w / GRID).max(1);
        let cell_h = (h / GRID).max(1);
        let mut energy = vec![0.0f32; (GRID * GRID) as usize];

        ctx.check()?;
        for y in 0..h - 1 {
            for x in 0..w - 1 {
                let l = luma(src.get_pixel(x, y));
                let lr = luma(src.get_pixel(x + 1, y));
                let ld = luma(src.get_pixel(x, y + 1));
                let grad = (l - lr).abs() + (l - ld).abs();
                let gx = (x / cell_w).min(GRID - 1);
                let gy = (y / cell_h).min(GRID - 1);
                energy[(gy * GRID + gx) as usize] += grad;
            }
        }
        ctx.report(70);

        ctx.check()?;
        let mean = energy.iter().sum::<f32>() / energy.len() as f32;
        if mean <= f32::EPSILON {
            return Ok(Vec::new());
        }

        // Bounding box over every cell clearly above the mean.
        let mut min_gx = GRID;
        let mut min_gy = GRID;
        let mut max_gx = 0;
        let mut max_gy = 0;
        let mut peak = 0.0f32;
        for gy in 0..GRID {
            for gx in 0..GRID {
                let e = energy[(gy * GRID + gx) as usize];
                if e > mean * 1.5 {
                    min_gx = min_gx.min(gx);
                    min_gy = min_gy.min(gy);
                    max_gx = max_gx.max(gx);
                    max_gy = max_gy.max(gy);
                    peak = peak.max(e);
                }
            }
        }
        ctx.report(100);
        if min_gx > max_gx {
            return Ok(Vec::new());
        }

        let confidence = (peak / (peak + mean * 4.0)).clamp(0.05, 0.99);
        Ok(vec![DetectedObject {
            label: "subject".to_string(),
            confidence,
            x: (min_gx * cell_w) as f32,
            y: (min_gy * cell_h) as f32,
            width: ((max_gx - min_gx + 1) * cell_w).min(w) as f32,
            height: ((max_gy - min_gy + 1) * cell_h).min(h) as f32,
        }])
    }
}

fn luma(px: &Rgba<u8>) -> f32 {
    0.299 * px.0[0] as f32 + 0.587 * px.0[1] as f32 + 0.114 * px.0[2] as f32
}

fn map_pixels<F>(src: &RgbaImage, f: F) -> RgbaImage
where
    F: Fn(f32, f32, f32) -> (f32, f32, f32),
{
    let mut out = src.clone();
    for px in out.pixels_mut() {
        let (r, g, b) = f(px.0[0] as f32, px.0[1] as f32, px.0[2] as f32);
        px.0[0] = r.round().clamp(0.0, 255.0) as u8;
        px.0[1] = g.round().clamp(0.0, 255.0) as u8;
        px.0[2] = b.round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Luma values at the given percentiles, or `None` for an empty image.
fn luma_percentiles(img: &RgbaImage, lo: f32, hi: f32) -> Option<(u32, u32)> {
    let total = img.width() as u64 * img.height() as u64;
    if total == 0 {
        return None;
    }
    let mut histogram = [0u64; 256];
    for px in img.pixels() {
        histogram[luma(px).round().clamp(0.0, 255.0) as usize] += 1;
    }

    let lo_target = (total as f64 * lo as f64) as u64;
    let hi_target = (total as f64 * hi as f64) as u64;
    let mut cumulative = 0u64;
    let mut lo_value = 0u32;
    let mut hi_value = 255u32;
    let mut lo_found = false;
    for (value, count) in histogram.iter().enumerate() {
        cumulative += count;
        if !lo_found && cumulative >= lo_target.max(1) {
            lo_value = value as u32;
            lo_found = true;
        }
        if cumulative >= hi_target.max(1) {
            hi_value = value as u32;
            break;
        }
    }
    Some((lo_value, hi_value))
}
