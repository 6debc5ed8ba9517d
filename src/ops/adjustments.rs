// ============================================================================
// PARAMETRIC ADJUSTMENTS — brightness, contrast, saturation, exposure
// ============================================================================

use crate::bitmap::Bitmap;
use crate::error::{TransformError, ValidationError};
use crate::ops::filters::pixel_transform;

/// The closed set of parametric adjustments exposed to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdjustmentKind {
    /// Additive offset, -100..100.
    Brightness,
    /// Contrast around mid-gray, -100..100.
    Contrast,
    /// Saturation delta, -100..100 (0 = unchanged).
    Saturation,
    /// Exposure in EV stops, -5..5 (gain of 2^value).
    Exposure,
}

impl AdjustmentKind {
    pub fn parse(kind: &str) -> Result<AdjustmentKind, ValidationError> {
        match kind.to_ascii_lowercase().as_str() {
            "brightness" => Ok(AdjustmentKind::Brightness),
            "contrast" => Ok(AdjustmentKind::Contrast),
            "saturation" => Ok(AdjustmentKind::Saturation),
            "exposure" => Ok(AdjustmentKind::Exposure),
            _ => Err(ValidationError::UnknownAdjustment(kind.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AdjustmentKind::Brightness => "brightness",
            AdjustmentKind::Contrast => "contrast",
            AdjustmentKind::Saturation => "saturation",
            AdjustmentKind::Exposure => "exposure",
        }
    }

    /// Inclusive value range; inputs are clamped into it before use.
    pub fn range(&self) -> (f32, f32) {
        match self {
            AdjustmentKind::Brightness => (-100.0, 100.0),
            AdjustmentKind::Contrast => (-100.0, 100.0),
            AdjustmentKind::Saturation => (-100.0, 100.0),
            AdjustmentKind::Exposure => (-5.0, 5.0),
        }
    }

    pub fn all() -> &'static [AdjustmentKind] {
        &[
            AdjustmentKind::Brightness,
            AdjustmentKind::Contrast,
            AdjustmentKind::Saturation,
            AdjustmentKind::Exposure,
        ]
    }
}

/// Apply one adjustment at the given strength, producing a new bitmap.
pub fn apply_adjustment(
    bitmap: &Bitmap,
    kind: AdjustmentKind,
    value: f32,
) -> Result<Bitmap, TransformError> {
    let (lo, hi) = kind.range();
    let value = value.clamp(lo, hi);

    match kind {
        AdjustmentKind::Brightness => {
            let offset = value * 2.55;
            pixel_transform(bitmap, move |r, g, b, a| {
                (r + offset, g + offset, b + offset, a)
            })
        }
        AdjustmentKind::Contrast => {
            let c = value * 2.55;
            let factor = (259.0 * (c + 255.0)) / (255.0 * (259.0 - c));
            pixel_transform(bitmap, move |r, g, b, a| {
                (
                    factor * (r - 128.0) + 128.0,
                    factor * (g - 128.0) + 128.0,
                    factor * (b - 128.0) + 128.0,
                    a,
                )
            })
        }
        AdjustmentKind::Saturation => {
            let sat_factor = 1.0 + value / 100.0;
            pixel_transform(bitmap, move |r, g, b, a| {
                let (h, s, l) = rgb_to_hsl(r / 255.0, g / 255.0, b / 255.0);
                let ns = (s * sat_factor).clamp(0.0, 1.0);
                let (nr, ng, nb) = hsl_to_rgb(h, ns, l);
                (nr * 255.0, ng * 255.0, nb * 255.0, a)
            })
        }
        AdjustmentKind::Exposure => {
            let gain = 2.0f32.powf(value);
            pixel_transform(bitmap, move |r, g, b, a| (r * gain, g * gain, b * gain, a))
        }
    }
}

/// RGB (0..1) to HSL (h in 0..1).
pub fn rgb_to_hsl(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) * 0.5;

    if (max - min).abs() < 1e-6 {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if (max - r).abs() < 1e-6 {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if (max - g).abs() < 1e-6 {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    } / 6.0;

    (h, s, l)
}

/// HSL (h in 0..1) back to RGB (0..1).
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    if s < 1e-6 {
        return (l, l, l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let hue = |mut t: f32| -> f32 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };

    (hue(h + 1.0 / 3.0), hue(h), hue(h - 1.0 / 3.0))
}
