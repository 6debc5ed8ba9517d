// ============================================================================
// PostFE CLI — headless batch editing via command-line arguments
// ============================================================================
//
// Usage examples:
//   postfe --input photo.png --rotate 90 --filter sepia --output out.png
//   postfe -i photo.jpg --adjust brightness=12 --adjust contrast=8 -o out.jpg
//   postfe -i "shots/*.png" --enhance --output-dir processed/
//   postfe -i photo.png --caption "golden hour" --crop 0,80,1080,1350 -o post.png
//
// Edits are applied in a fixed order: rotate, flip, crop, filter,
// adjustments, caption, enhance. Everything runs through one EditSession per
// input file, exactly the way the composer UI drives it.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;

use crate::ai::{AsyncStatus, EnhanceOptions, LocalEnhancementService};
use crate::io::{SaveFormat, load_bitmap, save_bitmap};
use crate::ops::crop::CropRect;
use crate::ops::overlay::{TextAlignment, TextOverlay, TextShadow};
use crate::ops::transform::FlipAxis;
use crate::session::EditSession;

// ============================================================================
// CLI argument definition (clap derive)
// ============================================================================

/// PostFE headless post editor.
///
/// Apply the composer's edit pipeline to image files without opening a UI.
#[derive(Parser, Debug)]
#[command(
    name = "postfe",
    about = "PostFE headless batch post editor",
    long_about = "Apply rotate/flip/crop, filters, adjustments, captions and the\n\
                  auto-enhancer to image files without opening the composer UI.\n\n\
                  Example:\n  \
                  postfe --input photo.png --rotate 90 --filter sepia --output out.png\n  \
                  postfe -i \"*.jpg\" --enhance --output-dir processed/"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Rotate clockwise by a multiple of 90 degrees.
    #[arg(long, value_name = "DEG")]
    pub rotate: Option<i32>,

    /// Mirror the image: h (horizontal) or v (vertical).
    #[arg(long, value_name = "h|v")]
    pub flip: Option<String>,

    /// Crop rectangle in source pixels.
    #[arg(long, value_name = "X,Y,W,H")]
    pub crop: Option<String>,

    /// Named filter: grayscale, sepia, invert, vintage, cool, warm.
    #[arg(long, value_name = "NAME")]
    pub filter: Option<String>,

    /// Adjustment as kind=value (brightness, contrast, saturation, exposure).
    /// Repeatable; applied in the order given.
    #[arg(long, value_name = "KIND=VALUE")]
    pub adjust: Vec<String>,

    /// Caption text drawn near the bottom of the image.
    #[arg(long, value_name = "TEXT")]
    pub caption: Option<String>,

    /// Run the local auto-enhancer after the other edits.
    #[arg(long)]
    pub enhance: bool,

    /// JPEG quality (1-100, default 90).
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let mut failures = 0usize;
    for input in &inputs {
        let started = Instant::now();
        match process_one(input, &args) {
            Ok(output) => {
                if args.verbose {
                    println!(
                        "{} -> {} ({} ms)",
                        input.display(),
                        output.display(),
                        started.elapsed().as_millis()
                    );
                }
            }
            Err(message) => {
                eprintln!("error: {}: {}", input.display(), message);
                failures += 1;
            }
        }
    }

    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Apply the full edit pipeline to one file.
fn process_one(input: &Path, args: &CliArgs) -> Result<PathBuf, String> {
    let bitmap = load_bitmap(input)?;
    let mut session = EditSession::new(bitmap, Arc::new(LocalEnhancementService));

    if let Some(degrees) = args.rotate {
        session.rotate(degrees).map_err(|e| e.to_string())?;
    }
    if let Some(axis) = &args.flip {
        let axis = FlipAxis::parse(axis).map_err(|e| e.to_string())?;
        session.flip(axis).map_err(|e| e.to_string())?;
    }
    if let Some(spec) = &args.crop {
        let rect = parse_crop(spec)?;
        session.show_crop_tool();
        session.set_crop_rect(rect);
        session.apply_crop().map_err(|e| e.to_string())?;
    }
    if let Some(name) = &args.filter {
        session.apply_filter(name).map_err(|e| e.to_string())?;
    }
    for spec in &args.adjust {
        let (kind, value) = parse_adjust(spec)?;
        session
            .apply_adjustment(&kind, value)
            .map_err(|e| e.to_string())?;
    }
    if let Some(caption) = &args.caption {
        let current = session.current_bitmap();
        let mut text = TextOverlay::new(
            caption.clone(),
            current.width() as f32 * 0.5,
            current.height() as f32 * 0.92,
        );
        text.alignment = TextAlignment::Center;
        text.font_size = (current.height() as f32 * 0.05).max(16.0);
        text.shadow = Some(TextShadow {
            dx: 1.5,
            dy: 1.5,
            color: [0, 0, 0, 180],
        });
        session.add_text_overlay(text);
        session.flatten_overlays().map_err(|e| e.to_string())?;
    }
    if args.enhance {
        run_enhance_blocking(&mut session)?;
    }

    let output = output_path(input, args)?;
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create {}: {}", parent.display(), e))?;
    }
    let format = SaveFormat::from_extension(output.extension().and_then(|e| e.to_str()));
    save_bitmap(&session.current_bitmap(), &output, format, args.quality)?;
    Ok(output)
}

/// Drive the async orchestrator to completion on this thread.
fn run_enhance_blocking(session: &mut EditSession) -> Result<(), String> {
    session.run_enhance(EnhanceOptions::default());
    let deadline = Instant::now() + Duration::from_secs(120);
    loop {
        let state = session.poll_async();
        match state.status {
            AsyncStatus::Error => {
                let message = state.error.clone().unwrap_or_else(|| "unknown".to_string());
                session.acknowledge_async_error();
                return Err(format!("enhance failed: {}", message));
            }
            AsyncStatus::Processing => {}
            // Success decays to idle on its own; either way we are done once
            // the commit has landed.
            AsyncStatus::Success | AsyncStatus::Idle => return Ok(()),
        }
        if Instant::now() > deadline {
            session.cancel_async();
            return Err("enhance timed out".to_string());
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

// ============================================================================
// Argument parsing helpers
// ============================================================================

/// Expand glob patterns / literal paths into concrete files.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for pattern in patterns {
        let mut matched = false;
        if let Ok(paths) = glob::glob(pattern) {
            for path in paths.flatten() {
                if path.is_file() {
                    files.push(path);
                    matched = true;
                }
            }
        }
        // A literal path with no glob hits still gets a chance, so the error
        // message points at the missing file rather than "no matches".
        if !matched {
            files.push(PathBuf::from(pattern));
        }
    }
    files
}

/// Parse "x,y,w,h" into a crop rect.
fn parse_crop(spec: &str) -> Result<CropRect, String> {
    let parts: Vec<f32> = spec
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|_| format!("invalid --crop '{}', expected X,Y,W,H", spec))?;
    if parts.len() != 4 {
        return Err(format!("invalid --crop '{}', expected 4 values", spec));
    }
    Ok(CropRect::new(parts[0], parts[1], parts[2], parts[3]))
}

/// Parse "kind=value" into an adjustment pair.
fn parse_adjust(spec: &str) -> Result<(String, f32), String> {
    let (kind, value) = spec
        .split_once('=')
        .ok_or_else(|| format!("invalid --adjust '{}', expected KIND=VALUE", spec))?;
    let value: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid --adjust value in '{}'", spec))?;
    Ok((kind.trim().to_string(), value))
}

fn output_path(input: &Path, args: &CliArgs) -> Result<PathBuf, String> {
    if let Some(output) = &args.output {
        return Ok(output.clone());
    }
    if let Some(dir) = &args.output_dir {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let ext = input
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("png")
            .to_string();
        return Ok(dir.join(format!("{}_edited.{}", stem, ext)));
    }
    Err("no --output or --output-dir given".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_adjust() {
        assert_eq!(
            parse_adjust("brightness=12.5").unwrap(),
            ("brightness".to_string(), 12.5)
        );
        assert_eq!(
            parse_adjust(" contrast = -8 ").unwrap(),
            ("contrast".to_string(), -8.0)
        );
        assert!(parse_adjust("brightness").is_err());
        assert!(parse_adjust("brightness=abc").is_err());
    }

    #[test]
    fn test_parse_crop() {
        let rect = parse_crop("10, 20, 300, 400").unwrap();
        assert_eq!(rect.x, 10.0);
        assert_eq!(rect.height, 400.0);
        assert!(parse_crop("10,20").is_err());
        assert!(parse_crop("a,b,c,d").is_err());
    }

    #[test]
    fn test_output_path_rules() {
        let args = CliArgs::parse_from(["postfe", "-i", "a.png", "--output-dir", "out"]);
        let path = output_path(Path::new("shots/a.png"), &args).unwrap();
        assert_eq!(path, PathBuf::from("out/a_edited.png"));

        let args = CliArgs::parse_from(["postfe", "-i", "a.png"]);
        assert!(output_path(Path::new("a.png"), &args).is_err());
    }
}
