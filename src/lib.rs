//! PostFE — the image-editing session engine behind a social-post composer.
//!
//! The heart of the crate is [`EditSession`]: it owns a working bitmap
//! through a chain of edits (transforms, crop, free-hand drawing, text and
//! sticker overlays, filters, adjustments, async AI enhancements), keeps a
//! bounded undo/redo history of snapshots, and runs at most one asynchronous
//! enhancement at a time with cooperative cancellation.

#![allow(dead_code)] // API surface kept for the composer UI and scripting shells

pub mod ai;
pub mod bitmap;
pub mod cli;
pub mod error;
pub mod history;
pub mod io;
pub mod logger;
pub mod ops;
pub mod project;
pub mod session;
pub mod tools;

pub use ai::{
    AsyncOperationState, AsyncStatus, BackgroundMode, BackgroundOptions, DetectedObject,
    EnhanceOptions, EnhancementService, GenerativeOptions, LocalEnhancementService,
};
pub use bitmap::Bitmap;
pub use error::{AiServiceError, DraftError, EditError, TransformError, ValidationError};
pub use history::{HistoryEntry, HistoryManager};
pub use ops::crop::{AspectRatio, CropHandle, CropRect};
pub use ops::overlay::{
    StickerGlyph, StickerOverlay, StickerPatch, TextAlignment, TextOverlay, TextPatch, TextShadow,
};
pub use ops::transform::FlipAxis;
pub use session::{EditSession, SessionSnapshot, TransformState};
pub use tools::{DrawTool, Tool};
