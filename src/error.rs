// ============================================================================
// ERROR TYPES — per-domain enums, combined at the session surface
// ============================================================================

use std::fmt;

/// Malformed tool parameters, rejected before any raster work happens.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Crop rectangle lies (partly) outside the bitmap.
    CropOutOfBounds {
        rect: (i64, i64, i64, i64),
        bitmap: (u32, u32),
    },
    /// Crop rectangle has no pixel area.
    EmptyCropRect,
    /// Rotation is only supported in quarter turns.
    UnsupportedRotation(i32),
    /// `apply_filter` received a name that maps to no filter.
    UnknownFilter(String),
    /// `apply_adjustment` received a kind that maps to no adjustment.
    UnknownAdjustment(String),
    /// Flip axis string was neither horizontal nor vertical.
    UnknownFlipAxis(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::CropOutOfBounds { rect, bitmap } => write!(
                f,
                "crop rect {}x{} at ({}, {}) exceeds bitmap {}x{}",
                rect.2, rect.3, rect.0, rect.1, bitmap.0, bitmap.1
            ),
            ValidationError::EmptyCropRect => write!(f, "crop rect has zero area"),
            ValidationError::UnsupportedRotation(deg) => {
                write!(f, "rotation must be a multiple of 90 degrees, got {}", deg)
            }
            ValidationError::UnknownFilter(name) => write!(f, "unknown filter '{}'", name),
            ValidationError::UnknownAdjustment(kind) => {
                write!(f, "unknown adjustment '{}'", kind)
            }
            ValidationError::UnknownFlipAxis(axis) => write!(f, "unknown flip axis '{}'", axis),
        }
    }
}

/// A raster operation could not produce a bitmap. The session state is left
/// untouched when this surfaces; no partial history entry is ever written.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformError {
    /// The source bitmap has no readable pixels (zero-sized).
    UnreadableSource,
    /// The produced buffer did not round-trip into an image.
    RasterFailed(String),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::UnreadableSource => write!(f, "source bitmap is unreadable"),
            TransformError::RasterFailed(msg) => write!(f, "raster operation failed: {}", msg),
        }
    }
}

/// Failure modes of the external enhancement services.
///
/// `Cancelled` is not a user-facing failure: the orchestrator swallows it and
/// resolves the operation state to idle.
#[derive(Debug, Clone, PartialEq)]
pub enum AiServiceError {
    /// The service is not reachable / not configured.
    Unavailable(String),
    /// The service rejected the request or failed mid-flight.
    Failed(String),
    /// The request's cancellation token was set; the result is stale.
    Cancelled,
}

impl fmt::Display for AiServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiServiceError::Unavailable(msg) => write!(f, "service unavailable: {}", msg),
            AiServiceError::Failed(msg) => write!(f, "enhancement failed: {}", msg),
            AiServiceError::Cancelled => write!(f, "operation cancelled"),
        }
    }
}

/// Errors around the .pfd draft file format.
#[derive(Debug)]
pub enum DraftError {
    Io(std::io::Error),
    /// The file does not start with a known draft magic.
    BadMagic(String),
    Encode(String),
    Decode(String),
}

impl fmt::Display for DraftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftError::Io(e) => write!(f, "draft i/o error: {}", e),
            DraftError::BadMagic(magic) => write!(f, "not a draft file (magic '{}')", magic),
            DraftError::Encode(msg) => write!(f, "failed to encode draft: {}", msg),
            DraftError::Decode(msg) => write!(f, "failed to decode draft: {}", msg),
        }
    }
}

impl From<std::io::Error> for DraftError {
    fn from(e: std::io::Error) -> Self {
        DraftError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for DraftError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        DraftError::Decode(e.to_string())
    }
}

/// Union error for the synchronous session operations.
#[derive(Debug, Clone, PartialEq)]
pub enum EditError {
    Validation(ValidationError),
    Transform(TransformError),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::Validation(e) => write!(f, "{}", e),
            EditError::Transform(e) => write!(f, "{}", e),
        }
    }
}

impl From<ValidationError> for EditError {
    fn from(e: ValidationError) -> Self {
        EditError::Validation(e)
    }
}

impl From<TransformError> for EditError {
    fn from(e: TransformError) -> Self {
        EditError::Transform(e)
    }
}

impl std::error::Error for ValidationError {}
impl std::error::Error for TransformError {}
impl std::error::Error for AiServiceError {}
impl std::error::Error for DraftError {}
impl std::error::Error for EditError {}
