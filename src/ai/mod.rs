// ============================================================================
// AI ENHANCEMENT SERVICES — opaque, replaceable, cooperatively cancellable
// ============================================================================
//
// The engine never knows what an enhancement model is; it only drives the
// trait below from a worker thread. Implementations must check the
// cancellation token between work units and bail with `Cancelled` promptly,
// because cancellation is cooperative, never preemptive.

pub mod local;
pub mod orchestrator;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::bitmap::Bitmap;
use crate::error::AiServiceError;

pub use local::LocalEnhancementService;
pub use orchestrator::{
    AsyncCompletion, AsyncOperationState, AsyncOrchestrator, AsyncOutcome, AsyncRequest,
    AsyncStatus,
};

// ----------------------------------------------------------------------------
// Cancellation
// ----------------------------------------------------------------------------

/// Shared flag marking an in-flight request as superseded or aborted.
///
/// Once set it never clears; a new request always gets a fresh token.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Worker-side handle a service call uses to report progress and observe
/// cancellation.
pub struct ServiceContext {
    token: CancelToken,
    progress: Box<dyn Fn(u8) + Send + Sync>,
}

impl ServiceContext {
    pub fn new(token: CancelToken, progress: Box<dyn Fn(u8) + Send + Sync>) -> Self {
        Self { token, progress }
    }

    /// Report 0–100 progress. Silently dropped once the request is stale.
    pub fn report(&self, pct: u8) {
        if !self.token.is_cancelled() {
            (self.progress)(pct.min(100));
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Bail out with `Cancelled` when the token has been set.
    pub fn check(&self) -> Result<(), AiServiceError> {
        if self.token.is_cancelled() {
            Err(AiServiceError::Cancelled)
        } else {
            Ok(())
        }
    }
}

// ----------------------------------------------------------------------------
// Request options and outcomes
// ----------------------------------------------------------------------------

/// Tuning for the one-tap auto enhancement.
#[derive(Clone, Debug)]
pub struct EnhanceOptions {
    /// 0.0–1.0 blend of the full correction.
    pub strength: f32,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self { strength: 1.0 }
    }
}

/// What to do with everything outside the subject region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackgroundMode {
    Blur,
    Desaturate,
    Darken,
}

#[derive(Clone, Debug)]
pub struct BackgroundOptions {
    pub mode: BackgroundMode,
    /// Effect strength, 0.0–1.0.
    pub amount: f32,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self {
            mode: BackgroundMode::Blur,
            amount: 0.7,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GenerativeOptions {
    /// Named restyle, e.g. `mono`, `vivid`, `dream`.
    pub style: String,
    /// Free-text guidance recorded with the result.
    pub prompt: String,
    /// 0.0–1.0 blend between source and restyled pixels.
    pub strength: f32,
}

impl Default for GenerativeOptions {
    fn default() -> Self {
        Self {
            style: "vivid".to_string(),
            prompt: String::new(),
            strength: 0.8,
        }
    }
}

/// One detected region, in source-bitmap pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedObject {
    pub label: String,
    pub confidence: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Result of a bitmap-producing enhancement.
#[derive(Clone, Debug)]
pub struct EnhanceOutcome {
    pub bitmap: Bitmap,
    /// Names of the corrections that were actually applied.
    pub applied_effects: Vec<String>,
    pub processing_time_ms: u64,
}

#[derive(Clone, Debug)]
pub struct BitmapOutcome {
    pub bitmap: Bitmap,
    pub processing_time_ms: u64,
}

// ----------------------------------------------------------------------------
// The service interface
// ----------------------------------------------------------------------------

/// The four enhancement entry points, implemented remotely or locally.
///
/// Calls run on the orchestrator's worker thread: stream progress through
/// `ctx.report`, poll `ctx.check()` between work units, and return
/// [`AiServiceError::Cancelled`] as soon as the token is set.
pub trait EnhancementService: Send + Sync {
    fn enhance(
        &self,
        bitmap: &Bitmap,
        options: &EnhanceOptions,
        ctx: &ServiceContext,
    ) -> Result<EnhanceOutcome, AiServiceError>;

    fn process_background(
        &self,
        bitmap: &Bitmap,
        options: &BackgroundOptions,
        ctx: &ServiceContext,
    ) -> Result<BitmapOutcome, AiServiceError>;

    fn generative_edit(
        &self,
        bitmap: &Bitmap,
        options: &GenerativeOptions,
        ctx: &ServiceContext,
    ) -> Result<BitmapOutcome, AiServiceError>;

    fn detect_objects(
        &self,
        bitmap: &Bitmap,
        ctx: &ServiceContext,
    ) -> Result<Vec<DetectedObject>, AiServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_sticky() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_context_swallows_progress_after_cancel() {
        use std::sync::Mutex;
        let seen: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let token = CancelToken::new();
        let ctx = ServiceContext::new(
            token.clone(),
            Box::new(move |p| sink.lock().unwrap().push(p)),
        );

        ctx.report(10);
        token.cancel();
        ctx.report(50);
        assert_eq!(*seen.lock().unwrap(), vec![10]);
        assert!(ctx.check().is_err());
    }
}
