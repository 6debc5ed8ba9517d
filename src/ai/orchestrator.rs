// ============================================================================
// ASYNC OPERATION ORCHESTRATOR — one in-flight enhancement, token-guarded
// ============================================================================
//
// Each request runs on its own worker thread and streams token-tagged
// messages back over a channel; the session pumps the channel from `poll`.
// A message whose token is not the current one belongs to a cancelled or
// superseded request and is dropped without touching state — that is the
// entire cancellation contract, checked at the progress callback and again
// at final resolution.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::{Duration, Instant};

use crate::bitmap::Bitmap;
use crate::error::AiServiceError;
use crate::log_info;

use super::{
    BackgroundOptions, CancelToken, DetectedObject, EnhanceOptions, EnhancementService,
    GenerativeOptions, ServiceContext,
};

/// How long a completed operation keeps showing `Success` before the state
/// decays back to `Idle` (measured at poll time).
const SUCCESS_DISPLAY: Duration = Duration::from_millis(1200);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AsyncStatus {
    #[default]
    Idle,
    Processing,
    Success,
    Error,
}

/// Transient operation state mirrored to the caller. Never stored in history.
#[derive(Clone, Debug, Default)]
pub struct AsyncOperationState {
    pub status: AsyncStatus,
    /// 0–100.
    pub progress: u8,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl AsyncOperationState {
    fn idle() -> Self {
        Self::default()
    }
}

/// One of the four enhancement requests, carrying its options.
#[derive(Clone, Debug)]
pub enum AsyncRequest {
    Enhance(EnhanceOptions),
    Background(BackgroundOptions),
    GenerativeEdit(GenerativeOptions),
    DetectObjects,
}

impl AsyncRequest {
    /// History action label for a committed result.
    pub fn label(&self) -> &'static str {
        match self {
            AsyncRequest::Enhance(_) => "enhance",
            AsyncRequest::Background(_) => "background",
            AsyncRequest::GenerativeEdit(_) => "generative_edit",
            AsyncRequest::DetectObjects => "detect_objects",
        }
    }

    fn start_message(&self) -> &'static str {
        match self {
            AsyncRequest::Enhance(_) => "Enhancing photo…",
            AsyncRequest::Background(_) => "Processing background…",
            AsyncRequest::GenerativeEdit(_) => "Applying generative edit…",
            AsyncRequest::DetectObjects => "Detecting objects…",
        }
    }
}

/// What a finished request produced.
#[derive(Clone, Debug)]
pub enum AsyncOutcome {
    Bitmap {
        bitmap: Bitmap,
        applied_effects: Vec<String>,
    },
    Objects(Vec<DetectedObject>),
}

/// Delivered by `poll` exactly once per successfully finished request.
#[derive(Clone, Debug)]
pub struct AsyncCompletion {
    pub label: &'static str,
    pub outcome: AsyncOutcome,
    pub elapsed_ms: u64,
}

enum WorkerMessage {
    Progress {
        token: u64,
        pct: u8,
    },
    Completed {
        token: u64,
        outcome: AsyncOutcome,
        elapsed_ms: u64,
    },
    Failed {
        token: u64,
        error: AiServiceError,
    },
}

pub struct AsyncOrchestrator {
    service: Arc<dyn EnhancementService>,
    state: AsyncOperationState,
    /// Monotonic request token; bumped on every start and every cancel.
    token: u64,
    cancel: Option<CancelToken>,
    tx: Sender<WorkerMessage>,
    rx: Receiver<WorkerMessage>,
    active_label: Option<&'static str>,
    success_since: Option<Instant>,
}

impl AsyncOrchestrator {
    pub fn new(service: Arc<dyn EnhancementService>) -> Self {
        let (tx, rx) = channel();
        Self {
            service,
            state: AsyncOperationState::idle(),
            token: 0,
            cancel: None,
            tx,
            rx,
            active_label: None,
            success_since: None,
        }
    }

    pub fn state(&self) -> &AsyncOperationState {
        &self.state
    }

    pub fn is_processing(&self) -> bool {
        self.state.status == AsyncStatus::Processing
    }

    /// Start a request against the given bitmap.
    ///
    /// An already-active request is cancelled first: its token is invalidated
    /// so any result it later produces is discarded unseen.
    pub fn run(&mut self, bitmap: Bitmap, request: AsyncRequest) {
        if let Some(active) = self.cancel.take() {
            active.cancel();
        }
        self.token = self.token.wrapping_add(1);
        let token = self.token;

        let cancel = CancelToken::new();
        self.cancel = Some(cancel.clone());
        self.active_label = Some(request.label());
        self.success_since = None;
        self.state = AsyncOperationState {
            status: AsyncStatus::Processing,
            progress: 0,
            message: Some(request.start_message().to_string()),
            error: None,
        };

        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        let progress_tx = self.tx.clone();

        std::thread::spawn(move || {
            let started = Instant::now();
            let ctx = ServiceContext::new(
                cancel,
                Box::new(move |pct| {
                    let _ = progress_tx.send(WorkerMessage::Progress { token, pct });
                }),
            );

            let result = match &request {
                AsyncRequest::Enhance(options) => service
                    .enhance(&bitmap, options, &ctx)
                    .map(|out| AsyncOutcome::Bitmap {
                        bitmap: out.bitmap,
                        applied_effects: out.applied_effects,
                    }),
                AsyncRequest::Background(options) => service
                    .process_background(&bitmap, options, &ctx)
                    .map(|out| AsyncOutcome::Bitmap {
                        bitmap: out.bitmap,
                        applied_effects: vec![format!("background_{:?}", options.mode).to_lowercase()],
                    }),
                AsyncRequest::GenerativeEdit(options) => service
                    .generative_edit(&bitmap, options, &ctx)
                    .map(|out| AsyncOutcome::Bitmap {
                        bitmap: out.bitmap,
                        applied_effects: vec![format!("style_{}", options.style)],
                    }),
                AsyncRequest::DetectObjects => {
                    service.detect_objects(&bitmap, &ctx).map(AsyncOutcome::Objects)
                }
            };

            let elapsed_ms = started.elapsed().as_millis() as u64;
            let message = match result {
                Ok(outcome) => WorkerMessage::Completed {
                    token,
                    outcome,
                    elapsed_ms,
                },
                Err(error) => WorkerMessage::Failed { token, error },
            };
            // The receiver only disappears when the session is gone; a send
            // failure then just means nobody is left to care.
            let _ = tx.send(message);
        });
    }

    /// Abort the in-flight request, if any. State snaps to idle immediately;
    /// whatever the worker eventually resolves to is discarded by token.
    pub fn cancel(&mut self) {
        if let Some(active) = self.cancel.take() {
            active.cancel();
        }
        self.token = self.token.wrapping_add(1);
        self.state = AsyncOperationState::idle();
        self.active_label = None;
        self.success_since = None;
    }

    /// Clear a sticky error back to idle (the user dismissed it).
    pub fn acknowledge_error(&mut self) {
        if self.state.status == AsyncStatus::Error {
            self.state = AsyncOperationState::idle();
        }
    }

    /// Pump worker messages. Returns a completion exactly once per finished
    /// current-token request; the caller commits it to history.
    pub fn poll(&mut self) -> Option<AsyncCompletion> {
        let mut completion = None;

        while let Ok(message) = self.rx.try_recv() {
            match message {
                WorkerMessage::Progress { token, pct } if token == self.token => {
                    if self.state.status == AsyncStatus::Processing {
                        self.state.progress = pct;
                    }
                }
                WorkerMessage::Completed {
                    token,
                    outcome,
                    elapsed_ms,
                } if token == self.token => {
                    self.state.status = AsyncStatus::Success;
                    self.state.progress = 100;
                    self.state.message = Some("Done".to_string());
                    self.success_since = Some(Instant::now());
                    self.cancel = None;
                    completion = Some(AsyncCompletion {
                        label: self.active_label.take().unwrap_or("enhance"),
                        outcome,
                        elapsed_ms,
                    });
                }
                WorkerMessage::Failed { token, error } if token == self.token => {
                    self.cancel = None;
                    self.active_label = None;
                    match error {
                        // A cancel that raced its own token bump: not a failure.
                        AiServiceError::Cancelled => {
                            self.state = AsyncOperationState::idle();
                        }
                        other => {
                            self.state.status = AsyncStatus::Error;
                            self.state.message = None;
                            self.state.error = Some(other.to_string());
                        }
                    }
                }
                // Stale token: the request was cancelled or superseded.
                _ => {
                    log_info!("discarding stale async result");
                }
            }
        }

        if self.state.status == AsyncStatus::Success
            && let Some(since) = self.success_since
            && since.elapsed() >= SUCCESS_DISPLAY
        {
            self.state = AsyncOperationState::idle();
            self.success_since = None;
        }

        completion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{BitmapOutcome, EnhanceOutcome};
    use crate::error::AiServiceError;
    use image::{Rgba, RgbaImage};
    use std::sync::Mutex;
    use std::sync::mpsc;

    fn bmp() -> Bitmap {
        Bitmap::new(RgbaImage::from_pixel(4, 4, Rgba([128, 128, 128, 255])))
    }

    /// Test double: blocks in `enhance` until released, then reports whether
    /// it was cancelled.
    struct GatedService {
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl GatedService {
        fn new() -> (Arc<Self>, mpsc::Sender<()>) {
            let (tx, rx) = mpsc::channel();
            (
                Arc::new(Self {
                    release: Mutex::new(rx),
                }),
                tx,
            )
        }
    }

    impl EnhancementService for GatedService {
        fn enhance(
            &self,
            bitmap: &Bitmap,
            _options: &EnhanceOptions,
            ctx: &ServiceContext,
        ) -> Result<EnhanceOutcome, AiServiceError> {
            ctx.report(25);
            // Wait for the test to let us finish.
            let _ = self.release.lock().unwrap().recv();
            ctx.check()?;
            Ok(EnhanceOutcome {
                bitmap: Bitmap::new(bitmap.to_rgba_image()),
                applied_effects: vec!["auto".to_string()],
                processing_time_ms: 1,
            })
        }

        fn process_background(
            &self,
            bitmap: &Bitmap,
            _options: &BackgroundOptions,
            _ctx: &ServiceContext,
        ) -> Result<BitmapOutcome, AiServiceError> {
            Ok(BitmapOutcome {
                bitmap: Bitmap::new(bitmap.to_rgba_image()),
                processing_time_ms: 1,
            })
        }

        fn generative_edit(
            &self,
            bitmap: &Bitmap,
            _options: &GenerativeOptions,
            _ctx: &ServiceContext,
        ) -> Result<BitmapOutcome, AiServiceError> {
            Ok(BitmapOutcome {
                bitmap: Bitmap::new(bitmap.to_rgba_image()),
                processing_time_ms: 1,
            })
        }

        fn detect_objects(
            &self,
            _bitmap: &Bitmap,
            _ctx: &ServiceContext,
        ) -> Result<Vec<DetectedObject>, AiServiceError> {
            Ok(Vec::new())
        }
    }

    /// Service that always fails.
    struct FailingService;

    impl EnhancementService for FailingService {
        fn enhance(
            &self,
            _bitmap: &Bitmap,
            _options: &EnhanceOptions,
            _ctx: &ServiceContext,
        ) -> Result<EnhanceOutcome, AiServiceError> {
            Err(AiServiceError::Failed("model exploded".to_string()))
        }

        fn process_background(
            &self,
            _bitmap: &Bitmap,
            _options: &BackgroundOptions,
            _ctx: &ServiceContext,
        ) -> Result<BitmapOutcome, AiServiceError> {
            Err(AiServiceError::Unavailable("offline".to_string()))
        }

        fn generative_edit(
            &self,
            _bitmap: &Bitmap,
            _options: &GenerativeOptions,
            _ctx: &ServiceContext,
        ) -> Result<BitmapOutcome, AiServiceError> {
            Err(AiServiceError::Failed("no".to_string()))
        }

        fn detect_objects(
            &self,
            _bitmap: &Bitmap,
            _ctx: &ServiceContext,
        ) -> Result<Vec<DetectedObject>, AiServiceError> {
            Err(AiServiceError::Failed("no".to_string()))
        }
    }

    fn poll_until<F: Fn(&AsyncOrchestrator) -> bool>(
        orch: &mut AsyncOrchestrator,
        done: F,
    ) -> Option<AsyncCompletion> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut completion = None;
        while Instant::now() < deadline {
            if let Some(c) = orch.poll() {
                completion = Some(c);
            }
            if done(orch) {
                return completion;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        completion
    }

    #[test]
    fn test_success_delivers_completion_once() {
        let (service, release) = GatedService::new();
        let mut orch = AsyncOrchestrator::new(service);
        orch.run(bmp(), AsyncRequest::Enhance(EnhanceOptions::default()));
        assert!(orch.is_processing());

        release.send(()).unwrap();
        let completion = poll_until(&mut orch, |o| !o.is_processing());
        let completion = completion.expect("completion should surface");
        assert_eq!(completion.label, "enhance");
        assert!(matches!(completion.outcome, AsyncOutcome::Bitmap { .. }));

        // Success is transient; no second completion ever arrives.
        assert!(orch.poll().is_none());
    }

    #[test]
    fn test_cancel_discards_late_result() {
        let (service, release) = GatedService::new();
        let mut orch = AsyncOrchestrator::new(service);
        orch.run(bmp(), AsyncRequest::Enhance(EnhanceOptions::default()));

        orch.cancel();
        assert_eq!(orch.state().status, AsyncStatus::Idle);

        // Let the worker finish after the fact; its result must be dropped.
        release.send(()).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        assert!(orch.poll().is_none());
        assert_eq!(orch.state().status, AsyncStatus::Idle);
    }

    #[test]
    fn test_second_run_supersedes_first() {
        let (service, release) = GatedService::new();
        let mut orch = AsyncOrchestrator::new(service);
        orch.run(bmp(), AsyncRequest::Enhance(EnhanceOptions::default()));
        // Second request while the first is blocked.
        orch.run(bmp(), AsyncRequest::Enhance(EnhanceOptions::default()));

        // Release both workers; only the second one's result may surface.
        release.send(()).unwrap();
        release.send(()).unwrap();

        let mut completions = 0;
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if orch.poll().is_some() {
                completions += 1;
            }
            if !orch.is_processing() && completions > 0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_failure_sets_error_state() {
        let mut orch = AsyncOrchestrator::new(Arc::new(FailingService));
        orch.run(bmp(), AsyncRequest::Enhance(EnhanceOptions::default()));

        poll_until(&mut orch, |o| o.state().status == AsyncStatus::Error);
        assert_eq!(orch.state().status, AsyncStatus::Error);
        assert!(orch.state().error.as_deref().unwrap().contains("model exploded"));

        orch.acknowledge_error();
        assert_eq!(orch.state().status, AsyncStatus::Idle);
        assert!(orch.state().error.is_none());
    }

    #[test]
    fn test_progress_mirrors_into_state() {
        let (service, release) = GatedService::new();
        let mut orch = AsyncOrchestrator::new(service);
        orch.run(bmp(), AsyncRequest::Enhance(EnhanceOptions::default()));

        // The worker reports 25 before blocking.
        let deadline = Instant::now() + Duration::from_secs(5);
        while orch.state().progress != 25 && Instant::now() < deadline {
            orch.poll();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(orch.state().progress, 25);
        release.send(()).unwrap();
        poll_until(&mut orch, |o| !o.is_processing());
    }
}
