//! Capture workflow — capture, upload, preview, link, history.
//!
//! One workflow per session. The state guard admits a single in-flight
//! cycle; requests that arrive while Capturing or Uploading are refused with
//! `WorkflowError::Busy` and change nothing. Failures publish `Failed` and
//! then drop straight back to `Idle` in the same step, so watchers normally
//! only see `Idle`; the returned `WorkflowError` carries the failure.
//! A cycle whose future is dropped mid-flight also returns to `Idle`.
//!
//!   Idle/Ready --capture--> Capturing --ok--> Uploading --ok--> Ready
//!                               |                 |
//!                               +-----err---------+--> Failed --> Idle

mod preview;

pub use preview::PreviewHandle;

use crate::capture::{CaptureError, CaptureProvider, ImageBlob};
use crate::history::{HistoryEntry, HistoryStore};
use crate::upload::{UploadClient, UploadError, LINK_TTL_DAYS};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Capturing,
    Uploading,
    Ready,
    Failed,
}

impl CaptureState {
    /// True while a cycle is in flight; the capture action is disabled.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Capturing | Self::Uploading)
    }
}

/// Result of the last successful cycle. Owned by the workflow.
#[derive(Debug)]
pub struct CaptureResult {
    pub preview: PreviewHandle,
    pub shareable_url: String,
    pub history_entry: Option<HistoryEntry>,
}

/// Snapshot of a finished share, handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedCapture {
    pub preview_path: PathBuf,
    pub shareable_url: String,
    /// `None` if the history could not be written.
    pub history_entry: Option<HistoryEntry>,
}

/// A capture whose upload failed, kept so the user need not recapture.
struct PendingUpload {
    blob: ImageBlob,
    preview: PreviewHandle,
}

#[derive(Default)]
struct Slots {
    current: Option<CaptureResult>,
    pending: Option<PendingUpload>,
}

/// User-facing failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureNotice {
    pub title: String,
    pub description: String,
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("A capture is already in progress")]
    Busy,

    #[error("No failed upload to retry")]
    NothingToRetry,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl WorkflowError {
    /// The notice to show, if any. Refused requests are silent.
    pub fn notice(&self) -> Option<FailureNotice> {
        let (title, description) = match self {
            Self::Busy | Self::NothingToRetry => return None,
            Self::Capture(CaptureError::Unavailable(_)) => (
                "Capture unavailable",
                "Tab capture is not available here. Switch to screen capture and try again.",
            ),
            Self::Capture(CaptureError::Failed(_)) => (
                "Capture failed",
                "There was a problem capturing your screenshot.",
            ),
            Self::Upload(_) => (
                "Upload failed",
                "Your screenshot could not be uploaded. Retry to upload it again.",
            ),
        };
        Some(FailureNotice {
            title: title.to_string(),
            description: description.to_string(),
        })
    }
}

/// Informational expiry text shown next to a link.
pub fn expiry_notice() -> String {
    format!("This link expires in {} days", LINK_TTL_DAYS)
}

type CompleteCallback = Box<dyn Fn(&PreviewHandle, &str) + Send + Sync>;

pub struct CaptureWorkflow {
    provider: CaptureProvider,
    uploader: UploadClient,
    history: Arc<Mutex<HistoryStore>>,
    preview_dir: PathBuf,
    state: watch::Sender<CaptureState>,
    slots: Mutex<Slots>,
    on_complete: Option<CompleteCallback>,
}

impl CaptureWorkflow {
    pub fn new(
        provider: CaptureProvider,
        uploader: UploadClient,
        history: Arc<Mutex<HistoryStore>>,
        preview_dir: impl Into<PathBuf>,
    ) -> Self {
        let (state, _) = watch::channel(CaptureState::Idle);
        Self {
            provider,
            uploader,
            history,
            preview_dir: preview_dir.into(),
            state,
            slots: Mutex::new(Slots::default()),
            on_complete: None,
        }
    }

    /// Called with the preview and link after every successful cycle.
    pub fn on_capture_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&PreviewHandle, &str) + Send + Sync + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> CaptureState {
        *self.state.borrow()
    }

    /// Watch state changes, e.g. to enable or disable controls.
    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.state.subscribe()
    }

    pub fn provider_kind(&self) -> &'static str {
        self.provider.kind()
    }

    /// The last successful share, if any.
    pub fn current_share(&self) -> Option<SharedCapture> {
        self.slots().current.as_ref().map(|r| SharedCapture {
            preview_path: r.preview.path().to_path_buf(),
            shareable_url: r.shareable_url.clone(),
            history_entry: r.history_entry.clone(),
        })
    }

    /// Preview of a capture whose upload failed.
    pub fn pending_preview(&self) -> Option<PathBuf> {
        self.slots()
            .pending
            .as_ref()
            .map(|p| p.preview.path().to_path_buf())
    }

    /// Detach the current preview so it outlives the workflow.
    pub fn keep_preview(&self) -> Option<PathBuf> {
        self.slots().current.take().map(|r| r.preview.keep())
    }

    /// Run one capture-upload-share cycle.
    pub async fn capture(&self) -> Result<SharedCapture, WorkflowError> {
        if self.begin(CaptureState::Capturing).is_none() {
            log::debug!("[WORKFLOW] Capture requested while busy — ignored");
            return Err(WorkflowError::Busy);
        }
        let cycle = Cycle::new(&self.state);

        // A new capture supersedes whatever came before
        {
            let mut slots = self.slots();
            if let Some(previous) = slots.current.take() {
                previous.preview.release();
            }
            if let Some(pending) = slots.pending.take() {
                pending.preview.release();
            }
        }

        log::info!("[WORKFLOW] Capturing via {} provider", self.provider.kind());
        let blob = match self.provider.capture().await {
            Ok(blob) => blob,
            Err(e) => return Err(self.fail(cycle, e.into())),
        };

        let preview = match PreviewHandle::create(&self.preview_dir, &blob) {
            Ok(preview) => preview,
            Err(e) => {
                let err = CaptureError::Failed(format!("Could not store preview: {}", e));
                return Err(self.fail(cycle, err.into()));
            }
        };

        cycle.advance(CaptureState::Uploading);
        self.upload_and_share(cycle, blob, preview).await
    }

    /// Upload the capture whose previous upload failed, without recapturing.
    pub async fn retry_upload(&self) -> Result<SharedCapture, WorkflowError> {
        let Some(previous) = self.begin(CaptureState::Uploading) else {
            return Err(WorkflowError::Busy);
        };

        let pending = self.slots().pending.take();
        let Some(PendingUpload { blob, preview }) = pending else {
            self.state.send_replace(previous);
            return Err(WorkflowError::NothingToRetry);
        };

        log::info!("[WORKFLOW] Retrying upload of {}", blob.name);
        let cycle = Cycle::new(&self.state);
        self.upload_and_share(cycle, blob, preview).await
    }

    async fn upload_and_share(
        &self,
        cycle: Cycle<'_>,
        blob: ImageBlob,
        preview: PreviewHandle,
    ) -> Result<SharedCapture, WorkflowError> {
        let url = match self.uploader.upload(&blob).await {
            Ok(url) => url,
            Err(e) => {
                self.slots().pending = Some(PendingUpload { blob, preview });
                return Err(self.fail(cycle, e.into()));
            }
        };

        let history_entry = match self.history_store().append(&url) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::error!("[WORKFLOW] Link shared but history not saved: {}", e);
                None
            }
        };

        if let Some(callback) = &self.on_complete {
            callback(&preview, &url);
        }

        let shared = SharedCapture {
            preview_path: preview.path().to_path_buf(),
            shareable_url: url.clone(),
            history_entry: history_entry.clone(),
        };
        self.slots().current = Some(CaptureResult {
            preview,
            shareable_url: url,
            history_entry,
        });
        cycle.settle(CaptureState::Ready);

        log::info!("[WORKFLOW] Screenshot ready to share: {}", shared.shareable_url);
        Ok(shared)
    }

    /// Move to `next` unless a cycle is already in flight. Returns the
    /// state that was replaced.
    fn begin(&self, next: CaptureState) -> Option<CaptureState> {
        let mut previous = None;
        self.state.send_if_modified(|state| {
            if state.is_busy() {
                return false;
            }
            previous = Some(*state);
            *state = next;
            true
        });
        previous
    }

    fn fail(&self, cycle: Cycle<'_>, err: WorkflowError) -> WorkflowError {
        log::error!("[WORKFLOW] {}", err);
        cycle.advance(CaptureState::Failed);
        cycle.settle(CaptureState::Idle);
        err
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn history_store(&self) -> MutexGuard<'_, HistoryStore> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn preview_dir(&self) -> &Path {
        &self.preview_dir
    }
}

/// An in-flight cycle. Dropped before it settles (the caller's future was
/// cancelled or timed out), it puts the workflow back to `Idle`.
struct Cycle<'a> {
    state: &'a watch::Sender<CaptureState>,
    settled: bool,
}

impl<'a> Cycle<'a> {
    fn new(state: &'a watch::Sender<CaptureState>) -> Self {
        Self {
            state,
            settled: false,
        }
    }

    fn advance(&self, next: CaptureState) {
        self.state.send_replace(next);
    }

    fn settle(mut self, last: CaptureState) {
        self.settled = true;
        self.state.send_replace(last);
    }
}

impl Drop for Cycle<'_> {
    fn drop(&mut self) {
        if !self.settled {
            log::warn!("[WORKFLOW] Cycle abandoned mid-flight — back to idle");
            self.state.send_replace(CaptureState::Idle);
        }
    }
}
