//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] into
//! [`crate::analyze::analyze`] to observe stage transitions as they happen.
//! The orchestrator fires the callback synchronously at every transition,
//! so an observer polling the latest status always sees the stage currently
//! in progress.
//!
//! The callback approach keeps the library agnostic about how the host
//! communicates: callers can forward events to a channel, a WebSocket, or a
//! terminal spinner. The trait is `Send + Sync` so a single observer can be
//! shared across concurrently running, fully independent runs.

use std::fmt;
use std::sync::Arc;

/// The stages of a single analysis run, in execution order.
///
/// Stages are strictly sequential — no branching, no retry at this layer.
/// Any stage can instead terminate the run with a failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AnalysisStage {
    /// Uploading the original résumé document.
    UploadingResume,
    /// Rendering the first page to a preview image.
    ConvertingToImage,
    /// Uploading the rendered preview image.
    UploadingImage,
    /// Writing the draft record (feedback still empty).
    PersistingDraft,
    /// Waiting on the AI feedback service.
    RequestingFeedback,
    /// Extracting and parsing the structured feedback.
    ParsingFeedback,
    /// Overwriting the record with populated feedback.
    PersistingFinal,
    /// Run finished; the record identifier is available.
    Done,
}

impl AnalysisStage {
    /// Short status line describing the stage, suitable for direct display.
    pub fn status_text(&self) -> &'static str {
        match self {
            AnalysisStage::UploadingResume => "Uploading your resume...",
            AnalysisStage::ConvertingToImage => "Converting to image...",
            AnalysisStage::UploadingImage => "Uploading the image...",
            AnalysisStage::PersistingDraft => "Preparing data...",
            AnalysisStage::RequestingFeedback => "Analyzing...",
            AnalysisStage::ParsingFeedback => "Reading the analysis...",
            AnalysisStage::PersistingFinal => "Saving the results...",
            AnalysisStage::Done => "Analysis complete",
        }
    }
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status_text())
    }
}

/// Called by the orchestrator as the run moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Methods are called synchronously from the
/// orchestrator task; keep them cheap.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called at each stage transition, including the terminal `Done`.
    fn on_stage(&self, stage: AnalysisStage) {
        let _ = stage;
    }

    /// Called once when the run terminates in failure.
    ///
    /// `message` is the same human-readable text the returned error
    /// displays; it is the single source of truth shown to the user.
    fn on_failure(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias for the injected observer handle.
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
