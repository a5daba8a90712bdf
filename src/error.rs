//! Error types for the resumind library.
//!
//! One enum covers the whole run because the orchestrator's contract is a
//! single terminal outcome: a run either produces a navigable identifier or
//! a single human-readable failure message. The `Display` text of every
//! variant *is* that message — callers show it directly, there is no
//! separate error-code surface.
//!
//! Variant groups mirror where in the lifecycle the failure happens:
//! validation (before any stage runs), pipeline stages (upload / conversion
//! / AI), retrieval (looking a finished run back up), and store/infra.

use crate::progress::AnalysisStage;
use thiserror::Error;

/// A required submission field, in validation-priority order.
///
/// The validation gate reports only the **first** missing field per
/// attempt, checked in the order these variants are declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    CompanyName,
    JobTitle,
    JobDescription,
    ResumeFile,
}

impl RequiredField {
    /// Display-ready message for the missing field.
    pub fn message(&self) -> &'static str {
        match self {
            RequiredField::CompanyName => "Please enter the company name",
            RequiredField::JobTitle => "Please enter the job title",
            RequiredField::JobDescription => "Please enter the job description",
            RequiredField::ResumeFile => "Please upload your resume",
        }
    }
}

/// Which stored artifact a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Resume,
    PreviewImage,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Resume => write!(f, "resume"),
            ArtifactKind::PreviewImage => write!(f, "preview image"),
        }
    }
}

/// All errors returned by the resumind library.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    // ── Validation ────────────────────────────────────────────────────────
    /// A required submission field is missing. Raised before the pipeline
    /// starts; only the first missing field (in priority order) is reported.
    #[error("{}", .field.message())]
    MissingField { field: RequiredField },

    // ── Pipeline stages ───────────────────────────────────────────────────
    /// The storage gateway returned no reference for an uploaded artifact.
    #[error("Failed to upload {artifact}: {detail}")]
    Upload {
        artifact: ArtifactKind,
        detail: String,
    },

    /// First-page rasterisation failed or produced no image.
    #[error("Failed to convert resume to image: {detail}")]
    Conversion { detail: String },

    /// The AI service returned no response, or a response with no content.
    #[error("AI feedback service error: {detail}")]
    FeedbackService { detail: String },

    /// The AI response carried content that is not well-formed feedback JSON.
    #[error("Invalid AI response format: {detail}")]
    FeedbackFormat { detail: String },

    /// A collaborator call exceeded the per-stage deadline.
    #[error("Stage '{stage}' timed out after {secs}s")]
    StageTimeout { stage: AnalysisStage, secs: u64 },

    // ── Retrieval ─────────────────────────────────────────────────────────
    /// No record exists under the run key.
    #[error("Resume record not found: {id}")]
    NotFound { id: String },

    /// The record exists but feedback was never populated (a failed or
    /// in-flight run). Not a valid result to display.
    #[error("Feedback not available for resume {id}")]
    IncompleteRecord { id: String },

    /// A stored artifact path could not be read back.
    #[error("Could not read the {artifact} at '{path}'")]
    ArtifactUnavailable { artifact: ArtifactKind, path: String },

    /// A stored record value failed to parse as an `AnalysisRecord`.
    #[error("Malformed record under key '{key}': {detail}")]
    MalformedRecord { key: String, detail: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// The résumé input path does not exist or is unreadable.
    #[error("Resume file not found: '{path}'")]
    FileNotFound { path: String },

    /// The input bytes do not start with the PDF magic.
    #[error("File is not a valid PDF: '{input}'")]
    NotAPdf { input: String },

    /// HTTP URL input was syntactically valid but the download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    // ── Store / config ────────────────────────────────────────────────────
    /// The record store failed at the transport level (I/O, encoding).
    #[error("Record store error: {detail}")]
    Store { detail: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configured AI provider could not be constructed.
    #[error("AI provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (panicked task, poisoned lock).
    #[error("An unexpected error occurred: {0}")]
    Internal(String),
}

impl AnalyzeError {
    /// True when the error comes from the pre-pipeline validation gate.
    pub fn is_validation(&self) -> bool {
        matches!(self, AnalyzeError::MissingField { .. })
    }
}
