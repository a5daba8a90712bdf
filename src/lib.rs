//! # resumind
//!
//! AI résumé analysis as a library: submit a résumé PDF together with
//! target-job metadata, receive an ATS score and structured improvement
//! suggestions, durably recorded for later review.
//!
//! ## Why a pipeline?
//!
//! The interesting part is not any single step — it is sequencing binary
//! upload, rasterisation, an external reasoning service, structured-output
//! parsing, and durable persistence so that progress is observable at every
//! transition and failure at any stage leaves the stored state
//! well-defined.
//!
//! ## Pipeline Overview
//!
//! ```text
//! resume.pdf
//!  │
//!  ├─ 1. Upload    original document → storage gateway, path recorded
//!  ├─ 2. Render    first page → preview image via pdfium (spawn_blocking)
//!  ├─ 3. Upload    preview image → storage gateway
//!  ├─ 4. Draft     record written with feedback still empty (crash-safe)
//!  ├─ 5. Analyze   document reference + instruction prompt → AI service
//!  ├─ 6. Parse     response text → structured Feedback (ATS score + tips)
//!  └─ 7. Final     record rewritten at the same key, feedback populated
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resumind::{
//!     analyze, AnalyzeConfig, Collaborators, FsRecordStore, FsStorageGateway,
//!     LlmFeedbackService, PdfiumConverter, ResumeFile, Submission,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = Arc::new(FsStorageGateway::new("data/blobs"));
//!     let store = Arc::new(FsRecordStore::new("data/records"));
//!     let config = AnalyzeConfig::default();
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let ai = Arc::new(LlmFeedbackService::from_config(
//!         storage.clone(),
//!         config.clone(),
//!     )?);
//!
//!     let deps = Collaborators::new(storage, store, Arc::new(PdfiumConverter), ai);
//!     let submission = Submission {
//!         company_name: "Acme".into(),
//!         job_title: "Platform Engineer".into(),
//!         job_description: "Rust, Kubernetes, on-call".into(),
//!         file: Some(ResumeFile {
//!             name: "resume.pdf".into(),
//!             bytes: std::fs::read("resume.pdf")?,
//!         }),
//!     };
//!
//!     let id = analyze(submission, &deps, &config).await?;
//!     println!("analysis stored under resume:{id}");
//!     Ok(())
//! }
//! ```
//!
//! ## Collaborators
//!
//! Storage, record store, and the AI backend are injected trait objects
//! ([`StorageGateway`], [`RecordStore`], [`FeedbackService`]), so the
//! orchestrator runs unchanged against the bundled filesystem wrappers, a
//! remote service, or in-memory fakes in tests.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `resumind` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod feedback;
pub mod ids;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod record;
pub mod retrieve;
pub mod services;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, Collaborators, ResumeFile, Submission};
pub use config::{AnalyzeConfig, AnalyzeConfigBuilder};
pub use error::{AnalyzeError, ArtifactKind, RequiredField};
pub use feedback::{AtsFeedback, Feedback};
pub use progress::{AnalysisProgressCallback, AnalysisStage, NoopProgressCallback, ProgressCallback};
pub use record::{list_pattern, run_key, AnalysisRecord, FeedbackState, RECORD_NAMESPACE};
pub use retrieve::{list_records, load_resume, ResumeView};
pub use services::{
    DocumentConverter, FeedbackResponse, FeedbackService, FsRecordStore, FsStorageGateway,
    KvEntry, LlmFeedbackService, MemoryRecordStore, MessageContent, PdfiumConverter, RecordStore,
    StorageGateway,
};
