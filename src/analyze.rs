//! The pipeline orchestrator — the core of the crate.
//!
//! [`analyze`] drives one submission through a strictly sequential stage
//! machine:
//!
//! ```text
//! UploadingResume → ConvertingToImage → UploadingImage → PersistingDraft
//!   → RequestingFeedback → ParsingFeedback → PersistingFinal → Done
//!                        ↘ (any stage) → failed, message retained
//! ```
//!
//! Two invariants matter more than anything else here:
//!
//! * The draft record is written **before** the AI call, so a crash or
//!   failure from that point on still leaves a recoverable partial record
//!   under the run key.
//! * The final write lands on the **same** key as the draft. There is
//!   exactly one record per run, ever.
//!
//! Failures are terminal: no stage re-entry, no orchestrator-level retry,
//! no rollback of partial side effects. The typed error's display text is
//! the one message shown to the user, and the progress callback receives
//! it synchronously before `analyze` returns.

use crate::config::AnalyzeConfig;
use crate::error::{AnalyzeError, ArtifactKind, RequiredField};
use crate::ids::new_run_id;
use crate::pipeline::{encode, parse};
use crate::progress::AnalysisStage;
use crate::prompts::prepare_instructions;
use crate::record::{run_key, AnalysisRecord, FeedbackState};
use crate::services::converter::DocumentConverter;
use crate::services::feedback::FeedbackService;
use crate::services::kv::RecordStore;
use crate::services::storage::StorageGateway;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{info, warn};

/// The résumé document as submitted.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    /// Original file name, used to derive artifact names.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// One submission: target-job metadata plus the document.
///
/// `file` is optional only so the validation gate can report it missing
/// with the same first-failing-field policy as the text fields.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub file: Option<ResumeFile>,
}

/// The injected collaborator handles.
///
/// Everything the orchestrator touches goes through these traits, so tests
/// run the full pipeline against in-memory fakes.
#[derive(Clone)]
pub struct Collaborators {
    pub storage: Arc<dyn StorageGateway>,
    pub store: Arc<dyn RecordStore>,
    pub converter: Arc<dyn DocumentConverter>,
    pub ai: Arc<dyn FeedbackService>,
}

impl Collaborators {
    pub fn new(
        storage: Arc<dyn StorageGateway>,
        store: Arc<dyn RecordStore>,
        converter: Arc<dyn DocumentConverter>,
        ai: Arc<dyn FeedbackService>,
    ) -> Self {
        Self {
            storage,
            store,
            converter,
            ai,
        }
    }
}

/// Run the analysis pipeline for one submission.
///
/// # Returns
/// The generated run identifier; the completed record is stored under
/// [`run_key`] of that identifier.
///
/// # Errors
/// Any validation or stage failure. The error's display text is the
/// user-facing message; if a progress callback is configured it receives
/// the same text via `on_failure` before this function returns.
pub async fn analyze(
    submission: Submission,
    deps: &Collaborators,
    config: &AnalyzeConfig,
) -> Result<String, AnalyzeError> {
    match run_pipeline(submission, deps, config).await {
        Ok(id) => Ok(id),
        Err(e) => {
            let message = e.to_string();
            warn!("Analysis failed: {}", message);
            if let Some(ref cb) = config.progress_callback {
                cb.on_failure(&message);
            }
            Err(e)
        }
    }
}

async fn run_pipeline(
    submission: Submission,
    deps: &Collaborators,
    config: &AnalyzeConfig,
) -> Result<String, AnalyzeError> {
    let total_start = Instant::now();

    // ── Validation gate ──────────────────────────────────────────────────
    let file = validate(&submission)?;
    info!(
        "Starting analysis for '{}' / '{}'",
        submission.company_name, submission.job_title
    );

    let enter = |stage: AnalysisStage| {
        if let Some(ref cb) = config.progress_callback {
            cb.on_stage(stage);
        }
        info!("Stage: {}", stage.status_text());
        stage
    };

    // ── Stage 1: upload the original document ────────────────────────────
    let stage = enter(AnalysisStage::UploadingResume);
    let resume_path = with_deadline(stage, config, deps.storage.upload(&file.name, &file.bytes))
        .await?
        .ok_or_else(|| AnalyzeError::Upload {
            artifact: ArtifactKind::Resume,
            detail: "storage returned no reference".to_string(),
        })?;

    // ── Stage 2: render the first page of the *original* file ────────────
    let stage = enter(AnalysisStage::ConvertingToImage);
    let preview = with_deadline(
        stage,
        config,
        deps.converter.render_preview(&file.bytes, config),
    )
    .await?;
    let preview_png = encode::encode_preview(&preview).map_err(|e| AnalyzeError::Conversion {
        detail: format!("preview encoding failed: {e}"),
    })?;

    // ── Stage 3: upload the preview image ────────────────────────────────
    let stage = enter(AnalysisStage::UploadingImage);
    let image_name = format!("{}.png", file.name.trim_end_matches(".pdf"));
    let image_path = with_deadline(stage, config, deps.storage.upload(&image_name, &preview_png))
        .await?
        .ok_or_else(|| AnalyzeError::Upload {
            artifact: ArtifactKind::PreviewImage,
            detail: "storage returned no reference".to_string(),
        })?;

    // ── Stage 4: persist the draft record ────────────────────────────────
    // This write must complete before the AI call so a failure from here on
    // still leaves a recoverable (if incomplete) record.
    let stage = enter(AnalysisStage::PersistingDraft);
    let id = new_run_id();
    let key = run_key(&id);
    let mut record = AnalysisRecord {
        id: id.clone(),
        resume_path: resume_path.clone(),
        image_path,
        company_name: submission.company_name.clone(),
        job_title: submission.job_title.clone(),
        job_description: submission.job_description.clone(),
        feedback: FeedbackState::Pending,
    };
    let draft_json = record.to_json().map_err(|e| AnalyzeError::Store {
        detail: format!("serialize draft: {e}"),
    })?;
    with_deadline(stage, config, deps.store.set(&key, &draft_json)).await?;

    // ── Stage 5: request feedback on the uploaded document ───────────────
    let stage = enter(AnalysisStage::RequestingFeedback);
    let prompt = match config.instructions {
        Some(ref override_prompt) => override_prompt.clone(),
        None => prepare_instructions(&submission.job_title, &submission.job_description),
    };
    let response = with_deadline(stage, config, deps.ai.feedback(&resume_path, &prompt))
        .await?
        .ok_or_else(|| AnalyzeError::FeedbackService {
            detail: "the service returned no response".to_string(),
        })?;

    // ── Stage 6: extract and parse the structured feedback ───────────────
    enter(AnalysisStage::ParsingFeedback);
    let text = response
        .message
        .content
        .extract_text()
        .ok_or_else(|| AnalyzeError::FeedbackFormat {
            detail: "response contained no textual content".to_string(),
        })?;
    let feedback = parse::parse_feedback(text)?;
    info!("Feedback parsed: ATS score {}", feedback.ats.score);

    // ── Stage 7: overwrite the record at the same key ────────────────────
    let stage = enter(AnalysisStage::PersistingFinal);
    record.feedback = FeedbackState::Ready(feedback);
    let final_json = record.to_json().map_err(|e| AnalyzeError::Store {
        detail: format!("serialize record: {e}"),
    })?;
    with_deadline(stage, config, deps.store.set(&key, &final_json)).await?;

    // ── Done ─────────────────────────────────────────────────────────────
    enter(AnalysisStage::Done);
    info!(
        "Analysis complete: {} ({}ms)",
        id,
        total_start.elapsed().as_millis()
    );

    Ok(id)
}

/// Check required fields in fixed priority order; first missing field wins.
///
/// Returning the file here (rather than a bool) means the pipeline body
/// never re-checks `Option`s the gate already proved present.
fn validate(submission: &Submission) -> Result<&ResumeFile, AnalyzeError> {
    let missing = |field| AnalyzeError::MissingField { field };

    if submission.company_name.trim().is_empty() {
        return Err(missing(RequiredField::CompanyName));
    }
    if submission.job_title.trim().is_empty() {
        return Err(missing(RequiredField::JobTitle));
    }
    if submission.job_description.trim().is_empty() {
        return Err(missing(RequiredField::JobDescription));
    }
    match submission.file {
        Some(ref file) if !file.bytes.is_empty() => Ok(file),
        _ => Err(missing(RequiredField::ResumeFile)),
    }
}

/// Await a stage's collaborator call under the configured deadline.
///
/// With no deadline configured the future is awaited as-is; a stuck
/// collaborator then stalls the run with the last status still visible.
async fn with_deadline<T, F>(
    stage: AnalysisStage,
    config: &AnalyzeConfig,
    fut: F,
) -> Result<T, AnalyzeError>
where
    F: Future<Output = Result<T, AnalyzeError>>,
{
    match config.stage_timeout_secs {
        Some(secs) => timeout(Duration::from_secs(secs), fut)
            .await
            .map_err(|_| AnalyzeError::StageTimeout { stage, secs })?,
        None => fut.await,
    }
}
