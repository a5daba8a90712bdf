//! Read side: reconstruct a displayable result from a stored record, and
//! list every record in the namespace.
//!
//! Both operations are read-only and idempotent — repeated calls with the
//! same identifier return the same result until the underlying store
//! changes — and are safe to call concurrently with an in-flight run.

use crate::error::{AnalyzeError, ArtifactKind};
use crate::feedback::Feedback;
use crate::record::{list_pattern, run_key, AnalysisRecord};
use crate::services::kv::RecordStore;
use crate::services::storage::StorageGateway;
use futures::future::try_join;
use std::sync::Arc;
use tracing::debug;

/// A fully rehydrated result: the record plus both artifact blobs.
#[derive(Debug, Clone)]
pub struct ResumeView {
    pub record: AnalysisRecord,
    /// The original uploaded document.
    pub resume: Vec<u8>,
    /// The first-page preview image.
    pub image: Vec<u8>,
    /// The populated feedback (guaranteed present — an incomplete record
    /// is rejected before blobs are fetched).
    pub feedback: Feedback,
}

/// Load one run's displayable result.
///
/// # Errors
/// * [`AnalyzeError::NotFound`] — no record under the run key
/// * [`AnalyzeError::IncompleteRecord`] — record exists but feedback was
///   never populated; not a valid result to display
/// * [`AnalyzeError::ArtifactUnavailable`] — a stored blob is unreadable,
///   naming which artifact
pub async fn load_resume(
    id: &str,
    store: &Arc<dyn RecordStore>,
    storage: &Arc<dyn StorageGateway>,
) -> Result<ResumeView, AnalyzeError> {
    let key = run_key(id);
    let raw = store
        .get(&key)
        .await?
        .ok_or_else(|| AnalyzeError::NotFound { id: id.to_string() })?;

    let record = AnalysisRecord::from_json(&raw).map_err(|e| AnalyzeError::MalformedRecord {
        key: key.clone(),
        detail: e.to_string(),
    })?;

    let feedback = record
        .feedback
        .as_ready()
        .cloned()
        .ok_or_else(|| AnalyzeError::IncompleteRecord { id: id.to_string() })?;

    // Any failure to produce the bytes — absent blob or transport error —
    // reads the same to the caller: the artifact is unavailable.
    let read_blob = |path: String, artifact: ArtifactKind| {
        let storage = Arc::clone(storage);
        async move {
            match storage.read(&path).await {
                Ok(Some(bytes)) => Ok(bytes),
                Ok(None) | Err(_) => Err(AnalyzeError::ArtifactUnavailable { artifact, path }),
            }
        }
    };

    let (resume, image) = try_join(
        read_blob(record.resume_path.clone(), ArtifactKind::Resume),
        read_blob(record.image_path.clone(), ArtifactKind::PreviewImage),
    )
    .await?;

    debug!(
        "Loaded resume {}: {} byte document, {} byte preview",
        id,
        resume.len(),
        image.len()
    );

    Ok(ResumeView {
        record,
        resume,
        image,
        feedback,
    })
}

/// List every record in the namespace, in store order.
///
/// A single malformed entry fails the whole listing: it indicates store
/// corruption the caller should see rather than silently-thinner results.
/// The error names the offending key so callers that prefer per-entry skip
/// semantics can layer that on.
pub async fn list_records(
    store: &Arc<dyn RecordStore>,
) -> Result<Vec<AnalysisRecord>, AnalyzeError> {
    let entries = store.list(&list_pattern()).await?;

    entries
        .into_iter()
        .map(|entry| {
            AnalysisRecord::from_json(&entry.value).map_err(|e| AnalyzeError::MalformedRecord {
                key: entry.key,
                detail: e.to_string(),
            })
        })
        .collect()
}
