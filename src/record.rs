//! The persisted analysis record and its feedback payload.
//!
//! A record is created in memory at pipeline start, written once as a
//! draft (feedback still the empty-string sentinel, so a crash mid-run
//! leaves a recoverable partial record), then rewritten once more with
//! feedback populated. Both writes land on the **same** key.
//!
//! Field names serialize in camelCase to stay wire-compatible with records
//! produced by earlier deployments of this pipeline.

use crate::feedback::Feedback;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The single namespace for record-store keys.
///
/// Both the write key and the listing pattern derive from this constant, so
/// the two can never drift apart.
pub const RECORD_NAMESPACE: &str = "resume";

/// Record-store key for a run identifier: `resume:<id>`.
pub fn run_key(id: &str) -> String {
    format!("{RECORD_NAMESPACE}:{id}")
}

/// Wildcard pattern matching every record key in the namespace.
pub fn list_pattern() -> String {
    format!("{RECORD_NAMESPACE}:*")
}

/// Feedback slot of a record: empty until the run completes successfully.
///
/// `Pending` serializes as the empty string `""` — the sentinel the draft
/// write uses — and `Ready` serializes as the feedback object itself.
/// Once `Ready`, the value is immutable; there is no transition back.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackState {
    Pending,
    Ready(Feedback),
}

impl FeedbackState {
    pub fn is_ready(&self) -> bool {
        matches!(self, FeedbackState::Ready(_))
    }

    /// The populated feedback, if the run completed.
    pub fn as_ready(&self) -> Option<&Feedback> {
        match self {
            FeedbackState::Ready(f) => Some(f),
            FeedbackState::Pending => None,
        }
    }
}

impl Serialize for FeedbackState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FeedbackState::Pending => serializer.serialize_str(""),
            FeedbackState::Ready(feedback) => feedback.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FeedbackState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(s) if s.is_empty() => Ok(FeedbackState::Pending),
            serde_json::Value::String(s) => Err(D::Error::custom(format!(
                "expected feedback object or empty sentinel, got string {s:?}"
            ))),
            other => Feedback::deserialize(other)
                .map(FeedbackState::Ready)
                .map_err(D::Error::custom),
        }
    }
}

/// The persisted unit: one run's inputs, artifact paths, and feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    /// Run identifier; immutable once created, globally unique in the namespace.
    pub id: String,
    /// Storage reference of the uploaded original document. Set only after
    /// the original upload succeeds.
    pub resume_path: String,
    /// Storage reference of the uploaded preview image.
    pub image_path: String,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    /// Empty sentinel in the draft write; populated exactly once on success.
    pub feedback: FeedbackState,
}

impl AnalysisRecord {
    /// Serialize for a record-store write.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a stored record value.
    pub fn from_json(value: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(value)
    }
}
