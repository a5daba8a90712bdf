//! The structured feedback payload returned by the AI service.
//!
//! The pipeline only needs `ATS.score` and `ATS.tips` to be well-formed;
//! every other qualitative section (summary, tone, per-category detail) is
//! carried opaquely so the presentation layer can evolve its sections
//! without a pipeline change.

use serde::{Deserialize, Serialize};

/// Applicant-Tracking-System rating of the résumé.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsFeedback {
    /// Score in `[0, 100]`. Stored as returned; the pipeline does not clamp.
    pub score: f64,
    /// Ordered improvement suggestions.
    pub tips: Vec<String>,
}

/// The full feedback object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(rename = "ATS")]
    pub ats: AtsFeedback,

    /// Additional qualitative sections, passed through untouched.
    #[serde(flatten)]
    pub sections: serde_json::Map<String, serde_json::Value>,
}
