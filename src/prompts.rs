//! Instruction prompts for the AI feedback service.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tightening the rating rubric or the
//!    required output shape means editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the composed instruction
//!    without calling a real AI backend, so prompt regressions are cheap to
//!    catch.
//!
//! Callers can override the composed instruction entirely via
//! [`crate::config::AnalyzeConfig::instructions`]; the constants here are
//! used only when no override is provided.

/// The JSON shape the model must return.
///
/// `ATS.score` and `ATS.tips` are the only parts the pipeline validates;
/// the remaining sections are surfaced to the user as-is.
pub const RESPONSE_FORMAT: &str = r#"{
  "ATS": {
    "score": number (0-100, how well the resume passes automated screening),
    "tips": [string, ...] (ordered, most impactful first)
  },
  "summary": string (three-sentence overall assessment),
  "toneAndStyle": { "score": number (0-100), "tips": [string, ...] },
  "content": { "score": number (0-100), "tips": [string, ...] },
  "structure": { "score": number (0-100), "tips": [string, ...] },
  "skills": { "score": number (0-100), "tips": [string, ...] }
}"#;

/// Compose the analysis instruction for a target job.
///
/// The prompt embeds the job title and description verbatim and closes with
/// the required output shape. The "JSON only, no surrounding text" rule is
/// stated twice because models still occasionally wrap the object in prose
/// or fences — [`crate::pipeline::parse`] strips a stray outer fence, but
/// prose around the object is unrecoverable.
pub fn prepare_instructions(job_title: &str, job_description: &str) -> String {
    format!(
        r#"You are an expert in ATS (Applicant Tracking System) screening and resume review.
Analyze and rate the attached resume for the position below and suggest how to improve it.
The rating can be low if the resume is a poor fit; be thorough and honest.

Job title: {job_title}
Job description: {job_description}

Provide the feedback using the following JSON format:
{RESPONSE_FORMAT}

Return the analysis as a single JSON object, without any other text, comments, or markdown fences.
The response must start with {{ and end with }}."#
    )
}
