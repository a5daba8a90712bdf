//! Integration tests for the analysis pipeline.
//!
//! Every collaborator is an in-memory fake, so the full orchestrator runs
//! here without pdfium, network, or an AI key: the converter fake returns a
//! fixed bitmap and the feedback fake replays a scripted response. What is
//! real is everything the crate owns — validation, stage sequencing, key
//! derivation, persistence ordering, parsing, and retrieval gating.

use async_trait::async_trait;
use image::{DynamicImage, Rgba, RgbaImage};
use resumind::services::feedback::{ContentPart, FeedbackMessage};
use resumind::{
    analyze, list_records, load_resume, run_key, AnalysisProgressCallback, AnalysisStage,
    AnalysisRecord, AnalyzeConfig, AnalyzeError, ArtifactKind, Collaborators, DocumentConverter,
    FeedbackResponse, FeedbackService, FeedbackState, MemoryRecordStore, MessageContent,
    RecordStore, RequiredField, ResumeFile, StorageGateway, Submission,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const FEEDBACK_JSON: &str =
    r#"{"ATS":{"score":87,"tips":["Add quantified impact","Mirror the job's keywords"]}}"#;

// ── Fakes ────────────────────────────────────────────────────────────────────

/// In-memory storage gateway. Can be told to return no reference on upload.
#[derive(Default)]
struct MockStorage {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    counter: AtomicUsize,
    fail_uploads: bool,
}

impl MockStorage {
    fn failing() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    fn remove(&self, path: &str) {
        self.blobs.lock().unwrap().remove(path);
    }
}

#[async_trait]
impl StorageGateway for MockStorage {
    async fn upload(&self, name: &str, bytes: &[u8]) -> Result<Option<String>, AnalyzeError> {
        if self.fail_uploads {
            return Ok(None);
        }
        let path = format!("blob-{}-{}", self.counter.fetch_add(1, Ordering::SeqCst), name);
        self.blobs
            .lock()
            .unwrap()
            .insert(path.clone(), bytes.to_vec());
        Ok(Some(path))
    }

    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, AnalyzeError> {
        Ok(self.blobs.lock().unwrap().get(path).cloned())
    }
}

/// Converter fake: a fixed 2×2 bitmap, no pdfium involved.
struct FakeConverter;

#[async_trait]
impl DocumentConverter for FakeConverter {
    async fn render_preview(
        &self,
        _bytes: &[u8],
        _config: &AnalyzeConfig,
    ) -> Result<DynamicImage, AnalyzeError> {
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            2,
            2,
            Rgba([10, 20, 30, 255]),
        )))
    }
}

/// What the scripted feedback service should answer with.
enum Script {
    /// Plain-string content.
    Json(&'static str),
    /// Sequence-of-parts content carrying the same text in its first element.
    Parts(&'static str),
    /// A response whose content is the empty string.
    EmptyContent,
    /// No response at all.
    NoResponse,
    /// A call that never resolves (exercises the per-stage deadline).
    NeverResolves,
}

struct ScriptedFeedback {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedFeedback {
    fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl FeedbackService for ScriptedFeedback {
    async fn feedback(
        &self,
        _document_path: &str,
        _prompt: &str,
    ) -> Result<Option<FeedbackResponse>, AnalyzeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Json(json) => Ok(Some(FeedbackResponse::text(json))),
            Script::Parts(json) => Ok(Some(FeedbackResponse {
                message: FeedbackMessage {
                    content: MessageContent::Parts(vec![ContentPart {
                        text: Some(json.to_string()),
                        rest: serde_json::Map::new(),
                    }]),
                },
            })),
            Script::EmptyContent => Ok(Some(FeedbackResponse::text(""))),
            Script::NoResponse => Ok(None),
            Script::NeverResolves => std::future::pending().await,
        }
    }
}

/// Progress observer recording every stage transition and the failure text.
#[derive(Default)]
struct RecordingCallback {
    stages: Mutex<Vec<AnalysisStage>>,
    failure: Mutex<Option<String>>,
}

impl AnalysisProgressCallback for RecordingCallback {
    fn on_stage(&self, stage: AnalysisStage) {
        self.stages.lock().unwrap().push(stage);
    }

    fn on_failure(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }
}

// ── Test helpers ─────────────────────────────────────────────────────────────

struct Harness {
    deps: Collaborators,
    storage: Arc<MockStorage>,
    store: Arc<MemoryRecordStore>,
    ai: Arc<ScriptedFeedback>,
    callback: Arc<RecordingCallback>,
    config: AnalyzeConfig,
}

impl Harness {
    fn new(script: Script) -> Self {
        Self::with_storage(MockStorage::default(), script)
    }

    fn with_storage(storage: MockStorage, script: Script) -> Self {
        let storage = Arc::new(storage);
        let store = Arc::new(MemoryRecordStore::new());
        let ai = Arc::new(ScriptedFeedback::new(script));
        let callback = Arc::new(RecordingCallback::default());
        let config = AnalyzeConfig::builder()
            .stage_timeout_secs(5)
            .progress_callback(callback.clone())
            .build()
            .unwrap();
        let deps = Collaborators::new(
            storage.clone(),
            store.clone(),
            Arc::new(FakeConverter),
            ai.clone(),
        );
        Self {
            deps,
            storage,
            store,
            ai,
            callback,
            config,
        }
    }

    fn ai_calls(&self) -> usize {
        self.ai.calls.load(Ordering::SeqCst)
    }

    fn dyn_store(&self) -> Arc<dyn RecordStore> {
        self.store.clone()
    }

    fn dyn_storage(&self) -> Arc<dyn StorageGateway> {
        self.storage.clone()
    }

    async fn stored_record(&self, id: &str) -> AnalysisRecord {
        let raw = self
            .store
            .get(&run_key(id))
            .await
            .unwrap()
            .expect("record present");
        AnalysisRecord::from_json(&raw).expect("record parses")
    }

    fn stages(&self) -> Vec<AnalysisStage> {
        self.callback.stages.lock().unwrap().clone()
    }
}

fn full_submission() -> Submission {
    Submission {
        company_name: "Acme".into(),
        job_title: "Platform Engineer".into(),
        job_description: "Rust, Kubernetes, on-call".into(),
        file: Some(ResumeFile {
            name: "cv.pdf".into(),
            bytes: b"%PDF-1.7 original resume bytes".to_vec(),
        }),
    }
}

// ── Validation priority ──────────────────────────────────────────────────────

#[tokio::test]
async fn validation_reports_company_name_first() {
    let h = Harness::new(Script::Json(FEEDBACK_JSON));
    let submission = Submission {
        company_name: String::new(),
        job_title: String::new(),
        job_description: "present".into(),
        file: full_submission().file,
    };

    let err = analyze(submission, &h.deps, &h.config).await.unwrap_err();
    match err {
        AnalyzeError::MissingField { field } => assert_eq!(field, RequiredField::CompanyName),
        other => panic!("expected company-name error, got {other}"),
    }

    // The pipeline never started: nothing stored, no stage events.
    assert!(h.store.is_empty());
    assert!(h.stages().is_empty());
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn happy_path_reaches_done_and_persists_score() {
    let h = Harness::new(Script::Json(FEEDBACK_JSON));

    let id = analyze(full_submission(), &h.deps, &h.config)
        .await
        .expect("run succeeds");

    assert_eq!(
        h.stages(),
        vec![
            AnalysisStage::UploadingResume,
            AnalysisStage::ConvertingToImage,
            AnalysisStage::UploadingImage,
            AnalysisStage::PersistingDraft,
            AnalysisStage::RequestingFeedback,
            AnalysisStage::ParsingFeedback,
            AnalysisStage::PersistingFinal,
            AnalysisStage::Done,
        ]
    );

    // Exactly one entry, under the run key, with the mocked score.
    assert_eq!(h.store.len(), 1);
    assert_eq!(h.ai_calls(), 1);
    let record = h.stored_record(&id).await;
    assert_eq!(record.id, id);
    let feedback = record.feedback.as_ready().expect("feedback populated");
    assert_eq!(feedback.ats.score, 87.0);
    assert_eq!(feedback.ats.tips.len(), 2);
}

#[tokio::test]
async fn fenced_feedback_payload_is_accepted() {
    let h = Harness::new(Script::Json(
        "```json\n{\"ATS\":{\"score\":55,\"tips\":[]}}\n```",
    ));
    let id = analyze(full_submission(), &h.deps, &h.config)
        .await
        .expect("run succeeds");
    let record = h.stored_record(&id).await;
    assert_eq!(record.feedback.as_ready().unwrap().ats.score, 55.0);
}

// ── Partial-failure containment ──────────────────────────────────────────────

#[tokio::test]
async fn empty_feedback_content_leaves_draft_intact() {
    let h = Harness::new(Script::EmptyContent);

    let err = analyze(full_submission(), &h.deps, &h.config)
        .await
        .unwrap_err();
    assert!(
        matches!(err, AnalyzeError::FeedbackFormat { .. }),
        "got {err}"
    );

    // The draft from PersistingDraft is still there, feedback still empty.
    assert_eq!(h.store.len(), 1);
    let listed = h.store.list("resume:*").await.unwrap();
    let record = AnalysisRecord::from_json(&listed[0].value).unwrap();
    assert_eq!(record.feedback, FeedbackState::Pending);

    // No PersistingFinal write happened.
    let stages = h.stages();
    assert!(!stages.contains(&AnalysisStage::PersistingFinal));
    assert!(!stages.contains(&AnalysisStage::Done));

    // The failure message is the error's display text.
    let failure = h.callback.failure.lock().unwrap().clone().unwrap();
    assert_eq!(failure, err.to_string());
}

#[tokio::test]
async fn absent_response_is_a_service_error() {
    let h = Harness::new(Script::NoResponse);
    let err = analyze(full_submission(), &h.deps, &h.config)
        .await
        .unwrap_err();
    assert!(
        matches!(err, AnalyzeError::FeedbackService { .. }),
        "got {err}"
    );
    // Draft retained here too.
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn upload_failure_aborts_before_any_write() {
    let h = Harness::with_storage(MockStorage::failing(), Script::Json(FEEDBACK_JSON));
    let err = analyze(full_submission(), &h.deps, &h.config)
        .await
        .unwrap_err();
    match err {
        AnalyzeError::Upload { artifact, .. } => assert_eq!(artifact, ArtifactKind::Resume),
        other => panic!("expected upload error, got {other}"),
    }
    assert!(h.store.is_empty());
    assert_eq!(h.stages(), vec![AnalysisStage::UploadingResume]);
}

// ── Response-shape tolerance ─────────────────────────────────────────────────

#[tokio::test]
async fn string_and_parts_content_parse_identically() {
    let string_h = Harness::new(Script::Json(FEEDBACK_JSON));
    let parts_h = Harness::new(Script::Parts(FEEDBACK_JSON));

    let string_id = analyze(full_submission(), &string_h.deps, &string_h.config)
        .await
        .unwrap();
    let parts_id = analyze(full_submission(), &parts_h.deps, &parts_h.config)
        .await
        .unwrap();

    let from_string = string_h.stored_record(&string_id).await.feedback;
    let from_parts = parts_h.stored_record(&parts_id).await.feedback;
    assert_eq!(from_string, from_parts);
}

// ── Retrieval gate ───────────────────────────────────────────────────────────

#[tokio::test]
async fn fetching_missing_id_is_not_found() {
    let h = Harness::new(Script::Json(FEEDBACK_JSON));
    let err = load_resume("no-such-run", &h.dyn_store(), &h.dyn_storage())
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzeError::NotFound { .. }), "got {err}");
}

#[tokio::test]
async fn fetching_incomplete_record_is_rejected() {
    let h = Harness::new(Script::EmptyContent);
    analyze(full_submission(), &h.deps, &h.config)
        .await
        .unwrap_err();

    // Recover the run id from the draft the failed run left behind.
    let listed = h.store.list("resume:*").await.unwrap();
    let draft = AnalysisRecord::from_json(&listed[0].value).unwrap();

    let err = load_resume(&draft.id, &h.dyn_store(), &h.dyn_storage())
        .await
        .unwrap_err();
    assert!(
        matches!(err, AnalyzeError::IncompleteRecord { .. }),
        "got {err}"
    );
}

#[tokio::test]
async fn complete_record_returns_blobs_matching_uploads() {
    let h = Harness::new(Script::Json(FEEDBACK_JSON));
    let id = analyze(full_submission(), &h.deps, &h.config)
        .await
        .unwrap();

    let view = load_resume(&id, &h.dyn_store(), &h.dyn_storage())
        .await
        .expect("complete record loads");

    assert_eq!(view.resume, b"%PDF-1.7 original resume bytes".to_vec());
    // The stored preview is the PNG the pipeline encoded.
    assert_eq!(&view.image[..8], b"\x89PNG\r\n\x1a\n");
    assert_eq!(view.feedback.ats.score, 87.0);
    assert_eq!(view.record.id, id);

    // Idempotent: a second load returns the same result.
    let again = load_resume(&id, &h.dyn_store(), &h.dyn_storage())
        .await
        .unwrap();
    assert_eq!(again.record, view.record);
    assert_eq!(again.resume, view.resume);
}

#[tokio::test]
async fn unreadable_artifact_names_which_one() {
    let h = Harness::new(Script::Json(FEEDBACK_JSON));
    let id = analyze(full_submission(), &h.deps, &h.config)
        .await
        .unwrap();

    let record = h.stored_record(&id).await;
    h.storage.remove(&record.resume_path);

    let err = load_resume(&id, &h.dyn_store(), &h.dyn_storage())
        .await
        .unwrap_err();
    match err {
        AnalyzeError::ArtifactUnavailable { artifact, .. } => {
            assert_eq!(artifact, ArtifactKind::Resume)
        }
        other => panic!("expected artifact error, got {other}"),
    }
}

// ── Listing ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn listing_is_idempotent() {
    let h = Harness::new(Script::Json(FEEDBACK_JSON));
    analyze(full_submission(), &h.deps, &h.config).await.unwrap();
    let mut second = full_submission();
    second.company_name = "Globex".into();
    analyze(second, &h.deps, &h.config).await.unwrap();

    let store = h.dyn_store();
    let first_listing = list_records(&store).await.unwrap();
    let second_listing = list_records(&store).await.unwrap();

    assert_eq!(first_listing.len(), 2);
    assert_eq!(first_listing, second_listing);
}

#[tokio::test]
async fn malformed_entry_fails_the_whole_listing() {
    let h = Harness::new(Script::Json(FEEDBACK_JSON));
    analyze(full_submission(), &h.deps, &h.config).await.unwrap();
    h.store.set("resume:corrupt", "{ not json").await.unwrap();

    let err = list_records(&h.dyn_store()).await.unwrap_err();
    match err {
        AnalyzeError::MalformedRecord { key, .. } => assert_eq!(key, "resume:corrupt"),
        other => panic!("expected malformed-record error, got {other}"),
    }
}

// ── Deadlines ────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn stuck_feedback_call_trips_the_stage_deadline() {
    let h = Harness::new(Script::NeverResolves);

    let err = analyze(full_submission(), &h.deps, &h.config)
        .await
        .unwrap_err();
    match err {
        AnalyzeError::StageTimeout { stage, secs } => {
            assert_eq!(stage, AnalysisStage::RequestingFeedback);
            assert_eq!(secs, 5);
        }
        other => panic!("expected stage timeout, got {other}"),
    }

    // The draft write preceded the stuck call and is retained.
    assert_eq!(h.store.len(), 1);
}
