//! External collaborators behind object-safe traits.
//!
//! The pipeline core talks to three thin I/O surfaces: a blob store for
//! uploaded artifacts, a string-keyed record store, and the AI feedback
//! backend. Each is a constructor-injected trait object rather than an
//! ambient global, so the orchestrator runs unchanged against production
//! wrappers or in-memory fakes.
//!
//! The trait signatures deliberately mirror the nullable upstream surfaces:
//! `upload`/`read` return `Option` inside `Result` so "the service answered
//! but produced nothing" stays distinguishable from a transport failure —
//! the orchestrator maps the two to different errors.

pub mod converter;
pub mod feedback;
pub mod kv;
pub mod storage;

pub use converter::{DocumentConverter, PdfiumConverter};
pub use feedback::{
    ContentPart, FeedbackMessage, FeedbackResponse, FeedbackService, LlmFeedbackService,
    MessageContent,
};
pub use kv::{FsRecordStore, KvEntry, MemoryRecordStore, RecordStore};
pub use storage::{FsStorageGateway, StorageGateway};
