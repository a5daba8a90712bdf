//! Blob storage: upload and read opaque artifacts by path.

use crate::error::AnalyzeError;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Opaque blob upload/read, addressed by storage path.
///
/// `upload` returns `Ok(None)` when the backend accepted the call but
/// produced no reference; the orchestrator turns that into an upload error
/// for the artifact being written. `read` returns `Ok(None)` for an absent
/// blob, which retrieval reports as the artifact being unavailable.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Store `bytes` under a backend-chosen path derived from `name`.
    async fn upload(&self, name: &str, bytes: &[u8]) -> Result<Option<String>, AnalyzeError>;

    /// Read a blob back by the path `upload` returned.
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, AnalyzeError>;
}

/// Directory-backed gateway: each blob is a file under the root.
///
/// Writes are atomic (temp file + rename) so a crashed upload never leaves
/// a half-written blob behind a valid-looking path.
pub struct FsStorageGateway {
    root: PathBuf,
}

impl FsStorageGateway {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn blob_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

/// Strip path separators so an uploaded name cannot escape the root.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

#[async_trait]
impl StorageGateway for FsStorageGateway {
    async fn upload(&self, name: &str, bytes: &[u8]) -> Result<Option<String>, AnalyzeError> {
        let stored_name = format!("{}-{}", uuid::Uuid::new_v4(), sanitize(name));
        let dest = self.blob_path(&stored_name);

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AnalyzeError::Store {
                detail: format!("create storage root: {e}"),
            })?;

        let tmp = dest.with_extension("tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| AnalyzeError::Store {
                detail: format!("write blob: {e}"),
            })?;
        tokio::fs::rename(&tmp, &dest)
            .await
            .map_err(|e| AnalyzeError::Store {
                detail: format!("finalize blob: {e}"),
            })?;

        debug!("Stored {} bytes at {}", bytes.len(), stored_name);
        Ok(Some(stored_name))
    }

    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>, AnalyzeError> {
        match tokio::fs::read(self.blob_path(path)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AnalyzeError::Store {
                detail: format!("read blob '{path}': {e}"),
            }),
        }
    }
}
