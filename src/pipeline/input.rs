//! Input resolution: normalise a user-supplied path or URL to PDF bytes.
//!
//! The pipeline works on in-memory bytes end-to-end (upload wants bytes,
//! pdfium can open a byte slice), so resolution reads the whole document up
//! front. The `%PDF` magic is validated here so callers get a meaningful
//! error before any stage runs rather than a pdfium failure mid-pipeline.

use crate::error::AnalyzeError;
use std::path::Path;
use tracing::{debug, info};

/// PDF files begin with these four bytes.
const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to PDF bytes.
///
/// If the input is a URL, download it with the given timeout. If it is a
/// local file, read and validate it.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<Vec<u8>, AnalyzeError> {
    let bytes = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        resolve_local(input).await?
    };

    if bytes.len() < PDF_MAGIC.len() || &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        return Err(AnalyzeError::NotAPdf {
            input: input.to_string(),
        });
    }

    Ok(bytes)
}

async fn resolve_local(path_str: &str) -> Result<Vec<u8>, AnalyzeError> {
    let path = Path::new(path_str);
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|_| AnalyzeError::FileNotFound {
            path: path_str.to_string(),
        })?;
    debug!("Resolved local PDF: {} ({} bytes)", path_str, bytes.len());
    Ok(bytes)
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, AnalyzeError> {
    info!("Downloading PDF from {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AnalyzeError::DownloadFailed {
            url: url.to_string(),
            reason: format!("client construction failed: {e}"),
        })?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AnalyzeError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(AnalyzeError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AnalyzeError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    debug!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}
