//! Document conversion: paged document bytes → first-page preview image.
//!
//! The converter is injected like the other collaborators so the
//! orchestrator can be exercised without a pdfium binary on the test host.
//! Its contract is strict: all failure comes back as a `Conversion` error —
//! nothing panics across this boundary — and it performs no I/O of its
//! own; callers persist the image.

use crate::config::AnalyzeConfig;
use crate::error::AnalyzeError;
use async_trait::async_trait;
use image::DynamicImage;

/// Render the first page of a paged document as a preview image.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn render_preview(
        &self,
        bytes: &[u8],
        config: &AnalyzeConfig,
    ) -> Result<DynamicImage, AnalyzeError>;
}

/// Production converter backed by pdfium.
///
/// Rendering runs on the blocking pool (see [`crate::pipeline::render`]);
/// scale and pixel cap come from the config.
pub struct PdfiumConverter;

#[async_trait]
impl DocumentConverter for PdfiumConverter {
    async fn render_preview(
        &self,
        bytes: &[u8],
        config: &AnalyzeConfig,
    ) -> Result<DynamicImage, AnalyzeError> {
        crate::pipeline::render::render_first_page(bytes, config).await
    }
}
