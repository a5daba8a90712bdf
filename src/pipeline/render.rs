//! First-page rasterisation: PDF bytes → `DynamicImage` via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto the
//! blocking-thread pool so Tokio worker threads never stall during
//! CPU-heavy rendering.
//!
//! ## Failure containment
//!
//! The converter must not take the process down: every failure inside the
//! blocking task — including a panic — comes back across the boundary as a
//! `Conversion` error, never as an unwound stack.

use crate::config::AnalyzeConfig;
use crate::error::AnalyzeError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

/// Rasterise the first page of a PDF held in memory.
///
/// The target width is the page's native width times
/// `config.preview_scale`, capped at `config.max_preview_pixels` on either
/// dimension.
pub async fn render_first_page(
    bytes: &[u8],
    config: &AnalyzeConfig,
) -> Result<DynamicImage, AnalyzeError> {
    let bytes = bytes.to_vec();
    let scale = config.preview_scale;
    let max_pixels = config.max_preview_pixels;

    tokio::task::spawn_blocking(move || render_first_page_blocking(&bytes, scale, max_pixels))
        .await
        .map_err(|e| AnalyzeError::Conversion {
            detail: format!("render task panicked: {e}"),
        })?
}

fn render_first_page_blocking(
    bytes: &[u8],
    scale: f32,
    max_pixels: u32,
) -> Result<DynamicImage, AnalyzeError> {
    let pdfium = Pdfium::default();

    let document =
        pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| AnalyzeError::Conversion {
                detail: format!("could not open PDF: {e:?}"),
            })?;

    let pages = document.pages();
    if pages.len() == 0 {
        return Err(AnalyzeError::Conversion {
            detail: "document has no pages".to_string(),
        });
    }

    let page = pages.get(0).map_err(|e| AnalyzeError::Conversion {
        detail: format!("could not load first page: {e:?}"),
    })?;

    // Native page width is in points; scale it up for legibility, then cap
    // either dimension so oversized pages stay within memory bounds.
    let target_width = ((page.width().value * scale) as u32).min(max_pixels);
    let render_config = PdfRenderConfig::new()
        .set_target_width(target_width as i32)
        .set_maximum_height(max_pixels as i32);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| AnalyzeError::Conversion {
            detail: format!("rasterisation failed: {e:?}"),
        })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered first page → {}x{} px (scale {})",
        image.width(),
        image.height(),
        scale
    );

    Ok(image)
}
