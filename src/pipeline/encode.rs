//! Preview encoding: `DynamicImage` → PNG bytes, and PNG → base64
//! `ImageData` for the vision API request body.
//!
//! PNG is chosen over JPEG because it is lossless — text crispness matters
//! far more than file size for a résumé preview the AI must actually read.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode the rendered preview as PNG bytes ready for upload.
pub fn encode_preview(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("Encoded preview → {} bytes PNG", buf.len());
    Ok(buf)
}

/// Encode the preview as a base64 PNG attachment for the AI call.
///
/// `detail: "high"` instructs GPT-4-class models to use the full image tile
/// budget; without it small résumé fonts are lost.
pub fn to_image_data(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let png = encode_preview(img)?;
    Ok(ImageData::new(STANDARD.encode(&png), "image/png").with_detail("high"))
}
