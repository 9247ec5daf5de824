use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{SlideError, SlideResult};

/// Decode a still from disk. The format is sniffed from content, not the extension, since
/// generated images are not always encoded as their file name claims.
pub fn decode_still(path: &Path) -> SlideResult<image::DynamicImage> {
    let bytes = std::fs::read(path).with_context(|| format!("read still '{}'", path.display()))?;
    decode_still_bytes(&bytes)
        .map_err(|e| SlideError::media(format!("decode still '{}': {e}", path.display())))
}

pub fn decode_still_bytes(bytes: &[u8]) -> SlideResult<image::DynamicImage> {
    let img = image::load_from_memory(bytes).context("decode image from memory")?;
    if img.width() == 0 || img.height() == 0 {
        return Err(SlideError::media("decoded image has zero size"));
    }
    Ok(img)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
