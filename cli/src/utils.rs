// Utility functions for the CLI

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fs;
use std::path::Path;

/// Read an image file into a `data:<mime>;base64,<payload>` URL.
///
/// The media type is guessed from the file extension and must be `image/*`.
pub fn load_image_as_data_url(path: &Path) -> Result<String> {
    let mime = mime_guess::from_path(path)
        .first()
        .with_context(|| format!("Cannot tell the image type of {}", path.display()))?;
    if mime.type_() != mime_guess::mime::IMAGE {
        bail!("{} is not an image ({})", path.display(), mime);
    }

    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(format!("data:{};base64,{}", mime.essence_str(), STANDARD.encode(bytes)))
}

/// Split `/image <path> [question]` into the path and the optional question.
pub fn parse_image_command(rest: &str) -> Option<(&str, &str)> {
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }

    match rest.split_once(char::is_whitespace) {
        Some((path, question)) => Some((path, question.trim())),
        None => Some((rest, "")),
    }
}
