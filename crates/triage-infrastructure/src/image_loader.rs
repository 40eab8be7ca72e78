//! Loads image attachments from disk for the image side channel.

use std::path::Path;
use tokio::fs;
use triage_core::gateway::ImageData;
use triage_core::{Result, TriageError};

/// Infers the MIME type from a file extension.
fn infer_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

/// Reads an image file and encodes it as base64 for upload.
///
/// # Errors
///
/// - `TriageError::Config` if the extension does not map to an image type
/// - `TriageError::Io` if the file cannot be read or is empty
pub async fn load_image(path: impl AsRef<Path>) -> Result<ImageData> {
    let path = path.as_ref();
    let mime_type = infer_mime_type(path);
    if !mime_type.starts_with("image/") {
        return Err(TriageError::config(format!(
            "{} is not an image ({mime_type})",
            path.display()
        )));
    }

    let bytes = fs::read(path).await?;
    if bytes.is_empty() {
        return Err(TriageError::io(format!("{} is empty", path.display())));
    }

    tracing::debug!(
        path = %path.display(),
        mime_type = %mime_type,
        size = bytes.len(),
        "Loaded image attachment"
    );
    Ok(ImageData::from_bytes(&bytes))
}
