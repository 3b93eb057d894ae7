//! Turning files into inline media and back.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use iete_core::Media;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

/// Inline payloads above this size are rejected by the provider.
pub const MAX_ATTACHMENT_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{} is larger than 20 MiB", .0.display())]
    TooLarge(PathBuf),
    #[error("unsupported file type for {} ({mime}); attach an image, audio clip or PDF", path.display())]
    Unsupported { path: PathBuf, mime: String },
    #[error("provider returned invalid image data: {0}")]
    Decode(#[from] base64::DecodeError),
}

fn is_supported(mime: &str) -> bool {
    mime.starts_with("image/") || mime.starts_with("audio/") || mime == "application/pdf"
}

pub async fn load(path: &Path) -> Result<Media, AttachmentError> {
    let io_err = |source| AttachmentError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mime = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream");
    if !is_supported(mime) {
        return Err(AttachmentError::Unsupported {
            path: path.to_path_buf(),
            mime: mime.to_string(),
        });
    }

    let metadata = tokio::fs::metadata(path).await.map_err(io_err)?;
    if metadata.len() > MAX_ATTACHMENT_BYTES {
        return Err(AttachmentError::TooLarge(path.to_path_buf()));
    }

    let bytes = tokio::fs::read(path).await.map_err(io_err)?;
    Ok(Media::new(STANDARD.encode(bytes), mime))
}

/// Writes `media` into `dir` as `<stem>.<ext>` and returns the path.
pub async fn save(media: &Media, dir: &Path, stem: &str) -> Result<PathBuf, AttachmentError> {
    let ext = mime_guess::get_mime_extensions_str(&media.mime_type)
        .and_then(|exts| exts.first())
        .copied()
        .unwrap_or("bin");
    let path = dir.join(format!("{stem}.{ext}"));
    let bytes = STANDARD.decode(&media.data)?;
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|source| AttachmentError::Io {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}
