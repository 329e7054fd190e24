//! Temporary storage for uploaded images
//!
//! An upload lives on disk only while its card is being built. [`TempUpload`]
//! owns the file and removes it exactly once.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

/// File extensions accepted by the upload endpoint
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "bmp"];

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Only images are allowed (got {0})")]
    InvalidFileType(String),

    #[error("Upload I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Directory-backed store for incoming uploads
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write an upload to disk as `<unix-millis>-<random>-<sanitized name>`.
    /// The file is created exclusively, so an existing file is never reused.
    pub async fn persist(&self, original_name: &str, bytes: &[u8]) -> Result<TempUpload, UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let file_name = format!(
            "{}-{}-{}",
            chrono::Utc::now().timestamp_millis(),
            &suffix[..12],
            sanitize_file_name(original_name)
        );
        let path = self.dir.join(file_name);

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        // Owned from here on, so a failed write still removes the file
        let upload = TempUpload {
            path,
            original_name: original_name.to_string(),
            removed: false,
        };
        file.write_all(bytes).await?;
        file.flush().await?;

        tracing::debug!(path = %upload.path.display(), size = bytes.len(), "Upload stored");
        Ok(upload)
    }
}

/// An uploaded file that is deleted when the request finishes
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
    original_name: String,
    removed: bool,
}

impl TempUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub async fn read(&self) -> Result<Vec<u8>, UploadError> {
        Ok(tokio::fs::read(&self.path).await?)
    }

    /// Delete the file. Returns whether a file was actually removed.
    pub async fn cleanup(mut self) -> bool {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Upload removed");
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove upload");
                false
            }
        }
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        // Reached when a request is dropped mid-flight
        if !self.removed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Check the file name extension and the declared MIME type
pub fn is_allowed_image(file_name: &str, content_type: Option<&str>) -> bool {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let Some(extension) = extension else {
        return false;
    };
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return false;
    }

    let mime = match content_type {
        Some(ct) => ct.to_ascii_lowercase(),
        None => mime_guess::from_ext(&extension).first_or_octet_stream().to_string(),
    };
    ALLOWED_EXTENSIONS.iter().any(|allowed| mime.contains(allowed))
}

fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(100)
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
