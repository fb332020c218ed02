/// Media reference store.
///
/// The board treats image persistence as an opaque collaborator: `put`
/// accepts bytes plus a mime type and returns a stable reference, `delete`
/// is fire-and-forget. The default implementation writes to a local
/// directory; references are the generated file names.
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Mime types accepted for post images
const ALLOWED_MIME_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist one image and return its reference
    async fn put(&self, bytes: &[u8], mime_type: &str) -> Result<String>;

    /// Remove a previously stored image. Callers treat failures as
    /// best-effort and only log them.
    async fn delete(&self, reference: &str) -> Result<()>;
}

/// Validate an upload's mime type and map it to a file extension.
pub fn extension_for(mime_type: &str) -> Result<&'static str> {
    match mime_type {
        "image/jpeg" => Ok("jpeg"),
        "image/png" => Ok("png"),
        _ => Err(AppError::Validation(format!(
            "Unsupported file format: {} (expected one of {:?})",
            mime_type, ALLOWED_MIME_TYPES
        ))),
    }
}

/// Media store backed by a local directory
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Collision-resistant file name: creation timestamp plus a random id,
    /// no cross-request counter.
    fn fresh_name(extension: &str) -> String {
        format!(
            "{}-{}.{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            extension
        )
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn put(&self, bytes: &[u8], mime_type: &str) -> Result<String> {
        let extension = extension_for(mime_type)?;
        let name = Self::fresh_name(extension);

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Internal(format!("media dir: {}", e)))?;
        tokio::fs::write(self.root.join(&name), bytes)
            .await
            .map_err(|e| AppError::Internal(format!("media write: {}", e)))?;

        Ok(name)
    }

    async fn delete(&self, reference: &str) -> Result<()> {
        // References are bare file names; reject anything path-like.
        if reference.contains('/') || reference.contains("..") {
            return Err(AppError::Validation(format!(
                "invalid media reference: {}",
                reference
            )));
        }

        tokio::fs::remove_file(self.root.join(reference))
            .await
            .map_err(|e| AppError::Internal(format!("media delete: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_mime_types() {
        assert!(extension_for("image/gif").is_err());
        assert!(extension_for("application/pdf").is_err());
        assert_eq!(extension_for("image/png").unwrap(), "png");
        assert_eq!(extension_for("image/jpeg").unwrap(), "jpeg");
    }

    #[tokio::test]
    async fn put_then_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path());

        let reference = store.put(b"png-bytes", "image/png").await.unwrap();
        assert!(reference.ends_with(".png"));
        assert!(dir.path().join(&reference).exists());

        store.delete(&reference).await.unwrap();
        assert!(!dir.path().join(&reference).exists());
    }

    #[tokio::test]
    async fn delete_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path());
        assert!(store.delete("../etc/passwd").await.is_err());
    }

    #[test]
    fn fresh_names_do_not_collide() {
        let a = LocalMediaStore::fresh_name("png");
        let b = LocalMediaStore::fresh_name("png");
        assert_ne!(a, b);
    }
}
