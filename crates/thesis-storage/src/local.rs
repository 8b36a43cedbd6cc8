use crate::traits::{ProgressSink, Storage, StorageError, StorageResult, StoredFile};
use crate::{StorageBackend, UPLOAD_CHUNK_SIZE};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thesis_core::models::{DocumentReference, FileUpload};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Local filesystem storage implementation
///
/// Stands in for the remote endpoint during development. References are the
/// public URL of the stored file, built from `base_url` and the storage key.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for stored documents (e.g., "/var/lib/thesis/documents")
    /// * `base_url` - Base URL the documents are served from (e.g., "http://localhost:3000/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Convert storage key to filesystem path.
    ///
    /// Keys must stay inside the base directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty()
            || storage_key.contains("..")
            || storage_key.starts_with('/')
            || storage_key.contains('\\')
        {
            return Err(StorageError::InvalidReference(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(storage_key))
    }

    /// Keys never reuse the client's filename; only its extension survives.
    fn generate_key(filename: &str) -> String {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension {
            Some(ext) if ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
                format!("documents/{}.{}", Uuid::new_v4(), ext)
            }
            _ => format!("documents/{}", Uuid::new_v4()),
        }
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn reference_to_key<'a>(&self, reference: &'a DocumentReference) -> StorageResult<&'a str> {
        reference
            .as_str()
            .strip_prefix(&self.base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| StorageError::InvalidReference(reference.to_string()))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(&self, file: &FileUpload, progress: ProgressSink) -> StorageResult<StoredFile> {
        let key = Self::generate_key(&file.descriptor.name);
        let path = self.key_to_path(&key)?;

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut out = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let mut written: u64 = 0;
        for chunk in file.data.chunks(UPLOAD_CHUNK_SIZE) {
            out.write_all(chunk).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            written += chunk.len() as u64;
            progress.report(written);
        }

        out.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        let url = self.generate_url(&key);

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(StoredFile {
            reference: DocumentReference::new(url.clone()),
            url: Some(url),
            size: written,
        })
    }

    async fn delete(&self, reference: &DocumentReference) -> StorageResult<()> {
        let key = self.reference_to_key(reference)?;
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(path = %path.display(), key = %key, "Local storage delete successful");

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
