#[cfg(feature = "storage-http")]
use crate::HttpStorage;
#[cfg(feature = "storage-local")]
use crate::LocalStorage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use std::sync::Arc;
use thesis_core::StorageConfig;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &StorageConfig) -> StorageResult<Arc<dyn Storage>> {
    let backend = config.backend.unwrap_or(StorageBackend::Http);

    match backend {
        #[cfg(feature = "storage-http")]
        StorageBackend::Http => {
            let endpoint = config.endpoint_url.clone().ok_or_else(|| {
                StorageError::ConfigError("THESIS_STORAGE_URL not configured".to_string())
            })?;

            let storage = HttpStorage::new(endpoint, config.api_token.clone())?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-http"))]
        StorageBackend::Http => Err(StorageError::ConfigError(
            "HTTP storage backend not available (storage-http feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("THESIS_LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config
                .local_storage_base_url
                .clone()
                .unwrap_or_else(|| format!("file://{}", base_path.trim_end_matches('/')));

            let storage = LocalStorage::new(base_path, base_url).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
