//! Assembles a wizard session from environment configuration.

use anyhow::{Context, Result};
use std::sync::Arc;
use thesis_api_client::ApiClient;
use thesis_core::{StorageConfig, WizardConfig};
use thesis_storage::create_storage;
use thesis_wizard::WizardController;

/// Everything needed to open wizard sessions against one deployment.
pub struct WizardEnvironment {
    pub config: WizardConfig,
    pub storage: Arc<dyn thesis_storage::Storage>,
    pub api: Arc<ApiClient>,
}

impl WizardEnvironment {
    /// Load `.env`, validate every configuration section and build the
    /// storage backend and API client.
    pub async fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = WizardConfig::from_env().context("Invalid wizard configuration")?;

        let storage_config = StorageConfig::from_env();
        storage_config
            .validate()
            .context("Invalid storage configuration")?;
        let storage = create_storage(&storage_config)
            .await
            .context("Failed to create storage backend")?;

        let api = ApiClient::from_env().context("Failed to create API client")?;

        tracing::info!(
            environment = %config.environment,
            storage_backend = %storage.backend_type(),
            api_url = %api.base_url(),
            "Wizard environment loaded"
        );

        Ok(Self {
            config,
            storage,
            api: Arc::new(api),
        })
    }

    /// Open a fresh wizard session. The API client serves as both the
    /// submission gateway and the supervisor directory.
    pub fn open_wizard(&self) -> WizardController {
        WizardController::new(self.config.clone(), self.storage.clone(), self.api.clone())
            .with_directory(self.api.clone())
    }
}
