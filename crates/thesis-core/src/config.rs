//! Configuration module
//!
//! Validation constants, timeouts and storage settings. Every value is supplied
//! from the environment (optionally via a `.env` file) and falls back to a
//! default when missing or unparsable.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::storage_types::StorageBackend;

// Common constants
const MAX_TITLE_LENGTH: usize = 200;
const ABSTRACT_MIN_LENGTH: usize = 150;
const ABSTRACT_MAX_LENGTH: usize = 3000;
const MAX_METHODOLOGY_LENGTH: usize = 5000;
const MAX_REFERENCES_LENGTH: usize = 5000;
const MAX_KEYWORDS: usize = 10;
const MAX_TEAM_MEMBERS: usize = 4;
const MAX_DOCUMENT_SIZE_MB: usize = 10;
const UPLOAD_TIMEOUT_SECS: u64 = 120;
const SUBMISSION_TIMEOUT_SECS: u64 = 30;

/// Rules consumed by the step and file validators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationRules {
    pub max_title_length: usize,
    pub abstract_min_length: usize,
    pub abstract_max_length: usize,
    pub max_methodology_length: usize,
    pub max_references_length: usize,
    pub max_keywords: usize,
    pub max_team_members: usize,
    pub max_document_size_bytes: usize,
    pub allowed_document_extensions: Vec<String>,
    pub allowed_document_content_types: Vec<String>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            max_title_length: MAX_TITLE_LENGTH,
            abstract_min_length: ABSTRACT_MIN_LENGTH,
            abstract_max_length: ABSTRACT_MAX_LENGTH,
            max_methodology_length: MAX_METHODOLOGY_LENGTH,
            max_references_length: MAX_REFERENCES_LENGTH,
            max_keywords: MAX_KEYWORDS,
            max_team_members: MAX_TEAM_MEMBERS,
            max_document_size_bytes: MAX_DOCUMENT_SIZE_MB * 1024 * 1024,
            allowed_document_extensions: vec!["pdf".to_string()],
            allowed_document_content_types: vec!["application/pdf".to_string()],
        }
    }
}

impl ValidationRules {
    pub fn from_env() -> Self {
        let max_document_size_mb: usize = env_or("THESIS_MAX_DOCUMENT_SIZE_MB", MAX_DOCUMENT_SIZE_MB);

        Self {
            max_title_length: env_or("THESIS_MAX_TITLE_LENGTH", MAX_TITLE_LENGTH),
            abstract_min_length: env_or("THESIS_ABSTRACT_MIN_LENGTH", ABSTRACT_MIN_LENGTH),
            abstract_max_length: env_or("THESIS_ABSTRACT_MAX_LENGTH", ABSTRACT_MAX_LENGTH),
            max_methodology_length: env_or("THESIS_MAX_METHODOLOGY_LENGTH", MAX_METHODOLOGY_LENGTH),
            max_references_length: env_or("THESIS_MAX_REFERENCES_LENGTH", MAX_REFERENCES_LENGTH),
            max_keywords: env_or("THESIS_MAX_KEYWORDS", MAX_KEYWORDS),
            max_team_members: env_or("THESIS_MAX_TEAM_MEMBERS", MAX_TEAM_MEMBERS),
            max_document_size_bytes: max_document_size_mb * 1024 * 1024,
            allowed_document_extensions: env_list("THESIS_DOCUMENT_ALLOWED_EXTENSIONS", "pdf"),
            allowed_document_content_types: env_list(
                "THESIS_DOCUMENT_ALLOWED_CONTENT_TYPES",
                "application/pdf",
            ),
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_title_length == 0 {
            return Err(anyhow::anyhow!("THESIS_MAX_TITLE_LENGTH must be greater than 0"));
        }
        if self.abstract_min_length > self.abstract_max_length {
            return Err(anyhow::anyhow!(
                "THESIS_ABSTRACT_MIN_LENGTH ({}) cannot exceed THESIS_ABSTRACT_MAX_LENGTH ({})",
                self.abstract_min_length,
                self.abstract_max_length
            ));
        }
        if self.max_keywords == 0 {
            return Err(anyhow::anyhow!("THESIS_MAX_KEYWORDS must be greater than 0"));
        }
        if self.max_document_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "THESIS_MAX_DOCUMENT_SIZE_MB must be greater than 0"
            ));
        }
        if self.allowed_document_content_types.is_empty()
            || self.allowed_document_extensions.is_empty()
        {
            return Err(anyhow::anyhow!(
                "At least one document extension and content type must be allowed"
            ));
        }
        Ok(())
    }
}

/// Wizard session configuration.
#[derive(Clone, Debug)]
pub struct WizardConfig {
    pub rules: ValidationRules,
    pub upload_timeout: Duration,
    pub submission_timeout: Duration,
    pub environment: String,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            rules: ValidationRules::default(),
            upload_timeout: Duration::from_secs(UPLOAD_TIMEOUT_SECS),
            submission_timeout: Duration::from_secs(SUBMISSION_TIMEOUT_SECS),
            environment: "development".to_string(),
        }
    }
}

impl WizardConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let config = WizardConfig {
            rules: ValidationRules::from_env(),
            upload_timeout: Duration::from_secs(env_or(
                "THESIS_UPLOAD_TIMEOUT_SECS",
                UPLOAD_TIMEOUT_SECS,
            )),
            submission_timeout: Duration::from_secs(env_or(
                "THESIS_SUBMISSION_TIMEOUT_SECS",
                SUBMISSION_TIMEOUT_SECS,
            )),
            environment,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.rules.validate()?;
        if self.upload_timeout.is_zero() {
            return Err(anyhow::anyhow!("THESIS_UPLOAD_TIMEOUT_SECS must be greater than 0"));
        }
        if self.submission_timeout.is_zero() {
            return Err(anyhow::anyhow!(
                "THESIS_SUBMISSION_TIMEOUT_SECS must be greater than 0"
            ));
        }
        Ok(())
    }
}

/// Storage endpoint configuration.
#[derive(Clone, Debug, Default)]
pub struct StorageConfig {
    pub backend: Option<StorageBackend>,
    pub endpoint_url: Option<String>,
    pub api_token: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            backend: env::var("THESIS_STORAGE_BACKEND")
                .ok()
                .and_then(|s| s.parse().ok()),
            endpoint_url: env::var("THESIS_STORAGE_URL").ok(),
            api_token: env::var("THESIS_STORAGE_TOKEN")
                .or_else(|_| env::var("THESIS_API_TOKEN"))
                .ok(),
            local_storage_path: env::var("THESIS_LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("THESIS_LOCAL_STORAGE_BASE_URL").ok(),
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.backend.unwrap_or(StorageBackend::Http) {
            StorageBackend::Http => {
                if self.endpoint_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "THESIS_STORAGE_URL must be set when using the http storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "THESIS_LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }
        Ok(())
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_list(key: &str, default: &str) -> Vec<String> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
