//! HTTP client for the proposal submission API.
//!
//! Provides a minimal client with configurable auth (Bearer token or X-API-Key),
//! generic GET/POST helpers that convert every failure into a [`GatewayError`],
//! and the domain methods used by the wizard (create submission, list
//! supervisors).

pub mod api;

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thesis_core::GatewayError;

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// `X-API-Key: {key}`
    XApiKey(String),
}

/// API version prefix (e.g. "/api/v1"). Set THESIS_API_VERSION to match the server.
pub fn api_prefix() -> String {
    let version = std::env::var("THESIS_API_VERSION").unwrap_or_else(|_| "v1".to_string());
    format!("/api/{}", version)
}

/// Default request timeout. The wizard applies its own, usually shorter, deadline.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for the proposal API with configurable auth.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Auth,
    department: Option<String>,
}

/// Error body returned by the API on 4xx responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    field: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String, auth: Auth) -> Result<Self> {
        Self::with_timeout(base_url, auth, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: String, auth: Auth, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            department: None,
        })
    }

    /// Create client from environment: THESIS_API_URL, THESIS_API_TOKEN.
    /// Falls back to THESIS_API_KEY with X-API-Key auth when no token is set.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("THESIS_API_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        let auth = match std::env::var("THESIS_API_TOKEN") {
            Ok(token) => Auth::Bearer(token),
            Err(_) => std::env::var("THESIS_API_KEY")
                .map(Auth::XApiKey)
                .context("Missing credentials. Set THESIS_API_TOKEN or THESIS_API_KEY")?,
        };

        let client = Self::new(base_url, auth)?;
        Ok(match std::env::var("THESIS_SUPERVISOR_DEPARTMENT") {
            Ok(department) if !department.trim().is_empty() => client.with_department(department),
            _ => client,
        })
    }

    /// Restrict the supervisor directory to one department.
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
            Auth::XApiKey(key) => request.header("X-API-Key", key.as_str()),
        }
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let url = self.build_url(path);
        let mut request = self.apply_auth(self.client.get(&url));

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        parse_response(response).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).json(body));

        let response = request.send().await.map_err(map_transport_error)?;
        parse_response(response).await
    }
}

fn map_transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Network(format!("{:#}", anyhow::Error::new(err)))
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        return Err(status_error(status, response).await);
    }

    let bytes = response.bytes().await.map_err(map_transport_error)?;
    serde_json::from_slice::<T>(&bytes)
        .context("Failed to parse response as JSON")
        .map_err(|e| GatewayError::InvalidResponse(format!("{:#}", e)))
}

async fn status_error(status: StatusCode, response: Response) -> GatewayError {
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    let message = body
        .error
        .or(body.message)
        .unwrap_or_else(|| if text.is_empty() { status.to_string() } else { text });

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => GatewayError::Validation {
            message,
            field: body.field,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Unauthorized(message),
        _ => GatewayError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

// Re-export domain types for convenience.
pub use thesis_core::models::{SubmissionPayload, SubmissionRecord, Supervisor};
