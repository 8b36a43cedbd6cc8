use crate::traits::{ProgressSink, Storage, StorageError, StorageResult, StoredFile};
use crate::{StorageBackend, UPLOAD_CHUNK_SIZE};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thesis_core::models::{DocumentReference, FileUpload};

/// Remote storage endpoint reached with a multipart POST
#[derive(Clone, Debug)]
pub struct HttpStorage {
    client: Client,
    endpoint_url: String,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StoredFileResponse {
    reference: String,
    #[serde(default)]
    url: Option<String>,
}

impl HttpStorage {
    /// Create a new HttpStorage instance
    ///
    /// # Arguments
    /// * `endpoint_url` - Base URL of the storage service (e.g., "https://files.example.edu")
    /// * `api_token` - Bearer token sent with every request, if any
    pub fn new(endpoint_url: impl Into<String>, api_token: Option<String>) -> StorageResult<Self> {
        // No client-wide timeout: the upload channel enforces the deadline.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint_url: endpoint_url.into().trim_end_matches('/').to_string(),
            api_token,
        })
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.endpoint_url)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn streamed_body(data: Bytes, progress: ProgressSink) -> Body {
        let chunks: Vec<Bytes> = (0..data.len())
            .step_by(UPLOAD_CHUNK_SIZE)
            .map(|start| data.slice(start..(start + UPLOAD_CHUNK_SIZE).min(data.len())))
            .collect();

        let mut sent: u64 = 0;
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            progress.report(sent);
            Ok::<Bytes, std::io::Error>(chunk)
        });
        Body::wrap_stream(stream)
    }
}

fn map_transport_error(err: reqwest::Error) -> StorageError {
    if err.is_timeout() {
        StorageError::Timeout
    } else if err.is_connect() || err.is_request() || err.is_body() {
        StorageError::Network(err.to_string())
    } else {
        StorageError::UploadFailed(err.to_string())
    }
}

#[async_trait]
impl Storage for HttpStorage {
    async fn upload(&self, file: &FileUpload, progress: ProgressSink) -> StorageResult<StoredFile> {
        let descriptor = &file.descriptor;
        let body = Self::streamed_body(file.data.clone(), progress);

        let part = Part::stream_with_length(body, descriptor.size)
            .file_name(descriptor.name.clone())
            .mime_str(&descriptor.content_type)
            .map_err(|e| StorageError::UploadFailed(format!("Invalid content type: {}", e)))?;

        let form = Form::new()
            .text("filename", descriptor.name.clone())
            .text("content_type", descriptor.content_type.clone())
            .text("purpose", "proposal_document")
            .part("file", part);

        tracing::debug!(
            url = %self.files_url(),
            filename = %descriptor.name,
            bytes = descriptor.size,
            "Uploading document to storage endpoint"
        );

        let request = self.apply_auth(self.client.post(self.files_url()).multipart(form));
        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let stored: StoredFileResponse = response
            .json()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Invalid storage response: {}", e)))?;

        if stored.reference.trim().is_empty() {
            return Err(StorageError::UploadFailed(
                "Storage endpoint returned an empty reference".to_string(),
            ));
        }

        Ok(StoredFile {
            reference: DocumentReference::new(stored.reference),
            url: stored.url,
            size: descriptor.size,
        })
    }

    async fn delete(&self, reference: &DocumentReference) -> StorageResult<()> {
        let url = format!(
            "{}/{}",
            self.files_url(),
            urlencoding::encode(reference.as_str())
        );
        let response = self
            .apply_auth(self.client.delete(&url))
            .send()
            .await
            .map_err(map_transport_error)?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Ok(()),
            s => Err(StorageError::DeleteFailed(format!(
                "Storage endpoint answered {}",
                s
            ))),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Http
    }
}
