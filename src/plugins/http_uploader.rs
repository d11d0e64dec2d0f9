//! HTTP Uploader - multipart uploads to a generic update server
//!
//! Every artifact is sent as `POST {baseUrl}/{os}/upload` with a single
//! multipart part named `File`. Only a 200 response counts as success.

use crate::core::config::PublisherConfig;
use crate::core::error::PublishError;
use crate::core::platform::CanonicalOs;
use crate::core::traits::{ArtifactUploader, ProgressSink, TracingProgress};
use crate::security::SecureTokenManager;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Name of the multipart field carrying the artifact
pub const FILE_FIELD: &str = "File";

/// Uploader for the generic update server
pub struct HttpUploader {
    client: reqwest::Client,
    config: PublisherConfig,
    progress: Arc<dyn ProgressSink>,
    token_manager: SecureTokenManager,
}

impl HttpUploader {
    /// Create an uploader with a default HTTP client and tracing progress
    pub fn new(config: PublisherConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            progress: Arc::new(TracingProgress),
            token_manager: SecureTokenManager::new(),
        }
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots, ...)
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Send per-file progress lines to `progress`
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Build the `File` part, streaming from disk when no content is given
    async fn file_part(artifact: &Path, content: Option<Vec<u8>>) -> Result<Part, PublishError> {
        let file_name = file_name_of(artifact);

        let part = match content {
            Some(bytes) => Part::bytes(bytes),
            None => {
                let io_error = |source| PublishError::Io {
                    path: artifact.to_path_buf(),
                    source,
                };
                let file = File::open(artifact).await.map_err(io_error)?;
                let length = file.metadata().await.map_err(io_error)?.len();
                let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
                Part::stream_with_length(body, length)
            }
        };

        Ok(part.file_name(file_name))
    }
}

fn file_name_of(artifact: &Path) -> String {
    artifact
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| artifact.display().to_string())
}

#[async_trait]
impl ArtifactUploader for HttpUploader {
    async fn upload(
        &self,
        artifact: &Path,
        os: &CanonicalOs,
        content: Option<Vec<u8>>,
    ) -> Result<(), PublishError> {
        self.progress
            .progress(&format!("upload file {}", artifact.display()));

        let form = Form::new().part(FILE_FIELD, Self::file_part(artifact, content).await?);
        let url = self.config.upload_url(os.as_str());

        tracing::debug!(
            %url,
            token = %self.token_manager.mask_token(self.config.token()),
            "sending upload request"
        );

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.config.token())
            .multipart(form)
            .send()
            .await
            .map_err(|source| PublishError::Transport {
                os: os.to_string(),
                artifact: artifact.display().to_string(),
                source,
            })?;

        let status = response.status();
        // Strictly 200: other 2xx codes are failures too
        if status != StatusCode::OK {
            let body = match response.text().await {
                Ok(text) => text,
                Err(e) => format!("<failed to read response body: {}>", e),
            };
            return Err(PublishError::UploadFailed {
                os: os.to_string(),
                artifact: artifact.display().to_string(),
                status: status.as_u16(),
                body: self
                    .token_manager
                    .mask_token_in_string(&body, self.config.token()),
            });
        }

        tracing::debug!(%url, artifact = %artifact.display(), "upload accepted");
        Ok(())
    }
}
