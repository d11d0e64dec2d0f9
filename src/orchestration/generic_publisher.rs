//! Generic Publisher - main orchestrator for artifact publishing
//!
//! Runs the pipeline strictly in sequence:
//! - Group make results by OS
//! - Upload each OS group's plain files in order
//! - Merge the group's `latest-*.yml` fragments and upload them as `latest.yml`
//!
//! The first error aborts the run. Nothing already uploaded is rolled back.

use crate::artifacts::{
    CONSOLIDATED_METADATA_NAME, group_artifacts, merge_metadata, render_metadata,
};
use crate::core::config::PublisherConfig;
use crate::core::error::PublishError;
use crate::core::traits::{
    ArtifactUploader, PublishOptions, PublishReport, Publisher, StatusSink, UploadedArtifact,
};
use crate::plugins::HttpUploader;
use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use tracing::Instrument;
use uuid::Uuid;

/// Publisher for a generic update server
pub struct GenericPublisher<U = HttpUploader> {
    uploader: U,
}

impl GenericPublisher<HttpUploader> {
    /// Create a publisher uploading over HTTP with the given configuration
    pub fn from_config(config: PublisherConfig) -> Self {
        Self::new(HttpUploader::new(config))
    }
}

impl<U: ArtifactUploader> GenericPublisher<U> {
    pub fn new(uploader: U) -> Self {
        Self { uploader }
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    async fn run(
        &self,
        options: PublishOptions,
        status: &dyn StatusSink,
        run_id: Uuid,
    ) -> Result<PublishReport, PublishError> {
        let started_at = Utc::now();
        let grouped = group_artifacts(&options.make_results);
        let os_count = grouped.len();
        let mut uploaded = Vec::new();

        tracing::info!(os_groups = os_count, "publishing make results");

        for (index, (os, bucket)) in grouped.into_iter().enumerate() {
            status.report(&format!("Uploading result ({}/{})", index + 1, os_count));

            for artifact in &bucket.files {
                self.uploader.upload(artifact, &os, None).await?;
                uploaded.push(UploadedArtifact {
                    os: os.clone(),
                    name: artifact.display().to_string(),
                });
            }

            if bucket.has_metadata() {
                let merged = merge_metadata(&bucket.meta_files).await?;
                let rendered = render_metadata(&merged, os.as_str())?;
                tracing::debug!(
                    os = %os,
                    fragments = bucket.meta_files.len(),
                    "uploading consolidated metadata"
                );
                self.uploader
                    .upload(
                        Path::new(CONSOLIDATED_METADATA_NAME),
                        &os,
                        Some(rendered.into_bytes()),
                    )
                    .await?;
                uploaded.push(UploadedArtifact {
                    os: os.clone(),
                    name: CONSOLIDATED_METADATA_NAME.to_string(),
                });
            }
        }

        tracing::info!(uploads = uploaded.len(), "publish finished");

        Ok(PublishReport {
            run_id,
            os_groups: os_count,
            uploaded,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

#[async_trait]
impl<U: ArtifactUploader> Publisher for GenericPublisher<U> {
    fn name(&self) -> &str {
        "generic"
    }

    async fn publish(
        &self,
        options: PublishOptions,
        status: &dyn StatusSink,
    ) -> Result<PublishReport, PublishError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("publish", %run_id);

        let result = self.run(options, status, run_id).instrument(span.clone()).await;
        if let Err(e) = &result {
            span.in_scope(|| tracing::error!(code = e.code(), "publish aborted: {}", e));
        }
        result
    }
}
