//! Core traits and types for artifact publishing
//!
//! This module defines the publisher capability, the uploader seam the
//! orchestrator drives, and the sinks used to report progress.

use super::error::PublishError;
use super::platform::CanonicalOs;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

// ============================================================================
// Inputs
// ============================================================================

/// One platform's build output: a platform tag plus the produced artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeResult {
    pub platform: String,
    pub artifacts: Vec<PathBuf>,
}

impl MakeResult {
    pub fn new<I, P>(platform: impl Into<String>, artifacts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            platform: platform.into(),
            artifacts: artifacts.into_iter().map(Into::into).collect(),
        }
    }
}

/// Options for a publish operation
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    pub make_results: Vec<MakeResult>,
}

// ============================================================================
// Outcome
// ============================================================================

/// A single successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedArtifact {
    pub os: CanonicalOs,
    pub name: String,
}

/// Result of a fully successful publish operation
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub run_id: Uuid,
    pub os_groups: usize,
    pub uploaded: Vec<UploadedArtifact>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

// ============================================================================
// Sinks
// ============================================================================

/// Receives the coarse, once-per-OS status line ("Uploading result (i/N)")
pub trait StatusSink: Send + Sync {
    fn report(&self, status: &str);
}

impl<F> StatusSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, status: &str) {
        self(status)
    }
}

/// Receives the per-file progress line emitted before each upload
pub trait ProgressSink: Send + Sync {
    fn progress(&self, line: &str);
}

/// Forwards progress lines to `tracing` at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn progress(&self, line: &str) {
        tracing::info!("{}", line);
    }
}

// ============================================================================
// Uploader
// ============================================================================

/// Performs a single authenticated upload to the update server
#[async_trait]
pub trait ArtifactUploader: Send + Sync {
    /// Upload one artifact into the `os` bucket.
    ///
    /// With `content == None` the file at `artifact` is streamed from disk;
    /// otherwise `content` is uploaded under `artifact`'s file name.
    async fn upload(
        &self,
        artifact: &Path,
        os: &CanonicalOs,
        content: Option<Vec<u8>>,
    ) -> Result<(), PublishError>;
}

// ============================================================================
// Publisher Trait
// ============================================================================

/// A publisher exposes exactly one operation: publish a set of make results
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publisher name (e.g., "generic")
    fn name(&self) -> &str;

    /// Publish every artifact, reporting one status line per OS group.
    ///
    /// Resolves on full success or fails with the first fatal error.
    async fn publish(
        &self,
        options: PublishOptions,
        status: &dyn StatusSink,
    ) -> Result<PublishReport, PublishError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_make_result_new() {
        let result = MakeResult::new("darwin", ["out/app.dmg", "out/latest-mac.yml"]);

        assert_eq!(result.platform, "darwin");
        assert_eq!(result.artifacts.len(), 2);
        assert_eq!(result.artifacts[0], PathBuf::from("out/app.dmg"));
    }

    #[test]
    fn test_make_result_deserialization() {
        let yaml = r#"
- platform: win32
  artifacts:
    - out/setup.exe
    - out/latest-x64.yml
"#;
        let results: Vec<MakeResult> = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].platform, "win32");
        assert_eq!(results[0].artifacts[1], PathBuf::from("out/latest-x64.yml"));
    }

    #[test]
    fn test_closure_status_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |status: &str| seen.lock().unwrap().push(status.to_string());

        sink.report("Uploading result (1/1)");

        assert_eq!(*seen.lock().unwrap(), vec!["Uploading result (1/1)"]);
    }

    #[test]
    fn test_publish_report_serialization() {
        let now = Utc::now();
        let report = PublishReport {
            run_id: Uuid::new_v4(),
            os_groups: 1,
            uploaded: vec![UploadedArtifact {
                os: CanonicalOs::Mac,
                name: "latest.yml".to_string(),
            }],
            started_at: now,
            finished_at: now,
        };

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""os":"mac""#));
        assert!(json.contains(r#""name":"latest.yml""#));
    }
}
