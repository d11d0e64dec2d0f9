//! Artifact Grouper - partitions make results into per-OS buckets
//!
//! Each bucket separates ordinary files from `latest-*.yml` update-metadata
//! fragments, which are merged into a single `latest.yml` before upload.

use crate::core::platform::CanonicalOs;
use crate::core::traits::MakeResult;
use indexmap::{IndexMap, IndexSet};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref METADATA_FRAGMENT_REGEX: Regex =
        Regex::new(r"^latest-.+\.yml$").expect("valid fragment pattern");
}

/// Artifacts of one OS, split by how they are uploaded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsArtifactBucket {
    /// Plain files, unique by exact path, in first-seen order
    pub files: IndexSet<PathBuf>,
    /// Metadata fragments, in input order
    pub meta_files: Vec<PathBuf>,
}

impl OsArtifactBucket {
    fn push(&mut self, artifact: &Path) {
        if is_metadata_fragment(artifact) {
            self.meta_files.push(artifact.to_path_buf());
        } else {
            // first occurrence wins
            self.files.insert(artifact.to_path_buf());
        }
    }

    pub fn has_metadata(&self) -> bool {
        !self.meta_files.is_empty()
    }
}

/// Per-OS artifact buckets, iterated in order of first appearance
pub type GroupedArtifacts = IndexMap<CanonicalOs, OsArtifactBucket>;

/// Whether the artifact's file name matches `latest-<token>.yml`
pub fn is_metadata_fragment(artifact: &Path) -> bool {
    artifact
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| METADATA_FRAGMENT_REGEX.is_match(name))
}

/// Group make results by canonical OS.
///
/// Never fails: unknown platforms become their own bucket, and nothing is
/// dropped except exact duplicate file paths within a bucket.
pub fn group_artifacts(make_results: &[MakeResult]) -> GroupedArtifacts {
    let mut grouped = GroupedArtifacts::new();

    for make_result in make_results {
        let os = CanonicalOs::from_platform(&make_result.platform);
        let bucket = grouped.entry(os).or_default();
        for artifact in &make_result.artifacts {
            bucket.push(artifact);
        }
    }

    grouped
}

/// Upload plan for one OS group, as `publish` would execute it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedGroup {
    pub os: CanonicalOs,
    pub files: Vec<PathBuf>,
    /// Fragments merged into `latest.yml`; empty means no metadata upload
    pub metadata_fragments: Vec<PathBuf>,
}

/// Describe the uploads a publish would perform, without any I/O
pub fn plan(make_results: &[MakeResult]) -> Vec<PlannedGroup> {
    group_artifacts(make_results)
        .into_iter()
        .map(|(os, bucket)| PlannedGroup {
            os,
            files: bucket.files.into_iter().collect(),
            metadata_fragments: bucket.meta_files,
        })
        .collect()
}
