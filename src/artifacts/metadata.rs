//! Metadata Merger - folds `latest-*.yml` fragments into one document
//!
//! Merging is a shallow overwrite: top-level keys of later fragments replace
//! keys of the same name from earlier ones, everything else is kept.

use crate::core::error::PublishError;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

/// File name of the consolidated metadata document
pub const CONSOLIDATED_METADATA_NAME: &str = "latest.yml";

/// Parsed update-metadata document
pub type MetadataDocument = Mapping;

/// Parse one fragment's text into a document.
///
/// An empty fragment yields an empty document; a top level that is not a
/// mapping cannot be merged and is rejected.
pub fn parse_fragment(content: &str, path: &Path) -> Result<MetadataDocument, PublishError> {
    if content.trim().is_empty() {
        return Ok(MetadataDocument::new());
    }

    let value: Value = serde_yaml::from_str(content).map_err(|e| PublishError::MetadataParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        other => Err(PublishError::MetadataParse {
            path: path.to_path_buf(),
            message: format!("expected a mapping at the top level, found {}", kind_of(&other)),
        }),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Shallow-merge `fragment` into `accumulator`, later keys winning
pub fn merge_into(accumulator: &mut MetadataDocument, fragment: MetadataDocument) {
    for (key, value) in fragment {
        accumulator.insert(key, value);
    }
}

/// Fold parsed documents left to right into one
pub fn merge_documents<I>(documents: I) -> MetadataDocument
where
    I: IntoIterator<Item = MetadataDocument>,
{
    documents
        .into_iter()
        .fold(MetadataDocument::new(), |mut accumulator, fragment| {
            merge_into(&mut accumulator, fragment);
            accumulator
        })
}

/// Read, parse and merge fragments in order.
///
/// The first unreadable or malformed fragment aborts the merge.
pub async fn merge_metadata(fragment_paths: &[PathBuf]) -> Result<MetadataDocument, PublishError> {
    let mut merged = MetadataDocument::new();

    for path in fragment_paths {
        let content = fs::read_to_string(path)
            .await
            .map_err(|source| PublishError::Io {
                path: path.clone(),
                source,
            })?;
        let fragment = parse_fragment(&content, path)?;
        tracing::debug!(path = %path.display(), keys = fragment.len(), "merging metadata fragment");
        merge_into(&mut merged, fragment);
    }

    Ok(merged)
}

/// Serialize a merged document for upload.
///
/// The emitter never wraps long scalars and never writes anchors or aliases.
pub fn render_metadata(document: &MetadataDocument, os: &str) -> Result<String, PublishError> {
    serde_yaml::to_string(document).map_err(|e| PublishError::MetadataSerialize {
        os: os.to_string(),
        message: e.to_string(),
    })
}
