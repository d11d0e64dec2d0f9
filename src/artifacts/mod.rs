//! Artifact handling: per-OS grouping and update-metadata merging

pub mod grouper;
pub mod metadata;

pub use grouper::{
    GroupedArtifacts, OsArtifactBucket, PlannedGroup, group_artifacts, is_metadata_fragment, plan,
};
pub use metadata::{
    CONSOLIDATED_METADATA_NAME, MetadataDocument, merge_documents, merge_metadata, parse_fragment,
    render_metadata,
};
