pub mod artifacts;
pub mod core;
pub mod orchestration;
pub mod plugins;
pub mod security;

pub use artifacts::{OsArtifactBucket, PlannedGroup, group_artifacts, plan};
pub use self::core::*;
pub use orchestration::GenericPublisher;
pub use plugins::HttpUploader;
pub use security::SecureTokenManager;
