//! Error handling for artifact publishing
//!
//! Every failure in the publish pipeline is fatal: the first error aborts the
//! remaining uploads and is handed back to the caller unchanged.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for artifact publishing operations
#[derive(Error, Debug)]
pub enum PublishError {
    // Upload errors
    #[error(
        "[{os}] Unexpected response code from generic server while uploading {artifact}: {status}\n\nBody:\n{body}"
    )]
    UploadFailed {
        os: String,
        artifact: String,
        status: u16,
        body: String,
    },

    #[error("[{os}] Transport error while uploading {artifact}: {source}")]
    Transport {
        os: String,
        artifact: String,
        #[source]
        source: reqwest::Error,
    },

    // Metadata errors
    #[error("Failed to parse metadata fragment {}: {message}", .path.display())]
    MetadataParse { path: PathBuf, message: String },

    #[error("Failed to serialize merged metadata for {os}: {message}")]
    MetadataSerialize { os: String, message: String },

    // Filesystem errors
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication token is not configured")]
    TokenMissing,
}

impl PublishError {
    /// Get the OS bucket associated with this error, if any
    pub fn os(&self) -> Option<&str> {
        match self {
            Self::UploadFailed { os, .. }
            | Self::Transport { os, .. }
            | Self::MetadataSerialize { os, .. } => Some(os.as_str()),
            _ => None,
        }
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::UploadFailed { status: 401 | 403, .. } => vec![
                "Check the token configured for the update server",
                "Make sure the token includes the scheme the server expects (e.g. \"Bearer ...\")",
            ],
            Self::UploadFailed { .. } => vec![
                "Check the response body for details",
                "Check the update server logs",
            ],
            Self::Transport { .. } => vec![
                "Check your network connection",
                "Check that baseUrl points at a reachable server",
            ],
            Self::MetadataParse { .. } => {
                vec!["Check that every latest-*.yml fragment is a valid YAML mapping"]
            }
            Self::MetadataSerialize { .. } => vec!["Check the merged metadata fragments"],
            Self::Io { .. } => vec![
                "Check that the artifact exists",
                "Check file permissions",
            ],
            Self::Config(_) => {
                vec!["Check .generic-publisher.yaml and GENERIC_PUBLISHER_* variables"]
            }
            Self::TokenMissing => vec![
                "Set GENERIC_PUBLISHER_TOKEN",
                "Or add `token` to .generic-publisher.yaml",
            ],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::UploadFailed { .. } => "UPLOAD_FAILED",
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::MetadataParse { .. } => "METADATA_PARSE_FAILED",
            Self::MetadataSerialize { .. } => "METADATA_SERIALIZE_FAILED",
            Self::Io { .. } => "IO_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::TokenMissing => "TOKEN_MISSING",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_failed_error() {
        let error = PublishError::UploadFailed {
            os: "win".to_string(),
            artifact: "setup.exe".to_string(),
            status: 201,
            body: "created, but not what you wanted".to_string(),
        };

        assert_eq!(error.os(), Some("win"));
        assert_eq!(error.code(), "UPLOAD_FAILED");
        let message = error.to_string();
        assert!(message.contains("201"));
        assert!(message.contains("created, but not what you wanted"));
        assert!(message.contains("setup.exe"));
    }

    #[test]
    fn test_upload_failed_auth_actions() {
        let error = PublishError::UploadFailed {
            os: "mac".to_string(),
            artifact: "app.dmg".to_string(),
            status: 401,
            body: String::new(),
        };

        let actions = error.suggested_actions();
        assert!(actions.iter().any(|a| a.contains("token")));
    }

    #[test]
    fn test_metadata_parse_error() {
        let error = PublishError::MetadataParse {
            path: PathBuf::from("out/latest-mac.yml"),
            message: "did not find expected key".to_string(),
        };

        assert_eq!(error.os(), None);
        assert_eq!(error.code(), "METADATA_PARSE_FAILED");
        let message = error.to_string();
        assert!(message.contains("out/latest-mac.yml"));
        assert!(message.contains("did not find expected key"));
    }

    #[test]
    fn test_io_error_display() {
        let error = PublishError::Io {
            path: PathBuf::from("missing.dmg"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };

        assert_eq!(error.code(), "IO_ERROR");
        assert!(error.to_string().contains("missing.dmg"));
        assert!(!error.suggested_actions().is_empty());
    }

    #[test]
    fn test_token_missing_error() {
        let error = PublishError::TokenMissing;

        assert_eq!(error.code(), "TOKEN_MISSING");
        assert!(
            error
                .suggested_actions()
                .iter()
                .any(|a| a.contains("GENERIC_PUBLISHER_TOKEN"))
        );
    }
}
