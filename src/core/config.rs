//! Configuration structures for generic-publisher
//!
//! `PublishConfig` mirrors the on-disk YAML layout, where every field is
//! optional so layers can be merged. `PublisherConfig` is the resolved form
//! handed to the uploader.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Root configuration object, as found in `.generic-publisher.yaml`
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PublishConfig {
    /// Extend from base configuration file (optional, relative to this file)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Base url (with http(s)://) of the generic update server
    #[serde(skip_serializing_if = "Option::is_none", rename = "baseUrl")]
    pub base_url: Option<String>,

    /// Authentication token, sent verbatim as the Authorization header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl fmt::Debug for PublishConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishConfig")
            .field("extends", &self.extends)
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Resolved publisher configuration
#[derive(Debug)]
pub struct PublisherConfig {
    /// Scheme + host, no trailing slash
    pub base_url: String,
    pub token: SecretString,
}

impl PublisherConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let token: String = token.into();
        Self {
            base_url: base_url.into(),
            token: SecretString::new(token.into()),
        }
    }

    /// Upload endpoint for an OS bucket
    pub fn upload_url(&self, os: &str) -> String {
        format!("{}/{}/upload", self.base_url, os)
    }

    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }
}
