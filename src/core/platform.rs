//! Platform to OS mapping
//!
//! Build platforms are reduced to the OS keys the update server routes on.

use serde::{Serialize, Serializer};
use std::fmt;

/// Normalized OS bucket key, used for grouping and as the upload URL segment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CanonicalOs {
    Linux,
    Win,
    Mac,
    /// Unrecognized platform identifier, passed through verbatim
    Other(String),
}

impl CanonicalOs {
    /// Resolve a build platform identifier to its OS key.
    ///
    /// Total: identifiers missing from the table map to themselves.
    ///
    /// # Examples
    ///
    /// ```
    /// use generic_publisher::core::CanonicalOs;
    ///
    /// assert_eq!(CanonicalOs::from_platform("win32"), CanonicalOs::Win);
    /// assert_eq!(CanonicalOs::from_platform("freebsd").as_str(), "freebsd");
    /// ```
    pub fn from_platform(platform: &str) -> Self {
        match platform {
            "linux" => Self::Linux,
            "win32" => Self::Win,
            "darwin" => Self::Mac,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Linux => "linux",
            Self::Win => "win",
            Self::Mac => "mac",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for CanonicalOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CanonicalOs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_platforms() {
        assert_eq!(CanonicalOs::from_platform("linux"), CanonicalOs::Linux);
        assert_eq!(CanonicalOs::from_platform("win32"), CanonicalOs::Win);
        assert_eq!(CanonicalOs::from_platform("darwin"), CanonicalOs::Mac);
    }

    #[test]
    fn test_unknown_platform_passes_through() {
        let os = CanonicalOs::from_platform("mas");
        assert_eq!(os, CanonicalOs::Other("mas".to_string()));
        assert_eq!(os.to_string(), "mas");
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(
            CanonicalOs::from_platform("Darwin"),
            CanonicalOs::Other("Darwin".to_string())
        );
    }

    #[test]
    fn test_os_keys() {
        assert_eq!(CanonicalOs::Win.as_str(), "win");
        assert_eq!(CanonicalOs::Mac.to_string(), "mac");
        assert_eq!(serde_json::to_string(&CanonicalOs::Linux).unwrap(), r#""linux""#);
    }
}
