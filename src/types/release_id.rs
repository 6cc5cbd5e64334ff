// ABOUTME: Release identifier naming one deployable unit of code and config.
// ABOUTME: Used as a storage prefix, so it must be a single path segment.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReleaseIdError {
    #[error("release id cannot be empty")]
    Empty,

    #[error("release id cannot contain '{0}'")]
    InvalidChar(char),
}

/// A release identifier such as `acme-release-1.2.3-20231114T221320-abcdef1`.
///
/// Release ids become top-level prefixes in the static bucket and path
/// segments in template keys, so slashes and whitespace are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReleaseId(String);

impl ReleaseId {
    pub fn new(value: &str) -> Result<Self, ReleaseIdError> {
        let value = value.trim_matches('/');
        if value.is_empty() {
            return Err(ReleaseIdError::Empty);
        }

        if let Some(c) = value
            .chars()
            .find(|c| *c == '/' || *c == '\\' || c.is_whitespace())
        {
            return Err(ReleaseIdError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The storage prefix holding this release's static files.
    pub fn prefix(&self) -> String {
        format!("{}/", self.0)
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ReleaseId {
    type Err = ReleaseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_slashes() {
        let id = ReleaseId::new("/rel-1/").unwrap();
        assert_eq!(id.as_str(), "rel-1");
        assert_eq!(id.prefix(), "rel-1/");
    }

    #[test]
    fn rejects_nested_paths() {
        assert_eq!(ReleaseId::new("a/b"), Err(ReleaseIdError::InvalidChar('/')));
        assert_eq!(ReleaseId::new("//"), Err(ReleaseIdError::Empty));
    }
}
