// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles bucket name formats and template directory segments.

use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::PathBuf;

use super::BucketFormat;

pub fn deserialize_bucket_format<'de, D>(deserializer: D) -> Result<BucketFormat, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BucketFormat::parse(&s).map_err(serde::de::Error::custom)
}

/// Accepts a list of path segments or a single path string.
pub fn deserialize_path_segments<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let segments = match PathEntry::deserialize(deserializer)? {
        PathEntry::Single(s) => vec![s],
        PathEntry::Segments(segments) => segments,
    };

    let segments = NonEmpty::from_vec(segments)
        .ok_or_else(|| serde::de::Error::custom("at least one path segment is required"))?;
    if segments.iter().any(|s| s.trim().is_empty()) {
        return Err(serde::de::Error::custom("path segments cannot be empty"));
    }

    Ok(segments.iter().collect())
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PathEntry {
    Single(String),
    Segments(Vec<String>),
}
