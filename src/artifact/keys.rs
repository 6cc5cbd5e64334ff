// ABOUTME: Pure mapping from release id and local file to object storage keys.
// ABOUTME: Covers application tarballs, infrastructure templates and static files.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::types::ReleaseId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("{} has no file name", .0.display())]
    NoFileName(PathBuf),

    #[error("{} is not under static root {}", .path.display(), .root.display())]
    OutsideStaticRoot { path: PathBuf, root: PathBuf },
}

/// Class of artifact a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactClass {
    App,
    Template,
    Static,
}

impl ArtifactClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Template => "template",
            Self::Static => "static",
        }
    }
}

/// A storage key tagged with its artifact class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    class: ArtifactClass,
    key: String,
}

impl ArtifactKey {
    pub fn class(&self) -> ArtifactClass {
        self.class
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Display URL for this key in `bucket`, with the final segment URL-encoded.
    pub fn url(&self, bucket: &str) -> String {
        crate::cloud::object_url(bucket, &self.key)
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Storage layout for one deployment, taken from resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBuilder {
    app_releases_path: String,
    template_releases_path: String,
    static_src_root: Option<PathBuf>,
    static_prefix: String,
}

impl KeyBuilder {
    pub fn new(
        app_releases_path: &str,
        template_releases_path: &str,
        static_src_root: Option<&Path>,
        static_prefix: &str,
    ) -> Self {
        Self {
            app_releases_path: app_releases_path.trim_matches('/').to_string(),
            template_releases_path: template_releases_path.trim_matches('/').to_string(),
            static_src_root: static_src_root.map(Path::to_path_buf),
            static_prefix: static_prefix.trim_matches('/').to_string(),
        }
    }

    /// `{app_releases_path}/{basename}`. The release id is not part of the
    /// key, so uploading the same file name twice overwrites.
    pub fn app_key(&self, filename: &Path) -> Result<ArtifactKey, KeyError> {
        let name = basename(filename)?;
        Ok(ArtifactKey {
            class: ArtifactClass::App,
            key: join_segments([self.app_releases_path.as_str(), name.as_str()]),
        })
    }

    /// `{template_releases_path}/{release_id}_{basename}`.
    pub fn template_key(
        &self,
        release_id: &ReleaseId,
        filename: &Path,
    ) -> Result<ArtifactKey, KeyError> {
        let name = basename(filename)?;
        Ok(ArtifactKey {
            class: ArtifactClass::Template,
            key: join_segments([
                self.template_releases_path.as_str(),
                &format!("{release_id}_{name}"),
            ]),
        })
    }

    /// Key prefix shared by every template uploaded for `release_id`.
    pub fn template_release_prefix(&self, release_id: &ReleaseId) -> String {
        join_segments([
            self.template_releases_path.as_str(),
            &format!("{release_id}_"),
        ])
    }

    /// `{release_id}/{static_prefix}/{path relative to the static root}`.
    pub fn static_key(&self, release_id: &ReleaseId, path: &Path) -> Result<ArtifactKey, KeyError> {
        let relative = match &self.static_src_root {
            Some(root) => path
                .strip_prefix(root)
                .map_err(|_| KeyError::OutsideStaticRoot {
                    path: path.to_path_buf(),
                    root: root.clone(),
                })?,
            None => path,
        };

        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        if parts.is_empty() {
            return Err(KeyError::NoFileName(path.to_path_buf()));
        }

        let mut segments = vec![release_id.as_str().to_string()];
        if !self.static_prefix.is_empty() {
            segments.push(self.static_prefix.clone());
        }
        segments.extend(parts);

        Ok(ArtifactKey {
            class: ArtifactClass::Static,
            key: segments.join("/"),
        })
    }
}

fn basename(path: &Path) -> Result<String, KeyError> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| KeyError::NoFileName(path.to_path_buf()))
}

fn join_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    segments
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
