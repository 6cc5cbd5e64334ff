// ABOUTME: Artifact key construction for object storage.
// ABOUTME: Keys are pure functions of release id, layout config and file path.

mod keys;

pub use keys::{ArtifactClass, ArtifactKey, KeyBuilder, KeyError};
