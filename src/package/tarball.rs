// ABOUTME: Gzipped tarball packager for the project directory.
// ABOUTME: Skips VCS metadata, the output directory and configured exclusions.

use async_trait::async_trait;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{PackageError, PackageMetadata, Packager};

const ALWAYS_EXCLUDED: &[&str] = &[".git"];

/// Writes `{output_dir}/{name}-{version}.tar.gz` with every entry under a
/// `{name}-{version}/` directory.
#[derive(Debug, Clone)]
pub struct TarballPackager {
    output_dir: PathBuf,
    exclusions: Vec<PathBuf>,
}

impl TarballPackager {
    /// `output_dir` and `exclusions` are relative to the package source
    /// directory unless absolute.
    pub fn new(output_dir: impl Into<PathBuf>, exclusions: &[PathBuf]) -> Self {
        Self {
            output_dir: output_dir.into(),
            exclusions: exclusions.to_vec(),
        }
    }

    fn output_dir_for(&self, source_dir: &Path) -> PathBuf {
        source_dir.join(&self.output_dir)
    }
}

#[async_trait]
impl Packager for TarballPackager {
    fn artifact_file_name(&self, metadata: &PackageMetadata) -> String {
        format!("{}.tar.gz", metadata.base_name())
    }

    async fn build(&self, metadata: &PackageMetadata) -> Result<PathBuf, PackageError> {
        if !metadata.source_dir.is_dir() {
            return Err(PackageError::MissingSource(metadata.source_dir.clone()));
        }

        let output_dir = self.output_dir_for(&metadata.source_dir);
        let archive = output_dir.join(self.artifact_file_name(metadata));
        let mut skipped: Vec<PathBuf> = ALWAYS_EXCLUDED
            .iter()
            .map(|e| metadata.source_dir.join(e))
            .chain(self.exclusions.iter().map(|e| metadata.source_dir.join(e)))
            .collect();
        skipped.push(output_dir.clone());

        let source_dir = metadata.source_dir.clone();
        let base_name = metadata.base_name();
        let target = archive.clone();

        tracing::info!(archive = %archive.display(), "building package");
        let count = tokio::task::spawn_blocking(move || {
            write_archive(&source_dir, &output_dir, &target, &base_name, &skipped)
        })
        .await
        .map_err(|e| PackageError::Task(e.to_string()))??;

        tracing::debug!(files = count, archive = %archive.display(), "package written");
        Ok(archive)
    }
}

fn write_archive(
    source_dir: &Path,
    output_dir: &Path,
    archive: &Path,
    base_name: &str,
    skipped: &[PathBuf],
) -> Result<usize, PackageError> {
    let write_err = |source| PackageError::Write {
        path: archive.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(output_dir).map_err(write_err)?;
    let file = File::create(archive).map_err(write_err)?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    let root = Path::new(base_name);
    let mut count = 0;

    let walker = WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !skipped.iter().any(|s| entry.path() == s));

    for entry in walker {
        let entry = entry.map_err(|source| PackageError::Walk {
            path: source_dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(source_dir) else {
            continue;
        };
        builder
            .append_path_with_name(entry.path(), root.join(relative))
            .map_err(write_err)?;
        count += 1;
    }

    builder
        .into_inner()
        .and_then(GzEncoder::finish)
        .map_err(write_err)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::fs;

    fn entries(archive: &Path) -> Vec<String> {
        let mut reader = tar::Archive::new(GzDecoder::new(File::open(archive).unwrap()));
        let mut names: Vec<String> = reader
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn archive_is_rooted_at_name_and_version() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("manage.py"), "print()").unwrap();
        fs::create_dir_all(dir.path().join("app")).unwrap();
        fs::write(dir.path().join("app/views.py"), "").unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref").unwrap();
        fs::create_dir_all(dir.path().join("static")).unwrap();
        fs::write(dir.path().join("static/site.css"), "").unwrap();

        let packager = TarballPackager::new("dist", &[PathBuf::from("static")]);
        let metadata = PackageMetadata {
            name: "acme-release".to_string(),
            version: "1.2.3".to_string(),
            source_dir: dir.path().to_path_buf(),
        };
        let archive = packager.build(&metadata).await.unwrap();

        assert_eq!(archive, dir.path().join("dist/acme-release-1.2.3.tar.gz"));
        assert_eq!(
            entries(&archive),
            vec![
                "acme-release-1.2.3/app/views.py".to_string(),
                "acme-release-1.2.3/manage.py".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn missing_source_is_an_error() {
        let packager = TarballPackager::new("dist", &[]);
        let metadata = PackageMetadata {
            name: "x".to_string(),
            version: "1".to_string(),
            source_dir: PathBuf::from("/definitely/not/here"),
        };
        assert!(matches!(
            packager.build(&metadata).await,
            Err(PackageError::MissingSource(_))
        ));
    }
}
