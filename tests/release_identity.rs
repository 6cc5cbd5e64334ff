// ABOUTME: Integration tests for release identity derivation.
// ABOUTME: Fixed scenarios plus property tests over branch names and timestamps.

mod support;

use proptest::prelude::*;
use stackship::release::{IdentityErrorKind, IdentityRequest, ReleaseIdentity};
use stackship::vcs::StaticVcs;
use std::fs;
use std::path::Path;

fn derive_blocking(vcs: &StaticVcs, request: &IdentityRequest) -> ReleaseIdentity {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(ReleaseIdentity::derive(vcs, request))
        .unwrap()
}

#[tokio::test]
async fn unblessed_identity_carries_timestamp_and_commit() {
    let project = tempfile::tempdir().unwrap();
    let identity = support::identity(project.path(), false).await;

    assert_eq!(
        identity.release_id().as_str(),
        "acme-release-1.2.3-20231114T221320-abcdef1"
    );
    assert_eq!(identity.package_name(), "acme-release");
    assert_eq!(identity.package_version(), "1.2.3+20231114T221320.abcdef1");
    assert_eq!(identity.branch_prefix(), "release");
    assert_eq!(identity.sym_ver(), "1.2.3");
    assert_eq!(identity.commit_hash_short(), "abcdef1");
    assert!(!identity.is_blessed());
}

#[tokio::test]
async fn blessed_identity_omits_timestamp_and_commit() {
    let project = tempfile::tempdir().unwrap();
    let identity = support::identity(project.path(), true).await;

    assert_eq!(identity.release_id().as_str(), "acme-release-1.2.3");
    assert_eq!(identity.package_version(), "1.2.3");
    assert!(identity.is_blessed());
}

#[tokio::test]
async fn version_file_is_not_read_when_branch_has_a_version() {
    let project = tempfile::tempdir().unwrap();
    fs::write(project.path().join("VERSION"), "9.9.9\n").unwrap();

    let identity = support::identity(project.path(), true).await;

    assert_eq!(identity.sym_ver(), "1.2.3");
}

#[tokio::test]
async fn version_file_is_used_for_unversioned_branches() {
    let project = tempfile::tempdir().unwrap();
    fs::write(project.path().join("VERSION"), " 4.5.6\n").unwrap();
    let vcs = StaticVcs::new("main", support::COMMIT);
    let request = IdentityRequest::new("acme", support::STAMP, true, project.path());

    let identity = ReleaseIdentity::derive(&vcs, &request).await.unwrap();

    assert_eq!(identity.release_id().as_str(), "acme-main-4.5.6");
    assert_eq!(identity.package_name(), "acme-main");
}

#[tokio::test]
async fn unversioned_branch_without_version_file_fails() {
    let project = tempfile::tempdir().unwrap();
    let vcs = StaticVcs::new("main", support::COMMIT);
    let request = IdentityRequest::new("acme", support::STAMP, false, project.path());

    let err = ReleaseIdentity::derive(&vcs, &request).await.unwrap_err();

    assert_eq!(err.kind(), IdentityErrorKind::NoVersionSource);
    assert!(err.to_string().contains("main"));
}

#[tokio::test]
async fn missing_commit_is_a_vcs_error() {
    let vcs = StaticVcs::new("release1.2.3", "");
    let request = IdentityRequest::new("acme", support::STAMP, false, Path::new("/nonexistent"));

    let err = ReleaseIdentity::derive(&vcs, &request).await.unwrap_err();

    assert_eq!(err.kind(), IdentityErrorKind::Vcs);
}

#[tokio::test]
async fn branch_separators_are_folded_into_the_release_id() {
    let vcs = StaticVcs::new("feature/login1.0.0", support::COMMIT);
    let request = IdentityRequest::new("acme", support::STAMP, true, Path::new("/nonexistent"));

    let identity = ReleaseIdentity::derive(&vcs, &request).await.unwrap();

    assert_eq!(identity.release_id().as_str(), "acme-feature-login-1.0.0");
    assert_eq!(identity.package_name(), "acme-feature-login");
    assert_eq!(identity.branch_prefix(), "feature-login");
}

#[tokio::test]
async fn whitespace_in_product_cannot_form_a_release_id() {
    let vcs = StaticVcs::new("release1.2.3", support::COMMIT);
    let request = IdentityRequest::new("my shop", support::STAMP, true, Path::new("/nonexistent"));

    let err = ReleaseIdentity::derive(&vcs, &request).await.unwrap_err();

    assert_eq!(err.kind(), IdentityErrorKind::InvalidInput);
}

proptest! {
    #[test]
    fn same_inputs_give_the_same_identity(
        prefix in "[a-z][a-z-]{0,10}",
        major in 0u32..100,
        minor in 0u32..100,
        patch in 0u32..100,
        stamp in 0i64..4_000_000_000,
        blessed in any::<bool>(),
    ) {
        let branch = format!("{prefix}{major}.{minor}.{patch}");
        let vcs = StaticVcs::new(branch, support::COMMIT);
        let request = IdentityRequest::new("acme", stamp, blessed, Path::new("/nonexistent"));

        let first = derive_blocking(&vcs, &request);
        let second = derive_blocking(&vcs, &request);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.sym_ver(), format!("{major}.{minor}.{patch}"));
        prop_assert_eq!(first.branch_prefix(), prefix.as_str());
    }

    #[test]
    fn unblessed_ids_embed_the_short_commit(
        stamp in 0i64..4_000_000_000,
    ) {
        let vcs = StaticVcs::new("release1.2.3", support::COMMIT);
        let request = IdentityRequest::new("acme", stamp, false, Path::new("/nonexistent"));

        let identity = derive_blocking(&vcs, &request);

        prop_assert!(identity.release_id().as_str().starts_with("acme-release-1.2.3-"));
        prop_assert!(identity.release_id().as_str().ends_with("-abcdef1"));
        prop_assert!(identity.package_version().starts_with("1.2.3+"));
    }
}
