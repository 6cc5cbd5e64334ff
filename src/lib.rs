// ABOUTME: Library root for stackship - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod artifact;
pub mod cloud;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod migrate;
pub mod output;
pub mod package;
pub mod release;
pub mod static_release;
pub mod types;
pub mod vcs;
