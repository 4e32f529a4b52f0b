//! Shared types, error model, and configuration for DocDraft.
//!
//! This crate is the foundation depended on by all other DocDraft crates.
//! It provides:
//! - [`DocDraftError`] — the unified error type
//! - Domain types ([`Release`], [`ReleaseContext`], [`DiffFile`],
//!   [`FileProposal`], [`PullRequest`], [`RepoId`], [`RunId`])
//! - Configuration ([`AppConfig`], config loading, credential resolution)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, GithubConfig, RetryConfig, SlackConfig, config_dir,
    config_file_path, github_token, init_config, load_config, load_config_from, slack_token,
};
pub use error::{DocDraftError, Result};
pub use types::{
    DiffFile, FileProposal, FileStatus, PullRequest, Release, ReleaseContext, RepoId, RunId,
};
