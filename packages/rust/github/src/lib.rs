//! Git-host integration: REST client and the release-to-PR components.
//!
//! This crate provides:
//! - [`client`] — Authenticated REST client for the Git host
//! - [`resolver`] — [`ReleaseContextResolver`], what changed in a release
//! - [`committer`] — [`CommitSynchronizer`], atomic multi-file branch commits
//! - [`pulls`] — [`PullRequestManager`], one open PR per head branch

pub mod client;
pub mod committer;
pub mod pulls;
pub mod resolver;

pub use client::GithubClient;
pub use committer::{CommitOutcome, CommitSynchronizer};
pub use pulls::PullRequestManager;
pub use resolver::{ReleaseContextResolver, previous_published_tag};
