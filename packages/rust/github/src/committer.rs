//! Commit synchronization.
//!
//! Publishes a set of file proposals to a branch as one commit: blobs are
//! uploaded concurrently, layered onto the branch's current tree, committed
//! with the branch head as sole parent, and the ref force-updated.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument};

use docdraft_shared::{DocDraftError, FileProposal, RepoId, Result};

use crate::client::GithubClient;

/// In-flight cap for concurrent blob uploads.
const BLOB_UPLOAD_CONCURRENCY: usize = 8;

/// Result of a [`CommitSynchronizer::commit_files`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    /// SHA of the commit now at the branch head.
    pub commit_sha: String,
    /// Whether this call created the branch. `false` means it already
    /// existed and the commit extended its history.
    pub branch_created: bool,
}

/// Publishes file proposals to a branch on the Git host.
#[derive(Debug, Clone)]
pub struct CommitSynchronizer {
    client: GithubClient,
}

impl CommitSynchronizer {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }

    /// Commit `files` onto `branch_name`, creating the branch from
    /// `base_branch` when absent.
    ///
    /// The new tree layers the proposals onto the branch's *current* tree:
    /// unlisted paths are inherited, listed paths fully replaced, nothing
    /// deleted. The commit's single parent is the branch's current head, so
    /// repeated calls form a linear history. The final ref update is forced;
    /// concurrent callers on one branch race last-write-wins.
    #[instrument(skip_all, fields(repo = %repo, branch = branch_name, files = files.len()))]
    pub async fn commit_files(
        &self,
        repo: &RepoId,
        base_branch: &str,
        branch_name: &str,
        message: &str,
        files: &[FileProposal],
    ) -> Result<CommitOutcome> {
        let base_sha = self.client.branch_head(repo, base_branch).await?;
        let branch_created = self
            .client
            .create_branch(repo, branch_name, &base_sha)
            .await?;

        // The branch's own head, not the base branch's: a rerun against an
        // existing branch builds on what is already there.
        let parent_sha = if branch_created {
            base_sha
        } else {
            self.client.branch_head(repo, branch_name).await?
        };
        let base_tree = self.client.commit_tree_sha(repo, &parent_sha).await?;

        let blob_shas = self.upload_blobs(repo, files).await?;
        let entries: Vec<(String, String)> = files
            .iter()
            .map(|file| file.path.clone())
            .zip(blob_shas)
            .collect();

        let tree_sha = self.client.create_tree(repo, &base_tree, &entries).await?;
        let commit_sha = self
            .client
            .create_commit(repo, message, &tree_sha, &parent_sha)
            .await?;
        self.client
            .force_update_branch(repo, branch_name, &commit_sha)
            .await?;

        info!(commit = %commit_sha, branch_created, "committed file proposals");
        Ok(CommitOutcome {
            commit_sha,
            branch_created,
        })
    }

    /// Upload one blob per proposal, bounded and fail-fast. SHAs come back
    /// in proposal order.
    async fn upload_blobs(&self, repo: &RepoId, files: &[FileProposal]) -> Result<Vec<String>> {
        let semaphore = Arc::new(Semaphore::new(BLOB_UPLOAD_CONCURRENCY));
        let mut handles = Vec::with_capacity(files.len());

        for file in files {
            let client = self.client.clone();
            let repo = repo.clone();
            let content = file.content.clone();
            let path = file.path.clone();
            let sem = semaphore.clone();

            handles.push(tokio::spawn(async move {
                let _permit = sem.acquire().await.expect("semaphore closed");
                debug!(path = %path, "uploading blob");
                client.create_blob(&repo, &content).await
            }));
        }

        let mut shas = Vec::with_capacity(handles.len());
        let mut first_error: Option<DocDraftError> = None;
        for handle in handles {
            if first_error.is_some() {
                handle.abort();
                continue;
            }
            match handle.await {
                Ok(Ok(sha)) => shas.push(sha),
                Ok(Err(e)) => first_error = Some(e),
                Err(e) => {
                    first_error = Some(DocDraftError::upstream(format!(
                        "blob upload task failed: {e}"
                    )));
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(shas),
        }
    }
}
