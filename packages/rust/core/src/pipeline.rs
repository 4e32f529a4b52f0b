//! End-to-end release pipeline: context → draft → commit → PR → notify.

use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use docdraft_github::{
    CommitSynchronizer, GithubClient, PullRequestManager, ReleaseContextResolver,
};
use docdraft_notify::Notifier;
use docdraft_shared::{AppConfig, DocDraftError, PullRequest, RepoId, Result, RunId};

use crate::draft::{Drafter, sanitize_tag};
use crate::retry::{RetryPolicy, with_retries};

/// Configuration for one release-to-PR run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Repository the release belongs to.
    pub repo: RepoId,
    /// Tag of the newly published release.
    pub tag: String,
    /// Branch pull requests target.
    pub base_branch: String,
    /// Prefix for generated documentation branches.
    pub branch_prefix: String,
    /// Notification channel.
    pub channel: String,
    /// Whether to post a notification on success.
    pub notify: bool,
    /// Stage retry policy.
    pub retry: RetryPolicy,
}

impl RunConfig {
    /// Build a run configuration from the app config's defaults.
    pub fn from_app_config(config: &AppConfig, repo: RepoId, tag: impl Into<String>) -> Self {
        Self {
            repo,
            tag: tag.into(),
            base_branch: config.defaults.base_branch.clone(),
            branch_prefix: config.defaults.branch_prefix.clone(),
            channel: config.defaults.channel.clone(),
            notify: true,
            retry: RetryPolicy::from(&config.retry),
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Identifier of this run.
    pub run_id: RunId,
    /// Repository the run targeted.
    pub repo: RepoId,
    /// Release tag the run was triggered by.
    pub tag: String,
    /// Predecessor tag the diff was computed against, if any.
    pub previous_tag: Option<String>,
    /// Number of file proposals committed.
    pub files_committed: usize,
    /// SHA of the commit left at the branch head.
    pub commit_sha: String,
    /// The pull request carrying the proposal.
    pub pull_request: PullRequest,
    /// Whether a notification was delivered.
    pub notified: bool,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait PipelineProgress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called for each file proposal the drafting stage produced.
    fn file_proposed(&self, path: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl PipelineProgress for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_proposed(&self, _path: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &RunReport) {}
}

/// Deterministic branch name for a release tag, so reruns target the same
/// branch.
pub fn branch_for_tag(prefix: &str, tag: &str) -> String {
    format!("{prefix}{}", sanitize_tag(tag))
}

/// Run the full release pipeline.
///
/// 1. Resolve the release context (previous release + diff)
/// 2. Draft the documentation proposal
/// 3. Commit the proposal to the docs branch
/// 4. Open or reuse the pull request
/// 5. Notify
///
/// Stages run strictly in order; each external stage is wrapped in the
/// configured retry policy. A notification failure is logged but does not
/// fail an otherwise complete run.
#[instrument(skip_all, fields(repo = %config.repo, tag = %config.tag))]
pub async fn run_release(
    config: &RunConfig,
    github: &GithubClient,
    drafter: &dyn Drafter,
    notifier: &dyn Notifier,
    progress: &dyn PipelineProgress,
) -> Result<RunReport> {
    let start = Instant::now();
    let run_id = RunId::new();

    info!(%run_id, repo = %config.repo, tag = %config.tag, "starting release run");

    let resolver = ReleaseContextResolver::new(github.clone());
    let synchronizer = CommitSynchronizer::new(github.clone());
    let pulls = PullRequestManager::new(github.clone());

    // --- Phase 1: Resolve release context ---
    progress.phase("Resolving release context");
    let context = with_retries(&config.retry, "resolve context", || {
        resolver.fetch_context(&config.repo, &config.tag)
    })
    .await?;

    // --- Phase 2: Draft documentation ---
    progress.phase("Drafting documentation");
    let draft = drafter.draft(&context).await?;
    if draft.files.is_empty() {
        return Err(DocDraftError::validation(
            "drafting produced no file proposals",
        ));
    }
    let total = draft.files.len();
    for (i, file) in draft.files.iter().enumerate() {
        progress.file_proposed(&file.path, i + 1, total);
    }

    // --- Phase 3: Commit to the docs branch ---
    progress.phase("Committing proposals");
    let branch = branch_for_tag(&config.branch_prefix, &config.tag);
    let message = format!("docs: update for {}", config.tag);
    let outcome = with_retries(&config.retry, "commit files", || {
        synchronizer.commit_files(
            &config.repo,
            &config.base_branch,
            &branch,
            &message,
            &draft.files,
        )
    })
    .await?;

    // --- Phase 4: Open or reuse the pull request ---
    progress.phase("Opening pull request");
    let pull_request = with_retries(&config.retry, "open pull request", || {
        pulls.open_or_reuse(
            &config.repo,
            &config.base_branch,
            &branch,
            &draft.title,
            &draft.body,
        )
    })
    .await?;

    // --- Phase 5: Notify ---
    let notified = if config.notify {
        progress.phase("Posting notification");
        let text = format!(
            "{} {}: docs PR ready {}",
            config.repo, config.tag, pull_request.url
        );
        let delivery = with_retries(&config.retry, "post notification", || {
            notifier.post(&config.channel, &text)
        })
        .await;
        match delivery {
            Ok(()) => true,
            Err(e) => {
                warn!(channel = %config.channel, error = %e, "notification failed");
                false
            }
        }
    } else {
        false
    };

    let report = RunReport {
        run_id,
        repo: config.repo.clone(),
        tag: config.tag.clone(),
        previous_tag: context.previous_tag.clone(),
        files_committed: total,
        commit_sha: outcome.commit_sha,
        pull_request,
        notified,
        elapsed: start.elapsed(),
    };

    progress.done(&report);

    info!(
        run_id = %report.run_id,
        pull = report.pull_request.number,
        commit = %report.commit_sha,
        files = report.files_committed,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "release run complete"
    );

    Ok(report)
}
