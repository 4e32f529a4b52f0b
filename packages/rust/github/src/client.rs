//! Minimal Git-host REST client.
//!
//! Wraps `reqwest` with bearer auth, the host's JSON media type, and a
//! bounded per-request timeout. Only the endpoints the pipeline needs are
//! exposed; responses are decoded into the shared domain types or small
//! private wire structs.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use url::Url;

use docdraft_shared::{DiffFile, DocDraftError, PullRequest, Release, RepoId, Result};

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("DocDraft/", env!("CARGO_PKG_VERSION"));

/// Public Git-host API base.
const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Bounded timeout applied to every request.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 3;

/// Page size for release listing; the client paginates past this.
pub(crate) const RELEASE_PAGE_SIZE: usize = 100;

/// File cap for two-ref comparisons. One page only — very large releases
/// yield a truncated but non-failing diff.
pub(crate) const COMPARE_PAGE_SIZE: usize = 250;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated client for the Git host's REST API.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    api_base: Url,
    token: String,
}

impl GithubClient {
    /// Create a client against the public API.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_api_base(DEFAULT_API_BASE, token)
    }

    /// Create a client against a specific API base (GitHub Enterprise,
    /// or a mock server in tests).
    pub fn with_api_base(api_base: &str, token: impl Into<String>) -> Result<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|e| DocDraftError::config(format!("invalid API base '{api_base}': {e}")))?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| DocDraftError::upstream(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base,
            token: token.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base.as_str().trim_end_matches('/'))
    }

    // -- releases & comparisons ---------------------------------------------

    /// List all releases for a repository, paginating until a short page.
    pub async fn list_releases(&self, repo: &RepoId) -> Result<Vec<Release>> {
        let path = format!("repos/{repo}/releases");
        let mut releases: Vec<Release> = Vec::new();
        let mut page = 1usize;

        loop {
            let batch: Vec<Release> = self
                .get_json(
                    &path,
                    &[
                        ("per_page", RELEASE_PAGE_SIZE.to_string()),
                        ("page", page.to_string()),
                    ],
                )
                .await?;

            let fetched = batch.len();
            releases.extend(batch);

            if fetched < RELEASE_PAGE_SIZE {
                break;
            }
            page += 1;
        }

        debug!(%repo, count = releases.len(), "listed releases");
        Ok(releases)
    }

    /// Fetch the changed files between two refs (`base...head`), capped at
    /// [`COMPARE_PAGE_SIZE`] entries.
    pub async fn compare_files(&self, repo: &RepoId, base: &str, head: &str) -> Result<Vec<DiffFile>> {
        let path = format!("repos/{repo}/compare/{base}...{head}");
        let response: CompareWire = self
            .get_json(&path, &[("per_page", COMPARE_PAGE_SIZE.to_string())])
            .await?;

        debug!(%repo, base, head, files = response.files.len(), "compared refs");
        Ok(response.files)
    }

    // -- refs, blobs, trees, commits ----------------------------------------

    /// Resolve the commit SHA a branch currently points at.
    ///
    /// A missing branch maps to [`DocDraftError::NotFound`]; every other
    /// failure is upstream.
    pub async fn branch_head(&self, repo: &RepoId, branch: &str) -> Result<String> {
        let path = format!("repos/{repo}/git/ref/heads/{branch}");
        let response = self.send_get(&path, &[]).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DocDraftError::not_found(format!(
                "branch '{branch}' not found in {repo}"
            )));
        }

        let git_ref: RefWire = decode("GET", &path, response).await?;
        Ok(git_ref.object.sha)
    }

    /// Create a branch pointing at `sha`. Returns `true` when the branch was
    /// created, `false` when it already existed (the host's conflict
    /// response is swallowed — creation is "create if absent").
    pub async fn create_branch(&self, repo: &RepoId, branch: &str, sha: &str) -> Result<bool> {
        let path = format!("repos/{repo}/git/refs");
        let body = json!({ "ref": format!("refs/heads/{branch}"), "sha": sha });
        let response = self.send_post(&path, &body).await?;

        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            debug!(%repo, branch, "branch already exists, reusing");
            return Ok(false);
        }

        let _created: RefWire = decode("POST", &path, response).await?;
        Ok(true)
    }

    /// Fetch the tree SHA of a commit.
    pub async fn commit_tree_sha(&self, repo: &RepoId, commit_sha: &str) -> Result<String> {
        let path = format!("repos/{repo}/git/commits/{commit_sha}");
        let commit: CommitWire = self.get_json(&path, &[]).await?;
        Ok(commit.tree.sha)
    }

    /// Upload file content as a blob, returning its SHA.
    pub async fn create_blob(&self, repo: &RepoId, content: &str) -> Result<String> {
        let path = format!("repos/{repo}/git/blobs");
        let body = json!({ "content": content, "encoding": "utf-8" });
        let created: ShaWire = self.post_json(&path, &body).await?;
        Ok(created.sha)
    }

    /// Create a tree layering `entries` (path → blob SHA, regular file mode)
    /// onto `base_tree`. Paths not listed are inherited unchanged; no entry
    /// ever expresses a deletion.
    pub async fn create_tree(
        &self,
        repo: &RepoId,
        base_tree: &str,
        entries: &[(String, String)],
    ) -> Result<String> {
        let path = format!("repos/{repo}/git/trees");
        let tree: Vec<serde_json::Value> = entries
            .iter()
            .map(|(entry_path, blob_sha)| {
                json!({
                    "path": entry_path,
                    "mode": "100644",
                    "type": "blob",
                    "sha": blob_sha,
                })
            })
            .collect();
        let body = json!({ "base_tree": base_tree, "tree": tree });
        let created: ShaWire = self.post_json(&path, &body).await?;
        Ok(created.sha)
    }

    /// Create a commit with a single parent.
    pub async fn create_commit(
        &self,
        repo: &RepoId,
        message: &str,
        tree_sha: &str,
        parent_sha: &str,
    ) -> Result<String> {
        let path = format!("repos/{repo}/git/commits");
        let body = json!({ "message": message, "tree": tree_sha, "parents": [parent_sha] });
        let created: ShaWire = self.post_json(&path, &body).await?;
        Ok(created.sha)
    }

    /// Point a branch at `sha` without requiring a fast-forward.
    pub async fn force_update_branch(&self, repo: &RepoId, branch: &str, sha: &str) -> Result<()> {
        let path = format!("repos/{repo}/git/refs/heads/{branch}");
        let body = json!({ "sha": sha, "force": true });
        let response = self
            .http
            .patch(self.endpoint(&path))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| DocDraftError::upstream(format!("PATCH {path}: {e}")))?;
        let _updated: RefWire = decode("PATCH", &path, response).await?;
        Ok(())
    }

    // -- pull requests -------------------------------------------------------

    /// List open pull requests whose head is `head_branch`.
    pub async fn list_open_pulls_by_head(
        &self,
        repo: &RepoId,
        head_branch: &str,
    ) -> Result<Vec<PullRequest>> {
        let path = format!("repos/{repo}/pulls");
        let pulls: Vec<PullWire> = self
            .get_json(
                &path,
                &[
                    ("state", "open".to_string()),
                    ("head", format!("{}:{head_branch}", repo.owner)),
                ],
            )
            .await?;
        Ok(pulls.into_iter().map(PullWire::into_domain).collect())
    }

    /// Open a pull request from `head_branch` into `base_branch`.
    pub async fn create_pull(
        &self,
        repo: &RepoId,
        base_branch: &str,
        head_branch: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        let path = format!("repos/{repo}/pulls");
        let payload = json!({
            "title": title,
            "body": body,
            "head": head_branch,
            "base": base_branch,
        });
        let pull: PullWire = self.post_json(&path, &payload).await?;
        Ok(pull.into_domain())
    }

    // -- request plumbing ----------------------------------------------------

    async fn send_get(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
        self.http
            .get(self.endpoint(path))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| DocDraftError::upstream(format!("GET {path}: {e}")))
    }

    async fn send_post(&self, path: &str, body: &serde_json::Value) -> Result<Response> {
        self.http
            .post(self.endpoint(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| DocDraftError::upstream(format!("POST {path}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self.send_get(path, query).await?;
        decode("GET", path, response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let response = self.send_post(path, body).await?;
        decode("POST", path, response).await
    }
}

/// Decode a response or map it to an upstream error carrying the host's
/// message when one is present.
async fn decode<T: DeserializeOwned>(
    method: &'static str,
    path: &str,
    response: Response,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(upstream_error(method, path, status, &body));
    }

    response
        .json()
        .await
        .map_err(|e| DocDraftError::upstream(format!("{method} {path}: failed to decode response: {e}")))
}

fn upstream_error(method: &str, path: &str, status: StatusCode, body: &str) -> DocDraftError {
    match serde_json::from_str::<ApiMessageWire>(body) {
        Ok(api) => {
            DocDraftError::upstream(format!("{method} {path}: HTTP {status}: {}", api.message))
        }
        Err(_) => DocDraftError::upstream(format!("{method} {path}: HTTP {status}")),
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Error envelope returned by the Git host.
#[derive(Debug, Deserialize)]
struct ApiMessageWire {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CompareWire {
    #[serde(default)]
    files: Vec<DiffFile>,
}

#[derive(Debug, Deserialize)]
struct RefWire {
    object: RefObjectWire,
}

#[derive(Debug, Deserialize)]
struct RefObjectWire {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitWire {
    tree: ShaWire,
}

#[derive(Debug, Deserialize)]
struct ShaWire {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullWire {
    number: u64,
    html_url: String,
    head: PullRefWire,
    base: PullRefWire,
}

#[derive(Debug, Deserialize)]
struct PullRefWire {
    #[serde(rename = "ref")]
    name: String,
}

impl PullWire {
    fn into_domain(self) -> PullRequest {
        PullRequest {
            number: self.number,
            url: self.html_url,
            head_branch: self.head.name,
            base_branch: self.base.name,
        }
    }
}
