//! Pull-request idempotency.
//!
//! One open pull request per head branch: look up first, create only when
//! absent. Identity is keyed solely on the head branch name.

use tracing::{debug, info, instrument};

use docdraft_shared::{PullRequest, RepoId, Result};

use crate::client::GithubClient;

/// Opens a pull request for a head branch at most once.
#[derive(Debug, Clone)]
pub struct PullRequestManager {
    client: GithubClient,
}

impl PullRequestManager {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }

    /// Return the open pull request whose head is `head_branch`, creating
    /// one into `base_branch` when none exists.
    ///
    /// An existing pull request comes back unchanged; its title and body are
    /// never rewritten, even when the arguments differ.
    #[instrument(skip_all, fields(repo = %repo, head = head_branch))]
    pub async fn open_or_reuse(
        &self,
        repo: &RepoId,
        base_branch: &str,
        head_branch: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        let open = self
            .client
            .list_open_pulls_by_head(repo, head_branch)
            .await?;
        if let Some(existing) = open.into_iter().next() {
            debug!(number = existing.number, "reusing open pull request");
            return Ok(existing);
        }

        let created = self
            .client
            .create_pull(repo, base_branch, head_branch, title, body)
            .await?;
        info!(number = created.number, url = %created.url, "opened pull request");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repo() -> RepoId {
        RepoId::new("octo-org", "widget")
    }

    fn pull_json(number: u64) -> serde_json::Value {
        serde_json::json!({
            "number": number,
            "html_url": format!("https://example.test/octo-org/widget/pull/{number}"),
            "head": { "ref": "docs/update-v2" },
            "base": { "ref": "main" }
        })
    }

    async fn manager_for(server: &MockServer) -> PullRequestManager {
        let client =
            GithubClient::with_api_base(&server.uri(), "test-token").expect("build client");
        PullRequestManager::new(client)
    }

    #[tokio::test]
    async fn creates_pull_when_none_is_open() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo-org/widget/pulls"))
            .and(query_param("state", "open"))
            .and(query_param("head", "octo-org:docs/update-v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/repos/octo-org/widget/pulls"))
            .and(body_partial_json(serde_json::json!({
                "title": "Docs for v2",
                "body": "Automated update",
                "head": "docs/update-v2",
                "base": "main"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(pull_json(7)))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager_for(&server).await;
        let pull = manager
            .open_or_reuse(
                &repo(),
                "main",
                "docs/update-v2",
                "Docs for v2",
                "Automated update",
            )
            .await
            .unwrap();

        assert_eq!(pull.number, 7);
        assert_eq!(pull.head_branch, "docs/update-v2");
        assert_eq!(pull.base_branch, "main");
        assert!(pull.url.ends_with("/pull/7"));
    }

    #[tokio::test]
    async fn repeat_call_reuses_the_same_pull() {
        let server = MockServer::start().await;

        // First lookup finds nothing; every later lookup sees the open PR.
        Mock::given(method("GET"))
            .and(path("/repos/octo-org/widget/pulls"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octo-org/widget/pulls"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([pull_json(7)])))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/repos/octo-org/widget/pulls"))
            .respond_with(ResponseTemplate::new(201).set_body_json(pull_json(7)))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager_for(&server).await;
        let first = manager
            .open_or_reuse(&repo(), "main", "docs/update-v2", "Docs for v2", "body")
            .await
            .unwrap();
        let second = manager
            .open_or_reuse(
                &repo(),
                "main",
                "docs/update-v2",
                "a different title",
                "a different body",
            )
            .await
            .unwrap();

        assert_eq!(first.number, 7);
        assert_eq!(second.number, 7);
    }
}
