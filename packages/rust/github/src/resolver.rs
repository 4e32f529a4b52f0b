//! Release context resolution.
//!
//! Answers "what changed in this release": finds the published release
//! immediately preceding the target tag and fetches the file-level diff
//! between the two.

use tracing::{debug, instrument};

use docdraft_shared::{DocDraftError, Release, ReleaseContext, RepoId, Result};

use crate::client::GithubClient;

/// Resolves a [`ReleaseContext`] for a freshly published release tag.
#[derive(Debug, Clone)]
pub struct ReleaseContextResolver {
    client: GithubClient,
}

impl ReleaseContextResolver {
    pub fn new(client: GithubClient) -> Self {
        Self { client }
    }

    /// Build the context for `tag_name`.
    ///
    /// The tag must exist as a release. A target with no published
    /// predecessor (first release, or itself unpublished) yields
    /// `previous_tag = None` and an empty diff.
    #[instrument(skip_all, fields(repo = %repo, tag = tag_name))]
    pub async fn fetch_context(&self, repo: &RepoId, tag_name: &str) -> Result<ReleaseContext> {
        let releases = self.client.list_releases(repo).await?;

        let target = releases
            .iter()
            .find(|release| release.tag_name == tag_name)
            .ok_or_else(|| {
                DocDraftError::not_found(format!("release '{tag_name}' not found in {repo}"))
            })?;
        let release_notes = target.body.clone().unwrap_or_default();

        let previous_tag = previous_published_tag(&releases, tag_name);

        let diff_files = match previous_tag.as_deref() {
            Some(previous) => self.client.compare_files(repo, previous, tag_name).await?,
            None => {
                debug!(tag = tag_name, "no published predecessor, empty diff");
                Vec::new()
            }
        };

        Ok(ReleaseContext {
            current_tag: tag_name.to_string(),
            previous_tag,
            release_notes,
            diff_files,
        })
    }
}

/// The tag of the published release immediately preceding `current_tag`.
///
/// Unpublished releases are excluded from the ordering. The sort is stable
/// and ascending by publish time, so releases sharing a timestamp keep
/// their listing order. Returns `None` when the target is first in the
/// ordering or is itself unpublished.
pub fn previous_published_tag(releases: &[Release], current_tag: &str) -> Option<String> {
    let mut published: Vec<&Release> = releases
        .iter()
        .filter(|release| release.published_at.is_some())
        .collect();
    published.sort_by_key(|release| release.published_at);

    let position = published
        .iter()
        .position(|release| release.tag_name == current_tag)?;
    if position == 0 {
        return None;
    }
    Some(published[position - 1].tag_name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn release(tag: &str, published: Option<&str>) -> Release {
        Release {
            tag_name: tag.to_string(),
            body: None,
            published_at: published.map(|ts| {
                ts.parse().expect("valid test timestamp")
            }),
        }
    }

    #[test]
    fn previous_is_the_release_just_before_the_target() {
        let releases = vec![
            release("v3", Some("2024-03-01T00:00:00Z")),
            release("v2", Some("2024-02-01T00:00:00Z")),
            release("v1", Some("2024-01-01T00:00:00Z")),
        ];
        assert_eq!(previous_published_tag(&releases, "v3"), Some("v2".into()));
        assert_eq!(previous_published_tag(&releases, "v2"), Some("v1".into()));
        assert_eq!(previous_published_tag(&releases, "v1"), None);
    }

    #[test]
    fn unpublished_releases_are_excluded_from_ordering() {
        let releases = vec![
            release("v2", Some("2024-02-01T00:00:00Z")),
            release("v2-rc1", None),
            release("v1", Some("2024-01-01T00:00:00Z")),
        ];
        assert_eq!(previous_published_tag(&releases, "v2"), Some("v1".into()));
    }

    #[test]
    fn unpublished_target_has_no_previous() {
        let releases = vec![
            release("v2-draft", None),
            release("v1", Some("2024-01-01T00:00:00Z")),
        ];
        assert_eq!(previous_published_tag(&releases, "v2-draft"), None);
    }

    #[test]
    fn identical_timestamps_keep_listing_order() {
        let shared = "2024-01-01T00:00:00Z";
        let releases = vec![
            release("first-listed", Some(shared)),
            release("second-listed", Some(shared)),
            release("target", Some("2024-02-01T00:00:00Z")),
        ];
        // Stable sort: "first-listed" stays ahead of "second-listed", so the
        // target's predecessor is the later of the two in listing order.
        assert_eq!(
            previous_published_tag(&releases, "target"),
            Some("second-listed".into())
        );
        assert_eq!(
            previous_published_tag(&releases, "second-listed"),
            Some("first-listed".into())
        );
    }

    #[test]
    fn sort_is_ascending_by_publish_time_not_listing_order() {
        // Listing order deliberately disagrees with publish order.
        let releases = vec![
            release("v1", Some("2024-01-01T00:00:00Z")),
            release("v3", Some("2024-03-01T00:00:00Z")),
            release("v2", Some("2024-02-01T00:00:00Z")),
        ];
        assert_eq!(previous_published_tag(&releases, "v3"), Some("v2".into()));
    }

    #[tokio::test]
    async fn resolves_context_with_previous_release() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo-org/widget/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "tag_name": "v2", "body": "second release",
                  "published_at": "2024-02-01T00:00:00Z" },
                { "tag_name": "v1", "body": "first release",
                  "published_at": "2024-01-01T00:00:00Z" }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/octo-org/widget/compare/v1...v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": [
                    { "filename": "src/lib.rs", "status": "modified",
                      "additions": 10, "deletions": 2, "changes": 12,
                      "patch": "@@ -1 +1 @@" },
                    { "filename": "docs/guide.md", "status": "added",
                      "additions": 40, "deletions": 0, "changes": 40 }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            GithubClient::with_api_base(&server.uri(), "test-token").expect("build client");
        let resolver = ReleaseContextResolver::new(client);
        let repo = RepoId::new("octo-org", "widget");

        let context = resolver.fetch_context(&repo, "v2").await.unwrap();
        assert_eq!(context.current_tag, "v2");
        assert_eq!(context.previous_tag.as_deref(), Some("v1"));
        assert_eq!(context.release_notes, "second release");
        assert_eq!(context.diff_files.len(), 2);
        assert_eq!(context.diff_files[1].path, "docs/guide.md");
    }

    #[tokio::test]
    async fn first_release_yields_empty_diff_without_compare_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo-org/widget/releases"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "tag_name": "v1", "body": "initial",
                  "published_at": "2024-01-01T00:00:00Z" },
                { "tag_name": "v1-rc1", "body": null, "published_at": null }
            ])))
            .mount(&server)
            .await;

        let client =
            GithubClient::with_api_base(&server.uri(), "test-token").expect("build client");
        let resolver = ReleaseContextResolver::new(client);
        let repo = RepoId::new("octo-org", "widget");

        let context = resolver.fetch_context(&repo, "v1").await.unwrap();
        assert_eq!(context.previous_tag, None);
        assert!(context.diff_files.is_empty());
        assert_eq!(context.release_notes, "initial");

        // No compare mock is mounted; an unexpected request would 404 and
        // surface as an upstream error above.
    }

    #[tokio::test]
    async fn unknown_tag_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo-org/widget/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let client =
            GithubClient::with_api_base(&server.uri(), "test-token").expect("build client");
        let resolver = ReleaseContextResolver::new(client);
        let repo = RepoId::new("octo-org", "widget");

        let err = resolver.fetch_context(&repo, "v9").await.unwrap_err();
        assert!(matches!(err, DocDraftError::NotFound(_)));
        assert!(err.to_string().contains("v9"));
    }
}
