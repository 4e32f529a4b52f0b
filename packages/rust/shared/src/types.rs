//! Core domain types for the release-to-docs pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RepoId
// ---------------------------------------------------------------------------

/// A repository identified by `owner/name`, as it appears in webhook
/// payloads and API paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepoId {
    /// Construct from owner and name parts.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl std::str::FromStr for RepoId {
    type Err = crate::error::DocDraftError;

    /// Parse an `owner/repo` full name. Exactly one slash, both sides
    /// non-empty.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(crate::error::DocDraftError::validation(format!(
                "invalid repository full name '{s}': expected 'owner/repo'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Release
// ---------------------------------------------------------------------------

/// A release as reported by the Git host.
///
/// A release with no `published_at` is unpublished (draft) and is excluded
/// from predecessor ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    /// The tag this release points at.
    pub tag_name: String,
    /// Release notes body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Publication timestamp; `None` for drafts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// DiffFile
// ---------------------------------------------------------------------------

/// Change status of a file between two refs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Removed,
    Modified,
    Renamed,
    Copied,
    Changed,
    Unchanged,
    /// Forward-compatible catch-all for statuses we do not know about.
    #[serde(other)]
    Other,
}

impl FileStatus {
    /// Lowercase label as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
            Self::Renamed => "renamed",
            Self::Copied => "copied",
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One changed file in a two-ref comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffFile {
    /// File path within the repository (wire name: `filename`).
    #[serde(rename = "filename")]
    pub path: String,
    /// Change status.
    pub status: FileStatus,
    /// Lines added.
    #[serde(default)]
    pub additions: u64,
    /// Lines deleted.
    #[serde(default)]
    pub deletions: u64,
    /// Total line changes.
    #[serde(default)]
    pub changes: u64,
    /// Unified-diff patch text. Absent or truncated for binary and very
    /// large files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

// ---------------------------------------------------------------------------
// ReleaseContext
// ---------------------------------------------------------------------------

/// What changed between a newly published release and its predecessor.
///
/// Invariant: `previous_tag` is `None` iff `diff_files` is empty —
/// `diff_files` is only populated when a previous published release exists.
/// Computed fresh per pipeline run and discarded after use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseContext {
    /// Tag of the release that triggered this run.
    pub current_tag: String,
    /// Tag of the closest earlier published release, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_tag: Option<String>,
    /// Release notes body (empty string when the release has none).
    pub release_notes: String,
    /// File-level changes `previous_tag...current_tag`. May be truncated
    /// for very large releases.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diff_files: Vec<DiffFile>,
}

// ---------------------------------------------------------------------------
// FileProposal
// ---------------------------------------------------------------------------

/// A proposed file change: full file body, never a partial patch.
///
/// Produced by the drafting stage, consumed by the commit synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileProposal {
    /// Path the file will occupy in the repository.
    pub path: String,
    /// Complete file content.
    pub content: String,
}

// ---------------------------------------------------------------------------
// PullRequest
// ---------------------------------------------------------------------------

/// A pull request on the Git host.
///
/// Identity for idempotent reuse is keyed by `(repo, head_branch)`; title
/// and body are never compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number within the repository.
    pub number: u64,
    /// Web URL of the PR.
    pub url: String,
    /// Source branch.
    pub head_branch: String,
    /// Target branch.
    pub base_branch: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_is_unique_and_displays() {
        let a = RunId::new();
        let b = RunId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 36);
    }

    #[test]
    fn repo_id_parse_and_display() {
        let repo: RepoId = "octo-org/widget".parse().expect("parse RepoId");
        assert_eq!(repo.owner, "octo-org");
        assert_eq!(repo.name, "widget");
        assert_eq!(repo.to_string(), "octo-org/widget");
    }

    #[test]
    fn repo_id_rejects_malformed_names() {
        assert!("no-slash".parse::<RepoId>().is_err());
        assert!("/leading".parse::<RepoId>().is_err());
        assert!("trailing/".parse::<RepoId>().is_err());
        assert!("a/b/c".parse::<RepoId>().is_err());
    }

    #[test]
    fn release_deserializes_wire_json() {
        let json = r#"{
            "tag_name": "v1.2.0",
            "body": "Bug fixes",
            "published_at": "2024-02-01T12:00:00Z",
            "draft": false
        }"#;
        let release: Release = serde_json::from_str(json).expect("deserialize");
        assert_eq!(release.tag_name, "v1.2.0");
        assert_eq!(release.body.as_deref(), Some("Bug fixes"));
        assert!(release.published_at.is_some());
    }

    #[test]
    fn unpublished_release_has_no_timestamp() {
        let json = r#"{"tag_name": "v2.0.0-rc.1", "body": null, "published_at": null}"#;
        let release: Release = serde_json::from_str(json).expect("deserialize");
        assert!(release.published_at.is_none());
        assert!(release.body.is_none());
    }

    #[test]
    fn diff_file_maps_filename_to_path() {
        let json = r#"{
            "filename": "src/lib.rs",
            "status": "modified",
            "additions": 10,
            "deletions": 2,
            "changes": 12,
            "patch": "@@ -1 +1 @@"
        }"#;
        let file: DiffFile = serde_json::from_str(json).expect("deserialize");
        assert_eq!(file.path, "src/lib.rs");
        assert_eq!(file.status, FileStatus::Modified);
        assert_eq!(file.changes, 12);
    }

    #[test]
    fn unknown_file_status_falls_back_to_other() {
        let json = r#"{"filename": "a.bin", "status": "mysterious"}"#;
        let file: DiffFile = serde_json::from_str(json).expect("deserialize");
        assert_eq!(file.status, FileStatus::Other);
        assert!(file.patch.is_none());
    }

    #[test]
    fn context_invariant_no_previous_means_no_diff() {
        let ctx = ReleaseContext {
            current_tag: "v1.0.0".into(),
            previous_tag: None,
            release_notes: String::new(),
            diff_files: vec![],
        };
        assert_eq!(ctx.previous_tag.is_none(), ctx.diff_files.is_empty());
    }

    #[test]
    fn releases_fixture_validates() {
        let fixture = std::fs::read_to_string("../../../fixtures/github/releases.fixture.json")
            .expect("read fixture");
        let releases: Vec<Release> =
            serde_json::from_str(&fixture).expect("deserialize fixture releases");
        assert_eq!(releases.len(), 4);
        // The fixture carries one unpublished draft.
        assert_eq!(
            releases.iter().filter(|r| r.published_at.is_none()).count(),
            1
        );
    }
}
