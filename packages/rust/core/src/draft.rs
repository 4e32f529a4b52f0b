//! Drafting capability.
//!
//! Turning a release context into documentation text is an external
//! collaborator's job; the pipeline only depends on the [`Drafter`] trait.
//! [`TemplateDrafter`] is the built-in deterministic implementation that
//! keeps the pipeline runnable end-to-end without a content service.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use docdraft_shared::{FileProposal, ReleaseContext, Result};

/// Cap on diff entries listed in a generated release page.
const MAX_LISTED_FILES: usize = 50;

/// Output of the drafting stage.
#[derive(Debug, Clone)]
pub struct Draft {
    /// Proposed files, full bodies.
    pub files: Vec<FileProposal>,
    /// Pull request title.
    pub title: String,
    /// Pull request body.
    pub body: String,
}

/// Produces a documentation change proposal from a release context.
#[async_trait]
pub trait Drafter: Send + Sync {
    async fn draft(&self, context: &ReleaseContext) -> Result<Draft>;
}

// ---------------------------------------------------------------------------
// Built-in template drafter
// ---------------------------------------------------------------------------

/// Deterministic drafter producing one `docs/releases/<tag>.md` page from
/// the release notes and diff summary. Plain templating, no generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateDrafter;

#[async_trait]
impl Drafter for TemplateDrafter {
    async fn draft(&self, context: &ReleaseContext) -> Result<Draft> {
        let tag = &context.current_tag;
        let page = FileProposal {
            path: format!("docs/releases/{}.md", sanitize_tag(tag)),
            content: render_release_page(context),
        };

        let body = match context.previous_tag.as_deref() {
            Some(previous) => format!(
                "Automated documentation update for release `{tag}`.\n\n\
                 Covers {} changed files since `{previous}`.\n",
                context.diff_files.len()
            ),
            None => format!(
                "Automated documentation update for release `{tag}`.\n\n\
                 First published release; no predecessor to diff against.\n"
            ),
        };

        Ok(Draft {
            files: vec![page],
            title: format!("docs: update for {tag}"),
            body,
        })
    }
}

fn render_release_page(context: &ReleaseContext) -> String {
    let mut page = format!("# Release {}\n\n", context.current_tag);

    if context.release_notes.trim().is_empty() {
        page.push_str("No release notes were provided.\n");
    } else {
        page.push_str(context.release_notes.trim());
        page.push('\n');
    }

    match context.previous_tag.as_deref() {
        Some(previous) => {
            page.push_str(&format!("\n## Changes since {previous}\n\n"));
            if context.diff_files.is_empty() {
                page.push_str("No file changes were reported.\n");
            }
            for file in context.diff_files.iter().take(MAX_LISTED_FILES) {
                page.push_str(&format!(
                    "- `{}` ({}, +{}/-{})\n",
                    file.path, file.status, file.additions, file.deletions
                ));
            }
            let unlisted = context.diff_files.len().saturating_sub(MAX_LISTED_FILES);
            if unlisted > 0 {
                page.push_str(&format!("\n{unlisted} additional changed files not listed.\n"));
            }
        }
        None => {
            page.push_str("\nThis is the first published release.\n");
        }
    }

    page
}

/// Collapse characters that are not valid in a ref segment or file name.
///
/// Runs of invalid characters become a single `-`; leading and trailing
/// dashes are trimmed. A tag that sanitizes to nothing falls back to
/// `release` so branch and file names never end up empty.
pub fn sanitize_tag(tag: &str) -> String {
    static INVALID_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid regex"));

    let cleaned = INVALID_RE.replace_all(tag, "-");
    let trimmed = cleaned.trim_matches('-');
    if trimmed.is_empty() {
        "release".to_string()
    } else {
        trimmed.to_string()
    }
}
