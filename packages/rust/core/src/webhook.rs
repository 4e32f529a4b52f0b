//! Webhook classification boundary.
//!
//! The HTTP listener itself lives outside this crate; what is owned here is
//! the decision of whether an inbound event starts a pipeline run. Only
//! `release` events whose payload action is `published` trigger; everything
//! else is ignored with a reason, never an error.

use serde::Deserialize;
use tracing::debug;

use docdraft_shared::{DocDraftError, RepoId, Result};

/// Event type that can trigger a run.
pub const RELEASE_EVENT: &str = "release";

/// Payload action that can trigger a run.
pub const PUBLISHED_ACTION: &str = "published";

/// The inputs a triggering webhook carries into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTrigger {
    pub repo: RepoId,
    pub tag: String,
    /// Release body text, empty when the payload carried none.
    pub release_notes: String,
}

/// Outcome of classifying an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookDisposition {
    /// The event starts a pipeline run.
    Triggered(ReleaseTrigger),
    /// The event is dropped; the listener should answer success regardless.
    Ignored { reason: String },
}

// Every field is optional on the wire: webhook payloads are external input
// and no nested path is trusted without a presence check.

#[derive(Debug, Deserialize)]
struct ReleaseEventWire {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    release: Option<ReleaseWire>,
    #[serde(default)]
    repository: Option<RepositoryWire>,
}

#[derive(Debug, Deserialize)]
struct ReleaseWire {
    #[serde(default)]
    tag_name: Option<String>,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepositoryWire {
    #[serde(default)]
    full_name: Option<String>,
}

/// Classify an inbound event by its type header and JSON payload.
pub fn classify(event_type: &str, payload: &serde_json::Value) -> WebhookDisposition {
    if event_type != RELEASE_EVENT {
        return WebhookDisposition::Ignored {
            reason: format!("event type '{event_type}' is not a release"),
        };
    }

    match parse_release_event(payload) {
        Ok(trigger) => {
            debug!(repo = %trigger.repo, tag = %trigger.tag, "webhook triggers run");
            WebhookDisposition::Triggered(trigger)
        }
        Err(e) => WebhookDisposition::Ignored {
            reason: e.to_string(),
        },
    }
}

/// Extract a [`ReleaseTrigger`] from a release event payload.
///
/// Fails with [`DocDraftError::Validation`] when the action is not
/// `published` or a required field is missing; [`classify`] converts those
/// failures into [`WebhookDisposition::Ignored`].
pub fn parse_release_event(payload: &serde_json::Value) -> Result<ReleaseTrigger> {
    let event = ReleaseEventWire::deserialize(payload)
        .map_err(|e| DocDraftError::validation(format!("malformed payload: {e}")))?;

    let action = event.action.unwrap_or_default();
    if action != PUBLISHED_ACTION {
        return Err(DocDraftError::validation(format!(
            "release action '{action}' is not '{PUBLISHED_ACTION}'"
        )));
    }

    let full_name = event
        .repository
        .and_then(|repository| repository.full_name)
        .ok_or_else(|| DocDraftError::validation("payload is missing repository.full_name"))?;
    let repo: RepoId = full_name.parse()?;

    let release = event
        .release
        .ok_or_else(|| DocDraftError::validation("payload is missing release"))?;
    let tag = release
        .tag_name
        .ok_or_else(|| DocDraftError::validation("payload is missing release.tag_name"))?;

    Ok(ReleaseTrigger {
        repo,
        tag,
        release_notes: release.body.unwrap_or_default(),
    })
}
