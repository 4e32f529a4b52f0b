//! Pipeline orchestration and boundary logic for DocDraft.
//!
//! This crate ties the Git-host components together into the end-to-end
//! release run, and owns the seams around it: webhook classification, the
//! drafting capability, and the stage retry policy.

pub mod draft;
pub mod pipeline;
pub mod retry;
pub mod webhook;

pub use draft::{Draft, Drafter, TemplateDrafter, sanitize_tag};
pub use pipeline::{
    PipelineProgress, RunConfig, RunReport, SilentProgress, branch_for_tag, run_release,
};
pub use retry::{RetryPolicy, with_retries};
pub use webhook::{
    PUBLISHED_ACTION, RELEASE_EVENT, ReleaseTrigger, WebhookDisposition, classify,
    parse_release_event,
};
