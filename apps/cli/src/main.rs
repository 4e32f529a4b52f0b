//! DocDraft CLI — release-to-documentation-PR automation.
//!
//! Turns a published release into a documentation change proposal delivered
//! as a pull request, either from a webhook payload or a manual trigger.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
