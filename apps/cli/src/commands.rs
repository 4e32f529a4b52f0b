//! CLI command definitions, routing, and tracing setup.

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use docdraft_core::draft::TemplateDrafter;
use docdraft_core::pipeline::{PipelineProgress, RunConfig, RunReport, run_release};
use docdraft_core::webhook::{WebhookDisposition, classify};
use docdraft_github::{GithubClient, ReleaseContextResolver};
use docdraft_notify::{NoopNotifier, Notifier, SlackNotifier};
use docdraft_shared::{
    AppConfig, RepoId, github_token, init_config, load_config, slack_token,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// DocDraft — turn published releases into documentation pull requests.
#[derive(Parser)]
#[command(
    name = "docdraft",
    version,
    about = "Turn published releases into documentation change proposals delivered as pull requests.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the release pipeline for a tag (manual trigger or rerun).
    Run {
        /// Repository full name (owner/repo).
        #[arg(long)]
        repo: String,

        /// Release tag to process.
        #[arg(long)]
        tag: String,

        /// Base branch for the pull request (defaults to config).
        #[arg(long)]
        base: Option<String>,

        /// Skip the completion notification.
        #[arg(long)]
        no_notify: bool,
    },

    /// Classify a webhook event and run the pipeline if it triggers.
    Webhook {
        /// Event type, as carried by the webhook's type header.
        #[arg(long)]
        event: String,

        /// Payload JSON file, or '-' for stdin.
        #[arg(long, default_value = "-")]
        payload: String,

        /// Skip the completion notification.
        #[arg(long)]
        no_notify: bool,
    },

    /// Resolve and print the release context for a tag as JSON.
    Context {
        /// Repository full name (owner/repo).
        #[arg(long)]
        repo: String,

        /// Release tag to inspect.
        #[arg(long)]
        tag: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docdraft=info",
        1 => "docdraft=debug",
        _ => "docdraft=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            repo,
            tag,
            base,
            no_notify,
        } => {
            let repo: RepoId = repo.parse()?;
            execute_run(repo, &tag, base.as_deref(), no_notify).await
        }
        Command::Webhook {
            event,
            payload,
            no_notify,
        } => cmd_webhook(&event, &payload, no_notify).await,
        Command::Context { repo, tag } => cmd_context(&repo, &tag).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

/// Run the full pipeline for one release tag.
async fn execute_run(
    repo: RepoId,
    tag: &str,
    base: Option<&str>,
    no_notify: bool,
) -> Result<()> {
    // Validate credentials before any network call
    let config = load_config()?;
    let token = github_token(&config)?;

    let mut run_config = RunConfig::from_app_config(&config, repo, tag);
    if let Some(base) = base {
        run_config.base_branch = base.to_string();
    }
    run_config.notify = !no_notify;

    let github = GithubClient::with_api_base(&config.github.api_base, token)?;
    let notifier: Box<dyn Notifier> = if run_config.notify {
        let slack = slack_token(&config)?;
        Box::new(SlackNotifier::with_api_base(&config.slack.api_base, slack)?)
    } else {
        Box::new(NoopNotifier)
    };

    info!(repo = %run_config.repo, tag, "running release pipeline");

    let reporter = CliProgress::new();
    let report = run_release(
        &run_config,
        &github,
        &TemplateDrafter,
        notifier.as_ref(),
        &reporter,
    )
    .await?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    println!();
    println!("  Documentation PR ready!");
    println!("  Run:      {}", report.run_id);
    println!("  Repo:     {}", report.repo);
    println!("  Tag:      {}", report.tag);
    match &report.previous_tag {
        Some(previous) => println!("  Previous: {previous}"),
        None => println!("  Previous: (none, first published release)"),
    }
    println!("  Files:    {}", report.files_committed);
    println!("  Commit:   {}", report.commit_sha);
    println!(
        "  PR:       #{} {}",
        report.pull_request.number, report.pull_request.url
    );
    println!("  Notified: {}", if report.notified { "yes" } else { "no" });
    println!("  Time:     {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

/// Classify an inbound webhook event; run the pipeline when it triggers.
///
/// Ignored events exit successfully after printing the reason, mirroring
/// the listener's "respond 200 and drop" contract.
async fn cmd_webhook(event: &str, payload_source: &str, no_notify: bool) -> Result<()> {
    let payload_text = if payload_source == "-" {
        std::io::read_to_string(std::io::stdin())
            .map_err(|e| eyre!("cannot read payload from stdin: {e}"))?
    } else {
        std::fs::read_to_string(payload_source)
            .map_err(|e| eyre!("cannot read payload file '{payload_source}': {e}"))?
    };
    let payload: serde_json::Value =
        serde_json::from_str(&payload_text).map_err(|e| eyre!("payload is not valid JSON: {e}"))?;

    match classify(event, &payload) {
        WebhookDisposition::Ignored { reason } => {
            info!(event, reason, "webhook ignored");
            println!("Ignored: {reason}");
            Ok(())
        }
        WebhookDisposition::Triggered(trigger) => {
            info!(repo = %trigger.repo, tag = %trigger.tag, "webhook triggered run");
            execute_run(trigger.repo, &trigger.tag, None, no_notify).await
        }
    }
}

/// Resolve the release context and print it as JSON.
async fn cmd_context(repo: &str, tag: &str) -> Result<()> {
    let config = load_config()?;
    let token = github_token(&config)?;
    let repo: RepoId = repo.parse()?;

    let github = GithubClient::with_api_base(&config.github.api_base, token)?;
    let resolver = ReleaseContextResolver::new(github);
    let context = resolver.fetch_context(&repo, tag).await?;

    println!("{}", serde_json::to_string_pretty(&context)?);
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl PipelineProgress for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn file_proposed(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Proposing [{current}/{total}] {path}"));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}
