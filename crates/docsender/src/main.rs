//! docsender - mail-merge batch sender.
//!
//! Reads a delimited status ledger, sends every eligible row as an
//! email with attachments over an authenticated TLS SMTP session, and
//! rewrites the ledger in place atomically so re-runs are idempotent.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use docsender_core::{Config, PassSummary, SmtpMailer, rewrite_ledger};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    name = "docsender",
    version,
    about = "Sends pending ledger rows as emails and updates the ledger in place."
)]
struct Cli {
    /// Config file path (`key = value` pairs).
    config: PathBuf,

    /// Ledger file path; rewritten atomically after the pass.
    ledger: PathBuf,

    /// Sidecar log file.
    #[arg(long, default_value = "docsender.log")]
    log_file: PathBuf,
}

fn init_logging(log_file: &Path) -> anyhow::Result<()> {
    let file = File::create(log_file)
        .with_context(|| format!("cannot create log file {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docsender=debug,docsender_core=debug,docsender_smtp=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

async fn run(cli: &Cli) -> anyhow::Result<PassSummary> {
    let config = Config::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;

    let mut mailer = SmtpMailer::connect(&config)
        .await
        .with_context(|| format!("opening SMTP session to {}:{}", config.host, config.port))?;

    let pass = rewrite_ledger(&cli.ledger, &config, &mut mailer).await;

    // Release the session on both exit paths before reporting.
    if let Err(err) = mailer.quit().await {
        warn!(%err, "SMTP session did not close cleanly");
    }

    pass.with_context(|| format!("processing ledger {}", cli.ledger.display()))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(&cli.log_file) {
        eprintln!("docsender: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(&cli).await {
        Ok(summary) => {
            info!(
                total = summary.total,
                sent = summary.sent,
                errored = summary.errored,
                skipped = summary.skipped,
                "pass complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
