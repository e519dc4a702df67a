//! ingress-provision: create a bucket, a queue fed by the bucket's
//! object-created events, and an IAM user that can consume them.
//!
//! # Usage
//!
//! ```text
//! ingress-provision --bucket my-ingress --queue my-ingress --user my-consumer \
//!     --credentials-file ./consumer.credentials
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `INGRESS_REGION` | `us-east-1` | Region (falls back to `AWS_REGION`, `DEFAULT_REGION`) |
//! | `INGRESS_BUCKET` | `audio-transcriber-ingress-bucket` | Bucket name |
//! | `INGRESS_QUEUE` | `audio-transcriber-ingress-queue` | Queue name |
//! | `INGRESS_USER` | `audio-transcriber-ingress-user` | IAM user name |
//! | `INGRESS_POLICY` | `AudioTranscriberIngressPolicy` | IAM policy name |
//! | `INGRESS_ON_EXISTING` | `fail` | `fail` or `adopt` for an existing bucket or queue |
//! | `INGRESS_ENDPOINT_URL` | *(unset)* | Custom endpoint (falls back to `AWS_ENDPOINT_URL`) |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod cli;
mod report;
mod sink;

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ingress_aws::AwsContext;
use ingress_core::pipeline::{ProvisionOutcome, RunReport};
use ingress_core::{Emulator, IngressConfig, Pipeline, Services};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::sink::{OpenSink, SecretSink};

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
/// Logs go to stderr so stdout carries only the report and revealed secret.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.apply(
        IngressConfig::from_env().context("failed to load configuration from environment")?,
    );
    init_tracing(&config.log_level)?;

    let sink =
        SecretSink::from_flags(cli.reveal_secret, cli.credentials_file.clone(), cli.dry_run)?;

    let services = if cli.dry_run {
        warn!(
            region = %config.region,
            "dry run: using the in-memory emulator, no AWS calls will be made"
        );
        Services::from_shared(Arc::new(Emulator::new(config.region.clone())))
    } else {
        let ctx = AwsContext::new(&config.region, config.endpoint_url.as_deref()).await;
        info!(?ctx, "AWS configuration loaded");
        ctx.services()
    };

    let pipeline = Pipeline::new(config, services).context("invalid configuration")?;
    let sink = sink.open()?;

    match pipeline.run().await {
        Ok(outcome) => {
            let profile = pipeline.config().user_name.clone();
            finish(outcome, sink, &profile, cli.report.as_deref(), &mut std::io::stdout().lock())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            sink.abandon();
            let report = failure.report();
            eprintln!("{}", report::render_summary(&report));
            if let Some(path) = &cli.report {
                save_report(path, &report);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Deliver the key, then print the summary and save the report.
///
/// The key is handed to the sink first. Nothing after that can lose it.
fn finish(
    mut outcome: ProvisionOutcome,
    sink: OpenSink,
    profile: &str,
    report_path: Option<&Path>,
    out: &mut impl Write,
) -> Result<()> {
    let report = outcome.report();
    match outcome.take_access_key() {
        Some(key) => sink.deliver(key, profile, out)?,
        None => sink.abandon(),
    }

    writeln!(out, "{}", report::render_summary(&report)).context("failed to write summary")?;
    if let Some(path) = report_path {
        save_report(path, &report);
    }
    Ok(())
}

fn save_report(path: &Path, report: &RunReport) {
    if let Err(e) = report::write_json(path, report) {
        warn!(error = %format!("{e:#}"), "run report not saved");
        eprintln!("warning: {e:#}");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{e:#}"), "provisioning aborted");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
