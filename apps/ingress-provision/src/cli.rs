//! Command-line flags.

use std::path::PathBuf;

use clap::Parser;
use ingress_core::{IngressConfig, OnExisting};
use ingress_model::AwsRegion;

#[derive(Parser, Debug)]
#[command(name = "ingress-provision")]
#[command(
    about = "Provision an S3 bucket, an SQS queue fed by its object-created events, \
             and a scoped IAM consumer"
)]
#[command(version)]
pub struct Cli {
    /// AWS region for the bucket and queue
    #[arg(long, env = "INGRESS_REGION")]
    pub region: Option<String>,

    /// Bucket name
    #[arg(long, env = "INGRESS_BUCKET")]
    pub bucket: Option<String>,

    /// Queue name
    #[arg(long, env = "INGRESS_QUEUE")]
    pub queue: Option<String>,

    /// IAM user name
    #[arg(long, env = "INGRESS_USER")]
    pub user: Option<String>,

    /// IAM managed policy name
    #[arg(long, env = "INGRESS_POLICY")]
    pub policy: Option<String>,

    /// What to do when the bucket or queue already exists: fail or adopt
    #[arg(long, env = "INGRESS_ON_EXISTING")]
    pub on_existing: Option<OnExisting>,

    /// Custom endpoint URL (LocalStack-compatible servers)
    #[arg(long, env = "INGRESS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Log level filter
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Print the new secret access key to stdout
    #[arg(long, conflicts_with = "credentials_file")]
    pub reveal_secret: bool,

    /// Write the new access key to this file (mode 0600, must not exist)
    #[arg(long, value_name = "PATH")]
    pub credentials_file: Option<PathBuf>,

    /// Write a JSON run report to this file
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Run against the in-memory emulator instead of AWS
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Overlay flags onto `base`. Flags win over environment values.
    #[must_use]
    pub fn apply(&self, mut base: IngressConfig) -> IngressConfig {
        if let Some(region) = &self.region {
            base.region = AwsRegion::new(region.clone());
        }
        if let Some(bucket) = &self.bucket {
            base.bucket_name.clone_from(bucket);
        }
        if let Some(queue) = &self.queue {
            base.queue_name.clone_from(queue);
        }
        if let Some(user) = &self.user {
            base.user_name.clone_from(user);
        }
        if let Some(policy) = &self.policy {
            base.policy_name.clone_from(policy);
        }
        if let Some(on_existing) = self.on_existing {
            base.on_existing = on_existing;
        }
        if let Some(url) = &self.endpoint_url {
            base.endpoint_url = Some(url.clone());
        }
        if let Some(level) = &self.log_level {
            base.log_level.clone_from(level);
        }
        base
    }
}
