//! Fail-fast execution of the five provisioning steps.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::config::IngressConfig;
use crate::credentials::NewAccessKey;
use crate::error::{ProvisionError, ProvisionResult, ResourceKind};
use crate::record::{ProvisioningRecord, Step};
use crate::service::Services;
use crate::steps::{self, IdentityRequest};

/// Runs the steps against a set of services.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: IngressConfig,
    services: Services,
}

impl Pipeline {
    /// Validate `config` and bind it to `services`.
    pub fn new(config: IngressConfig, services: Services) -> ProvisionResult<Self> {
        config.validate()?;
        Ok(Self { config, services })
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &IngressConfig {
        &self.config
    }

    /// Run every step in order, stopping at the first failure.
    ///
    /// On failure the returned [`PipelineFailure`] carries the record as it
    /// stood, which lists every resource created before the failing step.
    pub async fn run(&self) -> Result<ProvisionOutcome, PipelineFailure> {
        let started_at = Utc::now();
        let mut record = ProvisioningRecord::default();
        let mut access_key = None;

        info!(
            region = %self.config.region,
            bucket = %self.config.bucket_name,
            queue = %self.config.queue_name,
            user = %self.config.user_name,
            on_existing = %self.config.on_existing,
            "provisioning started",
        );

        for step in Step::ALL {
            info!(step = %step, "step started");
            if let Err(error) = self.run_step(step, &mut record, &mut access_key).await {
                error!(
                    step = %step,
                    category = error.category(),
                    error = %error,
                    "step failed, aborting"
                );
                return Err(PipelineFailure {
                    step,
                    error,
                    record,
                    started_at,
                    finished_at: Utc::now(),
                });
            }
        }

        info!(created = record.created_resources().len(), "provisioning complete");
        Ok(ProvisionOutcome {
            record,
            access_key,
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn run_step(
        &self,
        step: Step,
        record: &mut ProvisioningRecord,
        access_key: &mut Option<NewAccessKey>,
    ) -> ProvisionResult<()> {
        let config = &self.config;
        let services = &self.services;

        match step {
            Step::CreateBucket => {
                let bucket = steps::create_bucket(
                    services.storage.as_ref(),
                    &config.bucket_name,
                    &config.region,
                    config.on_existing,
                )
                .await?;
                record.bucket = Some(bucket);
            }
            Step::CreateQueue => {
                let queue = steps::create_queue(
                    services.queues.as_ref(),
                    &config.queue_name,
                    config.queue_attributes(),
                    config.on_existing,
                )
                .await?;
                record.queue = Some(queue);
            }
            Step::GrantPublisherAccess => {
                let bucket_arn = &record.bucket()?.arn;
                let queue = record.queue()?;
                let written =
                    steps::grant_publisher_access(services.queues.as_ref(), queue, bucket_arn)
                        .await?;
                record.queue_policy_written = Some(written);
            }
            Step::WireEvents => {
                let bucket = &record.bucket()?.name;
                let queue_arn = &record.queue()?.arn;
                let written =
                    steps::wire_object_created_events(services.storage.as_ref(), bucket, queue_arn)
                        .await?;
                record.notification_written = Some(written);
            }
            Step::ProvisionIdentity => {
                let bucket = record.bucket()?.clone();
                let queue_arn = record.queue()?.arn.clone();
                let request = IdentityRequest {
                    user_name: &config.user_name,
                    policy_name: &config.policy_name,
                    bucket: &bucket,
                    queue_arn: &queue_arn,
                };
                let key = steps::provision_identity(
                    services.identity.as_ref(),
                    request,
                    &mut record.identity,
                )
                .await?;
                *access_key = Some(key);
            }
        }
        Ok(())
    }
}

/// A completed run.
#[derive(Debug)]
pub struct ProvisionOutcome {
    /// Everything that was resolved.
    pub record: ProvisioningRecord,
    access_key: Option<NewAccessKey>,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl ProvisionOutcome {
    /// Take the access key. Returns `Some` exactly once.
    pub fn take_access_key(&mut self) -> Option<NewAccessKey> {
        self.access_key.take()
    }

    /// Serializable summary of the run. Never contains the secret.
    #[must_use]
    pub fn report(&self) -> RunReport {
        RunReport::new(&self.record, None, self.started_at, self.finished_at)
    }
}

/// A run that stopped at `step`.
#[derive(Debug, thiserror::Error)]
#[error("step {step} failed: {error}")]
pub struct PipelineFailure {
    /// The step that failed.
    pub step: Step,
    /// Why it failed.
    #[source]
    pub error: ProvisionError,
    /// What had been resolved before the failure.
    pub record: ProvisioningRecord,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl PipelineFailure {
    /// Serializable summary of the failed run.
    #[must_use]
    pub fn report(&self) -> RunReport {
        RunReport::new(
            &self.record,
            Some((self.step, &self.error)),
            self.started_at,
            self.finished_at,
        )
    }
}

/// Run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    /// All five steps completed.
    Succeeded,
    /// A step failed; later steps did not run.
    Failed,
}

/// The failing step and error, as reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedFailure {
    /// Failing step.
    pub step: Step,
    /// Error category (`NameCollision`, `PermissionDenied`, ...).
    pub category: &'static str,
    /// Rendered error.
    pub message: String,
}

/// A resource this run created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResource {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Name, URL, ARN or key id.
    pub id: String,
}

/// Machine-readable run summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Overall status.
    pub status: RunStatus,
    /// Set when `status` is `failed`.
    pub failure: Option<ReportedFailure>,
    /// Resources this run created, in creation order.
    pub created_resources: Vec<CreatedResource>,
    /// The full record.
    pub record: ProvisioningRecord,
    /// Run start.
    pub started_at: DateTime<Utc>,
    /// Run end.
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    fn new(
        record: &ProvisioningRecord,
        failure: Option<(Step, &ProvisionError)>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let created_resources = record
            .created_resources()
            .into_iter()
            .map(|(kind, id)| CreatedResource { kind, id })
            .collect();

        Self {
            status: if failure.is_some() {
                RunStatus::Failed
            } else {
                RunStatus::Succeeded
            },
            failure: failure.map(|(step, error)| ReportedFailure {
                step,
                category: error.category(),
                message: error.to_string(),
            }),
            created_resources,
            record: record.clone(),
            started_at,
            finished_at,
        }
    }
}
