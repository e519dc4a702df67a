//! Emulated S3.

use async_trait::async_trait;
use ingress_model::{Arn, AwsRegion, Effect, NotificationConfiguration, Principal};
use parking_lot::RwLock;
use tracing::debug;

use super::{EmulatedBucket, Emulator, reject};
use crate::error::{ProvisionResult, ResourceKind};
use crate::service::StorageService;

impl Emulator {
    /// Apply the S3 location-constraint rules for this emulator's region.
    fn check_location_constraint(
        &self,
        bucket: &str,
        constraint: Option<&str>,
    ) -> ProvisionResult<()> {
        let region = self.region.as_str();
        match constraint {
            Some(AwsRegion::DEFAULT) => Err(reject(
                ResourceKind::Bucket,
                bucket,
                "InvalidLocationConstraint",
                "The specified location-constraint is not valid",
            )),
            None if !self.region.is_default() => Err(reject(
                ResourceKind::Bucket,
                bucket,
                "IllegalLocationConstraintException",
                "The unspecified location constraint is incompatible for the region specific \
                 endpoint this request was sent to.",
            )),
            Some(c) if c != region => Err(reject(
                ResourceKind::Bucket,
                bucket,
                "IllegalLocationConstraintException",
                format!(
                    "The {c} location constraint is incompatible for the region specific \
                     endpoint this request was sent to."
                ),
            )),
            _ => Ok(()),
        }
    }

    /// Whether the queue's policy lets S3 send messages on behalf of `bucket`.
    fn queue_accepts_from(&self, queue_arn: &str, bucket: &str) -> bool {
        let Some(queue) = self.queues.iter().find(|q| q.arn.to_string() == queue_arn) else {
            return false;
        };
        let Some(policy) = queue
            .attributes
            .read()
            .get("Policy")
            .and_then(|p| ingress_model::PolicyDocument::from_json(p).ok())
        else {
            return false;
        };

        let bucket_arn = Arn::s3_bucket(self.region.partition(), bucket).to_string();
        policy.statement.iter().any(|s| {
            let principal_ok = match &s.principal {
                Some(Principal::Any(any)) => any == "*",
                Some(p) => *p == Principal::service("s3.amazonaws.com"),
                None => false,
            };
            let action_ok = s
                .action
                .iter()
                .any(|a| a == "sqs:SendMessage" || a == "sqs:*" || a == "*");
            let resource_ok = s.resource.iter().any(|r| r == queue_arn || r == "*");
            let source_ok = match &s.condition {
                None => true,
                Some(_) => {
                    let source = Some(bucket_arn.as_str());
                    s.condition_value("ArnEquals", "aws:SourceArn") == source
                        || s.condition_value("ArnLike", "aws:SourceArn") == source
                }
            };
            s.effect == Effect::Allow && principal_ok && action_ok && resource_ok && source_ok
        })
    }
}

#[async_trait]
impl StorageService for Emulator {
    async fn bucket_exists(&self, bucket: &str) -> ProvisionResult<bool> {
        Ok(self.buckets.contains_key(bucket))
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        location_constraint: Option<&str>,
    ) -> ProvisionResult<()> {
        if self.buckets.contains_key(bucket) {
            return Err(reject(
                ResourceKind::Bucket,
                bucket,
                "BucketAlreadyOwnedByYou",
                "Your previous request to create the named bucket succeeded and you already \
                 own it.",
            ));
        }
        self.check_location_constraint(bucket, location_constraint)?;

        self.buckets.insert(
            bucket.to_owned(),
            EmulatedBucket {
                location_constraint: location_constraint.map(ToOwned::to_owned),
                notification: RwLock::new(NotificationConfiguration::default()),
            },
        );
        self.record_write();
        debug!(bucket = %bucket, "emulated bucket created");
        Ok(())
    }

    async fn notification_configuration(
        &self,
        bucket: &str,
    ) -> ProvisionResult<NotificationConfiguration> {
        self.buckets
            .get(bucket)
            .map(|b| b.notification.read().clone())
            .ok_or_else(|| {
                reject(
                    ResourceKind::Bucket,
                    bucket,
                    "NoSuchBucket",
                    "The specified bucket does not exist",
                )
            })
    }

    async fn put_notification_configuration(
        &self,
        bucket: &str,
        config: &NotificationConfiguration,
    ) -> ProvisionResult<()> {
        if !self.buckets.contains_key(bucket) {
            return Err(reject(
                ResourceKind::Bucket,
                bucket,
                "NoSuchBucket",
                "The specified bucket does not exist",
            ));
        }

        for target in &config.queue_configurations {
            if !self.queue_accepts_from(&target.queue_arn, bucket) {
                return Err(reject(
                    ResourceKind::Notification,
                    bucket,
                    "InvalidArgument",
                    format!(
                        "Unable to validate the following destination configurations: {}",
                        target.queue_arn
                    ),
                ));
            }
        }

        if let Some(b) = self.buckets.get(bucket) {
            *b.notification.write() = config.clone();
        }
        self.record_write();
        debug!(
            bucket = %bucket,
            targets = config.queue_configurations.len(),
            "emulated notification written"
        );
        Ok(())
    }
}
