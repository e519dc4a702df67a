//! The provisioning record threaded through the pipeline.
//!
//! Each step writes the identifiers it resolved and reads only what earlier
//! steps wrote. After a failure the record is the inventory of what exists.

use std::fmt;

use ingress_model::{Arn, QueueAttributes};
use serde::Serialize;

use crate::error::{ProvisionError, ProvisionResult, ResourceKind};

/// Pipeline steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    /// Create the bucket.
    CreateBucket,
    /// Create the queue and resolve its ARN.
    CreateQueue,
    /// Allow the bucket to publish into the queue.
    GrantPublisherAccess,
    /// Send object-created events to the queue.
    WireEvents,
    /// Create the user, its policy and one access key.
    ProvisionIdentity,
}

impl Step {
    /// All steps in order.
    pub const ALL: [Step; 5] = [
        Self::CreateBucket,
        Self::CreateQueue,
        Self::GrantPublisherAccess,
        Self::WireEvents,
        Self::ProvisionIdentity,
    ];

    /// One-based position in the sequence.
    #[must_use]
    pub fn number(self) -> usize {
        match self {
            Self::CreateBucket => 1,
            Self::CreateQueue => 2,
            Self::GrantPublisherAccess => 3,
            Self::WireEvents => 4,
            Self::ProvisionIdentity => 5,
        }
    }

    /// Short description for progress output.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::CreateBucket => "create bucket",
            Self::CreateQueue => "create queue",
            Self::GrantPublisherAccess => "grant bucket publish access on queue",
            Self::WireEvents => "wire object-created events",
            Self::ProvisionIdentity => "provision identity",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/5 {}", self.number(), self.description())
    }
}

/// Whether this run created a resource or reused one that existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Disposition {
    /// Created by this run.
    Created,
    /// Existed before this run and was adopted.
    Adopted,
}

/// The bucket handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketRecord {
    /// Bucket name.
    pub name: String,
    /// Bucket ARN.
    pub arn: Arn,
    /// Location constraint sent on creation (`None` for the default region
    /// or when adopted).
    pub location_constraint: Option<String>,
    /// Created or adopted.
    pub disposition: Disposition,
}

/// The queue handle: URL and ARN always travel together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    /// Queue name.
    pub name: String,
    /// Queue URL (used for queue operations).
    pub url: String,
    /// Queue ARN as resolved from the provider (used in policies).
    pub arn: Arn,
    /// Attributes observed after creation.
    pub attributes: QueueAttributes,
    /// Created or adopted.
    pub disposition: Disposition,
}

/// Identity resources, filled in one sub-step at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    /// User name and ARN once created.
    pub user: Option<(String, Arn)>,
    /// Policy name and ARN once created.
    pub policy: Option<(String, Arn)>,
    /// Whether the policy is attached to the user.
    pub policy_attached: bool,
    /// Id of the minted access key. The secret is never recorded.
    pub access_key_id: Option<String>,
}

/// Everything the pipeline has resolved so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningRecord {
    /// Step 1 output.
    pub bucket: Option<BucketRecord>,
    /// Step 2 output.
    pub queue: Option<QueueRecord>,
    /// Step 3 output: whether the queue policy was written.
    pub queue_policy_written: Option<bool>,
    /// Step 4 output: whether the notification configuration was written.
    pub notification_written: Option<bool>,
    /// Step 5 output.
    pub identity: IdentityRecord,
}

impl ProvisioningRecord {
    /// The bucket, or `MissingInput` if step 1 has not run.
    pub fn bucket(&self) -> ProvisionResult<&BucketRecord> {
        self.bucket
            .as_ref()
            .ok_or(ProvisionError::MissingInput("bucket"))
    }

    /// The queue, or `MissingInput` if step 2 has not run.
    pub fn queue(&self) -> ProvisionResult<&QueueRecord> {
        self.queue.as_ref().ok_or(ProvisionError::MissingInput("queue"))
    }

    /// Resources this run created, in creation order, for cleanup.
    ///
    /// Adopted resources and configuration writes are not listed.
    #[must_use]
    pub fn created_resources(&self) -> Vec<(ResourceKind, String)> {
        let mut created = Vec::new();
        if let Some(b) = self.bucket.as_ref().filter(|b| b.disposition == Disposition::Created) {
            created.push((ResourceKind::Bucket, b.name.clone()));
        }
        if let Some(q) = self.queue.as_ref().filter(|q| q.disposition == Disposition::Created) {
            created.push((ResourceKind::Queue, q.url.clone()));
        }
        if let Some((_, arn)) = &self.identity.user {
            created.push((ResourceKind::User, arn.to_string()));
        }
        if let Some((_, arn)) = &self.identity.policy {
            created.push((ResourceKind::Policy, arn.to_string()));
        }
        if let Some(id) = &self.identity.access_key_id {
            created.push((ResourceKind::AccessKey, id.clone()));
        }
        created
    }
}
