//! Remote service boundaries.
//!
//! One trait per provider API. Each method maps to a single remote call so
//! the step logic (existence checks, merging, verification) stays in
//! [`crate::steps`] and is shared by every implementation.
//!
//! The traits use `#[async_trait]` so the pipeline can hold them as
//! `Arc<dyn ...>`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ingress_model::{Arn, NotificationConfiguration, PolicyDocument, QueueAttributeName};

use crate::credentials::NewAccessKey;
use crate::error::ProvisionResult;

/// Object storage (S3).
#[async_trait]
pub trait StorageService: Send + Sync + fmt::Debug {
    /// Whether a bucket with this name exists (owned by anyone).
    async fn bucket_exists(&self, bucket: &str) -> ProvisionResult<bool>;

    /// Create a bucket. `location_constraint` is sent verbatim when present.
    async fn create_bucket(
        &self,
        bucket: &str,
        location_constraint: Option<&str>,
    ) -> ProvisionResult<()>;

    /// Read the bucket's notification configuration (empty if none).
    async fn notification_configuration(
        &self,
        bucket: &str,
    ) -> ProvisionResult<NotificationConfiguration>;

    /// Replace the bucket's notification configuration.
    async fn put_notification_configuration(
        &self,
        bucket: &str,
        config: &NotificationConfiguration,
    ) -> ProvisionResult<()>;
}

/// Message queue (SQS).
#[async_trait]
pub trait QueueService: Send + Sync + fmt::Debug {
    /// Look up a queue URL by name. `None` if the queue does not exist.
    async fn queue_url(&self, name: &str) -> ProvisionResult<Option<String>>;

    /// Create a queue with the given wire attributes and return its URL.
    async fn create_queue(
        &self,
        name: &str,
        attributes: &BTreeMap<String, String>,
    ) -> ProvisionResult<String>;

    /// Fetch the named attributes. Absent attributes are omitted.
    async fn queue_attributes(
        &self,
        url: &str,
        names: &[QueueAttributeName],
    ) -> ProvisionResult<BTreeMap<String, String>>;

    /// Set wire attributes (including `Policy`).
    async fn set_queue_attributes(
        &self,
        url: &str,
        attributes: &BTreeMap<String, String>,
    ) -> ProvisionResult<()>;
}

/// Identity and access management (IAM).
#[async_trait]
pub trait IdentityService: Send + Sync + fmt::Debug {
    /// Create a user and return its ARN.
    async fn create_user(&self, user: &str) -> ProvisionResult<Arn>;

    /// Create a managed policy and return its ARN.
    async fn create_policy(&self, name: &str, document: &PolicyDocument) -> ProvisionResult<Arn>;

    /// Attach a managed policy to a user.
    async fn attach_user_policy(&self, user: &str, policy_arn: &Arn) -> ProvisionResult<()>;

    /// Mint an access key. The secret is only available in the return value.
    async fn create_access_key(&self, user: &str) -> ProvisionResult<NewAccessKey>;
}

/// The three services a pipeline runs against.
#[derive(Debug, Clone)]
pub struct Services {
    /// Object storage.
    pub storage: Arc<dyn StorageService>,
    /// Message queue.
    pub queues: Arc<dyn QueueService>,
    /// Identity management.
    pub identity: Arc<dyn IdentityService>,
}

impl Services {
    /// Use one value that implements all three services.
    #[must_use]
    pub fn from_shared<T>(shared: Arc<T>) -> Self
    where
        T: StorageService + QueueService + IdentityService + 'static,
    {
        Self {
            storage: shared.clone(),
            queues: shared.clone(),
            identity: shared,
        }
    }
}
