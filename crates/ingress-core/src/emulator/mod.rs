//! In-memory provider for dry runs and tests.
//!
//! [`Emulator`] implements all three service traits against `DashMap`
//! state and enforces the provider rules the pipeline depends on:
//! location constraints, queue policy resources, notification destination
//! checks, IAM name uniqueness and the two-key limit. Rejections carry the
//! provider's error code and go through [`classify_service_error`] like a
//! real response would.
//!
//! Every successful mutation bumps a write counter so tests can assert that
//! a run made no changes.

mod identity;
mod queue;
mod storage;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use ingress_model::{AccountId, Arn, AwsRegion, NotificationConfiguration, PolicyDocument};
use parking_lot::RwLock;

use crate::error::{ProvisionError, ResourceKind, classify_service_error};

/// An emulated S3 bucket.
#[derive(Debug)]
struct EmulatedBucket {
    location_constraint: Option<String>,
    notification: RwLock<NotificationConfiguration>,
}

/// An emulated SQS queue.
#[derive(Debug)]
struct EmulatedQueue {
    url: String,
    arn: Arn,
    attributes: RwLock<BTreeMap<String, String>>,
}

/// An emulated IAM user.
#[derive(Debug)]
struct EmulatedUser {
    attached: Vec<Arn>,
    access_keys: Vec<String>,
}

/// In-memory S3, SQS and IAM for a single account and region.
pub struct Emulator {
    account: AccountId,
    region: AwsRegion,
    buckets: DashMap<String, EmulatedBucket>,
    queues: DashMap<String, EmulatedQueue>,
    users: DashMap<String, EmulatedUser>,
    /// Policy ARN to document.
    policies: DashMap<String, PolicyDocument>,
    writes: AtomicU64,
}

impl std::fmt::Debug for Emulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emulator")
            .field("account", &self.account)
            .field("region", &self.region)
            .field("bucket_count", &self.buckets.len())
            .field("queue_count", &self.queues.len())
            .field("user_count", &self.users.len())
            .finish_non_exhaustive()
    }
}

impl Emulator {
    /// An empty emulator for the default account in `region`.
    #[must_use]
    pub fn new(region: AwsRegion) -> Self {
        Self::with_account(AccountId::default(), region)
    }

    /// An empty emulator for `account` in `region`.
    #[must_use]
    pub fn with_account(account: AccountId, region: AwsRegion) -> Self {
        Self {
            account,
            region,
            buckets: DashMap::new(),
            queues: DashMap::new(),
            users: DashMap::new(),
            policies: DashMap::new(),
            writes: AtomicU64::new(0),
        }
    }

    /// Number of successful mutating calls so far.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Names of all buckets, sorted.
    #[must_use]
    pub fn bucket_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buckets.iter().map(|b| b.key().clone()).collect();
        names.sort_unstable();
        names
    }

    /// The location constraint a bucket was created with. Outer `None` if
    /// the bucket does not exist.
    #[must_use]
    pub fn bucket_location_constraint(&self, bucket: &str) -> Option<Option<String>> {
        self.buckets.get(bucket).map(|b| b.location_constraint.clone())
    }

    /// A bucket's notification configuration.
    #[must_use]
    pub fn notification(&self, bucket: &str) -> Option<NotificationConfiguration> {
        self.buckets.get(bucket).map(|b| b.notification.read().clone())
    }

    /// All stored attributes of a queue, by name.
    #[must_use]
    pub fn queue_attributes_by_name(&self, queue: &str) -> Option<BTreeMap<String, String>> {
        self.queues.get(queue).map(|q| q.attributes.read().clone())
    }

    /// A queue's access policy, parsed.
    #[must_use]
    pub fn queue_policy(&self, queue: &str) -> Option<PolicyDocument> {
        let attributes = self.queue_attributes_by_name(queue)?;
        PolicyDocument::from_json(attributes.get("Policy")?).ok()
    }

    /// Managed policies attached to a user.
    #[must_use]
    pub fn attached_policies(&self, user: &str) -> Vec<Arn> {
        self.users
            .get(user)
            .map(|u| u.attached.clone())
            .unwrap_or_default()
    }

    /// A managed policy's document.
    #[must_use]
    pub fn policy_document(&self, policy_arn: &Arn) -> Option<PolicyDocument> {
        self.policies.get(&policy_arn.to_string()).map(|p| p.clone())
    }

    /// Access key ids held by a user.
    #[must_use]
    pub fn access_key_ids(&self, user: &str) -> Vec<String> {
        self.users
            .get(user)
            .map(|u| u.access_keys.clone())
            .unwrap_or_default()
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }
}

/// Build the error a provider would return for `code`.
fn reject(
    resource: ResourceKind,
    name: &str,
    code: &str,
    message: impl AsRef<str>,
) -> ProvisionError {
    classify_service_error(resource, name, Some(code), Some(message.as_ref()))
}
