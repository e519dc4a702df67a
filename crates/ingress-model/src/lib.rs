//! Value types shared by the ingress provisioner crates.
//!
//! Everything here is plain data: identifiers (account, region, partition,
//! ARN), the JSON access-policy document format accepted by S3, SQS and IAM,
//! the bucket notification configuration, and the fixed queue attributes.
//! No type in this crate talks to a remote service.

mod arn;
mod error;
mod notification;
mod policy;
mod queue;
mod types;

pub use arn::Arn;
pub use error::{ModelError, ModelResult};
pub use notification::{
    FilterRule, KeyFilter, LambdaFunctionConfiguration, NotificationConfiguration,
    OBJECT_CREATED_EVENT, QueueConfiguration, TopicConfiguration,
};
pub use policy::{
    Condition, Effect, OneOrMany, POLICY_VERSION, PolicyDocument, Principal, Statement,
};
pub use queue::{
    MESSAGE_RETENTION_PERIOD_SECS, QueueAttributeName, QueueAttributes, VISIBILITY_TIMEOUT_SECS,
};
pub use types::{AccountId, AwsRegion, Partition};
