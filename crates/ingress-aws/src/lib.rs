//! AWS SDK implementations of the ingress provisioner service traits.
//!
//! [`AwsContext`] loads the SDK configuration once and hands out one client
//! per service. Each client maps a trait method onto exactly one SDK call
//! and classifies failures through [`ingress_core::classify_service_error`].

pub mod context;
mod error;
pub mod iam;
pub mod s3;
pub mod sqs;

pub use context::AwsContext;
pub use iam::IamIdentity;
pub use s3::S3Storage;
pub use sqs::SqsQueues;
