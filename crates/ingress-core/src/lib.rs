//! Provisioning pipeline for a bucket-to-queue ingestion topology.
//!
//! The pipeline runs five steps strictly in order and stops at the first
//! failure:
//!
//! ```text
//! 1. create bucket            (StorageService)
//! 2. create queue, resolve ARN (QueueService)
//! 3. grant S3 publish on queue (QueueService)
//! 4. wire ObjectCreated events (StorageService)
//! 5. user, policy, access key  (IdentityService)
//! ```
//!
//! Identifiers flow between steps only through the [`ProvisioningRecord`];
//! no step recomputes an identifier another step resolved. The services are
//! traits so the same pipeline runs against AWS (`ingress-aws`) or the
//! in-memory [`emulator::Emulator`].

pub mod config;
pub mod credentials;
pub mod emulator;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod service;
pub mod steps;

pub use config::{IngressConfig, OnExisting};
pub use credentials::{NewAccessKey, SecretAccessKey};
pub use emulator::Emulator;
pub use error::{ProvisionError, ProvisionResult, ResourceKind, classify_service_error};
pub use pipeline::{Pipeline, PipelineFailure, ProvisionOutcome, RunReport};
pub use record::{ProvisioningRecord, Step};
pub use service::{IdentityService, QueueService, Services, StorageService};
